use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Two-part process version, displayed as `"<major>.<minor>"`.
///
/// The minor component rolls over at 9: bumping `1.9` yields `2.0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const INITIAL: Version = Version { major: 1, minor: 0 };

    pub fn bumped(self) -> Version {
        if self.minor >= 9 {
            Version {
                major: self.major + 1,
                minor: 0,
            }
        } else {
            Version {
                major: self.major,
                minor: self.minor + 1,
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = ();

    /// Accepts exactly `^\d+\.\d+$`.
    fn from_str(s: &str) -> Result<Self, ()> {
        let (major, minor) = s.split_once('.').ok_or(())?;
        if major.is_empty()
            || minor.is_empty()
            || !major.bytes().all(|b| b.is_ascii_digit())
            || !minor.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(());
        }
        Ok(Version {
            major: major.parse().map_err(|_| ())?,
            minor: minor.parse().map_err(|_| ())?,
        })
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One annotated text line within a step. Ids are stable across edits:
/// toggling importance or reordering never reassigns them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextItem {
    pub id: String,
    pub content: String,
    pub important: bool,
}

impl TextItem {
    pub fn new(content: impl Into<String>, important: bool) -> TextItem {
        TextItem {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            important,
        }
    }
}

/// A committed step. Steps with neither photos nor texts are draft
/// placeholders: they survive save/load but are excluded from rendering.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepRecord {
    pub index: u32,
    pub photos: Vec<String>,
    pub texts: Vec<TextItem>,
    pub done: bool,
}

impl StepRecord {
    pub fn has_content(&self) -> bool {
        !self.photos.is_empty() || !self.texts.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessRecord {
    pub name: String,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub steps: Vec<StepRecord>,
}

impl ProcessRecord {
    pub fn new(name: impl Into<String>) -> ProcessRecord {
        ProcessRecord {
            name: name.into(),
            version: Version::INITIAL,
            created_at: Utc::now(),
            steps: Vec::new(),
        }
    }

    /// Re-assign contiguous 1-based step indices after structural edits.
    pub fn renumber_steps(&mut self) {
        for (i, step) in self.steps.iter_mut().enumerate() {
            step.index = (i + 1) as u32;
        }
    }

    /// Canonical JSON of everything except `version` and `created_at`.
    /// Two records with equal fingerprints are the same content snapshot;
    /// the finalize policy bumps the version only when this changes.
    pub fn content_fingerprint(&self) -> String {
        #[derive(Serialize)]
        struct Canonical<'a> {
            name: &'a str,
            steps: &'a [StepRecord],
        }
        serde_json::to_string(&Canonical {
            name: &self.name,
            steps: &self.steps,
        })
        .unwrap_or_default()
    }

    /// Export filename: whitespace collapsed to underscores plus a fixed tag.
    pub fn export_file_name(&self) -> String {
        let stem: Vec<&str> = self.name.split_whitespace().collect();
        format!("{}_protocol.pdf", stem.join("_"))
    }
}
