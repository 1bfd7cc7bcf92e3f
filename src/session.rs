//! Editing session: one immutable record plus one draft buffer for the step
//! currently being captured. Edits land in the draft and become part of the
//! record only through an explicit commit, so there is no cross-field state
//! to keep in sync.

use std::path::{Path, PathBuf};

use crate::blocks::PhotoSource;
use crate::error::Error;
use crate::model::{ProcessRecord, StepRecord, TextItem};
use crate::pdf::layout::PageGeometry;

/// The step being captured right now. Committing moves it into the record.
#[derive(Clone, Debug, Default)]
pub struct StepDraft {
    pub photos: Vec<String>,
    pub texts: Vec<TextItem>,
    pub done: bool,
}

impl StepDraft {
    fn is_empty(&self) -> bool {
        self.photos.is_empty() && self.texts.is_empty()
    }
}

pub struct Session {
    record: ProcessRecord,
    draft: StepDraft,
    /// Content fingerprint at the last successful finalize. The version is
    /// bumped exactly once per distinct snapshot: re-finalizing unchanged
    /// content is a no-op.
    last_finalized: Option<String>,
    export_ready: bool,
}

impl Session {
    pub fn start(name: &str) -> Result<Session, Error> {
        if name.trim().is_empty() {
            return Err(Error::Validation("process name must not be empty".into()));
        }
        Ok(Session {
            record: ProcessRecord::new(name.trim()),
            draft: StepDraft::default(),
            last_finalized: None,
            export_ready: false,
        })
    }

    /// Resume from a loaded record. The record is treated as edited: it must
    /// be finalized again before export.
    pub fn from_record(record: ProcessRecord) -> Session {
        Session {
            record,
            draft: StepDraft::default(),
            last_finalized: None,
            export_ready: false,
        }
    }

    pub fn record(&self) -> &ProcessRecord {
        &self.record
    }

    pub fn draft(&self) -> &StepDraft {
        &self.draft
    }

    pub fn is_export_ready(&self) -> bool {
        self.export_ready
    }

    pub fn add_photo(&mut self, reference: impl Into<String>) {
        self.draft.photos.push(reference.into());
        self.export_ready = false;
    }

    /// Append a text line to the draft; returns its stable id.
    pub fn add_text(&mut self, content: impl Into<String>, important: bool) -> String {
        let item = TextItem::new(content, important);
        let id = item.id.clone();
        self.draft.texts.push(item);
        self.export_ready = false;
        id
    }

    /// Flip the importance flag of a draft text line; returns the new state.
    pub fn toggle_important(&mut self, id: &str) -> Result<bool, Error> {
        let item = self
            .draft
            .texts
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::Validation(format!("no text line with id {id}")))?;
        item.important = !item.important;
        self.export_ready = false;
        Ok(item.important)
    }

    pub fn remove_text(&mut self, id: &str) -> Result<(), Error> {
        let pos = self
            .draft
            .texts
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::Validation(format!("no text line with id {id}")))?;
        self.draft.texts.remove(pos);
        self.export_ready = false;
        Ok(())
    }

    pub fn set_done(&mut self, done: bool) {
        self.draft.done = done;
        self.export_ready = false;
    }

    /// Move the draft into the record as the next step and reset the buffer.
    /// An empty draft commits as a placeholder step; placeholders are kept
    /// in the record but skipped at render time.
    pub fn commit_step(&mut self) -> u32 {
        let draft = std::mem::take(&mut self.draft);
        self.record.steps.push(StepRecord {
            index: 0, // renumbered below
            photos: draft.photos,
            texts: draft.texts,
            done: draft.done,
        });
        self.record.renumber_steps();
        self.export_ready = false;
        self.record.steps.len() as u32
    }

    /// Freeze the current content and gate export on it.
    ///
    /// Bumps the version only when the canonical content differs from the
    /// last finalized snapshot; returns whether a bump happened. Fails when
    /// nothing renderable has been committed.
    pub fn finalize(&mut self) -> Result<bool, Error> {
        if !self.draft.is_empty() {
            return Err(Error::Validation(
                "current step has uncommitted content; commit or discard it first".into(),
            ));
        }
        if !self.record.steps.iter().any(StepRecord::has_content) {
            return Err(Error::Validation(
                "process has no step with a photo or a text line".into(),
            ));
        }

        let fingerprint = self.record.content_fingerprint();
        let bumped = self.last_finalized.as_deref() != Some(fingerprint.as_str());
        if bumped {
            self.record.version = self.record.version.bumped();
            self.last_finalized = Some(fingerprint);
            log::info!(
                "finalized '{}' as version {}",
                self.record.name,
                self.record.version
            );
        }
        self.export_ready = true;
        Ok(bumped)
    }

    /// Render the finalized record to PDF bytes.
    pub fn export_bytes(
        &self,
        source: &dyn PhotoSource,
        geom: &PageGeometry,
    ) -> Result<Vec<u8>, Error> {
        if !self.export_ready {
            return Err(Error::ExportPrecondition);
        }
        crate::pdf::render(&self.record, source, geom)
    }

    /// Render and write `<name-with-underscores>_protocol.pdf` into `out_dir`.
    pub fn export_to_dir(
        &self,
        source: &dyn PhotoSource,
        geom: &PageGeometry,
        out_dir: &Path,
    ) -> Result<PathBuf, Error> {
        let bytes = self.export_bytes(source, geom)?;
        let path = out_dir.join(self.record.export_file_name());
        std::fs::write(&path, &bytes)?;
        log::info!("exported {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}
