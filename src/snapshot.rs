//! Persisted snapshot format: a JSON document mirroring [`ProcessRecord`].
//!
//! Loading is deliberately lenient. Only two things are hard requirements:
//! the payload parses as a JSON object with a string `name`, and `steps` is
//! a sequence. Every other structural mismatch coerces field-by-field to a
//! safe default, so a half-broken snapshot still opens instead of losing
//! the user's work.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Error;
use crate::model::{ProcessRecord, StepRecord, TextItem, Version};

pub fn save(record: &ProcessRecord) -> Result<Vec<u8>, Error> {
    Ok(serde_json::to_vec_pretty(record)?)
}

pub fn save_to_path(record: &ProcessRecord, path: &Path) -> Result<(), Error> {
    let bytes = save(record)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<ProcessRecord, Error> {
    let bytes = std::fs::read(path)?;
    load(&bytes)
}

pub fn load(bytes: &[u8]) -> Result<ProcessRecord, Error> {
    let root: Value =
        serde_json::from_slice(bytes).map_err(|e| Error::LoadFormat(e.to_string()))?;
    let obj = root
        .as_object()
        .ok_or_else(|| Error::LoadFormat("top level is not an object".to_string()))?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::LoadFormat("missing process name".to_string()))?
        .to_string();

    let raw_steps = obj
        .get("steps")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::LoadFormat("steps is not a sequence".to_string()))?;

    let version = match obj.get("version").and_then(Value::as_str) {
        Some(s) => match Version::from_str(s) {
            Ok(v) => v,
            Err(()) => {
                log::warn!("snapshot version '{s}' is not <major>.<minor>, using 1.0");
                Version::INITIAL
            }
        },
        None => {
            log::warn!("snapshot has no version, using 1.0");
            Version::INITIAL
        }
    };

    let created_at = match obj.get("created_at").and_then(Value::as_str) {
        Some(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(e) => {
                log::warn!("snapshot created_at '{s}' unreadable ({e}), using now");
                Utc::now()
            }
        },
        None => {
            log::warn!("snapshot has no created_at, using now");
            Utc::now()
        }
    };

    let steps = raw_steps
        .iter()
        .enumerate()
        .map(|(i, raw)| coerce_step(raw, (i + 1) as u32))
        .collect();

    Ok(ProcessRecord {
        name,
        version,
        created_at,
        steps,
    })
}

fn coerce_step(raw: &Value, positional_index: u32) -> StepRecord {
    let Some(obj) = raw.as_object() else {
        log::warn!("step {positional_index} is not an object, loading as empty placeholder");
        return StepRecord {
            index: positional_index,
            photos: Vec::new(),
            texts: Vec::new(),
            done: false,
        };
    };

    let index = obj
        .get("index")
        .and_then(Value::as_u64)
        .filter(|&n| n >= 1)
        .map(|n| n as u32)
        .unwrap_or(positional_index);

    let photos = obj
        .get("photos")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let texts = obj
        .get("texts")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(coerce_text_item).collect())
        .unwrap_or_default();

    let done = obj.get("done").and_then(Value::as_bool).unwrap_or(false);

    StepRecord {
        index,
        photos,
        texts,
        done,
    }
}

fn coerce_text_item(raw: &Value) -> Option<TextItem> {
    let obj = raw.as_object()?;
    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let content = obj
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let important = obj
        .get("important")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Some(TextItem {
        id,
        content,
        important,
    })
}
