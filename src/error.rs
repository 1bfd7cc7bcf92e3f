use thiserror::Error;

/// Failure taxonomy for recording, persisting, and exporting a process.
///
/// `ImageDecode` is the one locally-recovered case: the offending photo is
/// skipped during block building and the export continues. Everything else
/// aborts the triggering operation and leaves prior state untouched.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("could not decode image '{reference}': {reason}")]
    ImageDecode { reference: String, reason: String },

    #[error("snapshot is not loadable: {0}")]
    LoadFormat(String),

    #[error("export requires a finalized process (finish the process first)")]
    ExportPrecondition,

    #[error("invalid page geometry: {0}")]
    Geometry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
