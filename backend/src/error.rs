use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while converting a module.
///
/// The taxonomy distinguishes per-verse failures (`OutOfRange`,
/// `CorruptBlock`), which the extractor recovers from with an empty
/// placeholder, from module-fatal failures (`VersificationMismatch`),
/// which abort the module but not a batch run.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("verse slot out of range: {slot} (index has {max} records)")]
    OutOfRange { slot: usize, max: usize },

    #[error("corrupt block {block}: {reason}")]
    CorruptBlock { block: u32, reason: String },

    #[error("versification mismatch for module {module}: {failed} of {checked} anchor references failed")]
    VersificationMismatch {
        module: String,
        failed: usize,
        checked: usize,
    },

    #[error("no mapping from {from_system} to {to_system} for {book} {chapter}:{verse}")]
    NoMapping {
        from_system: String,
        to_system: String,
        book: String,
        chapter: i32,
        verse: i32,
    },

    #[error("unknown book: {0}")]
    UnknownBook(String),

    #[error("unknown versification system: {0}")]
    UnknownSystem(String),

    #[error("unsupported module driver: {0}")]
    UnsupportedDriver(String),

    #[error("invalid module configuration {path}: {reason}")]
    InvalidConf { path: PathBuf, reason: String },

    #[error("module data not found: {0}")]
    DataNotFound(PathBuf),

    #[error("extraction cancelled")]
    Cancelled,

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("database connection error: {0}")]
    Connection(#[from] diesel::result::ConnectionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    /// Per-verse errors are recovered with a placeholder; everything else
    /// aborts the current module.
    pub fn is_verse_recoverable(&self) -> bool {
        matches!(
            self,
            ConvertError::OutOfRange { .. } | ConvertError::CorruptBlock { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
