//! Error types shared across the avkit tools.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the avkit core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A timestamp string did not match `[[HH:]MM:]SS[.mmm]`.
    #[error("invalid timestamp format: {0:?}")]
    Format(String),

    /// A 1-based chapter index pointed outside the chapter list.
    #[error("chapter number {index} is out of range (1-{count})")]
    ChapterIndex { index: usize, count: usize },

    /// The metadata document had no usable chapter entries.
    #[error("no chapters found in metadata")]
    NoChapters,

    /// Subtitle blocks and translation lines disagree in number.
    #[error("{blocks} subtitle blocks but {translations} translation lines")]
    CountMismatch { blocks: usize, translations: usize },

    /// A directory scan turned up nothing to work on.
    #[error("no matching input files under {0}")]
    NoInputFiles(PathBuf),

    /// An external binary was not on the PATH.
    #[error("{tool} not found, is it installed and on the PATH?")]
    ToolMissing { tool: String },

    /// An external binary ran but exited with a failure status.
    #[error("{tool} exited with status {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: i32,
        stderr: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("metadata parse error: {0}")]
    Json(#[from] serde_json::Error),
}
