//! Error types for lucidshark-selector

use thiserror::Error;

/// Result type alias for selector operations
pub type Result<T> = std::result::Result<T, SelectError>;

/// Fatal errors that abort a selection run
///
/// Per-entry failures (unreadable files, broken repositories, failed ignore
/// queries) are never surfaced here; they are logged and handled in place.
#[derive(Error, Debug)]
pub enum SelectError {
    /// The traversal root could not be opened
    #[error("Cannot open directory '{path}': {reason}")]
    RootNotFound { path: String, reason: String },

    /// A selection pattern failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Conflicting output format options
    #[error("Output format conflict: --null cannot be combined with --json")]
    OutputFormatConflict,

    /// I/O error while writing results
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the result failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Git backend failure
    #[error("Git error: {0}")]
    GitError(String),
}
