//! Error types for shopmirror-sync.

use std::path::PathBuf;

use thiserror::Error;

/// All errors a pull or push can stop on.
///
/// Any error is fail-stop: the current batch finishes aborting and the
/// invocation returns, leaving both sides in a consistent (if incomplete)
/// state that the next run converges from.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Core(#[from] shopmirror_core::CoreError),

    #[error(transparent)]
    Remote(#[from] shopmirror_remote::RemoteError),

    /// A local file that should hold JSON does not parse.
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON conversion failed: {0}")]
    Json(#[from] serde_json::Error),

    /// No theme matched the requested name (or no published theme exists).
    #[error("no matching theme (looked for {})", .name.as_deref().unwrap_or("the published theme"))]
    ThemeNotFound { name: Option<String> },

    /// A binary asset's base64 attachment did not decode.
    #[error("invalid attachment encoding for {key}: {source}")]
    Attachment {
        key: String,
        #[source]
        source: base64::DecodeError,
    },

    /// A concurrent batch task panicked or was cancelled.
    #[error("sync task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
