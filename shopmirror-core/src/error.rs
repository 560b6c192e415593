//! Error types for shopmirror-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from the core helpers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An ignore pattern did not compile to a valid expression.
    #[error("invalid ignore pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Convenience constructor for [`CoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
