//! Error types for shopmirror-remote.

use thiserror::Error;

/// All errors the remote layer can surface.
///
/// Not-found never appears here: lookups that can legitimately miss return
/// `Ok(None)` or an empty collection instead, so only real transport and
/// protocol failures propagate.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Connection, TLS or body-decoding failure.
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with a non-success status.
    #[error("{path} returned HTTP {status}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },
}
