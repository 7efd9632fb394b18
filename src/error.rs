//! Error types for holdboard.

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the library.
///
/// Verification failures never appear here: the verifier folds them into
/// [`crate::reddit::CheckStatus`].
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Outbound HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(String),

    /// Entry storage error.
    #[error("store error: {0}")]
    Store(#[from] crate::store::StoreError),

    /// HTTP server failure.
    #[error("server error: {0}")]
    Server(String),
}
