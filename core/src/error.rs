//! Error types for catalog operations.

use thiserror::Error;

/// Errors that can occur while reading or writing message catalogs.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The PO source is not well formed.
    #[error("{path}:{line}: malformed catalog entry: {message}")]
    MalformedEntry {
        path: String,
        line: usize,
        message: String,
    },

    /// A string literal was opened but never closed.
    #[error("{path}:{line}: unterminated string")]
    UnterminatedString { path: String, line: usize },
}

/// Convenience alias for results with [`CatalogError`].
pub type Result<T> = std::result::Result<T, CatalogError>;
