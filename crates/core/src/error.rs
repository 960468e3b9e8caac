//! Unified error types for cachegate.

use tokio_rusqlite::rusqlite;

/// Unified error types for the caching gateway.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed request body or parameters.
    #[error("INVALID_REQUEST: {0}")]
    InvalidRequest(String),

    /// The origin could not be parsed as a URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The content relocator could not fetch or deposit the content.
    #[error("RELOCATE_FAILED: {0}")]
    RelocateFailed(String),

    /// The record store rejected or failed an upsert.
    #[error("PERSISTENCE: {0}")]
    Persistence(String),

    /// The upsert reported success but the immediate re-read found nothing.
    #[error("Failed to process record")]
    Inconsistent,

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::RelocateFailed("connection refused".to_string());
        assert!(err.to_string().contains("RELOCATE_FAILED"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_inconsistent_message() {
        assert_eq!(Error::Inconsistent.to_string(), "Failed to process record");
    }
}
