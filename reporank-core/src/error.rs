//! Error types for RepoRank core.

use std::{error::Error, fmt, io};

/// Error type for RepoRank operations.
#[derive(Debug)]
pub enum RepoRankError {
    /// An underlying I/O error.
    Io(io::Error),
    /// Invalid caller input; the request should not be retried as-is.
    Validation(String),
    /// Infrastructure failure; the whole request may be retried.
    Internal(String),
}

impl fmt::Display for RepoRankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Validation(message) => write!(f, "{message}"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl Error for RepoRankError {}

impl From<io::Error> for RepoRankError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Convenience result type for RepoRank core.
pub type Result<T> = std::result::Result<T, RepoRankError>;

#[cfg(test)]
mod tests {
    use super::RepoRankError;
    use std::io;

    #[test]
    fn io_error_formats_message() {
        let error = RepoRankError::Io(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(format!("{error}"), "io error: boom");
    }

    #[test]
    fn validation_error_formats_message_verbatim() {
        let error = RepoRankError::Validation("threshold out of range".to_string());
        assert_eq!(format!("{error}"), "threshold out of range");
    }

    #[test]
    fn internal_error_is_prefixed() {
        let error = RepoRankError::Internal("cleanup failed".to_string());
        assert_eq!(format!("{error}"), "internal error: cleanup failed");
    }

    #[test]
    fn from_io_error_maps_variant() {
        let error: RepoRankError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        match error {
            RepoRankError::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            other => panic!("expected Io variant, got {other:?}"),
        }
    }
}
