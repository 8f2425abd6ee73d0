//! Error types for mediacat.

use thiserror::Error;

/// Result type alias using mediacat's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for mediacat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A metadata type name in a search request is not in the catalog
    #[error("invalid metadata type: {0}")]
    InvalidMetadataType(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error was caused by the request rather than the system.
    ///
    /// Client errors carry a message that is safe to show to the caller and
    /// never reference schema objects or statement text.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidMetadataType(_) | Error::InvalidInput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_metadata_type() {
        let err = Error::InvalidMetadataType("colour".to_string());
        assert_eq!(err.to_string(), "invalid metadata type: colour");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("limit must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid input: limit must be positive");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("PORT is not a number".to_string());
        assert_eq!(err.to_string(), "Configuration error: PORT is not a number");
    }

    #[test]
    fn test_error_display_internal() {
        let err = Error::Internal("unexpected state".to_string());
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_client_errors() {
        assert!(Error::InvalidMetadataType("x".into()).is_client_error());
        assert!(Error::InvalidInput("x".into()).is_client_error());
    }

    #[test]
    fn test_system_errors() {
        assert!(!Error::Database(sqlx::Error::PoolTimedOut).is_client_error());
        assert!(!Error::Config("x".into()).is_client_error());
        assert!(!Error::Internal("x".into()).is_client_error());
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: Error = sqlx::Error::RowNotFound.into();
        match err {
            Error::Database(_) => {}
            _ => panic!("Expected Database error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
