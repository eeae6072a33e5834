//! Error types for the reclaim handover coordinator.

use thiserror::Error;

/// Result type alias using reclaim's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for handover and matching operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Handover record not found
    #[error("Handover not found: {0}")]
    HandoverNotFound(i64),

    /// A state-machine guard rejected the transition
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Caller is not a required party or role
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Collaborator service timed out or refused the connection
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::CollaboratorUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("lost record 42".to_string());
        assert_eq!(err.to_string(), "Not found: lost record 42");
    }

    #[test]
    fn test_error_display_handover_not_found() {
        let err = Error::HandoverNotFound(7);
        assert_eq!(err.to_string(), "Handover not found: 7");
    }

    #[test]
    fn test_error_display_invalid_transition() {
        let err = Error::InvalidTransition("cannot accept: current status is COMPLETED".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid transition: cannot accept: current status is COMPLETED"
        );
    }

    #[test]
    fn test_error_display_unauthorized() {
        let err = Error::Unauthorized("caller is not the responder".to_string());
        assert_eq!(err.to_string(), "Unauthorized: caller is not the responder");
    }

    #[test]
    fn test_error_display_collaborator_unavailable() {
        let err = Error::CollaboratorUnavailable("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "Collaborator unavailable: connection refused"
        );
    }

    #[test]
    fn test_error_display_serialization() {
        let err = Error::Serialization("invalid JSON".to_string());
        assert_eq!(err.to_string(), "Serialization error: invalid JSON");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing base URL".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing base URL");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("negative limit".to_string());
        assert_eq!(err.to_string(), "Invalid input: negative limit");
    }

    #[test]
    fn test_error_display_internal() {
        let err = Error::Internal("unexpected state".to_string());
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        let result = get_result();
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_result_type_err() {
        let result: Result<i32> = Err(Error::Internal("test".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::HandoverNotFound(99);
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("HandoverNotFound"));
    }
}
