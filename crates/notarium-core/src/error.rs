//! Error types for the notarium client.

use thiserror::Error;

/// Result type alias using notarium's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notarium client operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Session credentials rejected by the backend (HTTP 401 equivalent).
    /// Forces re-login; never retried.
    #[error("Authentication expired, sign in again")]
    AuthExpired,

    /// Invalid user input, surfaced inline and never sent to the backend
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP/network request failed (transient; safe to retry)
    #[error("Request error: {0}")]
    Request(String),

    /// Backend rejected the operation with an error envelope
    #[error("Backend error {code}: {message}")]
    Api { code: i32, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures that a later attempt may clear (network faults).
    /// Auth expiry, validation, and backend rejections are not transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Request(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_auth_expired() {
        let err = Error::AuthExpired;
        assert_eq!(err.to_string(), "Authentication expired, sign in again");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("empty message".to_string());
        assert_eq!(err.to_string(), "Invalid input: empty message");
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("note 42".to_string());
        assert_eq!(err.to_string(), "Not found: note 42");
    }

    #[test]
    fn test_error_display_request() {
        let err = Error::Request("network unreachable".to_string());
        assert_eq!(err.to_string(), "Request error: network unreachable");
    }

    #[test]
    fn test_error_display_api() {
        let err = Error::Api {
            code: 500,
            message: "note does not exist".to_string(),
        };
        assert_eq!(err.to_string(), "Backend error 500: note does not exist");
    }

    #[test]
    fn test_is_transient() {
        assert!(Error::Request("timeout".to_string()).is_transient());
        assert!(!Error::AuthExpired.is_transient());
        assert!(!Error::InvalidInput("x".to_string()).is_transient());
        assert!(!Error::Api {
            code: 500,
            message: "x".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
