//! Error types for the call coordinator

use thiserror::Error;

/// Result type for coordinator lifecycle and setup operations
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Errors that can occur while setting up or driving a coordinator
///
/// Session failures are not errors of this type: they arrive as
/// [`ErrorInfo`] payloads on the event stream and end the session normally.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// `start()` was called on a coordinator whose event loop already runs
    #[error("Coordinator already started")]
    AlreadyStarted,

    /// `start()` was called after the coordinator was stopped
    #[error("Coordinator already stopped")]
    AlreadyStopped,

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Logging setup error
    #[error("Logging error: {message}")]
    Logging { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoordinatorError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a logging error
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for CoordinatorError {
    fn from(e: toml::de::Error) -> Self {
        Self::config(e.to_string())
    }
}

impl From<toml::ser::Error> for CoordinatorError {
    fn from(e: toml::ser::Error) -> Self {
        Self::config(e.to_string())
    }
}

/// Failure reported by the call session when it ends abnormally
///
/// Carried by [`SessionEvent::Failed`](crate::events::SessionEvent::Failed) and
/// handed to the observer's `on_terminated` callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ErrorInfo {
    /// Human readable description of the failure
    pub message: String,
    /// Transport specific status code, if the session supplied one
    pub code: Option<u16>,
}

impl ErrorInfo {
    /// Create an error without a status code
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Attach a status code
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }
}

impl From<&str> for ErrorInfo {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ErrorInfo {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}
