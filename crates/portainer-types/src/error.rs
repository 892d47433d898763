//! Error taxonomy shared across Portainer crates

use crate::api::{ApiResponse, ResponseBody};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Common result type
pub type Result<T> = std::result::Result<T, PortainerError>;

/// Errors surfaced by every client operation.
///
/// The three kinds are distinct variants so callers can match on them
/// instead of inspecting messages.
#[derive(Error, Debug)]
pub enum PortainerError {
    /// An authenticated call was attempted before `login()` succeeded
    #[error("Not logged in: call login() first")]
    NotAuthenticated,

    /// The server answered with a status the operation does not accept
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Network failure, timeout, or an undecodable response body
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl PortainerError {
    /// HTTP status carried by an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            PortainerError::Api(err) => Some(err.status),
            _ => None,
        }
    }

    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, PortainerError::NotAuthenticated)
    }

    pub fn is_api(&self) -> bool {
        matches!(self, PortainerError::Api(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, PortainerError::Transport(_))
    }
}

impl From<serde_json::Error> for PortainerError {
    fn from(err: serde_json::Error) -> Self {
        PortainerError::Transport(TransportError::from(err))
    }
}

/// Non-success answer from the Portainer API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// API path relative to the base URL, e.g. `endpoints/1`
    pub path: String,
    pub status: u16,
    pub message: Option<String>,
    pub details: Option<String>,
}

/// Error body shape returned by Portainer. Both fields are optional on the wire.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(path: impl Into<String>, status: u16) -> Self {
        Self {
            path: path.into(),
            status,
            message: None,
            details: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Build an error from a response, reading `message` and `details` when the
    /// body is a JSON object and falling back to the raw body otherwise.
    pub fn from_response(path: impl Into<String>, response: &ApiResponse) -> Self {
        let error = Self::new(path, response.status_code);

        match &response.body {
            ResponseBody::Json(value) if value.is_object() => {
                let body: ErrorBody = serde_json::from_value(value.clone()).unwrap_or_default();
                Self {
                    message: body.message,
                    details: body.details.and_then(|details| match details {
                        serde_json::Value::Null => None,
                        serde_json::Value::String(text) => Some(text),
                        other => Some(other.to_string()),
                    }),
                    ..error
                }
            }
            ResponseBody::Json(value) => error.with_message(value.to_string()),
            ResponseBody::Text(text) if !text.is_empty() => error.with_message(text.clone()),
            _ => error,
        }
    }

    /// Same as [`ApiError::from_response`] but drops `details`.
    ///
    /// Container start/stop/restart error bodies do not reliably carry it.
    pub fn from_response_message_only(path: impl Into<String>, response: &ApiResponse) -> Self {
        Self {
            details: None,
            ..Self::from_response(path, response)
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error on '{}' (status {})", self.path, self.status)?;
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        if let Some(details) = self.details.as_deref().filter(|d| !d.is_empty()) {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Failures below the HTTP status level
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Failed to decode response body: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}
