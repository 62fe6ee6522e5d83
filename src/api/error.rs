//! Error types for Web API requests

use super::constants::UNEXPECTED_ERROR;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Errors surfaced by the request client
#[derive(Debug, Clone, thiserror::Error)]
pub enum SdkError {
    /// Malformed call inputs; raised before anything is sent
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The request never produced an HTTP response
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a status outside the success set
    #[error("{0}")]
    Api(ApiError),

    /// Version discovery failed or returned something unreadable
    #[error("{0}")]
    VersionParseFailure(String),
}

impl SdkError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Error body suitable for display and for folding into a result
    pub fn to_api_error(&self) -> ApiError {
        match self {
            Self::Api(error) => error.clone(),
            other => ApiError::from_message(other.to_string()),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

/// Structured error returned by the Web API in the `error` field of a failed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default = "unexpected_error_message")]
    pub message: String,
    /// HTTP status, when the error came from a response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Any further fields the server sent (innererror, etc.)
    #[serde(flatten)]
    pub details: serde_json::Map<String, Value>,
}

fn unexpected_error_message() -> String {
    UNEXPECTED_ERROR.to_string()
}

impl ApiError {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            status: None,
            details: serde_json::Map::new(),
        }
    }

    /// Generic error used when the response body has no readable error
    pub fn unexpected(status: Option<u16>) -> Self {
        Self {
            status,
            ..Self::from_message(UNEXPECTED_ERROR)
        }
    }

    /// Parse the `error` field of a failed response body, falling back to the generic error
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|mut json| json.get_mut("error").map(Value::take))
            .and_then(|error| serde_json::from_value::<ApiError>(error).ok());

        match parsed {
            Some(mut error) => {
                error.status = Some(status);
                error
            }
            None => Self::unexpected(Some(status)),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.code) {
            (Some(status), Some(code)) => write!(f, "{} ({}, HTTP {})", self.message, code, status),
            (Some(status), None) => write!(f, "{} (HTTP {})", self.message, status),
            (None, Some(code)) => write!(f, "{} ({})", self.message, code),
            (None, None) => f.write_str(&self.message),
        }
    }
}
