use axum::http::StatusCode;
use serde_json::{ json, Value as JsonValue };
use thiserror::Error;

pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl ChatError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        ChatError::Configuration(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        ChatError::InvalidRequest(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        ChatError::Upstream(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ChatError::Configuration(_) | ChatError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// JSON body sent back to the caller. Client errors carry their message in `error`;
    /// server errors use a generic `error` and put the diagnostic in `message`.
    pub fn response_body(&self) -> JsonValue {
        match self {
            ChatError::InvalidRequest(msg) => json!({ "error": msg }),
            ChatError::Configuration(msg) | ChatError::Upstream(msg) => {
                json!({ "error": INTERNAL_ERROR, "message": msg })
            }
        }
    }
}
