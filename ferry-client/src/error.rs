//! Error types for the Ferry client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to a SharePoint site
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }
}

/// Extracts the readable text of an OData error body
///
/// SharePoint answers failures with either
/// `{"odata.error":{"message":{"value":"..."}}}` (nometadata) or
/// `{"error":{"message":"..."}}`. Anything else is returned trimmed as is.
pub fn odata_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();

    let message = parsed.as_ref().and_then(|value| {
        value
            .pointer("/odata.error/message/value")
            .or_else(|| value.pointer("/error/message/value"))
            .or_else(|| value.pointer("/error/message"))
            .or_else(|| value.pointer("/error_description"))
            .and_then(serde_json::Value::as_str)
    });

    match message {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => "Unknown error".to_string(),
        None => body.trim().to_string(),
    }
}
