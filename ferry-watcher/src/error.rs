//! Wait failures
//!
//! Every way a wait can go wrong collapses into one `WaitFailure`. Only the
//! kind, message and code differ, so callers can surface the message as is.

use ferry_client::ClientError;
use ferry_core::domain::RequestError;
use std::time::Duration;
use thiserror::Error;

/// Message used when the status payload has an unexpected shape
pub const MALFORMED_RESPONSE: &str =
    "Received an unexpected response while checking the copy job progress";

/// What ended a wait unsuccessfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Invalid request or options, no call was made
    Configuration,
    /// The status check itself failed
    Transport,
    /// The job log contains an error entry
    JobReported,
    /// The status payload could not be understood
    MalformedResponse,
    /// The caller's deadline expired
    TimedOut,
    /// The caller cancelled the wait
    Cancelled,
}

/// Terminal failure of a wait operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct WaitFailure {
    kind: FailureKind,
    message: String,
    code: Option<String>,
}

impl WaitFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    pub fn configuration(err: RequestError) -> Self {
        Self::new(FailureKind::Configuration, err.to_string())
    }

    pub fn transport(err: &ClientError) -> Self {
        let code = match err {
            ClientError::ApiError { status, .. } => Some(status.to_string()),
            _ => None,
        };

        Self {
            kind: FailureKind::Transport,
            message: format!("Failed to check copy job progress: {}", err),
            code,
        }
    }

    pub fn job_reported(message: impl Into<String>, code: Option<String>) -> Self {
        Self {
            kind: FailureKind::JobReported,
            message: message.into(),
            code,
        }
    }

    pub fn malformed() -> Self {
        Self::new(FailureKind::MalformedResponse, MALFORMED_RESPONSE)
    }

    pub fn timed_out(after: Duration) -> Self {
        Self::new(
            FailureKind::TimedOut,
            format!(
                "Timed out after {}s waiting for the copy job to finish",
                after.as_secs()
            ),
        )
    }

    pub fn cancelled() -> Self {
        Self::new(
            FailureKind::Cancelled,
            "Waiting for the copy job was cancelled",
        )
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Job or HTTP error code, when one was reported
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}
