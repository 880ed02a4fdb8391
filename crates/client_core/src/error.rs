use shared::error::SchemaError;
use thiserror::Error;

use crate::session::SessionState;

/// Fallback shown when the analyzer gives no usable reason for a failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to analyze document. Please try again.";
pub const INVALID_FILE_MESSAGE: &str = "Please select a valid PDF file";
pub const NO_CANDIDATE_MESSAGE: &str = "Please select a PDF file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Request,
    Parse,
    Precondition,
    Export,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),
    #[error("no document selected")]
    NoCandidate,
    #[error("an analysis is already in progress")]
    AlreadySubmitting,
    #[error("cannot {action} while session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },
    #[error("analysis request failed: {message}")]
    Request {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<reqwest::Error>,
    },
    #[error("analysis response did not match the expected schema: {0}")]
    Parse(#[from] SchemaError),
    #[error("session was reset while the analysis was in flight")]
    Superseded,
    #[error("failed to serialize report: {0}")]
    Export(#[from] serde_json::Error),
}

impl SessionError {
    pub(crate) fn remote(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Request {
            message: message.into(),
            status,
            source: None,
        }
    }

    pub(crate) fn transport(source: reqwest::Error) -> Self {
        Self::Request {
            message: GENERIC_FAILURE_MESSAGE.to_string(),
            status: source.status().map(|status| status.as_u16()),
            source: Some(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Validation(_) => ErrorKind::Validation,
            SessionError::Request { .. } => ErrorKind::Request,
            SessionError::Parse(_) => ErrorKind::Parse,
            SessionError::Export(_) => ErrorKind::Export,
            SessionError::NoCandidate
            | SessionError::AlreadySubmitting
            | SessionError::InvalidTransition { .. }
            | SessionError::Superseded => ErrorKind::Precondition,
        }
    }

    /// The single message string surfaced to the user.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Validation(message) => message.clone(),
            SessionError::NoCandidate => NO_CANDIDATE_MESSAGE.to_string(),
            SessionError::Request { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
