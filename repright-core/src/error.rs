use std::fmt;

use thiserror::Error;

use crate::api::Endpoint;

/// Operations that check a precondition before touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    StartSession,
    CaptureExercise,
    StopSession,
    PageHistory,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::StartSession => write!(f, "start session"),
            Operation::CaptureExercise => write!(f, "capture exercise"),
            Operation::StopSession => write!(f, "stop session"),
            Operation::PageHistory => write!(f, "page workout history"),
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot {operation}: {detail}")]
    InvalidState { operation: Operation, detail: String },

    #[error("{endpoint} request failed: {reason}")]
    Transport { endpoint: Endpoint, reason: String },

    #[error("{endpoint} returned HTTP {status}")]
    HttpStatus { endpoint: Endpoint, status: u16 },

    #[error("{endpoint} returned a malformed response: {reason}")]
    MalformedResponse { endpoint: Endpoint, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl SessionError {
    pub(crate) fn invalid_state(operation: Operation, detail: impl Into<String>) -> Self {
        SessionError::InvalidState {
            operation,
            detail: detail.into(),
        }
    }

    pub(crate) fn malformed(endpoint: Endpoint, reason: impl fmt::Display) -> Self {
        SessionError::MalformedResponse {
            endpoint,
            reason: reason.to_string(),
        }
    }

    /// True for failures that leave state intact and may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::Transport { .. }
                | SessionError::HttpStatus { .. }
                | SessionError::MalformedResponse { .. }
        )
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, SessionError::InvalidState { .. })
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
