use thiserror::Error as ThisError;
use uniffi::Error;

use crate::error::SessionError;

#[derive(Debug, ThisError, Error)]
#[uniffi(flat_error)]
#[non_exhaustive]
pub enum RepRightError {
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    MalformedResponse(String),
    #[error("{0}")]
    Config(String),
}

impl From<SessionError> for RepRightError {
    fn from(e: SessionError) -> Self {
        let message = e.to_string();
        match e {
            SessionError::InvalidState { .. } => RepRightError::InvalidState(message),
            SessionError::Transport { .. } | SessionError::HttpStatus { .. } => {
                RepRightError::Transport(message)
            }
            SessionError::MalformedResponse { .. } => RepRightError::MalformedResponse(message),
            SessionError::Config(_) => RepRightError::Config(message),
        }
    }
}

impl From<tokio::task::JoinError> for RepRightError {
    fn from(e: tokio::task::JoinError) -> Self {
        RepRightError::Transport(format!("background task failed: {}", e))
    }
}

impl From<std::io::Error> for RepRightError {
    fn from(e: std::io::Error) -> Self {
        RepRightError::Config(format!("cannot start runtime: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Endpoint;

    #[test]
    fn keeps_error_class_across_the_boundary() {
        let status = SessionError::HttpStatus {
            endpoint: Endpoint::StoreExerciseReps,
            status: 503,
        };
        match RepRightError::from(status) {
            RepRightError::Transport(message) => {
                assert_eq!(message, "POST /store_exercise_reps returned HTTP 503")
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
