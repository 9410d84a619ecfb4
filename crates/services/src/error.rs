//! Shared error types for the services crate.

use thiserror::Error;

use study_core::grading::GradingError;
use study_core::model::{BankError, CategoryName, ExerciseId};

/// Errors emitted by the session engine.
///
/// All of them are recoverable: the session stays usable after any of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("unknown category: {0}")]
    InvalidCategory(CategoryName),
    #[error("unknown exercise: {0}")]
    NotFound(ExerciseId),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("no answer selected")]
    NoAnswerSelected,
    #[error("exercise {0} is already completed")]
    AlreadyCompleted(ExerciseId),
    #[error("{remaining} exercises are not completed yet")]
    Incomplete { remaining: usize },
    #[error("no active session")]
    NotActive,
}

impl SessionError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SessionError::InvalidRequest(message.into())
    }
}

impl From<BankError> for SessionError {
    fn from(err: BankError) -> Self {
        match err {
            BankError::CategoryNotFound(name) => SessionError::InvalidCategory(name),
            BankError::ExerciseNotFound(id) => SessionError::NotFound(id),
            other => SessionError::InvalidRequest(other.to_string()),
        }
    }
}

impl From<GradingError> for SessionError {
    fn from(err: GradingError) -> Self {
        SessionError::InvalidRequest(err.to_string())
    }
}
