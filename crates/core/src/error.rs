use thiserror::Error;

use crate::grading::GradingError;
use crate::model::{BankError, ExerciseError, IdError, SettingsError};

/// Umbrella error for callers that do not care which domain check failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Exercise(#[from] ExerciseError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Grading(#[from] GradingError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
