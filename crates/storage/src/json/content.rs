//! Exercise bank loading from the static content document.
//!
//! The document maps category names to exercise lists, e.g.
//! `{"sql": [{"id": "q1", "prompt": "...", "answer": {"kind": "single_choice", ...}}]}`.
//! Category order in the file is the bank's iteration order.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use study_core::model::{
    AnswerKey, BankError, CategoryName, Difficulty, Exercise, ExerciseBank, ExerciseError,
    ExerciseId, IdError,
};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("failed to read content: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed content document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid identifier: {0}")]
    Id(#[from] IdError),

    #[error("invalid exercise {id}: {source}")]
    Exercise {
        id: String,
        #[source]
        source: ExerciseError,
    },

    #[error(transparent)]
    Bank(#[from] BankError),
}

/// Serialized shape of one exercise in the content document.
#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseRecord {
    pub id: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub prompt: String,
    pub answer: AnswerKey,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl ExerciseRecord {
    /// Convert the record into a validated exercise of `category`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the id is blank or the exercise fails validation.
    pub fn into_exercise(self, category: &CategoryName) -> Result<Exercise, ContentError> {
        let id = ExerciseId::new(self.id.as_str())?;
        let mut exercise = Exercise::new(
            id,
            category.clone(),
            self.difficulty,
            self.prompt,
            self.answer,
        )
        .map_err(|source| ContentError::Exercise {
            id: self.id,
            source,
        })?;

        if let Some(explanation) = self.explanation {
            exercise = exercise.with_explanation(explanation);
        }
        if let Some(hint) = self.hint {
            exercise = exercise.with_hint(hint);
        }
        Ok(exercise)
    }
}

/// Parse a content document into an exercise bank.
///
/// # Errors
///
/// Returns `ContentError` for malformed JSON, invalid exercises or duplicate ids.
pub fn load_bank_from_str(raw: &str) -> Result<ExerciseBank, ContentError> {
    let document: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;

    let mut groups = Vec::with_capacity(document.len());
    for (name, value) in document {
        let category = CategoryName::new(name)?;
        let records: Vec<ExerciseRecord> = serde_json::from_value(value)?;
        let exercises = records
            .into_iter()
            .map(|record| record.into_exercise(&category))
            .collect::<Result<Vec<_>, _>>()?;
        groups.push((category, exercises));
    }

    let bank = ExerciseBank::new(groups)?;
    log::debug!(
        "Loaded {} exercises in {} categories",
        bank.len(),
        bank.categories().len()
    );
    Ok(bank)
}

/// Read and parse a content document from disk.
///
/// # Errors
///
/// Returns `ContentError::Io` if the file cannot be read, or any parse error.
pub fn load_bank_from_path(path: impl AsRef<Path>) -> Result<ExerciseBank, ContentError> {
    let path = path.as_ref();
    log::debug!("Loading exercise bank from {}", path.display());
    let raw = fs::read_to_string(path)?;
    load_bank_from_str(&raw)
}
