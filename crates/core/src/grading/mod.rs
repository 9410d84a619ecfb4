//! Grading strategies for submitted answers.
//!
//! Single-choice and set-equality exercises are hard-graded (pass/fail). Free-text
//! exercises only receive an advisory keyword coverage score.

mod keywords;
mod sets;

use thiserror::Error;

use crate::model::{Answer, AnswerKey, AnswerKind, Exercise, GradingSettings};

pub use keywords::{CoverageBand, KeywordGrader, SqlHint};
pub use sets::{SetEqualityGrader, normalize_dependency};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GradingError {
    #[error("a {submitted} answer cannot be graded against a {expected:?} exercise")]
    AnswerMismatch {
        expected: AnswerKind,
        submitted: &'static str,
    },

    #[error("{0:?} exercises are not graded")]
    NotGradable(AnswerKind),
}

impl GradingError {
    pub(crate) fn mismatch(key: &AnswerKey, answer: &Answer) -> Self {
        let submitted = match answer {
            Answer::Choice(_) => "choice",
            Answer::Text(_) => "text",
            Answer::Set(_) => "set",
            Answer::KeySet(_) => "key set",
        };
        GradingError::AnswerMismatch {
            expected: key.kind(),
            submitted,
        }
    }
}

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// What the grader found, for feedback rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradeDetail {
    Choice {
        expected: String,
        submitted: String,
    },
    Set {
        missing: Vec<String>,
        extra: Vec<String>,
    },
    Keywords {
        found: Vec<String>,
        missing: Vec<String>,
        hints: Vec<SqlHint>,
    },
}

/// Grading verdict. Advisory grades never decide pass/fail on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grade {
    Hard {
        correct: bool,
        detail: GradeDetail,
    },
    Advisory {
        coverage: u8,
        band: CoverageBand,
        meets_threshold: bool,
        detail: GradeDetail,
    },
}

impl Grade {
    /// `Some(verdict)` for hard grades, `None` for advisory ones.
    #[must_use]
    pub fn correct(&self) -> Option<bool> {
        match self {
            Grade::Hard { correct, .. } => Some(*correct),
            Grade::Advisory { .. } => None,
        }
    }

    /// Verdict written to the progress record.
    #[must_use]
    pub fn counts_as_correct(&self) -> bool {
        match self {
            Grade::Hard { correct, .. } => *correct,
            Grade::Advisory {
                meets_threshold, ..
            } => *meets_threshold,
        }
    }

    #[must_use]
    pub fn coverage(&self) -> Option<u8> {
        match self {
            Grade::Hard { .. } => None,
            Grade::Advisory { coverage, .. } => Some(*coverage),
        }
    }

    #[must_use]
    pub fn detail(&self) -> &GradeDetail {
        match self {
            Grade::Hard { detail, .. } | Grade::Advisory { detail, .. } => detail,
        }
    }
}

//
// ─── STRATEGIES ────────────────────────────────────────────────────────────────
//

/// Compares a submitted answer with an answer key.
pub trait GradingStrategy {
    /// # Errors
    ///
    /// Returns `GradingError::AnswerMismatch` if the answer shape does not fit the key.
    fn evaluate(&self, key: &AnswerKey, answer: &Answer) -> Result<Grade, GradingError>;
}

/// Exact option-id match.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleChoiceGrader;

impl GradingStrategy for SingleChoiceGrader {
    fn evaluate(&self, key: &AnswerKey, answer: &Answer) -> Result<Grade, GradingError> {
        match (key, answer) {
            (AnswerKey::SingleChoice { correct, .. }, Answer::Choice(submitted)) => {
                Ok(Grade::Hard {
                    correct: submitted == correct,
                    detail: GradeDetail::Choice {
                        expected: correct.clone(),
                        submitted: submitted.clone(),
                    },
                })
            }
            _ => Err(GradingError::mismatch(key, answer)),
        }
    }
}

/// Dispatches to the strategy matching an exercise's answer kind.
#[derive(Debug, Clone, Default)]
pub struct Grader {
    keywords: KeywordGrader,
}

impl Grader {
    #[must_use]
    pub fn new(settings: GradingSettings) -> Self {
        Self {
            keywords: KeywordGrader::new(settings),
        }
    }

    /// Grade `answer` against the exercise's answer key.
    ///
    /// # Errors
    ///
    /// Returns `GradingError::AnswerMismatch` if the answer shape does not fit the exercise
    /// and `GradingError::NotGradable` for flashcards.
    pub fn grade(&self, exercise: &Exercise, answer: &Answer) -> Result<Grade, GradingError> {
        let kind = exercise.answer_kind();
        self.strategy(kind)
            .ok_or(GradingError::NotGradable(kind))?
            .evaluate(exercise.answer_key(), answer)
    }

    fn strategy(&self, kind: AnswerKind) -> Option<&dyn GradingStrategy> {
        match kind {
            AnswerKind::SingleChoice => Some(&SingleChoiceGrader),
            AnswerKind::SetEquality => Some(&SetEqualityGrader),
            AnswerKind::FreeTextKeyword => Some(&self.keywords),
            AnswerKind::Reveal => None,
        }
    }
}
