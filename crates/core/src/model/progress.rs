use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::answer::Answer;
use crate::model::ids::CategoryName;

/// Result of grading that is written into a progress record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub correct: bool,
    pub raw_answer: Answer,
    /// Keyword coverage in percent for advisory grades.
    pub coverage: Option<u8>,
}

/// Which records an aggregate or reset applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    Category(CategoryName),
}

impl Scope {
    #[must_use]
    pub fn includes(&self, record: &ProgressRecord) -> bool {
        match self {
            Scope::All => true,
            Scope::Category(name) => record.category() == name,
        }
    }
}

/// Persisted per-exercise progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    category: CategoryName,
    #[serde(default)]
    attempts: u32,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_answer: Option<Answer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coverage: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// A fresh record with no attempts.
    #[must_use]
    pub fn new(category: CategoryName) -> Self {
        Self {
            category,
            attempts: 0,
            completed: false,
            correct: false,
            last_answer: None,
            coverage: None,
            updated_at: None,
        }
    }

    /// Rehydrate a record from an older storage layout.
    #[must_use]
    pub fn from_persisted(
        category: CategoryName,
        attempts: u32,
        completed: bool,
        correct: bool,
        last_answer: Option<Answer>,
    ) -> Self {
        Self {
            category,
            attempts,
            completed,
            correct,
            last_answer,
            coverage: None,
            updated_at: None,
        }
    }

    /// Count a graded submission.
    pub fn apply_outcome(&mut self, outcome: Outcome, at: DateTime<Utc>) {
        self.attempts = self.attempts.saturating_add(1);
        self.completed = true;
        self.correct = outcome.correct;
        self.coverage = outcome.coverage;
        self.last_answer = Some(outcome.raw_answer);
        self.updated_at = Some(at);
    }

    /// Keep an ungraded draft answer.
    pub fn apply_draft(&mut self, answer: Answer, at: DateTime<Utc>) {
        self.last_answer = Some(answer);
        self.updated_at = Some(at);
    }

    /// Mark as done without counting an attempt.
    pub fn mark_complete(&mut self, at: DateTime<Utc>) {
        self.completed = true;
        self.updated_at = Some(at);
    }

    #[must_use]
    pub fn category(&self) -> &CategoryName {
        &self.category
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn correct(&self) -> bool {
        self.correct
    }

    #[must_use]
    pub fn last_answer(&self) -> Option<&Answer> {
        self.last_answer.as_ref()
    }

    #[must_use]
    pub fn coverage(&self) -> Option<u8> {
        self.coverage
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

/// Counts derived from progress records; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregateScore {
    pub correct: u32,
    pub completed: u32,
    pub attempts: u32,
}

impl AggregateScore {
    #[must_use]
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ProgressRecord>) -> Self {
        records
            .into_iter()
            .fold(Self::default(), |mut score, record| {
                if record.correct {
                    score.correct = score.correct.saturating_add(1);
                }
                if record.completed {
                    score.completed = score.completed.saturating_add(1);
                }
                score.attempts = score.attempts.saturating_add(record.attempts);
                score
            })
    }

    /// Share of completed exercises answered correctly, rounded to a whole percent.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.completed == 0 {
            return 0;
        }
        let pct = (u64::from(self.correct) * 100 + u64::from(self.completed) / 2)
            / u64::from(self.completed);
        u8::try_from(pct.min(100)).unwrap_or(100)
    }
}
