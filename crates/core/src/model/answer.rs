use serde::{Deserialize, Serialize};

use crate::model::exercise::AnswerKind;

/// An answer submitted by the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// Selected option id of a single-choice exercise.
    Choice(String),
    /// Free text (SQL query, relational-algebra expression, ...).
    Text(String),
    /// Flat attribute set, or a set of dependencies for minimal covers.
    Set(Vec<String>),
    /// Set of attribute sets (candidate keys).
    KeySet(Vec<Vec<String>>),
}

impl Answer {
    /// Parse an attribute list such as `"A, B C"`.
    #[must_use]
    pub fn attributes_from_text(input: &str) -> Self {
        Answer::Set(split_attributes(input))
    }

    /// Parse candidate keys, one key per non-empty line.
    ///
    /// A line with commas or spaces is split on them; otherwise every character is
    /// one attribute, so `"BC"` reads as `{B, C}`.
    #[must_use]
    pub fn keys_from_lines(input: &str) -> Self {
        let keys = input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                if line.contains(',') || line.contains(char::is_whitespace) {
                    split_attributes(line)
                } else {
                    line.chars().map(String::from).collect()
                }
            })
            .collect();
        Answer::KeySet(keys)
    }

    /// Parse functional dependencies, one per non-empty line.
    #[must_use]
    pub fn dependencies_from_lines(input: &str) -> Self {
        Answer::Set(
            input
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    /// Whether this answer shape can be graded for the given exercise kind.
    #[must_use]
    pub fn fits(&self, kind: AnswerKind) -> bool {
        matches!(
            (self, kind),
            (Answer::Choice(_), AnswerKind::SingleChoice)
                | (Answer::Text(_), AnswerKind::FreeTextKeyword)
                | (Answer::Set(_) | Answer::KeySet(_), AnswerKind::SetEquality)
        )
    }

    /// True for answers with no content at all.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Answer::Choice(s) | Answer::Text(s) => s.trim().is_empty(),
            Answer::Set(items) => items.iter().all(|s| s.trim().is_empty()),
            Answer::KeySet(keys) => keys.iter().flatten().all(|s| s.trim().is_empty()),
        }
    }
}

fn split_attributes(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
