use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{CategoryName, ExerciseId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("exercise prompt cannot be empty")]
    EmptyPrompt,

    #[error("single-choice exercise needs at least two options")]
    TooFewOptions,

    #[error("duplicate option id: {0}")]
    DuplicateOption(String),

    #[error("correct answer {0:?} is not one of the options")]
    UnknownCorrectOption(String),

    #[error("keyword exercise needs at least one concept")]
    NoConcepts,

    #[error("concept {0:?} has an empty keyword list")]
    EmptyKeywordList(String),

    #[error("set answer cannot be empty")]
    EmptySet,

    #[error("flashcard answer cannot be empty")]
    EmptyRevealAnswer,
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

//
// ─── ANSWER KEYS ───────────────────────────────────────────────────────────────
//

/// One selectable option of a single-choice exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub text: String,
}

/// How a free-text concept is detected in a submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordRule {
    /// The concept counts as present when the answer is longer than `n` characters.
    MinLength(usize),
    /// Present when any of the keywords appears.
    AnyOf(Vec<String>),
    /// Present only when every keyword appears.
    AllOf(Vec<String>),
}

/// A named concept the grader looks for in free-text answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<KeywordRule>,
}

impl Concept {
    #[must_use]
    pub fn new(label: impl Into<String>, rule: KeywordRule) -> Self {
        Self {
            label: label.into(),
            rule: Some(rule),
        }
    }

    /// A concept detected by its own label.
    #[must_use]
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            rule: None,
        }
    }

    /// The rule used for grading; an unset rule searches for the label itself.
    #[must_use]
    pub fn effective_rule(&self) -> KeywordRule {
        match &self.rule {
            Some(rule) => rule.clone(),
            None => KeywordRule::AnyOf(vec![self.label.clone()]),
        }
    }
}

/// Hand-authored answer key. The variant decides which grading strategy applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerKey {
    SingleChoice {
        options: Vec<ChoiceOption>,
        correct: String,
    },
    Keywords {
        concepts: Vec<Concept>,
        #[serde(default)]
        sql_checks: bool,
    },
    /// Attribute closure: a flat set of attributes.
    AttributeSet { attributes: Vec<String> },
    /// Candidate keys: a set of attribute sets.
    KeySet { keys: Vec<Vec<String>> },
    /// Minimal cover: a set of functional dependencies such as `"A → B"`.
    DependencySet { dependencies: Vec<String> },
    /// Flashcard: the answer is shown on request and never graded.
    Reveal { answer: String },
}

/// Grading family of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    SingleChoice,
    FreeTextKeyword,
    SetEquality,
    /// Flashcards complete through self-assessment only.
    Reveal,
}

impl AnswerKind {
    /// Hard-graded kinds produce a pass/fail verdict; free text is advisory only.
    #[must_use]
    pub fn is_hard_graded(self) -> bool {
        matches!(self, AnswerKind::SingleChoice | AnswerKind::SetEquality)
    }

    /// Whether a submitted answer can be graded at all.
    #[must_use]
    pub fn is_gradable(self) -> bool {
        self != AnswerKind::Reveal
    }
}

impl AnswerKey {
    #[must_use]
    pub fn kind(&self) -> AnswerKind {
        match self {
            AnswerKey::SingleChoice { .. } => AnswerKind::SingleChoice,
            AnswerKey::Keywords { .. } => AnswerKind::FreeTextKeyword,
            AnswerKey::AttributeSet { .. }
            | AnswerKey::KeySet { .. }
            | AnswerKey::DependencySet { .. } => AnswerKind::SetEquality,
            AnswerKey::Reveal { .. } => AnswerKind::Reveal,
        }
    }

    fn validate(&self) -> Result<(), ExerciseError> {
        match self {
            AnswerKey::SingleChoice { options, correct } => {
                if options.len() < 2 {
                    return Err(ExerciseError::TooFewOptions);
                }
                let mut seen = HashSet::new();
                for option in options {
                    if !seen.insert(option.id.as_str()) {
                        return Err(ExerciseError::DuplicateOption(option.id.clone()));
                    }
                }
                if !seen.contains(correct.as_str()) {
                    return Err(ExerciseError::UnknownCorrectOption(correct.clone()));
                }
            }
            AnswerKey::Keywords { concepts, .. } => {
                if concepts.is_empty() {
                    return Err(ExerciseError::NoConcepts);
                }
                for concept in concepts {
                    if let Some(KeywordRule::AnyOf(words) | KeywordRule::AllOf(words)) =
                        &concept.rule
                    {
                        if words.is_empty() {
                            return Err(ExerciseError::EmptyKeywordList(concept.label.clone()));
                        }
                    }
                }
            }
            AnswerKey::AttributeSet { attributes } => {
                if attributes.is_empty() {
                    return Err(ExerciseError::EmptySet);
                }
            }
            AnswerKey::KeySet { keys } => {
                if keys.is_empty() || keys.iter().any(Vec::is_empty) {
                    return Err(ExerciseError::EmptySet);
                }
            }
            AnswerKey::DependencySet { dependencies } => {
                if dependencies.is_empty() {
                    return Err(ExerciseError::EmptySet);
                }
            }
            AnswerKey::Reveal { answer } => {
                if answer.trim().is_empty() {
                    return Err(ExerciseError::EmptyRevealAnswer);
                }
            }
        }
        Ok(())
    }
}

//
// ─── EXERCISE ──────────────────────────────────────────────────────────────────
//

/// Immutable exercise record owned by the exercise bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    id: ExerciseId,
    category: CategoryName,
    difficulty: Difficulty,
    prompt: String,
    answer_key: AnswerKey,
    explanation: Option<String>,
    hint: Option<String>,
}

impl Exercise {
    /// Creates a validated exercise.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError` if the prompt is blank or the answer key is malformed.
    pub fn new(
        id: ExerciseId,
        category: CategoryName,
        difficulty: Difficulty,
        prompt: impl Into<String>,
        answer_key: AnswerKey,
    ) -> Result<Self, ExerciseError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(ExerciseError::EmptyPrompt);
        }
        answer_key.validate()?;

        Ok(Self {
            id,
            category,
            difficulty,
            prompt,
            answer_key,
            explanation: None,
            hint: None,
        })
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &ExerciseId {
        &self.id
    }

    #[must_use]
    pub fn category(&self) -> &CategoryName {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn answer_key(&self) -> &AnswerKey {
        &self.answer_key
    }

    #[must_use]
    pub fn answer_kind(&self) -> AnswerKind {
        self.answer_key.kind()
    }

    /// The flashcard answer, for reveal-only exercises.
    #[must_use]
    pub fn reveal_answer(&self) -> Option<&str> {
        match &self.answer_key {
            AnswerKey::Reveal { answer } => Some(answer),
            _ => None,
        }
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: &str) -> ChoiceOption {
        ChoiceOption {
            id: id.to_owned(),
            text: format!("Option {id}"),
        }
    }

    fn build(key: AnswerKey) -> Result<Exercise, ExerciseError> {
        Exercise::new(
            ExerciseId::new("cv1").unwrap(),
            CategoryName::new("entity").unwrap(),
            Difficulty::Easy,
            "Is this insert valid?",
            key,
        )
    }

    #[test]
    fn single_choice_requires_known_correct_option() {
        let err = build(AnswerKey::SingleChoice {
            options: vec![option("a"), option("b")],
            correct: "c".into(),
        })
        .unwrap_err();
        assert_eq!(err, ExerciseError::UnknownCorrectOption("c".into()));
    }

    #[test]
    fn single_choice_rejects_duplicate_options() {
        let err = build(AnswerKey::SingleChoice {
            options: vec![option("a"), option("a")],
            correct: "a".into(),
        })
        .unwrap_err();
        assert_eq!(err, ExerciseError::DuplicateOption("a".into()));
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let err = Exercise::new(
            ExerciseId::new("q").unwrap(),
            CategoryName::new("sql").unwrap(),
            Difficulty::Medium,
            "   ",
            AnswerKey::AttributeSet {
                attributes: vec!["A".into()],
            },
        )
        .unwrap_err();
        assert_eq!(err, ExerciseError::EmptyPrompt);
    }

    #[test]
    fn candidate_keys_cannot_contain_empty_key() {
        let err = build(AnswerKey::KeySet {
            keys: vec![vec!["A".into()], vec![]],
        })
        .unwrap_err();
        assert_eq!(err, ExerciseError::EmptySet);
    }

    #[test]
    fn answer_kind_follows_key_variant() {
        let ex = build(AnswerKey::DependencySet {
            dependencies: vec!["A → B".into()],
        })
        .unwrap()
        .with_explanation("B depends on A");
        assert_eq!(ex.answer_kind(), AnswerKind::SetEquality);
        assert!(ex.answer_kind().is_hard_graded());
        assert_eq!(ex.explanation(), Some("B depends on A"));

        let text = build(AnswerKey::Keywords {
            concepts: vec![Concept::labelled("JOIN")],
            sql_checks: true,
        })
        .unwrap();
        assert!(!text.answer_kind().is_hard_graded());
    }

    #[test]
    fn flashcards_reveal_text_and_are_never_graded() {
        let card = build(AnswerKey::Reveal {
            answer: "A key that uniquely identifies a tuple".into(),
        })
        .unwrap();
        assert_eq!(card.answer_kind(), AnswerKind::Reveal);
        assert!(!card.answer_kind().is_hard_graded());
        assert!(!card.answer_kind().is_gradable());
        assert_eq!(
            card.reveal_answer(),
            Some("A key that uniquely identifies a tuple")
        );

        let err = build(AnswerKey::Reveal { answer: "  ".into() }).unwrap_err();
        assert_eq!(err, ExerciseError::EmptyRevealAnswer);
    }

    #[test]
    fn reveal_key_deserializes_from_tagged_json() {
        let key: AnswerKey =
            serde_json::from_str(r#"{"kind":"reveal","answer":"Superkey"}"#).unwrap();
        assert_eq!(
            key,
            AnswerKey::Reveal {
                answer: "Superkey".into()
            }
        );
    }

    #[test]
    fn unlabelled_rule_searches_for_label() {
        let concept = Concept::labelled("GROUP BY");
        assert_eq!(
            concept.effective_rule(),
            KeywordRule::AnyOf(vec!["GROUP BY".into()])
        );
    }

    #[test]
    fn answer_key_deserializes_from_tagged_json() {
        let key: AnswerKey = serde_json::from_str(
            r#"{"kind":"keywords","concepts":[{"label":"Attribute list","rule":{"min_length":5}}]}"#,
        )
        .unwrap();
        assert_eq!(
            key,
            AnswerKey::Keywords {
                concepts: vec![Concept::new("Attribute list", KeywordRule::MinLength(5))],
                sql_checks: false,
            }
        );
    }
}
