mod answer;
mod bank;
mod exercise;
mod ids;
mod progress;
mod settings;
mod topics;

pub use ids::{CategoryName, ExerciseId, IdError};

pub use answer::Answer;
pub use bank::{BankError, ExerciseBank};
pub use exercise::{
    AnswerKey, AnswerKind, ChoiceOption, Concept, Difficulty, Exercise, ExerciseError,
    KeywordRule,
};
pub use progress::{AggregateScore, Outcome, ProgressRecord, Scope};
pub use settings::{GradingSettings, SessionOrder, SettingsError, StudySettings};
pub use topics::TopicProgress;
