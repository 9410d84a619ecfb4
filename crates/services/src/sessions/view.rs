use study_core::grading::Grade;
use study_core::model::{AggregateScore, Answer, Exercise, ProgressRecord};

use super::plan::Selection;
use super::progress::SessionProgress;

/// Lifecycle of the session engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Active,
    Finished,
}

/// Presentation-agnostic picture of the engine after a state change.
///
/// Everything a presenter needs to re-render is copied in; the snapshot does not
/// borrow from the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub selection: Option<Selection>,
    pub index: usize,
    pub total: usize,
    pub exercise: Option<Exercise>,
    pub selected_answer: Option<Answer>,
    /// Stored progress of the current exercise.
    pub record: Option<ProgressRecord>,
    pub progress: SessionProgress,
    pub last_grade: Option<Grade>,
    pub final_score: Option<AggregateScore>,
    pub persistence_warning: Option<String>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.total
    }
}

/// Receives a snapshot after every successful state-changing engine call.
pub trait SessionObserver {
    fn on_state_changed(&mut self, snapshot: &SessionSnapshot);
}

impl<F> SessionObserver for F
where
    F: FnMut(&SessionSnapshot),
{
    fn on_state_changed(&mut self, snapshot: &SessionSnapshot) {
        self(snapshot);
    }
}
