use std::fmt;
use std::sync::Arc;

use storage::repository::InMemoryPersistence;
use study_core::Clock;
use study_core::grading::{Grade, Grader};
use study_core::model::{
    AggregateScore, Answer, AnswerKind, Exercise, ExerciseBank, ExerciseId, Outcome, Scope,
    StudySettings,
};

use super::plan::{Selection, SessionOptions, build_order};
use super::progress::SessionProgress;
use super::view::{SessionObserver, SessionPhase, SessionSnapshot};
use crate::error::SessionError;
use crate::progress_store::{ProgressStore, WriteStatus};

/// Result of submitting the selected answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub exercise_id: ExerciseId,
    pub grade: Grade,
    /// `None` for advisory (free-text) grades.
    pub correct: Option<bool>,
    pub explanation: Option<String>,
    pub write: WriteStatus,
}

/// Transient per-session state; never persisted.
#[derive(Debug, Clone)]
struct SessionState {
    order: Vec<ExerciseId>,
    current: usize,
    selected: Option<Answer>,
}

impl SessionState {
    fn current_id(&self) -> &ExerciseId {
        &self.order[self.current]
    }

    fn move_to(&mut self, index: usize) -> bool {
        if index == self.current {
            return false;
        }
        self.current = index;
        self.selected = None;
        true
    }
}

/// Runs one exercise session at a time over an exercise bank.
///
/// The engine is `Idle` until [`SessionEngine::start`], `Active` while exercises are
/// being worked through, and `Finished` once [`SessionEngine::finish`] succeeds.
/// Every successful state change is pushed to subscribed observers.
pub struct SessionEngine {
    bank: Arc<ExerciseBank>,
    store: ProgressStore,
    grader: Grader,
    settings: StudySettings,
    phase: SessionPhase,
    selection: Option<Selection>,
    state: Option<SessionState>,
    last_grade: Option<Grade>,
    final_score: Option<AggregateScore>,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl SessionEngine {
    #[must_use]
    pub fn new(bank: Arc<ExerciseBank>, store: ProgressStore, settings: StudySettings) -> Self {
        Self {
            bank,
            store,
            grader: Grader::new(*settings.grading()),
            settings,
            phase: SessionPhase::Idle,
            selection: None,
            state: None,
            last_grade: None,
            final_score: None,
            observers: Vec::new(),
        }
    }

    /// Engine with default settings and progress kept only in memory.
    #[must_use]
    pub fn in_memory(bank: Arc<ExerciseBank>, clock: Clock) -> Self {
        let store = ProgressStore::open(Box::new(InMemoryPersistence::new()), clock);
        Self::new(bank, store, StudySettings::default())
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn bank(&self) -> &ExerciseBank {
        &self.bank
    }

    #[must_use]
    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    #[must_use]
    pub fn settings(&self) -> &StudySettings {
        &self.settings
    }

    #[must_use]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Exercise ids of the active session, in presentation order.
    #[must_use]
    pub fn order(&self) -> &[ExerciseId] {
        match self.active() {
            Ok(state) => &state.order,
            Err(_) => &[],
        }
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.active().ok().map(|state| state.current)
    }

    #[must_use]
    pub fn current_exercise(&self) -> Option<&Exercise> {
        let state = self.active().ok()?;
        self.bank.by_id(state.current_id()).ok()
    }

    #[must_use]
    pub fn selected_answer(&self) -> Option<&Answer> {
        self.active().ok()?.selected.as_ref()
    }

    #[must_use]
    pub fn last_grade(&self) -> Option<&Grade> {
        self.last_grade.as_ref()
    }

    /// Completion counters over the active session's exercises.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let Ok(state) = self.active() else {
            return SessionProgress::default();
        };
        let total = state.order.len();
        let completed = state
            .order
            .iter()
            .filter(|id| self.store.is_completed(id))
            .count();
        let correct = state
            .order
            .iter()
            .filter(|id| self.store.get(id).is_some_and(|r| r.correct()))
            .count();
        SessionProgress {
            total,
            completed,
            correct,
            remaining: total - completed,
        }
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────────
    //

    /// Start a session, replacing any session in progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidCategory` for unknown categories and
    /// `SessionError::InvalidRequest` for empty selections or oversized strict subsets.
    pub fn start(
        &mut self,
        selection: Selection,
        options: SessionOptions,
    ) -> Result<(), SessionError> {
        let order = build_order(&self.bank, &selection, &options)?;
        log::debug!(
            "Starting {:?} session over {} exercises ({:?})",
            options.order,
            order.len(),
            selection
        );

        self.state = Some(SessionState {
            order,
            current: 0,
            selected: None,
        });
        self.selection = Some(selection);
        self.phase = SessionPhase::Active;
        self.last_grade = None;
        self.final_score = None;
        self.notify();
        Ok(())
    }

    /// Close the session once every exercise in it is completed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` while exercises remain, or
    /// `SessionError::NotActive` without an active session.
    pub fn finish(&mut self) -> Result<AggregateScore, SessionError> {
        let state = self.active()?;
        let remaining = state
            .order
            .iter()
            .filter(|id| !self.store.is_completed(id))
            .count();
        if remaining > 0 {
            return Err(SessionError::Incomplete { remaining });
        }

        let score = self.store.score_of(&state.order);
        log::debug!(
            "Session finished with {}/{} correct",
            score.correct,
            score.completed
        );
        self.state = None;
        self.phase = SessionPhase::Finished;
        self.final_score = Some(score);
        self.notify();
        Ok(score)
    }

    /// Clear stored progress in `scope`. An active session keeps its order and position.
    pub fn reset_progress(&mut self, scope: &Scope) -> WriteStatus {
        let write = self.store.reset(scope);
        if let Some(state) = self.state.as_mut() {
            state.selected = None;
        }
        self.last_grade = None;
        self.notify();
        write
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Move forward one exercise; stays put on the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` without an active session.
    pub fn next(&mut self) -> Result<usize, SessionError> {
        let state = self.active_mut()?;
        let target = (state.current + 1).min(state.order.len() - 1);
        let moved = state.move_to(target);
        self.after_move(moved);
        Ok(target)
    }

    /// Move back one exercise; stays put on the first one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` without an active session.
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        let state = self.active_mut()?;
        let target = state.current.saturating_sub(1);
        let moved = state.move_to(target);
        self.after_move(moved);
        Ok(target)
    }

    /// Jump to an exercise by position.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidRequest` for positions outside the session.
    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        let state = self.active_mut()?;
        if index >= state.order.len() {
            return Err(SessionError::invalid(format!(
                "position {index} is outside a session of {}",
                state.order.len()
            )));
        }
        let moved = state.move_to(index);
        self.after_move(moved);
        Ok(())
    }

    fn after_move(&mut self, moved: bool) {
        if moved {
            self.last_grade = None;
        }
        self.notify();
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────────
    //

    /// Hold `answer` for the current exercise without grading it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidRequest` if the answer shape does not fit the
    /// exercise and `SessionError::AlreadyCompleted` for locked exercises.
    pub fn select_answer(&mut self, answer: Answer) -> Result<(), SessionError> {
        let bank = Arc::clone(&self.bank);
        let exercise = self.current(&bank)?;
        if !answer.fits(exercise.answer_kind()) {
            return Err(SessionError::invalid(format!(
                "answer does not fit a {:?} exercise",
                exercise.answer_kind()
            )));
        }
        if self.is_locked(exercise) {
            return Err(SessionError::AlreadyCompleted(exercise.id().clone()));
        }

        self.active_mut()?.selected = Some(answer);
        self.notify();
        Ok(())
    }

    /// Grade the selected answer and record it.
    ///
    /// A failed progress write does not fail the submission; it is reported in
    /// [`Submission::write`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyCompleted` for locked exercises,
    /// `SessionError::NoAnswerSelected` when nothing (or only blank input) is selected,
    /// and `SessionError::InvalidRequest` for flashcards or answers that cannot be graded.
    pub fn submit_answer(&mut self) -> Result<Submission, SessionError> {
        let bank = Arc::clone(&self.bank);
        let exercise = self.current(&bank)?;
        if !exercise.answer_kind().is_gradable() {
            return Err(SessionError::invalid(
                "flashcards are completed with mark_complete",
            ));
        }
        if self.is_locked(exercise) {
            return Err(SessionError::AlreadyCompleted(exercise.id().clone()));
        }
        let answer = self
            .active()?
            .selected
            .clone()
            .filter(|answer| !answer.is_blank())
            .ok_or(SessionError::NoAnswerSelected)?;

        let grade = self.grader.grade(exercise, &answer)?;
        let write = self.store.record(
            exercise.id(),
            exercise.category(),
            Outcome {
                correct: grade.counts_as_correct(),
                raw_answer: answer,
                coverage: grade.coverage(),
            },
        );
        log::debug!(
            "Graded {}: {:?} (coverage {:?})",
            exercise.id(),
            grade.correct(),
            grade.coverage()
        );

        self.last_grade = Some(grade.clone());
        self.notify();
        Ok(Submission {
            exercise_id: exercise.id().clone(),
            correct: grade.correct(),
            grade,
            explanation: exercise.explanation().map(str::to_owned),
            write,
        })
    }

    /// Store free text for the current exercise without grading it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidRequest` unless the current exercise takes free text.
    pub fn save_draft(&mut self, text: impl Into<String>) -> Result<WriteStatus, SessionError> {
        let bank = Arc::clone(&self.bank);
        let exercise = self.current(&bank)?;
        if exercise.answer_kind() != AnswerKind::FreeTextKeyword {
            return Err(SessionError::invalid("only free-text answers can be saved"));
        }

        let answer = Answer::Text(text.into());
        let write = self
            .store
            .save_draft(exercise.id(), exercise.category(), answer.clone());
        self.active_mut()?.selected = Some(answer);
        self.notify();
        Ok(write)
    }

    /// Mark the current free-text exercise or flashcard as done without grading it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidRequest` for hard-graded exercises, which complete
    /// only through submission.
    pub fn mark_complete(&mut self) -> Result<WriteStatus, SessionError> {
        let bank = Arc::clone(&self.bank);
        let exercise = self.current(&bank)?;
        if exercise.answer_kind().is_hard_graded() {
            return Err(SessionError::invalid(
                "hard-graded exercises are completed by submitting an answer",
            ));
        }

        let write = self.store.mark_complete(exercise.id(), exercise.category());
        self.notify();
        Ok(write)
    }

    //
    // ─── OBSERVERS ─────────────────────────────────────────────────────────────
    //

    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    /// Current state as an owned snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.active().ok();
        let exercise = self.current_exercise().cloned();
        SessionSnapshot {
            phase: self.phase,
            selection: self.selection.clone(),
            index: state.map_or(0, |s| s.current),
            total: state.map_or(0, |s| s.order.len()),
            record: exercise
                .as_ref()
                .and_then(|e| self.store.get(e.id()))
                .cloned(),
            exercise,
            selected_answer: state.and_then(|s| s.selected.clone()),
            progress: self.progress(),
            last_grade: self.last_grade.clone(),
            final_score: self.final_score,
            persistence_warning: self.store.last_warning().map(str::to_owned),
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer.on_state_changed(&snapshot);
        }
    }

    //
    // ─── HELPERS ───────────────────────────────────────────────────────────────
    //

    fn active(&self) -> Result<&SessionState, SessionError> {
        match (self.phase, self.state.as_ref()) {
            (SessionPhase::Active, Some(state)) => Ok(state),
            _ => Err(SessionError::NotActive),
        }
    }

    fn active_mut(&mut self) -> Result<&mut SessionState, SessionError> {
        match (self.phase, self.state.as_mut()) {
            (SessionPhase::Active, Some(state)) => Ok(state),
            _ => Err(SessionError::NotActive),
        }
    }

    fn current<'b>(&self, bank: &'b ExerciseBank) -> Result<&'b Exercise, SessionError> {
        let state = self.active()?;
        Ok(bank.by_id(state.current_id())?)
    }

    fn is_locked(&self, exercise: &Exercise) -> bool {
        self.store.is_completed(exercise.id())
            && (exercise.answer_kind().is_hard_graded() || self.settings.relock_free_text())
    }
}

impl fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEngine")
            .field("phase", &self.phase)
            .field("selection", &self.selection)
            .field("state", &self.state)
            .field("store", &self.store)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{AnswerKey, CategoryName, ChoiceOption, Concept, Difficulty};
    use study_core::time::fixed_now;

    fn category(name: &str) -> CategoryName {
        CategoryName::new(name).unwrap()
    }

    fn id(raw: &str) -> ExerciseId {
        ExerciseId::new(raw).unwrap()
    }

    fn choice(raw_id: &str, correct: &str) -> Exercise {
        Exercise::new(
            id(raw_id),
            category("quiz"),
            Difficulty::Easy,
            format!("Question {raw_id}"),
            AnswerKey::SingleChoice {
                options: ["a", "b", "c"]
                    .iter()
                    .map(|o| ChoiceOption {
                        id: (*o).into(),
                        text: o.to_uppercase(),
                    })
                    .collect(),
                correct: correct.into(),
            },
        )
        .unwrap()
        .with_explanation(format!("{raw_id} is {correct}"))
    }

    fn free_text(raw_id: &str) -> Exercise {
        Exercise::new(
            id(raw_id),
            category("sql"),
            Difficulty::Medium,
            "Names of all employees",
            AnswerKey::Keywords {
                concepts: vec![Concept::labelled("SELECT"), Concept::labelled("FROM")],
                sql_checks: true,
            },
        )
        .unwrap()
    }

    fn engine() -> SessionEngine {
        let bank = ExerciseBank::new(vec![
            (
                category("quiz"),
                vec![choice("q1", "a"), choice("q2", "b"), choice("q3", "c")],
            ),
            (category("sql"), vec![free_text("s1")]),
        ])
        .unwrap();
        SessionEngine::in_memory(Arc::new(bank), Clock::fixed(fixed_now()))
    }

    fn started() -> SessionEngine {
        let mut engine = engine();
        engine
            .start(
                Selection::Category(category("quiz")),
                SessionOptions::sequential(),
            )
            .unwrap();
        engine
    }

    #[test]
    fn calls_before_start_are_not_active() {
        let mut engine = engine();
        assert_eq!(engine.phase(), SessionPhase::Idle);
        assert_eq!(engine.next(), Err(SessionError::NotActive));
        assert_eq!(
            engine.select_answer(Answer::Choice("a".into())),
            Err(SessionError::NotActive)
        );
        assert_eq!(engine.submit_answer(), Err(SessionError::NotActive));
        assert_eq!(engine.finish(), Err(SessionError::NotActive));
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut engine = started();
        assert_eq!(engine.previous(), Ok(0));
        assert_eq!(engine.next(), Ok(1));
        assert_eq!(engine.next(), Ok(2));
        assert_eq!(engine.next(), Ok(2));
        assert_eq!(engine.current_exercise().unwrap().id(), &id("q3"));
    }

    #[test]
    fn moving_clears_the_pending_selection() {
        let mut engine = started();
        engine.select_answer(Answer::Choice("b".into())).unwrap();
        engine.previous().unwrap();
        assert!(engine.selected_answer().is_some());

        engine.next().unwrap();
        assert!(engine.selected_answer().is_none());
    }

    #[test]
    fn go_to_rejects_positions_outside_the_session() {
        let mut engine = started();
        engine.go_to(2).unwrap();
        assert_eq!(engine.current_index(), Some(2));
        assert!(matches!(
            engine.go_to(3),
            Err(SessionError::InvalidRequest(_))
        ));
        assert_eq!(engine.current_index(), Some(2));
    }

    #[test]
    fn wrong_answer_shape_is_rejected_on_select() {
        let mut engine = started();
        let err = engine
            .select_answer(Answer::Text("a".into()))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidRequest(_)));
    }

    #[test]
    fn blank_selection_counts_as_none() {
        let mut engine = started();
        assert_eq!(engine.submit_answer(), Err(SessionError::NoAnswerSelected));
        engine.select_answer(Answer::Choice("  ".into())).unwrap();
        assert_eq!(engine.submit_answer(), Err(SessionError::NoAnswerSelected));
    }

    #[test]
    fn submission_carries_verdict_and_explanation() {
        let mut engine = started();
        engine.select_answer(Answer::Choice("a".into())).unwrap();
        let submission = engine.submit_answer().unwrap();

        assert_eq!(submission.exercise_id, id("q1"));
        assert_eq!(submission.correct, Some(true));
        assert_eq!(submission.explanation.as_deref(), Some("q1 is a"));
        assert!(submission.write.is_saved());
        assert_eq!(engine.store().get(&id("q1")).unwrap().attempts(), 1);
    }

    #[test]
    fn completed_hard_graded_exercise_is_locked() {
        let mut engine = started();
        engine.select_answer(Answer::Choice("c".into())).unwrap();
        engine.submit_answer().unwrap();

        assert_eq!(
            engine.submit_answer(),
            Err(SessionError::AlreadyCompleted(id("q1")))
        );
        assert_eq!(
            engine.select_answer(Answer::Choice("a".into())),
            Err(SessionError::AlreadyCompleted(id("q1")))
        );
        assert_eq!(engine.store().get(&id("q1")).unwrap().attempts(), 1);
    }

    #[test]
    fn free_text_stays_regradable_and_only_advisory() {
        let mut engine = engine();
        engine
            .start(
                Selection::Category(category("sql")),
                SessionOptions::sequential(),
            )
            .unwrap();

        engine.select_answer(Answer::Text("SELECT name".into())).unwrap();
        let first = engine.submit_answer().unwrap();
        assert_eq!(first.correct, None);
        assert_eq!(first.grade.coverage(), Some(50));

        engine
            .select_answer(Answer::Text("SELECT name FROM employee".into()))
            .unwrap();
        let second = engine.submit_answer().unwrap();
        assert_eq!(second.grade.coverage(), Some(100));

        let record = engine.store().get(&id("s1")).unwrap();
        assert_eq!(record.attempts(), 2);
        assert!(record.correct());
    }

    #[test]
    fn drafts_and_manual_completion_apply_to_free_text_only() {
        let mut engine = started();
        assert!(matches!(
            engine.save_draft("SELECT"),
            Err(SessionError::InvalidRequest(_))
        ));
        assert!(matches!(
            engine.mark_complete(),
            Err(SessionError::InvalidRequest(_))
        ));

        engine
            .start(
                Selection::Category(category("sql")),
                SessionOptions::sequential(),
            )
            .unwrap();
        engine.save_draft("SELECT *").unwrap();
        assert_eq!(
            engine.selected_answer(),
            Some(&Answer::Text("SELECT *".into()))
        );
        engine.mark_complete().unwrap();

        let record = engine.store().get(&id("s1")).unwrap();
        assert!(record.completed());
        assert_eq!(record.attempts(), 0);
        assert_eq!(engine.finish().unwrap().completed, 1);
    }

    #[test]
    fn finish_requires_every_exercise_completed() {
        let mut engine = started();
        engine.select_answer(Answer::Choice("a".into())).unwrap();
        engine.submit_answer().unwrap();
        assert_eq!(
            engine.finish(),
            Err(SessionError::Incomplete { remaining: 2 })
        );

        for answer in ["b", "a"] {
            engine.next().unwrap();
            engine.select_answer(Answer::Choice(answer.into())).unwrap();
            engine.submit_answer().unwrap();
        }
        let score = engine.finish().unwrap();
        assert_eq!(score.correct, 2);
        assert_eq!(score.completed, 3);
        assert_eq!(engine.phase(), SessionPhase::Finished);
        assert_eq!(engine.next(), Err(SessionError::NotActive));
    }

    #[test]
    fn reset_progress_unlocks_without_moving() {
        let mut engine = started();
        engine.next().unwrap();
        engine.select_answer(Answer::Choice("b".into())).unwrap();
        engine.submit_answer().unwrap();

        engine.reset_progress(&Scope::All);
        assert_eq!(engine.current_index(), Some(1));
        assert!(engine.store().get(&id("q2")).is_none());
        engine.select_answer(Answer::Choice("a".into())).unwrap();
    }

    #[test]
    fn progress_counts_session_exercises_only() {
        let mut engine = started();
        engine.select_answer(Answer::Choice("a".into())).unwrap();
        engine.submit_answer().unwrap();

        let progress = engine.progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.correct, 1);
        assert_eq!(progress.remaining, 2);
        assert!(!progress.is_complete());
    }
}
