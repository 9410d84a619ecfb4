use std::fmt;

use storage::repository::{ProgressMap, ProgressPersistence};
use study_core::Clock;
use study_core::model::{
    AggregateScore, Answer, CategoryName, ExerciseId, Outcome, ProgressRecord, Scope,
};

/// Result of the write-through call that follows every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    Saved,
    /// The in-memory change was kept but could not be persisted.
    Unavailable { reason: String },
}

impl WriteStatus {
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, WriteStatus::Saved)
    }
}

/// Per-exercise progress, written through to a persistence backend.
///
/// The backend is read once in [`ProgressStore::open`]; each mutation saves the whole
/// map. Storage failures never lose the in-memory state, they only raise a warning.
///
/// If the initial load fails the store is degraded: nothing is written back, so the
/// unreadable data is never overwritten, until `reset(&Scope::All)` discards it.
pub struct ProgressStore {
    persistence: Box<dyn ProgressPersistence>,
    records: ProgressMap,
    clock: Clock,
    last_warning: Option<String>,
    load_failure: Option<String>,
}

impl ProgressStore {
    /// Open a store over `persistence`, loading its records.
    ///
    /// A failed load starts from an empty map and sets [`ProgressStore::last_warning`].
    #[must_use]
    pub fn open(persistence: Box<dyn ProgressPersistence>, clock: Clock) -> Self {
        let (records, load_failure) = match persistence.load() {
            Ok(records) => {
                log::debug!("Loaded {} progress records", records.len());
                (records, None)
            }
            Err(e) => {
                log::warn!("Progress could not be loaded, saving is disabled: {e}");
                (ProgressMap::new(), Some(e.to_string()))
            }
        };

        Self {
            persistence,
            records,
            clock,
            last_warning: load_failure.clone(),
            load_failure,
        }
    }

    /// Count a graded submission for `id`.
    pub fn record(
        &mut self,
        id: &ExerciseId,
        category: &CategoryName,
        outcome: Outcome,
    ) -> WriteStatus {
        let now = self.clock.now();
        self.entry(id, category).apply_outcome(outcome, now);
        self.persist()
    }

    /// Keep an ungraded answer draft for `id`.
    pub fn save_draft(
        &mut self,
        id: &ExerciseId,
        category: &CategoryName,
        answer: Answer,
    ) -> WriteStatus {
        let now = self.clock.now();
        self.entry(id, category).apply_draft(answer, now);
        self.persist()
    }

    /// Mark `id` completed without grading it.
    pub fn mark_complete(&mut self, id: &ExerciseId, category: &CategoryName) -> WriteStatus {
        let now = self.clock.now();
        self.entry(id, category).mark_complete(now);
        self.persist()
    }

    #[must_use]
    pub fn get(&self, id: &ExerciseId) -> Option<&ProgressRecord> {
        self.records.get(id)
    }

    #[must_use]
    pub fn is_completed(&self, id: &ExerciseId) -> bool {
        self.records.get(id).is_some_and(ProgressRecord::completed)
    }

    /// Drop every record in `scope`.
    ///
    /// Resetting everything also leaves the degraded state, replacing whatever the
    /// backend could not load.
    pub fn reset(&mut self, scope: &Scope) -> WriteStatus {
        if *scope == Scope::All && self.load_failure.take().is_some() {
            log::warn!("Discarding unreadable progress data");
        }
        let before = self.records.len();
        self.records.retain(|_, record| !scope.includes(record));
        log::debug!(
            "Reset {} progress records ({scope:?})",
            before - self.records.len()
        );
        self.persist()
    }

    #[must_use]
    pub fn score(&self, scope: &Scope) -> AggregateScore {
        AggregateScore::from_records(self.records.values().filter(|r| scope.includes(r)))
    }

    /// Aggregate over a fixed list of exercises, e.g. the ones in a session.
    #[must_use]
    pub fn score_of<'a>(&self, ids: impl IntoIterator<Item = &'a ExerciseId>) -> AggregateScore {
        AggregateScore::from_records(ids.into_iter().filter_map(|id| self.records.get(id)))
    }

    #[must_use]
    pub fn records(&self) -> &ProgressMap {
        &self.records
    }

    /// True while saving is disabled after a failed load.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.load_failure.is_some()
    }

    /// Most recent persistence failure, cleared by the next successful save.
    #[must_use]
    pub fn last_warning(&self) -> Option<&str> {
        self.last_warning.as_deref()
    }

    fn entry(&mut self, id: &ExerciseId, category: &CategoryName) -> &mut ProgressRecord {
        self.records
            .entry(id.clone())
            .or_insert_with(|| ProgressRecord::new(category.clone()))
    }

    fn persist(&mut self) -> WriteStatus {
        if let Some(failure) = &self.load_failure {
            log::debug!("Skipping save while stored progress is unreadable");
            let reason = format!("stored progress could not be loaded: {failure}");
            self.last_warning = Some(reason.clone());
            return WriteStatus::Unavailable { reason };
        }
        match self.persistence.save(&self.records) {
            Ok(()) => {
                self.last_warning = None;
                WriteStatus::Saved
            }
            Err(e) => {
                log::warn!("Progress could not be saved: {e}");
                let reason = e.to_string();
                self.last_warning = Some(reason.clone());
                WriteStatus::Unavailable { reason }
            }
        }
    }
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStore")
            .field("records_len", &self.records.len())
            .field("clock", &self.clock)
            .field("last_warning", &self.last_warning)
            .field("load_failure", &self.load_failure)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
