use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use study_core::model::{ExerciseId, ProgressRecord, TopicProgress};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Every persisted progress record, keyed by exercise id.
pub type ProgressMap = BTreeMap<ExerciseId, ProgressRecord>;

/// Durability contract for the progress store.
///
/// The store calls `load` once when it opens and `save` with the full map after
/// every mutation.
pub trait ProgressPersistence {
    /// Read all persisted records. A backend with nothing stored returns an empty map.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the stored data cannot be read or decoded.
    fn load(&self) -> Result<ProgressMap, StorageError>;

    /// Replace the persisted records with `records`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be written.
    fn save(&self, records: &ProgressMap) -> Result<(), StorageError>;
}

/// Durability contract for checked-off reading topics, kept apart from exercise progress.
pub trait TopicPersistence {
    /// # Errors
    ///
    /// Returns `StorageError` if the stored topics cannot be read or decoded.
    fn load_topics(&self) -> Result<TopicProgress, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the topics cannot be written.
    fn save_topics(&self, topics: &TopicProgress) -> Result<(), StorageError>;
}

/// In-memory backend for tests and prototyping.
///
/// Clones share the same map, so a test can keep a handle after giving one to a store.
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    records: Arc<Mutex<ProgressMap>>,
    topics: Arc<Mutex<TopicProgress>>,
    saves: Arc<Mutex<usize>>,
}

impl InMemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with pre-existing records.
    #[must_use]
    pub fn with_records(records: ProgressMap) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            ..Self::default()
        }
    }

    /// Snapshot of what was last saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the lock is poisoned.
    pub fn snapshot(&self) -> Result<ProgressMap, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.clone())
    }

    /// Number of `save` and `save_topics` calls received so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|count| *count).unwrap_or(0)
    }

    fn count_save(&self) {
        if let Ok(mut count) = self.saves.lock() {
            *count += 1;
        }
    }
}

impl ProgressPersistence for InMemoryPersistence {
    fn load(&self) -> Result<ProgressMap, StorageError> {
        self.snapshot()
    }

    fn save(&self, records: &ProgressMap) -> Result<(), StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.clone_from(records);
        self.count_save();
        Ok(())
    }
}

impl TopicPersistence for InMemoryPersistence {
    fn load_topics(&self) -> Result<TopicProgress, StorageError> {
        let guard = self
            .topics
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save_topics(&self, topics: &TopicProgress) -> Result<(), StorageError> {
        let mut guard = self
            .topics
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.clone_from(topics);
        self.count_save();
        Ok(())
    }
}
