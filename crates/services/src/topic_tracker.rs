use std::fmt;

use storage::repository::TopicPersistence;
use study_core::model::TopicProgress;

use crate::error::SessionError;
use crate::progress_store::WriteStatus;

/// Reading-topic checklist with an overall completion percentage.
///
/// Writes through on every change and degrades like [`crate::ProgressStore`]: after a
/// failed load nothing is saved until [`TopicTracker::reset`] discards the old data.
pub struct TopicTracker {
    persistence: Box<dyn TopicPersistence>,
    topics: TopicProgress,
    total_topics: usize,
    last_warning: Option<String>,
    load_failure: Option<String>,
}

impl TopicTracker {
    /// Open a tracker for a guide with `total_topics` topics.
    #[must_use]
    pub fn open(persistence: Box<dyn TopicPersistence>, total_topics: usize) -> Self {
        let (topics, load_failure) = match persistence.load_topics() {
            Ok(topics) => (topics, None),
            Err(e) => {
                log::warn!("Topic progress could not be loaded, saving is disabled: {e}");
                (TopicProgress::new(), Some(e.to_string()))
            }
        };
        Self {
            persistence,
            topics,
            total_topics,
            last_warning: load_failure.clone(),
            load_failure,
        }
    }

    /// Check off `topic`. Completing a topic twice saves nothing the second time.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidRequest` for a blank topic id.
    pub fn mark_complete(&mut self, topic: &str) -> Result<WriteStatus, SessionError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SessionError::invalid("topic id cannot be empty"));
        }
        if !self.topics.mark_complete(topic) {
            return Ok(WriteStatus::Saved);
        }
        log::debug!("Topic {topic} completed");
        Ok(self.persist())
    }

    #[must_use]
    pub fn is_complete(&self, topic: &str) -> bool {
        self.topics.is_complete(topic.trim())
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.topics.completed()
    }

    #[must_use]
    pub fn total_topics(&self) -> usize {
        self.total_topics
    }

    /// Rounded share of completed topics, 0 to 100.
    #[must_use]
    pub fn percent(&self) -> u8 {
        self.topics.percent(self.total_topics)
    }

    #[must_use]
    pub fn topics(&self) -> &TopicProgress {
        &self.topics
    }

    /// Uncheck every topic, replacing unreadable stored data as well.
    pub fn reset(&mut self) -> WriteStatus {
        if self.load_failure.take().is_some() {
            log::warn!("Discarding unreadable topic progress");
        }
        self.topics.clear();
        self.persist()
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.load_failure.is_some()
    }

    #[must_use]
    pub fn last_warning(&self) -> Option<&str> {
        self.last_warning.as_deref()
    }

    fn persist(&mut self) -> WriteStatus {
        if let Some(failure) = &self.load_failure {
            let reason = format!("stored topics could not be loaded: {failure}");
            self.last_warning = Some(reason.clone());
            return WriteStatus::Unavailable { reason };
        }
        match self.persistence.save_topics(&self.topics) {
            Ok(()) => {
                self.last_warning = None;
                WriteStatus::Saved
            }
            Err(e) => {
                log::warn!("Topic progress could not be saved: {e}");
                let reason = e.to_string();
                self.last_warning = Some(reason.clone());
                WriteStatus::Unavailable { reason }
            }
        }
    }
}

impl fmt::Debug for TopicTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicTracker")
            .field("topics", &self.topics)
            .field("total_topics", &self.total_topics)
            .field("last_warning", &self.last_warning)
            .field("load_failure", &self.load_failure)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use storage::repository::{InMemoryPersistence, StorageError};

    struct UnreadableTopics {
        saves: Rc<Cell<usize>>,
    }

    impl TopicPersistence for UnreadableTopics {
        fn load_topics(&self) -> Result<TopicProgress, StorageError> {
            Err(StorageError::Serialization("expected value".into()))
        }

        fn save_topics(&self, _topics: &TopicProgress) -> Result<(), StorageError> {
            self.saves.set(self.saves.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn completing_topics_raises_the_percentage() {
        let backend = InMemoryPersistence::new();
        let mut tracker = TopicTracker::open(Box::new(backend.clone()), 24);
        assert_eq!(tracker.percent(), 0);

        assert!(tracker.mark_complete("er-model").unwrap().is_saved());
        assert!(tracker.mark_complete("sql-joins").unwrap().is_saved());
        assert_eq!(tracker.completed(), 2);
        assert_eq!(tracker.percent(), 8);
        assert!(backend.load_topics().unwrap().is_complete("sql-joins"));
    }

    #[test]
    fn repeated_completion_is_a_no_op() {
        let backend = InMemoryPersistence::new();
        let mut tracker = TopicTracker::open(Box::new(backend.clone()), 4);
        tracker.mark_complete("keys").unwrap();
        tracker.mark_complete(" keys ").unwrap();
        assert_eq!(tracker.completed(), 1);
        assert_eq!(backend.save_count(), 1);
        assert!(tracker.is_complete("keys"));
    }

    #[test]
    fn blank_topic_is_rejected() {
        let mut tracker = TopicTracker::open(Box::new(InMemoryPersistence::new()), 4);
        assert!(matches!(
            tracker.mark_complete("  "),
            Err(SessionError::InvalidRequest(_))
        ));
    }

    #[test]
    fn progress_is_restored_on_open() {
        let backend = InMemoryPersistence::new();
        TopicTracker::open(Box::new(backend.clone()), 3)
            .mark_complete("normalization")
            .unwrap();

        let tracker = TopicTracker::open(Box::new(backend), 3);
        assert!(tracker.is_complete("normalization"));
        assert_eq!(tracker.percent(), 33);
    }

    #[test]
    fn empty_guide_is_zero_percent() {
        let mut tracker = TopicTracker::open(Box::new(InMemoryPersistence::new()), 0);
        tracker.mark_complete("extra").unwrap();
        assert_eq!(tracker.percent(), 0);
    }

    #[test]
    fn unreadable_topics_are_not_overwritten_until_reset() {
        let saves = Rc::new(Cell::new(0));
        let mut tracker = TopicTracker::open(
            Box::new(UnreadableTopics {
                saves: Rc::clone(&saves),
            }),
            10,
        );
        assert!(tracker.is_degraded());
        assert!(tracker.last_warning().unwrap().contains("expected value"));

        let status = tracker.mark_complete("sql").unwrap();
        assert!(!status.is_saved());
        assert!(tracker.is_complete("sql"));
        assert_eq!(saves.get(), 0);

        assert!(tracker.reset().is_saved());
        assert!(!tracker.is_degraded());
        assert!(tracker.last_warning().is_none());
        assert_eq!(tracker.completed(), 0);
        assert_eq!(saves.get(), 1);
    }
}
