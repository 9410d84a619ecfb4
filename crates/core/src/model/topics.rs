use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reading topics the learner has checked off, stored as `{topicId: true}`.
///
/// Topics are free-form ids of study-guide sections; they are unrelated to the
/// exercise bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicProgress {
    topics: BTreeMap<String, bool>,
}

impl TopicProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check off `topic`. Returns `false` if it was already complete.
    pub fn mark_complete(&mut self, topic: &str) -> bool {
        let entry = self.topics.entry(topic.to_owned()).or_insert(false);
        !std::mem::replace(entry, true)
    }

    #[must_use]
    pub fn is_complete(&self, topic: &str) -> bool {
        self.topics.get(topic).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.topics.values().filter(|done| **done).count()
    }

    /// Completed topics out of `total`, rounded half up and capped at 100.
    ///
    /// A guide with no topics is 0% complete.
    #[must_use]
    pub fn percent(&self, total: usize) -> u8 {
        if total == 0 {
            return 0;
        }
        let pct = (self.completed() * 100 + total / 2) / total;
        u8::try_from(pct.min(100)).unwrap_or(100)
    }

    pub fn completed_topics(&self) -> impl Iterator<Item = &str> {
        self.topics
            .iter()
            .filter(|(_, done)| **done)
            .map(|(topic, _)| topic.as_str())
    }

    pub fn clear(&mut self) {
        self.topics.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed() == 0
    }
}
