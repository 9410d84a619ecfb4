#![forbid(unsafe_code)]

pub mod error;
pub mod progress_store;
pub mod sessions;
pub mod topic_tracker;

pub use study_core::Clock;
pub use sessions as session;

pub use error::SessionError;
pub use progress_store::{ProgressStore, WriteStatus};
pub use topic_tracker::TopicTracker;

pub use sessions::{
    Selection, SessionEngine, SessionObserver, SessionOptions, SessionPhase, SessionProgress,
    SessionSnapshot, Submission,
};
