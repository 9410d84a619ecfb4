#![forbid(unsafe_code)]

pub mod json;
pub mod repository;

pub use json::{JsonFilePersistence, JsonTopicPersistence};
pub use repository::{
    InMemoryPersistence, ProgressMap, ProgressPersistence, StorageError, TopicPersistence,
};
