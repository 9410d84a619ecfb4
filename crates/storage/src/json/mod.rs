use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use study_core::model::TopicProgress;

use crate::repository::{ProgressMap, ProgressPersistence, StorageError, TopicPersistence};

pub mod content;
pub mod legacy;
pub mod settings;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Read and decode `path`. A missing or blank file reads as `None`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("No file at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&raw).map(Some).map_err(ser)
}

/// Write `value` to a sibling temp file, then rename it over `path`.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let encoded = serde_json::to_string_pretty(value).map_err(ser)?;
    let temp = temp_path(path);
    fs::write(&temp, encoded)?;
    fs::rename(&temp, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "data.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Progress persisted as a single JSON object `{exerciseId: record}`.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressPersistence for JsonFilePersistence {
    fn load(&self) -> Result<ProgressMap, StorageError> {
        let records: ProgressMap = read_json(&self.path)?.unwrap_or_default();
        log::debug!(
            "Loaded {} progress records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    fn save(&self, records: &ProgressMap) -> Result<(), StorageError> {
        write_json(&self.path, records)
    }
}

/// Checked-off topics persisted as a JSON object `{topicId: true}`.
#[derive(Debug, Clone)]
pub struct JsonTopicPersistence {
    path: PathBuf,
}

impl JsonTopicPersistence {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TopicPersistence for JsonTopicPersistence {
    fn load_topics(&self) -> Result<TopicProgress, StorageError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    fn save_topics(&self, topics: &TopicProgress) -> Result<(), StorageError> {
        write_json(&self.path, topics)
    }
}
