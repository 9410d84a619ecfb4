use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use study_core::model::{GradingSettings, SessionOrder, SettingsError, StudySettings};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsLoadError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] SettingsError),
}

/// Persisted shape of [`StudySettings`]; every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsRecord {
    pub keyword_pass_threshold: u8,
    pub keyword_partial_threshold: u8,
    pub strict_subset: bool,
    pub default_order: SessionOrder,
    pub relock_free_text: bool,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self::from_settings(&StudySettings::default())
    }
}

impl SettingsRecord {
    #[must_use]
    pub fn from_settings(settings: &StudySettings) -> Self {
        Self {
            keyword_pass_threshold: settings.grading().pass_threshold(),
            keyword_partial_threshold: settings.grading().partial_threshold(),
            strict_subset: settings.strict_subset(),
            default_order: settings.default_order(),
            relock_free_text: settings.relock_free_text(),
        }
    }

    /// # Errors
    ///
    /// Returns `SettingsError` if the thresholds are invalid.
    pub fn into_settings(self) -> Result<StudySettings, SettingsError> {
        let grading =
            GradingSettings::new(self.keyword_pass_threshold, self.keyword_partial_threshold)?;
        Ok(StudySettings::new(
            grading,
            self.strict_subset,
            self.default_order,
            self.relock_free_text,
        ))
    }
}

/// Parse settings JSON; missing fields take their defaults.
///
/// # Errors
///
/// Returns `SettingsLoadError` for malformed JSON or invalid values.
pub fn load_settings_from_str(raw: &str) -> Result<StudySettings, SettingsLoadError> {
    let record: SettingsRecord = serde_json::from_str(raw)?;
    Ok(record.into_settings()?)
}

/// Read settings from disk. A missing file yields the defaults.
///
/// # Errors
///
/// Returns `SettingsLoadError` if the file exists but cannot be read or parsed.
pub fn load_settings_from_path(path: impl AsRef<Path>) -> Result<StudySettings, SettingsLoadError> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(raw) => load_settings_from_str(&raw),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("No settings at {}, using defaults", path.display());
            Ok(StudySettings::default())
        }
        Err(e) => Err(e.into()),
    }
}
