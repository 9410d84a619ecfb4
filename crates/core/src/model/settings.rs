use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("keyword pass threshold must be between 1 and 100, got {0}")]
    InvalidKeywordThreshold(u8),

    #[error("partial band must be below the pass threshold")]
    InvalidPartialBand,
}

/// Presentation order of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOrder {
    #[default]
    Sequential,
    Shuffled,
}

/// Thresholds used by the free-text keyword grader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradingSettings {
    pass_threshold: u8,
    partial_threshold: u8,
}

impl GradingSettings {
    /// # Errors
    ///
    /// Returns `SettingsError` if the thresholds are out of range or inverted.
    pub fn new(pass_threshold: u8, partial_threshold: u8) -> Result<Self, SettingsError> {
        if !(1..=100).contains(&pass_threshold) {
            return Err(SettingsError::InvalidKeywordThreshold(pass_threshold));
        }
        if partial_threshold >= pass_threshold {
            return Err(SettingsError::InvalidPartialBand);
        }
        Ok(Self {
            pass_threshold,
            partial_threshold,
        })
    }

    /// Coverage (percent) an answer needs to count as passing.
    #[must_use]
    pub fn pass_threshold(&self) -> u8 {
        self.pass_threshold
    }

    #[must_use]
    pub fn partial_threshold(&self) -> u8 {
        self.partial_threshold
    }
}

impl Default for GradingSettings {
    fn default() -> Self {
        Self {
            pass_threshold: 80,
            partial_threshold: 50,
        }
    }
}

/// User-facing study configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StudySettings {
    grading: GradingSettings,
    strict_subset: bool,
    default_order: SessionOrder,
    relock_free_text: bool,
}

impl StudySettings {
    #[must_use]
    pub fn new(
        grading: GradingSettings,
        strict_subset: bool,
        default_order: SessionOrder,
        relock_free_text: bool,
    ) -> Self {
        Self {
            grading,
            strict_subset,
            default_order,
            relock_free_text,
        }
    }

    #[must_use]
    pub fn grading(&self) -> &GradingSettings {
        &self.grading
    }

    /// Reject oversized subsets instead of clamping them.
    #[must_use]
    pub fn strict_subset(&self) -> bool {
        self.strict_subset
    }

    #[must_use]
    pub fn default_order(&self) -> SessionOrder {
        self.default_order
    }

    /// Lock free-text exercises after their first submission, like hard-graded ones.
    #[must_use]
    pub fn relock_free_text(&self) -> bool {
        self.relock_free_text
    }
}
