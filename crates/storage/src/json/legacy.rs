//! Import of the older per-module progress layout.
//!
//! Each practice module used to keep separate JSON entries: a running score, a
//! completed map, an attempts map and (for free-text modules) saved answers. Those
//! entries are folded into one [`ProgressMap`] keyed by exercise id.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use study_core::model::{Answer, CategoryName, ExerciseId, ProgressRecord};

use super::ser;
use crate::repository::{ProgressMap, StorageError};

/// Raw entry values of one module, as they were stored.
#[derive(Debug, Clone, Default)]
pub struct LegacyModuleEntries {
    pub score: Option<String>,
    pub completed: Option<String>,
    pub attempts: Option<String>,
    pub answers: Option<String>,
}

/// Completed-map values were either a bare flag or the graded answer.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CompletedEntry {
    Flag(bool),
    Graded { answer: String, correct: bool },
}

fn parse_map<T: for<'de> Deserialize<'de>>(
    raw: Option<&str>,
) -> Result<BTreeMap<String, T>, StorageError> {
    match raw.map(str::trim) {
        None | Some("") | Some("null") => Ok(BTreeMap::new()),
        Some(raw) => serde_json::from_str(raw).map_err(ser),
    }
}

/// Fold one module's entries into progress records of `category`.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if an entry is not valid JSON of the expected shape.
pub fn import_module(
    category: &CategoryName,
    entries: &LegacyModuleEntries,
) -> Result<ProgressMap, StorageError> {
    let completed: BTreeMap<String, CompletedEntry> = parse_map(entries.completed.as_deref())?;
    let attempts: BTreeMap<String, u32> = parse_map(entries.attempts.as_deref())?;
    let answers: BTreeMap<String, String> = parse_map(entries.answers.as_deref())?;

    let ids: BTreeSet<&String> = completed
        .keys()
        .chain(attempts.keys())
        .chain(answers.keys())
        .collect();

    let mut records = ProgressMap::new();
    for raw_id in ids {
        let Ok(id) = ExerciseId::new(raw_id.as_str()) else {
            log::warn!("Skipping legacy progress entry with blank id");
            continue;
        };

        let (done, correct, graded_answer) = match completed.get(raw_id) {
            Some(CompletedEntry::Flag(flag)) => (*flag, false, None),
            Some(CompletedEntry::Graded { answer, correct }) => {
                (true, *correct, Some(Answer::Choice(answer.clone())))
            }
            None => (false, false, None),
        };
        let last_answer =
            graded_answer.or_else(|| answers.get(raw_id).map(|text| Answer::Text(text.clone())));

        records.insert(
            id,
            ProgressRecord::from_persisted(
                category.clone(),
                attempts.get(raw_id).copied().unwrap_or(0),
                done,
                correct,
                last_answer,
            ),
        );
    }

    if let Some(score) = entries.score.as_deref() {
        let correct = records.values().filter(|r| r.correct()).count();
        if score.trim().parse::<usize>().ok() != Some(correct) {
            log::debug!(
                "Legacy score {score} for {category} differs from {correct} correct records"
            );
        }
    }

    Ok(records)
}
