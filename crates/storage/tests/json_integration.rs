use std::fs;

use storage::json::legacy::{LegacyModuleEntries, import_module};
use storage::json::settings::{SettingsRecord, load_settings_from_path};
use storage::{JsonFilePersistence, ProgressMap, ProgressPersistence};
use study_core::model::{Answer, CategoryName, ExerciseId, Outcome, ProgressRecord, SessionOrder};
use study_core::time::fixed_now;

fn id(raw: &str) -> ExerciseId {
    ExerciseId::new(raw).unwrap()
}

fn category(name: &str) -> CategoryName {
    CategoryName::new(name).unwrap()
}

#[test]
fn imported_legacy_progress_persists_as_json() {
    let mut progress = ProgressMap::new();
    progress.extend(
        import_module(
            &category("constraints"),
            &LegacyModuleEntries {
                score: Some("1".into()),
                completed: Some(r#"{"cv1": {"answer": "b", "correct": true}}"#.into()),
                attempts: Some(r#"{"cv1": 2}"#.into()),
                answers: None,
            },
        )
        .unwrap(),
    );
    progress.extend(
        import_module(
            &category("sql"),
            &LegacyModuleEntries {
                answers: Some(r#"{"sql1": "SELECT * FROM employee"}"#.into()),
                ..LegacyModuleEntries::default()
            },
        )
        .unwrap(),
    );

    let dir = tempfile::tempdir().unwrap();
    let backend = JsonFilePersistence::new(dir.path().join("progress.json"));
    backend.save(&progress).unwrap();

    let loaded = backend.load().unwrap();
    assert_eq!(loaded, progress);
    assert_eq!(loaded[&id("cv1")].attempts(), 2);
    assert_eq!(loaded[&id("cv1")].category(), &category("constraints"));
    assert_eq!(
        loaded[&id("sql1")].last_answer(),
        Some(&Answer::Text("SELECT * FROM employee".into()))
    );
}

#[test]
fn progress_file_is_keyed_by_exercise_id() {
    let mut record = ProgressRecord::new(category("sql"));
    record.apply_outcome(
        Outcome {
            correct: false,
            raw_answer: Answer::Choice("a".into()),
            coverage: None,
        },
        fixed_now(),
    );
    let mut progress = ProgressMap::new();
    progress.insert(id("q1"), record);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.json");
    JsonFilePersistence::new(&path).save(&progress).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["q1"]["category"], "sql");
    assert_eq!(raw["q1"]["attempts"], 1);
    assert_eq!(raw["q1"]["completed"], true);
    assert_eq!(raw["q1"]["last_answer"]["kind"], "choice");
}

#[test]
fn settings_file_round_trips_through_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let record = SettingsRecord {
        keyword_pass_threshold: 70,
        default_order: SessionOrder::Shuffled,
        ..SettingsRecord::default()
    };
    fs::write(&path, serde_json::to_string(&record).unwrap()).unwrap();

    let settings = load_settings_from_path(&path).unwrap();
    assert_eq!(settings.grading().pass_threshold(), 70);
    assert_eq!(settings.default_order(), SessionOrder::Shuffled);
    assert_eq!(SettingsRecord::from_settings(&settings), record);
}
