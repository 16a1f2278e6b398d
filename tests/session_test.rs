//! Trial Session Tests
//!
//! State machine, persistence on completion, run identifiers and storage
//! failures.

use std::fs;

use factorial_trials::design::{DesignBuilder, Factor, FactorLevel, Trial, TrialSequence};
use factorial_trials::session::{Progress, ResponseScale, SessionState, TrialSession, MAX_RUN_ID_ATTEMPTS};
use factorial_trials::results::ResultTable;
use factorial_trials::store::{FileStore, MemoryStore, ResultStore};
use factorial_trials::{Error, Result};
use tempfile::tempdir;

/// Store where every identifier is already taken.
struct FullStore;

impl ResultStore for FullStore {
    fn supports_run_ids(&self) -> bool {
        true
    }

    fn exists(&self, _run_id: &str) -> Result<bool> {
        Ok(true)
    }

    fn location(&self, run_id: Option<&str>) -> String {
        format!("results_{}.csv", run_id.unwrap_or_default())
    }

    fn write(&self, _location: &str, _table: &str) -> Result<()> {
        Ok(())
    }
}

/// 30 trials in a fixed, hand-shuffled order: masses 1.0..=4.0 step 0.6.
fn fixed_sequence() -> TrialSequence {
    let masses = [1.0, 1.6, 2.2, 2.8, 3.4, 4.0];
    let trials = (0..30)
        .map(|i| Trial::new(vec![FactorLevel::Magnitude(masses[(i * 7) % 6])]))
        .collect();
    TrialSequence::from_trials(vec!["Mass".to_string()], trials).unwrap()
}

// =============================================================================
// Concrete scenario
// =============================================================================

#[test]
fn test_thirty_trial_session_writes_31_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.csv");
    let mut session = TrialSession::new(fixed_sequence(), FileStore::new(path.clone())).unwrap();

    for i in 0..29 {
        assert_eq!(session.respond(0).unwrap(), Progress::Next { index: i + 1 });
        assert!(!path.exists(), "results written before completion");
    }
    let last = session.respond(0).unwrap();

    assert_eq!(
        last,
        Progress::Complete {
            location: path.display().to_string()
        }
    );
    assert_eq!(session.state(), SessionState::Complete);

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 31);
    assert_eq!(lines[0], "Trial,Mass,Response");
    for (i, line) in lines[1..].iter().enumerate() {
        let number: usize = line.split(',').next().unwrap().parse().unwrap();
        assert_eq!(number, i + 1);
        assert!(line.ends_with(",0"));
    }
    assert!(text.ends_with('\n'));
}

// =============================================================================
// Termination and single-write
// =============================================================================

#[test]
fn test_n_plus_first_response_fails() {
    let sequence = DesignBuilder::new()
        .factor(Factor::indexed("Cue", 3))
        .build()
        .unwrap();
    let mut session = TrialSession::new(sequence, MemoryStore::default()).unwrap();

    for _ in 0..3 {
        session.respond(1).unwrap();
    }
    assert!(session.is_complete());

    let err = session.respond(1).unwrap_err();
    assert!(matches!(err, Error::SessionComplete { trials: 3 }));
    assert_eq!(session.current_index(), 3);
    assert_eq!(session.responses(), [Some(1), Some(1), Some(1)]);
}

#[test]
fn test_responses_follow_trial_index() {
    let mut session = TrialSession::new(fixed_sequence(), MemoryStore::default())
        .unwrap()
        .with_response_scale(ResponseScale::binary("light", "heavy"));

    let answers: Vec<u32> = (0..30).map(|i| i % 2).collect();
    for (i, &answer) in answers.iter().enumerate() {
        assert_eq!(session.current_index(), i);
        let expected = session.sequence().get(i).unwrap().clone();
        assert_eq!(session.current_trial().unwrap(), &expected);
        session.respond(answer).unwrap();
        assert_eq!(session.responses()[i], Some(answer));
    }

    let table = session.store().get("results.csv").unwrap();
    for (line, &answer) in table.lines().skip(1).zip(&answers) {
        assert!(line.ends_with(&format!(",{answer}")));
    }
}

#[test]
fn test_stored_table_with_multiline_labels_parses_back() {
    let sequence = DesignBuilder::new()
        .factor(Factor::discrete("Clip", ["a\nb", "c"]))
        .build()
        .unwrap();
    let mut session = TrialSession::new(sequence, MemoryStore::default()).unwrap();
    session.respond(0).unwrap();
    session.respond(1).unwrap();

    let text = session.store().get("results.csv").unwrap();
    let table = ResultTable::parse(&text).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table, session.result_table().unwrap());

    let mut labels: Vec<&str> = table.rows().iter().map(|r| r.values()[0].as_str()).collect();
    labels.sort_unstable();
    assert_eq!(labels, ["a\nb", "c"]);
}

#[test]
fn test_rejected_response_does_not_advance() {
    let mut session = TrialSession::new(fixed_sequence(), MemoryStore::default()).unwrap();

    assert!(matches!(
        session.respond(2),
        Err(Error::InvalidResponse { value: 2, .. })
    ));
    assert_eq!(session.state(), SessionState::AwaitingResponse(0));
    assert_eq!(session.respond(1).unwrap(), Progress::Next { index: 1 });
}

// =============================================================================
// Run identifiers
// =============================================================================

#[test]
fn test_concurrent_runs_get_distinct_files() {
    let dir = tempdir().unwrap();
    let store = FileStore::with_run_ids(dir.path().join("results.csv"));

    let mut locations = Vec::new();
    for _ in 0..3 {
        let sequence = DesignBuilder::new()
            .factor(Factor::indexed("Cue", 2))
            .build()
            .unwrap();
        let mut session = TrialSession::new(sequence, &store).unwrap();
        session.respond(0).unwrap();
        session.respond(1).unwrap();
        locations.push(session.location().to_string());
    }

    locations.sort();
    locations.dedup();
    assert_eq!(locations.len(), 3);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
}

#[test]
fn test_identifier_exhausted() {
    let sequence = DesignBuilder::new()
        .factor(Factor::indexed("Cue", 2))
        .build()
        .unwrap();

    let err = TrialSession::new(sequence, FullStore).err().unwrap();
    assert!(matches!(
        err,
        Error::IdentifierExhausted { attempts } if attempts == MAX_RUN_ID_ATTEMPTS
    ));
}

// =============================================================================
// Storage failures
// =============================================================================

#[test]
fn test_storage_failure_is_reported_and_retryable() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path().join("missing").join("results.csv"));
    let sequence = DesignBuilder::new()
        .factor(Factor::indexed("Cue", 2))
        .build()
        .unwrap();
    let mut session = TrialSession::new(sequence, store).unwrap();

    session.respond(0).unwrap();
    let err = session.respond(1).unwrap_err();
    assert!(matches!(err, Error::StorageWriteFailed { .. }));
    assert!(session.is_complete());

    let fallback = dir.path().join("fallback.csv").display().to_string();
    session.save_to(fallback.clone()).unwrap();
    assert_eq!(session.location(), fallback);
    assert_eq!(fs::read_to_string(&fallback).unwrap().lines().count(), 3);
}
