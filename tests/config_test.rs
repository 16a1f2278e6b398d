//! Experiment configuration tests

use std::fs;

use factorial_trials::store::ResultStore;
use factorial_trials::{Error, ExperimentConfig, TrialSession};
use tempfile::tempdir;

#[test]
fn test_load_config_file_and_run() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("scale.csv");
    let config_path = dir.path().join("scale.json");

    let json = serde_json::json!({
        "name": "scale-judgement",
        "factors": [
            { "kind": "range", "name": "Scale", "lo": 0.5, "hi": 1.5, "levels": 3 },
            { "kind": "indexed", "name": "Cue", "count": 2 }
        ],
        "repetitions": 2,
        "output": output,
        "responses": ["smaller", "larger"],
        "prompt": "Is the second object larger?",
        "prompt_delay_ms": 250
    });
    fs::write(&config_path, json.to_string()).unwrap();

    let config = ExperimentConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.prompt_delay().as_millis(), 250);

    let sequence = config.design().build().unwrap();
    assert_eq!(sequence.len(), 12);
    assert_eq!(sequence.columns(), ["Scale", "Cue"]);

    let scale = config.response_scale().unwrap();
    let mut session = TrialSession::new(sequence, config.store())
        .unwrap()
        .with_response_scale(scale);
    while !session.is_complete() {
        let answer = session.response_scale().parse("larger").unwrap();
        session.respond(answer).unwrap();
    }

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("Trial,Scale,Cue,Response\n"));
    assert_eq!(text.lines().count(), 13);
}

#[test]
fn test_run_ids_config_uses_suffixed_files() {
    let dir = tempdir().unwrap();
    let mut config = ExperimentConfig::mass_discrimination();
    config.output = dir.path().join("results.csv");
    config.run_ids = true;

    let store = config.store();
    assert!(store.supports_run_ids());
    assert!(store.location(Some("abcd1234")).ends_with("results_abcd1234.csv"));
}

#[test]
fn test_missing_config_file() {
    let err = ExperimentConfig::from_json_file("/nonexistent/experiment.json").unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn test_single_response_is_rejected() {
    let mut config = ExperimentConfig::default();
    config.responses = vec!["only".to_string()];
    assert!(matches!(
        config.response_scale(),
        Err(Error::InvalidConfig(_))
    ));
}
