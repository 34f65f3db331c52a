use super::*;
use crate::core::errors::DuckyError;
use serde_json::json;
use tempfile::tempdir;

fn expect_validation_error<T: std::fmt::Debug>(result: Result<T>) -> DuckyError {
    result.expect_err("expected validation failure")
}

#[test]
fn default_configs_validate_successfully() {
    DuckyConfig::default().validate().expect("ducky default");
    InputConfig::default().validate().expect("input default");
    DedupeConfig::default().validate().expect("dedupe default");
    EnhancementConfig::default()
        .validate()
        .expect("enhancement default");
    PipelineConfig::default().validate().expect("pipeline default");
}

#[test]
fn defaults_match_documented_values() {
    let config = DuckyConfig::default();
    assert_eq!(config.enhancement.confidence_threshold, 0.7);
    assert_eq!(config.dedupe.similarity_threshold, 0.85);
    assert_eq!(
        config.export_config.default_formats,
        vec![ExportFormat::Markdown, ExportFormat::Html, ExportFormat::Json]
    );
    assert_eq!(
        config.export_config.output_directory,
        PathBuf::from("./duckycoder_output")
    );
    assert_eq!(config.input_config.max_file_size_bytes().unwrap(), 20 * 1024 * 1024);
    assert!(config.pipeline.evaluator_timeout_ms.is_none());
}

#[test]
fn enhancement_threshold_bounds() {
    let mut config = EnhancementConfig::default();
    config.confidence_threshold = 1.5;
    let err = expect_validation_error(config.validate());
    assert!(matches!(err, DuckyError::Validation { .. }));
}

#[test]
fn dedupe_weights_must_sum_to_one() {
    let mut config = DedupeConfig::default();
    config.weights.syntactic = 0.5;
    let err = expect_validation_error(config.validate());
    if let DuckyError::Validation { field, .. } = err {
        assert_eq!(field.as_deref(), Some("dedupe.weights"));
    } else {
        panic!("Expected Validation error");
    }
}

#[test]
fn zero_timeouts_are_rejected() {
    let config = PipelineConfig {
        evaluator_timeout_ms: Some(0),
        mode_timeout_ms: None,
    };
    assert!(config.validate().is_err());
}

#[test]
fn parse_size_handles_units() {
    assert_eq!(parse_size("20MB").unwrap(), 20 * 1024 * 1024);
    assert_eq!(parse_size("512kb").unwrap(), 512 * 1024);
    assert_eq!(parse_size("100").unwrap(), 100);
    assert_eq!(parse_size("1.5K").unwrap(), 1536);
    assert!(parse_size("twenty").is_err());
    assert!(parse_size("10PB").is_err());
}

#[test]
fn deep_merge_overlays_nested_keys() {
    let mut base = json!({"a": {"b": 1, "c": 2}, "d": [1, 2]});
    deep_merge(&mut base, json!({"a": {"c": 3}, "d": [9]}));
    assert_eq!(base, json!({"a": {"b": 1, "c": 3}, "d": [9]}));
}

#[test]
fn partial_document_keeps_defaults() {
    let config = DuckyConfig::from_document(json!({
        "export_config": {"default_formats": ["json", "sarif"]},
        "modes": {"dry_run": false}
    }))
    .unwrap();

    assert_eq!(
        config.export_config.default_formats,
        vec![ExportFormat::Json, ExportFormat::Sarif]
    );
    assert_eq!(
        config.export_config.output_directory,
        PathBuf::from("./duckycoder_output")
    );
    assert!(!config.modes.is_enabled("dry_run"));
    // default mode entries survive the merge
    assert!(!config.modes.is_enabled("quantum_computing"));
}

#[test]
fn unknown_export_format_is_rejected() {
    let result = DuckyConfig::from_document(json!({
        "export_config": {"default_formats": ["docx"]}
    }));
    assert!(matches!(result, Err(DuckyError::Serialization { .. })));
}

#[test]
fn yaml_and_json_round_trip_through_files() {
    let dir = tempdir().unwrap();
    let yaml_path = dir.path().join("config.yaml");
    let json_path = dir.path().join("config.json");

    let mut config = DuckyConfig::default();
    config.dedupe.similarity_threshold = 0.9;
    config.to_file(&yaml_path).unwrap();
    config.to_file(&json_path).unwrap();

    assert_eq!(DuckyConfig::from_file(&yaml_path).unwrap(), config);
    assert_eq!(DuckyConfig::from_file(&json_path).unwrap(), config);
}

#[test]
fn load_requires_explicit_path_to_exist() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    let err = DuckyConfig::load(Some(&missing)).unwrap_err();
    assert!(matches!(err, DuckyError::Config { .. }));
}

#[test]
fn unreadable_and_malformed_files_name_the_path() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");
    match read_document(&missing) {
        Err(DuckyError::Io { message, .. }) => {
            assert!(message.starts_with("Failed to read config file"));
            assert!(message.contains("absent.yaml"));
        }
        other => panic!("expected Io error, got {other:?}"),
    }

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ \"modes\": ").unwrap();
    let err = read_document(&broken).unwrap_err();
    assert!(matches!(err, DuckyError::Serialization { .. }));
    assert!(err.to_string().contains("Failed to parse config file"));
    assert!(err.to_string().contains("broken.json"));
}

#[test]
fn validate_document_reports_missing_sections() {
    let err = validate_document(&json!({"modes": {}})).unwrap_err();
    assert!(err.to_string().contains("input_config"));

    let mut full = serde_json::to_value(DuckyConfig::default()).unwrap();
    validate_document(&full).expect("defaults are structurally valid");

    full["export_config"]["default_formats"] = json!("markdown");
    let err = validate_document(&full).unwrap_err();
    assert!(err.to_string().contains("default_formats"));
}

#[test]
fn export_format_parsing() {
    assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
    assert_eq!("ZIP".parse::<ExportFormat>().unwrap(), ExportFormat::Archive);
    assert_eq!(ExportFormat::Sarif.extension(), "sarif");
    assert!("docx".parse::<ExportFormat>().is_err());
}
