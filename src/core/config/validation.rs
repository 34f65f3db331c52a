//! Validation helper functions for configuration types.

use serde_json::Value;

use crate::core::errors::{DuckyError, Result};

/// Top-level sections a configuration document must carry.
pub const REQUIRED_SECTIONS: &[&str] = &[
    "input_config",
    "modes",
    "export_config",
    "security_config",
    "logging",
    "performance_monitoring",
];

/// Validate that a usize value is greater than zero.
pub fn validate_positive_usize(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(DuckyError::validation(format!(
            "{} must be greater than 0",
            field
        )));
    }
    Ok(())
}

/// Validate that an f64 value is greater than zero.
pub fn validate_positive_f64(value: f64, field: &str) -> Result<()> {
    if value <= 0.0 {
        return Err(DuckyError::validation(format!(
            "{} must be greater than 0.0",
            field
        )));
    }
    Ok(())
}

/// Validate that an f64 value is non-negative.
pub fn validate_non_negative(value: f64, field: &str) -> Result<()> {
    if value < 0.0 {
        return Err(DuckyError::validation(format!(
            "{} must be non-negative",
            field
        )));
    }
    Ok(())
}

/// Validate that an f64 value is in the unit range [0.0, 1.0].
pub fn validate_unit_range(value: f64, field: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DuckyError::validation(format!(
            "{} must be between 0.0 and 1.0",
            field
        )));
    }
    Ok(())
}

/// Validate that weights sum to approximately 1.0 (within tolerance).
pub fn validate_weights_sum(weights: &[f64], tolerance: f64, field: &str) -> Result<()> {
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > tolerance {
        return Err(DuckyError::validation_field(
            format!("{} should sum to approximately 1.0", field),
            field,
            "1.0",
            format!("{sum:.3}"),
        ));
    }
    Ok(())
}

/// Validate that an optional millisecond budget is non-zero when present.
pub fn validate_optional_timeout(value: Option<u64>, field: &str) -> Result<()> {
    if value == Some(0) {
        return Err(DuckyError::validation(format!(
            "{} must be greater than 0 when set",
            field
        )));
    }
    Ok(())
}

/// Structural check over a raw configuration document, before it is merged
/// with defaults. Mirrors what `config validate` reports to users.
pub fn validate_document(document: &Value) -> Result<()> {
    let Some(root) = document.as_object() else {
        return Err(DuckyError::config("configuration root must be a mapping"));
    };

    for section in REQUIRED_SECTIONS {
        if !root.contains_key(*section) {
            return Err(DuckyError::config_field(
                format!("Missing required configuration section: {section}"),
                *section,
            ));
        }
    }

    let supported = root
        .get("input_config")
        .and_then(|section| section.get("supported_formats"));
    if !matches!(supported, Some(Value::Array(_))) {
        return Err(DuckyError::config_field(
            "input_config.supported_formats must be a list",
            "input_config.supported_formats",
        ));
    }

    if !matches!(root.get("modes"), Some(Value::Object(_))) {
        return Err(DuckyError::config_field(
            "modes must be a mapping",
            "modes",
        ));
    }

    let formats = root
        .get("export_config")
        .and_then(|section| section.get("default_formats"));
    if !matches!(formats, Some(Value::Array(_))) {
        return Err(DuckyError::config_field(
            "export_config.default_formats must be a list",
            "export_config.default_formats",
        ));
    }

    Ok(())
}
