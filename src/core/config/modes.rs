//! Per-mode switches and settings.
//!
//! A mode entry is either a bare boolean (`debug_assistant: true`) or a
//! mapping of free-form settings that may carry an `enabled` key. Modes
//! without an entry are enabled.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// One entry under the `modes` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ModeSetting {
    /// `mode_name: true|false`
    Flag(bool),
    /// `mode_name: { enabled: ..., other settings }`
    Table(Map<String, Value>),
}

impl ModeSetting {
    /// Whether the mode is switched on.
    pub fn enabled(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Table(table) => table
                .get("enabled")
                .and_then(Value::as_bool)
                .unwrap_or(true),
        }
    }

    /// Look up a named setting. Flags carry no settings.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Flag(_) => None,
            Self::Table(table) => table.get(key),
        }
    }
}

/// The `modes` section, keyed by mode name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ModesConfig(pub IndexMap<String, ModeSetting>);

impl ModesConfig {
    /// Enabled flag for a mode; unknown or missing entries default to on.
    pub fn is_enabled(&self, mode: &str) -> bool {
        self.0.get(mode).map_or(true, ModeSetting::enabled)
    }

    /// Raw setting value for a mode.
    pub fn setting(&self, mode: &str, key: &str) -> Option<&Value> {
        self.0.get(mode).and_then(|entry| entry.get(key))
    }

    /// String setting with a fallback.
    pub fn setting_str<'a>(&'a self, mode: &str, key: &str, fallback: &'a str) -> &'a str {
        self.setting(mode, key)
            .and_then(Value::as_str)
            .unwrap_or(fallback)
    }

    /// Boolean setting with a fallback.
    pub fn setting_bool(&self, mode: &str, key: &str, fallback: bool) -> bool {
        self.setting(mode, key)
            .and_then(Value::as_bool)
            .unwrap_or(fallback)
    }

    /// Replace the enabled flag of a mode, keeping any other settings.
    pub fn set_enabled(&mut self, mode: &str, enabled: bool) {
        match self.0.get_mut(mode) {
            Some(ModeSetting::Table(table)) => {
                table.insert("enabled".to_string(), Value::Bool(enabled));
            }
            Some(entry) => *entry = ModeSetting::Flag(enabled),
            None => {
                self.0.insert(mode.to_string(), ModeSetting::Flag(enabled));
            }
        }
    }
}

fn table(value: Value) -> ModeSetting {
    match value {
        Value::Object(map) => ModeSetting::Table(map),
        Value::Bool(flag) => ModeSetting::Flag(flag),
        _ => ModeSetting::Flag(true),
    }
}

impl Default for ModesConfig {
    /// Returns the default mode switches.
    fn default() -> Self {
        let mut modes = IndexMap::new();
        modes.insert("full_pipeline".to_string(), ModeSetting::Flag(true));
        modes.insert(
            "realtime_collaboration".to_string(),
            table(json!({
                "enabled": false,
                "max_participants": 20,
                "conflict_resolution": "auto"
            })),
        );
        modes.insert(
            "continuous_integration".to_string(),
            table(json!({
                "enabled": false,
                "severity_threshold": "medium",
                "block_on_errors": true,
                "slack_notifications": false
            })),
        );
        modes.insert(
            "security_scanning".to_string(),
            table(json!({
                "enabled": true,
                "scan_intensity": "comprehensive",
                "compliance_standards": ["GDPR", "HIPAA", "PCI", "SOC2", "ISO-27001"]
            })),
        );
        modes.insert(
            "ui_design".to_string(),
            table(json!({
                "framework": "auto",
                "responsive_previews": true,
                "accessibility_checks": true,
                "mockup_preview": true
            })),
        );
        modes.insert("debug_assistant".to_string(), ModeSetting::Flag(true));
        modes.insert("api_validation".to_string(), ModeSetting::Flag(true));
        modes.insert("doc_generator".to_string(), ModeSetting::Flag(true));
        modes.insert(
            "performance_profiling".to_string(),
            table(json!({
                "enabled": true,
                "metrics": ["cpu", "memory", "io"],
                "alert_thresholds": { "cpu": "80%", "memory": "4GB", "io": "100MB/s" }
            })),
        );
        modes.insert(
            "quantum_computing".to_string(),
            table(json!({
                "enabled": false,
                "framework": "qiskit"
            })),
        );
        Self(modes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_modes_default_to_enabled() {
        let modes = ModesConfig(IndexMap::new());
        assert!(modes.is_enabled("analyze_only"));
    }

    #[test]
    fn flag_and_table_entries_are_respected() {
        let modes = ModesConfig::default();
        assert!(modes.is_enabled("debug_assistant"));
        assert!(!modes.is_enabled("quantum_computing"));
        assert!(modes.is_enabled("ui_design"));
        assert_eq!(
            modes.setting_str("quantum_computing", "framework", "none"),
            "qiskit"
        );
    }

    #[test]
    fn set_enabled_keeps_other_settings() {
        let mut modes = ModesConfig::default();
        modes.set_enabled("security_scanning", false);
        assert!(!modes.is_enabled("security_scanning"));
        assert_eq!(
            modes.setting_str("security_scanning", "scan_intensity", ""),
            "comprehensive"
        );
        modes.set_enabled("api_validation", false);
        assert!(!modes.is_enabled("api_validation"));
    }

    #[test]
    fn yaml_accepts_both_shapes() {
        let yaml = "dry_run: false\nui_design:\n  enabled: false\n  framework: react\n";
        let modes: ModesConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!modes.is_enabled("dry_run"));
        assert!(!modes.is_enabled("ui_design"));
        assert_eq!(modes.setting_str("ui_design", "framework", "auto"), "react");
    }
}
