//! Configuration types and management for duckycoder.
//!
//! The configuration is a nested mapping (YAML or JSON on disk) whose
//! recognised top-level sections map onto the typed structs below. User files
//! may be partial: they are deep-merged over the defaults before being
//! deserialized, so any key the user leaves out keeps its default value.

pub mod dedupe;
pub mod modes;
pub mod validation;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::core::errors::{DuckyError, Result, ResultExt};

pub use dedupe::{DedupeConfig, SimilarityWeights};
pub use modes::{ModeSetting, ModesConfig};
pub use validation::{
    validate_document, validate_non_negative, validate_optional_timeout, validate_positive_f64,
    validate_positive_usize, validate_unit_range, validate_weights_sum, REQUIRED_SECTIONS,
};

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "duckycoder_config.yaml";

/// Main configuration for the duckycoder pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DuckyConfig {
    /// Configuration schema version
    #[serde(default = "DuckyConfig::default_version")]
    pub version: String,

    /// Input discovery and decoding
    #[serde(default)]
    pub input_config: InputConfig,

    /// Per-mode switches and settings
    #[serde(default)]
    pub modes: ModesConfig,

    /// Export formats and destination
    #[serde(default)]
    pub export_config: ExportConfig,

    /// Security scanning and compliance mapping
    #[serde(default)]
    pub security_config: SecurityConfig,

    /// Log level and output format
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Optional performance optimization stage
    #[serde(default)]
    pub performance_monitoring: PerformanceMonitoringConfig,

    /// Placeholder optimization settings, reported but not acted upon
    #[serde(default)]
    pub ml_optimization: MlOptimizationConfig,

    /// Optional UI mockup stage
    #[serde(default)]
    pub ui_mockup: UiMockupConfig,

    /// Enhancement filtering
    #[serde(default)]
    pub enhancement: EnhancementConfig,

    /// Near-duplicate merging
    #[serde(default)]
    pub dedupe: DedupeConfig,

    /// Execution budgets
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Default for DuckyConfig {
    /// Returns the default duckycoder configuration.
    fn default() -> Self {
        Self {
            version: Self::default_version(),
            input_config: InputConfig::default(),
            modes: ModesConfig::default(),
            export_config: ExportConfig::default(),
            security_config: SecurityConfig::default(),
            logging: LoggingConfig::default(),
            performance_monitoring: PerformanceMonitoringConfig::default(),
            ml_optimization: MlOptimizationConfig::default(),
            ui_mockup: UiMockupConfig::default(),
            enhancement: EnhancementConfig::default(),
            dedupe: DedupeConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl DuckyConfig {
    fn default_version() -> String {
        crate::VERSION.to_string()
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
    /// working directory is used when present, and the defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(DuckyError::config_field(
                        format!("Configuration file not found: {}", path.display()),
                        "config",
                    ));
                }
                Self::from_file(path)
            }
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)
                } else {
                    debug!("No configuration file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a YAML or JSON file, merged over defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let document = read_document(path.as_ref())?;
        let config = Self::from_document(document)?;
        info!("Configuration loaded from {}", path.as_ref().display());
        Ok(config)
    }

    /// Build a configuration from a raw (possibly partial) document.
    pub fn from_document(document: Value) -> Result<Self> {
        let mut merged = serde_json::to_value(Self::default())?;
        deep_merge(&mut merged, document);
        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration, choosing YAML or JSON from the file extension.
    pub fn to_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = if is_json_path(&path) {
            serde_json::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)?
        };
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        self.input_config.validate()?;
        self.export_config.validate()?;
        self.enhancement.validate()?;
        self.ml_optimization.validate()?;
        self.dedupe.validate()?;
        self.pipeline.validate()?;
        Ok(())
    }
}

/// Read a configuration file into an untyped document.
pub fn read_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let document: Value = if is_json_path(path) {
        serde_json::from_str(&content).map_err(DuckyError::from)
    } else {
        serde_yaml::from_str(&content).map_err(DuckyError::from)
    }
    .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(match document {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    })
}

fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Recursively merge `overlay` into `base`. Mappings merge key by key; any
/// other overlay value replaces the base value.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value);
                    }
                    _ => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Parse a human-readable size such as `20MB`, `512KB` or `1048576`.
pub fn parse_size(value: &str) -> Result<u64> {
    let trimmed = value.trim();
    let upper = trimmed.to_ascii_uppercase();
    let split = upper
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(upper.len());
    let (number, unit) = upper.split_at(split);
    let number: f64 = number.parse().map_err(|_| {
        DuckyError::validation_field(
            format!("Invalid size value '{trimmed}'"),
            "input_config.max_file_size",
            "a number followed by B, KB, MB or GB",
            trimmed,
        )
    })?;

    let multiplier = match unit.trim() {
        "" | "B" => 1.0,
        "KB" | "K" => 1024.0,
        "MB" | "M" => 1024.0 * 1024.0,
        "GB" | "G" => 1024.0 * 1024.0 * 1024.0,
        other => {
            return Err(DuckyError::validation_field(
                format!("Unknown size unit '{other}'"),
                "input_config.max_file_size",
                "B, KB, MB or GB",
                other,
            ))
        }
    };

    Ok((number * multiplier) as u64)
}

/// Input discovery and decoding configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    /// File extensions accepted from disk (without the dot)
    #[serde(default = "InputConfig::default_supported_formats")]
    pub supported_formats: Vec<String>,

    /// Decode non-UTF-8 files lossily instead of rejecting them
    #[serde(default = "InputConfig::default_true")]
    pub auto_convert_encoding: bool,

    /// Maximum size of a single file, e.g. `20MB`
    #[serde(default = "InputConfig::default_max_file_size")]
    pub max_file_size: String,

    /// Descend into subdirectories of directory inputs
    #[serde(default = "InputConfig::default_true")]
    pub recursive_directory_scan: bool,

    /// Resolve dependency edges across languages in the merge stage
    #[serde(default = "InputConfig::default_true")]
    pub cross_language_deps: bool,

    /// Glob patterns skipped while walking directories
    #[serde(default = "InputConfig::default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

impl Default for InputConfig {
    /// Returns the default input configuration.
    fn default() -> Self {
        Self {
            supported_formats: Self::default_supported_formats(),
            auto_convert_encoding: true,
            max_file_size: Self::default_max_file_size(),
            recursive_directory_scan: true,
            cross_language_deps: true,
            ignore_patterns: Self::default_ignore_patterns(),
        }
    }
}

impl InputConfig {
    const fn default_true() -> bool {
        true
    }

    fn default_max_file_size() -> String {
        "20MB".to_string()
    }

    fn default_supported_formats() -> Vec<String> {
        [
            "py", "sh", "ps1", "rs", "js", "java", "cs", "go", "ts", "jsx", "tsx", "cpp", "c",
            "rb", "php", "txt", "md", "json", "xml", "ipynb", "yaml", "yml", "csv", "tsv", "sql",
            "html", "htm", "css", "scss", "less", "vue", "svelte", "dart", "kt", "swift", "r",
            "scala", "clj", "hs", "elm", "ml", "fs", "m",
        ]
        .iter()
        .map(|ext| (*ext).to_string())
        .collect()
    }

    fn default_ignore_patterns() -> Vec<String> {
        vec![
            "**/.git/**".to_string(),
            "**/node_modules/**".to_string(),
            "**/target/**".to_string(),
            "**/__pycache__/**".to_string(),
        ]
    }

    /// Maximum file size in bytes.
    pub fn max_file_size_bytes(&self) -> Result<u64> {
        parse_size(&self.max_file_size)
    }

    /// Whether a file extension is accepted.
    pub fn supports_extension(&self, extension: &str) -> bool {
        self.supported_formats
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// Validate input configuration
    pub fn validate(&self) -> Result<()> {
        if self.supported_formats.is_empty() {
            return Err(DuckyError::config_field(
                "supported_formats must list at least one extension",
                "input_config.supported_formats",
            ));
        }
        let bytes = self.max_file_size_bytes()?;
        if bytes == 0 {
            return Err(DuckyError::validation(
                "input_config.max_file_size must be greater than 0",
            ));
        }
        for pattern in &self.ignore_patterns {
            globset::Glob::new(pattern).map_err(|e| {
                DuckyError::config_field(
                    format!("Invalid ignore pattern '{pattern}': {e}"),
                    "input_config.ignore_patterns",
                )
            })?;
        }
        Ok(())
    }
}

/// Available export formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Markdown report
    #[serde(alias = "md")]
    Markdown,
    /// Standalone HTML report
    Html,
    /// JSON document
    Json,
    /// YAML document
    #[serde(alias = "yml")]
    Yaml,
    /// Plain-text PDF
    Pdf,
    /// SARIF 2.1.0 log
    Sarif,
    /// Zip archive with the JSON report and enhanced sources
    #[serde(alias = "zip")]
    Archive,
}

impl ExportFormat {
    /// Every format, in report order.
    pub const ALL: [ExportFormat; 7] = [
        ExportFormat::Markdown,
        ExportFormat::Html,
        ExportFormat::Json,
        ExportFormat::Yaml,
        ExportFormat::Pdf,
        ExportFormat::Sarif,
        ExportFormat::Archive,
    ];

    /// File extension used for the artifact.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Pdf => "pdf",
            Self::Sarif => "sarif",
            Self::Archive => "zip",
        }
    }

    /// Canonical lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Pdf => "pdf",
            Self::Sarif => "sarif",
            Self::Archive => "archive",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = DuckyError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "pdf" => Ok(Self::Pdf),
            "sarif" => Ok(Self::Sarif),
            "archive" | "zip" => Ok(Self::Archive),
            other => Err(DuckyError::unsupported(format!(
                "Unknown export format '{other}'"
            ))),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    /// Formats written when none are requested explicitly
    #[serde(default = "ExportConfig::default_formats")]
    pub default_formats: Vec<ExportFormat>,

    /// Directory that receives report artifacts
    #[serde(default = "ExportConfig::default_output_directory")]
    pub output_directory: PathBuf,

    /// Include run metadata in reports
    #[serde(default = "ExportConfig::default_include_metadata")]
    pub include_metadata: bool,
}

impl Default for ExportConfig {
    /// Returns the default export configuration.
    fn default() -> Self {
        Self {
            default_formats: Self::default_formats(),
            output_directory: Self::default_output_directory(),
            include_metadata: true,
        }
    }
}

impl ExportConfig {
    fn default_formats() -> Vec<ExportFormat> {
        vec![ExportFormat::Markdown, ExportFormat::Html, ExportFormat::Json]
    }

    fn default_output_directory() -> PathBuf {
        PathBuf::from("./duckycoder_output")
    }

    const fn default_include_metadata() -> bool {
        true
    }

    /// Validate export configuration
    pub fn validate(&self) -> Result<()> {
        if self.output_directory.as_os_str().is_empty() {
            return Err(DuckyError::config_field(
                "output_directory must not be empty",
                "export_config.output_directory",
            ));
        }
        Ok(())
    }
}

/// Security scanning configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecurityConfig {
    /// Run the security scan stage
    #[serde(default = "SecurityConfig::default_enable_scanning")]
    pub enable_scanning: bool,

    /// Named groups of compliance standards
    #[serde(default = "SecurityConfig::default_compliance_profiles")]
    pub compliance_profiles: IndexMap<String, Vec<String>>,

    /// Standards checked by the security scan
    #[serde(default = "SecurityConfig::default_compliance_standards")]
    pub compliance_standards: Vec<String>,

    /// How strictly findings are reported
    #[serde(default = "SecurityConfig::default_enforcement_level")]
    pub enforcement_level: String,

    /// Attach remediation text to security findings
    #[serde(default = "SecurityConfig::default_remediation")]
    pub remediation_suggestions: bool,
}

impl Default for SecurityConfig {
    /// Returns the default security configuration.
    fn default() -> Self {
        Self {
            enable_scanning: true,
            compliance_profiles: Self::default_compliance_profiles(),
            compliance_standards: Self::default_compliance_standards(),
            enforcement_level: Self::default_enforcement_level(),
            remediation_suggestions: true,
        }
    }
}

impl SecurityConfig {
    const fn default_enable_scanning() -> bool {
        true
    }

    const fn default_remediation() -> bool {
        true
    }

    fn default_enforcement_level() -> String {
        "strict".to_string()
    }

    fn default_compliance_standards() -> Vec<String> {
        vec!["GDPR".to_string(), "HIPAA".to_string(), "PCI".to_string()]
    }

    fn default_compliance_profiles() -> IndexMap<String, Vec<String>> {
        let mut profiles = IndexMap::new();
        profiles.insert(
            "healthcare".to_string(),
            vec!["HIPAA".to_string(), "GDPR".to_string()],
        );
        profiles.insert(
            "finance".to_string(),
            vec!["PCI-DSS".to_string(), "SOX".to_string()],
        );
        profiles.insert(
            "general".to_string(),
            vec![
                "ISO-27001".to_string(),
                "SOC2".to_string(),
                "NIST-800-53".to_string(),
            ],
        );
        profiles
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default level filter (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    /// Returns the default logging configuration.
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "warn".to_string()
    }
}

/// Performance optimization stage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceMonitoringConfig {
    /// Run the optimization stage
    #[serde(default = "PerformanceMonitoringConfig::default_enabled")]
    pub enabled: bool,

    /// Metric names reported alongside recommendations
    #[serde(default = "PerformanceMonitoringConfig::default_metrics")]
    pub metrics: Vec<String>,
}

impl Default for PerformanceMonitoringConfig {
    /// Returns the default performance monitoring configuration.
    fn default() -> Self {
        Self {
            enabled: true,
            metrics: Self::default_metrics(),
        }
    }
}

impl PerformanceMonitoringConfig {
    const fn default_enabled() -> bool {
        true
    }

    fn default_metrics() -> Vec<String> {
        vec!["cpu".to_string(), "memory".to_string(), "io".to_string()]
    }
}

/// Placeholder optimizer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MlOptimizationConfig {
    /// Report optimizer metadata
    #[serde(default)]
    pub enabled: bool,

    /// Reported model version label
    #[serde(default = "MlOptimizationConfig::default_model_version")]
    pub model_version: String,

    /// Confidence attached to optimizer suggestions
    #[serde(default = "MlOptimizationConfig::default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Strategy labels
    #[serde(default)]
    pub optimization_strategies: Vec<String>,
}

impl Default for MlOptimizationConfig {
    /// Returns the default optimizer configuration.
    fn default() -> Self {
        Self {
            enabled: false,
            model_version: Self::default_model_version(),
            confidence_threshold: Self::default_confidence_threshold(),
            optimization_strategies: vec![
                "performance_tuning".to_string(),
                "memory_optimization".to_string(),
                "code_refactoring".to_string(),
            ],
        }
    }
}

impl MlOptimizationConfig {
    fn default_model_version() -> String {
        "heuristic".to_string()
    }

    const fn default_confidence_threshold() -> f64 {
        0.9
    }

    /// Validate optimizer configuration
    pub fn validate(&self) -> Result<()> {
        validate_unit_range(
            self.confidence_threshold,
            "ml_optimization.confidence_threshold",
        )
    }
}

/// UI mockup stage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiMockupConfig {
    /// Render mockups for records with UI content
    #[serde(default = "UiMockupConfig::default_enabled")]
    pub enabled: bool,

    /// Frameworks recognised by the detector
    #[serde(default = "UiMockupConfig::default_frameworks")]
    pub frameworks: Vec<String>,

    /// Maximum characters per mockup line
    #[serde(default = "UiMockupConfig::default_width")]
    pub width: usize,
}

impl Default for UiMockupConfig {
    /// Returns the default mockup configuration.
    fn default() -> Self {
        Self {
            enabled: true,
            frameworks: Self::default_frameworks(),
            width: Self::default_width(),
        }
    }
}

impl UiMockupConfig {
    const fn default_enabled() -> bool {
        true
    }

    const fn default_width() -> usize {
        60
    }

    fn default_frameworks() -> Vec<String> {
        [
            "react", "vue", "angular", "svelte", "flutter", "tkinter", "pyqt", "kivy", "egui",
            "dioxus", "tui-rs",
        ]
        .iter()
        .map(|name| (*name).to_string())
        .collect()
    }
}

/// Enhancement filtering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnhancementConfig {
    /// Minimum confidence for an enhancement to be kept
    #[serde(default = "EnhancementConfig::default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Apply kept enhancements to produce enhanced text
    #[serde(default = "EnhancementConfig::default_apply")]
    pub apply_enhancements: bool,
}

impl Default for EnhancementConfig {
    /// Returns the default enhancement configuration.
    fn default() -> Self {
        Self {
            confidence_threshold: Self::default_confidence_threshold(),
            apply_enhancements: true,
        }
    }
}

impl EnhancementConfig {
    const fn default_confidence_threshold() -> f64 {
        0.7
    }

    const fn default_apply() -> bool {
        true
    }

    /// Validate enhancement configuration
    pub fn validate(&self) -> Result<()> {
        validate_unit_range(
            self.confidence_threshold,
            "enhancement.confidence_threshold",
        )
    }
}

/// Execution budgets for evaluators and modes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PipelineConfig {
    /// Per-call budget for each analyzer/enhancer, unbounded when unset
    #[serde(default)]
    pub evaluator_timeout_ms: Option<u64>,

    /// Per-mode budget in `dispatch_many`, unbounded when unset
    #[serde(default)]
    pub mode_timeout_ms: Option<u64>,
}

impl PipelineConfig {
    /// Validate execution budgets
    pub fn validate(&self) -> Result<()> {
        validate_optional_timeout(self.evaluator_timeout_ms, "pipeline.evaluator_timeout_ms")?;
        validate_optional_timeout(self.mode_timeout_ms, "pipeline.mode_timeout_ms")
    }
}

#[cfg(test)]
mod tests;
