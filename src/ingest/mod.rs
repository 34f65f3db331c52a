//! Input ingestion: turns raw inputs into [`ContentRecord`]s.
//!
//! An input is a file path, a directory path or raw content. URLs are
//! rejected. Each failing input becomes an [`IngestFailure`] and never
//! stops the others.

pub mod decoders;
pub mod languages;

use std::path::{Path, PathBuf};

use futures::future::join_all;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::config::{DuckyConfig, InputConfig};
use crate::core::errors::{DuckyError, Result};
use crate::core::record::{ContentCategory, ContentRecord, STRING_IDENTITY};

pub use languages::{classify_extension, detect_ui_framework, LanguageDetector, LanguageInfo};

/// How a raw input string is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Existing file
    File(PathBuf),
    /// Existing directory
    Directory(PathBuf),
    /// Inline content
    Raw(String),
    /// `http(s)://` address
    Url(String),
    /// Looks like a path but does not exist
    Missing(PathBuf),
}

impl InputSource {
    /// Classify an input string.
    pub fn classify(input: &str) -> Self {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Self::Url(trimmed.to_string());
        }

        if !input.contains('\n') {
            let path = Path::new(trimmed);
            if path.is_file() {
                return Self::File(path.to_path_buf());
            }
            if path.is_dir() {
                return Self::Directory(path.to_path_buf());
            }
            if looks_like_path(trimmed) {
                return Self::Missing(path.to_path_buf());
            }
        }

        Self::Raw(input.to_string())
    }
}

fn looks_like_path(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.chars().any(char::is_whitespace) {
        return false;
    }
    candidate.contains('/')
        || candidate.contains('\\')
        || Path::new(candidate)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| classify_extension(ext).is_some())
}

/// One input that could not be ingested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestFailure {
    /// Input as supplied
    pub input: String,
    /// Error description
    pub message: String,
}

/// Records and failures from one ingestion pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// Ingested records, in input order (directory entries sorted by name)
    pub records: Vec<ContentRecord>,
    /// Inputs that failed
    pub failures: Vec<IngestFailure>,
}

/// Reads and decodes inputs according to [`InputConfig`].
#[derive(Debug, Clone)]
pub struct Ingestor {
    config: InputConfig,
    ui_frameworks: Vec<String>,
    detector: LanguageDetector,
    ignore: GlobSet,
    max_bytes: u64,
}

impl Ingestor {
    /// Build an ingestor from configuration.
    pub fn new(config: &DuckyConfig) -> Result<Self> {
        let input = config.input_config.clone();
        let mut builder = GlobSetBuilder::new();
        for pattern in &input.ignore_patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                DuckyError::config_field(
                    format!("Invalid ignore pattern '{pattern}': {e}"),
                    "input_config.ignore_patterns",
                )
            })?;
            builder.add(glob);
        }
        let ignore = builder
            .build()
            .map_err(|e| DuckyError::config(format!("Failed to build ignore set: {e}")))?;

        Ok(Self {
            max_bytes: input.max_file_size_bytes()?,
            config: input,
            ui_frameworks: config.ui_mockup.frameworks.clone(),
            detector: LanguageDetector::new()?,
            ignore,
        })
    }

    /// Ingest every input, isolating failures per input.
    pub async fn ingest(&self, inputs: &[String]) -> IngestOutcome {
        let results = join_all(inputs.iter().map(|input| self.ingest_one(input))).await;

        let mut outcome = IngestOutcome::default();
        for (input, result) in inputs.iter().zip(results) {
            match result {
                Ok((records, failures)) => {
                    outcome.records.extend(records);
                    outcome.failures.extend(failures);
                }
                Err(e) => {
                    warn!("Skipping input {}: {}", display_input(input), e);
                    outcome.failures.push(IngestFailure {
                        input: display_input(input),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Ingested {} records ({} failures)",
            outcome.records.len(),
            outcome.failures.len()
        );
        outcome
    }

    /// Ingest one input. Directory inputs report per-file failures alongside
    /// their records.
    pub async fn ingest_one(&self, input: &str) -> Result<(Vec<ContentRecord>, Vec<IngestFailure>)> {
        match InputSource::classify(input) {
            InputSource::Url(url) => Err(DuckyError::ingestion(
                url,
                "network inputs are not supported; download the content first",
            )),
            InputSource::Missing(path) => Err(DuckyError::ingestion(
                path.display().to_string(),
                "file not found",
            )),
            InputSource::Raw(text) => Ok((vec![self.from_raw(text)?], Vec::new())),
            InputSource::File(path) => {
                let extension = extension_of(&path);
                if !self.config.supports_extension(&extension) {
                    return Err(DuckyError::ingestion(
                        path.display().to_string(),
                        format!("unsupported file type '.{extension}'"),
                    ));
                }
                Ok((vec![self.read_file(&path).await?], Vec::new()))
            }
            InputSource::Directory(dir) => Ok(self.read_directory(&dir).await),
        }
    }

    async fn read_directory(&self, dir: &Path) -> (Vec<ContentRecord>, Vec<IngestFailure>) {
        let max_depth = if self.config.recursive_directory_scan {
            usize::MAX
        } else {
            1
        };

        let files: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Failed to read directory entry under {}: {}", dir.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                if self.ignore.is_match(path) {
                    debug!("Ignoring {}", path.display());
                    return false;
                }
                self.config.supports_extension(&extension_of(path))
            })
            .collect();

        debug!("Found {} candidate files under {}", files.len(), dir.display());

        let results = join_all(files.iter().map(|path| self.read_file(path))).await;
        let mut records = Vec::with_capacity(files.len());
        let mut failures = Vec::new();
        for (path, result) in files.iter().zip(results) {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    failures.push(IngestFailure {
                        input: path.display().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        (records, failures)
    }

    async fn read_file(&self, path: &Path) -> Result<ContentRecord> {
        let identity = path.display().to_string();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| DuckyError::ingestion(&identity, format!("cannot stat file: {e}")))?;
        if metadata.len() > self.max_bytes {
            return Err(DuckyError::ingestion(
                &identity,
                format!(
                    "file is {} bytes, larger than the {} limit",
                    metadata.len(),
                    self.config.max_file_size
                ),
            ));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DuckyError::ingestion(&identity, format!("cannot read file: {e}")))?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) if self.config.auto_convert_encoding => {
                debug!("{} is not valid UTF-8, decoding lossily", identity);
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
            Err(_) => {
                return Err(DuckyError::ingestion(&identity, "file is not valid UTF-8"));
            }
        };

        let extension = extension_of(path);
        let language = classify_extension(&extension);
        self.build_record(identity, text, language, &extension)
    }

    fn from_raw(&self, text: String) -> Result<ContentRecord> {
        let language = self.detector.detect(&text);
        self.build_record(STRING_IDENTITY.to_string(), text, Some(language), "")
    }

    fn build_record(
        &self,
        identity: String,
        text: String,
        language: Option<LanguageInfo>,
        extension: &str,
    ) -> Result<ContentRecord> {
        let Some(language) = language else {
            return Ok(ContentRecord::new(identity, ContentCategory::Document, text));
        };

        let wrap = |e: DuckyError| DuckyError::ingestion(identity.clone(), e.to_string());
        let (text, structured) = match (language.language, extension) {
            (_, "ipynb") => (decoders::flatten_notebook(&text).map_err(wrap)?, None),
            ("json", _) => {
                let value = decoders::decode_json(&text).map_err(wrap)?;
                (text, Some(value))
            }
            ("yaml", _) => {
                let value = decoders::decode_yaml(&text).map_err(wrap)?;
                (text, Some(value))
            }
            ("xml", _) => {
                let value = decoders::decode_xml(&text).map_err(wrap)?;
                (text, Some(value))
            }
            _ => (text, None),
        };

        let dependencies = self.detector.dependencies(language.language, &text);
        let ui_framework = detect_ui_framework(&text, &self.ui_frameworks);

        let mut record = ContentRecord::new(identity, language.category, text)
            .with_language(language.language)
            .with_dependencies(dependencies);
        if let Some(structured) = structured {
            record = record.with_structured(structured);
        }
        if let Some(framework) = ui_framework {
            record = record.with_ui_framework(framework);
        }
        Ok(record)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn display_input(input: &str) -> String {
    if input.contains('\n') {
        STRING_IDENTITY.to_string()
    } else {
        input.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ingestor() -> Ingestor {
        Ingestor::new(&DuckyConfig::default()).unwrap()
    }

    #[test]
    fn classify_inputs() {
        assert!(matches!(
            InputSource::classify("https://example.com/a.py"),
            InputSource::Url(_)
        ));
        assert!(matches!(
            InputSource::classify("def f():\n    pass"),
            InputSource::Raw(_)
        ));
        assert!(matches!(
            InputSource::classify("does/not/exist.py"),
            InputSource::Missing(_)
        ));
        assert!(matches!(InputSource::classify("print('hi')"), InputSource::Raw(_)));
    }

    #[tokio::test]
    async fn urls_are_rejected_with_ingestion_error() {
        let err = ingestor().ingest_one("http://example.com/x.py").await.unwrap_err();
        assert!(matches!(err, DuckyError::Ingestion { .. }));
    }

    #[tokio::test]
    async fn raw_content_uses_string_identity() {
        let (records, _) = ingestor().ingest_one("import os\nprint(os.name)\n").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity, STRING_IDENTITY);
        assert_eq!(records[0].language.as_deref(), Some("python"));
        assert!(records[0].dependencies.contains("os"));
    }

    #[tokio::test]
    async fn directory_walk_skips_ignored_and_unsupported() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.py"), "def b():\n    return 2\n").unwrap();
        std::fs::write(dir.path().join("a.json"), "{\"k\": [1, 2]}").unwrap();
        std::fs::write(dir.path().join("blob.exe"), [0u8, 1, 2]).unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        std::fs::write(dir.path().join("node_modules/pkg/index.js"), "var x = 1;").unwrap();

        let outcome = ingestor()
            .ingest(&[dir.path().display().to_string()])
            .await;

        assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);
        let names: Vec<String> = outcome
            .records
            .iter()
            .map(|r| Path::new(&r.identity).file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.py"]);
        assert_eq!(outcome.records[0].category, ContentCategory::Data);
        assert_eq!(outcome.records[0].structured.as_ref().unwrap()["k"][1], 2);
    }

    #[tokio::test]
    async fn failures_are_isolated_per_input() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.py");
        let bad = dir.path().join("bad.json");
        std::fs::write(&good, "x = 1\n").unwrap();
        std::fs::write(&bad, "{not json").unwrap();

        let outcome = ingestor()
            .ingest(&[
                good.display().to_string(),
                bad.display().to_string(),
                "missing/file.py".to_string(),
            ])
            .await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[1].input, "missing/file.py");
    }

    #[tokio::test]
    async fn oversized_files_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, "x".repeat(2048)).unwrap();

        let mut config = DuckyConfig::default();
        config.input_config.max_file_size = "1KB".to_string();
        let ingestor = Ingestor::new(&config).unwrap();
        let err = ingestor.ingest_one(&path.display().to_string()).await.unwrap_err();
        assert!(err.to_string().contains("larger than"));
    }

    #[tokio::test]
    async fn invalid_utf8_is_decoded_lossily() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        std::fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();

        let (records, _) = ingestor().ingest_one(&path.display().to_string()).await.unwrap();
        assert!(records[0].text.starts_with("caf"));
        assert!(records[0].text.contains('\u{FFFD}'));
    }
}
