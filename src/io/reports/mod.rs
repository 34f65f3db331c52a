//! Report composition and the per-format artifact writers.

pub mod archive;
pub mod document;
mod error;
mod generator;
mod helpers;
pub mod pdf;
pub mod sarif;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::core::config::ExportFormat;
use crate::core::pipeline::{ArtifactExporter, ExportOutcome, PipelineRun};

pub use document::{OverallStatus, ReportDocument};
pub use error::ReportError;
pub use generator::ReportGenerator;

/// Artifact file name for `format` at `timestamp`.
pub fn report_file_name(format: ExportFormat, timestamp: DateTime<Utc>) -> String {
    format!(
        "duckycoder_report_{}.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Writes every export format from one composed [`ReportDocument`].
#[derive(Debug, Default)]
pub struct ReportExporter {
    generator: ReportGenerator,
}

impl ReportExporter {
    pub fn new(generator: ReportGenerator) -> Self {
        Self { generator }
    }

    /// Default exporter behind the pipeline's service seam.
    pub fn shared() -> Arc<dyn ArtifactExporter> {
        Arc::new(Self::default())
    }

    /// Write one format of `document` to `path`.
    pub fn write_format(
        &self,
        format: ExportFormat,
        document: &ReportDocument,
        run: &PipelineRun,
        path: &Path,
    ) -> Result<(), ReportError> {
        match format {
            ExportFormat::Markdown => fs::write(path, self.generator.render_markdown(document)?)?,
            ExportFormat::Html => fs::write(path, self.generator.render_html(document)?)?,
            ExportFormat::Json => fs::write(path, self.generator.render_json(document)?)?,
            ExportFormat::Yaml => fs::write(path, self.generator.render_yaml(document)?)?,
            ExportFormat::Pdf => fs::write(path, pdf::render_pdf(&document.plain_lines())?)?,
            ExportFormat::Sarif => {
                let log = sarif::build_sarif(run);
                fs::write(path, serde_json::to_string_pretty(&log)?)?;
            }
            ExportFormat::Archive => {
                let report_json = self.generator.render_json(document)?;
                let entries = archive::write_archive(path, &report_json, run)?;
                debug!("Archive {} holds {} entries", path.display(), entries);
            }
        }
        Ok(())
    }
}

impl ArtifactExporter for ReportExporter {
    fn export(
        &self,
        run: &PipelineRun,
        formats: &[ExportFormat],
        output_dir: &Path,
    ) -> Vec<ExportOutcome> {
        if let Err(e) = fs::create_dir_all(output_dir) {
            warn!("Cannot create output directory {}: {}", output_dir.display(), e);
            return formats
                .iter()
                .map(|format| ExportOutcome::failed(*format, e.to_string()))
                .collect();
        }

        let document = ReportDocument::compose(run);
        let timestamp = Utc::now();

        formats
            .iter()
            .map(|format| {
                let path: PathBuf = output_dir.join(report_file_name(*format, timestamp));
                match self.write_format(*format, &document, run, &path) {
                    Ok(()) => {
                        info!("Exported {} report to {}", format, path.display());
                        ExportOutcome::written(*format, path)
                    }
                    Err(e) => {
                        warn!("Export to {} failed: {}", format, e);
                        ExportOutcome::failed(*format, e.to_string())
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn file_names_carry_timestamp_and_extension() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            report_file_name(ExportFormat::Markdown, at),
            "duckycoder_report_20240309_140507.md"
        );
        assert_eq!(
            report_file_name(ExportFormat::Archive, at),
            "duckycoder_report_20240309_140507.zip"
        );
    }

    #[test]
    fn exports_every_format() {
        let dir = tempdir().unwrap();
        let run = PipelineRun::start(&["a.py".to_string()]);

        let outcomes = ReportExporter::default().export(&run, &ExportFormat::ALL, dir.path());

        assert_eq!(outcomes.len(), ExportFormat::ALL.len());
        for outcome in &outcomes {
            assert!(outcome.success(), "{:?}", outcome);
            let path = outcome.path.as_ref().unwrap();
            assert!(path.exists());
            assert_eq!(
                path.extension().and_then(|e| e.to_str()),
                Some(outcome.format.extension())
            );
        }
    }

    #[test]
    fn unwritable_directory_fails_each_format() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let outcomes = ReportExporter::default().export(
            &PipelineRun::start(&[]),
            &[ExportFormat::Json, ExportFormat::Html],
            &blocker.join("nested"),
        );

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| !o.success() && o.error.is_some()));
    }
}
