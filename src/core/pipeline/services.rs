use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::config::{DuckyConfig, ExportFormat};
use crate::core::errors::Result;
use crate::ingest::{IngestOutcome, Ingestor};

use super::pipeline_results::{ExportOutcome, PipelineRun};

/// Service responsible for turning raw inputs into content records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Ingest every input; per-input failures belong in the outcome.
    async fn ingest(&self, inputs: &[String]) -> Result<IngestOutcome>;
}

#[async_trait]
impl RecordSource for Ingestor {
    async fn ingest(&self, inputs: &[String]) -> Result<IngestOutcome> {
        Ok(Ingestor::ingest(self, inputs).await)
    }
}

/// Build the default file-system backed record source.
pub fn default_source(config: &DuckyConfig) -> Result<Arc<dyn RecordSource>> {
    Ok(Arc::new(Ingestor::new(config)?))
}

/// Service responsible for writing the artifacts of a finished run.
pub trait ArtifactExporter: Send + Sync {
    /// Write one artifact per format. A failing format never stops the others.
    fn export(
        &self,
        run: &PipelineRun,
        formats: &[ExportFormat],
        output_dir: &Path,
    ) -> Vec<ExportOutcome>;
}
