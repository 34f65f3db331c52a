//! Pipeline orchestration.
//!
//! A run moves strictly forward through fixed stages:
//!
//! 1. **Ingest**: inputs become [`ContentRecord`](crate::core::record::ContentRecord)s
//! 2. **Merge**: near-duplicates collapse into canonical records, and the
//!    dependency graph is built
//! 3. **Analyze** / **Enhance**: evaluators run per record, concurrently,
//!    with failures isolated to the record
//! 4. **Render UI**, **Optimize**, **Security**: optional, config driven
//! 5. **Validate**: completeness and quality issues are recorded
//! 6. **Export**: one artifact per requested format
//!
//! ## Usage
//!
//! ```ignore
//! use duckycoder::core::config::DuckyConfig;
//! use duckycoder::core::pipeline::{ContentPipeline, RunOptions};
//!
//! let pipeline = ContentPipeline::new(DuckyConfig::default())?;
//! let run = pipeline.run(&["src/".to_string()], &RunOptions::default()).await;
//! println!("{} with {} issues", run.status, run.validation.issues.len());
//! ```

pub use pipeline_executor::{ContentPipeline, ProgressCallback, RunOptions};
pub use pipeline_results::{
    stage, ExportOutcome, PipelineRun, RecordAnalysis, RecordEnhancement, RunStatus, RunSummary,
    SecuritySummary, StageResult, ValidationReport, Vulnerability,
};
pub use pipeline_stages::{summarize_security, validate_run, PipelineStages};
pub use services::{default_source, ArtifactExporter, RecordSource};

mod pipeline_executor;
mod pipeline_results;
mod pipeline_stages;
mod services;
