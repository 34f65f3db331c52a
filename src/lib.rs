//! # DuckyCoder: multi-stage content pipeline
//!
//! DuckyCoder ingests heterogeneous inputs (source files, markup, data
//! files, raw snippets), collapses near-duplicate content into canonical
//! records, runs pluggable analyzers and enhancers over each record, and
//! exports a composed report in several formats. A mode dispatcher exposes
//! specialised entry points (analysis only, dry runs, security scans and
//! more) over the same ingested records.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    CLI  /  ContentPipeline                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Ingest      │  Detectors      │  Render      │  I/O         │
//! │              │                 │              │              │
//! │ • Decoders   │ • Similarity    │ • Mockups    │ • Reports    │
//! │ • Languages  │ • Dedupe        │ • Optimize   │ • SARIF      │
//! │              │ • Rules         │              │ • PDF / zip  │
//! │              │ • Enhance       │              │              │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Core: records, config, errors, pipeline   │  Modes          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use duckycoder::{ContentPipeline, DuckyConfig, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = ContentPipeline::new(DuckyConfig::default())?;
//!     let run = pipeline.run(&["./src".to_string()], &RunOptions::default()).await;
//!
//!     println!("{}: {} findings", run.status, run.summary().total_findings);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "mimalloc")]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

// Records, configuration, errors and orchestration
pub mod core {
    //! Core data model, configuration and pipeline orchestration.

    pub mod config;
    pub mod errors;
    pub mod pipeline;
    pub mod record;
}

// Content comparison and rule evaluation
pub mod detectors {
    //! Similarity scoring, deduplication and the evaluator registry.

    pub mod dedupe;
    pub mod enhance;
    pub mod graph;
    pub mod rules;
    pub mod similarity;
}

pub mod ingest;

pub mod modes;

// Derived views over records
pub mod render {
    //! UI mockups and performance heuristics.

    pub mod mockup;
    pub mod optimize;
}

// Report output
pub mod io {
    //! Report composition and export writers.

    #[allow(missing_docs)]
    pub mod reports;
}

// Re-export primary types for convenience
pub use core::config::{DuckyConfig, ExportFormat};
pub use core::errors::{DuckyError, Result, ResultExt};
pub use core::pipeline::{ContentPipeline, PipelineRun, RunOptions, RunStatus};
pub use core::record::{CanonicalRecord, ContentCategory, ContentRecord, Finding, Severity};
pub use modes::{ModeContext, ModeDispatcher, ModeResult};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
