//! End-to-end pipeline runs over real files on disk.

use std::fs;
use std::sync::Arc;

use anyhow::Result;
use tempfile::tempdir;

use duckycoder::core::config::{DuckyConfig, ExportFormat};
use duckycoder::core::pipeline::{stage, ContentPipeline, RunOptions, RunStatus};
use duckycoder::ingest::Ingestor;
use duckycoder::modes::{ModeContext, ModeDispatcher};

fn create_sample_project() -> Result<tempfile::TempDir> {
    let project = tempdir()?;
    let root = project.path();

    fs::write(root.join("a.py"), "def f(): return 1")?;
    fs::write(root.join("b.py"), "def f(): return 1  # copy")?;
    fs::write(
        root.join("c.js"),
        "function add(left, right) {\n  return left + right;\n}\n\nmodule.exports = { add };\n",
    )?;
    fs::write(
        root.join("danger.py"),
        "import os   \n\ndef run(cmd):\n    result = eval(cmd)\n    return result\n",
    )?;

    Ok(project)
}

#[tokio::test]
async fn test_directory_run_collapses_duplicates_and_exports() -> Result<()> {
    let project = create_sample_project()?;
    let out = tempdir()?;

    let pipeline = ContentPipeline::new(DuckyConfig::default())?;
    let options = RunOptions {
        formats: vec![ExportFormat::Json, ExportFormat::Sarif, ExportFormat::Archive],
        output_dir: Some(out.path().to_path_buf()),
        ..RunOptions::default()
    };

    let run = pipeline
        .run(&[project.path().display().to_string()], &options)
        .await;

    assert_eq!(run.status, RunStatus::Completed, "{:?}", run.error);
    assert_eq!(run.records_ingested, 4);
    assert_eq!(run.canonical.len(), 3);
    let merged = run
        .canonical
        .iter()
        .find(|record| record.provenance.len() == 2)
        .expect("a.py and b.py collapse");
    assert!(merged.provenance[0].ends_with("a.py"));
    assert!(merged.provenance[1].ends_with("b.py"));

    assert_eq!(run.analyses.len(), run.canonical.len());
    assert!(run.stage(stage::SECURITY).is_some());
    assert!(run.security.as_ref().unwrap().vulnerabilities.len() >= 1);
    assert!(!run
        .validation
        .issues
        .iter()
        .any(|issue| issue.starts_with("Missing output section")));

    assert_eq!(run.exports.len(), 3);
    assert!(run.exports.iter().all(|export| export.success()));
    let sarif_path = run
        .exports
        .iter()
        .find(|export| export.format == ExportFormat::Sarif)
        .and_then(|export| export.path.clone())
        .unwrap();
    let sarif: serde_json::Value = serde_json::from_str(&fs::read_to_string(sarif_path)?)?;
    assert_eq!(sarif["version"], "2.1.0");
    assert!(!sarif["runs"][0]["results"].as_array().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_missing_input_is_recorded_not_fatal() -> Result<()> {
    let project = create_sample_project()?;
    let missing = project.path().join("gone.py").display().to_string();
    let present = project.path().join("c.js").display().to_string();

    let pipeline = ContentPipeline::new(DuckyConfig::default())?;
    let options = RunOptions {
        skip_export: true,
        ..RunOptions::default()
    };
    let run = pipeline.run(&[present, missing.clone()], &options).await;

    assert_eq!(run.status, RunStatus::Partial);
    assert_eq!(run.records_ingested, 1);
    assert_eq!(
        run.validation.issues,
        vec![format!("Data processing error for {missing}")]
    );
    Ok(())
}

#[tokio::test]
async fn test_whitespace_enhancement_reaches_the_record() -> Result<()> {
    let project = create_sample_project()?;
    let pipeline = ContentPipeline::new(DuckyConfig::default())?;
    let options = RunOptions {
        skip_export: true,
        ..RunOptions::default()
    };

    let run = pipeline
        .run(&[project.path().join("danger.py").display().to_string()], &options)
        .await;

    let enhancement = &run.enhancements[0];
    let text = enhancement.enhanced_text.as_deref().expect("enhanced text");
    assert!(text.starts_with("import os\n\ndef run(cmd):\n"));
    assert!(enhancement.applied >= 1);
    Ok(())
}

#[tokio::test]
async fn test_modes_dispatch_over_ingested_files() -> Result<()> {
    let project = create_sample_project()?;
    let config = Arc::new(DuckyConfig::default());
    let ingestor = Ingestor::new(&config)?;
    let outcome = ingestor
        .ingest(&[project.path().display().to_string()])
        .await;
    assert!(outcome.failures.is_empty());

    let dispatcher = ModeDispatcher::new(&config);
    let ctx = Arc::new(ModeContext::new(outcome.records, Arc::clone(&config)));
    let names: Vec<String> = ["security_scanning", "analyze_only", "quantum_computing"]
        .iter()
        .map(|name| name.to_string())
        .collect();

    let results = dispatcher.dispatch_many(&names, ctx).await;

    assert!(results[0].success);
    let security = results[0].data.as_ref().unwrap();
    assert!(security["summary"]["total_vulnerabilities"].as_u64().unwrap() >= 1);
    assert_eq!(results[1].data.as_ref().unwrap()["summary"]["total_files"], 4);
    assert!(!results[2].success);
    assert_eq!(results[2].error.as_deref(), Some("disabled"));
    Ok(())
}
