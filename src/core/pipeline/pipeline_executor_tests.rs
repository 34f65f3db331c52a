    use super::*;
    use crate::core::pipeline::pipeline_results::ExportOutcome;
    use crate::core::record::{ContentCategory, ContentRecord, Finding};
    use crate::detectors::rules::{RuleEvaluator, SyntaxAnalyzer};
    use crate::ingest::{IngestFailure, IngestOutcome};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    struct StaticSource {
        records: Vec<ContentRecord>,
        failures: Vec<IngestFailure>,
    }

    #[async_trait]
    impl RecordSource for StaticSource {
        async fn ingest(&self, _inputs: &[String]) -> Result<IngestOutcome> {
            Ok(IngestOutcome {
                records: self.records.clone(),
                failures: self.failures.clone(),
            })
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl RecordSource for BrokenSource {
        async fn ingest(&self, _inputs: &[String]) -> Result<IngestOutcome> {
            Err(DuckyError::internal("source offline"))
        }
    }

    /// Records requested formats; fails the PDF writer.
    #[derive(Default)]
    struct RecordingExporter {
        seen: Mutex<Vec<ExportFormat>>,
    }

    impl ArtifactExporter for RecordingExporter {
        fn export(
            &self,
            _run: &PipelineRun,
            formats: &[ExportFormat],
            output_dir: &Path,
        ) -> Vec<ExportOutcome> {
            self.seen.lock().unwrap().extend_from_slice(formats);
            formats
                .iter()
                .map(|format| match format {
                    ExportFormat::Pdf => ExportOutcome::failed(*format, "disk full"),
                    _ => ExportOutcome::written(
                        *format,
                        output_dir.join(format!("report.{}", format.extension())),
                    ),
                })
                .collect()
        }
    }

    struct FailsOn(&'static str);

    #[async_trait]
    impl RuleEvaluator for FailsOn {
        fn name(&self) -> &str {
            "fails_on"
        }

        async fn evaluate(&self, record: &ContentRecord) -> Result<Vec<Finding>> {
            if record.identity == self.0 {
                Err(DuckyError::internal("analyzer crashed"))
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn python(identity: &str, text: &str) -> ContentRecord {
        ContentRecord::new(identity, ContentCategory::Code, text).with_language("python")
    }

    fn pipeline_over(records: Vec<ContentRecord>) -> (ContentPipeline, Arc<RecordingExporter>) {
        let exporter = Arc::new(RecordingExporter::default());
        let pipeline = ContentPipeline::new(DuckyConfig::default())
            .unwrap()
            .with_source(Arc::new(StaticSource {
                records,
                failures: Vec::new(),
            }))
            .with_exporter(exporter.clone());
        (pipeline, exporter)
    }

    fn json_only() -> RunOptions {
        RunOptions {
            formats: vec![ExportFormat::Json],
            ..RunOptions::default()
        }
    }

    #[tokio::test]
    async fn test_near_duplicates_collapse_into_one_record() {
        let (pipeline, _) = pipeline_over(vec![
            python("a.py", "def f(): return 1"),
            python("b.py", "def f(): return 1  # copy"),
        ]);

        let run = pipeline.run(&["a.py".into(), "b.py".into()], &json_only()).await;

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.records_ingested, 2);
        assert_eq!(run.canonical.len(), 1);
        assert_eq!(run.canonical[0].provenance, vec!["a.py", "b.py"]);
        assert_eq!(run.canonical[0].representative.text, "def f(): return 1  # copy");
        assert_eq!(run.analyses.len(), 1);
        assert_eq!(run.enhancements.len(), 1);
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let (pipeline, exporter) = pipeline_over(vec![python("a.py", "x = 1\n")]);

        let run = pipeline.run(&["a.py".into()], &json_only()).await;

        let names: Vec<&str> = run.stages.iter().map(|s| s.stage_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                stage::INGEST,
                stage::MERGE,
                stage::ANALYZE,
                stage::ENHANCE,
                stage::OPTIMIZE,
                stage::SECURITY,
                stage::VALIDATE,
                stage::EXPORT,
            ]
        );
        assert!(run.stages.iter().all(|s| s.success && s.error.is_none()));
        assert_eq!(*exporter.seen.lock().unwrap(), vec![ExportFormat::Json]);
        assert!(run.finished_at >= run.started_at);
    }

    #[tokio::test]
    async fn test_failing_evaluator_still_completes() {
        let (pipeline, _) = pipeline_over(vec![
            python("a.py", "x = 1\n"),
            python("b.py", "import os\nos.getcwd()\n"),
            python("c.py", "class Widget:\n    pass\n"),
        ]);
        let registry = RuleRegistry::new()
            .with_analyzer(Arc::new(SyntaxAnalyzer::new().unwrap()))
            .with_analyzer(Arc::new(FailsOn("b.py")));
        let pipeline = pipeline.with_registry(registry);

        let run = pipeline.run(&[], &json_only()).await;

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.analyses.len(), 3);
        assert_eq!(run.analyses.iter().filter(|a| a.is_complete()).count(), 2);
        assert!(run
            .validation
            .issues
            .contains(&"Analysis incomplete for b.py".to_string()));
    }

    #[tokio::test]
    async fn test_ingest_failures_become_validation_issues() {
        let pipeline = ContentPipeline::new(DuckyConfig::default())
            .unwrap()
            .with_source(Arc::new(StaticSource {
                records: vec![python("a.py", "x = 1\n")],
                failures: vec![IngestFailure {
                    input: "gone.py".to_string(),
                    message: "No such file".to_string(),
                }],
            }))
            .with_exporter(Arc::new(RecordingExporter::default()));

        let run = pipeline.run(&["a.py".into(), "gone.py".into()], &json_only()).await;

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.validation.issues, vec!["Data processing error for gone.py"]);
        assert_eq!(run.summary().ingest_failures, 1);
    }

    #[tokio::test]
    async fn test_skip_export_marks_run_partial() {
        let (pipeline, exporter) = pipeline_over(vec![python("a.py", "x = 1\n")]);
        let options = RunOptions {
            skip_export: true,
            ..RunOptions::default()
        };

        let run = pipeline.run(&[], &options).await;

        assert_eq!(run.status, RunStatus::Partial);
        assert!(run.stage(stage::EXPORT).is_none());
        assert!(run.exports.is_empty());
        assert!(exporter.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_export_format_is_reported_per_format() {
        let (pipeline, _) = pipeline_over(vec![python("a.py", "x = 1\n")]);
        let options = RunOptions {
            formats: vec![ExportFormat::Json, ExportFormat::Pdf, ExportFormat::Sarif],
            ..RunOptions::default()
        };

        let run = pipeline.run(&[], &options).await;

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.exports.len(), 3);
        assert_eq!(run.exports.iter().filter(|e| e.success()).count(), 2);
        let export = run.stage(stage::EXPORT).unwrap();
        assert!(!export.success);
        assert!(export.error.as_deref().unwrap().contains("pdf: disk full"));
    }

    #[tokio::test]
    async fn test_structural_error_fails_the_run() {
        let pipeline = ContentPipeline::new(DuckyConfig::default())
            .unwrap()
            .with_source(Arc::new(BrokenSource));

        let run = pipeline.run(&["x".into()], &json_only()).await;

        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.error.as_deref().unwrap().contains("source offline"));
        assert_eq!(run.stages.len(), 1);
        assert!(!run.stages[0].success);
    }

    #[tokio::test]
    async fn test_progress_callback_sees_every_stage() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let (pipeline, _) = pipeline_over(vec![python("a.py", "x = 1\n")]);
        let pipeline = pipeline.with_progress_callback(Box::new(move |stage, fraction| {
            sink.lock().unwrap().push((stage.to_string(), fraction));
        }));

        pipeline.run(&[], &json_only()).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first().unwrap().0, stage::INGEST);
        assert_eq!(seen.last().unwrap(), &(stage::EXPORT.to_string(), 1.0));
    }

    #[tokio::test]
    async fn test_ui_analysis_forces_render_stage() {
        let (pipeline, _) = pipeline_over(vec![ContentRecord::new(
            "form.html",
            ContentCategory::Markup,
            "<form>\n<button>Send</button>\n</form>\n",
        )
        .with_language("html")]);
        let options = RunOptions {
            ui_analysis: true,
            ..json_only()
        };

        let run = pipeline.run(&[], &options).await;

        assert_eq!(run.mockups.len(), 1);
        assert!(run.mockups[0].ascii.contains("[ Send ]"));
        assert!(run.stage(stage::RENDER_UI).is_some());
    }
