//! Built-in mode handlers. All of them are text heuristics over the
//! context's records; none of them writes files.

use serde_json::{json, Map, Value};

use crate::core::errors::Result;
use crate::core::record::ContentRecord;
use crate::detectors::rules::security::ComplianceChecker;
use crate::detectors::rules::ComplexityMetrics;
use crate::render::mockup::MockupRenderer;
use crate::render::optimize::PerformanceAnalyzer;

use super::ModeContext;

/// Synchronous handler signature used by the built-in modes.
pub type HandlerFn = fn(&ModeContext) -> Result<Value>;

/// Built-in mode names in registration order.
pub const MODE_NAMES: [&str; 13] = [
    "merge_only",
    "analyze_only",
    "full_pipeline",
    "dry_run",
    "realtime_collaboration",
    "continuous_integration",
    "security_scanning",
    "ui_design",
    "debug_assistant",
    "api_validation",
    "doc_generator",
    "performance_profiling",
    "quantum_computing",
];

/// Every built-in handler keyed by mode name.
pub fn builtin_handlers() -> Vec<(&'static str, HandlerFn)> {
    let handlers: [HandlerFn; 13] = [
        merge_only,
        analyze_only,
        full_pipeline,
        dry_run,
        realtime_collaboration,
        continuous_integration,
        security_scanning,
        ui_design,
        debug_assistant,
        api_validation,
        doc_generator,
        performance_profiling,
        quantum_computing,
    ];
    MODE_NAMES.into_iter().zip(handlers).collect()
}

const LONG_LINE: usize = 120;
const COMPLEXITY_INDICATORS: &[&str] = &[
    "if ", "else", "elif", "for ", "while ", "try:", "except", "function", "def ", "class ",
    "switch", "case",
];
const RISK_FACTORS: &[&str] = &[
    "eval(", "exec(", "system(", "shell_exec", "password", "secret", "api_key", "token",
];
const ACCESSIBILITY_FEATURES: &[&str] = &[
    "aria-label",
    "alt=",
    "role=",
    "tabindex",
    "aria-describedby",
    "aria-hidden",
];
const SUPPORTED_UI_FRAMEWORKS: &[&str] = &[
    "react", "vue", "angular", "svelte", "flutter", "tkinter", "pyqt", "kivy", "egui", "dioxus",
    "tui-rs",
];

fn per_record<F>(ctx: &ModeContext, mut describe: F) -> Result<Map<String, Value>>
where
    F: FnMut(&ContentRecord) -> Result<Option<Value>>,
{
    let mut entries = Map::new();
    for record in &ctx.records {
        if let Some(entry) = describe(record)? {
            entries.insert(record.identity.clone(), entry);
        }
    }
    Ok(entries)
}

fn array_len(value: &Value, key: &str) -> usize {
    value[key].as_array().map_or(0, Vec::len)
}

fn merge_only(ctx: &ModeContext) -> Result<Value> {
    let merged_content = ctx
        .records
        .iter()
        .map(|record| format!("# Source: {}\n{}\n", record.identity, record.text))
        .collect::<Vec<_>>()
        .join("\n");
    let source_metadata = per_record(ctx, |record| {
        Ok(Some(json!({
            "language": record.language,
            "category": record.category,
            "size_bytes": record.size_bytes,
            "fingerprint": record.fingerprint,
        })))
    })?;

    Ok(json!({
        "merge_stats": {
            "sources_merged": ctx.records.len(),
            "total_size": merged_content.len(),
        },
        "merged_content": merged_content,
        "source_metadata": source_metadata,
    }))
}

fn complexity_ratio(text: &str) -> f64 {
    let lines: Vec<&str> = text.split('\n').collect();
    let hits: usize = lines
        .iter()
        .map(|line| {
            let lower = line.to_lowercase();
            COMPLEXITY_INDICATORS
                .iter()
                .filter(|indicator| lower.contains(*indicator))
                .count()
        })
        .sum();
    hits as f64 / lines.len().max(1) as f64
}

fn basic_issues(text: &str) -> Vec<String> {
    let mut issues = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let number = index + 1;
        let width = line.chars().count();
        if width > LONG_LINE {
            issues.push(format!("Line {number}: Line too long ({width} characters)"));
        }
        if line.contains("TODO") || line.contains("FIXME") {
            issues.push(format!("Line {number}: TODO/FIXME comment found"));
        }
        if line.trim().ends_with(";;") {
            issues.push(format!("Line {number}: Double semicolon"));
        }
    }
    issues
}

fn analyze_only(ctx: &ModeContext) -> Result<Value> {
    let results = per_record(ctx, |record| {
        let metrics = ComplexityMetrics::measure(&record.text);
        Ok(Some(json!({
            "line_count": record.text.split('\n').count(),
            "character_count": record.text.chars().count(),
            "word_count": record.text.split_whitespace().count(),
            "language": record.language,
            "framework": record.ui_framework,
            "ui_detected": record.ui_framework.is_some(),
            "complexity_score": complexity_ratio(&record.text),
            "cyclomatic_complexity": metrics.cyclomatic,
            "issues_detected": basic_issues(&record.text),
        })))
    })?;

    let total_files = results.len();
    let avg_complexity = if total_files == 0 {
        0.0
    } else {
        results
            .values()
            .filter_map(|entry| entry["complexity_score"].as_f64())
            .sum::<f64>()
            / total_files as f64
    };

    Ok(json!({
        "summary": {
            "total_files": total_files,
            "avg_complexity": avg_complexity,
            "ui_files": results.values().filter(|entry| entry["ui_detected"] == true).count(),
            "total_issues": results.values().map(|entry| array_len(entry, "issues_detected")).sum::<usize>(),
        },
        "analysis_results": results,
    }))
}

fn full_pipeline(ctx: &ModeContext) -> Result<Value> {
    Ok(json!({
        "pipeline_mode": "full",
        "status": "delegated",
        "records": ctx.records.len(),
        "message": "Full pipeline execution is handled by the pipeline orchestrator",
    }))
}

fn ui_improvements(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    if ["button", "input", "form"].iter().any(|ui| lower.contains(ui)) {
        vec![
            "Add accessibility attributes",
            "Implement responsive design",
            "Add error handling for user inputs",
        ]
    } else {
        Vec::new()
    }
}

fn dry_run(ctx: &ModeContext) -> Result<Value> {
    let results = per_record(ctx, |record| {
        let text = &record.text;
        let mut formatting = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line != line.trim_end() {
                formatting.push(format!("Line {}: Remove trailing whitespace", index + 1));
            }
            if line.contains('\t') {
                formatting.push(format!("Line {}: Convert tabs to spaces", index + 1));
            }
        }

        let mut optimizations = Vec::new();
        if text.contains("range(len(") {
            optimizations.push("Use enumerate() instead of range(len())");
        }
        if text.contains("+ \"\" +") || text.contains("+ '' +") {
            optimizations.push("Remove empty string concatenation");
        }

        let mut fixes = Vec::new();
        if text.contains("print(") && !text.contains("import logging") {
            fixes.push("Consider using logging instead of print statements");
        }
        if text.contains("except:") {
            fixes.push("Avoid bare except clauses");
        }

        Ok(Some(json!({
            "formatting_changes": formatting,
            "optimization_opportunities": optimizations,
            "potential_fixes": fixes,
            "ui_improvements": ui_improvements(text),
        })))
    })?;

    let total: usize = results
        .values()
        .map(|entry| {
            array_len(entry, "formatting_changes")
                + array_len(entry, "optimization_opportunities")
                + array_len(entry, "potential_fixes")
        })
        .sum();

    Ok(json!({
        "simulation_results": results,
        "summary": {
            "total_simulated_changes": total,
            "no_actual_changes_made": true,
        },
    }))
}

fn realtime_collaboration(ctx: &ModeContext) -> Result<Value> {
    let modes = ctx.modes();
    let session_id = ctx
        .metadata
        .get("session_id")
        .and_then(Value::as_str)
        .unwrap_or("default");
    let participants = ctx
        .metadata
        .get("participants")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    Ok(json!({
        "session_id": session_id,
        "max_participants": modes
            .setting("realtime_collaboration", "max_participants")
            .and_then(Value::as_u64)
            .unwrap_or(20),
        "current_participants": participants,
        "conflict_resolution": modes.setting_str("realtime_collaboration", "conflict_resolution", "auto"),
        "shared_records": ctx.records.iter().map(|r| r.identity.as_str()).collect::<Vec<_>>(),
        "session_status": "active",
        "features": ["real_time_editing", "conflict_detection", "auto_merge", "change_tracking"],
    }))
}

fn continuous_integration(ctx: &ModeContext) -> Result<Value> {
    let modes = ctx.modes();
    let slack = modes.setting_bool("continuous_integration", "slack_notifications", false);

    Ok(json!({
        "pipeline_config": {
            "name": "DuckyCoder Analysis Pipeline",
            "triggers": ["push", "pull_request"],
            "jobs": {
                "duckycoder_analysis": {
                    "runs_on": "ubuntu-latest",
                    "steps": [
                        { "name": "Checkout", "uses": "actions/checkout@v4" },
                        {
                            "name": "Run DuckyCoder",
                            "run": "duckycoder process . --mode full_pipeline --export sarif --export html --export json",
                        },
                        {
                            "name": "Upload Analysis Report",
                            "uses": "actions/upload-artifact@v4",
                            "with": { "name": "code-analysis-report", "path": "output/" },
                        },
                    ],
                },
            },
        },
        "severity_threshold": modes.setting_str("continuous_integration", "severity_threshold", "medium"),
        "block_on_errors": modes.setting_bool("continuous_integration", "block_on_errors", true),
        "notifications": { "slack": slack },
        "supported_platforms": ["github_actions", "circleci", "jenkins", "aws_codepipeline"],
    }))
}

/// Security risk in [0, 10]: two points per risk factor present.
pub fn risk_score(text: &str) -> u32 {
    let lower = text.to_lowercase();
    let hits = RISK_FACTORS.iter().filter(|factor| lower.contains(*factor)).count();
    u32::try_from(hits * 2).unwrap_or(u32::MAX).min(10)
}

fn security_scanning(ctx: &ModeContext) -> Result<Value> {
    let modes = ctx.modes();
    let standards: Vec<String> = modes
        .setting("security_scanning", "compliance_standards")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_else(|| ctx.config.security_config.compliance_standards.clone());
    let checker = ComplianceChecker::new()?;

    let results = per_record(ctx, |record| {
        let text = &record.text;
        let lower = text.to_lowercase();

        let mut issues = Vec::new();
        let mut severity = "low";
        if text.contains("eval(") {
            issues.push("Use of eval() function detected");
            severity = "high";
        }
        if lower.contains("password") && text.contains('=') {
            issues.push("Potential hardcoded password");
            if severity == "low" {
                severity = "medium";
            }
        }

        let violations: Vec<String> = checker
            .check(&standards, [(record.identity.as_str(), text.as_str())])
            .into_iter()
            .flat_map(|check| {
                check
                    .violations
                    .into_iter()
                    .map(move |violation| format!("{}: {}", check.standard, violation))
            })
            .collect();

        let mut secrets = Vec::new();
        if lower.contains("api_key") || lower.contains("secret") {
            secrets.push("Potential API key or secret detected");
        }

        Ok(Some(json!({
            "vulnerability_scan": { "issues": issues, "severity": severity },
            "compliance_check": { "violations": violations },
            "secrets_detection": secrets,
            "dependency_check": {
                "total_deps": record.dependencies.len(),
                "dependencies": record.dependencies,
            },
            "risk_score": risk_score(text),
        })))
    })?;

    let total_vulnerabilities: usize = results
        .values()
        .map(|entry| array_len(&entry["vulnerability_scan"], "issues"))
        .sum();
    let high_risk_files = results
        .values()
        .filter(|entry| entry["risk_score"].as_u64().unwrap_or(0) > 7)
        .count();
    let compliance_violations: usize = results
        .values()
        .map(|entry| array_len(&entry["compliance_check"], "violations"))
        .sum();

    Ok(json!({
        "security_results": results,
        "scan_intensity": modes.setting_str("security_scanning", "scan_intensity", "comprehensive"),
        "compliance_standards": standards,
        "summary": {
            "total_vulnerabilities": total_vulnerabilities,
            "high_risk_files": high_risk_files,
            "compliance_violations": compliance_violations,
        },
    }))
}

/// Accessibility score in [0, 10] from the share of known attributes present.
pub fn accessibility_score(text: &str) -> f64 {
    let present = ACCESSIBILITY_FEATURES
        .iter()
        .filter(|feature| text.contains(*feature))
        .count();
    (present as f64 / ACCESSIBILITY_FEATURES.len() as f64 * 10.0).min(10.0)
}

fn ui_design(ctx: &ModeContext) -> Result<Value> {
    let modes = ctx.modes();
    let configured_framework = modes.setting_str("ui_design", "framework", "auto");
    let accessibility_checks = modes.setting_bool("ui_design", "accessibility_checks", true);
    let renderer = MockupRenderer::new(ctx.config.ui_mockup.width)?;

    let results = per_record(ctx, |record| {
        let components = renderer.components(&record.text);
        if components.is_empty() && record.ui_framework.is_none() {
            return Ok(None);
        }
        let text = &record.text;
        let lower = text.to_lowercase();
        let layout = if text.contains("grid") {
            "css_grid"
        } else if text.contains("flex") {
            "flexbox"
        } else {
            "none"
        };
        let patterns: Vec<&str> = [
            ("component", "Component pattern"),
            ("observer", "Observer pattern"),
            ("singleton", "Singleton pattern"),
        ]
        .into_iter()
        .filter(|(marker, _)| lower.contains(marker))
        .map(|(_, pattern)| pattern)
        .collect();

        Ok(Some(json!({
            "framework": record.ui_framework.as_deref().unwrap_or(configured_framework),
            "ui_components": components,
            "responsive_design": {
                "responsive_patterns": [layout],
                "breakpoints_defined": text.contains("@media"),
                "mobile_friendly": text.contains("viewport"),
            },
            "accessibility_score": accessibility_checks.then(|| accessibility_score(text)),
            "mockup_generated": renderer.render(record).is_some(),
            "design_patterns": patterns,
        })))
    })?;

    Ok(json!({
        "ui_analysis": results,
        "responsive_previews": modes.setting_bool("ui_design", "responsive_previews", true),
        "accessibility_checks": accessibility_checks,
        "supported_frameworks": SUPPORTED_UI_FRAMEWORKS,
    }))
}

fn debug_assistant(ctx: &ModeContext) -> Result<Value> {
    let results = per_record(ctx, |record| {
        let text = &record.text;
        let language = record.language.as_deref();

        let mut breakpoints = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.contains("def ") || line.contains("function ") || line.contains("fn ") {
                breakpoints.push(format!("Line {}: Function entry point", index + 1));
            } else if line.contains("if ") && line.to_lowercase().contains("error") {
                breakpoints.push(format!("Line {}: Error condition check", index + 1));
            }
        }

        let mut error_patterns = Vec::new();
        if text.contains("except:") {
            error_patterns.push("Bare except clause");
        }
        if text.contains("assert ") {
            error_patterns.push("Assertion usage");
        }
        if text.contains(".unwrap()") {
            error_patterns.push("Unchecked unwrap");
        }

        let tips: &[&str] = match language {
            Some("python") => &["Use breakpoint() for interactive debugging", "Add logging statements at key points"],
            Some("javascript") | Some("typescript") => &["Use console.log() for debugging", "Utilize browser developer tools"],
            Some("rust") => &["Run with RUST_BACKTRACE=1", "Add tracing spans around suspect calls"],
            _ => &[],
        };

        let mut tests = Vec::new();
        if text.contains("def ") && language == Some("python") {
            tests.push("Add pytest unit tests");
        }
        if text.contains("function ") && language == Some("javascript") {
            tests.push("Add Jest test cases");
        }
        if text.contains("fn ") && language == Some("rust") {
            tests.push("Add #[test] functions in a tests module");
        }

        let lower = text.to_lowercase();
        Ok(Some(json!({
            "breakpoint_suggestions": breakpoints,
            "stack_trace_analysis": {
                "stack_traces_found": lower.contains("traceback") || lower.contains("stack trace"),
            },
            "error_patterns": error_patterns,
            "debugging_tips": tips,
            "test_suggestions": tests,
        })))
    })?;

    Ok(json!({
        "debug_analysis": results,
        "features": [
            "breakpoint_recommendations",
            "stack_trace_analysis",
            "error_pattern_detection",
            "test_generation_suggestions",
        ],
    }))
}

fn api_validation(ctx: &ModeContext) -> Result<Value> {
    let results = per_record(ctx, |record| {
        let text = &record.text;
        let lower = text.to_lowercase();

        let mut endpoints = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with("@app.route")
                || trimmed.starts_with("@router.")
                || trimmed.contains("app.get(")
                || trimmed.contains("app.post(")
                || trimmed.contains(".route(\"")
            {
                endpoints.push(format!("Line {}: {}", index + 1, trimmed));
            }
        }

        let strategy = if text.contains("/v") { "path_based" } else { "unknown" };

        Ok(Some(json!({
            "openapi_schemas": { "schema_found": lower.contains("openapi") || lower.contains("swagger") },
            "graphql_schemas": { "schema_found": lower.contains("graphql") || text.contains("type Query") },
            "rest_endpoints": endpoints,
            "api_documentation": { "documentation_found": text.contains("\"\"\"") || text.contains("///") || text.contains("/**") },
            "versioning_strategy": {
                "versioning_detected": text.contains("/v1/") || lower.contains("version"),
                "strategy": strategy,
            },
        })))
    })?;

    Ok(json!({
        "api_validation_results": results,
        "supported_schemas": ["OpenAPI", "GraphQL", "REST", "gRPC"],
    }))
}

fn doc_generator(ctx: &ModeContext) -> Result<Value> {
    let results = per_record(ctx, |record| {
        let text = &record.text;
        let mut signatures = Vec::new();
        for line in text.lines() {
            let trimmed = line.trim_start();
            let body = trimmed.strip_prefix("pub ").unwrap_or(trimmed);
            let body = body.strip_prefix("async ").unwrap_or(body);
            if ["def ", "fn ", "function ", "class "]
                .iter()
                .any(|keyword| body.starts_with(keyword))
            {
                signatures.push(body.trim_end_matches([':', '{', ' ']).to_string());
            }
        }

        let examples = text
            .lines()
            .filter(|line| line.to_lowercase().contains("example"))
            .count();

        Ok(Some(json!({
            "api_docs": {
                "format": "markdown",
                "entries": signatures,
            },
            "code_examples": examples,
            "readme_sections": ["installation", "usage", "examples", "contributing"],
        })))
    })?;

    Ok(json!({
        "documentation_results": results,
        "output_formats": ["markdown", "html"],
    }))
}

fn profiling_tools(language: Option<&str>) -> &'static [&'static str] {
    match language {
        Some("python") => &["cProfile", "line_profiler", "memory_profiler"],
        Some("javascript") | Some("typescript") => &["Chrome DevTools", "Node.js profiler"],
        Some("rust") => &["cargo flamegraph", "perf", "heaptrack"],
        Some("go") => &["pprof"],
        _ => &[],
    }
}

fn performance_profiling(ctx: &ModeContext) -> Result<Value> {
    let modes = ctx.modes();
    let analyzer = PerformanceAnalyzer::new()?;

    let results = per_record(ctx, |record| {
        let report = analyzer.analyze(record);
        let mut bottlenecks = Vec::new();
        if report.nested_loops > 0 {
            bottlenecks.push(format!("{} nested loop(s) detected", report.nested_loops));
        }
        if report.io_in_loops > 0 {
            bottlenecks.push(format!("{} I/O call(s) inside loops", report.io_in_loops));
        }
        if record.text.contains("time.sleep") || record.text.contains("thread::sleep") {
            bottlenecks.push("Sleep calls found".to_string());
        }

        Ok(Some(json!({
            "bottleneck_detection": bottlenecks,
            "memory_analysis": { "allocations_in_loops": report.allocations_in_loops },
            "optimization_suggestions": report.recommendations,
            "performance_score": report.score,
            "profiling_recommendations": profiling_tools(record.language.as_deref()),
        })))
    })?;

    Ok(json!({
        "performance_results": results,
        "monitored_metrics": modes
            .setting("performance_profiling", "metrics")
            .cloned()
            .unwrap_or_else(|| json!(["cpu", "memory", "io"])),
        "alert_thresholds": modes
            .setting("performance_profiling", "alert_thresholds")
            .cloned()
            .unwrap_or_else(|| json!({})),
    }))
}

fn quantum_computing(ctx: &ModeContext) -> Result<Value> {
    let framework = ctx.modes().setting_str("quantum_computing", "framework", "qiskit");

    let results = per_record(ctx, |record| {
        let lower = record.text.to_lowercase();
        if record.language.as_deref() != Some("python") || !lower.contains("qiskit") {
            return Ok(None);
        }

        let mut circuits = Vec::new();
        if record.text.contains("QuantumCircuit") {
            circuits.push("Quantum circuit definition found");
        }
        let mut algorithms = Vec::new();
        if lower.contains("grover") {
            algorithms.push("Grover's algorithm");
        }
        if lower.contains("shor") {
            algorithms.push("Shor's algorithm");
        }
        let mut optimizations = Vec::new();
        if lower.contains(".measure(") && lower.contains("for ") {
            optimizations.push("Measure once after the circuit instead of inside loops");
        }
        if !lower.contains("transpile") {
            optimizations.push("Transpile circuits for the target backend");
        }

        Ok(Some(json!({
            "quantum_circuits": circuits,
            "quantum_algorithms": algorithms,
            "optimization_suggestions": optimizations,
            "framework": framework,
        })))
    })?;

    let features: &[&str] = if results.is_empty() {
        &[]
    } else {
        &["circuit_analysis", "algorithm_identification", "optimization_suggestions"]
    };

    Ok(json!({
        "quantum_results": results,
        "framework": framework,
        "supported_features": features,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DuckyConfig;
    use crate::core::record::ContentCategory;
    use std::sync::Arc;

    fn context(records: Vec<ContentRecord>) -> ModeContext {
        ModeContext::new(records, Arc::new(DuckyConfig::default()))
    }

    fn python(identity: &str, text: &str) -> ContentRecord {
        ContentRecord::new(identity, ContentCategory::Code, text).with_language("python")
    }

    #[test]
    fn names_and_handlers_line_up() {
        let handlers = builtin_handlers();
        assert_eq!(handlers.len(), MODE_NAMES.len());
        assert_eq!(handlers[6].0, "security_scanning");
    }

    #[test]
    fn merge_only_prefixes_each_source() {
        let ctx = context(vec![python("a.py", "x = 1"), python("b.py", "y = 2")]);
        let data = merge_only(&ctx).unwrap();
        assert_eq!(data["merged_content"], "# Source: a.py\nx = 1\n\n# Source: b.py\ny = 2\n");
        assert_eq!(data["merge_stats"]["sources_merged"], 2);
    }

    #[test]
    fn risk_score_adds_two_per_factor_and_caps() {
        assert_eq!(risk_score("x = 1"), 0);
        assert_eq!(risk_score("eval(data)"), 2);
        assert_eq!(risk_score("eval( exec( system( shell_exec password secret"), 10);
    }

    #[test]
    fn security_scan_reports_secrets_and_compliance() {
        let ctx = context(vec![python("a.py", "API_KEY = 'x'\npatient = load()\neval(q)\n")]);
        let data = security_scanning(&ctx).unwrap();
        let entry = &data["security_results"]["a.py"];

        assert_eq!(entry["vulnerability_scan"]["severity"], "high");
        assert_eq!(entry["secrets_detection"].as_array().unwrap().len(), 1);
        assert_eq!(entry["risk_score"], 4);
        assert!(data["summary"]["compliance_violations"].as_u64().unwrap() >= 1);
    }

    #[test]
    fn accessibility_score_scales_to_ten() {
        assert_eq!(accessibility_score("<div></div>"), 0.0);
        let all = "aria-label alt= role= tabindex aria-describedby aria-hidden";
        assert_eq!(accessibility_score(all), 10.0);
    }

    #[test]
    fn ui_design_only_reports_ui_records() {
        let ctx = context(vec![
            ContentRecord::new("page.html", ContentCategory::Markup, "<button aria-label=\"go\">Go</button>"),
            python("a.py", "x = 1"),
        ]);
        let data = ui_design(&ctx).unwrap();
        let analysis = data["ui_analysis"].as_object().unwrap();
        assert_eq!(analysis.len(), 1);
        assert!(analysis["page.html"]["accessibility_score"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn dry_run_counts_simulated_changes() {
        let ctx = context(vec![python("a.py", "for i in range(len(xs)):  \n\tprint(i)\n")]);
        let data = dry_run(&ctx).unwrap();
        assert_eq!(data["summary"]["total_simulated_changes"], 4);
        assert_eq!(data["summary"]["no_actual_changes_made"], true);
    }

    #[test]
    fn quantum_mode_ignores_non_quantum_code() {
        let ctx = context(vec![
            python("a.py", "x = 1"),
            python("q.py", "from qiskit import QuantumCircuit\nqc = QuantumCircuit(2)\n"),
        ]);
        let data = quantum_computing(&ctx).unwrap();
        let results = data["quantum_results"].as_object().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results["q.py"]["quantum_circuits"][0], "Quantum circuit definition found");
    }
}
