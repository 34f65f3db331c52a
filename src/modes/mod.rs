//! Named operational modes and their dispatcher.
//!
//! The registry is built once from the built-in handlers (see
//! [`handlers`]) and is read-only afterwards. Every dispatch produces a
//! [`ModeResult`]; unknown names, disabled modes, handler errors, panics and
//! timeouts all come back as failed results rather than errors.

pub mod handlers;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::core::config::{DuckyConfig, ModesConfig};
use crate::core::errors::{DuckyError, Result};
use crate::core::record::ContentRecord;

pub use handlers::{builtin_handlers, HandlerFn, MODE_NAMES};

/// Input shared by every mode of one dispatch.
#[derive(Debug, Clone)]
pub struct ModeContext {
    /// Ingested records
    pub records: Vec<ContentRecord>,
    /// Configuration the records were ingested with
    pub config: Arc<DuckyConfig>,
    /// Free-form caller metadata (session ids, participants, ...)
    pub metadata: Map<String, Value>,
}

impl ModeContext {
    /// Context over `records`.
    pub fn new(records: Vec<ContentRecord>, config: Arc<DuckyConfig>) -> Self {
        Self {
            records,
            config,
            metadata: Map::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Per-mode settings from the configuration.
    pub fn modes(&self) -> &ModesConfig {
        &self.config.modes
    }
}

/// Outcome of one mode dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModeResult {
    /// Requested mode name
    pub mode_name: String,
    /// Whether the handler produced data
    pub success: bool,
    /// Handler output on success
    pub data: Option<Value>,
    /// Failure description
    pub error: Option<String>,
    /// Wall-clock time including lookup
    pub execution_time_ms: u64,
    /// `status` and `timestamp`
    pub metadata: Map<String, Value>,
}

impl ModeResult {
    fn finish(
        mode_name: &str,
        started: Instant,
        status: &str,
        data: Option<Value>,
        error: Option<String>,
    ) -> Self {
        let mut metadata = Map::new();
        metadata.insert("status".to_string(), Value::from(status));
        metadata.insert("timestamp".to_string(), Value::from(Utc::now().to_rfc3339()));
        Self {
            mode_name: mode_name.to_string(),
            success: error.is_none(),
            data,
            error,
            execution_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            metadata,
        }
    }

    /// `status` metadata entry.
    pub fn status(&self) -> &str {
        self.metadata
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
    }
}

/// A dispatchable mode.
#[async_trait]
pub trait ModeHandler: Send + Sync {
    /// Produce the mode's output for `ctx`.
    async fn handle(&self, ctx: &ModeContext) -> Result<Value>;
}

/// Adapter for the synchronous built-in handlers.
struct BuiltinHandler(HandlerFn);

#[async_trait]
impl ModeHandler for BuiltinHandler {
    async fn handle(&self, ctx: &ModeContext) -> Result<Value> {
        (self.0)(ctx)
    }
}

/// Registry of mode handlers plus the enable flags and time budget.
#[derive(Clone)]
pub struct ModeDispatcher {
    handlers: Arc<IndexMap<String, Arc<dyn ModeHandler>>>,
    modes: Arc<ModesConfig>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for ModeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeDispatcher")
            .field("modes", &self.handlers.keys().collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ModeDispatcher {
    /// Dispatcher with every built-in mode registered.
    pub fn new(config: &DuckyConfig) -> Self {
        let handlers = builtin_handlers()
            .into_iter()
            .map(|(name, run)| {
                let handler: Arc<dyn ModeHandler> = Arc::new(BuiltinHandler(run));
                (name.to_string(), handler)
            })
            .collect();
        Self {
            handlers: Arc::new(handlers),
            modes: Arc::new(config.modes.clone()),
            timeout: config.pipeline.mode_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Register or replace a handler. Only meaningful before the dispatcher
    /// is shared.
    pub fn with_handler(mut self, name: impl Into<String>, handler: Arc<dyn ModeHandler>) -> Self {
        Arc::make_mut(&mut self.handlers).insert(name.into(), handler);
        self
    }

    /// Registered mode names in registration order.
    pub fn mode_names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Whether `name` is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Run one mode.
    pub async fn dispatch(&self, name: &str, ctx: &ModeContext) -> ModeResult {
        let started = Instant::now();

        let Some(handler) = self.handlers.get(name) else {
            warn!("Dispatch requested for unknown mode '{}'", name);
            let error = DuckyError::unknown_mode(name);
            return ModeResult::finish(name, started, "unknown", None, Some(error.to_string()));
        };

        if !self.modes.is_enabled(name) {
            info!("Mode {} is disabled", name);
            return ModeResult::finish(name, started, "disabled", None, Some("disabled".to_string()));
        }

        info!("Executing mode: {}", name);
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, handler.handle(ctx)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("Mode {} exceeded its {}ms budget", name, limit.as_millis());
                    let message = format!("timed out after {}ms", limit.as_millis());
                    return ModeResult::finish(name, started, "timeout", None, Some(message));
                }
            },
            None => handler.handle(ctx).await,
        };

        match outcome {
            Ok(data) => ModeResult::finish(name, started, "completed", Some(data), None),
            Err(e) => {
                error!("Mode {} execution failed: {}", name, e);
                ModeResult::finish(name, started, "failed", None, Some(e.to_string()))
            }
        }
    }

    /// Run several modes concurrently, one task each. Results follow the
    /// order of `names`; a panicking handler yields a failed result timed
    /// up to the panic.
    pub async fn dispatch_many(&self, names: &[String], ctx: Arc<ModeContext>) -> Vec<ModeResult> {
        let tasks: Vec<_> = names
            .iter()
            .map(|name| {
                let started = Instant::now();
                let dispatcher = self.clone();
                let ctx = Arc::clone(&ctx);
                let name = name.clone();
                let task = tokio::spawn(async move {
                    let outcome = AssertUnwindSafe(dispatcher.dispatch(&name, &ctx))
                        .catch_unwind()
                        .await;
                    outcome.unwrap_or_else(|payload| {
                        let message = panic_message(payload.as_ref());
                        error!("Mode {} panicked: {}", name, message);
                        ModeResult::finish(
                            &name,
                            started,
                            "panicked",
                            None,
                            Some(format!("mode task panicked: {message}")),
                        )
                    })
                });
                (started, task)
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (name, (started, task)) in names.iter().zip(tasks) {
            match task.await {
                Ok(result) => results.push(result),
                Err(join_error) => {
                    error!("Mode {} task cancelled", name);
                    results.push(ModeResult::finish(
                        name,
                        started,
                        "cancelled",
                        None,
                        Some(format!("mode task cancelled: {join_error}")),
                    ));
                }
            }
        }
        results
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::ContentCategory;
    use serde_json::json;

    struct Panics;

    #[async_trait]
    impl ModeHandler for Panics {
        async fn handle(&self, _ctx: &ModeContext) -> Result<Value> {
            panic!("handler bug");
        }
    }

    struct Slow;

    #[async_trait]
    impl ModeHandler for Slow {
        async fn handle(&self, _ctx: &ModeContext) -> Result<Value> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(json!({}))
        }
    }

    struct LatePanic;

    #[async_trait]
    impl ModeHandler for LatePanic {
        async fn handle(&self, _ctx: &ModeContext) -> Result<Value> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            panic!("late handler bug");
        }
    }

    fn context() -> ModeContext {
        let record = ContentRecord::new("a.py", ContentCategory::Code, "def f():\n    return 1\n")
            .with_language("python");
        ModeContext::new(vec![record], Arc::new(DuckyConfig::default()))
    }

    #[test]
    fn registers_all_builtin_modes() {
        let dispatcher = ModeDispatcher::new(&DuckyConfig::default());
        assert_eq!(dispatcher.mode_names().len(), 13);
        assert_eq!(dispatcher.mode_names(), MODE_NAMES.to_vec());
    }

    #[tokio::test]
    async fn unknown_mode_is_a_failed_result() {
        let dispatcher = ModeDispatcher::new(&DuckyConfig::default());
        let result = dispatcher.dispatch("nonexistent_mode", &context()).await;

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("UnknownMode"));
        assert_eq!(result.status(), "unknown");
    }

    #[tokio::test]
    async fn disabled_mode_never_runs_its_handler() {
        let mut config = DuckyConfig::default();
        config.modes.set_enabled("panics", false);
        let dispatcher = ModeDispatcher::new(&config).with_handler("panics", Arc::new(Panics));

        let result = dispatcher.dispatch("panics", &context()).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("disabled"));
    }

    #[tokio::test]
    async fn enabled_mode_returns_data() {
        let dispatcher = ModeDispatcher::new(&DuckyConfig::default());
        let result = dispatcher.dispatch("analyze_only", &context()).await;

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.status(), "completed");
        assert_eq!(result.data.unwrap()["summary"]["total_files"], 1);
    }

    #[tokio::test]
    async fn dispatch_many_isolates_failures() {
        let mut config = DuckyConfig::default();
        config.pipeline.mode_timeout_ms = Some(20);
        let dispatcher = ModeDispatcher::new(&config)
            .with_handler("panics", Arc::new(Panics))
            .with_handler("slow", Arc::new(Slow));
        let names: Vec<String> = ["merge_only", "panics", "nonexistent_mode", "slow", "debug_assistant"]
            .iter()
            .map(|name| name.to_string())
            .collect();

        let results = dispatcher.dispatch_many(&names, Arc::new(context())).await;

        let outcome: Vec<(&str, bool)> = results
            .iter()
            .map(|r| (r.mode_name.as_str(), r.success))
            .collect();
        assert_eq!(
            outcome,
            vec![
                ("merge_only", true),
                ("panics", false),
                ("nonexistent_mode", false),
                ("slow", false),
                ("debug_assistant", true),
            ]
        );
        assert_eq!(results[1].status(), "panicked");
        assert_eq!(results[3].status(), "timeout");
    }

    #[tokio::test]
    async fn panicked_mode_is_timed_until_the_panic() {
        let dispatcher = ModeDispatcher::new(&DuckyConfig::default())
            .with_handler("slow", Arc::new(Slow))
            .with_handler("late_panic", Arc::new(LatePanic));
        let names = vec!["slow".to_string(), "late_panic".to_string()];

        let results = dispatcher.dispatch_many(&names, Arc::new(context())).await;

        assert!(results[0].success);
        assert!(results[0].execution_time_ms >= 500);
        assert_eq!(results[1].status(), "panicked");
        assert!(results[1].error.as_deref().unwrap().contains("late handler bug"));
        let elapsed = results[1].execution_time_ms;
        assert!((200..500).contains(&elapsed), "late_panic took {elapsed}ms");
    }
}
