//! Error types for the duckycoder library.
//!
//! Every failure the pipeline can produce is expressed as a [`DuckyError`]
//! variant. The per-item variants (`Ingestion`, `Evaluator`, `UnknownMode`,
//! `Export`) are normally captured at an isolation boundary and recorded on
//! the run; only structural failures are expected to propagate to callers.

use std::io;

use thiserror::Error;

/// Main result type for duckycoder operations.
pub type Result<T> = std::result::Result<T, DuckyError>;

/// Error type shared by every duckycoder component.
#[derive(Error, Debug)]
pub enum DuckyError {
    /// I/O related errors (file reads, directory walks, report writes)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// A single input could not be read or decoded
    #[error("Ingestion failed for '{input}': {message}")]
    Ingestion {
        /// Raw input as supplied by the caller
        input: String,
        /// Error description
        message: String,
    },

    /// An analyzer or enhancer failed for one record
    #[error("Evaluator '{evaluator}' failed on '{record}': {message}")]
    Evaluator {
        /// Evaluator name
        evaluator: String,
        /// Identity of the record being evaluated
        record: String,
        /// Error description
        message: String,
    },

    /// Dispatch requested for a mode that is not registered
    #[error("UnknownMode: '{mode}' is not a registered mode")]
    UnknownMode {
        /// Requested mode name
        mode: String,
    },

    /// A single export format failed to write
    #[error("Export to {format} failed: {message}")]
    Export {
        /// Export format name
        format: String,
        /// Error description
        message: String,
    },

    /// Pipeline errors that escaped per-item isolation
    #[error("Pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage where error occurred
        stage: String,
        /// Error description
        message: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for input data or configuration values
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
        /// Expected value or format
        expected: Option<String>,
        /// Actual value received
        actual: Option<String>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },

    /// Unsupported operation or input kind
    #[error("Unsupported: {message}")]
    Unsupported {
        /// Error description
        message: String,
    },
}

impl DuckyError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new ingestion error
    pub fn ingestion(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ingestion {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Create a new evaluator error
    pub fn evaluator(
        evaluator: impl Into<String>,
        record: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Evaluator {
            evaluator: evaluator.into(),
            record: record.into(),
            message: message.into(),
        }
    }

    /// Create a new unknown mode error
    pub fn unknown_mode(mode: impl Into<String>) -> Self {
        Self::UnknownMode { mode: mode.into() }
    }

    /// Create a new export error
    pub fn export(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Export {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
            expected: None,
            actual: None,
        }
    }

    /// Create a new validation error tied to a specific field
    pub fn validation_field(
        message: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
            expected: Some(expected.into()),
            actual: Some(actual.into()),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Create a new unsupported error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Attach caller context. I/O errors take the context as their
    /// message; configuration and serialization errors are prefixed with it.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        match &mut self {
            Self::Io { message, .. } => *message = context,
            Self::Config { message, .. } | Self::Serialization { message, .. } => {
                *message = format!("{context}: {message}");
            }
            Self::Internal { context: ctx, .. } => *ctx = Some(context),
            _ => {}
        }
        self
    }
}

impl From<io::Error> for DuckyError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for DuckyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for DuckyError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<regex::Error> for DuckyError {
    fn from(err: regex::Error) -> Self {
        Self::Internal {
            message: format!("Invalid rule pattern: {err}"),
            context: None,
        }
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DuckyError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}
