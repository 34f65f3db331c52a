//! CLI Module Organization
//!
//! - args: CLI argument structures
//! - commands: `process`, `version` and `config` implementations
//! - logging: tracing subscriber setup

pub mod args;
pub mod commands;
pub mod logging;

pub use args::*;
pub use commands::*;
