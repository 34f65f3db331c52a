//! CLI Command Implementations
//!
//! - process: pipeline runs and single-mode dispatch
//! - config: configuration file management

pub mod config;
pub mod process;

pub use config::config_command;
pub use process::process_command;

/// Print version information
pub fn version_command() {
    println!("DuckyCoder v{}", duckycoder::VERSION);
}
