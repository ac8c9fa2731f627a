//! Configuration management module

pub mod env;
pub mod parser;

// Re-export main functionality
pub use env::EnvManager;
pub use parser::{display_config_summary, load_config, AppConfig, CommandConfig, ConfigParser};

// Re-export from models for convenience
pub use crate::models::Config;

/// Serializes tests that mutate the process environment
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
