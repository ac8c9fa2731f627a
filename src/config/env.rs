//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load `.env` from the current directory if it exists.
    ///
    /// Variables already set in the process environment win over the file.
    pub fn load_env_file() -> Result<bool> {
        Self::load_env_file_from(Path::new(".env"))
    }

    /// Load an env file from `path` if it exists; returns whether it was loaded
    pub fn load_env_file_from(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;
        Ok(true)
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("LOSSLAT_PORT", "Echo port for responders, probers and trials", "9000"),
            ("LOSSLAT_COUNT", "Number of probes per run", "20"),
            ("LOSSLAT_INTERVAL_MS", "Pause between probes in milliseconds", "50"),
            ("LOSSLAT_TIMEOUT", "Per-probe timeout in seconds", "1.0"),
            ("LOSSLAT_SIZE", "Payload / echo frame size in bytes", "8"),
            ("LOSSLAT_CONNECT_ATTEMPTS", "TCP connection attempts before giving up", "5"),
            ("LOSSLAT_CONNECT_DELAY_MS", "Delay between TCP connection attempts", "50"),
            ("LOSSLAT_LOSS_LEVELS", "Sweep loss levels in percent", "1 3 6"),
            ("LOSSLAT_HARNESS_CMD", "Sweep measurement harness command", "python3 scripts/mn_latency.py"),
            ("LOSSLAT_ENABLE_COLOR", "Enable colored output", "true"),
            ("LOSSLAT_LOG_FORMAT", "Log line format (console, json, compact)", "console"),
        ]
    }

    /// Variable listing appended to `--help`
    pub fn env_help() -> String {
        let mut help = String::from("Environment (flags override LOSSLAT_* variables, which override .env):\n");
        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<26} {} [e.g. {}]\n", var, description, example));
        }
        help
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_LOCK;
    use tempfile::TempDir;

    #[test]
    fn test_load_env_file_from() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::remove_var("LOSSLAT_CONNECT_ATTEMPTS");

        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.env");
        assert!(!EnvManager::load_env_file_from(&missing).unwrap());

        let path = dir.path().join(".env");
        std::fs::write(&path, "LOSSLAT_CONNECT_ATTEMPTS=7\n").unwrap();
        assert!(EnvManager::load_env_file_from(&path).unwrap());
        assert_eq!(std::env::var("LOSSLAT_CONNECT_ATTEMPTS").unwrap(), "7");

        std::env::remove_var("LOSSLAT_CONNECT_ATTEMPTS");
    }

    #[test]
    fn test_env_help_lists_every_variable() {
        let help = EnvManager::env_help();
        for (name, _, _) in EnvManager::get_supported_env_vars() {
            assert!(help.contains(name), "missing {}", name);
        }
        assert!(help.contains("[e.g. 1 3 6]"));
    }
}
