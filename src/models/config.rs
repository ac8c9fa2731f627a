//! Configuration data models and validation

use crate::error::{AppError, Backoff, ConnectPolicy, Result};
use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings shared by every subcommand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,

    /// Log line format
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
            log_format: default_log_format(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Some(enable_color) = env_var("LOSSLAT_ENABLE_COLOR") {
            self.enable_color = enable_color.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        if let Some(format) = env_var("LOSSLAT_LOG_FORMAT") {
            self.log_format = format.parse()?;
        }

        Ok(())
    }
}

/// Echo responder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Fixed frame size echoed by the TCP responder
    pub size: usize,

    /// Receive buffer size of the UDP responder
    pub buf_size: usize,

    /// Suppress per-echo log lines
    pub quiet: bool,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            host: crate::defaults::DEFAULT_BIND_HOST.to_string(),
            port: crate::defaults::DEFAULT_PORT,
            size: crate::defaults::DEFAULT_PAYLOAD_SIZE,
            buf_size: crate::defaults::DEFAULT_UDP_BUF_SIZE,
            quiet: false,
        }
    }
}

impl ResponderConfig {
    /// `host:port` string used for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(AppError::config("Bind host cannot be empty"));
        }
        if self.size == 0 {
            return Err(AppError::config("Echo frame size must be greater than 0"));
        }
        if self.buf_size == 0 {
            return Err(AppError::config("Receive buffer size must be greater than 0"));
        }
        Ok(())
    }

    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Some(port) = env_var("LOSSLAT_PORT") {
            self.port = port.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_PORT value '{}': {}", port, e)))?;
        }
        if let Some(size) = env_var("LOSSLAT_SIZE") {
            self.size = size.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_SIZE value '{}': {}", size, e)))?;
        }
        Ok(())
    }
}

/// RTT prober settings for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Responder host
    pub host: String,

    /// Responder port
    pub port: u16,

    /// Number of probes
    pub count: u32,

    /// Pause between probes in milliseconds
    pub interval_ms: f64,

    /// Per-probe timeout in seconds
    pub timeout_secs: f64,

    /// Payload size in bytes
    pub payload_size: usize,

    /// Connection establishment retry policy (TCP only)
    pub connect_policy: ConnectPolicy,

    /// Print one line per probe before the summary
    pub verbose: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: crate::defaults::DEFAULT_PORT,
            count: crate::defaults::DEFAULT_PROBE_COUNT,
            interval_ms: crate::defaults::DEFAULT_INTERVAL_MS,
            timeout_secs: crate::defaults::DEFAULT_TIMEOUT_SECS,
            payload_size: crate::defaults::DEFAULT_PAYLOAD_SIZE,
            connect_policy: ConnectPolicy::default(),
            verbose: false,
        }
    }
}

impl ProbeConfig {
    /// Get the inter-probe interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_ms.max(0.0) / 1000.0)
    }

    /// Get the per-probe timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    /// `host:port` of the responder
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(AppError::config("Target host cannot be empty"));
        }

        if self.count == 0 {
            return Err(AppError::config("Probe count must be greater than 0"));
        }

        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_secs > crate::defaults::MAX_TIMEOUT_SECS {
            return Err(AppError::config(format!(
                "Timeout cannot exceed {} seconds",
                crate::defaults::MAX_TIMEOUT_SECS
            )));
        }

        if !self.interval_ms.is_finite() || self.interval_ms < 0.0 {
            return Err(AppError::config("Interval cannot be negative"));
        }

        if self.interval_ms > crate::defaults::MAX_INTERVAL_MS {
            return Err(AppError::config(format!(
                "Interval cannot exceed {} ms",
                crate::defaults::MAX_INTERVAL_MS
            )));
        }

        if self.payload_size == 0 {
            return Err(AppError::config("Payload size must be greater than 0"));
        }

        if self.payload_size > crate::defaults::MAX_PAYLOAD_SIZE {
            return Err(AppError::config(format!(
                "Payload size cannot exceed {} bytes",
                crate::defaults::MAX_PAYLOAD_SIZE
            )));
        }

        // every sequence number must fit in the payload
        let digits = self.count.to_string().len();
        if digits > self.payload_size {
            return Err(AppError::validation(format!(
                "payload size {} too small for sequence number {} ({} digits)",
                self.payload_size, self.count, digits
            )));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Some(port) = env_var("LOSSLAT_PORT") {
            self.port = port.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_PORT value '{}': {}", port, e)))?;
        }

        if let Some(count) = env_var("LOSSLAT_COUNT") {
            self.count = count.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_COUNT value '{}': {}", count, e)))?;
        }

        if let Some(interval) = env_var("LOSSLAT_INTERVAL_MS") {
            self.interval_ms = interval.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_INTERVAL_MS value '{}': {}", interval, e)))?;
        }

        if let Some(timeout) = env_var("LOSSLAT_TIMEOUT") {
            self.timeout_secs = timeout.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_TIMEOUT value '{}': {}", timeout, e)))?;
        }

        if let Some(size) = env_var("LOSSLAT_SIZE") {
            self.payload_size = size.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_SIZE value '{}': {}", size, e)))?;
        }

        if let Some(attempts) = env_var("LOSSLAT_CONNECT_ATTEMPTS") {
            self.connect_policy.max_attempts = attempts.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_CONNECT_ATTEMPTS value '{}': {}", attempts, e)))?;
        }

        if let Some(delay) = env_var("LOSSLAT_CONNECT_DELAY_MS") {
            let delay_ms: u64 = delay.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_CONNECT_DELAY_MS value '{}': {}", delay, e)))?;
            self.connect_policy.backoff = Backoff::Fixed(Duration::from_millis(delay_ms));
        }

        Ok(())
    }
}

/// Probe settings shared by every trial of a sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSettings {
    pub count: u32,
    pub interval_ms: f64,
    pub timeout_secs: f64,
    pub port: u16,
    pub tcp_size: usize,
}

impl Default for TrialSettings {
    fn default() -> Self {
        Self {
            count: crate::defaults::DEFAULT_SWEEP_COUNT,
            interval_ms: crate::defaults::DEFAULT_SWEEP_INTERVAL_MS,
            timeout_secs: crate::defaults::DEFAULT_TIMEOUT_SECS,
            port: crate::defaults::DEFAULT_PORT,
            tcp_size: crate::defaults::DEFAULT_PAYLOAD_SIZE,
        }
    }
}

impl TrialSettings {
    /// Settings of a single trial, matching the standalone prober defaults
    pub fn single_trial() -> Self {
        Self {
            count: crate::defaults::DEFAULT_PROBE_COUNT,
            interval_ms: crate::defaults::DEFAULT_INTERVAL_MS,
            ..Self::default()
        }
    }

    /// Merge environment variables into these settings
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Some(count) = env_var("LOSSLAT_COUNT") {
            self.count = count.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_COUNT value '{}': {}", count, e)))?;
        }

        if let Some(interval) = env_var("LOSSLAT_INTERVAL_MS") {
            self.interval_ms = interval.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_INTERVAL_MS value '{}': {}", interval, e)))?;
        }

        if let Some(timeout) = env_var("LOSSLAT_TIMEOUT") {
            self.timeout_secs = timeout.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_TIMEOUT value '{}': {}", timeout, e)))?;
        }

        if let Some(port) = env_var("LOSSLAT_PORT") {
            self.port = port.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_PORT value '{}': {}", port, e)))?;
        }

        if let Some(size) = env_var("LOSSLAT_SIZE") {
            self.tcp_size = size.parse()
                .map_err(|e| AppError::config(format!("Invalid LOSSLAT_SIZE value '{}': {}", size, e)))?;
        }

        Ok(())
    }

    /// Prober configuration for one protocol run of a trial against `host`
    pub fn probe_config(&self, host: &str) -> ProbeConfig {
        ProbeConfig {
            host: host.to_string(),
            port: self.port,
            count: self.count,
            interval_ms: self.interval_ms,
            timeout_secs: self.timeout_secs,
            payload_size: self.tcp_size,
            connect_policy: ConnectPolicy::default(),
            verbose: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.probe_config("127.0.0.1").validate()
    }
}

/// How trials are executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HarnessKind {
    /// In-process responders and probers on the loopback interface
    Loopback,
    /// External program, invoked once per loss level
    Command { program: String, args: Vec<String> },
}

impl Default for HarnessKind {
    fn default() -> Self {
        let mut parts = crate::defaults::DEFAULT_HARNESS_CMD.split_whitespace().map(String::from);
        HarnessKind::Command {
            program: parts.next().unwrap_or_default(),
            args: parts.collect(),
        }
    }
}

impl HarnessKind {
    /// Split a whitespace-separated command line into program and arguments
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts
            .next()
            .ok_or_else(|| AppError::config("Harness command cannot be empty"))?;
        Ok(HarnessKind::Command {
            program,
            args: parts.collect(),
        })
    }
}

/// Loss sweep settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Loss levels in percent, in run order
    pub loss_levels: Vec<f64>,

    /// Probe settings used for every trial
    pub trial: TrialSettings,

    /// Trial executor
    pub harness: HarnessKind,

    /// Output lines containing this marker are dropped before parsing
    pub noise_marker: Option<String>,

    /// Where the sweep series is exported as JSON
    pub output_path: String,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            loss_levels: crate::defaults::DEFAULT_SWEEP_LOSS_LEVELS.to_vec(),
            trial: TrialSettings::default(),
            harness: HarnessKind::default(),
            noise_marker: Some(crate::defaults::DEFAULT_NOISE_MARKER.to_string()),
            output_path: crate::defaults::DEFAULT_SWEEP_OUTPUT.to_string(),
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<()> {
        if self.loss_levels.is_empty() {
            return Err(AppError::config("At least one loss level is required"));
        }

        for level in &self.loss_levels {
            if !level.is_finite() || *level < 0.0 || *level > 100.0 {
                return Err(AppError::config(format!(
                    "Loss level must be between 0 and 100 percent: {}",
                    level
                )));
            }
        }

        if self.output_path.is_empty() {
            return Err(AppError::config("Output path cannot be empty"));
        }

        self.trial.validate()
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Some(levels) = env_var("LOSSLAT_LOSS_LEVELS") {
            self.loss_levels = crate::sweep::parse_loss_levels(&levels)?;
        }

        self.trial.merge_from_env()?;

        if let Some(command) = env_var("LOSSLAT_HARNESS_CMD") {
            self.harness = HarnessKind::from_command_line(&command)?;
        }

        Ok(())
    }
}

/// Non-empty environment variable value
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Default value functions for serde
fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

fn default_log_format() -> LogFormat {
    LogFormat::Console
}
