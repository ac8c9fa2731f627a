//! Structured logging system for the loss/latency prober
//!
//! This module provides:
//! - Structured logging with multiple levels and contexts
//! - Debug mode detailed tracing
//! - Error event logging with correlation IDs
//! - JSON structured output for integration with log aggregators
//!
//! Every entry is written to stderr. Stdout carries the statistics reports
//! and must stay parseable by the sweep driver.

use crate::error::{AppError, Result};
use crate::models::{Config, RunResult};
use crate::types::Protocol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - most detailed
    Trace = 0,
    /// Debug level - detailed information for debugging
    Debug = 1,
    /// Info level - general application information
    Info = 2,
    /// Warning level - potentially harmful situations
    Warn = 3,
    /// Error level - error events but application can continue
    Error = 4,
    /// Fatal level - severe error events that cause application termination
    Fatal = 5,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",    // White
            LogLevel::Debug => "\x1b[36m",    // Cyan
            LogLevel::Info => "\x1b[32m",     // Green
            LogLevel::Warn => "\x1b[33m",     // Yellow
            LogLevel::Error => "\x1b[31m",    // Red
            LogLevel::Fatal => "\x1b[35m",    // Magenta
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp when log entry was created
    pub timestamp: DateTime<Utc>,
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: HashMap<String, serde_json::Value>,
    /// File and line information
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub module: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "console" => Ok(LogFormat::Console),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(AppError::config(format!(
                "Invalid log format '{}'. Valid options: console, json, compact",
                s
            ))),
        }
    }
}

/// Logger implementation with multiple output formats
pub struct Logger {
    /// Minimum log level to output
    min_level: LogLevel,
    /// Whether to use colored output
    use_color: bool,
    /// Whether to include location information
    include_location: bool,
    /// Output format
    format: LogFormat,
    /// Logger name
    name: String,
    /// Shared context storage
    context: Arc<RwLock<LogContext>>,
}

/// Shared logging context for correlation and session tracking
#[derive(Debug, Default)]
struct LogContext {
    /// Global correlation ID for the session
    session_id: Option<String>,
    /// Current operation correlation ID
    current_correlation_id: Option<String>,
    /// Additional context fields
    context_fields: HashMap<String, serde_json::Value>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            include_location: false,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger with specific configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format: config.log_format,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Set minimum log level
    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    /// Lower the minimum level to `level` if it is currently stricter
    pub fn lower_level_to(&mut self, level: LogLevel) {
        self.min_level = self.min_level.min(level);
    }

    /// Enable or disable colored output
    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Add context field for all subsequent log entries
    pub async fn add_context_field<T: Serialize>(&self, key: String, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            let mut context = self.context.write().await;
            context.context_fields.insert(key, json_value);
        }
    }

    /// Start a correlated operation
    pub async fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        {
            let mut context = self.context.write().await;
            context.current_correlation_id = Some(correlation_id.clone());
        }

        self.debug(&format!("Started operation: {}", operation_name))
            .correlation_id(&correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "start")
            .log()
            .await;

        correlation_id
    }

    /// End a correlated operation
    pub async fn end_operation(&self, correlation_id: &str, operation_name: &str, success: bool) {
        self.debug(&format!("Completed operation: {} (success: {})", operation_name, success))
            .correlation_id(correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "end")
            .field("success", success)
            .log()
            .await;

        let mut context = self.context.write().await;
        if context.current_correlation_id.as_deref() == Some(correlation_id) {
            context.current_correlation_id = None;
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    /// Convenience methods for different log levels
    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Write log entry to stderr
    async fn write_entry(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry.fields.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }
        if entry.correlation_id.is_none() {
            entry.correlation_id = context.current_correlation_id.clone();
        }
        for (key, value) in &context.context_fields {
            entry.fields.insert(key.clone(), value.clone());
        }
        drop(context);

        let output = self.format_entry(&entry);
        let _ = writeln!(io::stderr(), "{}", output);
    }

    fn format_entry(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
            LogFormat::Compact => self.format_compact(entry),
        }
    }

    /// Format log entry for console output
    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}",
            timestamp,
            formatted_level,
            entry.logger,
            entry.message
        );

        if let Some(correlation_id) = &entry.correlation_id {
            let short: String = correlation_id.chars().take(8).collect();
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields_str: Vec<String> = entry.fields.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields_str.sort();
            output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    /// Format log entry as JSON
    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => serde_json::json!({
                "error": "Failed to serialize log entry",
                "message": entry.message,
            })
            .to_string(),
        }
    }

    /// Format log entry in compact format
    fn format_compact(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S");
        format!("{} {} {}: {}",
            timestamp,
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
                location: None,
            },
        }
    }

    /// Add a correlation ID
    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add location information
    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Add run summary fields
    pub fn run_summary(self, run: &RunResult) -> Self {
        let builder = self
            .field("protocol", run.protocol.to_string())
            .field("sent", run.sent)
            .field("received", run.received)
            .field("loss_pct", run.loss_pct());

        match &run.statistics {
            Some(stats) => builder
                .field("p50_ms", stats.p50_ms)
                .field("p99_ms", stats.p99_ms),
            None => builder,
        }
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for the RTT prober
pub struct ProbeLogger {
    logger: Logger,
}

impl ProbeLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("PROBE".to_string(), config),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Log a connection attempt
    pub async fn log_connection(&self, target: &str, attempt: usize, error: Option<&str>) {
        match error {
            None => {
                self.logger.debug(&format!("Connected to {} (attempt {})", target, attempt))
                    .field("target", target)
                    .field("attempt", attempt)
                    .field("success", true)
                    .log()
                    .await;
            }
            Some(err) => {
                self.logger.debug(&format!("Connect attempt {} to {} failed: {}", attempt, target, err))
                    .field("target", target)
                    .field("attempt", attempt)
                    .field("success", false)
                    .field("error", err)
                    .log()
                    .await;
            }
        }
    }

    /// Log a reconnect after a lost probe
    pub async fn log_reconnect(&self, target: &str, after_seq: u32, reason: &str) {
        self.logger.info(&format!("Reconnecting to {} after seq={} ({})", target, after_seq, reason))
            .field("target", target)
            .field("seq", after_seq)
            .field("reason", reason)
            .log()
            .await;
    }

    /// Log a single probe outcome
    pub async fn log_probe(&self, protocol: Protocol, seq: u32, rtt_ms: Option<f64>) {
        let message = match rtt_ms {
            Some(rtt) => format!("{} seq={} rtt_ms={:.3}", protocol, seq, rtt),
            None => format!("{} seq={} timeout", protocol, seq),
        };

        self.logger.debug(&message)
            .field("protocol", protocol.to_string())
            .field("seq", seq)
            .field("rtt_ms", rtt_ms)
            .field("success", rtt_ms.is_some())
            .log()
            .await;
    }

    /// Log a discarded stale reply
    pub async fn log_stale_reply(&self, seq: u32, len: usize) {
        self.logger.debug(&format!("Discarded stale reply while waiting for seq={}", seq))
            .field("seq", seq)
            .field("reply_len", len)
            .log()
            .await;
    }

    /// Log the end of a run
    pub async fn log_run_complete(&self, run: &RunResult) {
        self.logger.info(&format!(
            "{} run complete: sent={} received={} loss_pct={:.1}",
            run.protocol, run.sent, run.received, run.loss_pct()
        ))
            .run_summary(run)
            .log()
            .await;
    }
}

/// Logger for the echo responders
pub struct ResponderLogger {
    logger: Logger,
    quiet: bool,
}

impl ResponderLogger {
    /// Startup and per-echo lines are shown at INFO; `quiet` drops the per-echo ones
    pub fn new(config: &Config, quiet: bool) -> Self {
        let mut logger = Logger::with_config("ECHO".to_string(), config);
        logger.lower_level_to(LogLevel::Info);
        Self { logger, quiet }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub async fn log_listening(&self, protocol: Protocol, addr: SocketAddr) {
        self.logger.info(&format!("{} echo listening on {}", protocol, addr))
            .field("protocol", protocol.to_string())
            .field("addr", addr.to_string())
            .log()
            .await;
    }

    pub async fn log_client(&self, peer: SocketAddr) {
        if self.quiet {
            return;
        }
        self.logger.info(&format!("Client connected: {}", peer))
            .field("peer", peer.to_string())
            .log()
            .await;
    }

    pub async fn log_echo(&self, protocol: Protocol, peer: SocketAddr, len: usize) {
        if self.quiet {
            return;
        }
        self.logger.info(&format!("{} echo {} bytes to {}", protocol, len, peer))
            .field("protocol", protocol.to_string())
            .field("peer", peer.to_string())
            .field("len", len)
            .log()
            .await;
    }

    /// Log the end of a TCP session
    pub async fn log_session_end(&self, peer: SocketAddr, frames: u64, error: Option<&str>) {
        match error {
            Some(err) => {
                self.logger.warn(&format!("Session with {} ended with error after {} frames: {}", peer, frames, err))
                    .field("peer", peer.to_string())
                    .field("frames", frames)
                    .field("error", err)
                    .log()
                    .await;
            }
            None if !self.quiet => {
                self.logger.debug(&format!("Session with {} closed after {} frames", peer, frames))
                    .field("peer", peer.to_string())
                    .field("frames", frames)
                    .log()
                    .await;
            }
            None => {}
        }
    }

    pub async fn log_shutdown(&self, protocol: Protocol) {
        self.logger.info(&format!("{} echo shutting down", protocol))
            .field("protocol", protocol.to_string())
            .log()
            .await;
    }
}

/// Logger for the sweep aggregator
pub struct SweepLogger {
    logger: Logger,
}

impl SweepLogger {
    /// Trial output is shown at INFO even without `--verbose`
    pub fn new(config: &Config) -> Self {
        let mut logger = Logger::with_config("SWEEP".to_string(), config);
        logger.lower_level_to(LogLevel::Info);
        Self { logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Echo the raw trial output under its `LOSS=<level>%` header
    pub async fn log_trial_output(&self, loss_pct: f64, output: &str) {
        let mut message = format!("LOSS={}%", loss_pct);
        for line in output.lines() {
            message.push('\n');
            message.push_str(line);
        }

        self.logger.info(&message)
            .field("loss_pct", loss_pct)
            .log()
            .await;
    }

    /// Log an accumulated sweep point
    pub async fn log_point(&self, loss_pct: f64, udp_p99_ms: f64, tcp_p99_ms: f64) {
        self.logger.debug(&format!(
            "loss={}% udp_p99={:.3}ms tcp_p99={:.3}ms",
            loss_pct, udp_p99_ms, tcp_p99_ms
        ))
            .field("loss_pct", loss_pct)
            .field("udp_p99_ms", udp_p99_ms)
            .field("tcp_p99_ms", tcp_p99_ms)
            .log()
            .await;
    }
}

/// Error event logger with enhanced context
pub struct ErrorEventLogger {
    logger: Logger,
}

impl ErrorEventLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("ERR".to_string(), config),
        }
    }

    /// Log an application error with full context
    pub async fn log_error(&self, error: &AppError, context: Option<&str>, correlation_id: Option<&str>) {
        let message = if let Some(ctx) = context {
            format!("{}: {}", ctx, error)
        } else {
            error.to_string()
        };

        let mut builder = self.logger.error(&message)
            .error_info(error);

        if let Some(id) = correlation_id {
            builder = builder.correlation_id(id);
        }

        if let Some(ctx) = context {
            builder = builder.field("context", ctx);
        }

        builder.log().await;
    }
}

/// Global logger factory and management
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub async fn create_probe_logger(&self) -> ProbeLogger {
        let logger = ProbeLogger::new(&self.config);
        logger.logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub async fn create_responder_logger(&self, quiet: bool) -> ResponderLogger {
        let logger = ResponderLogger::new(&self.config, quiet);
        logger.logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub async fn create_sweep_logger(&self) -> SweepLogger {
        let logger = SweepLogger::new(&self.config);
        logger.logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub fn create_error_logger(&self) -> ErrorEventLogger {
        ErrorEventLogger::new(&self.config)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Warn with the call site attached
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Probe;
    use std::str::FromStr;

    fn entry(level: LogLevel, message: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            logger: "TEST".to_string(),
            correlation_id: Some("0123456789abcdef".to_string()),
            fields: {
                let mut map = HashMap::new();
                map.insert("key".to_string(), serde_json::Value::String("value".to_string()));
                map
            },
            location: None,
        }
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Fatal);
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("Compact").unwrap(), LogFormat::Compact);
        assert!(matches!(LogFormat::from_str("xml"), Err(AppError::Config(_))));
    }

    #[test]
    fn test_logger_with_config() {
        let config = Config {
            debug: true,
            verbose: true,
            enable_color: false,
            log_format: LogFormat::Compact,
        };

        let logger = Logger::with_config("TEST".to_string(), &config);
        assert_eq!(logger.min_level, LogLevel::Debug);
        assert!(!logger.use_color);
        assert!(logger.include_location);
        assert_eq!(logger.format, LogFormat::Compact);

        let quiet = Logger::with_config("TEST".to_string(), &Config::default());
        assert_eq!(quiet.min_level, LogLevel::Warn);
    }

    #[test]
    fn test_lower_level_never_raises() {
        let mut logger = Logger::new("TEST".to_string());
        logger.set_level(LogLevel::Debug);
        logger.lower_level_to(LogLevel::Info);
        assert_eq!(logger.min_level, LogLevel::Debug);

        logger.set_level(LogLevel::Warn);
        logger.lower_level_to(LogLevel::Info);
        assert!(logger.would_log(LogLevel::Info));
        assert!(!logger.would_log(LogLevel::Debug));
    }

    #[test]
    fn test_domain_logger_levels() {
        let config = Config::default();
        let responder = ResponderLogger::new(&config, true);
        assert!(responder.logger().would_log(LogLevel::Info));
        assert!(responder.is_quiet());

        let sweep = SweepLogger::new(&config);
        assert!(sweep.logger().would_log(LogLevel::Info));

        let probe = ProbeLogger::new(&config);
        assert!(!probe.logger().would_log(LogLevel::Info));
    }

    #[tokio::test]
    async fn test_session_and_context_fields() {
        let logger = Logger::new("TEST".to_string());
        logger.set_session_id("test-session".to_string()).await;
        logger.add_context_field("protocol".to_string(), "udp").await;

        let context = logger.context.read().await;
        assert_eq!(context.session_id.as_deref(), Some("test-session"));
        assert!(context.context_fields.contains_key("protocol"));
    }

    #[tokio::test]
    async fn test_operation_correlation() {
        let logger = Logger::new("TEST".to_string());
        let correlation_id = logger.start_operation("sweep").await;
        assert!(!correlation_id.is_empty());
        assert_eq!(
            logger.context.read().await.current_correlation_id.as_deref(),
            Some(correlation_id.as_str())
        );

        logger.end_operation(&correlation_id, "sweep", true).await;
        assert!(logger.context.read().await.current_correlation_id.is_none());
    }

    #[test]
    fn test_log_formats() {
        let entry = entry(LogLevel::Info, "Test message");
        let mut logger = Logger::new("TEST".to_string());
        logger.set_color(false);

        let console_output = logger.format_console(&entry);
        assert!(console_output.contains(" INFO [TEST] Test message"));
        assert!(console_output.contains("[01234567]"));
        assert!(console_output.contains("key=\"value\""));

        let json_output = logger.format_json(&entry);
        let value: serde_json::Value = serde_json::from_str(&json_output).unwrap();
        assert_eq!(value["message"], "Test message");
        assert_eq!(value["level"], "Info");

        let compact_output = logger.format_compact(&entry);
        assert!(compact_output.contains(" I TEST: Test message"));
    }

    #[tokio::test]
    async fn test_domain_loggers_do_not_panic() {
        let config = Config {
            debug: true,
            ..Config::default()
        };
        let factory = LoggerFactory::new(config);

        let probe_logger = factory.create_probe_logger().await;
        probe_logger.log_connection("127.0.0.1:9000", 1, Some("refused")).await;
        probe_logger.log_probe(Protocol::Udp, 1, Some(0.25)).await;
        probe_logger.log_probe(Protocol::Tcp, 2, None).await;

        let mut run = RunResult::new(Protocol::Udp);
        run.add_probe(Probe::success(1, 8, Utc::now(), 0.25));
        let run = run.finish().unwrap();
        probe_logger.log_run_complete(&run).await;

        let sweep_logger = factory.create_sweep_logger().await;
        sweep_logger.log_trial_output(1.5, "UDP\nsent=1 received=1 loss_pct=0.0").await;

        let err_logger = factory.create_error_logger();
        err_logger.log_error(&AppError::no_samples("all lost"), Some("udp run"), None).await;

        assert!(!factory.session_id().is_empty());
    }

    #[test]
    fn test_log_entry_serialization() {
        let original = entry(LogLevel::Warn, "Test");
        let json = serde_json::to_string(&original).unwrap();
        let deserialized: LogEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.level, LogLevel::Warn);
        assert_eq!(deserialized.message, "Test");
        assert_eq!(deserialized.logger, "TEST");
    }
}
