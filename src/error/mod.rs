//! Error handling for the loss/latency prober

pub mod recovery;

pub use recovery::{Backoff, ConnectPolicy, Sleeper, TokioSleeper};

use thiserror::Error;

/// Custom error types for the loss/latency prober
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors (payload sizes, probe counts, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Connection establishment failed after the retry policy was exhausted
    #[error("Connect error: {0}")]
    Connect(String),

    /// Listening socket could not be bound
    #[error("Bind error: {0}")]
    Bind(String),

    /// I/O errors (sockets, files)
    #[error("I/O error: {0}")]
    Io(String),

    /// A probe run produced no successful samples
    #[error("No samples: {0}")]
    NoSamples(String),

    /// Statistics calculation errors
    #[error("Statistics error: {0}")]
    Statistics(String),

    /// Parsing errors (statistics reports, loss levels, numbers)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Measurement harness exited unsuccessfully
    #[error("Harness error (exit code {code}): {message}")]
    Harness { code: i32, message: String },

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new connect error
    pub fn connect<S: Into<String>>(message: S) -> Self {
        Self::Connect(message.into())
    }

    /// Create a new bind error
    pub fn bind<S: Into<String>>(message: S) -> Self {
        Self::Bind(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new no-samples error
    pub fn no_samples<S: Into<String>>(message: S) -> Self {
        Self::NoSamples(message.into())
    }

    /// Create a new statistics error
    pub fn statistics<S: Into<String>>(message: S) -> Self {
        Self::Statistics(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new harness error
    pub fn harness<S: Into<String>>(code: i32, message: S) -> Self {
        Self::Harness {
            code,
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Connect(_) => "CONNECT",
            Self::Bind(_) => "BIND",
            Self::Io(_) => "IO",
            Self::NoSamples(_) => "NO_SAMPLES",
            Self::Statistics(_) => "STATS",
            Self::Parse(_) => "PARSE",
            Self::Harness { .. } => "HARNESS",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is transient (a retry may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Connect(_) | Self::Io(_) => true,
            Self::Config(_) | Self::Validation(_) | Self::Bind(_) | Self::Parse(_) => false,
            Self::NoSamples(_) | Self::Statistics(_) | Self::Harness { .. } | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file, LOSSLAT_* variables or command line arguments.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check probe count, payload size and timeout values.", msg)
            }
            Self::Connect(msg) => {
                format!("Could not reach the echo responder: {}\n\nSuggestion: Make sure the tcp-server is running on the target host and port.", msg)
            }
            Self::Bind(msg) => {
                format!("Could not bind the listening socket: {}\n\nSuggestion: The port may already be in use; stop the other process or pick another --port.", msg)
            }
            Self::Io(msg) => {
                format!("I/O operation failed: {}\n\nSuggestion: Check socket permissions and file paths.", msg)
            }
            Self::NoSamples(msg) => {
                format!("Every probe was lost: {}\n\nSuggestion: Increase --timeout or lower the loss level; no statistics can be computed from zero samples.", msg)
            }
            Self::Statistics(msg) => {
                format!("Statistics calculation failed: {}\n\nSuggestion: This indicates an empty or invalid sample set.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the harness output format (UDP/TCP marker lines followed by rtt_ms lines).", msg)
            }
            Self::Harness { code, message } => {
                format!("Measurement harness failed with exit code {}: {}\n\nSuggestion: Run the harness command by hand to see its full output.", code, message)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) => 1,  // Invalid configuration/usage
            Self::Connect(_) => 2,  // Responder unreachable
            Self::Bind(_) => 3,  // Startup resource failure
            Self::Io(_) => 5,
            Self::NoSamples(_) | Self::Statistics(_) => 6,  // Run-fatal
            Self::Parse(_) => 7,  // Sweep parse-fatal
            Self::Harness { .. } => 8,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Connect(_) | Self::Bind(_) | Self::Io(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::NoSamples(_) | Self::Statistics(_) | Self::Harness { .. } => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON error: {}", error))
    }
}

impl From<regex::Error> for AppError {
    fn from(error: regex::Error) -> Self {
        Self::internal(format!("Invalid pattern: {}", error))
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::net::AddrParseError> for AppError {
    fn from(error: std::net::AddrParseError) -> Self {
        Self::parse(format!("IP address parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error, keeping its category
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let context = f();
            match e.into() {
                AppError::Config(m) => AppError::Config(format!("{}: {}", context, m)),
                AppError::Validation(m) => AppError::Validation(format!("{}: {}", context, m)),
                AppError::Connect(m) => AppError::Connect(format!("{}: {}", context, m)),
                AppError::Bind(m) => AppError::Bind(format!("{}: {}", context, m)),
                AppError::Io(m) => AppError::Io(format!("{}: {}", context, m)),
                AppError::NoSamples(m) => AppError::NoSamples(format!("{}: {}", context, m)),
                AppError::Statistics(m) => AppError::Statistics(format!("{}: {}", context, m)),
                AppError::Parse(m) => AppError::Parse(format!("{}: {}", context, m)),
                AppError::Harness { code, message } => AppError::Harness {
                    code,
                    message: format!("{}: {}", context, message),
                },
                AppError::Internal(m) => AppError::Internal(format!("{}: {}", context, m)),
            }
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Error reporter for user feedback on stderr
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());

            if error.is_recoverable() {
                eprintln!();
                if self.use_color {
                    use colored::Colorize;
                    eprintln!("{}", "This error might be temporary. You can try running the command again.".green());
                } else {
                    eprintln!("This error might be temporary. You can try running the command again.");
                }
            }
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(!config_error.is_recoverable());
        assert_eq!(config_error.exit_code(), 1);

        let connect_error = AppError::connect("Connection refused");
        assert_eq!(connect_error.category(), "CONNECT");
        assert!(connect_error.is_recoverable());
        assert_eq!(connect_error.exit_code(), 2);
    }

    #[test]
    fn test_error_display() {
        let error = AppError::harness(3, "mininet crashed");
        let display = error.to_string();
        assert!(display.contains("exit code 3"));
        assert!(display.contains("mininet crashed"));
    }

    #[test]
    fn test_error_categories() {
        let errors = [
            AppError::config("config"),
            AppError::validation("validation"),
            AppError::connect("connect"),
            AppError::bind("bind"),
            AppError::io("io"),
            AppError::no_samples("none"),
            AppError::statistics("stats"),
            AppError::parse("parse"),
            AppError::harness(1, "harness"),
            AppError::internal("internal"),
        ];

        let expected_categories = [
            "CONFIG", "VALIDATION", "CONNECT", "BIND", "IO",
            "NO_SAMPLES", "STATS", "PARSE", "HARNESS", "INTERNAL",
        ];

        for (error, expected) in errors.iter().zip(expected_categories.iter()) {
            assert_eq!(error.category(), *expected);
        }
    }

    #[test]
    fn test_fatal_exit_codes_are_distinct_from_success() {
        assert_eq!(AppError::bind("test").exit_code(), 3);
        assert_eq!(AppError::no_samples("test").exit_code(), 6);
        assert_eq!(AppError::parse("test").exit_code(), 7);
        assert_eq!(AppError::harness(4, "test").exit_code(), 8);
        assert_eq!(AppError::internal("test").exit_code(), 99);

        let no_samples = AppError::no_samples("x").exit_code();
        let parse = AppError::parse("x").exit_code();
        assert_ne!(no_samples, 0);
        assert_ne!(parse, 0);
        assert_ne!(no_samples, parse);
    }

    #[test]
    fn test_user_friendly_messages() {
        let error = AppError::bind("address in use");
        let message = error.user_friendly_message();
        assert!(message.contains("bind"));
        assert!(message.contains("Suggestion:"));
        assert!(message.contains("address in use"));
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let app_error: AppError = io_error.into();
        assert_eq!(app_error.category(), "IO");

        let parse_error = "abc".parse::<f64>().unwrap_err();
        let app_error: AppError = parse_error.into();
        assert_eq!(app_error.category(), "PARSE");

        let addr_error = "not-an-ip".parse::<std::net::IpAddr>().unwrap_err();
        let app_error: AppError = addr_error.into();
        assert_eq!(app_error.category(), "PARSE");
    }

    #[test]
    fn test_error_context_keeps_category() {
        let result: Result<i32> = Err(AppError::connect("refused"));
        let error = result.context("While opening probe connection").unwrap_err();

        assert_eq!(error.category(), "CONNECT");
        assert!(error.to_string().contains("While opening probe connection"));
        assert!(error.to_string().contains("refused"));
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::parse("no p99");
        let formatted_no_color = error.format_for_console(false);
        assert_eq!(formatted_no_color, "[PARSE] Parsing error: no p99");

        let formatted_color = error.format_for_console(true);
        assert!(formatted_color.contains("PARSE"));
    }

    #[test]
    fn test_error_reporter_default() {
        let reporter = ErrorReporter::default();
        assert!(reporter.use_color);
        assert!(!reporter.verbose);
        reporter.report_error(&AppError::no_samples("all probes lost"));
    }
}
