//! Loss Latency
//!
//! Measures round-trip latency of TCP and UDP echo traffic under packet loss.
//! Echo responders reflect fixed-size probes, the prober times them with
//! timeout and reconnect handling, and the sweep driver repeats trials across
//! loss levels to build a P99 latency curve.

pub mod cli;
pub mod config;
pub mod error;
pub mod harness;
pub mod logging;
pub mod models;
pub mod output;
pub mod prober;
pub mod responder;
pub mod stats;
pub mod sweep;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use harness::{CommandHarness, LoopbackHarness, MeasurementHarness, TrialOutput, TrialRequest};
pub use models::{Config, Probe, ProbeConfig, ResponderConfig, RunResult, Statistics, SweepConfig};
pub use prober::RttProber;
pub use responder::{TcpEchoResponder, UdpEchoResponder};
pub use sweep::{Sweep, SweepAggregator, SweepPoint};
pub use types::{ProbeOutcome, Protocol, ProtocolSelection};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 9000;
    pub const DEFAULT_PROBE_COUNT: u32 = 20;
    pub const DEFAULT_INTERVAL_MS: f64 = 50.0;
    pub const DEFAULT_TIMEOUT_SECS: f64 = 1.0;
    /// Upper bounds keep durations and deadlines representable
    pub const MAX_TIMEOUT_SECS: f64 = 3600.0;
    pub const MAX_INTERVAL_MS: f64 = 3_600_000.0;
    pub const DEFAULT_PAYLOAD_SIZE: usize = 8;
    pub const DEFAULT_UDP_BUF_SIZE: usize = 2048;
    /// Largest UDP payload over IPv4
    pub const MAX_PAYLOAD_SIZE: usize = 65507;

    pub const DEFAULT_CONNECT_ATTEMPTS: usize = 5;
    pub const DEFAULT_CONNECT_DELAY: Duration = Duration::from_millis(50);

    pub const DEFAULT_SWEEP_LOSS_LEVELS: &[f64] = &[1.0, 3.0, 6.0];
    pub const DEFAULT_SWEEP_COUNT: u32 = 200;
    pub const DEFAULT_SWEEP_INTERVAL_MS: f64 = 16.0;
    pub const DEFAULT_HARNESS_CMD: &str = "python3 scripts/mn_latency.py";
    pub const DEFAULT_SWEEP_OUTPUT: &str = "plots/loss_sweep_p99.json";
    /// Mininet prints this warning when it cannot raise rlimits
    pub const DEFAULT_NOISE_MARKER: &str = "Error setting resource limits";

    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
