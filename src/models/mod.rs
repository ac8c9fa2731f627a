//! Data models and structures for the loss/latency prober

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::{Config, HarnessKind, ProbeConfig, ResponderConfig, SweepConfig, TrialSettings};
pub use metrics::{Probe, RunResult, Statistics};
