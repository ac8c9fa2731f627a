//! Measurement harness
//!
//! A harness runs one trial at a given loss level and hands back the textual
//! report of both protocol runs. The sweep only sees this boundary, so the
//! network emulation can live in an external program or be skipped entirely
//! by the in-process loopback harness.

pub mod command;
pub mod loopback;

pub use command::CommandHarness;
pub use loopback::LoopbackHarness;

use crate::error::Result;
use crate::models::TrialSettings;
use crate::types::ProtocolSelection;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One trial to run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRequest {
    /// Packet loss in percent applied to the emulated link
    pub loss_pct: f64,

    /// Protocols to probe, UDP first
    pub protocols: ProtocolSelection,

    /// Probe settings
    pub settings: TrialSettings,

    /// Ask the probers for per-probe lines
    pub client_verbose: bool,
}

impl TrialRequest {
    /// Both protocols, no per-probe lines
    pub fn new(loss_pct: f64, settings: TrialSettings) -> Self {
        Self {
            loss_pct,
            protocols: ProtocolSelection::Both,
            settings,
            client_verbose: false,
        }
    }
}

/// Captured result of a trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutput {
    /// Process-style exit status; 0 means every requested run completed
    pub exit_code: i32,

    /// Combined report text
    pub output: String,
}

impl TrialOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a trial and reports its textual output
#[async_trait]
pub trait MeasurementHarness: Send + Sync {
    /// Short description used in logs
    fn name(&self) -> &str;

    async fn run_trial(&self, request: &TrialRequest) -> Result<TrialOutput>;
}
