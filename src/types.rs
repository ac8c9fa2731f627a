//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Transport used by a responder/prober pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Udp,
    Tcp,
}

impl Protocol {
    /// Marker line used in the textual statistics report
    pub fn marker(&self) -> &'static str {
        match self {
            Protocol::Udp => "UDP",
            Protocol::Tcp => "TCP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

impl FromStr for Protocol {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UDP" => Ok(Protocol::Udp),
            "TCP" => Ok(Protocol::Tcp),
            _ => Err(AppError::parse(format!("Unknown protocol: {}", s))),
        }
    }
}

/// Which protocols a trial runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolSelection {
    Udp,
    Tcp,
    Both,
}

impl ProtocolSelection {
    /// Protocols in report order (UDP first, as the harness runs them)
    pub fn protocols(&self) -> Vec<Protocol> {
        match self {
            ProtocolSelection::Udp => vec![Protocol::Udp],
            ProtocolSelection::Tcp => vec![Protocol::Tcp],
            ProtocolSelection::Both => vec![Protocol::Udp, Protocol::Tcp],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolSelection::Udp => "udp",
            ProtocolSelection::Tcp => "tcp",
            ProtocolSelection::Both => "both",
        }
    }
}

/// Outcome of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProbeOutcome {
    /// Echo received intact
    Success { rtt_ms: f64 },
    /// Timeout, short read or corrupted echo
    Timeout,
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }

    pub fn rtt_ms(&self) -> Option<f64> {
        match self {
            ProbeOutcome::Success { rtt_ms } => Some(*rtt_ms),
            ProbeOutcome::Timeout => None,
        }
    }
}
