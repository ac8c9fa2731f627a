//! RTT prober
//!
//! Sends `count` fixed-size probes to an echo responder, one at a time, and
//! times each round trip with a monotonic clock. A probe that is not echoed
//! back intact within the timeout is a loss; over TCP a loss also replaces
//! the connection before the next probe.

pub mod tcp;
pub mod udp;

pub use tcp::TcpProbeSession;
pub use udp::UdpProbeSession;

use crate::error::{AppError, Result, Sleeper, TokioSleeper};
use crate::logging::ProbeLogger;
use crate::models::{Probe, ProbeConfig, RunResult};
use crate::types::Protocol;
use async_trait::async_trait;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Build the payload for `seq`: its decimal form left-padded with `'0'` to `size` bytes
pub fn build_payload(seq: u32, size: usize) -> Result<Vec<u8>> {
    let text = seq.to_string();
    if text.len() > size {
        return Err(AppError::validation(format!(
            "payload size {} too small for sequence number {}",
            size, seq
        )));
    }
    Ok(format!("{:0>width$}", text, width = size).into_bytes())
}

/// Why a probe was not counted as a success
#[derive(Debug, Clone, PartialEq)]
pub enum LossReason {
    /// No complete reply within the timeout
    Timeout,
    /// Peer closed the connection before the reply was complete
    Closed,
    /// Reply differed from the payload
    Mismatch,
    /// Socket error during the exchange
    Io(String),
}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossReason::Timeout => write!(f, "timeout"),
            LossReason::Closed => write!(f, "connection closed"),
            LossReason::Mismatch => write!(f, "echo mismatch"),
            LossReason::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

/// Result of one request/response exchange
#[derive(Debug, Clone, PartialEq)]
pub enum Exchange {
    Echoed,
    Lost(LossReason),
}

/// One transport's way of exchanging a probe
#[async_trait]
pub trait ProbeTransport: Send {
    /// Send `payload` and wait for its echo, bounded by the probe timeout
    async fn exchange(&mut self, seq: u32, payload: &[u8]) -> Exchange;

    /// Restore the transport after a lost probe; an error ends the run
    async fn recover(&mut self, seq: u32, reason: &LossReason) -> Result<()>;
}

/// Sequential RTT prober for one responder
pub struct RttProber {
    config: ProbeConfig,
    logger: ProbeLogger,
    sleeper: Arc<dyn Sleeper>,
}

impl RttProber {
    /// Create a prober; the configuration is validated before anything is sent
    pub fn new(config: ProbeConfig, logger: ProbeLogger) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            logger,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace the sleeper used for probe intervals and connect backoff
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Probe and require at least one success
    pub async fn run(&self, protocol: Protocol) -> Result<RunResult> {
        self.collect(protocol).await?.finish()
    }

    /// Probe and return the sealed run, even when every probe was lost
    pub async fn collect(&self, protocol: Protocol) -> Result<RunResult> {
        self.logger
            .logger()
            .add_context_field("target".to_string(), self.config.target())
            .await;

        match protocol {
            Protocol::Udp => {
                let mut session = UdpProbeSession::connect(&self.config, &self.logger).await?;
                self.drive(protocol, &mut session).await
            }
            Protocol::Tcp => {
                let mut session =
                    TcpProbeSession::connect(&self.config, self.sleeper.as_ref(), &self.logger).await?;
                self.drive(protocol, &mut session).await
            }
        }
    }

    /// The probe loop shared by both transports
    pub async fn drive<T: ProbeTransport>(&self, protocol: Protocol, transport: &mut T) -> Result<RunResult> {
        let size = self.config.payload_size;
        let interval = self.config.interval();
        let mut run = RunResult::new(protocol);

        for seq in 1..=self.config.count {
            let payload = build_payload(seq, size)?;
            let sent_at = Utc::now();
            let start = Instant::now();

            let probe = match transport.exchange(seq, &payload).await {
                Exchange::Echoed => {
                    let rtt_ms = start.elapsed().as_secs_f64() * 1000.0;
                    Probe::success(seq, size, sent_at, rtt_ms)
                }
                Exchange::Lost(reason) => {
                    transport.recover(seq, &reason).await?;
                    Probe::timeout(seq, size, sent_at)
                }
            };

            self.logger.log_probe(protocol, seq, probe.outcome.rtt_ms()).await;
            run.add_probe(probe);

            if !interval.is_zero() {
                self.sleeper.sleep(interval).await;
            }
        }

        let run = run.seal();
        self.logger.log_run_complete(&run).await;
        Ok(run)
    }
}
