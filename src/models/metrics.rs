//! Probe records, run results and RTT statistics

use crate::error::{AppError, Result};
use crate::types::{ProbeOutcome, Protocol};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timed request/response exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Probe {
    /// Sequence number, 1-based and monotonic within a run
    pub seq: u32,

    /// Payload length in bytes
    pub payload_len: usize,

    /// Wall-clock time the probe was sent (for reporting only; RTT uses a monotonic clock)
    pub sent_at: DateTime<Utc>,

    /// What happened to the probe
    pub outcome: ProbeOutcome,
}

impl Probe {
    pub fn success(seq: u32, payload_len: usize, sent_at: DateTime<Utc>, rtt_ms: f64) -> Self {
        Self {
            seq,
            payload_len,
            sent_at,
            outcome: ProbeOutcome::Success { rtt_ms },
        }
    }

    pub fn timeout(seq: u32, payload_len: usize, sent_at: DateTime<Utc>) -> Self {
        Self {
            seq,
            payload_len,
            sent_at,
            outcome: ProbeOutcome::Timeout,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Outcome of one full probe sequence against one protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Transport that was probed
    pub protocol: Protocol,

    /// Number of probes sent (the configured count)
    pub sent: u32,

    /// Number of probes echoed back intact
    pub received: u32,

    /// Individual probe records in send order
    pub probes: Vec<Probe>,

    /// Statistics over the successful RTTs; `None` until calculated or when nothing came back
    pub statistics: Option<Statistics>,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run completed
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunResult {
    /// Create an empty run result
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            sent: 0,
            received: 0,
            probes: Vec::new(),
            statistics: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Record a probe outcome
    pub fn add_probe(&mut self, probe: Probe) {
        if probe.is_successful() {
            self.received += 1;
        }
        self.sent += 1;
        self.probes.push(probe);
    }

    /// Number of lost probes
    pub fn lost(&self) -> u32 {
        self.sent - self.received
    }

    /// `(sent - received) / sent * 100`, or 0 for an empty run
    pub fn loss_pct(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            (self.lost() as f64 / self.sent as f64) * 100.0
        }
    }

    /// Successful RTT samples in send order
    pub fn rtt_samples(&self) -> Vec<f64> {
        self.probes.iter().filter_map(|p| p.outcome.rtt_ms()).collect()
    }

    /// Mark the run complete and compute statistics when any probe succeeded
    pub fn seal(mut self) -> Self {
        self.completed_at = Some(Utc::now());
        self.statistics = Statistics::from_samples(&self.rtt_samples()).ok();
        self
    }

    /// Seal the run, failing when no probe succeeded
    pub fn finish(self) -> Result<Self> {
        let run = self.seal();

        match run.statistics {
            Some(_) => Ok(run),
            None => Err(AppError::no_samples(format!(
                "{} run: sent={} received={} loss_pct={:.1}",
                run.protocol,
                run.sent,
                run.received,
                run.loss_pct()
            ))),
        }
    }
}

/// Summary of the successful RTT samples of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Minimum RTT (milliseconds)
    pub min_ms: f64,

    /// Arithmetic mean RTT (milliseconds)
    pub avg_ms: f64,

    /// Maximum RTT (milliseconds)
    pub max_ms: f64,

    /// Median RTT (milliseconds)
    pub p50_ms: f64,

    /// 95th percentile RTT (milliseconds)
    pub p95_ms: f64,

    /// 99th percentile RTT (milliseconds)
    pub p99_ms: f64,

    /// Number of samples the statistics were computed from
    pub sample_count: usize,
}

impl Statistics {
    /// Calculate statistics from successful RTT samples
    pub fn from_samples(samples: &[f64]) -> Result<Self> {
        crate::stats::summarize(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(outcomes: &[Option<f64>]) -> RunResult {
        let mut run = RunResult::new(Protocol::Tcp);
        for (i, outcome) in outcomes.iter().enumerate() {
            let seq = i as u32 + 1;
            let probe = match outcome {
                Some(rtt) => Probe::success(seq, 8, Utc::now(), *rtt),
                None => Probe::timeout(seq, 8, Utc::now()),
            };
            run.add_probe(probe);
        }
        run
    }

    #[test]
    fn test_loss_accounting() {
        let mut outcomes = vec![Some(1.0); 10];
        outcomes[2] = None;
        outcomes[5] = None;
        outcomes[9] = None;

        let run = run_with(&outcomes).finish().unwrap();
        assert_eq!(run.sent, 10);
        assert_eq!(run.received, 7);
        assert_eq!(run.lost(), 3);
        assert_eq!(run.loss_pct(), 30.0);
        assert_eq!(run.statistics.as_ref().unwrap().sample_count, 7);
    }

    #[test]
    fn test_zero_success_is_failure() {
        let result = run_with(&[None, None, None]).finish();
        match result {
            Err(AppError::NoSamples(msg)) => {
                assert!(msg.contains("received=0"));
                assert!(msg.contains("loss_pct=100.0"));
            }
            other => panic!("expected NoSamples, got {:?}", other),
        }
    }

    #[test]
    fn test_samples_only_from_successes() {
        let run = run_with(&[Some(2.0), None, Some(4.0)]);
        assert_eq!(run.rtt_samples(), vec![2.0, 4.0]);

        let run = run.finish().unwrap();
        let stats = run.statistics.unwrap();
        assert_eq!(stats.avg_ms, 3.0);
        assert!(run.completed_at.is_some());
    }

    #[test]
    fn test_seal_keeps_zero_sample_run() {
        let run = run_with(&[None, None]).seal();
        assert!(run.statistics.is_none());
        assert!(run.completed_at.is_some());
        assert_eq!(run.loss_pct(), 100.0);
    }

    #[test]
    fn test_empty_run_loss() {
        let run = RunResult::new(Protocol::Udp);
        assert_eq!(run.loss_pct(), 0.0);
        assert!(run.statistics.is_none());
    }
}
