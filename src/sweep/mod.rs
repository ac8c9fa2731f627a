//! Loss sweep aggregation
//!
//! Runs one trial per configured loss level, in order, and keeps the UDP and
//! TCP p99 of each. Any failed trial fails the whole sweep; there are no
//! retries and no partial results.

use crate::error::{AppError, Result};
use crate::harness::{MeasurementHarness, TrialRequest};
use crate::logging::SweepLogger;
use crate::models::TrialSettings;
use crate::output::report::parse_p99;
use crate::types::Protocol;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// P99 latency of both protocols at one loss level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub loss_pct: f64,
    pub udp_p99_ms: f64,
    pub tcp_p99_ms: f64,
}

/// Completed sweep, points in configuration order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sweep {
    pub points: Vec<SweepPoint>,
    pub settings: TrialSettings,
    pub harness: String,
    pub generated_at: DateTime<Utc>,
}

impl Sweep {
    pub fn losses(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.loss_pct).collect()
    }

    pub fn udp_series(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.udp_p99_ms).collect()
    }

    pub fn tcp_series(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.tcp_p99_ms).collect()
    }
}

/// Parse a space- or comma-separated list of loss percentages
pub fn parse_loss_levels(text: &str) -> Result<Vec<f64>> {
    let separator = Regex::new(r"[ ,]+")?;
    let levels = separator
        .split(text.trim())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f64>()
                .map_err(|e| AppError::parse(format!("Invalid loss level '{}': {}", part, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    if levels.is_empty() {
        return Err(AppError::parse(format!("No loss levels in '{}'", text)));
    }
    Ok(levels)
}

/// Build a sweep point from one trial report
pub fn extract_point(loss_pct: f64, output: &str) -> Result<SweepPoint> {
    let p99 = parse_p99(output)?;
    let value = |protocol: Protocol| {
        p99.get(&protocol).copied().ok_or_else(|| {
            AppError::parse(format!(
                "failed to parse {} p99 from output at loss {}%",
                protocol, loss_pct
            ))
        })
    };

    Ok(SweepPoint {
        loss_pct,
        udp_p99_ms: value(Protocol::Udp)?,
        tcp_p99_ms: value(Protocol::Tcp)?,
    })
}

/// Drives a harness across loss levels
pub struct SweepAggregator {
    harness: Box<dyn MeasurementHarness>,
    logger: SweepLogger,
}

impl SweepAggregator {
    pub fn new(harness: Box<dyn MeasurementHarness>, logger: SweepLogger) -> Self {
        Self { harness, logger }
    }

    /// Run every level in order; duplicates are run again, not merged
    pub async fn run(&self, loss_levels: &[f64], settings: &TrialSettings) -> Result<Sweep> {
        let logger = self.logger.logger();
        let correlation_id = logger.start_operation("loss_sweep").await;
        let result = self.run_levels(loss_levels, settings).await;
        logger.end_operation(&correlation_id, "loss_sweep", result.is_ok()).await;
        result
    }

    async fn run_levels(&self, loss_levels: &[f64], settings: &TrialSettings) -> Result<Sweep> {
        let mut points = Vec::with_capacity(loss_levels.len());

        for &loss_pct in loss_levels {
            let request = TrialRequest::new(loss_pct, settings.clone());
            let trial = self.harness.run_trial(&request).await?;
            self.logger.log_trial_output(loss_pct, &trial.output).await;

            if !trial.success() {
                return Err(AppError::harness(
                    trial.exit_code,
                    format!("{} failed at loss {}%", self.harness.name(), loss_pct),
                ));
            }

            let point = extract_point(loss_pct, &trial.output)?;
            self.logger.log_point(point.loss_pct, point.udp_p99_ms, point.tcp_p99_ms).await;
            points.push(point);
        }

        Ok(Sweep {
            points,
            settings: settings.clone(),
            harness: self.harness.name().to_string(),
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::TrialOutput;
    use crate::models::Config;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Answers each trial with a report whose p99 values derive from the loss level
    struct FakeHarness {
        requests: Arc<Mutex<Vec<f64>>>,
        fail_at: Option<(f64, i32)>,
        drop_tcp_at: Option<f64>,
    }

    impl FakeHarness {
        fn new() -> (Self, Arc<Mutex<Vec<f64>>>) {
            let requests = Arc::new(Mutex::new(Vec::new()));
            let harness = Self {
                requests: requests.clone(),
                fail_at: None,
                drop_tcp_at: None,
            };
            (harness, requests)
        }
    }

    #[async_trait]
    impl MeasurementHarness for FakeHarness {
        fn name(&self) -> &str {
            "fake"
        }

        async fn run_trial(&self, request: &TrialRequest) -> Result<TrialOutput> {
            let loss = request.loss_pct;
            self.requests.lock().unwrap().push(loss);

            if let Some((level, code)) = self.fail_at {
                if level == loss {
                    return Ok(TrialOutput {
                        exit_code: code,
                        output: "mininet exploded".to_string(),
                    });
                }
            }

            let mut output = format!(
                "UDP\nsent=200 received=200 loss_pct=0.0\nrtt_ms min=0.1 avg=0.2 p50=0.2 p95=0.3 p99={:.3} max=1.0\n",
                loss + 0.5
            );
            output.push_str("TCP\nsent=200 received=200 loss_pct=0.0\n");
            if self.drop_tcp_at != Some(loss) {
                output.push_str(&format!("rtt_ms min=0.1 avg=0.2 p50=0.2 p95=0.3 p99={:.3} max=9.0", loss * 10.0));
            }

            Ok(TrialOutput { exit_code: 0, output })
        }
    }

    fn aggregator(harness: FakeHarness) -> SweepAggregator {
        SweepAggregator::new(Box::new(harness), SweepLogger::new(&Config::default()))
    }

    #[test]
    fn test_parse_loss_levels() {
        assert_eq!(parse_loss_levels("1 3 6").unwrap(), vec![1.0, 3.0, 6.0]);
        assert_eq!(parse_loss_levels(" 0.5, 2 ,,4 ").unwrap(), vec![0.5, 2.0, 4.0]);
        assert_eq!(parse_loss_levels("3,3").unwrap(), vec![3.0, 3.0]);
    }

    #[test]
    fn test_parse_loss_levels_rejects_bad_input() {
        assert_eq!(parse_loss_levels("1 x 3").unwrap_err().category(), "PARSE");
        assert_eq!(parse_loss_levels("  ").unwrap_err().category(), "PARSE");
        assert!(parse_loss_levels(", ,").is_err());
    }

    #[tokio::test]
    async fn test_points_follow_configuration_order() {
        let (harness, requests) = FakeHarness::new();
        let sweep = aggregator(harness)
            .run(&[6.0, 1.0, 3.0, 1.0], &TrialSettings::default())
            .await
            .unwrap();

        assert_eq!(*requests.lock().unwrap(), vec![6.0, 1.0, 3.0, 1.0]);
        assert_eq!(sweep.losses(), vec![6.0, 1.0, 3.0, 1.0]);
        assert_eq!(sweep.udp_series(), vec![6.5, 1.5, 3.5, 1.5]);
        assert_eq!(sweep.tcp_series(), vec![60.0, 10.0, 30.0, 10.0]);
        assert_eq!(sweep.harness, "fake");
    }

    #[tokio::test]
    async fn test_harness_failure_stops_sweep() {
        let (mut harness, requests) = FakeHarness::new();
        harness.fail_at = Some((3.0, 4));

        let error = aggregator(harness)
            .run(&[1.0, 3.0, 6.0], &TrialSettings::default())
            .await
            .unwrap_err();

        match error {
            AppError::Harness { code, .. } => assert_eq!(code, 4),
            other => panic!("expected harness error, got {:?}", other),
        }
        assert_eq!(*requests.lock().unwrap(), vec![1.0, 3.0]);
    }

    #[tokio::test]
    async fn test_missing_p99_is_parse_error() {
        let (mut harness, _) = FakeHarness::new();
        harness.drop_tcp_at = Some(6.0);

        let error = aggregator(harness)
            .run(&[1.0, 6.0], &TrialSettings::default())
            .await
            .unwrap_err();
        assert_eq!(error.exit_code(), 7);
        assert!(error.to_string().contains("TCP p99"));
    }

    #[test]
    fn test_extract_point_tolerates_noise_between_sections() {
        let output = "*** warning\nUDP\nsent=3 received=3 loss_pct=0.0\nrtt_ms p99=0.75\nsome chatter\nTCP\nrtt_ms p99=2.5\n";
        let point = extract_point(2.0, output).unwrap();
        assert_eq!(point, SweepPoint { loss_pct: 2.0, udp_p99_ms: 0.75, tcp_p99_ms: 2.5 });
    }
}
