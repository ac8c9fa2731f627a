//! Textual statistics report
//!
//! ```text
//! UDP
//! sent=200 received=197 loss_pct=1.5
//! rtt_ms min=0.081 avg=0.203 p50=0.151 p95=0.402 p99=1.013 max=2.310
//! ```
//!
//! The sweep reads the p99 values back out of this text, so the layout is a
//! contract with any external harness printing the same report.

use crate::error::Result;
use crate::models::{Probe, RunResult, Statistics};
use crate::types::{ProbeOutcome, Protocol};
use regex::Regex;
use std::collections::HashMap;

/// `seq=<n> rtt_ms=<f:3>` or `seq=<n> timeout`
pub fn render_probe_line(probe: &Probe) -> String {
    match probe.outcome {
        ProbeOutcome::Success { rtt_ms } => format!("seq={} rtt_ms={:.3}", probe.seq, rtt_ms),
        ProbeOutcome::Timeout => format!("seq={} timeout", probe.seq),
    }
}

pub fn render_counts(run: &RunResult) -> String {
    format!("sent={} received={} loss_pct={:.1}", run.sent, run.received, run.loss_pct())
}

pub fn render_rtt_line(stats: &Statistics) -> String {
    format!(
        "rtt_ms min={:.3} avg={:.3} p50={:.3} p95={:.3} p99={:.3} max={:.3}",
        stats.min_ms, stats.avg_ms, stats.p50_ms, stats.p95_ms, stats.p99_ms, stats.max_ms
    )
}

/// Report of one run; the `rtt_ms` line is absent when nothing came back
pub fn render_run(run: &RunResult, verbose: bool) -> String {
    let mut lines = Vec::new();
    if verbose {
        lines.extend(run.probes.iter().map(render_probe_line));
    }
    lines.push(render_counts(run));
    if let Some(stats) = &run.statistics {
        lines.push(render_rtt_line(stats));
    }
    lines.join("\n")
}

/// Runs in order, each under its protocol marker line
pub fn render_trial(runs: &[RunResult], verbose: bool) -> String {
    runs.iter()
        .map(|run| format!("{}\n{}", run.protocol.marker(), render_run(run, verbose)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract the p99 of each protocol section.
///
/// A marker line arms its protocol; the first following `rtt_ms` line with a
/// `p99=` value records it and disarms. Sections without one are absent.
pub fn parse_p99(output: &str) -> Result<HashMap<Protocol, f64>> {
    let pattern = Regex::new(r"p99=([0-9.]+)")?;
    let mut values = HashMap::new();
    let mut current = None;

    for line in output.lines().map(str::trim) {
        if let Some(protocol) = marker_protocol(line) {
            current = Some(protocol);
            continue;
        }

        let protocol = match current {
            Some(protocol) if line.starts_with("rtt_ms") => protocol,
            _ => continue,
        };

        let value = pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok());
        if let Some(value) = value {
            values.insert(protocol, value);
            current = None;
        }
    }

    Ok(values)
}

fn marker_protocol(line: &str) -> Option<Protocol> {
    [Protocol::Udp, Protocol::Tcp]
        .into_iter()
        .find(|protocol| protocol.marker() == line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn run(protocol: Protocol, outcomes: &[Option<f64>]) -> RunResult {
        let mut run = RunResult::new(protocol);
        for (i, outcome) in outcomes.iter().enumerate() {
            let seq = i as u32 + 1;
            run.add_probe(match outcome {
                Some(rtt) => Probe::success(seq, 8, Utc::now(), *rtt),
                None => Probe::timeout(seq, 8, Utc::now()),
            });
        }
        run.seal()
    }

    #[test]
    fn test_render_run() {
        let run = run(Protocol::Udp, &[Some(1.0), None, Some(3.0), Some(2.0)]);
        assert_eq!(
            render_run(&run, false),
            "sent=4 received=3 loss_pct=25.0\n\
             rtt_ms min=1.000 avg=2.000 p50=2.000 p95=2.900 p99=2.980 max=3.000"
        );
    }

    #[test]
    fn test_render_run_verbose() {
        let run = run(Protocol::Tcp, &[Some(0.5), None]);
        let report = render_run(&run, true);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "seq=1 rtt_ms=0.500");
        assert_eq!(lines[1], "seq=2 timeout");
        assert_eq!(lines[2], "sent=2 received=1 loss_pct=50.0");
    }

    #[test]
    fn test_zero_received_has_no_rtt_line() {
        let run = run(Protocol::Udp, &[None, None, None]);
        assert_eq!(render_run(&run, false), "sent=3 received=0 loss_pct=100.0");
    }

    #[test]
    fn test_trial_report_round_trips_p99() {
        let runs = vec![
            run(Protocol::Udp, &[Some(1.0), Some(2.0)]),
            run(Protocol::Tcp, &[Some(5.0)]),
        ];
        let report = render_trial(&runs, true);
        assert!(report.starts_with("UDP\n"));

        let p99 = parse_p99(&report).unwrap();
        assert!((p99[&Protocol::Udp] - 1.99).abs() < 1e-9);
        assert_eq!(p99[&Protocol::Tcp], 5.0);
    }

    #[test]
    fn test_parse_p99_ignores_rtt_lines_without_marker() {
        let output = "rtt_ms min=1 p99=9.0\nTCP\nsent=3 received=3 loss_pct=0.0\n  rtt_ms min=1.0 p99=4.250 max=5.0\nrtt_ms p99=7.0";
        let p99 = parse_p99(output).unwrap();
        assert_eq!(p99.len(), 1);
        assert_eq!(p99[&Protocol::Tcp], 4.25);
    }

    #[test]
    fn test_parse_p99_missing_section() {
        let output = "UDP\nsent=5 received=0 loss_pct=100.0\nTCP\nsent=5 received=5 loss_pct=0.0\nrtt_ms p99=1.5";
        let p99 = parse_p99(output).unwrap();
        assert!(!p99.contains_key(&Protocol::Udp));
        assert_eq!(p99[&Protocol::Tcp], 1.5);
    }
}
