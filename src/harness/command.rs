//! Harness backed by an external program
//!
//! The program is expected to accept the trial flags of `losslat trial` and
//! print the trial report; the network emulator wrapper shipped with the
//! measurement scripts does exactly that.

use super::{MeasurementHarness, TrialOutput, TrialRequest};
use crate::error::{AppError, ErrorContext, Result};
use crate::models::{HarnessKind, SweepConfig};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Runs one external process per trial and captures stdout and stderr
#[derive(Debug, Clone)]
pub struct CommandHarness {
    program: String,
    args: Vec<String>,
    noise_marker: Option<String>,
}

impl CommandHarness {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            noise_marker: None,
        }
    }

    /// Build from the sweep configuration; a loopback sweep has no command
    pub fn from_config(config: &SweepConfig) -> Result<Self> {
        match &config.harness {
            HarnessKind::Command { program, args } => Ok(Self {
                program: program.clone(),
                args: args.clone(),
                noise_marker: config.noise_marker.clone(),
            }),
            HarnessKind::Loopback => Err(AppError::config("Sweep is configured for the loopback harness")),
        }
    }

    /// Drop output lines containing `marker`
    pub fn with_noise_marker(mut self, marker: impl Into<String>) -> Self {
        self.noise_marker = Some(marker.into());
        self
    }

    /// Full argument list for one trial
    pub fn trial_args(&self, request: &TrialRequest) -> Vec<String> {
        let settings = &request.settings;
        let mut args = self.args.clone();
        args.extend([
            "--loss".to_string(),
            request.loss_pct.to_string(),
            "--count".to_string(),
            settings.count.to_string(),
            "--interval-ms".to_string(),
            settings.interval_ms.to_string(),
            "--timeout".to_string(),
            settings.timeout_secs.to_string(),
            "--port".to_string(),
            settings.port.to_string(),
            "--protocol".to_string(),
            request.protocols.as_str().to_string(),
            "--tcp-size".to_string(),
            settings.tcp_size.to_string(),
        ]);
        if request.client_verbose {
            args.push("--client-verbose".to_string());
        }
        args
    }
}

#[async_trait]
impl MeasurementHarness for CommandHarness {
    fn name(&self) -> &str {
        &self.program
    }

    async fn run_trial(&self, request: &TrialRequest) -> Result<TrialOutput> {
        let output = Command::new(&self.program)
            .args(self.trial_args(request))
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("failed to run harness '{}'", self.program))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&stderr);
        }

        Ok(TrialOutput {
            // killed by a signal
            exit_code: output.status.code().unwrap_or(-1),
            output: strip_noise(&combined, self.noise_marker.as_deref()),
        })
    }
}

/// Remove every line containing `marker`
pub fn strip_noise(output: &str, marker: Option<&str>) -> String {
    match marker {
        Some(marker) if !marker.is_empty() => output
            .lines()
            .filter(|line| !line.contains(marker))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => output.to_string(),
    }
}
