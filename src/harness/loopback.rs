//! In-process harness on the loopback interface
//!
//! Binds both echo responders on 127.0.0.1 and probes them from the same
//! process. No loss is emulated; the requested level is only recorded, which
//! makes this harness a smoke test of the full pipeline.

use super::{MeasurementHarness, TrialOutput, TrialRequest};
use crate::error::{AppError, Result};
use crate::logging::{ProbeLogger, ResponderLogger};
use crate::models::{Config, ResponderConfig, RunResult};
use crate::output::report::render_trial;
use crate::prober::RttProber;
use crate::responder::{TcpEchoResponder, UdpEchoResponder};
use crate::types::Protocol;
use async_trait::async_trait;
use tokio::sync::oneshot;

const LOOPBACK_HOST: &str = "127.0.0.1";

pub struct LoopbackHarness {
    config: Config,
}

impl LoopbackHarness {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the requested protocols in report order and return the sealed runs.
    ///
    /// UDP and TCP responders share the port number; port 0 lets each pick a
    /// free one.
    pub async fn run_protocols(&self, request: &TrialRequest) -> Result<Vec<RunResult>> {
        request.settings.validate()?;

        let mut runs = Vec::new();
        for protocol in request.protocols.protocols() {
            runs.push(self.run_protocol(protocol, request).await?);
        }
        Ok(runs)
    }

    async fn run_protocol(&self, protocol: Protocol, request: &TrialRequest) -> Result<RunResult> {
        let settings = &request.settings;
        let responder_config = ResponderConfig {
            host: LOOPBACK_HOST.to_string(),
            port: settings.port,
            size: settings.tcp_size,
            quiet: true,
            ..ResponderConfig::default()
        };
        let responder_logger = ResponderLogger::new(&self.config, true);
        let (stop, stopped) = oneshot::channel::<()>();
        let shutdown = async {
            let _ = stopped.await;
        };

        let (addr, server) = match protocol {
            Protocol::Udp => {
                let responder = UdpEchoResponder::bind(&responder_config, responder_logger).await?;
                let addr = responder.local_addr()?;
                (addr, tokio::spawn(responder.serve_until(shutdown)))
            }
            Protocol::Tcp => {
                let responder = TcpEchoResponder::bind(&responder_config, responder_logger).await?;
                let addr = responder.local_addr()?;
                (addr, tokio::spawn(responder.serve_until(shutdown)))
            }
        };

        let mut probe_config = settings.probe_config(LOOPBACK_HOST);
        probe_config.port = addr.port();
        probe_config.verbose = request.client_verbose;

        let result = match RttProber::new(probe_config, ProbeLogger::new(&self.config)) {
            Ok(prober) => prober.collect(protocol).await,
            Err(e) => Err(e),
        };

        let _ = stop.send(());
        server
            .await
            .map_err(|e| AppError::internal(format!("{} responder task failed: {}", protocol, e)))??;

        result
    }
}

#[async_trait]
impl MeasurementHarness for LoopbackHarness {
    fn name(&self) -> &str {
        "loopback"
    }

    async fn run_trial(&self, request: &TrialRequest) -> Result<TrialOutput> {
        let runs = self.run_protocols(request).await?;
        let exit_code = if runs.iter().all(|run| run.statistics.is_some()) {
            0
        } else {
            AppError::no_samples("").exit_code()
        };

        Ok(TrialOutput {
            exit_code,
            output: render_trial(&runs, request.client_verbose),
        })
    }
}
