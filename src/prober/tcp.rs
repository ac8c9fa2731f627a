//! TCP probe session with reconnect-on-loss

use super::{Exchange, LossReason, ProbeTransport};
use crate::error::{ConnectPolicy, ErrorContext, Result, Sleeper};
use crate::logging::ProbeLogger;
use crate::models::ProbeConfig;
use crate::responder::tcp::read_frame;
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// A TCP connection to the responder, owned for the duration of a run
pub struct TcpProbeSession<'a> {
    target: String,
    timeout: Duration,
    policy: &'a ConnectPolicy,
    sleeper: &'a dyn Sleeper,
    logger: &'a ProbeLogger,
    stream: Option<TcpStream>,
    reply: Vec<u8>,
}

impl<'a> TcpProbeSession<'a> {
    /// Open the initial connection through the connect policy
    pub async fn connect(
        config: &'a ProbeConfig,
        sleeper: &'a dyn Sleeper,
        logger: &'a ProbeLogger,
    ) -> Result<TcpProbeSession<'a>> {
        let mut session = Self {
            target: config.target(),
            timeout: config.timeout(),
            policy: &config.connect_policy,
            sleeper,
            logger,
            stream: None,
            reply: vec![0u8; config.payload_size],
        };
        session.stream = Some(session.open().await?);
        Ok(session)
    }

    /// Each attempt is bounded by the probe timeout
    async fn open(&self) -> Result<TcpStream> {
        let target = self.target.as_str();
        let timeout = self.timeout;
        let logger = self.logger;

        let stream = self
            .policy
            .run(self.sleeper, move |attempt| async move {
                let result = match tokio::time::timeout(timeout, TcpStream::connect(target)).await {
                    Ok(result) => result,
                    Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out")),
                };

                let error = result.as_ref().err().map(|e| e.to_string());
                logger.log_connection(target, attempt, error.as_deref()).await;
                result
            })
            .await
            .with_context(|| format!("connecting to {}", target))?;

        if let Err(e) = stream.set_nodelay(true) {
            self.logger.logger().debug(&format!("TCP_NODELAY not set on {}: {}", target, e))
                .field("target", target)
                .log()
                .await;
        }
        Ok(stream)
    }
}

#[async_trait]
impl<'a> ProbeTransport for TcpProbeSession<'a> {
    async fn exchange(&mut self, _seq: u32, payload: &[u8]) -> Exchange {
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Exchange::Lost(LossReason::Closed),
        };

        self.reply.resize(payload.len(), 0);
        let reply = &mut self.reply;

        let result = tokio::time::timeout(self.timeout, async {
            stream.write_all(payload).await?;
            read_frame(stream, reply).await
        })
        .await;

        match result {
            Err(_) => Exchange::Lost(LossReason::Timeout),
            Ok(Err(e)) => Exchange::Lost(LossReason::Io(e.to_string())),
            Ok(Ok(false)) => Exchange::Lost(LossReason::Closed),
            Ok(Ok(true)) if self.reply.as_slice() == payload => Exchange::Echoed,
            Ok(Ok(true)) => Exchange::Lost(LossReason::Mismatch),
        }
    }

    /// Close the connection and open a fresh one
    async fn recover(&mut self, seq: u32, reason: &LossReason) -> Result<()> {
        // the responder serves one connection at a time, so close before reconnecting
        drop(self.stream.take());
        self.logger.log_reconnect(&self.target, seq, &reason.to_string()).await;
        self.stream = Some(self.open().await?);
        Ok(())
    }
}
