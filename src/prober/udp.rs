//! UDP probe session

use super::{Exchange, LossReason, ProbeTransport};
use crate::error::{AppError, Result};
use crate::logging::ProbeLogger;
use crate::models::ProbeConfig;
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;

/// One UDP socket for the whole run, connected to the responder
pub struct UdpProbeSession<'a> {
    socket: UdpSocket,
    timeout: Duration,
    logger: &'a ProbeLogger,
    buf: Vec<u8>,
}

impl<'a> UdpProbeSession<'a> {
    /// Bind an ephemeral port and connect it to the target so only its replies are received
    pub async fn connect(config: &ProbeConfig, logger: &'a ProbeLogger) -> Result<UdpProbeSession<'a>> {
        let target = config.target();
        let addr = tokio::net::lookup_host(&target)
            .await
            .map_err(|e| AppError::connect(format!("cannot resolve {}: {}", target, e)))?
            .next()
            .ok_or_else(|| AppError::connect(format!("no address found for {}", target)))?;

        let local = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).await?;
        socket
            .connect(addr)
            .await
            .map_err(|e| AppError::connect(format!("{}: {}", target, e)))?;
        logger.log_connection(&target, 1, None).await;

        Ok(Self {
            socket,
            timeout: config.timeout(),
            logger,
            buf: vec![0u8; config.payload_size.max(crate::defaults::DEFAULT_UDP_BUF_SIZE)],
        })
    }
}

#[async_trait]
impl<'a> ProbeTransport for UdpProbeSession<'a> {
    /// Replies that do not match the payload are late echoes of earlier
    /// probes; they are discarded and the wait continues until the deadline.
    async fn exchange(&mut self, seq: u32, payload: &[u8]) -> Exchange {
        if let Err(e) = self.socket.send(payload).await {
            return Exchange::Lost(LossReason::Io(e.to_string()));
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.socket.recv(&mut self.buf)).await {
                Err(_) => return Exchange::Lost(LossReason::Timeout),
                Ok(Err(e)) => return Exchange::Lost(LossReason::Io(e.to_string())),
                Ok(Ok(len)) if &self.buf[..len] == payload => return Exchange::Echoed,
                Ok(Ok(len)) => self.logger.log_stale_reply(seq, len).await,
            }
        }
    }

    async fn recover(&mut self, _seq: u32, _reason: &LossReason) -> Result<()> {
        Ok(())
    }
}
