//! Datagram UDP echo responder

use super::resolve_bind_addr;
use crate::error::{AppError, Result};
use crate::logging::ResponderLogger;
use crate::models::ResponderConfig;
use crate::types::Protocol;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// UDP echo responder bound to a socket
pub struct UdpEchoResponder {
    socket: UdpSocket,
    buf_size: usize,
    logger: ResponderLogger,
}

impl UdpEchoResponder {
    pub async fn bind(config: &ResponderConfig, logger: ResponderLogger) -> Result<Self> {
        if config.buf_size == 0 {
            return Err(AppError::config("Receive buffer size must be greater than 0"));
        }

        let addr = resolve_bind_addr(&config.host, config.port).await?;
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| AppError::bind(format!("{}: {}", addr, e)))?;

        Ok(Self {
            socket,
            buf_size: config.buf_size,
            logger,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Reflect datagrams until `shutdown` resolves.
    ///
    /// Datagrams longer than the receive buffer are truncated to it.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.logger.log_listening(Protocol::Udp, self.local_addr()?).await;
        tokio::pin!(shutdown);

        let mut buf = vec![0u8; self.buf_size];
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((0, _)) => continue,
                    Ok((len, peer)) => {
                        match self.socket.send_to(&buf[..len], peer).await {
                            Ok(_) => self.logger.log_echo(Protocol::Udp, peer, len).await,
                            Err(e) => crate::log_warn!(self.logger.logger(), "send to {} failed: {}", peer, e),
                        }
                    }
                    // ICMP errors from earlier sends surface here; they only concern that peer
                    Err(e) => crate::log_warn!(self.logger.logger(), "receive failed: {}", e),
                },
            }
        }

        self.logger.log_shutdown(Protocol::Udp).await;
        Ok(())
    }
}
