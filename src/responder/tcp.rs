//! Fixed-frame TCP echo responder

use super::resolve_bind_addr;
use crate::error::{AppError, Result};
use crate::logging::ResponderLogger;
use crate::models::ResponderConfig;
use crate::types::Protocol;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

const LISTEN_BACKLOG: u32 = 5;

/// TCP echo responder bound to a listening socket
pub struct TcpEchoResponder {
    listener: TcpListener,
    frame_size: usize,
    logger: ResponderLogger,
}

/// How a client session ended
struct SessionSummary {
    frames: u64,
    error: Option<io::Error>,
}

impl TcpEchoResponder {
    /// Bind and listen with `SO_REUSEADDR` set
    pub async fn bind(config: &ResponderConfig, logger: ResponderLogger) -> Result<Self> {
        if config.size == 0 {
            return Err(AppError::config("Echo frame size must be greater than 0"));
        }

        let addr = resolve_bind_addr(&config.host, config.port).await?;
        let bind_error = |e: io::Error| AppError::bind(format!("{}: {}", addr, e));

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(bind_error)?;
        socket.set_reuseaddr(true).map_err(bind_error)?;
        socket.bind(addr).map_err(bind_error)?;
        let listener = socket.listen(LISTEN_BACKLOG).map_err(bind_error)?;

        Ok(Self {
            listener,
            frame_size: config.size,
            logger,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and serve connections one at a time until `shutdown` resolves
    pub async fn serve_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.logger.log_listening(Protocol::Tcp, self.local_addr()?).await;
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        crate::log_warn!(self.logger.logger(), "accept failed: {}", e);
                        continue;
                    }
                },
            };

            self.logger.log_client(peer).await;

            let summary = tokio::select! {
                _ = &mut shutdown => break,
                summary = self.serve_session(stream, peer) => summary,
            };

            let error = summary.error.map(|e| e.to_string());
            self.logger.log_session_end(peer, summary.frames, error.as_deref()).await;
        }

        self.logger.log_shutdown(Protocol::Tcp).await;
        Ok(())
    }

    /// Echo frames until the client disconnects or an I/O error ends the session
    async fn serve_session(&self, mut stream: TcpStream, peer: SocketAddr) -> SessionSummary {
        if let Err(e) = stream.set_nodelay(true) {
            self.logger.logger().debug(&format!("TCP_NODELAY not set for {}: {}", peer, e))
                .field("peer", peer.to_string())
                .log()
                .await;
        }
        let mut frame = vec![0u8; self.frame_size];
        let mut frames = 0;

        loop {
            match read_frame(&mut stream, &mut frame).await {
                Ok(true) => {}
                Ok(false) => return SessionSummary { frames, error: None },
                Err(e) => return SessionSummary { frames, error: Some(e) },
            }

            if let Err(e) = stream.write_all(&frame).await {
                return SessionSummary { frames, error: Some(e) };
            }

            frames += 1;
            self.logger.log_echo(Protocol::Tcp, peer, frame.len()).await;
        }
    }
}

/// Fill `frame` completely, accumulating partial reads.
///
/// Returns `Ok(false)` when the peer closes before a full frame arrived.
pub(crate) async fn read_frame<R>(reader: &mut R, frame: &mut [u8]) -> io::Result<bool>
where
    R: AsyncReadExt + Unpin,
{
    let mut filled = 0;
    while filled < frame.len() {
        let n = reader.read(&mut frame[filled..]).await?;
        if n == 0 {
            return Ok(false);
        }
        filled += n;
    }
    Ok(true)
}
