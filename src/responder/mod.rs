//! Echo responders
//!
//! Both transports echo back exactly the bytes they receive. The TCP
//! responder works on fixed-size frames and serves one connection at a time;
//! the UDP responder reflects each non-empty datagram to its sender.

pub mod tcp;
pub mod udp;

pub use tcp::TcpEchoResponder;
pub use udp::UdpEchoResponder;

use crate::error::{AppError, Result};
use std::net::SocketAddr;

/// Resolve a bind address; failures are reported as bind errors
pub(crate) async fn resolve_bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let target = format!("{}:{}", host, port);
    let addr = tokio::net::lookup_host(&target)
        .await
        .map_err(|e| AppError::bind(format!("cannot resolve {}: {}", target, e)))?
        .next();
    addr.ok_or_else(|| AppError::bind(format!("no address found for {}", target)))
}
