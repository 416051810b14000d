// Datagram boundary between the network and the decode pipeline. The
// pipeline itself is source-agnostic; this module ships the one concrete
// source the binary uses.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::net::UdpSocket;
use tracing::info;

/// One captured datagram, delivered in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct Datagram {
    pub received_at: DateTime<Utc>,
    pub bytes: Vec<u8>,
}

/// Capture source backed by a bound UDP socket.
pub struct UdpCapture {
    socket: UdpSocket,
    buf: Vec<u8>,
}

// Game datagrams are small; this leaves generous headroom.
const RECV_BUFFER_LEN: usize = 64 * 1024;

impl UdpCapture {
    pub async fn bind(addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("failed to bind capture socket on {}", addr))?;
        info!(addr = %addr, "capture socket bound");
        Ok(Self {
            socket,
            buf: vec![0u8; RECV_BUFFER_LEN],
        })
    }

    /// Receives the next datagram; the only blocking point in ingestion.
    pub async fn recv(&mut self) -> Result<Datagram> {
        let (len, _peer) = self
            .socket
            .recv_from(&mut self.buf)
            .await
            .context("capture socket receive failed")?;
        Ok(Datagram {
            received_at: Utc::now(),
            bytes: self.buf[..len].to_vec(),
        })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        self.socket
            .local_addr()
            .context("capture socket has no local address")
    }
}
