//! Socket to the local ADB daemon.
//!
//! The daemon listens on a loopback TCP port and trusts local connections;
//! there is no authentication handshake. [`DaemonSocket`] wraps a
//! [`TcpStream`] configured for the protocol's traffic pattern: NODELAY so
//! small command frames go out immediately, and keep-alive because
//! device-tracking and capture connections stay open indefinitely.
//!
//! # Examples
//!
//! ```no_run
//! use adb_protocol::socket::{DaemonSocket, DEFAULT_HOST, DEFAULT_PORT};
//!
//! # async fn example() -> std::io::Result<()> {
//! let socket = DaemonSocket::connect(DEFAULT_HOST, DEFAULT_PORT).await?;
//! println!("Connected to: {}", socket.peer_endpoint());
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;

/// Default TCP port the daemon listens on.
pub const DEFAULT_PORT: u16 = 5037;

/// Default daemon host. The daemon only trusts local connections.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// One TCP connection to the daemon.
///
/// A socket carries exactly one logical exchange at a time; concurrent
/// commands need separate connections (the daemon does not multiplex).
#[derive(Debug)]
pub struct DaemonSocket {
    stream: TcpStream,
    peer_addr: SocketAddr,
}

impl DaemonSocket {
    /// Connect to the daemon.
    ///
    /// Enables TCP_NODELAY and SO_KEEPALIVE on the new connection.
    ///
    /// # Errors
    ///
    /// Propagates the raw [`std::io::Error`] so callers can distinguish
    /// "connection refused" (daemon not running) from other failures.
    pub async fn connect(host: &str, port: u16) -> std::io::Result<Self> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr).await?;
        let peer_addr = stream.peer_addr()?;

        // Command frames are tiny; send them without Nagle buffering.
        stream.set_nodelay(true)?;
        // Tracking/capture connections idle for long stretches.
        socket2::SockRef::from(&stream).set_keepalive(true)?;

        if let Ok(local) = stream.local_addr() {
            tracing::debug!("connected: local={} -> daemon={}", local, peer_addr);
        }

        Ok(Self { stream, peer_addr })
    }

    /// Peer endpoint as "address:port", for logs.
    pub fn peer_endpoint(&self) -> String {
        self.peer_addr.to_string()
    }

    /// Consume the socket and return the underlying stream.
    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

impl AsyncRead for DaemonSocket {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for DaemonSocket {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}
