//! A single protocol exchange with the daemon.
//!
//! The daemon requires a fresh connection per command: a [`Session`] wraps
//! one socket and carries one logical exchange. The only connections that
//! stay open are streaming replies (device tracking, framebuffer capture,
//! sync transfers, shell output), all of which keep using the session they
//! started on.
//!
//! The session owns an explicit accumulation buffer. Every socket delivery
//! is appended to it and the pure framing functions are re-run over the
//! front, so a frame split across any number of deliveries - or several
//! frames coalesced into one - decodes identically. An incomplete trailing
//! frame always stays buffered until the bytes backing it arrive.

use crate::errors::AdbError;
use adb_protocol::framing::{self, Status, PREFIX_LEN};
use adb_protocol::DaemonSocket;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// One connection to the daemon, carrying one logical exchange.
pub struct Session {
    socket: DaemonSocket,
    buffer: BytesMut,
    disconnected: bool,
}

impl Session {
    pub(crate) fn new(socket: DaemonSocket) -> Self {
        Self {
            socket,
            buffer: BytesMut::with_capacity(8192),
            disconnected: false,
        }
    }

    /// Peer endpoint as "address:port", for logs.
    pub fn peer_endpoint(&self) -> String {
        self.socket.peer_endpoint()
    }

    /// True once the daemon has closed its end of the connection.
    ///
    /// End-of-stream is observational, not an error; streaming reads
    /// report it as `Ok(None)` and set this flag.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Send one framed host command.
    ///
    /// No reply is awaited here; pair with [`await_status`](Self::await_status),
    /// [`await_result`](Self::await_result) or the streaming reads.
    pub async fn send_command(&mut self, command: &str) -> Result<(), AdbError> {
        let frame = framing::encode_frame(command.as_bytes())?;
        tracing::debug!(command, bytes = frame.len(), "sending host command");
        self.socket.write_all(&frame).await?;
        Ok(())
    }

    /// Write raw bytes, bypassing the host framing (sync requests).
    pub(crate) async fn send_raw(&mut self, bytes: &[u8]) -> Result<(), AdbError> {
        self.socket.write_all(bytes).await?;
        Ok(())
    }

    /// Pull one socket delivery into the accumulation buffer.
    ///
    /// Returns `false` on end-of-stream. The daemon closing its end is
    /// observational, not an error; whether it is fatal depends on what
    /// the caller was waiting for.
    async fn fill(&mut self) -> Result<bool, AdbError> {
        let read = self.socket.read_buf(&mut self.buffer).await?;
        if read == 0 {
            if !self.disconnected {
                self.disconnected = true;
                tracing::debug!("daemon closed the connection");
            }
            return Ok(false);
        }
        tracing::trace!(bytes = read, "received delivery");
        Ok(true)
    }

    /// Buffer at least `wanted` bytes of a pending reply.
    async fn ensure(&mut self, wanted: usize) -> Result<(), AdbError> {
        while self.buffer.len() < wanted {
            if !self.fill().await? {
                return Err(AdbError::Connection(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "daemon closed the connection with {} of {} reply bytes delivered",
                        self.buffer.len(),
                        wanted
                    ),
                )));
            }
        }
        Ok(())
    }

    /// Read one complete frame, filling from the socket as needed.
    async fn read_frame(&mut self) -> Result<Bytes, AdbError> {
        loop {
            if let Some(frame) = framing::split_one(&mut self.buffer)? {
                return Ok(frame);
            }
            // Not enough buffered for a full frame yet.
            self.ensure(self.buffer.len() + 1).await?;
        }
    }

    /// Await the 4-byte status line of a reply.
    ///
    /// # Errors
    ///
    /// - [`AdbError::CommandFailed`] with the daemon's message on `FAIL`
    /// - [`AdbError::Protocol`] on any other status line
    pub async fn await_status(&mut self) -> Result<(), AdbError> {
        self.ensure(PREFIX_LEN).await?;
        let mut line = [0u8; PREFIX_LEN];
        line.copy_from_slice(&self.buffer.split_to(PREFIX_LEN));

        match framing::parse_status(&line)? {
            Status::Okay => {
                tracing::debug!("command acknowledged");
                Ok(())
            }
            Status::Fail => {
                let message = self.read_frame().await?;
                let message = String::from_utf8_lossy(&message).into_owned();
                tracing::debug!(%message, "command rejected");
                Err(AdbError::CommandFailed(message))
            }
        }
    }

    /// Await a reply that carries one payload frame after the status.
    pub async fn await_result(&mut self) -> Result<Bytes, AdbError> {
        self.await_status().await?;
        self.read_frame().await
    }

    /// Next frame of a streaming reply, after the initial `OKAY`.
    ///
    /// Returns `Ok(None)` when the daemon closes the connection at a
    /// frame boundary (the only way such a stream ends). Closing inside
    /// a frame is a protocol violation.
    pub async fn next_frame(&mut self) -> Result<Option<Bytes>, AdbError> {
        loop {
            if let Some(frame) = framing::split_one(&mut self.buffer)? {
                return Ok(Some(frame));
            }
            if !self.fill().await? {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(AdbError::Protocol(format!(
                    "connection closed with {} bytes of a partial frame buffered",
                    self.buffer.len()
                )));
            }
        }
    }

    /// Next raw delivery, without framing interpretation.
    ///
    /// Used by consumers with their own chunk parsers (sync transfers,
    /// framebuffer capture, shell/log output). Buffered bytes left over
    /// from earlier reads are drained first. Returns `Ok(None)` at
    /// end-of-stream.
    pub async fn read_chunk(&mut self) -> Result<Option<Bytes>, AdbError> {
        if self.buffer.is_empty() && !self.fill().await? {
            return Ok(None);
        }
        Ok(Some(self.buffer.split_to(self.buffer.len()).freeze()))
    }
}
