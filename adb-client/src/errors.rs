//! Error types for the ADB client.

use std::io;
use thiserror::Error;

/// Errors that can occur during client operation.
#[derive(Debug, Error)]
pub enum AdbError {
    /// The daemon is not reachable: the connection was refused and the
    /// automatic daemon start either failed or is disabled.
    #[error("daemon unavailable: {0}")]
    DaemonUnavailable(String),

    /// Socket-level error other than "connection refused". Fatal for the
    /// connection, never retried.
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),

    /// Unexpected status line or malformed frame: the client and daemon
    /// have lost sync. Not retried.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The daemon explicitly reported `FAIL`, with its own message.
    #[error("command failed: {0}")]
    CommandFailed(String),

    /// Malformed or failed sync chunk; fatal to that transfer.
    #[error("sync protocol error: {0}")]
    Sync(String),

    /// Remote path exceeds the daemon's limit. Checked before any
    /// transfer bytes are sent.
    #[error("remote path of {0} bytes exceeds the 1024 byte limit")]
    PathTooLong(usize),

    /// A capture header carried a version this client cannot decode.
    #[error("unsupported framebuffer version {0}")]
    UnsupportedFramebufferVersion(u32),

    /// Target file extension is not a supported image format.
    #[error("unknown image type '{0}'")]
    UnsupportedImageFormat(String),

    /// The external image codec rejected the capture.
    #[error("image encoding failed: {0}")]
    ImageEncoding(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AdbError {
    /// Returns true if the operation may succeed on a plain retry.
    ///
    /// Only daemon unavailability qualifies: the caller can remediate
    /// (start the daemon by hand) and try again. Everything else is
    /// either a desync, a daemon-reported failure, or bad input.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DaemonUnavailable(_))
    }
}

impl From<adb_protocol::FramingError> for AdbError {
    fn from(err: adb_protocol::FramingError) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<adb_protocol::SyncWireError> for AdbError {
    fn from(err: adb_protocol::SyncWireError) -> Self {
        Self::Sync(err.to_string())
    }
}

impl From<adb_framebuffer::FramebufferError> for AdbError {
    fn from(err: adb_framebuffer::FramebufferError) -> Self {
        match err {
            adb_framebuffer::FramebufferError::UnsupportedVersion(version) => {
                Self::UnsupportedFramebufferVersion(version)
            }
            other => Self::Protocol(other.to_string()),
        }
    }
}
