//! Shell command and log stream pass-throughs.
//!
//! Both are thin wrappers over the transport-bound session primitives:
//! the daemon streams raw bytes after the `OKAY` and closes the
//! connection when it is done (shell) or never (logcat).

use crate::devices::Device;
use crate::errors::AdbError;
use crate::session::Session;
use bytes::BytesMut;

/// Byte length of the logger record header.
const LOG_HEADER: usize = 20;

impl Device<'_> {
    /// Run a shell command on the device and collect its output.
    ///
    /// Arguments are appended space-separated; double quotes are stripped
    /// (the daemon does no quoting of its own). Output is read until the
    /// daemon closes the connection, then decoded lossily as UTF-8.
    pub async fn shell(&self, command: &str, args: &[&str]) -> Result<String, AdbError> {
        let mut payload = command.to_string();
        for arg in args {
            payload.push(' ');
            payload.push_str(&arg.replace('"', ""));
        }

        let mut session = self.bind().await?;
        session.send_command(&format!("shell:{}", payload)).await?;
        session.await_status().await?;

        let mut output = Vec::new();
        while let Some(delivery) = session.read_chunk().await? {
            output.extend_from_slice(&delivery);
        }
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    /// Subscribe to the device's main log buffer.
    ///
    /// The stream never ends on its own; drop it to disconnect.
    pub async fn logcat(&self) -> Result<LogStream, AdbError> {
        let mut session = self.bind().await?;
        session.send_command("log:main").await?;
        session.await_status().await?;
        Ok(LogStream::new(session))
    }
}

/// One record of the device log.
///
/// Wire layout of the header, little-endian:
///
/// ```text
/// struct logger_entry {
///     uint16_t len;    // length of the payload
///     uint16_t __pad;
///     int32_t  pid;    // generating process's pid
///     int32_t  tid;    // generating process's tid
///     int32_t  sec;    // seconds since Epoch
///     int32_t  nsec;   // nanoseconds
///     char     msg[0]; // the entry's payload
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Generating process id.
    pub pid: i32,
    /// Generating thread id.
    pub tid: i32,
    /// Seconds since the epoch.
    pub seconds: i32,
    /// Nanosecond remainder.
    pub nanos: i32,
    /// The record payload, decoded lossily.
    pub message: String,
}

/// Split one complete log record off the front of `buffer`, if present.
///
/// Partial records are left in place for the caller to extend.
fn take_entry(buffer: &mut BytesMut) -> Option<LogEntry> {
    if buffer.len() < LOG_HEADER {
        return None;
    }
    let length = u16::from_le_bytes([buffer[0], buffer[1]]) as usize;
    if buffer.len() < LOG_HEADER + length {
        return None;
    }

    let header = buffer.split_to(LOG_HEADER);
    let payload = buffer.split_to(length);
    let field =
        |at: usize| i32::from_le_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]]);
    Some(LogEntry {
        pid: field(4),
        tid: field(8),
        seconds: field(12),
        nanos: field(16),
        message: String::from_utf8_lossy(&payload).into_owned(),
    })
}

/// Live log stream from one device.
pub struct LogStream {
    session: Session,
    buffer: BytesMut,
}

impl LogStream {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            session,
            buffer: BytesMut::new(),
        }
    }

    /// Await the next log record.
    ///
    /// Records may arrive split across deliveries or several to one;
    /// partial records stay buffered. Returns `Ok(None)` when the
    /// connection closes at a record boundary.
    pub async fn next_entry(&mut self) -> Result<Option<LogEntry>, AdbError> {
        loop {
            if let Some(entry) = take_entry(&mut self.buffer) {
                return Ok(Some(entry));
            }
            match self.session.read_chunk().await? {
                Some(delivery) => self.buffer.extend_from_slice(&delivery),
                None => {
                    if self.buffer.is_empty() {
                        return Ok(None);
                    }
                    return Err(AdbError::Protocol(format!(
                        "connection closed with {} bytes of a partial log record buffered",
                        self.buffer.len()
                    )));
                }
            }
        }
    }
}
