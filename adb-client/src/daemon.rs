//! Daemon process lifecycle.
//!
//! The daemon is an external program; the client only ever launches it
//! with the `start-server` argument and waits for that launcher process
//! to exit. Its output is forwarded to our logs so start-up problems are
//! visible without a terminal.

use crate::config::DaemonConfig;
use crate::errors::AdbError;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Launch the daemon start command and wait for it to exit.
///
/// The launcher daemonizes the real server and exits quickly; exit code 0
/// means the daemon is (now) listening.
///
/// # Errors
///
/// Returns [`AdbError::DaemonUnavailable`] if the executable cannot be
/// spawned or waited on. A non-zero exit status is returned as `Ok` - the
/// caller decides what it means for the connection attempt.
pub async fn start_daemon(config: &DaemonConfig) -> Result<ExitStatus, AdbError> {
    tracing::info!(executable = %config.executable.display(), "starting daemon");

    let mut child = Command::new(&config.executable)
        .arg("start-server")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            AdbError::DaemonUnavailable(format!(
                "failed to spawn {}: {}",
                config.executable.display(),
                e
            ))
        })?;

    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_output("stdout", stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_output("stderr", stderr));
    }

    let status = child.wait().await.map_err(|e| {
        AdbError::DaemonUnavailable(format!("failed to wait for daemon start: {}", e))
    })?;
    tracing::info!(%status, "daemon start command finished");
    Ok(status)
}

async fn forward_output<R: AsyncRead + Unpin>(stream: &'static str, reader: R) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!("daemon {}: {}", stream, line);
    }
}
