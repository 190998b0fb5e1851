//! Connection management and host-level commands.

use crate::config::Config;
use crate::daemon;
use crate::devices::{self, Device, DeviceRecord, DeviceTracker};
use crate::errors::AdbError;
use crate::session::Session;
use crate::transport::TransportTarget;
use adb_protocol::DaemonSocket;
use bytes::Bytes;

/// Entry point to the daemon.
///
/// A bridge holds configuration only; every operation opens its own
/// connection, because the daemon serves one command per connection
/// (streaming replies keep theirs open). There is no connection pool and
/// nothing is shared between sessions.
///
/// # Examples
///
/// ```no_run
/// use adb_client::{Bridge, Config};
///
/// # async fn example() -> Result<(), adb_client::AdbError> {
/// let bridge = Bridge::new(Config::default());
/// for device in bridge.list_devices().await? {
///     println!("{}", device);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Bridge {
    config: Config,
}

impl Bridge {
    /// Create a bridge with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The bridge configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open a new connection to the daemon.
    ///
    /// If the connection is refused and auto-start is enabled, the daemon
    /// start command is run and - when it exits 0 - the connection is
    /// retried exactly once. Both failure paths surface as
    /// [`AdbError::DaemonUnavailable`]. Any socket error other than
    /// "refused" is fatal and never retried.
    pub async fn connect(&self) -> Result<Session, AdbError> {
        let conn = &self.config.connection;
        match DaemonSocket::connect(&conn.host, conn.port).await {
            Ok(socket) => {
                tracing::debug!(peer = %socket.peer_endpoint(), "connected to daemon");
                Ok(Session::new(socket))
            }
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                if !self.config.daemon.auto_start {
                    return Err(AdbError::DaemonUnavailable(format!(
                        "connection refused at {}:{} and daemon auto-start is disabled",
                        conn.host, conn.port
                    )));
                }
                tracing::info!("connection refused, starting the daemon");
                let status = daemon::start_daemon(&self.config.daemon).await?;
                if !status.success() {
                    return Err(AdbError::DaemonUnavailable(format!(
                        "daemon start command exited with {}",
                        status
                    )));
                }
                // Exactly one reconnect attempt after a successful start.
                match DaemonSocket::connect(&conn.host, conn.port).await {
                    Ok(socket) => {
                        tracing::debug!(peer = %socket.peer_endpoint(), "connected after daemon start");
                        Ok(Session::new(socket))
                    }
                    Err(e) => Err(AdbError::DaemonUnavailable(format!(
                        "daemon started but reconnect failed: {}",
                        e
                    ))),
                }
            }
            Err(e) => Err(AdbError::Connection(e)),
        }
    }

    /// Run one command on a fresh connection and return its reply payload.
    pub async fn execute(&self, command: &str) -> Result<Bytes, AdbError> {
        let mut session = self.connect().await?;
        session.send_command(command).await?;
        session.await_result().await
    }

    /// The daemon's protocol version.
    pub async fn version(&self) -> Result<u32, AdbError> {
        let payload = self.execute("host:version").await?;
        let text = std::str::from_utf8(&payload)
            .map_err(|_| AdbError::Protocol("version payload is not ASCII".to_string()))?;
        u32::from_str_radix(text.trim(), 16)
            .map_err(|_| AdbError::Protocol(format!("malformed version payload {:?}", text)))
    }

    /// List the devices currently known to the daemon.
    pub async fn list_devices(&self) -> Result<Vec<DeviceRecord>, AdbError> {
        let payload = self.execute("host:devices").await?;
        Ok(devices::parse_device_list(&String::from_utf8_lossy(
            &payload,
        )))
    }

    /// Subscribe to the daemon's device-change stream.
    ///
    /// The stream never ends on its own; drop the tracker (closing its
    /// connection) to stop receiving updates.
    pub async fn track_devices(&self) -> Result<DeviceTracker, AdbError> {
        let mut session = self.connect().await?;
        session.send_command("host:track-devices").await?;
        session.await_status().await?;
        Ok(DeviceTracker::new(session))
    }

    /// Open a fresh connection and pin it to one device (or device class).
    ///
    /// The returned session is bound: it carries exactly one follow-up
    /// device-scoped command (`sync:`, `shell:`, `framebuffer:`,
    /// `log:`), then is discarded.
    pub async fn bind_transport(&self, target: &TransportTarget) -> Result<Session, AdbError> {
        let mut session = self.connect().await?;
        session.send_command(&target.command()).await?;
        session.await_status().await?;
        tracing::debug!(%target, "transport bound");
        Ok(session)
    }

    /// Register a port forward. Fire-and-forget: the daemon keeps the
    /// registration; no acknowledgement is read.
    pub async fn forward(&self, local: &str, remote: &str) -> Result<(), AdbError> {
        let mut session = self.connect().await?;
        session
            .send_command(&format!("host:forward:{};{}", local, remote))
            .await
    }

    /// A handle for device-scoped operations.
    ///
    /// The device borrows this bridge for its lifetime; every operation
    /// on it opens its own transport-bound connection.
    pub fn device(&self, record: DeviceRecord) -> Device<'_> {
        Device::new(self, record)
    }
}
