//! Device directory: listing, tracking, and per-device handles.

use crate::bridge::Bridge;
use crate::errors::AdbError;
use crate::session::Session;
use crate::transport::TransportTarget;
use std::fmt;

/// One line of the daemon's device list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Serial number or connection identifier.
    pub serial: String,
    /// Connection state as reported by the daemon
    /// (`device`, `offline`, `unauthorized`, ...).
    pub state: String,
}

impl DeviceRecord {
    /// True for emulator instances, which the daemon names `emulator-<port>`.
    pub fn is_emulator(&self) -> bool {
        self.serial.starts_with("emulator-")
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", self.state, self.serial)
    }
}

/// Parse the daemon's tab-separated device list.
///
/// One record per line with exactly two tab-separated fields; anything
/// else is dropped. The daemon occasionally emits partial or decorative
/// lines, so this parser is deliberately lenient - a malformed line is
/// not an error.
pub(crate) fn parse_device_list(text: &str) -> Vec<DeviceRecord> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            match (fields.next(), fields.next(), fields.next()) {
                (Some(serial), Some(state), None) => Some(DeviceRecord {
                    serial: serial.to_string(),
                    state: state.to_string(),
                }),
                _ => {
                    if !line.is_empty() {
                        tracing::trace!(line, "dropping malformed device line");
                    }
                    None
                }
            }
        })
        .collect()
}

/// Live subscription to the daemon's device-change stream.
///
/// Created by [`Bridge::track_devices`]. Each frame the daemon pushes is
/// a full device list, parsed the same way as a one-shot listing.
pub struct DeviceTracker {
    session: Session,
}

impl DeviceTracker {
    pub(crate) fn new(session: Session) -> Self {
        Self { session }
    }

    /// Await the next device list.
    ///
    /// Pends indefinitely between daemon updates. Returns `Ok(None)` when
    /// the connection is closed - which, absent an explicit cancel
    /// message in the protocol, only happens when this tracker (or the
    /// daemon) goes away.
    pub async fn next(&mut self) -> Result<Option<Vec<DeviceRecord>>, AdbError> {
        match self.session.next_frame().await? {
            Some(frame) => Ok(Some(parse_device_list(&String::from_utf8_lossy(&frame)))),
            None => Ok(None),
        }
    }
}

/// Handle for device-scoped operations.
///
/// Borrows the [`Bridge`] that created it; each operation opens its own
/// transport-bound connection, since a bound session carries exactly one
/// device-scoped command.
pub struct Device<'a> {
    bridge: &'a Bridge,
    record: DeviceRecord,
}

impl<'a> Device<'a> {
    pub(crate) fn new(bridge: &'a Bridge, record: DeviceRecord) -> Self {
        Self { bridge, record }
    }

    /// The device's serial number or connection identifier.
    pub fn serial(&self) -> &str {
        &self.record.serial
    }

    /// The device's connection state at listing time.
    pub fn state(&self) -> &str {
        &self.record.state
    }

    /// True for emulator instances.
    pub fn is_emulator(&self) -> bool {
        self.record.is_emulator()
    }

    /// Bind a fresh connection to this device.
    pub(crate) async fn bind(&self) -> Result<Session, AdbError> {
        self.bridge
            .bind_transport(&TransportTarget::Serial(self.record.serial.clone()))
            .await
    }
}

impl fmt::Display for Device<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.record.fmt(f)
    }
}
