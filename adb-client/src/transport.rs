//! Transport binding: pinning a connection to one device.

use std::fmt;

/// What a connection should be pinned to before device-scoped commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportTarget {
    /// Any device attached over USB.
    Usb,
    /// Any locally running emulator.
    Local,
    /// Whatever single device is available.
    Any,
    /// A specific device by serial number.
    Serial(String),
}

impl TransportTarget {
    /// The host command that performs this binding.
    pub fn command(&self) -> String {
        match self {
            Self::Usb => "host:transport-usb".to_string(),
            Self::Local => "host:transport-local".to_string(),
            Self::Any => "host:transport-any".to_string(),
            Self::Serial(serial) => format!("host:transport:{}", serial),
        }
    }
}

impl From<&str> for TransportTarget {
    /// Class names resolve to their class target; anything else is taken
    /// as a serial number.
    fn from(value: &str) -> Self {
        match value {
            "usb" => Self::Usb,
            "local" => Self::Local,
            "any" => Self::Any,
            serial => Self::Serial(serial.to_string()),
        }
    }
}

impl fmt::Display for TransportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command())
    }
}
