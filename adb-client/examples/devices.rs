//! List devices and watch for changes.
//!
//! Usage:
//!   cargo run --example devices           # one-shot listing
//!   cargo run --example devices -- track  # follow the change stream
//!
//! Requires an ADB daemon (started automatically if `adb` is on PATH).

use adb_client::{Bridge, Config};
use std::env;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let bridge = Bridge::new(Config::default());

    let version = bridge.version().await?;
    info!("daemon protocol version 1.0.{}", version);

    if env::args().nth(1).as_deref() == Some("track") {
        let mut tracker = bridge.track_devices().await?;
        while let Some(devices) = tracker.next().await? {
            info!("{} device(s) attached", devices.len());
            for device in &devices {
                info!("  {}", device);
            }
        }
        info!("daemon closed the tracking stream");
    } else {
        let devices = bridge.list_devices().await?;
        info!("{} device(s) attached", devices.len());
        for record in devices {
            let emulator = if record.is_emulator() { " (emulator)" } else { "" };
            info!("  {}{}", record, emulator);
        }
    }

    Ok(())
}
