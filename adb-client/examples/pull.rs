//! Pull a file from the first attached device.
//!
//! Usage:
//!   cargo run --example pull -- /system/build.prop ./build.prop

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

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <remote-path> <local-path>", args[0]);
        std::process::exit(1);
    }

    let bridge = Bridge::new(Config::default());
    let devices = bridge.list_devices().await?;
    let record = devices
        .into_iter()
        .find(|d| d.state == "device")
        .ok_or_else(|| anyhow::anyhow!("no device attached"))?;
    info!("pulling from {}", record);

    let device = bridge.device(record);
    let mut sink = tokio::fs::File::create(&args[2]).await?;
    let stats = device.pull_file(&args[1], &mut sink).await?;
    info!(
        "pulled {} bytes in {:?} ({} B/s)",
        stats.total_bytes,
        stats.elapsed,
        stats.bytes_per_sec()
    );

    Ok(())
}
