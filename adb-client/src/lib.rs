//! High-level async client for the ADB host protocol.
//!
//! This crate talks to a locally running ADB daemon over its loopback
//! TCP port. The daemon trusts local connections - there is no
//! authentication - and serves one command per connection, so every
//! operation here opens its own short-lived [`Session`]; only streaming
//! replies (device tracking, framebuffer capture, sync transfers, log
//! streams) keep a connection open.
//!
//! Built on the low-level `adb-protocol` (framing, sync chunk codec,
//! daemon socket) and `adb-framebuffer` (capture decoding) crates.
//!
//! # Features
//!
//! - **Async I/O**: built on tokio; socket operations suspend, never
//!   block a worker thread
//! - **Daemon lifecycle**: a refused connection optionally starts the
//!   daemon and retries exactly once
//! - **Device directory**: one-shot listing or a live change stream
//! - **Device operations**: shell commands, log streaming, file pull
//!   over the sync sub-protocol, framebuffer capture with RGB565
//!   conversion
//! - **Fragmentation-safe**: all wire parsing runs over explicit
//!   accumulation buffers and tolerates arbitrary packet boundaries
//!
//! # Quick Start
//!
//! ```no_run
//! use adb_client::{Bridge, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), adb_client::AdbError> {
//!     let bridge = Bridge::new(Config::default());
//!
//!     println!("daemon version {}", bridge.version().await?);
//!
//!     for record in bridge.list_devices().await? {
//!         println!("{}", record);
//!         let device = bridge.device(record);
//!         let output = device.shell("getprop", &["ro.product.model"]).await?;
//!         println!("model: {}", output.trim());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Errors follow a fail-fast policy: parse and protocol errors propagate
//! immediately and nothing is retried, with two deliberate exceptions -
//! the single daemon auto-start retry on a refused connection, and the
//! lenient device-list line parser, which drops malformed lines rather
//! than failing the whole listing.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

// Public modules
pub mod config;
pub mod errors;

// Implementation modules
mod bridge;
mod daemon;
mod devices;
mod session;
mod shell;
mod snapshot;
mod sync;
mod transport;

// Re-exports
pub use bridge::Bridge;
pub use config::Config;
pub use devices::{Device, DeviceRecord, DeviceTracker};
pub use errors::AdbError;
pub use session::Session;
pub use shell::{LogEntry, LogStream};
pub use snapshot::write_image_file;
pub use sync::{PullStats, SyncService};
pub use transport::TransportTarget;

// The capture type crosses the crate boundary; re-export it so callers
// do not need a direct adb-framebuffer dependency.
pub use adb_framebuffer::Framebuffer;
