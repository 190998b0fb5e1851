//! Wire layer for the ADB host protocol.
//!
//! This crate provides the low-level networking and codec pieces for talking
//! to a locally running ADB daemon:
//!
//! - [`socket`] - TCP socket to the daemon (loopback, NODELAY + keep-alive)
//! - [`framing`] - the hex-length-prefixed host command framing
//! - [`sync`] - the chunk codec of the nested file-transfer sub-protocol
//!
//! All parsing here is pure and incremental: the codecs operate on caller
//! owned accumulation buffers and never perform I/O themselves, which makes
//! them robust to arbitrary fragmentation of socket deliveries.
//!
//! # Examples
//!
//! ```no_run
//! use adb_protocol::{DaemonSocket, framing};
//! use tokio::io::AsyncWriteExt;
//!
//! # async fn example() -> std::io::Result<()> {
//! let mut socket = DaemonSocket::connect("127.0.0.1", 5037).await?;
//! let frame = framing::encode_frame(b"host:version").unwrap();
//! socket.write_all(&frame).await?;
//! # Ok(())
//! # }
//! ```

pub mod framing;
pub mod socket;
pub mod sync;

// Re-export commonly used types
pub use framing::{decode_length, encode_frame, parse_status, split_frames, FramingError, Status};
pub use socket::DaemonSocket;
pub use sync::{ChunkAssembler, SyncEvent, SyncWireError};
