//! Chunk codec for the sync file-transfer sub-protocol.
//!
//! After a transport-bound session has been switched into sync mode
//! (`sync:` + `OKAY`), the connection speaks its own chunk framing,
//! unrelated to the hex-length host framing: a 4-byte ASCII id, a 4-byte
//! little-endian length, then - for `DATA` - that many payload bytes, or
//! - for `FAIL` - an error message of that length. `DONE` carries no
//! payload and its length field is unused.
//!
//! [`ChunkAssembler`] is an incremental parser over that framing. Feed it
//! raw socket deliveries in any fragmentation (a chunk header may be split
//! across deliveries, a `DATA` payload may span many of them, several
//! chunks may land in one) and it emits [`SyncEvent`]s as chunks complete.

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

/// Request: stat a remote path.
pub const ID_STAT: [u8; 4] = *b"STAT";
/// Request: pull a remote file (the only request the client sends today).
pub const ID_RECV: [u8; 4] = *b"RECV";
/// Response: one payload chunk of a transfer.
pub const ID_DATA: [u8; 4] = *b"DATA";
/// Response: transfer complete.
pub const ID_DONE: [u8; 4] = *b"DONE";
/// Request: push a local file. Unimplemented.
pub const ID_SEND: [u8; 4] = *b"SEND";
/// Request: list a remote directory.
pub const ID_LIST: [u8; 4] = *b"LIST";
/// Response: one directory entry.
pub const ID_DENT: [u8; 4] = *b"DENT";
/// Request: unlink a remote path.
pub const ID_ULNK: [u8; 4] = *b"ULNK";
/// Request: leave sync mode.
pub const ID_QUIT: [u8; 4] = *b"QUIT";
/// Response: request accepted.
pub const ID_OKAY: [u8; 4] = *b"OKAY";
/// Response: request failed; payload is the error message.
pub const ID_FAIL: [u8; 4] = *b"FAIL";

/// Maximum remote path length the daemon accepts.
pub const REMOTE_PATH_MAX: usize = 1024;

/// Bytes in one chunk header: id + little-endian length.
const CHUNK_HEADER: usize = 8;

/// Errors produced by the sync chunk codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncWireError {
    /// A chunk opened with an id this client does not understand.
    #[error("unknown sync chunk id {:?}", String::from_utf8_lossy(.0))]
    UnknownId([u8; 4]),
}

/// One completed unit of a sync transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A slice of `DATA` payload. Large chunks surface as several of
    /// these, one per delivery, so the caller can stream to its sink
    /// without buffering whole chunks.
    Data(Bytes),
    /// The transfer finished.
    Done,
    /// The daemon aborted the transfer with this message.
    Fail(String),
}

/// Encode a sync request: id, little-endian path length, path bytes.
pub fn encode_request(id: [u8; 4], path: &[u8]) -> Vec<u8> {
    let mut request = Vec::with_capacity(CHUNK_HEADER + path.len());
    request.extend_from_slice(&id);
    request.extend_from_slice(&(path.len() as u32).to_le_bytes());
    request.extend_from_slice(path);
    request
}

/// Incremental parser for the sync chunk stream.
#[derive(Debug, Default)]
pub struct ChunkAssembler {
    buffer: BytesMut,
    /// Bytes of the current `DATA` chunk the daemon still owes us.
    pending: usize,
}

impl ChunkAssembler {
    /// Create an assembler with empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw delivery; returns every event it completes.
    ///
    /// Incomplete trailing bytes (a partial header, or a `FAIL` whose
    /// message has not fully arrived) stay buffered for the next push.
    ///
    /// # Errors
    ///
    /// Returns [`SyncWireError::UnknownId`] on an unrecognized chunk id;
    /// the stream is unrecoverable after that.
    pub fn push(&mut self, delivery: &[u8]) -> Result<Vec<SyncEvent>, SyncWireError> {
        self.buffer.extend_from_slice(delivery);
        let mut events = Vec::new();

        loop {
            if self.pending > 0 {
                if self.buffer.is_empty() {
                    break;
                }
                let take = self.pending.min(self.buffer.len());
                events.push(SyncEvent::Data(self.buffer.split_to(take).freeze()));
                self.pending -= take;
                continue;
            }

            if self.buffer.len() < CHUNK_HEADER {
                break;
            }
            let id = [self.buffer[0], self.buffer[1], self.buffer[2], self.buffer[3]];
            let length = u32::from_le_bytes([
                self.buffer[4],
                self.buffer[5],
                self.buffer[6],
                self.buffer[7],
            ]) as usize;

            match id {
                ID_DATA => {
                    self.buffer.advance(CHUNK_HEADER);
                    self.pending = length;
                }
                ID_DONE => {
                    // Length field unused.
                    self.buffer.advance(CHUNK_HEADER);
                    events.push(SyncEvent::Done);
                }
                ID_FAIL => {
                    // Wait for the whole message before surfacing it.
                    if self.buffer.len() < CHUNK_HEADER + length {
                        break;
                    }
                    self.buffer.advance(CHUNK_HEADER);
                    let message = self.buffer.split_to(length);
                    events.push(SyncEvent::Fail(
                        String::from_utf8_lossy(&message).into_owned(),
                    ));
                }
                other => return Err(SyncWireError::UnknownId(other)),
            }
        }

        Ok(events)
    }
}
