//! Remote file pull over the sync sub-protocol.

use crate::devices::Device;
use crate::errors::AdbError;
use crate::session::Session;
use adb_protocol::sync::{self, ChunkAssembler, SyncEvent};
use std::time::{Duration, Instant};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// The sync sub-protocol, multiplexed over one transport-bound session.
///
/// Created by [`Device::sync_service`]; the underlying connection has
/// already been switched into sync mode and speaks chunk framing from
/// here on. One service instance serves one transfer.
pub struct SyncService {
    session: Session,
}

impl SyncService {
    /// Switch a transport-bound session into sync mode.
    pub(crate) async fn open(mut session: Session) -> Result<Self, AdbError> {
        session.send_command("sync:").await?;
        session.await_status().await?;
        Ok(Self { session })
    }

    /// Pull a remote file into `sink`.
    ///
    /// Sends a `RECV` request and streams the daemon's `DATA` chunks into
    /// the sink as they arrive; payloads split across deliveries are
    /// written incrementally, never buffered whole.
    ///
    /// # Errors
    ///
    /// - [`AdbError::PathTooLong`] before any bytes are sent
    /// - [`AdbError::Sync`] if the daemon reports `FAIL`, sends an
    ///   unknown chunk id, or closes the connection mid-transfer
    pub async fn pull_file<W>(
        &mut self,
        remote_path: &str,
        sink: &mut W,
    ) -> Result<PullStats, AdbError>
    where
        W: AsyncWrite + Unpin,
    {
        if remote_path.len() > sync::REMOTE_PATH_MAX {
            return Err(AdbError::PathTooLong(remote_path.len()));
        }

        tracing::debug!(remote_path, "requesting file pull");
        let started = Instant::now();
        self.session
            .send_raw(&sync::encode_request(sync::ID_RECV, remote_path.as_bytes()))
            .await?;

        let mut assembler = ChunkAssembler::new();
        let mut total_bytes: u64 = 0;
        loop {
            let delivery = self
                .session
                .read_chunk()
                .await?
                .ok_or_else(|| AdbError::Sync("connection closed before DONE".to_string()))?;

            for event in assembler.push(&delivery)? {
                match event {
                    SyncEvent::Data(payload) => {
                        total_bytes += payload.len() as u64;
                        sink.write_all(&payload).await?;
                    }
                    SyncEvent::Done => {
                        sink.flush().await?;
                        let stats = PullStats {
                            total_bytes,
                            elapsed: started.elapsed(),
                        };
                        tracing::info!(
                            bytes = stats.total_bytes,
                            rate = stats.bytes_per_sec(),
                            "pull complete"
                        );
                        return Ok(stats);
                    }
                    SyncEvent::Fail(message) => return Err(AdbError::Sync(message)),
                }
            }
        }
    }
}

/// Observability metadata for a completed pull.
#[derive(Debug, Clone, Copy)]
pub struct PullStats {
    /// Bytes written to the sink.
    pub total_bytes: u64,
    /// Wall time of the transfer.
    pub elapsed: Duration,
}

impl PullStats {
    /// Transfer rate in bytes per second.
    pub fn bytes_per_sec(&self) -> u64 {
        let millis = self.elapsed.as_millis().max(1) as u64;
        self.total_bytes * 1000 / millis
    }
}

impl Device<'_> {
    /// Open the sync sub-protocol on a fresh transport-bound connection.
    pub async fn sync_service(&self) -> Result<SyncService, AdbError> {
        SyncService::open(self.bind().await?).await
    }

    /// Pull a remote file into `sink`.
    pub async fn pull_file<W>(&self, remote_path: &str, sink: &mut W) -> Result<PullStats, AdbError>
    where
        W: AsyncWrite + Unpin,
    {
        self.sync_service().await?.pull_file(remote_path, sink).await
    }
}
