//! Snapshot schema and backup/restore.
//!
//! Only the holder and the queue are serialized; timers are derived state
//! and are re-armed from the replicated clock during restore.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::session::SessionId;

use super::{LockHolder, LockService};

/// Serialized form of one acquisition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct HolderRecord {
    id: u32,
    index: u64,
    session_id: u64,
    expire: u64,
}

impl From<&LockHolder> for HolderRecord {
    fn from(holder: &LockHolder) -> Self {
        Self {
            id: holder.id,
            index: holder.index,
            session_id: holder.session.as_u64(),
            expire: holder.expire,
        }
    }
}

impl From<HolderRecord> for LockHolder {
    fn from(record: HolderRecord) -> Self {
        Self {
            id: record.id,
            index: record.index,
            session: SessionId::new(record.session_id),
            expire: record.expire,
        }
    }
}

/// Snapshot of the lock state, produced for log compaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSnapshot {
    /// Current holder, when the lock is held.
    lock: Option<HolderRecord>,
    /// Waiters in promotion order.
    queue: Vec<HolderRecord>,
}

impl LockService {
    /// Serialize the lock state into `sink`.
    pub fn backup(&self, sink: &mut dyn Write) -> Result<(), SnapshotError> {
        let snapshot = LockSnapshot {
            lock: self.holder.as_ref().map(HolderRecord::from),
            queue: self.queue.iter().map(HolderRecord::from).collect(),
        };
        serde_json::to_writer(sink, &snapshot).map_err(SnapshotError::Write)
    }

    /// Rebuild the lock state from `source`, replacing whatever is present.
    ///
    /// Every armed timer is cancelled, then deadline timers are re-armed
    /// from the snapshot with `max(0, expire - now)` of replicated time. A
    /// deadline already in the past is re-armed with zero delay rather than
    /// fired inline, so the expiration still flows through the serialized
    /// executor after restore completes.
    pub fn restore(&mut self, source: &mut dyn Read) -> Result<(), SnapshotError> {
        let snapshot: LockSnapshot =
            serde_json::from_reader(source).map_err(SnapshotError::Corrupt)?;

        self.holder = snapshot.lock.map(LockHolder::from);
        self.queue = snapshot.queue.into_iter().map(LockHolder::from).collect();

        self.timers.clear(self.host.as_ref());
        let now = self.host.now_millis();
        for waiter in &self.queue {
            if waiter.expire > 0 {
                let delay_ms = waiter.expire.saturating_sub(now);
                self.timers.arm(self.host.as_ref(), waiter.index, delay_ms);
            }
        }

        tracing::info!(
            held = self.holder.is_some(),
            waiters = self.queue.len(),
            "lock state restored from snapshot"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_schema_round_trips() {
        let snapshot = LockSnapshot {
            lock: Some(HolderRecord {
                id: 1,
                index: 10,
                session_id: 42,
                expire: 0,
            }),
            queue: vec![
                HolderRecord {
                    id: 5,
                    index: 21,
                    session_id: 43,
                    expire: 2_000,
                },
                HolderRecord {
                    id: 7,
                    index: 22,
                    session_id: 44,
                    expire: 0,
                },
            ],
        };

        let bytes = serde_json::to_vec(&snapshot).unwrap();
        let decoded: LockSnapshot = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn free_lock_serializes_without_a_holder() {
        let bytes = serde_json::to_vec(&LockSnapshot::default()).unwrap();
        let decoded: LockSnapshot = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded.lock, None);
        assert!(decoded.queue.is_empty());
    }
}
