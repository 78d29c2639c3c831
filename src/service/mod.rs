//! The replicated lock state machine.
//!
//! [`LockService`] is a deterministic command processor: driven with
//! identical committed inputs on every replica of a consensus group, it
//! yields identical lock decisions, event streams, and snapshots. All
//! mutable state lives on the instance; partitions each get their own.
//!
//! ## Module structure
//!
//! - `apply`: the `lock`/`unlock`/`isLocked` handlers, the shared promotion
//!   loop, and session release
//! - `timers`: expiration timers keyed by waiter commit index
//! - `snapshot`: the snapshot schema and backup/restore

mod apply;
mod snapshot;
mod timers;

pub use snapshot::LockSnapshot;

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::command::{CommandResponse, LockCommand, LockResponse};
use crate::runtime::HostRuntime;
use crate::session::SessionId;

use self::timers::TimerTable;

/// One acquisition attempt: the current holder or a queued waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    /// Client-chosen correlation id of the acquisition attempt.
    pub id: u32,
    /// Commit index of the `lock` command; unique within the partition and
    /// stable for the lifetime of the record.
    pub index: u64,
    /// Session the request belongs to.
    pub session: SessionId,
    /// Absolute deadline on the replicated clock, in milliseconds since the
    /// epoch. `0` means no deadline; once a record becomes the holder the
    /// field is unused.
    pub expire: u64,
}

/// The replicated lock state machine for one partition.
///
/// Entry points are grouped by input class: [`apply`](LockService::apply)
/// for committed commands, [`on_expire`](LockService::on_expire) and
/// [`on_close`](LockService::on_close) for replicated session transitions,
/// [`on_timeout`](LockService::on_timeout) for timer fires, and
/// [`backup`](LockService::backup)/[`restore`](LockService::restore) for log
/// compaction. The host invokes all of them from one serialized executor;
/// handlers complete synchronously and never observe host OS time.
pub struct LockService {
    host: Arc<dyn HostRuntime>,
    /// Current owner; `None` while the lock is free.
    holder: Option<LockHolder>,
    /// Waiters in commit-index (arrival) order.
    queue: VecDeque<LockHolder>,
    /// Expiration timers for queued bounded waiters.
    timers: TimerTable,
}

impl LockService {
    /// Create an empty lock service bound to a host runtime.
    pub fn new(host: Arc<dyn HostRuntime>) -> Self {
        Self {
            host,
            holder: None,
            queue: VecDeque::new(),
            timers: TimerTable::default(),
        }
    }

    /// Apply one committed command.
    ///
    /// `index` is the command's commit index and `session` the session that
    /// submitted it, both taken from the host's execution context for the
    /// log entry being applied.
    pub fn apply(
        &mut self,
        index: u64,
        session: SessionId,
        command: LockCommand,
    ) -> CommandResponse {
        tracing::debug!(index, %session, command = command.name(), "applying to state machine");
        match command {
            LockCommand::Lock(request) => {
                self.lock(index, session, request);
                CommandResponse::Ack
            }
            LockCommand::Unlock(request) => {
                CommandResponse::Unlock(self.unlock(index, session, request))
            }
            LockCommand::IsLocked(request) => {
                CommandResponse::IsLocked(self.is_locked(index, request))
            }
        }
    }

    /// Deadline fire for the waiter committed at `waiter_index`.
    ///
    /// Fires are idempotent: host-side cancellation is best-effort, so a
    /// fire may arrive for a waiter that was already promoted, rescinded, or
    /// released. Such fires find no queue entry and do nothing.
    pub fn on_timeout(&mut self, waiter_index: u64) {
        self.timers.fired(waiter_index);
        let Some(position) = self.queue.iter().position(|w| w.index == waiter_index) else {
            return;
        };
        let Some(waiter) = self.queue.remove(position) else {
            return;
        };
        // A timer can only ever have been armed for a bounded wait; firing
        // for a waiter without a deadline means the replicated state is
        // corrupt, and the replica must not keep running on it.
        assert!(
            waiter.expire > 0,
            "timer fired for waiter {waiter_index} with no deadline"
        );
        tracing::debug!(waiter_index, session = %waiter.session, id = waiter.id, "lock wait timed out");
        if self.session_active(waiter.session) {
            self.host.publish_lock(
                waiter.session,
                LockResponse {
                    index: waiter.index,
                    id: waiter.id,
                    acquired: false,
                },
            );
        }
    }

    /// Session expired by the cluster; `index` is the commit index of the
    /// expiration transition.
    pub fn on_expire(&mut self, index: u64, session: SessionId) {
        self.release_session(index, session);
    }

    /// Session closed by the client; `index` is the commit index of the
    /// close transition.
    pub fn on_close(&mut self, index: u64, session: SessionId) {
        self.release_session(index, session);
    }

    /// Current holder, if the lock is held.
    pub fn holder(&self) -> Option<&LockHolder> {
        self.holder.as_ref()
    }

    /// Queued waiters in promotion order.
    pub fn waiters(&self) -> impl Iterator<Item = &LockHolder> {
        self.queue.iter()
    }

    /// Commit indices of waiters with an armed expiration timer.
    pub fn armed_waiters(&self) -> impl Iterator<Item = u64> + '_ {
        self.timers.armed_indices()
    }

    fn session_active(&self, session: SessionId) -> bool {
        self.host
            .session_status(session)
            .is_some_and(|status| status.is_active())
    }
}
