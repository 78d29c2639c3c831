//! Command handlers, the promotion loop, and session release.

use crate::command::{
    IsLockedRequest, IsLockedResponse, LockRequest, LockResponse, UnlockRequest, UnlockResponse,
};
use crate::session::SessionId;

use super::{LockHolder, LockService};

impl LockService {
    /// `lock`: grant immediately when the lock is free, fail a try-lock when
    /// it is held, otherwise queue the request, arming a deadline timer when
    /// the wait is bounded.
    pub(super) fn lock(&mut self, index: u64, session: SessionId, request: LockRequest) {
        if self.holder.is_none() {
            // Immediate grant. The outcome still goes out as a session
            // event; the host delivers it after the command's own response.
            self.holder = Some(LockHolder {
                id: request.id,
                index,
                session,
                expire: 0,
            });
            tracing::debug!(index, %session, id = request.id, "lock granted");
            self.host.publish_lock(
                session,
                LockResponse {
                    index,
                    id: request.id,
                    acquired: true,
                },
            );
        } else if request.timeout == 0 {
            // Try-lock against a held lock fails immediately.
            self.host.publish_lock(
                session,
                LockResponse {
                    index,
                    id: request.id,
                    acquired: false,
                },
            );
        } else if request.timeout > 0 {
            // Bounded wait. The deadline lives on the replicated clock, so
            // every replica expires the waiter at the same logical point.
            let expire = self
                .host
                .now_millis()
                .saturating_add(request.timeout as u64);
            self.queue.push_back(LockHolder {
                id: request.id,
                index,
                session,
                expire,
            });
            self.timers
                .arm(self.host.as_ref(), index, request.timeout as u64);
            tracing::debug!(index, %session, id = request.id, expire, "waiter queued with deadline");
        } else {
            // Negative timeout waits forever.
            self.queue.push_back(LockHolder {
                id: request.id,
                index,
                session,
                expire: 0,
            });
            tracing::debug!(index, %session, id = request.id, "waiter queued");
        }
    }

    /// `unlock`: release when the caller is the holder it names; otherwise
    /// preserve the lock but withdraw any of the caller's queued requests
    /// carrying the same id.
    pub(super) fn unlock(
        &mut self,
        index: u64,
        session: SessionId,
        request: UnlockRequest,
    ) -> UnlockResponse {
        if let Some(holder) = self.holder {
            if request.index == 0 || request.index == holder.index {
                if holder.session != session || holder.id != request.id {
                    // Spurious unlock: the lock stays put, but the caller
                    // may be rescinding a pending request.
                    self.rescind(session, request.id);
                } else {
                    tracing::debug!(index, %session, id = request.id, "lock released");
                    self.holder = None;
                    self.promote(index);
                }
            }
        }
        UnlockResponse { index }
    }

    /// `isLocked`: a zero `request.index` asks "is anything held", a
    /// non-zero index asks "is this specific acquisition still in force".
    pub(super) fn is_locked(&self, index: u64, request: IsLockedRequest) -> IsLockedResponse {
        let locked = self
            .holder
            .is_some_and(|holder| request.index == 0 || holder.index == request.index);
        IsLockedResponse { index, locked }
    }

    /// Hand the lock to the first queued waiter whose session is still
    /// active, discarding dead waiters along the way. `index` is the commit
    /// index of the transition that freed the lock.
    ///
    /// A session can go inactive between the commit of its lock request and
    /// the moment the lock is offered to it; skipping here keeps every
    /// replica promoting the same surviving waiter.
    pub(super) fn promote(&mut self, index: u64) {
        while let Some(next) = self.queue.pop_front() {
            self.timers.disarm(self.host.as_ref(), next.index);
            if self.session_active(next.session) {
                tracing::debug!(
                    index,
                    session = %next.session,
                    id = next.id,
                    waiter_index = next.index,
                    "lock granted to waiter"
                );
                self.host.publish_lock(
                    next.session,
                    LockResponse {
                        index,
                        id: next.id,
                        acquired: true,
                    },
                );
                self.holder = Some(next);
                return;
            }
        }
    }

    /// Session teardown shared by expire and close: drop the session's
    /// queued waiters and their timers, then free and re-grant the lock if
    /// the session held it.
    pub(super) fn release_session(&mut self, index: u64, session: SessionId) {
        let mut removed = Vec::new();
        self.queue.retain(|waiter| {
            if waiter.session == session {
                removed.push(waiter.index);
                false
            } else {
                true
            }
        });
        for waiter_index in removed {
            self.timers.disarm(self.host.as_ref(), waiter_index);
            tracing::debug!(waiter_index, %session, "queued waiter dropped with session");
        }

        if self.holder.is_some_and(|holder| holder.session == session) {
            tracing::debug!(index, %session, "holder session released");
            self.holder = None;
            self.promote(index);
        }
    }

    /// Remove every queued waiter matching `(session, id)` and disarm its
    /// timer. Lets a client withdraw a pending lock request it no longer
    /// wants.
    fn rescind(&mut self, session: SessionId, id: u32) {
        let mut removed = Vec::new();
        self.queue.retain(|waiter| {
            if waiter.session == session && waiter.id == id {
                removed.push(waiter.index);
                false
            } else {
                true
            }
        });
        for waiter_index in removed {
            self.timers.disarm(self.host.as_ref(), waiter_index);
            tracing::debug!(waiter_index, %session, id, "pending lock request rescinded");
        }
    }
}
