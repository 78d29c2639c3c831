//! Host-runtime contract.
//!
//! The lock service is embedded in a consensus host that feeds it committed
//! commands, replicated session lifecycle transitions, and timer fires, all
//! inside one serialized executor. This module defines the outbound half of
//! that contract: the replicated clock, timer scheduling, session lookup,
//! and session-event publication.

use crate::command::LockResponse;
use crate::session::{SessionId, SessionStatus};

/// Opaque handle to a scheduled timer, assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Create a handle from the host's raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw identifier.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Outbound surface the host exposes to the lock service.
///
/// Implementations use interior mutability; the service holds the runtime as
/// `Arc<dyn HostRuntime>` and only calls it from within the serialized
/// executor, so no method is ever entered concurrently for one service
/// instance.
///
/// # Contract
///
/// - [`now_millis`](HostRuntime::now_millis) reads the *replicated* wall
///   clock: at a given log position every replica observes the same value.
///   Host OS time must never reach the service.
/// - A timer armed with [`schedule`](HostRuntime::schedule) elapses against
///   that same replicated clock; the host then invokes
///   [`LockService::on_timeout`](crate::service::LockService::on_timeout)
///   with the `waiter_index` the timer was armed with, inside the serialized
///   executor and strictly after the command that armed it.
/// - [`cancel`](HostRuntime::cancel) is best-effort: a fire that raced the
///   cancel into the executor is delivered anyway, and the service tolerates
///   it.
/// - [`publish_lock`](HostRuntime::publish_lock) delivers the `onLock`
///   session event. An event published while a command is being applied must
///   reach the client strictly after that command's own response.
pub trait HostRuntime: Send + Sync {
    /// Current replicated wall-clock time, in milliseconds since the epoch.
    fn now_millis(&self) -> u64;

    /// Arm a timer that elapses after `delay_ms` of replicated time.
    fn schedule(&self, delay_ms: u64, waiter_index: u64) -> TimerHandle;

    /// Cancel a previously armed timer.
    fn cancel(&self, handle: TimerHandle);

    /// Look up a session's lifecycle state; `None` once the host no longer
    /// tracks the session.
    fn session_status(&self, id: SessionId) -> Option<SessionStatus>;

    /// Publish an `onLock` event to a session.
    fn publish_lock(&self, session: SessionId, response: LockResponse);
}
