//! Deterministic host providers for driving the lock service in tests.
//!
//! The production host runtime is replaced by [`TestHost`]: its replicated
//! clock only moves when a test advances it, its timers only fire when the
//! test pumps them, and every `onLock` event is recorded in publication
//! order. Driving two services with the same script therefore observes the
//! exact same interleaving on both, which is what the determinism and
//! snapshot properties are asserted against.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::command::LockResponse;
use crate::runtime::{HostRuntime, TimerHandle};
use crate::service::LockService;
use crate::session::{SessionId, SessionStatus};

/// One `onLock` event captured by the recording sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockEvent {
    /// Session the event was addressed to.
    pub session: SessionId,
    /// The delivered response.
    pub response: LockResponse,
}

#[derive(Debug, Clone, Copy)]
struct ArmedTimer {
    waiter_index: u64,
    deadline_ms: u64,
}

/// Deterministic host runtime for tests.
///
/// - The replicated clock starts wherever the test puts it and moves only
///   through [`advance_to`](TestHost::advance_to).
/// - Timers armed by the service are held until
///   [`due_timers`](TestHost::due_timers) hands them back; the test feeds
///   each into [`LockService::on_timeout`], emulating the host's serialized
///   executor.
/// - Session lifecycle is a table the test flips explicitly, mirroring the
///   host marking a session inactive before it delivers the release
///   transition.
#[derive(Debug, Default)]
pub struct TestHost {
    clock_ms: AtomicU64,
    next_handle: AtomicU64,
    inner: Mutex<TestHostInner>,
}

#[derive(Debug, Default)]
struct TestHostInner {
    timers: BTreeMap<TimerHandle, ArmedTimer>,
    sessions: BTreeMap<SessionId, SessionStatus>,
    events: Vec<LockEvent>,
}

impl TestHost {
    /// Create a host with the replicated clock at `now_ms`.
    pub fn starting_at(now_ms: u64) -> Self {
        let host = Self::default();
        host.clock_ms.store(now_ms, Ordering::SeqCst);
        host
    }

    /// Register a session as active.
    pub fn open_session(&self, id: SessionId) {
        self.inner.lock().sessions.insert(id, SessionStatus::Active);
    }

    /// Flip a session to inactive, as the host does before delivering the
    /// session's release transition.
    pub fn deactivate_session(&self, id: SessionId) {
        self.inner
            .lock()
            .sessions
            .insert(id, SessionStatus::Inactive);
    }

    /// Forget a session entirely.
    pub fn drop_session(&self, id: SessionId) {
        self.inner.lock().sessions.remove(&id);
    }

    /// Move the replicated clock forward to `now_ms`.
    pub fn advance_to(&self, now_ms: u64) {
        self.clock_ms.fetch_max(now_ms, Ordering::SeqCst);
    }

    /// Remove and return the waiter indices of timers whose deadline has
    /// passed, ordered by deadline (ties break by arming order).
    pub fn due_timers(&self) -> Vec<u64> {
        let now = self.clock_ms.load(Ordering::SeqCst);
        let mut inner = self.inner.lock();
        let mut due: Vec<(u64, TimerHandle, u64)> = inner
            .timers
            .iter()
            .filter(|(_, timer)| timer.deadline_ms <= now)
            .map(|(handle, timer)| (timer.deadline_ms, *handle, timer.waiter_index))
            .collect();
        due.sort_unstable_by_key(|&(deadline, handle, _)| (deadline, handle));
        for (_, handle, _) in &due {
            inner.timers.remove(handle);
        }
        due.into_iter().map(|(_, _, waiter)| waiter).collect()
    }

    /// Number of timers still pending in the host.
    pub fn pending_timers(&self) -> usize {
        self.inner.lock().timers.len()
    }

    /// Waiter indices of pending timers, in arming order.
    pub fn pending_waiters(&self) -> Vec<u64> {
        self.inner
            .lock()
            .timers
            .values()
            .map(|timer| timer.waiter_index)
            .collect()
    }

    /// Drain the recorded `onLock` events.
    pub fn take_events(&self) -> Vec<LockEvent> {
        std::mem::take(&mut self.inner.lock().events)
    }

    /// Recorded events, without draining them.
    pub fn events(&self) -> Vec<LockEvent> {
        self.inner.lock().events.clone()
    }
}

impl HostRuntime for TestHost {
    fn now_millis(&self) -> u64 {
        self.clock_ms.load(Ordering::SeqCst)
    }

    fn schedule(&self, delay_ms: u64, waiter_index: u64) -> TimerHandle {
        let handle = TimerHandle::new(self.next_handle.fetch_add(1, Ordering::SeqCst) + 1);
        let deadline_ms = self.now_millis().saturating_add(delay_ms);
        self.inner.lock().timers.insert(
            handle,
            ArmedTimer {
                waiter_index,
                deadline_ms,
            },
        );
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        self.inner.lock().timers.remove(&handle);
    }

    fn session_status(&self, id: SessionId) -> Option<SessionStatus> {
        self.inner.lock().sessions.get(&id).copied()
    }

    fn publish_lock(&self, session: SessionId, response: LockResponse) {
        self.inner.lock().events.push(LockEvent { session, response });
    }
}

/// Advance the replicated clock to `now_ms` and deliver every due timer fire
/// to `service`, in deterministic order.
pub fn run_until(host: &TestHost, service: &mut LockService, now_ms: u64) {
    host.advance_to(now_ms);
    for waiter_index in host.due_timers() {
        service.on_timeout(waiter_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_only_moves_when_advanced() {
        let host = TestHost::starting_at(1_000);
        assert_eq!(host.now_millis(), 1_000);
        host.advance_to(1_500);
        assert_eq!(host.now_millis(), 1_500);
    }

    #[test]
    fn due_timers_fire_in_deadline_order() {
        let host = TestHost::starting_at(0);
        host.schedule(300, 3);
        host.schedule(100, 1);
        host.schedule(200, 2);

        host.advance_to(250);
        assert_eq!(host.due_timers(), vec![1, 2]);
        assert_eq!(host.pending_waiters(), vec![3]);
    }

    #[test]
    fn cancelled_timers_never_come_due() {
        let host = TestHost::starting_at(0);
        let handle = host.schedule(100, 1);
        host.cancel(handle);

        host.advance_to(500);
        assert!(host.due_timers().is_empty());
    }
}
