//! Expiration timers for queued waiters.

use std::collections::BTreeMap;

use crate::runtime::{HostRuntime, TimerHandle};

/// Timers armed for bounded-wait requests, keyed by the waiter's commit
/// index so entries survive snapshot round-trips.
///
/// An entry exists iff the matching queue entry has a deadline and is still
/// queued. Ordered map: replicated state never iterates in hash order.
#[derive(Debug, Default)]
pub(super) struct TimerTable {
    armed: BTreeMap<u64, TimerHandle>,
}

impl TimerTable {
    /// Arm a timer for `waiter_index`, elapsing after `delay_ms` of
    /// replicated time. Replaces any timer already armed for the index.
    pub(super) fn arm(&mut self, host: &dyn HostRuntime, waiter_index: u64, delay_ms: u64) {
        let handle = host.schedule(delay_ms, waiter_index);
        if let Some(stale) = self.armed.insert(waiter_index, handle) {
            host.cancel(stale);
        }
    }

    /// Disarm the timer for `waiter_index`, if one is armed.
    pub(super) fn disarm(&mut self, host: &dyn HostRuntime, waiter_index: u64) {
        if let Some(handle) = self.armed.remove(&waiter_index) {
            host.cancel(handle);
        }
    }

    /// Drop the entry for a timer that has fired; nothing to cancel.
    pub(super) fn fired(&mut self, waiter_index: u64) -> bool {
        self.armed.remove(&waiter_index).is_some()
    }

    /// Cancel and forget every armed timer.
    pub(super) fn clear(&mut self, host: &dyn HostRuntime) {
        for (_, handle) in std::mem::take(&mut self.armed) {
            host.cancel(handle);
        }
    }

    /// Commit indices with an armed timer, in index order.
    pub(super) fn armed_indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.armed.keys().copied()
    }
}
