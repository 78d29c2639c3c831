//! Replicated lock commands and their responses.
//!
//! Every mutation of the lock state travels through [`LockCommand`].
//! Commands are serialized into the host's replicated log and applied in
//! commit order on every replica, so the enum below is the complete write
//! surface of the service.

use serde::{Deserialize, Serialize};

/// Commands that are replicated through the host's consensus log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum LockCommand {
    /// Acquire the lock, or join the waiter queue.
    Lock(LockRequest),
    /// Release the lock, or withdraw a pending acquisition.
    Unlock(UnlockRequest),
    /// Query whether the lock (or one specific acquisition) is in force.
    IsLocked(IsLockedRequest),
}

impl LockCommand {
    /// Human-readable name for this command type.
    pub fn name(&self) -> &'static str {
        match self {
            LockCommand::Lock(_) => "Lock",
            LockCommand::Unlock(_) => "Unlock",
            LockCommand::IsLocked(_) => "IsLocked",
        }
    }
}

/// Request to acquire the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRequest {
    /// Client-chosen correlation id for this acquisition attempt.
    pub id: u32,
    /// Wait budget in milliseconds: `0` never waits (try-lock), a negative
    /// value waits forever, a positive value waits until the replicated
    /// clock passes `now + timeout`.
    pub timeout: i64,
}

/// Request to release the lock or withdraw a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRequest {
    /// Commit index of the acquisition to release; `0` means "release
    /// whatever I hold".
    pub index: u64,
    /// Correlation id the acquisition was requested with.
    pub id: u32,
}

/// Request to test the lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsLockedRequest {
    /// When non-zero, ask whether this specific acquisition still holds;
    /// when zero, ask whether anything holds.
    pub index: u64,
}

/// Outcome of a lock acquisition attempt, delivered as a session event.
///
/// Grants and failures alike arrive through the host's event channel rather
/// than as the `lock` command's return value: a waiter's grant is triggered
/// by some other client's unlock or by a timer, so it can never be the
/// waiter's own response, and immediate outcomes use the same channel for
/// uniformity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockResponse {
    /// For a grant, the commit index of the transition that granted the
    /// lock; for a timeout failure, the waiter's own commit index.
    pub index: u64,
    /// Correlation id from the originating request.
    pub id: u32,
    /// Whether the lock was acquired.
    pub acquired: bool,
}

/// Response to an `unlock` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockResponse {
    /// Commit index of the unlock command.
    pub index: u64,
}

/// Response to an `isLocked` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsLockedResponse {
    /// Commit index of the query command.
    pub index: u64,
    /// Whether the queried acquisition (or any, for index 0) is in force.
    pub locked: bool,
}

/// Value returned to the host from applying one committed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandResponse {
    /// `lock` has no direct return value; its outcome follows as an
    /// `onLock` session event, delivered after this acknowledgement.
    Ack,
    /// Response to an `unlock` command.
    Unlock(UnlockResponse),
    /// Response to an `isLocked` command.
    IsLocked(IsLockedResponse),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names() {
        let lock = LockCommand::Lock(LockRequest { id: 1, timeout: 0 });
        let unlock = LockCommand::Unlock(UnlockRequest { index: 0, id: 1 });
        let query = LockCommand::IsLocked(IsLockedRequest { index: 0 });
        assert_eq!(lock.name(), "Lock");
        assert_eq!(unlock.name(), "Unlock");
        assert_eq!(query.name(), "IsLocked");
    }

    #[test]
    fn commands_round_trip_through_the_log_encoding() {
        let command = LockCommand::Lock(LockRequest { id: 7, timeout: -1 });
        let bytes = serde_json::to_vec(&command).unwrap();
        let decoded: LockCommand = serde_json::from_slice(&bytes).unwrap();
        match decoded {
            LockCommand::Lock(request) => {
                assert_eq!(request, LockRequest { id: 7, timeout: -1 });
            }
            other => panic!("decoded wrong variant: {:?}", other),
        }
    }
}
