//! Replicated, session-scoped exclusive lock state machine.
//!
//! `replock` implements the deterministic core of a distributed lock
//! primitive: a command processor that, applied identically on every replica
//! of a consensus group, provides a fair FIFO lock with bounded wait
//! (try-lock with timeout), snapshot/restore for log compaction, and
//! automatic release when a session ends.
//!
//! The consensus transport, log storage, and election live in the host
//! runtime; this crate consumes that host through [`HostRuntime`] and is
//! driven entirely by committed inputs:
//!
//! - commands ([`LockCommand`]) applied in commit order,
//! - replicated session lifecycle transitions
//!   ([`on_expire`](LockService::on_expire)/[`on_close`](LockService::on_close)),
//! - timer fires scheduled against the replicated clock.
//!
//! Every lock acquisition outcome (immediate grant, delayed grant, or
//! timeout) is delivered as an `onLock` session event through the host
//! rather than as a command return value: a waiter's grant is triggered by
//! some other client's unlock or by a timer, so it can never be its own
//! command's response, and immediate grants use the same channel so clients
//! route all outcomes through one place.
//!
//! Everything executes inside the host's serialized executor: no handler
//! suspends, no two handlers interleave on one partition's state, and no
//! decision ever reads host OS time.

pub mod command;
pub mod error;
pub mod runtime;
pub mod service;
pub mod session;
pub mod testing;

pub use command::{
    CommandResponse, IsLockedRequest, IsLockedResponse, LockCommand, LockRequest, LockResponse,
    UnlockRequest, UnlockResponse,
};
pub use error::SnapshotError;
pub use runtime::{HostRuntime, TimerHandle};
pub use service::{LockHolder, LockService, LockSnapshot};
pub use session::{SessionId, SessionStatus};
