//! Session identity and lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a client session, assigned by the host.
///
/// Session ids are allocated by the host runtime and stay stable for the
/// lifetime of the client connection they represent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SessionId(u64);

impl SessionId {
    /// Create a session id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session_{}", self.0)
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Lifecycle state of a session, as tracked by the host.
///
/// The service reads this flag when deciding whether an event can still be
/// delivered; it learns about the transitions themselves through
/// `on_expire`/`on_close`, which the host replicates like any other state
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// The session is open and can receive events.
    Active,
    /// The session has expired or closed; events to it are suppressed.
    Inactive,
}

impl SessionStatus {
    /// Whether events can still be delivered to the session.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }
}
