//! Shared helpers for lock service integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use replock::testing::{LockEvent, TestHost};
use replock::{
    CommandResponse, HostRuntime, IsLockedRequest, LockCommand, LockRequest, LockResponse,
    LockService, SessionId, UnlockRequest, UnlockResponse,
};

/// Build a service bound to a fresh deterministic host, with the replicated
/// clock at `now_ms` and the given sessions open.
pub fn setup(now_ms: u64, sessions: &[u64]) -> (Arc<TestHost>, LockService) {
    let host = Arc::new(TestHost::starting_at(now_ms));
    for &session in sessions {
        host.open_session(SessionId::new(session));
    }
    let service = LockService::new(Arc::clone(&host) as Arc<dyn HostRuntime>);
    (host, service)
}

/// Apply a `lock` command.
pub fn lock(
    service: &mut LockService,
    index: u64,
    session: u64,
    id: u32,
    timeout: i64,
) -> CommandResponse {
    service.apply(
        index,
        SessionId::new(session),
        LockCommand::Lock(LockRequest { id, timeout }),
    )
}

/// Apply an `unlock` command and unwrap its response.
pub fn unlock(
    service: &mut LockService,
    index: u64,
    session: u64,
    held_index: u64,
    id: u32,
) -> UnlockResponse {
    match service.apply(
        index,
        SessionId::new(session),
        LockCommand::Unlock(UnlockRequest {
            index: held_index,
            id,
        }),
    ) {
        CommandResponse::Unlock(response) => response,
        other => panic!("unlock returned unexpected response: {:?}", other),
    }
}

/// Apply an `isLocked` query and unwrap the `locked` flag.
pub fn is_locked(service: &mut LockService, index: u64, session: u64, queried: u64) -> bool {
    match service.apply(
        index,
        SessionId::new(session),
        LockCommand::IsLocked(IsLockedRequest { index: queried }),
    ) {
        CommandResponse::IsLocked(response) => response.locked,
        other => panic!("isLocked returned unexpected response: {:?}", other),
    }
}

/// Expected `onLock` grant event.
pub fn grant(session: u64, index: u64, id: u32) -> LockEvent {
    LockEvent {
        session: SessionId::new(session),
        response: LockResponse {
            index,
            id,
            acquired: true,
        },
    }
}

/// Expected `onLock` failure event.
pub fn denial(session: u64, index: u64, id: u32) -> LockEvent {
    LockEvent {
        session: SessionId::new(session),
        response: LockResponse {
            index,
            id,
            acquired: false,
        },
    }
}
