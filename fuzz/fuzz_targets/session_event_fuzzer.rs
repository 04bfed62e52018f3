//! Fuzz target for the session state machine
//!
//! Drives a `RoomSession` with arbitrary event sequences, including raw
//! bytes posing as inbound frames.
//!
//! # Invariants
//!
//! - No event sequence panics the session
//! - After a tick, every visible message expires strictly in the future
//! - Dust leaves the store empty no matter what preceded it

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use maskroom_core::{RoomSession, SessionEvent, SimEnv};
use maskroom_proto::RoomId;

#[derive(Debug, Arbitrary)]
enum Op {
    Open,
    TransportOpened,
    TransportClosed,
    ChangeSecret(String),
    ChangeTtl(u64),
    Send { text: String, ttl_override: Option<u64> },
    Frame(Vec<u8>),
    Dust,
    AdvanceAndTick(u16),
    Close,
}

fuzz_target!(|ops: Vec<Op>| {
    let env = SimEnv::seeded(7);
    let mut session = RoomSession::new(env.clone(), RoomId::new("fuzzroom"), String::new(), 60);

    for op in ops {
        match op {
            Op::Open => {
                let _ = session.handle(SessionEvent::Open);
            },
            Op::TransportOpened => {
                let _ = session.handle(SessionEvent::TransportOpened);
            },
            Op::TransportClosed => {
                let _ = session.handle(SessionEvent::TransportClosed);
            },
            Op::ChangeSecret(secret) => {
                let _ = session.handle(SessionEvent::SecretChanged(secret));
            },
            Op::ChangeTtl(ttl) => {
                let _ = session.handle(SessionEvent::DefaultTtlChanged(ttl));
            },
            Op::Send { text, ttl_override } => {
                let _ = session.handle(SessionEvent::Send { text, ttl_override });
            },
            Op::Frame(bytes) => {
                if let Ok(text) = String::from_utf8(bytes) {
                    let _ = session.handle(SessionEvent::FrameReceived(text));
                }
            },
            Op::Dust => {
                let _ = session.handle(SessionEvent::Dust);
                assert!(session.messages().is_empty(), "dust must always wipe");
            },
            Op::AdvanceAndTick(delta_ms) => {
                env.advance_ms(u64::from(delta_ms));
                let _ = session.handle(SessionEvent::Tick);
                let now = env.now_ms();
                assert!(
                    session.messages().iter().all(|m| m.expires_at_ms > now),
                    "sweep must leave only future expiries"
                );
            },
            Op::Close => {
                let _ = session.handle(SessionEvent::Close);
            },
        }
    }
});
