//! Environment abstraction for deterministic testing.
//!
//! Decouples protocol logic from system resources (time, randomness). The
//! session reads the wall clock through this trait because message expiry is
//! defined in Unix milliseconds on the wire, and takes its nonce entropy from
//! it so tests can replay exact byte sequences.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

/// Abstract environment providing time and randomness.
///
/// Implementations MUST guarantee:
///
/// - `now_ms()` never goes backwards within a single execution context
/// - `random_bytes()` uses cryptographically secure entropy in production
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time in milliseconds since the Unix epoch.
    ///
    /// Wall-clock rather than monotonic because timestamps and expiry
    /// instants are exchanged between sessions on different machines.
    fn now_ms(&self) -> u64;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    ///
    /// Convenience for identifiers that only need to be locally unique.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}

/// Production environment using system time and cryptographic RNG.
#[derive(Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).unwrap_or_else(|e| {
            // NOTE: This should never fail on supported platforms, if it does
            // it's a critical error. Fill with zeros as a fallback (not
            // secure, but prevents panic).
            tracing::error!("getrandom failed: {}", e);
            buffer.fill(0);
        });
    }
}

/// Simulated environment with a virtual clock and seeded RNG.
///
/// Deterministic per seed and NOT cryptographically secure; for tests and
/// simulation only. Clones share the same clock and RNG state, so a test can
/// hold one handle to advance time while the session holds another.
#[derive(Clone)]
pub struct SimEnv {
    now_ms: Arc<AtomicU64>,
    rng_state: Arc<AtomicU64>,
}

impl SimEnv {
    /// Create a simulated environment at time zero with a fixed seed.
    #[must_use]
    pub fn new() -> Self {
        Self::seeded(0x6d61_736b)
    }

    /// Create a simulated environment with an explicit RNG seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(0)),
            // xorshift has a zero fixed point, so force a set bit
            rng_state: Arc::new(AtomicU64::new(seed | 1)),
        }
    }

    /// Set the virtual clock to an absolute time.
    pub fn set_now_ms(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::Relaxed);
    }

    /// Advance the virtual clock.
    pub fn advance_ms(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::Relaxed);
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Relaxed)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        for chunk in buffer.chunks_mut(8) {
            let mut x = self.rng_state.load(Ordering::Relaxed);
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.rng_state.store(x, Ordering::Relaxed);

            for (byte, value) in chunk.iter_mut().zip(x.to_be_bytes()) {
                *byte = value;
            }
        }
    }
}
