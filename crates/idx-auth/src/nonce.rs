//! Nonce sequencer with monotonic guarantees.
//!
//! The exchange rejects any nonce that is not larger than the last one it
//! accepted for the same key. The counter is seeded from wall-clock
//! milliseconds so a restarted process starts above the previous run.

use std::sync::atomic::{AtomicU64, Ordering};

/// Trait for obtaining current time, enabling testability.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    /// Returns current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before Unix epoch")
            .as_millis() as u64
    }
}

/// Issues nonces for one credential.
///
/// # Guarantees
/// - Every call to [`next`](Self::next) returns a value larger than any
///   value previously returned, across threads
/// - Gaps are allowed, duplicates never happen
/// - Overflow panics instead of wrapping
///
/// Construct once at start-up and share by `Arc`.
pub struct NonceSequencer<C: Clock = SystemClock> {
    /// Last issued nonce.
    counter: AtomicU64,
    clock: C,
}

impl<C: Clock> NonceSequencer<C> {
    /// Drift above which a server sync is logged as a warning.
    const DRIFT_WARN_THRESHOLD_MS: i64 = 2000;

    /// Creates a sequencer seeded from the clock's current time.
    #[must_use]
    pub fn new(clock: C) -> Self {
        let now = clock.now_ms();
        Self {
            counter: AtomicU64::new(now),
            clock,
        }
    }

    /// Returns the next nonce.
    ///
    /// # Panics
    /// Panics if the counter would overflow `u64`.
    pub fn next(&self) -> u64 {
        loop {
            let current = self.counter.load(Ordering::Acquire);
            let Some(next_val) = current.checked_add(1) else {
                panic!("nonce counter exhausted at {current}");
            };

            match self.counter.compare_exchange_weak(
                current,
                next_val,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next_val,
                Err(_) => continue,
            }
        }
    }

    /// Last issued nonce (or the seed if none has been issued).
    #[must_use]
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    /// Raises the counter to at least `min_value`. Never lowers it.
    pub fn fast_forward(&self, min_value: u64) {
        loop {
            let current = self.counter.load(Ordering::Acquire);
            if current >= min_value {
                break;
            }

            match self.counter.compare_exchange_weak(
                current,
                min_value,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(_) => continue,
            }
        }
    }

    /// Aligns the counter with the exchange clock.
    ///
    /// Returns the offset `server - local` in milliseconds.
    pub fn sync_with_server(&self, server_time_ms: u64) -> i64 {
        let local_time = self.clock.now_ms();

        let offset = if server_time_ms >= local_time {
            (server_time_ms - local_time) as i64
        } else {
            -((local_time - server_time_ms) as i64)
        };

        if offset.abs() > Self::DRIFT_WARN_THRESHOLD_MS {
            tracing::warn!(
                offset_ms = offset,
                "significant time drift detected with server"
            );
        }

        self.fast_forward(server_time_ms);
        offset
    }
}

impl NonceSequencer<SystemClock> {
    /// Creates a sequencer on the system clock.
    #[must_use]
    pub fn with_system_clock() -> Self {
        Self::new(SystemClock)
    }
}
