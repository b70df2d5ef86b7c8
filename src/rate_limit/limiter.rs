use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::clock::{duration_ms, Clock};
use crate::constants::PIN_RATE_LIMIT_PREFIX;
use crate::models::{RateLimitDecision, RateLimitEntry};
use crate::rate_limit::RateLimitStore;
use crate::security::ShareToken;

/// Rate limit key for PIN checks against one share token
pub fn pin_key(token: &ShareToken) -> String {
    format!("{PIN_RATE_LIMIT_PREFIX}{token}")
}

/// Fixed-window rate limiter over a pluggable store
///
/// Windows reset wholesale at `reset_at`, so a burst at the tail of one
/// window and another at the head of the next can admit up to twice the
/// limit in a short span.
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
    // Serialises get-then-set so two callers never both see `count < max`
    admit_lock: Mutex<()>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            admit_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn RateLimitStore> {
        &self.store
    }

    /// Count one attempt against `key`
    ///
    /// The increment is committed before this returns, so an attempt is
    /// consumed even if the caller abandons the request afterwards.
    pub fn check(&self, key: &str, max_attempts: u32, window: Duration) -> RateLimitDecision {
        let _guard = self.admit_lock.lock();
        let now = self.clock.now_ms();
        let existing = self.store.get(key, now);
        let (next, decision) =
            RateLimitEntry::admit(existing, now, max_attempts, duration_ms(window));
        if let Some(entry) = next {
            self.store.set(key, entry);
        }
        decision
    }

    /// Current state of `key` without consuming an attempt
    pub fn peek(&self, key: &str, max_attempts: u32) -> Option<RateLimitDecision> {
        let now = self.clock.now_ms();
        self.store.get(key, now).map(|entry| RateLimitDecision {
            allowed: entry.count < max_attempts,
            remaining: max_attempts.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        })
    }

    /// Forget all attempts recorded for `key`
    pub fn reset(&self, key: &str) {
        let _guard = self.admit_lock.lock();
        self.store.delete(key);
    }
}
