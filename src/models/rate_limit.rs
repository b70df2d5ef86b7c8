use serde::{Deserialize, Serialize};

/// Fixed-window attempt counter for one rate limit key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitEntry {
    /// Attempts admitted in the current window
    pub count: u32,
    /// Unix milliseconds after which the window is over
    pub reset_at: i64,
}

/// Outcome of one rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    #[serde(rename = "resetAt")]
    pub reset_at: i64,
}

impl RateLimitEntry {
    /// Start a new window with one attempt counted
    pub fn open(now: i64, window_ms: i64) -> Self {
        Self {
            count: 1,
            reset_at: now.saturating_add(window_ms),
        }
    }

    /// A window is over strictly after `reset_at`
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.reset_at
    }

    /// Admit or reject one attempt against an existing (or absent) entry
    ///
    /// Returns the entry to store (`None` when rejected, leaving the stored
    /// entry untouched) and the decision for the caller.
    pub fn admit(
        existing: Option<Self>,
        now: i64,
        max_attempts: u32,
        window_ms: i64,
    ) -> (Option<Self>, RateLimitDecision) {
        match existing {
            Some(entry) if !entry.is_expired(now) => {
                if entry.count >= max_attempts {
                    (
                        None,
                        RateLimitDecision {
                            allowed: false,
                            remaining: 0,
                            reset_at: entry.reset_at,
                        },
                    )
                } else {
                    let next = Self {
                        count: entry.count + 1,
                        reset_at: entry.reset_at,
                    };
                    (
                        Some(next),
                        RateLimitDecision {
                            allowed: true,
                            remaining: max_attempts - next.count,
                            reset_at: next.reset_at,
                        },
                    )
                }
            }
            _ => {
                let fresh = Self::open(now, window_ms);
                (
                    Some(fresh),
                    RateLimitDecision {
                        allowed: true,
                        remaining: max_attempts.saturating_sub(fresh.count),
                        reset_at: fresh.reset_at,
                    },
                )
            }
        }
    }
}

impl RateLimitDecision {
    /// Whole minutes until the window resets, at least one
    pub fn wait_minutes(&self, now: i64) -> i64 {
        let wait_ms = (self.reset_at - now).max(0);
        ((wait_ms + 59_999) / 60_000).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_000_000;
    const WINDOW: i64 = 900_000;

    #[test]
    fn test_first_attempt_opens_window() {
        let (entry, decision) = RateLimitEntry::admit(None, NOW, 5, WINDOW);

        assert_eq!(entry, Some(RateLimitEntry { count: 1, reset_at: NOW + WINDOW }));
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
        assert_eq!(decision.reset_at, NOW + WINDOW);
    }

    #[test]
    fn test_limit_reached_leaves_entry_untouched() {
        let full = RateLimitEntry { count: 5, reset_at: NOW + 10 };
        let (entry, decision) = RateLimitEntry::admit(Some(full), NOW, 5, WINDOW);

        assert!(entry.is_none());
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.reset_at, NOW + 10);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let full = RateLimitEntry { count: 5, reset_at: NOW };

        // At reset_at the window is still open
        let (_, at_reset) = RateLimitEntry::admit(Some(full), NOW, 5, WINDOW);
        assert!(!at_reset.allowed);

        // One millisecond later a fresh window starts
        let (entry, after) = RateLimitEntry::admit(Some(full), NOW + 1, 5, WINDOW);
        assert!(after.allowed);
        assert_eq!(entry.map(|e| e.count), Some(1));
        assert_eq!(after.reset_at, NOW + 1 + WINDOW);
    }

    #[test]
    fn test_wait_minutes_rounds_up() {
        let decision = RateLimitDecision { allowed: false, remaining: 0, reset_at: NOW + 61_000 };
        assert_eq!(decision.wait_minutes(NOW), 2);
        assert_eq!(decision.wait_minutes(NOW + 61_000), 1);
        assert_eq!(decision.wait_minutes(NOW + 1_000), 1);
    }
}
