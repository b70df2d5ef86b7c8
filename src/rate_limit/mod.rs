//! PIN attempt rate limiting
//!
//! A fixed-window counter keyed by string, backed by a swappable store, plus
//! the periodic sweep that evicts abandoned keys.

pub mod limiter;
pub mod store;
pub mod sweep;

pub use limiter::{pin_key, RateLimiter};
pub use store::{MemoryStore, RateLimitStore};
pub use sweep::{spawn_sweeper, sweep_once, SweepHandle};
