//! FitLink share server library
//!
//! Profiles of body measurements shared through a public token, with edits
//! gated by a 4-digit PIN, a per-token rate limit and short-lived edit
//! sessions. Exported for the binary and for integration tests.

pub mod clock;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod security;

pub use config::Config;
pub use db::{open_database, Db, ProfileStore};
pub use error::{AppError, Result};

use std::sync::Arc;

use clock::{Clock, SystemClock};
use rate_limit::{MemoryStore, RateLimitStore, RateLimiter};
use security::{AuthorizationGate, PinPolicy, SessionIssuer};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub profiles: ProfileStore,
    pub gate: Arc<AuthorizationGate>,
    pub rate_limits: Arc<dyn RateLimitStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create a new AppState on the system clock with in-memory rate limits
    pub fn new(db: Db, config: Config) -> Result<Self> {
        Self::with_parts(db, config, Arc::new(SystemClock), Arc::new(MemoryStore::new()))
    }

    /// Create an AppState with an explicit clock and rate limit store
    pub fn with_parts(
        db: Db,
        config: Config,
        clock: Arc<dyn Clock>,
        rate_limits: Arc<dyn RateLimitStore>,
    ) -> Result<Self> {
        let sessions = SessionIssuer::new(&config.session_secret, config.edit_session_ttl())?;
        let limiter = RateLimiter::new(rate_limits.clone(), clock.clone());
        let policy = PinPolicy {
            max_attempts: config.pin_max_attempts,
            window: config.pin_window(),
            hash_cost: config.pin_hash_cost,
        };
        let gate = AuthorizationGate::new(limiter, sessions, clock.clone(), policy)?;

        Ok(Self {
            profiles: ProfileStore::new(db.clone()),
            db,
            config,
            gate: Arc::new(gate),
            rate_limits,
            clock,
        })
    }
}
