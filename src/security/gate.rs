//! Authorization gate for edits to a shared profile
//!
//! Per (client, token) the gate moves from locked to unlocked only through a
//! correct PIN check admitted by the rate limiter, and falls back to locked
//! when the issued credential expires. Repeated wrong PINs only ever cause
//! time-windowed denial.
//!
//! An unknown token costs the same bcrypt comparison as a wrong PIN; the
//! comparison runs against a decoy hash made at the configured cost.
//!
//! Denials are logged by category only, never with the token, PIN or
//! credential.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::constants::ERR_INVALID_PIN;
use crate::error::{AppError, Result};
use crate::rate_limit::{pin_key, RateLimiter};
use crate::security::{pin, EditCredential, SessionIssuer, ShareToken};

/// Attempt ceiling for PIN checks against one token
#[derive(Debug, Clone, Copy)]
pub struct PinPolicy {
    pub max_attempts: u32,
    pub window: Duration,
    /// bcrypt cost of stored hashes, matched by the decoy hash
    pub hash_cost: u32,
}

/// PIN behind the decoy hash; never accepted, see [`verify_or_decoy`]
const DECOY_PIN: &str = "0000";

/// Result of a successful PIN check
#[derive(Debug, Clone)]
pub struct Unlocked {
    pub token: ShareToken,
    pub credential: EditCredential,
    /// Attempts left in the current window
    pub remaining: u32,
}

pub struct AuthorizationGate {
    limiter: RateLimiter,
    sessions: SessionIssuer,
    clock: Arc<dyn Clock>,
    policy: PinPolicy,
    decoy_hash: String,
}

impl AuthorizationGate {
    pub fn new(
        limiter: RateLimiter,
        sessions: SessionIssuer,
        clock: Arc<dyn Clock>,
        policy: PinPolicy,
    ) -> Result<Self> {
        let decoy_hash = pin::hash_pin_with_cost(DECOY_PIN, policy.hash_cost)?;
        Ok(Self {
            limiter,
            sessions,
            clock,
            policy,
            decoy_hash,
        })
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    pub fn policy(&self) -> PinPolicy {
        self.policy
    }

    /// Check a PIN and issue an edit credential on success
    ///
    /// `lookup` fetches the stored PIN hash for the token; it runs on the
    /// blocking pool together with the hash comparison. The attempt is
    /// counted before `lookup` starts, so abandoning the request afterwards
    /// still consumes it. An unknown token is reported exactly like a wrong
    /// PIN and runs one decoy comparison in place of the real one.
    pub async fn unlock<F>(&self, token: &str, pin: &str, lookup: F) -> Result<Unlocked>
    where
        F: FnOnce(&ShareToken) -> Result<Option<String>> + Send + 'static,
    {
        let token = ShareToken::parse(token)?;
        if !pin::is_well_formed(pin) {
            return Err(AppError::InvalidFormat(ERR_INVALID_PIN));
        }

        let decision =
            self.limiter
                .check(&pin_key(&token), self.policy.max_attempts, self.policy.window);
        if !decision.allowed {
            tracing::warn!("PIN check rejected: rate limited");
            return Err(AppError::RateLimited {
                wait_minutes: decision.wait_minutes(self.clock.now_ms()),
            });
        }

        let candidate = pin.to_string();
        let lookup_token = token.clone();
        let decoy_hash = self.decoy_hash.clone();
        let verified = tokio::task::spawn_blocking(move || -> Result<bool> {
            let stored = lookup(&lookup_token)?;
            Ok(verify_or_decoy(
                &candidate,
                stored.as_deref(),
                &decoy_hash,
                pin::verify_pin,
            ))
        })
        .await??;

        if !verified {
            tracing::warn!("PIN check rejected: unauthorized");
            return Err(AppError::Unauthorized);
        }

        let credential = self.sessions.issue(&token, self.clock.now_ms());
        tracing::info!("Edit session issued");

        Ok(Unlocked {
            token,
            credential,
            remaining: decision.remaining,
        })
    }

    /// Decide whether a mutating request on `token` may proceed
    ///
    /// Every failure (malformed token, missing, expired or mis-scoped
    /// credential) is the same `Unauthorized`.
    pub fn authorize(&self, token: &str, credential: Option<&str>) -> Result<ShareToken> {
        let Ok(token) = ShareToken::parse(token) else {
            tracing::warn!("Edit rejected: unauthorized");
            return Err(AppError::Unauthorized);
        };
        if self
            .sessions
            .authorize(&token, credential, self.clock.now_ms())
        {
            Ok(token)
        } else {
            tracing::warn!("Edit rejected: unauthorized");
            Err(AppError::Unauthorized)
        }
    }
}

/// Compare `candidate` with the stored hash, or with `decoy_hash` when there
/// is none. Exactly one comparison runs either way; the decoy never verifies.
fn verify_or_decoy<V>(candidate: &str, stored: Option<&str>, decoy_hash: &str, verify: V) -> bool
where
    V: FnOnce(&str, &str) -> bool,
{
    match stored {
        Some(hash) => verify(candidate, hash),
        None => {
            let _ = verify(candidate, decoy_hash);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::rate_limit::MemoryStore;

    const START: i64 = 1_700_000_000_000;
    const SECRET: &str = "gate-test-secret-with-at-least-32b";

    fn gate() -> (AuthorizationGate, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let limiter = RateLimiter::new(Arc::new(MemoryStore::new()), clock.clone());
        let sessions = SessionIssuer::new(SECRET, Duration::from_secs(3600)).unwrap();
        let policy = PinPolicy {
            max_attempts: 5,
            window: Duration::from_secs(900),
            hash_cost: 4,
        };
        (
            AuthorizationGate::new(limiter, sessions, clock.clone(), policy).unwrap(),
            clock,
        )
    }

    fn hash_lookup(
        hash: Option<String>,
    ) -> impl FnOnce(&ShareToken) -> Result<Option<String>> + Send + 'static {
        move |_: &ShareToken| Ok(hash)
    }

    #[tokio::test]
    async fn test_correct_pin_unlocks() {
        let (gate, _clock) = gate();
        let token = ShareToken::generate();
        let hash = pin::hash_pin_with_cost("4821", 4).unwrap();

        let unlocked = gate
            .unlock(token.as_str(), "4821", hash_lookup(Some(hash)))
            .await
            .unwrap();

        assert_eq!(unlocked.remaining, 4);
        assert_eq!(unlocked.token, token);
        assert!(gate
            .authorize(token.as_str(), Some(&unlocked.credential.value))
            .is_ok());
    }

    #[tokio::test]
    async fn test_wrong_pin_and_unknown_token_look_the_same() {
        let (gate, _clock) = gate();
        let token = ShareToken::generate();
        let hash = pin::hash_pin_with_cost("4821", 4).unwrap();

        let wrong = gate
            .unlock(token.as_str(), "1111", hash_lookup(Some(hash)))
            .await;
        let unknown = gate
            .unlock(ShareToken::generate().as_str(), "1111", hash_lookup(None))
            .await;

        assert!(matches!(wrong, Err(AppError::Unauthorized)));
        assert!(matches!(unknown, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_malformed_input_does_not_consume_attempts() {
        let (gate, _clock) = gate();
        let token = ShareToken::generate();

        let bad_pin = gate.unlock(token.as_str(), "12a4", hash_lookup(None)).await;
        let bad_token = gate.unlock("short", "1234", hash_lookup(None)).await;

        assert!(matches!(bad_pin, Err(AppError::InvalidFormat(_))));
        assert!(matches!(bad_token, Err(AppError::InvalidFormat(_))));
        assert!(gate.limiter().peek(&pin_key(&token), 5).is_none());
    }

    #[tokio::test]
    async fn test_rate_limited_after_five_attempts() {
        let (gate, clock) = gate();
        let token = ShareToken::generate();
        let hash = pin::hash_pin_with_cost("4821", 4).unwrap();

        for _ in 0..5 {
            let result = gate
                .unlock(token.as_str(), "0000", hash_lookup(Some(hash.clone())))
                .await;
            assert!(matches!(result, Err(AppError::Unauthorized)));
        }

        // Even the correct PIN is refused for the rest of the window
        let limited = gate
            .unlock(token.as_str(), "4821", hash_lookup(Some(hash.clone())))
            .await;
        assert!(matches!(limited, Err(AppError::RateLimited { wait_minutes: 15 })));

        clock.advance(Duration::from_secs(901));
        let unlocked = gate
            .unlock(token.as_str(), "4821", hash_lookup(Some(hash)))
            .await
            .unwrap();
        assert_eq!(unlocked.remaining, 4);
    }

    #[tokio::test]
    async fn test_failed_lookup_still_counts_attempt() {
        let (gate, _clock) = gate();
        let token = ShareToken::generate();

        let result = gate
            .unlock(token.as_str(), "1234", |_: &ShareToken| Err(AppError::NotFound))
            .await;
        assert!(result.is_err());
        assert_eq!(
            gate.limiter().peek(&pin_key(&token), 5).map(|d| d.remaining),
            Some(4)
        );
    }

    #[tokio::test]
    async fn test_authorize_expiry_and_scope() {
        let (gate, clock) = gate();
        let token_a = ShareToken::generate();
        let token_b = ShareToken::generate();
        let hash = pin::hash_pin_with_cost("4821", 4).unwrap();

        let unlocked = gate
            .unlock(token_a.as_str(), "4821", hash_lookup(Some(hash)))
            .await
            .unwrap();
        let credential = unlocked.credential.value;

        assert!(gate.authorize(token_b.as_str(), Some(&credential)).is_err());
        assert!(gate.authorize("not-a-token", Some(&credential)).is_err());
        assert!(gate.authorize(token_a.as_str(), None).is_err());

        clock.advance(Duration::from_secs(3599));
        assert!(gate.authorize(token_a.as_str(), Some(&credential)).is_ok());

        clock.advance(Duration::from_secs(2));
        assert!(matches!(
            gate.authorize(token_a.as_str(), Some(&credential)),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_unknown_token_runs_decoy_comparison() {
        let mut compared = Vec::new();
        let verified = verify_or_decoy("0000", None, "decoy-hash", |candidate, hash| {
            compared.push((candidate.to_string(), hash.to_string()));
            true
        });

        // The decoy comparison runs, but its result is ignored
        assert!(!verified);
        assert_eq!(compared, vec![("0000".to_string(), "decoy-hash".to_string())]);
    }

    #[test]
    fn test_known_token_compares_stored_hash_once() {
        let mut compared = Vec::new();
        let stored = Some("stored-hash");
        let verified = verify_or_decoy("4821", stored, "decoy-hash", |candidate, hash| {
            compared.push((candidate.to_string(), hash.to_string()));
            true
        });

        assert!(verified);
        assert_eq!(compared, vec![("4821".to_string(), "stored-hash".to_string())]);
    }

    #[tokio::test]
    async fn test_decoy_pin_never_unlocks_unknown_token() {
        let (gate, _clock) = gate();
        assert!(gate.decoy_hash.starts_with("$2b$04$"));

        let result = gate
            .unlock(ShareToken::generate().as_str(), DECOY_PIN, hash_lookup(None))
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_abandoned_unlock_still_consumes_attempt() {
        let (gate, _clock) = gate();
        let token = ShareToken::generate();
        let hash = pin::hash_pin_with_cost("4821", 4).unwrap();

        let slow_lookup = move |_: &ShareToken| -> Result<Option<String>> {
            std::thread::sleep(Duration::from_millis(200));
            Ok(Some(hash))
        };

        // Client gives up while the hash comparison is still pending
        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            gate.unlock(token.as_str(), "4821", slow_lookup),
        )
        .await;

        assert!(abandoned.is_err());
        assert_eq!(
            gate.limiter().peek(&pin_key(&token), 5).map(|d| d.remaining),
            Some(4)
        );
    }
}
