use std::time::Duration;

use hmac::{digest::InvalidLength, Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::clock::duration_ms;
use crate::security::ShareToken;

type HmacSha256 = Hmac<Sha256>;

/// Proof of a successful PIN check, scoped to one share token
///
/// `value` is what the client re-presents: `<expires_at_ms>.<hex mac>`,
/// where the MAC covers both the token and the expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditCredential {
    pub value: String,
    #[serde(rename = "expiresAt")]
    pub expires_at_ms: i64,
}

/// Mints and checks edit session credentials
///
/// Credentials carry a fixed lifetime from issuance and are never renewed.
/// Nothing is stored server-side; a credential is valid only if its MAC
/// matches the token it is presented against.
#[derive(Clone)]
pub struct SessionIssuer {
    keyed: HmacSha256,
    ttl_ms: i64,
}

impl SessionIssuer {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, InvalidLength> {
        Ok(Self {
            keyed: HmacSha256::new_from_slice(secret.as_ref())?,
            ttl_ms: duration_ms(ttl),
        })
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(u64::try_from(self.ttl_ms).unwrap_or(0))
    }

    /// Issue a credential for `token`, valid until `now_ms + ttl`
    pub fn issue(&self, token: &ShareToken, now_ms: i64) -> EditCredential {
        let expires_at_ms = now_ms.saturating_add(self.ttl_ms);
        let signature = hex::encode(self.mac(token, expires_at_ms).finalize().into_bytes());
        EditCredential {
            value: format!("{expires_at_ms}.{signature}"),
            expires_at_ms,
        }
    }

    /// Check a presented credential against `token` at `now_ms`
    pub fn authorize(&self, token: &ShareToken, presented: Option<&str>, now_ms: i64) -> bool {
        let Some(presented) = presented else {
            return false;
        };
        let Some((expiry, signature)) = presented.split_once('.') else {
            return false;
        };
        // Only the canonical decimal form that `issue` produces
        if expiry.is_empty()
            || !expiry.bytes().all(|b| b.is_ascii_digit())
            || (expiry.len() > 1 && expiry.starts_with('0'))
        {
            return false;
        }
        let Ok(expires_at_ms) = expiry.parse::<i64>() else {
            return false;
        };
        if now_ms >= expires_at_ms {
            return false;
        }
        let Ok(sig_bytes) = hex::decode(signature) else {
            return false;
        };

        self.mac(token, expires_at_ms)
            .verify_slice(&sig_bytes)
            .is_ok()
    }

    fn mac(&self, token: &ShareToken, expires_at_ms: i64) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(b"edit:");
        mac.update(token.as_str().as_bytes());
        mac.update(b":");
        mac.update(expires_at_ms.to_string().as_bytes());
        mac
    }
}
