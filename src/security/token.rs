use std::fmt;

use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::constants::{
    ERR_INVALID_TOKEN, MAX_SHARE_TOKEN_LEN, MIN_SHARE_TOKEN_LEN, SHARE_TOKEN_BYTES,
};
use crate::error::{AppError, Result};

/// Public, high-entropy identifier of one profile
///
/// Generated tokens are 48 characters of unpadded URL-safe base64. Inbound
/// tokens are accepted at any length in `40..=100` over `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareToken(String);

impl ShareToken {
    /// Generate a new token from the OS random source
    pub fn generate() -> Self {
        let mut bytes = [0u8; SHARE_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Check length range and character class of a candidate token
    pub fn is_valid(candidate: &str) -> bool {
        (MIN_SHARE_TOKEN_LEN..=MAX_SHARE_TOKEN_LEN).contains(&candidate.len())
            && candidate
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    }

    /// Parse an inbound token, rejecting malformed input before any lookup
    pub fn parse(candidate: &str) -> Result<Self> {
        if Self::is_valid(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(AppError::InvalidFormat(ERR_INVALID_TOKEN))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShareToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
