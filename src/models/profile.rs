use serde::{Deserialize, Serialize};

use crate::constants::{
    ERR_DISPLAY_NAME, ERR_INVALID_GENDER, MAX_DISPLAY_NAME_LEN, MAX_OWNER_ID_LEN,
    MIN_DISPLAY_NAME_LEN,
};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(AppError::InvalidInput(ERR_INVALID_GENDER.to_string())),
        }
    }
}

/// Profile record stored in redb, keyed by share token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Owner id from the authentication layer
    pub owner_id: String,
    pub display_name: String,
    pub gender: Gender,
    /// bcrypt hash of the edit PIN
    pub edit_pin_hash: String,
    /// Unix milliseconds
    pub created_at: i64,
}

/// Publicly visible part of a profile
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub gender: Gender,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Strip angle brackets, trim, and truncate free text to `max_len` characters
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    input
        .trim()
        .chars()
        .take(max_len)
        .filter(|c| *c != '<' && *c != '>')
        .collect()
}

/// Sanitise and length-check a display name
pub fn sanitize_display_name(input: &str) -> Result<String> {
    let name = sanitize_text(input, MAX_DISPLAY_NAME_LEN);
    if name.chars().count() < MIN_DISPLAY_NAME_LEN {
        return Err(AppError::InvalidInput(ERR_DISPLAY_NAME.to_string()));
    }
    Ok(name)
}

/// Validate an owner id supplied by the authentication layer
pub fn validate_owner_id(owner_id: &str) -> bool {
    !owner_id.is_empty()
        && owner_id.len() <= MAX_OWNER_ID_LEN
        && owner_id.chars().all(|c| !c.is_control())
}
