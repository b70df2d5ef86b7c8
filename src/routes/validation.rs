use axum::http::{header, header::InvalidHeaderValue, HeaderMap, HeaderValue};

use crate::constants::EDIT_SESSION_COOKIE_PREFIX;
use crate::error::{AppError, Result};
use crate::models::profile::validate_owner_id;
use crate::security::EditCredential;

/// Owner id set by the authentication layer in front of this service
pub fn owner_from_headers(headers: &HeaderMap, header_name: &str) -> Result<String> {
    let owner_id = headers
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .ok_or(AppError::NotAuthenticated)?;

    if !validate_owner_id(owner_id) {
        tracing::warn!("Rejected malformed owner identity header");
        return Err(AppError::NotAuthenticated);
    }

    Ok(owner_id.to_string())
}

/// Cookie name carrying the edit credential for one share token
pub fn edit_session_cookie_name(token: &str) -> String {
    format!("{EDIT_SESSION_COOKIE_PREFIX}{token}")
}

/// Build the `Set-Cookie` value delivering an edit credential
pub fn edit_session_cookie(
    token: &str,
    credential: &EditCredential,
    max_age_secs: u64,
    secure: bool,
) -> std::result::Result<HeaderValue, InvalidHeaderValue> {
    let name = edit_session_cookie_name(token);
    let mut cookie = format!(
        "{name}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_secs}",
        credential.value
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Credential presented with a mutating request for `token`
///
/// A bearer token takes precedence over the token-scoped cookie.
pub fn presented_credential(headers: &HeaderMap, token: &str) -> Option<String> {
    if let Some(bearer) = extract_bearer_token(headers) {
        return Some(bearer);
    }

    let cookie_name = edit_session_cookie_name(token);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == cookie_name)
        .map(|(_, value)| value.trim().to_string())
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
