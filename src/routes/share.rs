use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::PublicView;
use crate::error::{AppError, Result};
use crate::models::{MeasurementInput, MeasurementsRecord};
use crate::routes::validation::{edit_session_cookie, presented_credential};
use crate::security::ShareToken;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    pub success: bool,
    pub credential: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
    pub remaining: u32,
}

#[derive(Debug, Serialize)]
pub struct MeasurementsResponse {
    pub success: bool,
    pub measurements: MeasurementsRecord,
}

/// Public, read-only view of a shared profile
///
/// A malformed token is reported as not found, same as an unknown one.
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<PublicView>> {
    let token = ShareToken::parse(&token).map_err(|_| AppError::NotFound)?;

    let profiles = state.profiles.clone();
    let view = tokio::task::spawn_blocking(move || profiles.public_profile(&token))
        .await??
        .ok_or(AppError::NotFound)?;

    Ok(Json(view))
}

/// Check the edit PIN for a shared profile and open an edit session
///
/// # Security
/// - At most `PIN_MAX_ATTEMPTS` checks per token per window, counted
///   before the hash comparison
/// - Wrong PIN and unknown token return the same 401
/// - The credential is returned in the body and as an HttpOnly cookie
///   scoped to this token
pub async fn unlock_profile(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<UnlockRequest>,
) -> Result<(HeaderMap, Json<UnlockResponse>)> {
    let profiles = state.profiles.clone();
    let unlocked = state
        .gate
        .unlock(&token, &payload.pin, move |t| profiles.pin_hash(t))
        .await?;

    let mut headers = HeaderMap::new();
    match edit_session_cookie(
        unlocked.token.as_str(),
        &unlocked.credential,
        state.config.edit_session_ttl_secs,
        state.config.cookie_secure(),
    ) {
        Ok(cookie) => {
            headers.insert(header::SET_COOKIE, cookie);
        }
        Err(e) => tracing::error!("Failed to build edit session cookie: {}", e),
    }

    Ok((
        headers,
        Json(UnlockResponse {
            success: true,
            credential: unlocked.credential.value,
            expires_at: unlocked.credential.expires_at_ms,
            remaining: unlocked.remaining,
        }),
    ))
}

/// Update measurements of a shared profile within an edit session
pub async fn update_shared_measurements(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<MeasurementInput>,
) -> Result<Json<MeasurementsResponse>> {
    let credential = presented_credential(&headers, &token);
    let token = state.gate.authorize(&token, credential.as_deref())?;

    let update = payload.sanitize();
    let profiles = state.profiles.clone();
    let now = state.clock.now_ms();
    let measurements =
        tokio::task::spawn_blocking(move || profiles.update_measurements(&token, &update, now))
            .await??;

    tracing::info!("Measurements updated via edit session");

    Ok(Json(MeasurementsResponse {
        success: true,
        measurements,
    }))
}
