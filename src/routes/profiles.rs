use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use crate::constants::{ERR_INVALID_PIN, ERR_PIN_MISMATCH};
use crate::db::NewProfile;
use crate::error::{AppError, Result};
use crate::models::profile::sanitize_display_name;
use crate::models::{Gender, MeasurementInput};
use crate::rate_limit::pin_key;
use crate::routes::share::MeasurementsResponse;
use crate::routes::validation::owner_from_headers;
use crate::security::{self, ShareToken};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub gender: String,
    pub pin: String,
    #[serde(rename = "pinConfirm")]
    pub pin_confirm: String,
}

#[derive(Debug, Serialize)]
pub struct ShareTokenResponse {
    pub success: bool,
    #[serde(rename = "shareToken")]
    pub share_token: ShareToken,
}

#[derive(Debug, Serialize)]
pub struct DeleteProfileResponse {
    pub success: bool,
    pub message: String,
}

/// Create the authenticated owner's profile
///
/// An owner who already has a profile gets the existing share token back.
/// The PIN is hashed before storage and never persisted in plaintext.
pub async fn create_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateProfileRequest>,
) -> Result<Json<ShareTokenResponse>> {
    let owner_id = owner_from_headers(&headers, &state.config.owner_header)?;

    let display_name = sanitize_display_name(&payload.display_name)?;
    let gender = Gender::parse(&payload.gender)?;

    if !security::is_well_formed(&payload.pin) {
        return Err(AppError::InvalidInput(ERR_INVALID_PIN.to_string()));
    }
    if payload.pin != payload.pin_confirm {
        return Err(AppError::InvalidInput(ERR_PIN_MISMATCH.to_string()));
    }

    let profiles = state.profiles.clone();
    let lookup_owner = owner_id.clone();
    let existing =
        tokio::task::spawn_blocking(move || profiles.find_token_by_owner(&lookup_owner))
            .await??;
    if let Some(share_token) = existing {
        return Ok(Json(ShareTokenResponse {
            success: true,
            share_token,
        }));
    }

    let profiles = state.profiles.clone();
    let cost = state.config.pin_hash_cost;
    let now = state.clock.now_ms();
    let share_token = tokio::task::spawn_blocking(move || -> Result<ShareToken> {
        let edit_pin_hash = security::hash_pin_with_cost(&payload.pin, cost)?;
        profiles.create_profile(
            NewProfile {
                owner_id,
                display_name,
                gender,
                share_token: ShareToken::generate(),
                edit_pin_hash,
            },
            now,
        )
    })
    .await??;

    Ok(Json(ShareTokenResponse {
        success: true,
        share_token,
    }))
}

/// Share token of the authenticated owner's profile
pub async fn get_my_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ShareTokenResponse>> {
    let owner_id = owner_from_headers(&headers, &state.config.owner_header)?;

    let profiles = state.profiles.clone();
    let share_token = tokio::task::spawn_blocking(move || profiles.find_token_by_owner(&owner_id))
        .await??
        .ok_or(AppError::NotFound)?;

    Ok(Json(ShareTokenResponse {
        success: true,
        share_token,
    }))
}

/// Owner edits their own measurements; identity replaces the PIN session
pub async fn update_my_measurements(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<MeasurementInput>,
) -> Result<Json<MeasurementsResponse>> {
    let owner_id = owner_from_headers(&headers, &state.config.owner_header)?;

    let update = payload.sanitize();
    let profiles = state.profiles.clone();
    let now = state.clock.now_ms();
    let measurements = tokio::task::spawn_blocking(move || {
        let token = profiles
            .find_token_by_owner(&owner_id)?
            .ok_or(AppError::NotFound)?;
        profiles.update_measurements(&token, &update, now)
    })
    .await??;

    tracing::info!("Measurements updated by owner");

    Ok(Json(MeasurementsResponse {
        success: true,
        measurements,
    }))
}

/// Delete the authenticated owner's profile and all measurements
///
/// This action is irreversible; the share link stops working immediately.
pub async fn delete_my_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DeleteProfileResponse>> {
    let owner_id = owner_from_headers(&headers, &state.config.owner_header)?;

    let profiles = state.profiles.clone();
    let deleted = tokio::task::spawn_blocking(move || profiles.delete_owner(&owner_id))
        .await??
        .ok_or(AppError::NotFound)?;

    state.gate.limiter().reset(&pin_key(&deleted));

    Ok(Json(DeleteProfileResponse {
        success: true,
        message: "Profile and measurements permanently deleted".to_string(),
    }))
}
