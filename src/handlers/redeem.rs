//! Key activation and the free trial, for logged-in accounts.

use axum::{extract::State, middleware, routing::post, Extension, Router};
use serde::{Deserialize, Serialize};

use crate::config::RateLimitConfig;
use crate::db::{queries, AppState};
use crate::entitlement::{keys, trial, RedeemOutcome, TIER_TRIAL};
use crate::error::{AppError, Result};
use crate::extractors::{ClientOrigin, Json};
use crate::middleware::{session_auth, CurrentAccount};
use crate::rate_limit;

#[derive(Debug, Deserialize)]
pub struct ActivateKeyRequest {
    pub code: String,
}

/// POST /api/activate-key - Redeem a key for the session account
pub async fn activate_key(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(body): Json<ActivateKeyRequest>,
) -> Result<Json<RedeemOutcome>> {
    let code = body.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::BadRequest("Key code is required".into()));
    }

    let mut conn = state.db.get()?;
    let outcome = keys::redeem(&mut conn, &code, &account.id)?;

    tracing::info!(username = %account.username, "key redeemed");
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub struct TrialResponse {
    pub tier: &'static str,
    pub expires_at: i64,
}

/// POST /api/get-free-day - Claim the one-time free trial
///
/// The network origin comes from proxy headers or the socket peer; the
/// device identity is the account's bound hwid, when one exists.
pub async fn get_free_day(
    State(state): State<AppState>,
    origin: ClientOrigin,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<TrialResponse>> {
    let origin = origin
        .0
        .ok_or_else(|| AppError::BadRequest("Client address unavailable".into()))?;

    let mut conn = state.db.get()?;
    let expires_at = trial::check_and_reserve(&mut conn, &account, &origin, state.trial_days)?;

    tracing::info!(username = %account.username, "free trial granted");
    Ok(Json(TrialResponse {
        tier: TIER_TRIAL,
        expires_at,
    }))
}

pub fn router(state: AppState, rate_limit: RateLimitConfig) -> Router<AppState> {
    Router::new()
        .route("/api/activate-key", post(activate_key))
        .route("/api/get-free-day", post(get_free_day))
        .layer(middleware::from_fn_with_state(state, session_auth))
        .layer(rate_limit::standard_layer(rate_limit.standard_rpm))
}
