//! Launcher endpoints: the credential + device + entitlement gate the
//! game client runs at startup.

use axum::{extract::State, routing::{get, post}, Router};
use serde::{Deserialize, Serialize};

use crate::config::RateLimitConfig;
use crate::crypto;
use crate::db::{queries, AppState};
use crate::entitlement::{device, ledger, trial, SubscriptionStatus};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::rate_limit;
use crate::util;

#[derive(Debug, Deserialize)]
pub struct CheckSubscriptionRequest {
    pub username: String,
    pub password: String,
    pub hwid: String,
}

#[derive(Debug, Serialize)]
pub struct CheckSubscriptionResponse {
    pub account_id: String,
    pub username: String,
    pub hwid: Option<String>,
    pub has_subscription: bool,
    pub subscription: SubscriptionStatus,
}

/// POST /api/launcher/check-subscription - Full launcher login
///
/// Gate order is fixed: credentials, foreign-trial device ban, device
/// binding, then entitlement. An expired subscription is not an error;
/// the response carries `has_subscription: false`.
pub async fn check_subscription(
    State(state): State<AppState>,
    Json(body): Json<CheckSubscriptionRequest>,
) -> Result<Json<CheckSubscriptionResponse>> {
    if body.username.is_empty() || body.password.is_empty() || body.hwid.is_empty() {
        return Err(AppError::BadRequest(
            "Username, password and hwid are required".into(),
        ));
    }

    let conn = state.db.get()?;
    let account = queries::get_account_by_username(&conn, &body.username)?
        .ok_or(AppError::InvalidCredentials)?;

    if !crypto::verify_password(&body.password, &account.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    trial::assert_device_unclaimed(&conn, &account.id, &body.hwid)?;
    device::authorize(&conn, &account, &body.hwid)?;

    // Re-read to pick up a binding made just now
    let account =
        queries::get_account_by_id(&conn, &account.id)?.ok_or(AppError::AccountNotFound)?;
    let status = ledger::status_of(&account, util::now());

    Ok(Json(CheckSubscriptionResponse {
        account_id: account.id,
        username: account.username,
        hwid: account.hwid,
        has_subscription: status.active,
        subscription: status,
    }))
}

#[derive(Debug, Serialize)]
pub struct UidStatusResponse {
    pub account_id: String,
    pub username: String,
    pub has_subscription: bool,
    pub subscription: SubscriptionStatus,
}

/// GET /api/launcher/check-uid/{account_id} - Entitlement probe by id
pub async fn check_uid(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<UidStatusResponse>> {
    let conn = state.db.get()?;
    let account =
        queries::get_account_by_id(&conn, &account_id)?.ok_or(AppError::AccountNotFound)?;
    let status = ledger::status_of(&account, util::now());

    Ok(Json(UidStatusResponse {
        account_id: account.id,
        username: account.username,
        has_subscription: status.active,
        subscription: status,
    }))
}

pub fn router(rate_limit: RateLimitConfig) -> Router<AppState> {
    Router::new()
        .route("/api/launcher/check-subscription", post(check_subscription))
        .route("/api/launcher/check-uid/{account_id}", get(check_uid))
        .layer(rate_limit::standard_layer(rate_limit.standard_rpm))
}
