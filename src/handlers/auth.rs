//! Account registration, login and session management.

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::crypto;
use crate::db::{queries, AppState};
use crate::entitlement::{ledger, SubscriptionStatus};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::middleware::{session_auth, CurrentAccount};
use crate::models::{Account, ChangePasswordRequest, CreateAccount, LoginRequest, Role};
use crate::rate_limit;
use crate::util;

use super::StatusResponse;

/// Account as seen by its owner.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    pub hwid: Option<String>,
    pub subscription: SubscriptionStatus,
}

impl ProfileResponse {
    fn from_account(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            username: account.username.clone(),
            email: account.email.clone(),
            role: account.role,
            hwid: account.hwid.clone(),
            subscription: ledger::status_of(account, util::now()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub account: ProfileResponse,
}

/// POST /api/register - Create an account and open a session
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CreateAccount>,
) -> Result<Json<SessionResponse>> {
    body.validate()?;

    let conn = state.db.get()?;
    let password_hash = crypto::hash_password(&body.password)?;
    let account = queries::create_account(&conn, &body, &password_hash)?;
    let (_, token) = queries::create_session(&conn, &account.id)?;

    tracing::info!(username = %account.username, "account registered");

    Ok(Json(SessionResponse {
        token,
        account: ProfileResponse::from_account(&account),
    }))
}

/// POST /api/login - Exchange credentials for a session token
///
/// Unknown usernames and wrong passwords produce the same response, so
/// the endpoint cannot be used to probe which accounts exist.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    body.validate()?;

    let conn = state.db.get()?;
    let account = queries::get_account_by_username(&conn, &body.username)?
        .ok_or(AppError::InvalidCredentials)?;

    if !crypto::verify_password(&body.password, &account.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let (_, token) = queries::create_session(&conn, &account.id)?;

    Ok(Json(SessionResponse {
        token,
        account: ProfileResponse::from_account(&account),
    }))
}

/// POST /api/logout - Revoke the presented session token
pub async fn logout(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<StatusResponse>> {
    let conn = state.db.get()?;
    queries::delete_session_by_token(&conn, auth.token())?;
    Ok(Json(StatusResponse {
        status: "logged_out",
    }))
}

/// GET /api/check-auth - Profile and subscription for the session owner
pub async fn check_auth(
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<ProfileResponse>> {
    Ok(Json(ProfileResponse::from_account(&account)))
}

/// POST /api/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<StatusResponse>> {
    body.validate()?;

    if !crypto::verify_password(&body.old_password, &account.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let conn = state.db.get()?;
    let password_hash = crypto::hash_password(&body.new_password)?;
    if !queries::update_account_password(&conn, &account.id, &password_hash)? {
        return Err(AppError::AccountNotFound);
    }

    Ok(Json(StatusResponse { status: "updated" }))
}

pub fn router(state: AppState, rate_limit: RateLimitConfig) -> Router<AppState> {
    let open = Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .layer(rate_limit::strict_layer(rate_limit.strict_rpm));

    let session = Router::new()
        .route("/api/check-auth", get(check_auth))
        .route("/api/change-password", post(change_password))
        .route("/api/logout", post(logout))
        .layer(middleware::from_fn_with_state(state, session_auth));

    open.merge(session)
}
