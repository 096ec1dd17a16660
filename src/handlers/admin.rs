//! Administrative endpoints: account management, key generation,
//! media showcase curation, and destructive maintenance.
//!
//! Every route here sits behind `session_auth` + `require_admin`.

use axum::{
    extract::State,
    middleware,
    routing::{delete, get, post},
    Extension, Router,
};
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::entitlement::keys;
use crate::error::AppError;
use crate::extractors::{Json, Path};
use crate::handlers::StatusResponse;
use crate::middleware::{require_admin, session_auth, CurrentAccount};
use crate::models::{
    Account, CreateKey, MediaConfig, RedemptionKey, Role, UpdateMediaConfig,
};

/// GET /api/admin/users - Every account, newest first
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<Account>>, AppError> {
    let conn = state.db.get()?;
    let accounts = queries::list_accounts(&conn)?;
    Ok(Json(accounts))
}

#[derive(Debug, Deserialize)]
pub struct AccountIdRequest {
    pub account_id: String,
}

/// POST /api/admin/delete-user - Remove an account and everything it owns
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(CurrentAccount(admin)): Extension<CurrentAccount>,
    Json(body): Json<AccountIdRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let mut conn = state.db.get()?;
    let deleted = queries::delete_account(&mut conn, &body.account_id)?;
    if !deleted {
        return Err(AppError::AccountNotFound);
    }

    tracing::info!(admin = %admin.username, account_id = %body.account_id, "account deleted");
    Ok(Json(StatusResponse { status: "deleted" }))
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub account_id: String,
    pub role: Role,
}

/// POST /api/admin/set-role - Change an account's role
pub async fn set_role(
    State(state): State<AppState>,
    Extension(CurrentAccount(admin)): Extension<CurrentAccount>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let conn = state.db.get()?;
    let updated = queries::set_account_role(&conn, &body.account_id, body.role)?;
    if !updated {
        return Err(AppError::AccountNotFound);
    }

    tracing::info!(
        admin = %admin.username,
        account_id = %body.account_id,
        role = %body.role.as_str(),
        "role changed"
    );
    Ok(Json(StatusResponse { status: "updated" }))
}

/// GET /api/admin/media-users - Accounts holding the media role
pub async fn list_media_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<Account>>, AppError> {
    let conn = state.db.get()?;
    let accounts = queries::list_accounts_by_role(&conn, Role::Media)?;
    Ok(Json(accounts))
}

/// POST /api/admin/generate-key - Mint a redemption key
///
/// The plaintext code appears only in this response.
pub async fn generate_key(
    State(state): State<AppState>,
    Extension(CurrentAccount(admin)): Extension<CurrentAccount>,
    Json(body): Json<CreateKey>,
) -> Result<Json<RedemptionKey>, AppError> {
    let conn = state.db.get()?;
    let key = keys::issue(&conn, &body)?;

    tracing::info!(admin = %admin.username, tier = %key.tier, "redemption key generated");
    Ok(Json(key))
}

/// GET /api/admin/keys - All keys, newest first
pub async fn list_keys(
    State(state): State<AppState>,
) -> Result<Json<Vec<RedemptionKey>>, AppError> {
    let conn = state.db.get()?;
    let all = keys::list_all(&conn)?;
    Ok(Json(all))
}

/// POST /api/admin/reset-hwid - Clear an account's device binding
pub async fn reset_hwid(
    State(state): State<AppState>,
    Extension(CurrentAccount(admin)): Extension<CurrentAccount>,
    Json(body): Json<AccountIdRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let conn = state.db.get()?;
    let cleared = crate::entitlement::device::clear_binding(&conn, &body.account_id)?;
    if !cleared {
        return Err(AppError::AccountNotFound);
    }

    tracing::info!(admin = %admin.username, account_id = %body.account_id, "hwid reset");
    Ok(Json(StatusResponse { status: "reset" }))
}

#[derive(Debug, Deserialize)]
pub struct ResetDatabaseRequest {
    pub confirm_passphrase: String,
}

/// POST /api/admin/reset-database - Wipe every table
///
/// Requires the out-of-band passphrase from the environment on top of
/// admin auth. Refused entirely when no passphrase is configured.
pub async fn reset_database(
    State(state): State<AppState>,
    Extension(CurrentAccount(admin)): Extension<CurrentAccount>,
    Json(body): Json<ResetDatabaseRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let expected = state
        .reset_passphrase
        .as_deref()
        .ok_or_else(|| AppError::Forbidden("Database reset is not configured".to_string()))?;

    if body.confirm_passphrase != expected {
        return Err(AppError::Forbidden(
            "Reset passphrase does not match".to_string(),
        ));
    }

    let conn = state.db.get()?;
    queries::reset_all_data(&conn)?;

    tracing::warn!(admin = %admin.username, "database reset performed");
    Ok(Json(StatusResponse { status: "reset" }))
}

/// GET /api/admin/media-configs - Full showcase list for curation
pub async fn list_media_configs(
    State(state): State<AppState>,
) -> Result<Json<Vec<MediaConfig>>, AppError> {
    let conn = state.db.get()?;
    let configs = queries::list_media_configs(&conn)?;
    Ok(Json(configs))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMediaConfigRequest {
    pub id: String,
    #[serde(flatten)]
    pub changes: UpdateMediaConfig,
}

/// POST /api/admin/media-configs/update - Set price, store URL, promo code
pub async fn update_media_config(
    State(state): State<AppState>,
    Json(body): Json<UpdateMediaConfigRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    body.changes.validate()?;

    let conn = state.db.get()?;
    let updated = queries::update_media_config(&conn, &body.id, &body.changes)?;
    if !updated {
        return Err(AppError::NotFound("Media config not found".to_string()));
    }

    Ok(Json(StatusResponse { status: "updated" }))
}

/// DELETE /api/admin/media-configs/{media_config_id} - Remove a showcase entry
pub async fn delete_media_config(
    State(state): State<AppState>,
    Path(media_config_id): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let conn = state.db.get()?;
    let deleted = queries::delete_media_config(&conn, &media_config_id)?;
    if !deleted {
        return Err(AppError::NotFound("Media config not found".to_string()));
    }

    Ok(Json(StatusResponse { status: "deleted" }))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/delete-user", post(delete_user))
        .route("/api/admin/set-role", post(set_role))
        .route("/api/admin/media-users", get(list_media_users))
        .route("/api/admin/generate-key", post(generate_key))
        .route("/api/admin/keys", get(list_keys))
        .route("/api/admin/reset-hwid", post(reset_hwid))
        .route("/api/admin/reset-database", post(reset_database))
        .route("/api/admin/media-configs", get(list_media_configs))
        .route("/api/admin/media-configs/update", post(update_media_config))
        .route(
            "/api/admin/media-configs/{media_config_id}",
            delete(delete_media_config),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state, session_auth))
}
