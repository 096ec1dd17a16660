//! Config marketplace: uploads, search, gated downloads.

use axum::{
    extract::State,
    http::header,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Extension, Router,
};
use serde::Deserialize;

use crate::config::RateLimitConfig;
use crate::db::{queries, AppState};
use crate::entitlement::ledger;
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::middleware::{session_auth, CurrentAccount};
use crate::models::{ConfigSummary, CreateConfig};
use crate::rate_limit;
use crate::util;

use super::StatusResponse;

/// POST /api/configs/upload
pub async fn upload(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(body): Json<CreateConfig>,
) -> Result<Json<ConfigSummary>> {
    body.validate()?;

    let conn = state.db.get()?;
    let config = queries::create_config(&conn, &account, &body)?;
    Ok(Json(config))
}

/// GET /api/configs/my - The session account's uploads, private included
pub async fn my_configs(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<Vec<ConfigSummary>>> {
    let conn = state.db.get()?;
    let configs = queries::list_configs_by_author(&conn, &account.id)?;
    Ok(Json(configs))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// GET /api/configs/search?q= - Public marketplace listing
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ConfigSummary>>> {
    let conn = state.db.get()?;
    let configs = queries::search_public_configs(&conn, query.q.as_deref())?;
    Ok(Json(configs))
}

/// GET /api/configs/download/{config_id} - Download config content
///
/// Requires an active subscription. Private configs are only visible to
/// their author; for everyone else they do not exist.
pub async fn download(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Path(config_id): Path<String>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let config = queries::get_config_by_id(&conn, &config_id)?
        .ok_or_else(|| AppError::NotFound("Config not found".into()))?;

    if config.private && config.author_id != account.id {
        return Err(AppError::NotFound("Config not found".into()));
    }

    let status = ledger::status_of(&account, util::now());
    if !status.active {
        return Err(AppError::Forbidden(
            "An active subscription is required to download configs".into(),
        ));
    }

    queries::increment_config_downloads(&conn, &config.id)?;

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.cfg\"", safe_filename(&config.name)),
        ),
    ];
    Ok((headers, config.content).into_response())
}

/// DELETE /api/configs/{config_id} - Author-only removal
pub async fn delete_config(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Path(config_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    let conn = state.db.get()?;
    let config = queries::get_config_by_id(&conn, &config_id)?
        .ok_or_else(|| AppError::NotFound("Config not found".into()))?;

    if config.author_id != account.id {
        return Err(AppError::Forbidden(
            "Only the author can delete a config".into(),
        ));
    }

    queries::delete_config(&conn, &config.id)?;
    Ok(Json(StatusResponse { status: "deleted" }))
}

/// Strip anything that could break out of the attachment filename.
fn safe_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "config".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn router(state: AppState, rate_limit: RateLimitConfig) -> Router<AppState> {
    let open = Router::new()
        .route("/api/configs/search", get(search))
        .layer(rate_limit::standard_layer(rate_limit.standard_rpm));

    let session = Router::new()
        .route("/api/configs/upload", post(upload))
        .route("/api/configs/my", get(my_configs))
        .route("/api/configs/download/{config_id}", get(download))
        .route("/api/configs/{config_id}", delete(delete_config))
        .layer(middleware::from_fn_with_state(state, session_auth));

    open.merge(session)
}
