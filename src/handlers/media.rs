//! Media showcase: paid configs published by media partners.

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Router,
};
use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::db::{queries, AppState};
use crate::extractors::{Json, Path};
use crate::middleware::{require_media, session_auth, CurrentAccount};
use crate::models::{CreateMediaConfig, MediaConfig, Role};
use crate::rate_limit;

/// GET /api/media-configs - Public showcase, newest first
pub async fn list_media_configs(
    State(state): State<AppState>,
) -> Result<Json<Vec<MediaConfig>>, crate::error::AppError> {
    let conn = state.db.get()?;
    let configs = queries::list_media_configs(&conn)?;
    Ok(Json(configs))
}

/// POST /api/media-configs - Publish a showcase entry (media role)
///
/// Entries start unpriced and unlinked; an admin fills in price and
/// store URL afterwards.
pub async fn create_media_config(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(body): Json<CreateMediaConfig>,
) -> Result<Json<MediaConfig>, crate::error::AppError> {
    body.validate()?;

    let conn = state.db.get()?;
    let media = queries::create_media_config(&conn, &account, &body)?;
    Ok(Json(media))
}

#[derive(Debug, Serialize)]
pub struct CheckMediaResponse {
    pub username: String,
    pub is_media: bool,
}

/// GET /api/check-media/{username} - Public media-status probe
///
/// Unknown usernames report false rather than 404, so the endpoint does
/// not reveal which accounts exist.
pub async fn check_media(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<CheckMediaResponse>, crate::error::AppError> {
    let conn = state.db.get()?;
    let is_media = queries::get_account_by_username(&conn, &username)?
        .map(|account| account.role == Role::Media)
        .unwrap_or(false);

    Ok(Json(CheckMediaResponse { username, is_media }))
}

pub fn router(state: AppState, rate_limit: RateLimitConfig) -> Router<AppState> {
    let open = Router::new()
        .route("/api/media-configs", get(list_media_configs))
        .route("/api/check-media/{username}", get(check_media))
        .layer(rate_limit::standard_layer(rate_limit.standard_rpm));

    let publish = Router::new()
        .route("/api/media-configs", post(create_media_config))
        .layer(middleware::from_fn(require_media))
        .layer(middleware::from_fn_with_state(state, session_auth));

    open.merge(publish)
}
