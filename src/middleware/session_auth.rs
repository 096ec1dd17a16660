//! Session authentication middleware.
//!
//! `session_auth` resolves the bearer token to an account and attaches
//! it to the request; `require_admin`/`require_media` gate on role and
//! must be layered inside `session_auth`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::models::{Account, Role};
use crate::util::extract_bearer_token;

/// The authenticated account, attached as a request extension.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

/// Require a valid, unexpired session token.
pub async fn session_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = extract_bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;

    // Scoped so the pooled connection is returned before the handler runs
    let account = {
        let conn = state.db.get()?;
        queries::get_account_by_session_token(&conn, token)?.ok_or(AppError::Unauthorized)?
    };

    request.extensions_mut().insert(CurrentAccount(account));
    Ok(next.run(request).await)
}

/// Require the admin role. Layer inside `session_auth`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response> {
    let current = request
        .extensions()
        .get::<CurrentAccount>()
        .ok_or(AppError::Unauthorized)?;

    if current.0.role != Role::Admin {
        return Err(AppError::Forbidden("Administrator access required".into()));
    }
    Ok(next.run(request).await)
}

/// Require the media role (admins pass too). Layer inside `session_auth`.
pub async fn require_media(request: Request, next: Next) -> Result<Response> {
    let current = request
        .extensions()
        .get::<CurrentAccount>()
        .ok_or(AppError::Unauthorized)?;

    if !matches!(current.0.role, Role::Media | Role::Admin) {
        return Err(AppError::Forbidden(
            "Media publisher access required".into(),
        ));
    }
    Ok(next.run(request).await)
}
