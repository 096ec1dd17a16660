pub mod admin;
pub mod auth;
pub mod configs;
pub mod launcher;
pub mod media;
pub mod redeem;

use axum::{routing::get, Router};
use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::db::AppState;
use crate::extractors::Json;
use crate::rate_limit;

/// Uniform body for endpoints that only confirm an action.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health - Liveness check
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(rate_limit: RateLimitConfig) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .layer(rate_limit::relaxed_layer(rate_limit.relaxed_rpm))
}
