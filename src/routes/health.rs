use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthData {
    /// `ok`, or `degraded` when the database does not answer.
    pub status: String,
    pub version: String,
    pub database: bool,
    pub product_cache: bool,
}

pub fn health_report(database: bool, product_cache: bool) -> HealthData {
    HealthData {
        status: if database { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        product_cache,
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Liveness and database reachability", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    let database = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    if !database {
        tracing::warn!("health check could not reach the database");
    }

    Json(ApiResponse::success(
        "Health check",
        health_report(database, state.product_cache.is_enabled()),
        Some(Meta::empty()),
    ))
}
