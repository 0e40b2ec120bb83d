//! Liveness handlers

use axum::{extract::State, Json};
use serde::Serialize;
use shared::STATUS_SUCCESS;

use crate::AppState;

#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub academia_bknd: u32,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

/// Ping endpoint handler
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: STATUS_SUCCESS,
        academia_bknd: 1,
    })
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Check database connectivity
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {}", e);
            "disconnected"
        }
    };

    Json(HealthResponse {
        status: STATUS_SUCCESS,
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}
