use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;
use crate::pricing::STANDARD_TIERS;

const SERVICE_NAME: &str = "ns-costing";

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadinessStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub active_sessions: usize,
    pub pricing_tiers: usize,
}

/// GET /health - liveness, no dependencies consulted
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /ready - reports the live session count from the session store
pub async fn readiness_check(State(state): State<AppState>) -> Json<ReadinessStatus> {
    Json(ReadinessStatus {
        status: "ready",
        service: SERVICE_NAME,
        active_sessions: state.sessions.len(),
        pricing_tiers: STANDARD_TIERS.len(),
    })
}
