use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::session::SessionStore;

/// State for the metrics endpoint
#[derive(Clone)]
pub struct MetricsState {
    pub handle: Arc<PrometheusHandle>,
    pub sessions: Arc<dyn SessionStore>,
}

/// Prometheus text exposition.
///
/// The session gauge is refreshed on every scrape so it does not lag behind
/// the cleanup interval.
pub async fn metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    crate::metrics::update_session_count(state.sessions.len());

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.handle.render(),
    )
}
