use axum::{body::Bytes, extract::State, Extension, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use super::AppState;
use crate::error::{error_type_name, AppError};
use crate::models::{parse_payload, EntryStore, UsageEntry};
use crate::pricing::{compute_summary_per_env, EnvironmentSummary};
use crate::session::SessionId;

#[derive(Debug, Serialize)]
pub struct AddEntryResponse {
    pub success: bool,
    pub results: EntryStore,
}

/// GET /api/results - the caller's entries keyed by environment
pub async fn get_results(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Result<Json<EntryStore>, AppError> {
    let store = state.sessions.load(&session).await?;
    Ok(Json(store))
}

/// POST /api/add - derive `cpu_core_ns` and append the entry to the caller's store
///
/// The body is validated before the session is touched, so a rejected request
/// leaves the store unchanged.
pub async fn add_entry(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    body: Bytes,
) -> Result<Json<AddEntryResponse>, AppError> {
    let entry = parse_payload(&body)
        .and_then(UsageEntry::from_payload)
        .map_err(|e| {
            crate::metrics::record_add_rejected(error_type_name(&e));
            e
        })?;

    let env = entry.env.clone();
    let cpu_core_ns = entry.cpu_core_ns;
    let is_prod = entry.is_prod();

    let mut results = state.sessions.load(&session).await?;
    results.append(entry);
    state.sessions.save(&session, results.clone()).await?;

    crate::metrics::record_entry_added(is_prod);
    info!(
        session = %session,
        env = %env,
        cpu_core_ns,
        total_entries = results.len(),
        "Entry added"
    );

    Ok(Json(AddEntryResponse {
        success: true,
        results,
    }))
}

/// GET /api/summary - per-environment cost summary of the caller's entries
pub async fn get_summary(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Result<Json<BTreeMap<String, EnvironmentSummary>>, AppError> {
    let store = state.sessions.load(&session).await?;
    let summary = compute_summary_per_env(&store);

    crate::metrics::record_summary();
    tracing::debug!(session = %session, environments = summary.len(), "Summary computed");

    Ok(Json(summary))
}
