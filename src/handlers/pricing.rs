use axum::{body::Bytes, extract::Path, Json};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{error_type_name, AppError};
use crate::models::{all_defaults, defaults_for, entry::json_type_name, EnvironmentDefaults};
use crate::pricing::{available_sizes, estimate_namespaces, EstimateReport, TierOption};

/// GET /api/pricing - tier catalogue, smallest first
pub async fn list_pricing() -> Json<Vec<TierOption>> {
    Json(available_sizes())
}

/// GET /api/defaults - form defaults for every known environment
pub async fn list_defaults() -> Json<BTreeMap<&'static str, &'static EnvironmentDefaults>> {
    Json(all_defaults())
}

/// GET /api/defaults/:env
pub async fn get_defaults(
    Path(env): Path<String>,
) -> Result<Json<&'static EnvironmentDefaults>, AppError> {
    defaults_for(&env)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No defaults for environment '{}'", env)))
}

/// POST /api/estimate - size a JSON array of namespaces without touching the session
///
/// Each element needs `pods` and `cpu_req` (millicores); `override_size` and
/// `cluster` are optional. Elements that cannot be sized are reported inline
/// with `calculation_error` rather than failing the request.
pub async fn estimate(body: Bytes) -> Result<Json<EstimateReport>, AppError> {
    let namespaces = parse_namespaces(&body).map_err(|e| {
        crate::metrics::record_estimate_rejected(error_type_name(&e));
        e
    })?;

    let report = estimate_namespaces(&namespaces);

    crate::metrics::record_estimate(report.totals.namespaces, report.totals.errors);
    info!(
        namespaces = report.totals.namespaces,
        errors = report.totals.errors,
        clusters = report.clusters.len(),
        nodes = report.cluster_totals.node_count,
        "Estimate computed"
    );

    Ok(Json(report))
}

fn parse_namespaces(body: &[u8]) -> Result<Vec<Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::NoData);
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidPayload(format!("Invalid JSON body: {}", e)))?;

    match value {
        Value::Array(namespaces) => Ok(namespaces),
        other => Err(AppError::InvalidPayload(format!(
            "Request body must be a JSON array of namespaces, got {}",
            json_type_name(&other)
        ))),
    }
}
