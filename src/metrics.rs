use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder. Fails if a recorder is already installed.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    init_metric_descriptions();

    Ok(handle)
}

/// Safe to call more than once
fn init_metric_descriptions() {
    describe_counter!(
        "ns_costing_entries_added_total",
        "Usage entries accepted by /api/add"
    );
    describe_counter!(
        "ns_costing_add_rejected_total",
        "Requests to /api/add rejected before ingestion"
    );
    describe_counter!(
        "ns_costing_summaries_total",
        "Cost summaries computed"
    );
    describe_counter!(
        "ns_costing_estimates_total",
        "Requests to /api/estimate, by outcome"
    );
    describe_counter!(
        "ns_costing_estimated_namespaces_total",
        "Namespaces sized by /api/estimate, by outcome"
    );
    describe_gauge!(
        "ns_costing_active_sessions",
        "Sessions currently held in the session store"
    );
    describe_gauge!("ns_costing_info", "Service version information");

    gauge!("ns_costing_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record an accepted entry. Labelled by CPU class to keep cardinality fixed.
pub fn record_entry_added(is_prod: bool) {
    let env_class = if is_prod { "prod" } else { "nonprod" };
    counter!("ns_costing_entries_added_total", "env_class" => env_class).increment(1);
}

pub fn record_add_rejected(reason: &'static str) {
    counter!("ns_costing_add_rejected_total", "reason" => reason).increment(1);
}

pub fn record_summary() {
    counter!("ns_costing_summaries_total").increment(1);
}

pub fn record_estimate(namespaces: usize, errors: usize) {
    counter!("ns_costing_estimates_total", "outcome" => "ok").increment(1);
    counter!("ns_costing_estimated_namespaces_total", "outcome" => "sized")
        .increment(namespaces.saturating_sub(errors) as u64);
    counter!("ns_costing_estimated_namespaces_total", "outcome" => "error")
        .increment(errors as u64);
}

pub fn record_estimate_rejected(reason: &'static str) {
    counter!("ns_costing_estimates_total", "outcome" => "rejected", "reason" => reason)
        .increment(1);
}

pub fn update_session_count(count: usize) {
    gauge!("ns_costing_active_sessions").set(count as f64);
}
