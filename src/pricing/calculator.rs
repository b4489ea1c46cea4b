use crate::models::{EntryStore, UsageEntry};
use crate::pricing::models::{
    ClusterMetrics, EnvironmentSummary, EstimateReport, EstimateTotals, NamespaceCost,
    StandardSize, Tier, TierOption, STANDARD_TIERS,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Safety margin applied before tier lookup, as the exact ratio 13/10
const BUFFER_NUMERATOR: u64 = 13;
const BUFFER_DENOMINATOR: u64 = 10;

const MILLICORES_PER_CORE: f64 = 1000.0;

/// Node capacity in CPU cores used for cluster sizing (one XL node)
pub const CPU_PER_NODE: f64 = 64.0;

/// Cluster key for namespaces that do not name one
pub const UNASSIGNED_CLUSTER: &str = "unassigned";

/// Keys written by [`cost_namespace`], dropped from the echoed caller fields
const COMPUTED_KEYS: [&str; 6] = [
    "cpu_cores_total",
    "buffered_cpu",
    "recommended_size",
    "monthly_cost",
    "annual_cost",
    "calculation_error",
];

/// Why a namespace could not be sized
#[derive(Debug, Error, PartialEq)]
enum SizingError {
    #[error("Invalid namespace data")]
    NotAnObject,
    #[error("Missing required fields")]
    MissingFields,
    #[error("Invalid numeric values")]
    InvalidNumber,
    #[error("Invalid CPU calculation")]
    InvalidCpu,
}

/// Cheapest tier whose capacity covers `cpu_cores`, falling back to the
/// largest tier when nothing does.
pub fn lookup_tier(cpu_cores: u64) -> &'static Tier {
    STANDARD_TIERS
        .iter()
        .find(|tier| cpu_cores <= tier.cpu_max)
        .unwrap_or_else(overflow_tier)
}

/// `ceil(total_cpu * 1.3)` in integer arithmetic
pub fn buffered_cpu(total_cpu: u64) -> u64 {
    total_cpu
        .saturating_mul(BUFFER_NUMERATOR)
        .div_ceil(BUFFER_DENOMINATOR)
}

/// Summarize the entries of a single environment
pub fn summarize_environment(entries: &[UsageEntry]) -> EnvironmentSummary {
    let total_namespaces = entries.len();
    let total_cpu = entries
        .iter()
        .fold(0u64, |acc, entry| acc.saturating_add(entry.cpu_core_ns));
    let total_cpu_buffered = buffered_cpu(total_cpu);

    let tier = lookup_tier(total_cpu_buffered);
    let monthly_cost = tier.monthly * total_namespaces as f64;

    EnvironmentSummary {
        total_namespaces,
        total_cpu,
        total_cpu_buffered,
        standard_size: tier.size,
        monthly_cost,
        annual_cost: monthly_cost * 12.0,
    }
}

/// Per-environment cost summary of a whole store
pub fn compute_summary_per_env(store: &EntryStore) -> BTreeMap<String, EnvironmentSummary> {
    store
        .environments()
        .map(|(env, entries)| (env.to_string(), summarize_environment(entries)))
        .collect()
}

fn overflow_tier() -> &'static Tier {
    &STANDARD_TIERS[STANDARD_TIERS.len() - 1]
}

fn tier_for_size(size: StandardSize) -> &'static Tier {
    STANDARD_TIERS
        .iter()
        .find(|tier| tier.size == size)
        .unwrap_or_else(overflow_tier)
}

/// Numeric reading of a sizing input: numbers, numeric strings (blank reads
/// as 0), booleans and `null` (as 0). Anything else is rejected.
fn numeric_input(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

struct Sizing {
    cpu_cores_total: f64,
    buffered_cpu: u64,
    size: StandardSize,
}

fn size_namespace(fields: &Map<String, Value>) -> Result<Sizing, SizingError> {
    let (Some(pods), Some(cpu_req)) = (fields.get("pods"), fields.get("cpu_req")) else {
        return Err(SizingError::MissingFields);
    };
    let (Some(pods), Some(cpu_req)) = (numeric_input(pods), numeric_input(cpu_req)) else {
        return Err(SizingError::InvalidNumber);
    };

    // Non-positive replica counts or requests size to zero
    let millicores = if pods <= 0.0 || cpu_req <= 0.0 {
        0.0
    } else {
        pods * cpu_req
    };
    if !millicores.is_finite() {
        return Err(SizingError::InvalidCpu);
    }

    // ceil(cores * 1.3), kept in millicore units so whole inputs divide exactly
    let buffered_cpu = (millicores * 13.0 / (MILLICORES_PER_CORE * 10.0)).ceil() as u64;
    let computed = lookup_tier(buffered_cpu).size;

    let size = fields
        .get("override_size")
        .and_then(Value::as_str)
        .and_then(StandardSize::from_label)
        .unwrap_or(computed);

    Ok(Sizing {
        cpu_cores_total: millicores / MILLICORES_PER_CORE,
        buffered_cpu,
        size,
    })
}

/// Size one namespace from its `pods` and `cpu_req` (millicores).
///
/// A valid `override_size` label replaces the computed tier; an unknown one is
/// ignored. Never fails: unusable input yields a zero-cost result carrying
/// `calculation_error`.
pub fn cost_namespace(namespace: &Value) -> NamespaceCost {
    let Some(input) = namespace.as_object() else {
        return error_cost(Map::new(), SizingError::NotAnObject);
    };

    let mut fields = input.clone();
    for key in COMPUTED_KEYS {
        fields.remove(key);
    }

    match size_namespace(input) {
        Ok(sizing) => {
            let monthly_cost = tier_for_size(sizing.size).monthly;
            NamespaceCost {
                fields,
                cpu_cores_total: sizing.cpu_cores_total,
                buffered_cpu: sizing.buffered_cpu,
                recommended_size: sizing.size,
                monthly_cost,
                annual_cost: monthly_cost * 12.0,
                calculation_error: None,
            }
        }
        Err(e) => error_cost(fields, e),
    }
}

fn error_cost(fields: Map<String, Value>, error: SizingError) -> NamespaceCost {
    NamespaceCost {
        fields,
        cpu_cores_total: 0.0,
        buffered_cpu: 0,
        recommended_size: overflow_tier().size,
        monthly_cost: 0.0,
        annual_cost: 0.0,
        calculation_error: Some(error.to_string()),
    }
}

/// Capacity rollup over sized namespaces: buffered cores and XL node count
pub fn cluster_metrics<'a>(costs: impl IntoIterator<Item = &'a NamespaceCost>) -> ClusterMetrics {
    let mut metrics = costs.into_iter().fold(ClusterMetrics::default(), |mut acc, cost| {
        acc.namespaces += 1;
        acc.cpu += cost.cpu_cores_total;
        acc.monthly_cost += cost.monthly_cost;
        acc
    });

    metrics.cpu_with_buffer = metrics.cpu * 13.0 / 10.0;
    metrics.node_count = (metrics.cpu_with_buffer / CPU_PER_NODE).ceil() as u64;
    metrics.annual_cost = metrics.monthly_cost * 12.0;
    metrics
}

fn cluster_key(cost: &NamespaceCost) -> &str {
    cost.fields
        .get("cluster")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNASSIGNED_CLUSTER)
}

/// Size a batch of namespaces and roll the results up per cluster
pub fn estimate_namespaces(namespaces: &[Value]) -> EstimateReport {
    let results: Vec<NamespaceCost> = namespaces.iter().map(cost_namespace).collect();

    let totals = results.iter().fold(EstimateTotals::default(), |mut acc, cost| {
        acc.monthly += cost.monthly_cost;
        acc.annual += cost.annual_cost;
        acc.namespaces += 1;
        acc.errors += usize::from(cost.is_error());
        acc
    });

    let average_monthly = if totals.namespaces > 0 {
        totals.monthly / totals.namespaces as f64
    } else {
        0.0
    };

    let mut grouped: BTreeMap<&str, Vec<&NamespaceCost>> = BTreeMap::new();
    for cost in &results {
        grouped.entry(cluster_key(cost)).or_default().push(cost);
    }
    let clusters = grouped
        .into_iter()
        .map(|(name, costs)| (name.to_string(), cluster_metrics(costs)))
        .collect();

    let cluster_totals = cluster_metrics(&results);

    EstimateReport {
        results,
        totals,
        average_monthly,
        clusters,
        cluster_totals,
    }
}

/// Tier catalogue in ascending capacity order
pub fn available_sizes() -> Vec<TierOption> {
    STANDARD_TIERS.iter().map(TierOption::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::StandardSize;
    use serde_json::{json, Map, Value};

    fn entry(env: &str) -> UsageEntry {
        let mut payload = Map::new();
        payload.insert("env".to_string(), Value::String(env.to_string()));
        UsageEntry::from_payload(payload).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_tier_boundaries() {
        let cases = [
            (0, StandardSize::S),
            (8, StandardSize::S),
            (9, StandardSize::M),
            (16, StandardSize::M),
            (17, StandardSize::L),
            (32, StandardSize::L),
            (33, StandardSize::XL),
            (64, StandardSize::XL),
            (65, StandardSize::XL),
            (1000, StandardSize::XL),
            (u64::MAX, StandardSize::XL),
        ];
        for (cpu, size) in cases {
            assert_eq!(lookup_tier(cpu).size, size, "cpu {}", cpu);
        }
        assert_eq!(lookup_tier(8).monthly, 413.46);
        assert_eq!(lookup_tier(9).monthly, 583.84);
        assert_eq!(lookup_tier(1000).monthly, 2205.12);
    }

    #[test]
    fn test_tier_price_is_monotonic() {
        let mut previous = 0.0;
        for cpu in 0..=200 {
            let tier = lookup_tier(cpu);
            assert!(tier.monthly >= previous, "price dropped at {}", cpu);
            previous = tier.monthly;
        }
    }

    #[test]
    fn test_tier_table_is_ascending() {
        for pair in STANDARD_TIERS.windows(2) {
            assert!(pair[0].cpu_max < pair[1].cpu_max);
        }
    }

    #[test]
    fn test_buffered_cpu_rounds_up() {
        assert_eq!(buffered_cpu(0), 0);
        assert_eq!(buffered_cpu(1), 2);
        assert_eq!(buffered_cpu(10), 13);
        assert_eq!(buffered_cpu(7), 10);
        assert_eq!(buffered_cpu(18_000), 23_400);
        assert_eq!(buffered_cpu(128_000), 166_400);
    }

    #[test]
    fn test_three_dev_entries() {
        let mut store = EntryStore::new();
        for _ in 0..3 {
            store.append(entry("dev"));
        }

        let summary = compute_summary_per_env(&store);
        let dev = &summary["dev"];
        assert_eq!(dev.total_namespaces, 3);
        assert_eq!(dev.total_cpu, 18_000);
        assert_eq!(dev.total_cpu_buffered, 23_400);
        assert_eq!(dev.standard_size, StandardSize::XL);
        assert_close(dev.monthly_cost, 6615.36);
        assert_close(dev.annual_cost, 79384.32);
    }

    #[test]
    fn test_environments_are_summarized_separately() {
        let mut store = EntryStore::new();
        store.append(entry("prod"));
        store.append(entry("dev"));
        store.append(entry("prod"));

        let summary = compute_summary_per_env(&store);
        assert_eq!(summary.len(), 2);

        let prod = &summary["prod"];
        assert_eq!(prod.total_namespaces, 2);
        assert_eq!(prod.total_cpu, 256_000);
        assert_eq!(prod.total_cpu_buffered, 332_800);
        assert_close(prod.monthly_cost, 4410.24);

        let dev = &summary["dev"];
        assert_eq!(dev.total_namespaces, 1);
        assert_eq!(dev.total_cpu, 6_000);
    }

    #[test]
    fn test_small_totals_reach_lower_tiers() {
        let mut entries = vec![entry("dev"), entry("dev")];
        for e in &mut entries {
            e.cpu_core_ns = 3;
        }
        let summary = summarize_environment(&entries);
        assert_eq!(summary.total_cpu, 6);
        assert_eq!(summary.total_cpu_buffered, 8);
        assert_eq!(summary.standard_size, StandardSize::S);
        assert_close(summary.monthly_cost, 826.92);
    }

    #[test]
    fn test_empty_store_has_empty_summary() {
        assert!(compute_summary_per_env(&EntryStore::new()).is_empty());
    }

    #[test]
    fn test_summary_is_idempotent() {
        let mut store = EntryStore::new();
        store.append(entry("prod"));
        store.append(entry("uat"));
        assert_eq!(
            compute_summary_per_env(&store),
            compute_summary_per_env(&store)
        );
    }

    #[test]
    fn test_summary_serialization() {
        let mut store = EntryStore::new();
        store.append(entry("dev"));
        let value = serde_json::to_value(compute_summary_per_env(&store)).unwrap();
        assert_eq!(value["dev"]["standard_size"], json!("XL"));
        assert_eq!(value["dev"]["total_cpu_buffered"], json!(7800));
    }

    fn cost_of(namespace: Value) -> NamespaceCost {
        cost_namespace(&namespace)
    }

    #[test]
    fn test_cost_namespace_converts_millicores() {
        let cost = cost_of(json!({ "name": "web", "pods": 3, "cpu_req": 100 }));
        assert_close(cost.cpu_cores_total, 0.3);
        assert_eq!(cost.buffered_cpu, 1);
        assert_eq!(cost.recommended_size, StandardSize::S);
        assert_close(cost.monthly_cost, 413.46);
        assert_close(cost.annual_cost, 4961.52);
        assert!(!cost.is_error());

        let cost = cost_of(json!({ "pods": 10, "cpu_req": 1000 }));
        assert_close(cost.cpu_cores_total, 10.0);
        assert_eq!(cost.buffered_cpu, 13);
        assert_eq!(cost.recommended_size, StandardSize::M);

        let cost = cost_of(json!({ "pods": 50, "cpu_req": 2000 }));
        assert_eq!(cost.buffered_cpu, 130);
        assert_eq!(cost.recommended_size, StandardSize::XL);
        assert_close(cost.monthly_cost, 2205.12);
    }

    #[test]
    fn test_cost_namespace_accepts_numeric_strings() {
        let cost = cost_of(json!({ "pods": "4", "cpu_req": " 500 " }));
        assert_close(cost.cpu_cores_total, 2.0);
        assert_eq!(cost.buffered_cpu, 3);
        assert_eq!(cost.recommended_size, StandardSize::S);
    }

    #[test]
    fn test_cost_namespace_zero_pods_is_smallest_tier() {
        let cost = cost_of(json!({ "pods": 0, "cpu_req": 250 }));
        assert_eq!(cost.cpu_cores_total, 0.0);
        assert_eq!(cost.buffered_cpu, 0);
        assert_eq!(cost.recommended_size, StandardSize::S);
        assert_close(cost.monthly_cost, 413.46);
        assert!(!cost.is_error());
    }

    #[test]
    fn test_cost_namespace_override_size() {
        let cost = cost_of(json!({ "pods": 3, "cpu_req": 100, "override_size": "XL" }));
        assert_eq!(cost.buffered_cpu, 1);
        assert_eq!(cost.recommended_size, StandardSize::XL);
        assert_close(cost.monthly_cost, 2205.12);

        for unknown in [json!("xl"), json!("XXL"), json!(""), json!(3)] {
            let cost = cost_of(json!({ "pods": 3, "cpu_req": 100, "override_size": unknown }));
            assert_eq!(cost.recommended_size, StandardSize::S);
        }
    }

    #[test]
    fn test_cost_namespace_errors() {
        let cases = [
            (json!({ "pods": 2 }), "Missing required fields"),
            (json!({ "cpu_req": 100 }), "Missing required fields"),
            (json!({ "pods": "abc", "cpu_req": 100 }), "Invalid numeric values"),
            (json!({ "pods": [1], "cpu_req": 100 }), "Invalid numeric values"),
            (json!({ "pods": 1e200, "cpu_req": 1e200 }), "Invalid CPU calculation"),
            (json!(5), "Invalid namespace data"),
        ];
        for (input, message) in cases {
            let cost = cost_of(input.clone());
            assert_eq!(cost.calculation_error.as_deref(), Some(message), "{}", input);
            assert_eq!(cost.recommended_size, StandardSize::XL);
            assert_eq!(cost.monthly_cost, 0.0);
            assert_eq!(cost.annual_cost, 0.0);
            assert_eq!(cost.buffered_cpu, 0);
        }
    }

    #[test]
    fn test_cost_namespace_echoes_caller_fields() {
        let cost = cost_of(json!({
            "name": "web",
            "cluster": "c1",
            "pods": 3,
            "cpu_req": 100,
            "monthly_cost": 1
        }));
        assert_eq!(cost.fields["name"], json!("web"));
        assert!(!cost.fields.contains_key("monthly_cost"));

        let value = serde_json::to_value(&cost).unwrap();
        assert_eq!(value["name"], json!("web"));
        assert_eq!(value["recommended_size"], json!("S"));
        assert_eq!(value["monthly_cost"], json!(413.46));
        assert_eq!(value["calculation_error"], Value::Null);
    }

    #[test]
    fn test_estimate_namespaces_totals_and_clusters() {
        let namespaces = [
            json!({ "name": "a", "pods": 3, "cpu_req": 100, "cluster": "c1" }),
            json!({ "name": "b", "pods": 10, "cpu_req": 1000, "cluster": "c1" }),
            json!({ "name": "c", "pods": 50, "cpu_req": 2000, "cluster": "big" }),
            json!({ "name": "d", "pods": 2 }),
        ];
        let report = estimate_namespaces(&namespaces);

        assert_eq!(report.results.len(), 4);
        assert_eq!(report.totals.namespaces, 4);
        assert_eq!(report.totals.errors, 1);
        assert_close(report.totals.monthly, 3202.42);
        assert_close(report.totals.annual, 38429.04);
        assert_close(report.average_monthly, 800.605);

        assert_eq!(report.clusters.len(), 3);
        let c1 = &report.clusters["c1"];
        assert_eq!(c1.namespaces, 2);
        assert_close(c1.cpu, 10.3);
        assert_close(c1.cpu_with_buffer, 13.39);
        assert_eq!(c1.node_count, 1);
        assert_close(c1.monthly_cost, 997.30);
        assert_close(c1.annual_cost, 11967.6);

        let big = &report.clusters["big"];
        assert_close(big.cpu_with_buffer, 130.0);
        assert_eq!(big.node_count, 3);

        let unassigned = &report.clusters[UNASSIGNED_CLUSTER];
        assert_eq!(unassigned.namespaces, 1);
        assert_eq!(unassigned.node_count, 0);
        assert_eq!(unassigned.monthly_cost, 0.0);

        let overall = &report.cluster_totals;
        assert_eq!(overall.namespaces, 4);
        assert_close(overall.cpu, 110.3);
        assert_close(overall.cpu_with_buffer, 143.39);
        assert_eq!(overall.node_count, 3);
        assert_close(overall.monthly_cost, 3202.42);
    }

    #[test]
    fn test_estimate_namespaces_empty() {
        let report = estimate_namespaces(&[]);
        assert!(report.results.is_empty());
        assert!(report.clusters.is_empty());
        assert_eq!(report.totals, EstimateTotals::default());
        assert_eq!(report.average_monthly, 0.0);
        assert_eq!(report.cluster_totals.node_count, 0);
    }

    #[test]
    fn test_available_sizes() {
        let sizes = available_sizes();
        assert_eq!(sizes.len(), 4);
        assert_eq!(sizes[0].label, "S (up to 8 CPU cores)");
        assert_eq!(sizes[3].value, StandardSize::XL);
        assert_eq!(sizes[3].monthly, 2205.12);
    }
}
