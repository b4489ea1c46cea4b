pub mod calculator;
pub mod models;

pub use calculator::{
    available_sizes, buffered_cpu, cluster_metrics, compute_summary_per_env, cost_namespace,
    estimate_namespaces, lookup_tier, summarize_environment, CPU_PER_NODE, UNASSIGNED_CLUSTER,
};
pub use models::{
    ClusterMetrics, EnvironmentSummary, EstimateReport, EstimateTotals, NamespaceCost,
    StandardSize, Tier, TierOption, STANDARD_TIERS,
};
