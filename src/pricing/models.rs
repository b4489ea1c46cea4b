use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Standard namespace size label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StandardSize {
    S,
    M,
    L,
    XL,
}

impl StandardSize {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::XL => "XL",
        }
    }

    /// Exact, case-sensitive label match
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "S" => Some(Self::S),
            "M" => Some(Self::M),
            "L" => Some(Self::L),
            "XL" => Some(Self::XL),
            _ => None,
        }
    }
}

impl fmt::Display for StandardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pricing bracket: capacity ceiling in CPU cores and flat monthly price
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tier {
    pub size: StandardSize,
    pub cpu_max: u64,
    pub monthly: f64,
}

/// Tier table, ascending by capacity. The last tier is the overflow tier.
pub const STANDARD_TIERS: [Tier; 4] = [
    Tier {
        size: StandardSize::S,
        cpu_max: 8,
        monthly: 413.46,
    },
    Tier {
        size: StandardSize::M,
        cpu_max: 16,
        monthly: 583.84,
    },
    Tier {
        size: StandardSize::L,
        cpu_max: 32,
        monthly: 1102.56,
    },
    Tier {
        size: StandardSize::XL,
        cpu_max: 64,
        monthly: 2205.12,
    },
];

/// Catalogue row returned by `GET /api/pricing`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierOption {
    pub value: StandardSize,
    pub label: String,
    pub cpu_max: u64,
    pub monthly: f64,
}

impl From<&Tier> for TierOption {
    fn from(tier: &Tier) -> Self {
        Self {
            value: tier.size,
            label: format!("{} (up to {} CPU cores)", tier.size, tier.cpu_max),
            cpu_max: tier.cpu_max,
            monthly: tier.monthly,
        }
    }
}

/// Cost summary for one environment, recomputed on every request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentSummary {
    pub total_namespaces: usize,
    pub total_cpu: u64,
    pub total_cpu_buffered: u64,
    pub standard_size: StandardSize,
    pub monthly_cost: f64,
    pub annual_cost: f64,
}

/// Sizing result for one namespace of an estimate request.
///
/// `fields` echoes the caller's namespace object minus the computed keys. When
/// the namespace cannot be sized, `calculation_error` is set, costs are zero
/// and the size falls back to the overflow tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceCost {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub cpu_cores_total: f64,
    pub buffered_cpu: u64,
    pub recommended_size: StandardSize,
    pub monthly_cost: f64,
    pub annual_cost: f64,
    pub calculation_error: Option<String>,
}

impl NamespaceCost {
    pub fn is_error(&self) -> bool {
        self.calculation_error.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EstimateTotals {
    pub monthly: f64,
    pub annual: f64,
    pub namespaces: usize,
    pub errors: usize,
}

/// Capacity rollup for a group of namespaces sharing a cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterMetrics {
    pub namespaces: usize,
    pub cpu: f64,
    pub cpu_with_buffer: f64,
    pub node_count: u64,
    pub monthly_cost: f64,
    pub annual_cost: f64,
}

/// Response of `POST /api/estimate`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateReport {
    pub results: Vec<NamespaceCost>,
    pub totals: EstimateTotals,
    pub average_monthly: f64,
    pub clusters: BTreeMap<String, ClusterMetrics>,
    pub cluster_totals: ClusterMetrics,
}
