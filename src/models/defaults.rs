use serde::Serialize;
use std::collections::BTreeMap;

/// Environments that inherit the non-production form defaults
pub const NONPROD_ALIASES: [&str; 5] = ["uat", "sit", "test", "sandbox", "dev"];

/// Prefill values for the entry form of one environment.
///
/// CPU values are millicores, memory values are MiB.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentDefaults {
    pub pods: u32,
    pub cpu_req: u32,
    pub mem_req: u32,
    pub cpu_lim: u32,
    pub mem_lim: u32,
    pub hpa_min: u32,
    pub hpa_max: u32,
    pub cpu_trigger: &'static str,
    pub istio_cpu_req: u32,
    pub istio_cpu_lim: u32,
    pub istio_mem_req: u32,
    pub istio_mem_lim: u32,
}

impl EnvironmentDefaults {
    pub const PROD: Self = Self {
        pods: 3,
        cpu_req: 100,
        mem_req: 2000,
        cpu_lim: 1000,
        mem_lim: 2000,
        hpa_min: 3,
        hpa_max: 64,
        cpu_trigger: "60%",
        istio_cpu_req: 250,
        istio_cpu_lim: 1000,
        istio_mem_req: 1000,
        istio_mem_lim: 2000,
    };

    pub const NONPROD: Self = Self {
        pods: 1,
        cpu_req: 100,
        mem_req: 1000,
        cpu_lim: 1000,
        mem_lim: 1000,
        hpa_min: 1,
        hpa_max: 3,
        cpu_trigger: "40%",
        istio_cpu_req: 250,
        istio_cpu_lim: 1000,
        istio_mem_req: 1000,
        istio_mem_lim: 1000,
    };
}

/// Defaults for a known environment name
pub fn defaults_for(env: &str) -> Option<&'static EnvironmentDefaults> {
    match env {
        "prod" => Some(&EnvironmentDefaults::PROD),
        "nonprod" => Some(&EnvironmentDefaults::NONPROD),
        other if NONPROD_ALIASES.contains(&other) => Some(&EnvironmentDefaults::NONPROD),
        _ => None,
    }
}

/// Every known environment with its defaults
pub fn all_defaults() -> BTreeMap<&'static str, &'static EnvironmentDefaults> {
    let mut map = BTreeMap::new();
    map.insert("prod", &EnvironmentDefaults::PROD);
    map.insert("nonprod", &EnvironmentDefaults::NONPROD);
    for alias in NONPROD_ALIASES {
        map.insert(alias, &EnvironmentDefaults::NONPROD);
    }
    map
}
