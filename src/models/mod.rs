pub mod defaults;
pub mod entry;

pub use defaults::{all_defaults, defaults_for, EnvironmentDefaults};
pub use entry::{
    cpu_core_ns_for_env, parse_payload, EntryStore, UsageEntry, DEFAULT_CPU_CORE_NS,
    PROD_CPU_CORE_NS,
};
