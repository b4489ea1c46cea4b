use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Synthetic CPU cost assigned to every `prod` entry
pub const PROD_CPU_CORE_NS: u64 = 128_000;

/// Synthetic CPU cost assigned to every other entry
pub const DEFAULT_CPU_CORE_NS: u64 = 6_000;

/// Environment name that receives the production CPU cost
pub const PROD_ENV: &str = "prod";

/// CPU cost for an environment. Only an exact `"prod"` match is production.
pub fn cpu_core_ns_for_env(env: &str) -> u64 {
    if env == PROD_ENV {
        PROD_CPU_CORE_NS
    } else {
        DEFAULT_CPU_CORE_NS
    }
}

/// One submitted namespace usage record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub env: String,

    /// Missing on deserialization means zero
    #[serde(default)]
    pub cpu_core_ns: u64,

    /// Caller-supplied fields, stored verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UsageEntry {
    /// Build an entry from a request payload.
    ///
    /// `env` must be present and a string. Any `cpu_core_ns` the caller sent is
    /// replaced by the value derived from `env`.
    pub fn from_payload(mut payload: Map<String, Value>) -> Result<Self, AppError> {
        let env = match payload.remove("env") {
            Some(Value::String(env)) => env,
            Some(other) => {
                return Err(AppError::InvalidPayload(format!(
                    "Field 'env' must be a string, got {}",
                    json_type_name(&other)
                )))
            }
            None => {
                return Err(AppError::InvalidPayload(
                    "Missing required field: env".to_string(),
                ))
            }
        };

        payload.remove("cpu_core_ns");

        Ok(Self {
            cpu_core_ns: cpu_core_ns_for_env(&env),
            env,
            extra: payload,
        })
    }

    pub fn is_prod(&self) -> bool {
        self.env == PROD_ENV
    }
}

/// Environment-keyed, append-only collection of entries for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryStore(BTreeMap<String, Vec<UsageEntry>>);

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append under the entry's environment, creating the sequence if absent
    pub fn append(&mut self, entry: UsageEntry) {
        self.0.entry(entry.env.clone()).or_default().push(entry);
    }

    pub fn environments(&self) -> impl Iterator<Item = (&str, &[UsageEntry])> {
        self.0.iter().map(|(env, entries)| (env.as_str(), entries.as_slice()))
    }

    pub fn entries_for(&self, env: &str) -> Option<&[UsageEntry]> {
        self.0.get(env).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of entries across all environments
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// Parse a raw `/api/add` body into a JSON object.
///
/// Empty bodies and JSON values that carry nothing (`null`, `{}`, `[]`, `""`,
/// `false`, `0`) are reported as [`AppError::NoData`].
pub fn parse_payload(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::NoData);
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidPayload(format!("Invalid JSON body: {}", e)))?;

    if is_empty_value(&value) {
        return Err(AppError::NoData);
    }

    match value {
        Value::Object(map) => Ok(map),
        other => Err(AppError::InvalidPayload(format!(
            "Request body must be a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
