use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;

/// Environment variable prefix, e.g. `NS_COSTING__SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "NS_COSTING";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Cookie-backed session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Idle time after which a session and its entries are dropped
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Add the `Secure` attribute to issued cookies
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_seconds: default_ttl_seconds(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookie: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetsConfig {
    /// Frontend root served at `/`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Directory served at `/assets/config/`
    #[serde(default = "default_config_dir")]
    pub config_dir: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            static_dir: default_static_dir(),
            config_dir: default_config_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_endpoint")]
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            endpoint: default_metrics_endpoint(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_cookie_name() -> String {
    "ns_costing_session".to_string()
}

fn default_ttl_seconds() -> u64 {
    86400
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_static_dir() -> String {
    "frontend".to_string()
}

fn default_config_dir() -> String {
    "frontend/assets/config".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_endpoint() -> String {
    "/metrics".to_string()
}

/// Load configuration from an optional TOML file overlaid with environment variables
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.host.parse::<IpAddr>().is_err() {
        anyhow::bail!("server.host must be an IP address, got '{}'", cfg.server.host);
    }
    if cfg.server.port == 0 {
        anyhow::bail!("server.port must be between 1 and 65535");
    }
    match cfg.server.log_format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("server.log_format must be 'text' or 'json', got '{}'", other),
    }

    if !is_cookie_token(&cfg.session.cookie_name) {
        anyhow::bail!(
            "session.cookie_name '{}' is not a valid cookie name",
            cfg.session.cookie_name
        );
    }
    if cfg.session.ttl_seconds == 0 {
        anyhow::bail!("session.ttl_seconds must be > 0");
    }
    if cfg.session.cleanup_interval_seconds == 0 {
        anyhow::bail!("session.cleanup_interval_seconds must be > 0");
    }

    if cfg.metrics.enabled {
        let endpoint = &cfg.metrics.endpoint;
        if !endpoint.starts_with('/') || endpoint.len() < 2 {
            anyhow::bail!("metrics.endpoint must be an absolute path, got '{}'", endpoint);
        }
        if let Some(reserved) = reserved_path_for(endpoint) {
            anyhow::bail!(
                "metrics.endpoint '{}' collides with the built-in route '{}'",
                endpoint,
                reserved
            );
        }
    }

    Ok(())
}

/// Paths the router serves itself; the metrics endpoint must stay clear of them
const RESERVED_ROUTES: &[&str] = &["/health", "/ready"];
const RESERVED_PREFIXES: &[&str] = &["/api", "/assets/config"];

fn reserved_path_for(endpoint: &str) -> Option<&'static str> {
    let endpoint = endpoint.trim_end_matches('/');
    RESERVED_ROUTES
        .iter()
        .find(|route| endpoint == **route)
        .or_else(|| {
            RESERVED_PREFIXES.iter().find(|prefix| {
                endpoint
                    .strip_prefix(**prefix)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
        })
        .copied()
}

/// RFC 6265 token characters
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}
