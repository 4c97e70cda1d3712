use std::collections::BTreeMap;
use std::{net::SocketAddr, time::Duration};

use nef_api::policy::MediaType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Core network event bus
    #[serde(default)]
    pub redis: RedisConfig,
    /// External-id to SUPI resolution service
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Policy controller (PCF) used for QoS sessions
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub qos: QosConfig,
    /// Delivery to AF notification destinations
    #[serde(default)]
    pub webhook: WebhookSettings,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.request_timeout_ms == 0 {
            return Err("server.request_timeout_ms must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.redis.enabled && self.redis.url.is_empty() {
            return Err("redis.enabled=true requires redis.url".into());
        }
        if self.identity.url.is_empty() {
            return Err("identity.url must not be empty".into());
        }
        if self.policy.url.is_empty() {
            return Err("policy.url must not be empty".into());
        }
        // API roots are joined with path segments, so they need a leading slash
        for (name, root) in [
            ("monitoring.api_root", &self.monitoring.api_root),
            ("qos.api_root", &self.qos.api_root),
        ] {
            if root.is_empty() || !root.starts_with('/') || root.ends_with('/') {
                return Err(format!(
                    "{name} must start with '/' and have no trailing '/'"
                ));
            }
        }
        if self.monitoring.api_root == self.qos.api_root {
            return Err("monitoring.api_root and qos.api_root must differ".into());
        }
        for (name, reference) in &self.qos.references {
            if reference.mar_bw_dl.is_empty() || reference.mar_bw_ul.is_empty() {
                return Err(format!(
                    "qos.references.{name} requires mar_bw_dl and mar_bw_ul"
                ));
            }
            if MediaType::parse(&reference.media_type.to_ascii_uppercase()).is_none() {
                return Err(format!(
                    "qos.references.{name}.media_type must be one of {:?}",
                    MediaType::ALL.map(|m| m.as_str())
                ));
            }
        }
        if self.webhook.timeout_ms == 0 || self.webhook.connect_timeout_ms == 0 {
            return Err("webhook timeouts must be > 0".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        let ip: std::net::IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(std::net::IpAddr::from([0, 0, 0, 0]));
        SocketAddr::from((ip, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u32,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms as u64)
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout_ms() -> u32 {
    30_000
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Redis holding UE snapshots (RedisJSON) and publishing UE updates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// When disabled the gateway runs against an in-process event source
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,

    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size for snapshot reads
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_enabled() -> bool {
    true
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: default_redis_enabled(),
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_identity_url")]
    pub url: String,
    #[serde(default = "default_client_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_identity_url() -> String {
    "http://127.0.0.1:8090".into()
}

fn default_client_timeout_ms() -> u64 {
    5000
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            url: default_identity_url(),
            timeout_ms: default_client_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_policy_url")]
    pub url: String,
    #[serde(default = "default_client_timeout_ms")]
    pub timeout_ms: u64,
    /// Sent as `suppFeat` in every app session request
    #[serde(default = "default_supported_features")]
    pub supported_features: String,
}

fn default_policy_url() -> String {
    "http://127.0.0.1:7777".into()
}

fn default_supported_features() -> String {
    "0".into()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            url: default_policy_url(),
            timeout_ms: default_client_timeout_ms(),
            supported_features: default_supported_features(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_monitoring_root")]
    pub api_root: String,
}

fn default_monitoring_root() -> String {
    "/3gpp-monitoring-event/v1".into()
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            api_root: default_monitoring_root(),
        }
    }
}

/// Bandwidth and media type applied for one QoS reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QosReferenceConfig {
    pub mar_bw_dl: String,
    pub mar_bw_ul: String,
    pub media_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QosConfig {
    #[serde(default = "default_qos_root")]
    pub api_root: String,
    #[serde(default)]
    pub references: BTreeMap<String, QosReferenceConfig>,
}

fn default_qos_root() -> String {
    "/3gpp-as-session-with-qos/v1".into()
}

impl Default for QosConfig {
    fn default() -> Self {
        Self {
            api_root: default_qos_root(),
            references: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSettings {
    #[serde(default = "default_webhook_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_webhook_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_webhook_timeout_ms() -> u64 {
    30_000
}

fn default_webhook_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_webhook_timeout_ms(),
            connect_timeout_ms: default_webhook_connect_timeout_ms(),
        }
    }
}

impl WebhookSettings {
    pub fn to_adapter_config(&self) -> nef_notifications::WebhookConfig {
        nef_notifications::WebhookConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            ..Default::default()
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_FILE: &str = "nef.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., NEF__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("NEF")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
