//! Configuration types for instance-dns-sync.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Notification handler configuration.
    pub handler: HandlerConfig,

    /// Zone service client configuration.
    pub zone_api: ZoneApiConfig,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Notification handler configuration.
///
/// Read-only at event-processing time; swap the whole value through
/// [`SharedHandlerConfig`] to change it between reconciliations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Message bus exchange the instance notifications arrive on.
    #[serde(default = "default_control_exchange")]
    pub control_exchange: String,

    /// Topics to bind on the exchange.
    #[serde(default = "default_notification_topics")]
    pub notification_topics: Vec<String>,

    /// Tenants to skip entirely (no zone lookups, no record writes).
    #[serde(default)]
    pub exclude_projects: HashSet<String>,

    /// Zone names excluded from suffix matching. Compared with the
    /// trailing dot stripped.
    #[serde(default)]
    pub exclude_zones: HashSet<String>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            control_exchange: default_control_exchange(),
            notification_topics: default_notification_topics(),
            exclude_projects: HashSet::new(),
            exclude_zones: HashSet::new(),
        }
    }
}

impl HandlerConfig {
    /// True when the tenant has been excluded by the operator.
    pub fn is_project_excluded(&self, tenant_id: &str) -> bool {
        self.exclude_projects.contains(tenant_id)
    }

    /// True when the zone name (trailing dot stripped) is excluded
    /// from matching.
    pub fn is_zone_excluded(&self, zone_name: &str) -> bool {
        self.exclude_zones
            .contains(zone_name.trim_end_matches('.'))
    }
}

fn default_control_exchange() -> String {
    "nova".to_string()
}

fn default_notification_topics() -> Vec<String> {
    vec!["notifications".to_string()]
}

/// Zone service client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneApiConfig {
    /// Base URL of the zone service (e.g., "http://127.0.0.1:9001").
    pub endpoint: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter (e.g., "info", "instance_dns_sync=debug,warn").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus metrics exporter address.
    #[serde(default)]
    pub prometheus_addr: Option<SocketAddr>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            prometheus_addr: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Clone-able handle over the handler configuration.
///
/// `load()` hands out an `Arc` snapshot, so event processing reads the
/// config without holding any lock; `store()` swaps the snapshot atomically
/// between reconciliations.
#[derive(Debug, Clone)]
pub struct SharedHandlerConfig {
    inner: Arc<RwLock<Arc<HandlerConfig>>>,
}

impl SharedHandlerConfig {
    /// Wrap a handler configuration in a shared handle.
    pub fn new(config: HandlerConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Current configuration snapshot.
    pub fn load(&self) -> Arc<HandlerConfig> {
        self.inner.read().clone()
    }

    /// Replace the configuration. In-flight reconciliations keep the
    /// snapshot they already loaded.
    pub fn store(&self, config: HandlerConfig) {
        *self.inner.write() = Arc::new(config);
    }
}

impl Default for SharedHandlerConfig {
    fn default() -> Self {
        Self::new(HandlerConfig::default())
    }
}
