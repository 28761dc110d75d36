use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GuardError, GuardResult};

/// Top-level configuration for the throttling, caching and telemetry layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_listen")]
    pub listen: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            listen: default_admin_listen(),
            enabled: true,
        }
    }
}

/// Quotas and lockout durations applied by the rate limiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,
    #[serde(default = "default_login_max_attempts")]
    pub login_max_attempts: u32,
    #[serde(default = "default_login_window_minutes")]
    pub login_window_minutes: u32,
    #[serde(default = "default_account_lock_minutes")]
    pub account_lock_minutes: u32,
    /// Interval of the optional background sweep. Zero keeps expiry passive.
    #[serde(default)]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_minutes: default_window_minutes(),
            login_max_attempts: default_login_max_attempts(),
            login_window_minutes: default_login_window_minutes(),
            account_lock_minutes: default_account_lock_minutes(),
            sweep_interval_secs: 0,
        }
    }
}

impl RateLimitConfig {
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_cache_max_size(),
            default_ttl_secs: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: u64,
    #[serde(default = "default_true")]
    pub prometheus: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            slow_threshold_ms: default_slow_threshold_ms(),
            buffer_size: default_buffer_size(),
            flush_interval_secs: default_flush_interval(),
            prometheus: true,
        }
    }
}

impl MetricsConfig {
    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_threshold_ms)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}

// Default value helpers
fn default_admin_listen() -> String {
    "127.0.0.1:9090".to_string()
}
fn default_true() -> bool {
    true
}
fn default_max_requests() -> u32 {
    100
}
fn default_window_minutes() -> u32 {
    60
}
fn default_login_max_attempts() -> u32 {
    3
}
fn default_login_window_minutes() -> u32 {
    15
}
fn default_account_lock_minutes() -> u32 {
    30
}
fn default_cache_max_size() -> usize {
    1000
}
fn default_cache_ttl() -> u64 {
    300
}
fn default_slow_threshold_ms() -> u64 {
    100
}
fn default_buffer_size() -> usize {
    100
}
fn default_flush_interval() -> u64 {
    300
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &str) -> GuardResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from a YAML document.
    pub fn from_yaml(content: &str) -> GuardResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject non-positive quotas and sizes before any component is built.
    pub fn validate(&self) -> GuardResult<()> {
        let rl = &self.rate_limit;
        let positive = [
            ("rate_limit.max_requests", u64::from(rl.max_requests)),
            ("rate_limit.window_minutes", u64::from(rl.window_minutes)),
            ("rate_limit.login_max_attempts", u64::from(rl.login_max_attempts)),
            ("rate_limit.login_window_minutes", u64::from(rl.login_window_minutes)),
            ("rate_limit.account_lock_minutes", u64::from(rl.account_lock_minutes)),
            ("cache.max_size", self.cache.max_size as u64),
            ("metrics.buffer_size", self.metrics.buffer_size as u64),
            ("metrics.flush_interval_secs", self.metrics.flush_interval_secs),
        ];

        for (field, value) in positive {
            if value == 0 {
                return Err(GuardError::Config(format!("{} must be greater than zero", field)));
            }
        }

        if self.admin.enabled && self.admin.listen.parse::<SocketAddr>().is_err() {
            return Err(GuardError::Config(format!(
                "admin.listen '{}' is not a valid socket address",
                self.admin.listen
            )));
        }

        Ok(())
    }
}
