//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use saga::PaymentPolicy;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `PAYMENT_POLICY`: `always_success`, `always_fail` or `random` (default: `random`)
/// - `PAYMENT_SUCCESS_RATE`: success probability for `random` (default: `0.5`)
/// - `DOWNSTREAM_TIMEOUT_MS`: per-call peer timeout (default: `3000`)
/// - `NOTIFICATION_URL`: external notification service; unset keeps notifications in-process
/// - `DATA_DIR`: directory for JSON snapshots; unset keeps everything in memory
///
/// Invalid values fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub payment_policy: PaymentPolicy,
    pub downstream_timeout: Duration,
    pub notification_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut payment_policy = non_empty("PAYMENT_POLICY")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.payment_policy);
        if let Some(rate) = non_empty("PAYMENT_SUCCESS_RATE").and_then(|r| r.parse::<f64>().ok())
        {
            payment_policy = payment_policy.with_success_rate(rate.clamp(0.0, 1.0));
        }

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match non_empty("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            payment_policy,
            downstream_timeout: non_empty("DOWNSTREAM_TIMEOUT_MS")
                .and_then(|ms| ms.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.downstream_timeout),
            notification_url: non_empty("NOTIFICATION_URL"),
            data_dir: non_empty("DATA_DIR").map(PathBuf::from),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            payment_policy: PaymentPolicy::default(),
            downstream_timeout: domain::DEFAULT_CALL_TIMEOUT,
            notification_url: None,
            data_dir: None,
        }
    }
}
