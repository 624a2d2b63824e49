//! Telemetry configuration from environment variables.

use std::env;

/// How a Peril process logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every event (`peril-client`, `peril-server`)
    pub service_name: String,

    /// Filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive such as `shared_bus=debug,info`)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "peril".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RUST_LOG` or `PERIL_LOG_LEVEL`: Log filter (default: info)
    /// - `PERIL_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env(service_name: &str) -> Self {
        Self::from_lookup(service_name, |key| env::var(key).ok())
    }

    /// Like [`Self::from_env`], reading variables through `lookup`.
    pub fn from_lookup(service_name: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            service_name: service_name.to_string(),
            log_level: lookup("RUST_LOG")
                .or_else(|| lookup("PERIL_LOG_LEVEL"))
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_level),
            json_logs: lookup("PERIL_JSON_LOGS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.json_logs),
        }
    }
}
