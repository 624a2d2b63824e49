//! # Peril Telemetry
//!
//! Structured logging for the Peril client and server.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use peril_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env("peril-server"))?;
//!     tracing::info!("Starting Peril server");
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | - | Log filter, wins over `PERIL_LOG_LEVEL` |
//! | `PERIL_LOG_LEVEL` | `info` | Log filter |
//! | `PERIL_JSON_LOGS` | `false` | One JSON object per event |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("A global tracing subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Install the global `tracing` subscriber described by `config`.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_setup::init_tracing(config)?;
    tracing::debug!(
        service = %config.service_name,
        json = config.json_logs,
        "Telemetry initialized"
    );
    Ok(())
}
