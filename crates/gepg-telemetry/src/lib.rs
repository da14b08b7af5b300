//! # GePG Telemetry
//!
//! Logging and metrics shared by the GePG client crates.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` registry with an env filter and either a
//!   human-readable or a JSON formatter
//! - **Metrics**: Prometheus counters and histograms for envelope exchanges
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gepg_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//!     // Exchanges are now logged and counted
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `gepg-client` | Service name attached to logs |
//! | `GEPG_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `GEPG_JSON_LOGS` | `false` | Emit JSON formatted logs |
//! | `GEPG_CONSOLE_OUTPUT` | `true` | Write logs to stderr at all |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LoggingHandle};
pub use metrics::{
    gather_metrics, register_metrics, MetricsHandle, EXCHANGES_TOTAL, EXCHANGE_DURATION,
    SIGNATURES_CREATED, VERIFICATION_FAILURES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    let logging = init_logging(&config)?;

    Ok(TelemetryGuard {
        _logging: logging,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _logging: LoggingHandle,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("Shutting down telemetry");
    }
}
