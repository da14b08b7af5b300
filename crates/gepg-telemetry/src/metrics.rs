//! Prometheus metrics for GePG envelope exchanges.
//!
//! All metrics follow the naming convention: `gepg_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Completed exchanges by request category and outcome
    pub static ref EXCHANGES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("gepg_exchanges_total", "Total envelope exchanges with the gateway"),
        &["category", "outcome"]  // outcome: decoded/signing_failed/transport_failed/...
    ).expect("metric creation failed");

    /// Exchange duration from signing to decoded response
    pub static ref EXCHANGE_DURATION: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "gepg_exchange_duration_seconds",
            "Time spent on a full signed exchange"
        ).buckets(exponential_buckets(0.005, 2.0, 12).expect("valid bucket layout")),
        &["category"]
    ).expect("metric creation failed");

    /// Signatures produced over outbound payloads and acknowledgments
    pub static ref SIGNATURES_CREATED: Counter = Counter::new(
        "gepg_signatures_created_total",
        "Total signatures produced"
    ).expect("metric creation failed");

    /// Received envelopes whose signature did not validate (for alerting)
    pub static ref VERIFICATION_FAILURES: Counter = Counter::new(
        "gepg_verification_failures_total",
        "Total received envelopes rejected by signature verification"
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(EXCHANGES_TOTAL.clone()),
        Box::new(EXCHANGE_DURATION.clone()),
        Box::new(SIGNATURES_CREATED.clone()),
        Box::new(VERIFICATION_FAILURES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
