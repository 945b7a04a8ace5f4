//! Prometheus metrics for the relay process.
//!
//! All metrics follow the naming convention: `xc_<component>_<metric>_<unit>`
//!
//! Metrics are always recorded; they only become visible through
//! [`encode_metrics`] once [`register_metrics`] has run.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CANCELLATION STORE METRICS
    // =========================================================================

    /// Records marked canceled
    pub static ref CANCELLATIONS_SET: Counter = Counter::new(
        "xc_store_cancellations_set_total",
        "Total cancellation records written"
    ).expect("metric creation failed");

    /// Records removed
    pub static ref CANCELLATIONS_DELETED: Counter = Counter::new(
        "xc_store_cancellations_deleted_total",
        "Total cancellation records deleted"
    ).expect("metric creation failed");

    /// Cancellation queries answered
    pub static ref CANCELLATION_QUERIES: CounterVec = CounterVec::new(
        Opts::new("xc_store_queries_total", "Cancellation queries answered"),
        &["outcome"]  // outcome: canceled/not_canceled
    ).expect("metric creation failed");

    /// Live records in the store
    pub static ref STORE_RECORDS: Gauge = Gauge::new(
        "xc_store_records",
        "Number of cancellation records currently held"
    ).expect("metric creation failed");

    /// Store purges (relay install/activate)
    pub static ref STORE_PURGES: Counter = Counter::new(
        "xc_store_purges_total",
        "Times the cancellation store was cleared"
    ).expect("metric creation failed");

    // =========================================================================
    // RELAY METRICS
    // =========================================================================

    /// Commands handled by the relay actor
    pub static ref RELAY_COMMANDS: CounterVec = CounterVec::new(
        Opts::new("xc_relay_commands_total", "Commands handled by the relay process"),
        &["command"]
    ).expect("metric creation failed");

    /// Forwarded RPC calls by outcome
    pub static ref RPC_FORWARDED: CounterVec = CounterVec::new(
        Opts::new("xc_relay_rpc_forwarded_total", "RPC calls forwarded to an owning context"),
        &["outcome"]  // outcome: ok/error/no_client/dropped
    ).expect("metric creation failed");

    /// Round trip of a forwarded RPC call
    pub static ref RPC_FORWARD_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "xc_relay_rpc_forward_duration_seconds",
            "Time from forwarding an RPC call to receiving its reply"
        ).buckets(exponential_buckets(0.0001, 2.0, 16).expect("bucket creation failed"))
    ).expect("metric creation failed");
}

/// Handle to the registry holding the relay metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; metrics already registered are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Store
        Box::new(CANCELLATIONS_SET.clone()),
        Box::new(CANCELLATIONS_DELETED.clone()),
        Box::new(CANCELLATION_QUERIES.clone()),
        Box::new(STORE_RECORDS.clone()),
        Box::new(STORE_PURGES.clone()),
        // Relay
        Box::new(RELAY_COMMANDS.clone()),
        Box::new(RPC_FORWARDED.clone()),
        Box::new(RPC_FORWARD_DURATION.clone()),
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
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_twice() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_encode_contains_relay_metrics() {
        register_metrics().unwrap();
        RPC_FORWARDED.with_label_values(&["ok"]).inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("xc_relay_rpc_forwarded_total"));
    }

    #[test]
    fn test_counter_increment() {
        CANCELLATIONS_SET.inc();
        assert!(CANCELLATIONS_SET.get() >= 1.0);
    }

    #[test]
    fn test_histogram_timer() {
        let before = RPC_FORWARD_DURATION.get_sample_count();
        {
            let _timer = HistogramTimer::new(&RPC_FORWARD_DURATION);
        }
        assert!(RPC_FORWARD_DURATION.get_sample_count() > before);
    }
}
