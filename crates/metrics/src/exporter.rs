use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

use crate::error::TelemetryResult;

/// Prometheus mirror of everything the performance monitor records.
pub struct PrometheusExporter {
    registry: Registry,
    pub queries_total: IntCounter,
    pub slow_queries_total: IntCounter,
    pub query_duration: Histogram,
    pub connection_events: IntCounterVec,
    pub cache_events: IntCounterVec,
}

impl PrometheusExporter {
    /// Create the collectors and register them against a fresh registry.
    pub fn new() -> TelemetryResult<Self> {
        let registry = Registry::new();

        let queries_total = IntCounter::with_opts(Opts::new(
            "slotguard_queries_total",
            "Total number of recorded operations",
        ))?;

        let slow_queries_total = IntCounter::with_opts(Opts::new(
            "slotguard_slow_queries_total",
            "Operations slower than the configured threshold",
        ))?;

        let query_duration = Histogram::with_opts(
            HistogramOpts::new(
                "slotguard_query_duration_seconds",
                "Operation duration in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        )?;

        let connection_events = IntCounterVec::new(
            Opts::new("slotguard_connection_events_total", "Connection pool events by kind"),
            &["event"],
        )?;

        let cache_events = IntCounterVec::new(
            Opts::new("slotguard_cache_events_total", "Query cache lookups by result"),
            &["result"],
        )?;

        registry.register(Box::new(queries_total.clone()))?;
        registry.register(Box::new(slow_queries_total.clone()))?;
        registry.register(Box::new(query_duration.clone()))?;
        registry.register(Box::new(connection_events.clone()))?;
        registry.register(Box::new(cache_events.clone()))?;

        Ok(Self {
            registry,
            queries_total,
            slow_queries_total,
            query_duration,
            connection_events,
            cache_events,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the text exposition format.
    pub fn render(&self) -> TelemetryResult<String> {
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
