use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use slotguard_cache::CacheObserver;
use slotguard_common::{MetricsConfig, SharedClock};

use crate::collector::MetricsCollector;
use crate::error::{TelemetryError, TelemetryResult};
use crate::events::{CacheEvent, ConnectionEvent};
use crate::exporter::PrometheusExporter;
use crate::normalize::{normalize, truncate};

const RECENT_SAMPLES: usize = 100;
const SLOW_SAMPLES: usize = 50;
const SLOW_QUERY_CHARS: usize = 500;
const SLOW_PARAMS_CHARS: usize = 200;
const SUMMARY_QUERY_CHARS: usize = 200;
const TOP_SIGNATURES: usize = 10;

/// A recorded operation that exceeded the slow threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowSample {
    pub query: String,
    pub duration: f64,
    pub timestamp: DateTime<Utc>,
    pub params: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectionStats {
    pub total_connections: u64,
    pub active_connections: u64,
    pub peak_connections: u64,
    pub connection_errors: u64,
    pub pool_size: u32,
    pub pool_overflow: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Aggregate for one normalized signature, as reported in the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignatureSummary {
    pub query: String,
    pub count: u64,
    pub avg_time: f64,
    pub max_time: f64,
    pub min_time: f64,
    pub total_time: f64,
    /// 95th percentile over the most recent samples.
    pub recent_p95: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySummary {
    pub total_queries: u64,
    pub total_query_time: f64,
    pub avg_query_time: f64,
    pub slowest_queries: Vec<SignatureSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub query_stats: QuerySummary,
    pub connection_stats: ConnectionStats,
    pub cache_stats: CacheCounters,
    pub monitoring_enabled: bool,
    pub slow_query_threshold: f64,
}

struct SignatureStats {
    count: u64,
    total: Duration,
    max: Duration,
    min: Duration,
    recent: VecDeque<Duration>,
    slow: VecDeque<SlowSample>,
}

impl SignatureStats {
    fn new() -> Self {
        Self {
            count: 0,
            total: Duration::ZERO,
            max: Duration::ZERO,
            min: Duration::MAX,
            recent: VecDeque::with_capacity(RECENT_SAMPLES),
            slow: VecDeque::new(),
        }
    }

    fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total = self.total.saturating_add(duration);
        self.max = self.max.max(duration);
        self.min = self.min.min(duration);

        if self.recent.len() == RECENT_SAMPLES {
            self.recent.pop_front();
        }
        self.recent.push_back(duration);
    }

    fn push_slow(&mut self, sample: SlowSample) {
        if self.slow.len() == SLOW_SAMPLES {
            self.slow.pop_front();
        }
        self.slow.push_back(sample);
    }

    fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total.as_secs_f64() / self.count as f64
        }
    }

    fn recent_p95(&self) -> f64 {
        let mut samples: Vec<Duration> = self.recent.iter().copied().collect();
        if samples.is_empty() {
            return 0.0;
        }
        samples.sort_unstable();
        let rank = ((samples.len() as f64) * 0.95).ceil() as usize;
        samples[rank.saturating_sub(1).min(samples.len() - 1)].as_secs_f64()
    }

    fn summary(&self, signature: &str) -> SignatureSummary {
        SignatureSummary {
            query: truncate(signature, SUMMARY_QUERY_CHARS),
            count: self.count,
            avg_time: self.average(),
            max_time: self.max.as_secs_f64(),
            min_time: self.min.as_secs_f64(),
            total_time: self.total.as_secs_f64(),
            recent_p95: self.recent_p95(),
        }
    }
}

#[derive(Default)]
struct MonitorState {
    signatures: HashMap<String, SignatureStats>,
    connections: ConnectionStats,
    cache: CacheCounters,
}

/// Aggregates operation timings, connection events and cache outcomes.
///
/// Recording never fails the caller: every `record_*` method delegates to a
/// `try_record_*` counterpart and logs whatever error it returns.
pub struct PerformanceMonitor {
    state: Mutex<MonitorState>,
    slow_threshold: Duration,
    enabled: AtomicBool,
    clock: SharedClock,
    exporter: Option<Arc<PrometheusExporter>>,
    collector: Option<Arc<MetricsCollector>>,
}

impl PerformanceMonitor {
    pub fn new(slow_threshold: Duration, clock: SharedClock) -> Self {
        Self {
            state: Mutex::new(MonitorState::default()),
            slow_threshold,
            enabled: AtomicBool::new(true),
            clock,
            exporter: None,
            collector: None,
        }
    }

    /// Build a monitor from configuration. A Prometheus exporter that fails
    /// to initialise is logged and left out.
    pub fn from_config(config: &MetricsConfig, clock: SharedClock) -> Self {
        let mut monitor = Self::new(config.slow_threshold(), clock);
        monitor.set_enabled(config.enabled);

        if config.prometheus {
            match PrometheusExporter::new() {
                Ok(exporter) => monitor.exporter = Some(Arc::new(exporter)),
                Err(e) => tracing::warn!(error = %e, "prometheus exporter disabled"),
            }
        }

        monitor
    }

    pub fn with_exporter(mut self, exporter: Arc<PrometheusExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Forward every recorded event to a buffered collector as well.
    pub fn with_collector(mut self, collector: Arc<MetricsCollector>) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn exporter(&self) -> Option<&Arc<PrometheusExporter>> {
        self.exporter.as_ref()
    }

    pub fn collector(&self) -> Option<&Arc<MetricsCollector>> {
        self.collector.as_ref()
    }

    pub fn slow_threshold(&self) -> Duration {
        self.slow_threshold
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn state(&self) -> TelemetryResult<MutexGuard<'_, MonitorState>> {
        self.state
            .lock()
            .map_err(|_| TelemetryError::LockPoisoned("performance monitor"))
    }

    fn state_for_read(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one executed operation. Never fails.
    pub fn record_query(&self, query: &str, duration: Duration, params: Option<&serde_json::Value>) {
        if let Err(e) = self.try_record_query(query, duration, params) {
            tracing::warn!(error = %e, "failed to record query metric");
        }
    }

    pub fn try_record_query(
        &self,
        query: &str,
        duration: Duration,
        params: Option<&serde_json::Value>,
    ) -> TelemetryResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let signature = normalize(query);
        let is_slow = duration > self.slow_threshold;

        let slow_sample = if is_slow {
            let params = params
                .map(serde_json::to_string)
                .transpose()?
                .map(|rendered| truncate(&rendered, SLOW_PARAMS_CHARS));
            Some(SlowSample {
                query: truncate(query, SLOW_QUERY_CHARS),
                duration: duration.as_secs_f64(),
                timestamp: self.clock.now(),
                params,
            })
        } else {
            None
        };

        {
            let mut state = self.state()?;
            let stats = state
                .signatures
                .entry(signature.clone())
                .or_insert_with(SignatureStats::new);
            stats.record(duration);
            if let Some(sample) = slow_sample {
                stats.push_slow(sample);
            }
        }

        if is_slow {
            tracing::warn!(
                target: "performance",
                duration_ms = duration.as_secs_f64() * 1000.0,
                query = %truncate(query, SUMMARY_QUERY_CHARS),
                "slow query detected"
            );
        }

        if let Some(exporter) = &self.exporter {
            exporter.queries_total.inc();
            exporter.query_duration.observe(duration.as_secs_f64());
            if is_slow {
                exporter.slow_queries_total.inc();
            }
        }

        if let Some(collector) = &self.collector {
            collector.collect_query(&signature, duration);
        }

        Ok(())
    }

    pub fn record_connection_event(&self, event: ConnectionEvent) {
        if let Err(e) = self.try_record_connection_event(event) {
            tracing::warn!(error = %e, "failed to record connection event");
        }
    }

    pub fn try_record_connection_event(&self, event: ConnectionEvent) -> TelemetryResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        {
            let mut state = self.state()?;
            let stats = &mut state.connections;
            match event {
                ConnectionEvent::Connect => {
                    stats.total_connections += 1;
                    stats.active_connections += 1;
                    stats.peak_connections = stats.peak_connections.max(stats.active_connections);
                }
                ConnectionEvent::Disconnect => {
                    stats.active_connections = stats.active_connections.saturating_sub(1);
                }
                ConnectionEvent::Error => stats.connection_errors += 1,
                ConnectionEvent::PoolInfo {
                    pool_size,
                    pool_overflow,
                } => {
                    stats.pool_size = pool_size;
                    stats.pool_overflow = pool_overflow;
                }
            }
        }

        if let Some(exporter) = &self.exporter {
            exporter
                .connection_events
                .with_label_values(&[event.label()])
                .inc();
        }

        if let Some(collector) = &self.collector {
            collector.collect_connection(event);
        }

        Ok(())
    }

    pub fn record_cache_event(&self, event: CacheEvent) {
        if let Err(e) = self.try_record_cache_event(event) {
            tracing::warn!(error = %e, "failed to record cache event");
        }
    }

    pub fn try_record_cache_event(&self, event: CacheEvent) -> TelemetryResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        {
            let mut state = self.state()?;
            let cache = &mut state.cache;
            match event {
                CacheEvent::Hit => cache.hits += 1,
                CacheEvent::Miss => cache.misses += 1,
            }
            let total = cache.hits + cache.misses;
            if total > 0 {
                cache.hit_rate = cache.hits as f64 / total as f64;
            }
        }

        if let Some(exporter) = &self.exporter {
            exporter.cache_events.with_label_values(&[event.label()]).inc();
        }

        if let Some(collector) = &self.collector {
            collector.collect_cache(event);
        }

        Ok(())
    }

    pub fn get_performance_summary(&self) -> PerformanceSummary {
        let state = self.state_for_read();

        let total_queries: u64 = state.signatures.values().map(|s| s.count).sum();
        let total_query_time: f64 = state
            .signatures
            .values()
            .map(|s| s.total.as_secs_f64())
            .sum();
        let avg_query_time = if total_queries > 0 {
            total_query_time / total_queries as f64
        } else {
            0.0
        };

        let mut slowest_queries: Vec<SignatureSummary> = state
            .signatures
            .iter()
            .filter(|(_, stats)| stats.count > 0)
            .map(|(signature, stats)| stats.summary(signature))
            .collect();
        slowest_queries.sort_by(|a, b| b.avg_time.total_cmp(&a.avg_time));
        slowest_queries.truncate(TOP_SIGNATURES);

        PerformanceSummary {
            query_stats: QuerySummary {
                total_queries,
                total_query_time,
                avg_query_time,
                slowest_queries,
            },
            connection_stats: state.connections.clone(),
            cache_stats: state.cache.clone(),
            monitoring_enabled: self.is_enabled(),
            slow_query_threshold: self.slow_threshold.as_secs_f64(),
        }
    }

    /// Slow samples across every signature, slowest first.
    pub fn get_slow_queries(&self, limit: usize) -> Vec<SlowSample> {
        let mut samples: Vec<SlowSample> = {
            let state = self.state_for_read();
            state
                .signatures
                .values()
                .flat_map(|stats| stats.slow.iter().cloned())
                .collect()
        };
        samples.sort_by(|a, b| b.duration.total_cmp(&a.duration));
        samples.truncate(limit);
        samples
    }

    /// Clear all statistics. Administrative; rarely called.
    pub fn reset_stats(&self) {
        let mut state = self.state_for_read();
        *state = MonitorState::default();
        tracing::info!("performance statistics reset");
    }
}

impl CacheObserver for PerformanceMonitor {
    fn on_hit(&self, _key: &str) {
        self.record_cache_event(CacheEvent::Hit);
    }

    fn on_miss(&self, _key: &str) {
        self.record_cache_event(CacheEvent::Miss);
    }
}
