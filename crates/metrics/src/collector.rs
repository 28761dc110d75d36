use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use slotguard_common::{MetricsConfig, SharedClock};

use crate::error::{TelemetryError, TelemetryResult};
use crate::events::{CacheEvent, ConnectionEvent};

#[derive(Debug, Clone, PartialEq)]
enum MetricEvent {
    Query { signature_hash: u64, duration: Duration },
    Connection(ConnectionEvent),
    Cache(CacheEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryWindow {
    pub count: u64,
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    pub slow: u64,
    pub distinct_signatures: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionWindow {
    pub events: BTreeMap<String, u64>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheWindow {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub total_operations: u64,
}

/// Aggregate of one drained buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlushSummary {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_metrics: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queries: Option<QueryWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<ConnectionWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheWindow>,
}

struct CollectorState {
    buffer: Vec<MetricEvent>,
    last_flush: DateTime<Utc>,
}

/// Buffers metric events and periodically logs an aggregate of them.
///
/// A flush happens when the buffer reaches `buffer_size` events or when
/// `flush_interval` has passed since the previous flush, whichever comes
/// first. Flushing drains the buffer.
pub struct MetricsCollector {
    state: Mutex<CollectorState>,
    buffer_size: usize,
    flush_interval: chrono::Duration,
    slow_threshold: Duration,
    clock: SharedClock,
}

impl MetricsCollector {
    pub fn new(
        buffer_size: usize,
        flush_interval: Duration,
        slow_threshold: Duration,
        clock: SharedClock,
    ) -> Self {
        let flush_interval =
            chrono::Duration::from_std(flush_interval).unwrap_or_else(|_| chrono::Duration::days(36_500));
        let last_flush = clock.now();
        Self {
            state: Mutex::new(CollectorState {
                buffer: Vec::with_capacity(buffer_size),
                last_flush,
            }),
            buffer_size: buffer_size.max(1),
            flush_interval,
            slow_threshold,
            clock,
        }
    }

    pub fn from_config(config: &MetricsConfig, clock: SharedClock) -> Self {
        Self::new(
            config.buffer_size,
            config.flush_interval(),
            config.slow_threshold(),
            clock,
        )
    }

    fn state(&self) -> TelemetryResult<MutexGuard<'_, CollectorState>> {
        self.state
            .lock()
            .map_err(|_| TelemetryError::LockPoisoned("metrics collector"))
    }

    /// Buffer an operation under the hash of its normalized signature.
    pub fn collect_query(&self, signature: &str, duration: Duration) -> Option<FlushSummary> {
        let mut hasher = DefaultHasher::new();
        signature.hash(&mut hasher);
        self.collect(MetricEvent::Query {
            signature_hash: hasher.finish(),
            duration,
        })
    }

    pub fn collect_connection(&self, event: ConnectionEvent) -> Option<FlushSummary> {
        self.collect(MetricEvent::Connection(event))
    }

    pub fn collect_cache(&self, event: CacheEvent) -> Option<FlushSummary> {
        self.collect(MetricEvent::Cache(event))
    }

    fn collect(&self, event: MetricEvent) -> Option<FlushSummary> {
        match self.try_collect(event) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, "failed to collect metric");
                None
            }
        }
    }

    fn try_collect(&self, event: MetricEvent) -> TelemetryResult<Option<FlushSummary>> {
        let summary = {
            let mut state = self.state()?;
            state.buffer.push(event);

            let now = self.clock.now();
            if state.buffer.len() >= self.buffer_size
                || now - state.last_flush >= self.flush_interval
            {
                Some(self.drain(&mut state, now))
            } else {
                None
            }
        };

        if let Some(summary) = &summary {
            emit(summary)?;
        }
        Ok(summary)
    }

    /// Flush whatever is buffered. An empty buffer produces nothing and
    /// leaves the flush timer untouched.
    pub fn flush(&self) -> Option<FlushSummary> {
        let summary = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.buffer.is_empty() {
                return None;
            }
            let now = self.clock.now();
            self.drain(&mut state, now)
        };

        if let Err(e) = emit(&summary) {
            tracing::warn!(error = %e, "failed to emit metrics summary");
        }
        Some(summary)
    }

    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .buffer
            .len()
    }

    fn drain(&self, state: &mut CollectorState, now: DateTime<Utc>) -> FlushSummary {
        let events = std::mem::take(&mut state.buffer);
        let period_start = state.last_flush;
        state.last_flush = now;
        summarize(&events, period_start, now, self.slow_threshold)
    }
}

fn emit(summary: &FlushSummary) -> TelemetryResult<()> {
    let rendered = serde_json::to_string(summary)?;
    tracing::info!(target: "performance", summary = %rendered, "metrics flushed");
    Ok(())
}

fn summarize(
    events: &[MetricEvent],
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    slow_threshold: Duration,
) -> FlushSummary {
    let mut durations = Vec::new();
    let mut signatures = HashSet::new();
    let mut connection_events: BTreeMap<String, u64> = BTreeMap::new();
    let mut hits = 0u64;
    let mut misses = 0u64;

    for event in events {
        match event {
            MetricEvent::Query {
                signature_hash,
                duration,
            } => {
                durations.push(*duration);
                signatures.insert(*signature_hash);
            }
            MetricEvent::Connection(event) => {
                *connection_events.entry(event.label().to_string()).or_default() += 1;
            }
            MetricEvent::Cache(CacheEvent::Hit) => hits += 1,
            MetricEvent::Cache(CacheEvent::Miss) => misses += 1,
        }
    }

    let queries = (!durations.is_empty()).then(|| {
        let count = durations.len() as u64;
        let total: f64 = durations.iter().map(Duration::as_secs_f64).sum();
        QueryWindow {
            count,
            avg: total / count as f64,
            max: durations.iter().max().map_or(0.0, Duration::as_secs_f64),
            min: durations.iter().min().map_or(0.0, Duration::as_secs_f64),
            slow: durations.iter().filter(|d| **d > slow_threshold).count() as u64,
            distinct_signatures: signatures.len(),
        }
    });

    let connections = (!connection_events.is_empty()).then(|| ConnectionWindow {
        total: connection_events.values().sum(),
        events: connection_events,
    });

    let total_operations = hits + misses;
    let cache = (total_operations > 0).then(|| CacheWindow {
        hits,
        misses,
        hit_rate: hits as f64 / total_operations as f64,
        total_operations,
    });

    FlushSummary {
        period_start,
        period_end,
        total_metrics: events.len(),
        queries,
        connections,
        cache,
    }
}
