//! Operation timing, connection and cache telemetry.
//!
//! Nothing in this crate fails its caller. Internal errors surface as
//! [`TelemetryError`] from the `try_*` methods and are logged and dropped by
//! the public recording methods.

pub mod collector;
pub mod error;
pub mod events;
pub mod exporter;
pub mod monitor;
pub mod normalize;

pub use collector::{CacheWindow, ConnectionWindow, FlushSummary, MetricsCollector, QueryWindow};
pub use error::{TelemetryError, TelemetryResult};
pub use events::{CacheEvent, ConnectionEvent};
pub use exporter::PrometheusExporter;
pub use monitor::{
    CacheCounters, ConnectionStats, PerformanceMonitor, PerformanceSummary, QuerySummary,
    SignatureSummary, SlowSample,
};
pub use normalize::normalize;
