use std::sync::Arc;

use serde_json::Value;
use slotguard_cache::{InvalidationDispatcher, QueryCache};
use slotguard_common::{AppConfig, SharedClock, SystemClock};
use slotguard_metrics::{MetricsCollector, PerformanceMonitor};
use slotguard_rate_limit::RateLimiter;

/// Shared state type alias used across all route handlers.
pub type SharedState = Arc<AppState>;

/// Every core component, wired from one configuration.
pub struct AppState {
    pub config: AppConfig,
    pub limiter: RateLimiter,
    pub cache: Arc<QueryCache<Value>>,
    pub dispatcher: InvalidationDispatcher<Value>,
    pub monitor: Arc<PerformanceMonitor>,
    pub clock: SharedClock,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self::with_clock(config, SystemClock::shared())
    }

    /// Build state against an explicit clock, so tests can drive expiry.
    pub fn with_clock(config: AppConfig, clock: SharedClock) -> Self {
        let limiter = RateLimiter::from_config(&config.rate_limit, clock.clone());

        let cache = Arc::new(QueryCache::from_config(&config.cache, clock.clone()));
        let dispatcher = InvalidationDispatcher::new(Arc::clone(&cache));

        let collector = Arc::new(MetricsCollector::from_config(&config.metrics, clock.clone()));
        let monitor = Arc::new(
            PerformanceMonitor::from_config(&config.metrics, clock.clone()).with_collector(collector),
        );

        Self {
            config,
            limiter,
            cache,
            dispatcher,
            monitor,
            clock,
            start_time: std::time::Instant::now(),
        }
    }
}
