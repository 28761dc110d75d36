use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use slotguard_common::{ManualClock, MetricsConfig};
use slotguard_metrics::{
    normalize, CacheEvent, ConnectionEvent, MetricsCollector, PerformanceMonitor,
    PrometheusExporter,
};

fn monitor_with_collector(buffer_size: usize) -> (PerformanceMonitor, Arc<MetricsCollector>) {
    let clock = ManualClock::starting_now();
    let collector = Arc::new(MetricsCollector::new(
        buffer_size,
        Duration::from_secs(300),
        Duration::from_millis(100),
        clock.clone(),
    ));
    let monitor = PerformanceMonitor::new(Duration::from_millis(100), clock)
        .with_collector(Arc::clone(&collector));
    (monitor, collector)
}

#[test]
fn test_literal_variants_share_a_signature() {
    assert_eq!(
        normalize("SELECT * FROM t WHERE id=1"),
        normalize("SELECT * FROM t WHERE id=999")
    );
}

#[test]
fn test_monitor_feeds_collector() {
    let (monitor, collector) = monitor_with_collector(100);

    monitor.record_query("SELECT * FROM users WHERE id = 1", Duration::from_millis(20), None);
    monitor.record_query("SELECT * FROM users WHERE id = 2", Duration::from_millis(180), None);
    monitor.record_connection_event(ConnectionEvent::Connect);
    monitor.record_cache_event(CacheEvent::Miss);
    assert_eq!(collector.pending(), 4);

    let summary = collector.flush().unwrap();
    let queries = summary.queries.unwrap();
    assert_eq!(queries.count, 2);
    assert_eq!(queries.slow, 1);
    assert_eq!(queries.distinct_signatures, 1);
    assert_eq!(summary.connections.unwrap().total, 1);
    assert_eq!(summary.cache.unwrap().misses, 1);
}

#[test]
fn test_full_buffer_flushes_inline() {
    let (monitor, collector) = monitor_with_collector(10);

    for i in 0..25 {
        monitor.record_query(&format!("SELECT {}", i), Duration::from_millis(1), None);
    }
    assert_eq!(collector.pending(), 5);
}

#[test]
fn test_exporter_and_summary_agree() {
    let exporter = Arc::new(PrometheusExporter::new().unwrap());
    let monitor = PerformanceMonitor::new(Duration::from_millis(100), ManualClock::starting_now())
        .with_exporter(Arc::clone(&exporter));

    monitor.record_query("SELECT 1", Duration::from_millis(5), None);
    monitor.record_query("SELECT 2", Duration::from_millis(500), None);

    let summary = monitor.get_performance_summary();
    assert_eq!(summary.query_stats.total_queries, exporter.queries_total.get());
    assert_eq!(monitor.get_slow_queries(20).len() as u64, exporter.slow_queries_total.get());

    let text = exporter.render().unwrap();
    assert!(text.contains("slotguard_queries_total 2"));
}

#[test]
fn test_monitor_from_config() {
    let config = MetricsConfig {
        slow_threshold_ms: 10,
        ..MetricsConfig::default()
    };
    let monitor = PerformanceMonitor::from_config(&config, ManualClock::starting_now());

    monitor.record_query("SELECT 1", Duration::from_millis(11), None);
    assert_eq!(monitor.get_slow_queries(20).len(), 1);
    assert!(monitor.exporter().is_some());
}

#[test]
fn test_concurrent_recording_is_consistent() {
    let monitor = Arc::new(PerformanceMonitor::new(
        Duration::from_millis(100),
        ManualClock::starting_now(),
    ));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let monitor = Arc::clone(&monitor);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    monitor.record_connection_event(ConnectionEvent::Connect);
                    monitor.record_query("SELECT * FROM t", Duration::from_millis(1), None);
                    monitor.record_connection_event(ConnectionEvent::Disconnect);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let summary = monitor.get_performance_summary();
    assert_eq!(summary.query_stats.total_queries, 200);
    assert_eq!(summary.connection_stats.total_connections, 200);
    assert_eq!(summary.connection_stats.active_connections, 0);
    assert!(summary.connection_stats.peak_connections >= 1);
}

proptest! {
    #[test]
    fn prop_normalize_ignores_numeric_literals(a in 0u32..1_000_000, b in 0u32..1_000_000) {
        prop_assert_eq!(
            normalize(&format!("SELECT * FROM slots WHERE id = {} LIMIT 10", a)),
            normalize(&format!("SELECT * FROM slots WHERE id = {} LIMIT 10", b))
        );
    }

    #[test]
    fn prop_active_connections_never_negative(events in prop::collection::vec(any::<bool>(), 0..64)) {
        let monitor = PerformanceMonitor::new(Duration::from_millis(100), ManualClock::starting_now());
        let mut expected: u64 = 0;
        for connect in events {
            if connect {
                monitor.record_connection_event(ConnectionEvent::Connect);
                expected += 1;
            } else {
                monitor.record_connection_event(ConnectionEvent::Disconnect);
                expected = expected.saturating_sub(1);
            }
        }
        prop_assert_eq!(monitor.get_performance_summary().connection_stats.active_connections, expected);
    }
}
