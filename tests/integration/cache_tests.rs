use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use slotguard_cache::{
    cached_query, keys, CachePattern, InvalidationDispatcher, InvalidationEvent, QueryCache,
};
use slotguard_common::ManualClock;
use slotguard_metrics::PerformanceMonitor;

fn cache(max_size: usize) -> (Arc<QueryCache<String>>, Arc<ManualClock>) {
    let clock = ManualClock::starting_now();
    let cache = Arc::new(QueryCache::new(max_size, Duration::from_secs(300), clock.clone()));
    (cache, clock)
}

#[test]
fn test_entry_expires_after_ttl() {
    let (cache, clock) = cache(10);

    cache.set("k", "v".to_string(), Some(Duration::from_secs(1)));
    assert_eq!(cache.get("k").as_deref(), Some("v"));

    clock.advance(chrono::Duration::milliseconds(1100));
    assert!(cache.get("k").is_none());
}

#[test]
fn test_capacity_is_enforced() {
    let (cache, _) = cache(4);

    for i in 0..5 {
        cache.set(format!("key:{}", i), i.to_string(), None);
    }
    assert!(cache.len() <= 4);
    assert_eq!(cache.get("key:4").as_deref(), Some("4"));
}

#[test]
fn test_dispatcher_scopes_user_events() {
    let (cache, _) = cache(100);
    let dispatcher = InvalidationDispatcher::new(Arc::clone(&cache));

    cache.set(keys::user_availability(7, 30), "a".into(), None);
    cache.set(keys::user_comments(7, 50), "c".into(), None);
    cache.set(keys::user_comments(70, 50), "other".into(), None);
    cache.set(keys::USER_STATS, "stats".into(), None);

    let removed = dispatcher.user_changed(Some(7));
    assert_eq!(removed, 2);
    assert!(cache.get(&keys::user_comments(70, 50)).is_some());
    assert!(cache.get(keys::USER_STATS).is_some());
}

#[test]
fn test_availability_change_drops_every_day_and_user() {
    let (cache, _) = cache(100);
    let dispatcher = InvalidationDispatcher::new(Arc::clone(&cache));
    let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    let other_day = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();

    cache.set(keys::daily_availability(day), "d".into(), None);
    cache.set(keys::daily_availability(other_day), "d2".into(), None);
    cache.set(keys::availability_range(day, other_day), "r".into(), None);
    cache.set(keys::CONTENT_STATS, "s".into(), None);

    cache.set(keys::user_availability(2, 50), "u".into(), None);
    cache.set(keys::recent_comments(20), "c".into(), None);

    dispatcher.availability_changed(Some(1), Some(day));

    assert!(cache.get(&keys::daily_availability(day)).is_none());
    assert!(cache.get(&keys::daily_availability(other_day)).is_none());
    assert!(cache.get(&keys::availability_range(day, other_day)).is_none());
    assert!(cache.get(&keys::user_availability(2, 50)).is_none());
    assert!(cache.get(keys::CONTENT_STATS).is_none());
    assert!(cache.get(&keys::recent_comments(20)).is_some());
}

#[test]
fn test_dispatch_all_and_admin_events() {
    let (cache, _) = cache(100);
    let dispatcher = InvalidationDispatcher::new(Arc::clone(&cache));

    cache.set(keys::recent_admin_actions(20), "a".into(), None);
    cache.set(keys::users_paginated(1, 20), "p".into(), None);
    cache.set(keys::ACTIVE_USERS_COUNT, "3".into(), None);

    assert_eq!(dispatcher.dispatch(&InvalidationEvent::AdminDataChanged), 2);
    assert_eq!(dispatcher.dispatch(&InvalidationEvent::All), 1);
    assert!(cache.is_empty());
}

#[test]
fn test_regex_pattern_for_adhoc_purges() {
    let (cache, _) = cache(100);
    cache.set("daily_availability:2024-06-03", "x".into(), None);
    cache.set("daily_availability:2024-07-01", "y".into(), None);

    let pattern = CachePattern::Regex(regex::Regex::new(r"^daily_availability:2024-06-").unwrap());
    assert_eq!(cache.invalidate(Some(&pattern)), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_read_through_reports_to_monitor() {
    let (cache, _) = cache(100);
    let monitor = PerformanceMonitor::new(Duration::from_millis(100), ManualClock::starting_now());
    let mut computed = 0;

    for _ in 0..3 {
        let value = cached_query(&cache, &monitor, keys::USER_STATS, None, || {
            computed += 1;
            "fresh".to_string()
        });
        assert_eq!(value, "fresh");
    }

    assert_eq!(computed, 1);
    let counters = monitor.get_performance_summary().cache_stats;
    assert_eq!(counters.hits, 2);
    assert_eq!(counters.misses, 1);
}
