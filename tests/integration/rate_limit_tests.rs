use std::sync::Arc;

use chrono::Duration;
use slotguard_common::{Clock, ManualClock, RateLimitConfig};
use slotguard_rate_limit::{RateLimitPolicy, RateLimiter, Verdict};

fn limiter() -> (RateLimiter, Arc<ManualClock>) {
    let clock = ManualClock::starting_now();
    let limiter = RateLimiter::new(RateLimitPolicy::default(), clock.clone());
    (limiter, clock)
}

#[test]
fn test_fourth_request_in_window_is_limited() {
    let (limiter, _) = limiter();

    assert!(!limiter.is_rate_limited("10.0.0.1", 3, 1));
    assert!(!limiter.is_rate_limited("10.0.0.1", 3, 1));
    assert!(!limiter.is_rate_limited("10.0.0.1", 3, 1));
    assert!(limiter.is_rate_limited("10.0.0.1", 3, 1));
}

#[test]
fn test_window_slides() {
    let (limiter, clock) = limiter();

    assert!(!limiter.is_rate_limited("client", 2, 1));
    clock.advance(Duration::seconds(30));
    assert!(!limiter.is_rate_limited("client", 2, 1));
    assert!(limiter.is_rate_limited("client", 2, 1));

    // The first request falls out of the window; the second is still inside.
    clock.advance(Duration::seconds(31));
    assert!(!limiter.is_rate_limited("client", 2, 1));
    assert!(limiter.is_rate_limited("client", 2, 1));
}

#[test]
fn test_identifiers_are_independent() {
    let (limiter, _) = limiter();

    assert!(!limiter.is_rate_limited("client-a", 1, 1));
    assert!(limiter.is_rate_limited("client-a", 1, 1));
    assert!(!limiter.is_rate_limited("client-b", 1, 1));
}

#[test]
fn test_escalation_when_quota_tightens() {
    let (limiter, clock) = limiter();

    for _ in 0..4 {
        assert!(!limiter.is_rate_limited("scraper", 10, 5));
    }
    // Four recorded requests against a quota of two is twice the limit.
    assert!(limiter.is_rate_limited("scraper", 2, 5));
    assert!(limiter.is_blocked("scraper"));
    assert_eq!(limiter.check_request("scraper"), Verdict::Blocked);

    clock.advance(Duration::minutes(61));
    assert!(!limiter.is_blocked("scraper"));
}

#[test]
fn test_check_request_uses_configured_quota() {
    let clock = ManualClock::starting_now();
    let config = RateLimitConfig {
        max_requests: 2,
        ..RateLimitConfig::default()
    };
    let limiter = RateLimiter::from_config(&config, clock);

    assert_eq!(limiter.check_request("api"), Verdict::Allow);
    assert_eq!(limiter.check_request("api"), Verdict::Allow);
    assert_eq!(limiter.check_request("api"), Verdict::RateLimited);
}

#[test]
fn test_login_lockout_and_reset() {
    let (limiter, clock) = limiter();

    for _ in 0..3 {
        limiter.record_login_attempt("alice", false);
    }
    let throttle = limiter.is_login_rate_limited("alice", 3, 15);
    assert!(throttle.limited);
    assert_eq!(throttle.remaining, 0);
    assert!(throttle.lockout_until.is_some_and(|until| until > clock.now()));

    limiter.record_login_attempt("alice", true);
    let throttle = limiter.is_login_rate_limited("alice", 3, 15);
    assert!(!throttle.limited);
    assert_eq!(throttle.remaining, 3);
    assert!(throttle.lockout_until.is_none());
}

#[test]
fn test_login_lockout_grows_with_excess_failures() {
    let (limiter, clock) = limiter();

    for _ in 0..5 {
        limiter.record_login_attempt("bob", false);
    }
    let throttle = limiter.is_login_rate_limited("bob", 3, 5);
    // Two failures past the threshold: 5 * 2^2 = 20 minutes.
    assert_eq!(throttle.lockout_until, Some(clock.now() + Duration::minutes(20)));
}

#[test]
fn test_account_lock_expires() {
    let (limiter, clock) = limiter();

    let unlock_at = limiter.lock_account("carol", Some(5));
    assert_eq!(limiter.is_account_locked("carol"), (true, Some(unlock_at)));

    clock.advance(Duration::minutes(5));
    assert_eq!(limiter.is_account_locked("carol"), (false, None));
}

#[test]
fn test_cleanup_sweeps_expired_state() {
    let (limiter, clock) = limiter();

    limiter.is_rate_limited("stale", 5, 1);
    limiter.lock_account("stale", Some(1));
    limiter.record_login_attempt("stale", false);

    clock.advance(Duration::minutes(20));
    limiter.cleanup();

    assert!(!limiter.is_blocked("stale"));
    assert_eq!(limiter.is_account_locked("stale"), (false, None));
    assert_eq!(limiter.login_status("stale").remaining, 3);
}

#[test]
fn test_concurrent_requests_respect_quota() {
    let (limiter, _) = limiter();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let limiter = limiter.clone();
            std::thread::spawn(move || {
                (0..25)
                    .filter(|_| !limiter.is_rate_limited("shared", 50, 10))
                    .count()
            })
        })
        .collect();

    let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(allowed, 50);
}
