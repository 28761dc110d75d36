//! Request throttling for the scheduler.
//!
//! This crate answers three questions behind a single [`RateLimiter`] facade:
//!
//! - **Is this identifier sending too many requests?** A sliding log keeps the
//!   timestamp of every accepted request inside a trailing window. Identifiers
//!   that keep hammering at twice their quota are put on a one-hour block list.
//!
//! - **Is this login source failing too often?** Failed attempts are kept for
//!   fifteen minutes; past the threshold the lockout grows exponentially from
//!   the window length up to an hour. A successful login wipes the history.
//!
//! - **Is this account locked?** Explicit, expiring locks placed by policy or
//!   an administrator, independent of the login throttle.
//!
//! All state lives in [`DashMap`](dashmap::DashMap)s and expires passively:
//! stale entries are removed when their identifier is next looked at. An
//! optional sweep thread can be started with
//! [`start_cleanup_task`](RateLimiter::start_cleanup_task).

pub mod account_lock;
pub mod login;
pub mod sliding_window;

use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use slotguard_common::{RateLimitConfig, SharedClock};

pub use account_lock::AccountLocks;
pub use login::{LoginAttemptTracker, LoginThrottle};
pub use sliding_window::SlidingWindowLimiter;

/// Default quotas applied by the convenience methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window_minutes: u32,
    pub login_max_attempts: u32,
    pub login_window_minutes: u32,
    pub account_lock_minutes: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::from(&RateLimitConfig::default())
    }
}

impl From<&RateLimitConfig> for RateLimitPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window_minutes: config.window_minutes,
            login_max_attempts: config.login_max_attempts,
            login_window_minutes: config.login_window_minutes,
            account_lock_minutes: config.account_lock_minutes,
        }
    }
}

/// Decision for an incoming request under the default quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allow,
    /// The identifier is on the escalation block list.
    Blocked,
    /// The identifier exhausted its quota for the current window.
    RateLimited,
}

/// The process-wide rate limiter.
///
/// Cheaply cloneable (backed by `Arc`); every clone shares the same maps.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<RateLimiterInner>,
}

struct RateLimiterInner {
    requests: SlidingWindowLimiter,
    logins: LoginAttemptTracker,
    locks: AccountLocks,
    policy: RateLimitPolicy,
}

impl RateLimiterInner {
    fn cleanup(&self) {
        self.requests.cleanup();
        self.logins.cleanup();
        self.locks.cleanup();
    }
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy, clock: SharedClock) -> Self {
        tracing::info!(
            max_requests = policy.max_requests,
            window_minutes = policy.window_minutes,
            login_max_attempts = policy.login_max_attempts,
            "creating rate limiter"
        );
        Self {
            inner: Arc::new(RateLimiterInner {
                requests: SlidingWindowLimiter::new(Arc::clone(&clock)),
                logins: LoginAttemptTracker::new(Arc::clone(&clock)),
                locks: AccountLocks::new(clock),
                policy,
            }),
        }
    }

    pub fn from_config(config: &RateLimitConfig, clock: SharedClock) -> Self {
        Self::new(RateLimitPolicy::from(config), clock)
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.inner.policy
    }

    /// See [`SlidingWindowLimiter::is_rate_limited`].
    pub fn is_rate_limited(&self, identifier: &str, max_requests: u32, window_minutes: u32) -> bool {
        self.inner
            .requests
            .is_rate_limited(identifier, max_requests, window_minutes)
    }

    pub fn is_blocked(&self, identifier: &str) -> bool {
        self.inner.requests.is_blocked(identifier)
    }

    /// Check the block list, then the default request quota.
    pub fn check_request(&self, identifier: &str) -> Verdict {
        if self.is_blocked(identifier) {
            return Verdict::Blocked;
        }
        let policy = self.inner.policy;
        if self.is_rate_limited(identifier, policy.max_requests, policy.window_minutes) {
            return Verdict::RateLimited;
        }
        Verdict::Allow
    }

    pub fn record_login_attempt(&self, identifier: &str, success: bool) {
        self.inner.logins.record(identifier, success);
    }

    pub fn is_login_rate_limited(
        &self,
        identifier: &str,
        max_attempts: u32,
        window_minutes: u32,
    ) -> LoginThrottle {
        self.inner.logins.check(identifier, max_attempts, window_minutes)
    }

    /// Login throttle status under the configured attempt limit and window.
    pub fn login_status(&self, identifier: &str) -> LoginThrottle {
        let policy = self.inner.policy;
        self.is_login_rate_limited(identifier, policy.login_max_attempts, policy.login_window_minutes)
    }

    /// Lock an account. `None` uses the configured lock duration.
    pub fn lock_account(&self, identifier: &str, duration_minutes: Option<u32>) -> DateTime<Utc> {
        let minutes = duration_minutes.unwrap_or(self.inner.policy.account_lock_minutes);
        self.inner.locks.lock(identifier, minutes)
    }

    pub fn is_account_locked(&self, identifier: &str) -> (bool, Option<DateTime<Utc>>) {
        self.inner.locks.is_locked(identifier)
    }

    /// Sweep every map once, removing expired state.
    pub fn cleanup(&self) {
        self.inner.cleanup();
    }

    /// Spawn a background thread that sweeps expired state every `interval`.
    ///
    /// The thread only holds a weak reference and exits once every clone of
    /// this limiter has been dropped.
    pub fn start_cleanup_task(&self, interval: Duration) -> std::io::Result<JoinHandle<()>> {
        let inner: Weak<RateLimiterInner> = Arc::downgrade(&self.inner);

        std::thread::Builder::new()
            .name("rate-limit-cleanup".into())
            .spawn(move || loop {
                std::thread::sleep(interval);

                let Some(inner) = inner.upgrade() else {
                    tracing::debug!("rate limiter dropped, stopping cleanup thread");
                    break;
                };
                inner.cleanup();

                tracing::trace!("rate limiter cleanup tick completed");
            })
    }
}
