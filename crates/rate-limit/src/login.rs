use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use slotguard_common::SharedClock;

/// Failed attempts older than this are discarded when a new failure is recorded.
pub const ATTEMPT_RETENTION_MINUTES: i64 = 15;

/// Upper bound on any computed lockout.
pub const MAX_LOCKOUT_MINUTES: u64 = 60;

/// Outcome of a login throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoginThrottle {
    pub limited: bool,
    /// Failures still permitted before the identifier is limited.
    pub remaining: u32,
    pub lockout_until: Option<DateTime<Utc>>,
}

/// Lockout length after `excess` failures beyond the threshold:
/// `window * 2^excess`, capped at [`MAX_LOCKOUT_MINUTES`].
pub fn lockout_minutes(window_minutes: u32, excess: u32) -> u64 {
    let factor = 2u64.checked_pow(excess).unwrap_or(u64::MAX);
    u64::from(window_minutes)
        .saturating_mul(factor)
        .min(MAX_LOCKOUT_MINUTES)
}

/// Tracks failed login attempts per identifier (an IP or a `user:<name>` key).
pub struct LoginAttemptTracker {
    attempts: DashMap<String, VecDeque<DateTime<Utc>>>,
    clock: SharedClock,
}

impl LoginAttemptTracker {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            attempts: DashMap::new(),
            clock,
        }
    }

    /// A success wipes the identifier's history; a failure is appended and the
    /// history trimmed to the retention window.
    pub fn record(&self, identifier: &str, success: bool) {
        if success {
            if self.attempts.remove(identifier).is_some() {
                tracing::debug!(identifier, "login succeeded, failure history cleared");
            }
            return;
        }

        let now = self.clock.now();
        let cutoff = now - Duration::minutes(ATTEMPT_RETENTION_MINUTES);

        let mut entry = self.attempts.entry(identifier.to_string()).or_default();
        entry.push_back(now);
        entry.retain(|t| *t > cutoff);

        tracing::debug!(identifier, failures = entry.len(), "failed login recorded");
    }

    pub fn check(&self, identifier: &str, max_attempts: u32, window_minutes: u32) -> LoginThrottle {
        let now = self.clock.now();
        let window_start = now - Duration::minutes(i64::from(window_minutes));

        let Some(mut entry) = self.attempts.get_mut(identifier) else {
            return LoginThrottle {
                limited: false,
                remaining: max_attempts,
                lockout_until: None,
            };
        };

        entry.retain(|t| *t > window_start);
        let attempts = u32::try_from(entry.len()).unwrap_or(u32::MAX);
        drop(entry);

        if attempts >= max_attempts {
            let minutes = lockout_minutes(window_minutes, attempts - max_attempts);
            let lockout_until = now + Duration::minutes(minutes as i64);

            tracing::info!(
                target: "security",
                identifier,
                attempts,
                lockout_minutes = minutes,
                "login attempts throttled"
            );

            return LoginThrottle {
                limited: true,
                remaining: 0,
                lockout_until: Some(lockout_until),
            };
        }

        LoginThrottle {
            limited: false,
            remaining: max_attempts - attempts,
            lockout_until: None,
        }
    }

    /// Drop identifiers whose failures have all aged past the retention window.
    pub fn cleanup(&self) {
        let cutoff = self.clock.now() - Duration::minutes(ATTEMPT_RETENTION_MINUTES);
        self.attempts.retain(|_, attempts| {
            attempts.retain(|t| *t > cutoff);
            !attempts.is_empty()
        });

        tracing::debug!(remaining = self.attempts.len(), "login attempt cleanup complete");
    }
}
