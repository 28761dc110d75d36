use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use slotguard_common::SharedClock;

/// How long an identifier stays blocked once it trips the escalation rule.
pub const ESCALATION_BLOCK_MINUTES: i64 = 60;

/// Multiple of the quota at which a limited identifier is also blocked.
pub const ESCALATION_FACTOR: u64 = 2;

/// Timestamps of accepted requests for one identifier.
struct RequestLog {
    timestamps: VecDeque<DateTime<Utc>>,
    /// Window used by the most recent check; drives [`SlidingWindowLimiter::cleanup`].
    window: Duration,
}

impl RequestLog {
    fn new(window: Duration) -> Self {
        Self {
            timestamps: VecDeque::new(),
            window,
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let window_start = now - self.window;
        self.timestamps.retain(|t| *t > window_start);
    }
}

/// A sliding log rate limiter with an escalation block list.
///
/// Unlike a counter approximation, every accepted request timestamp is kept
/// until it falls out of the trailing window, so the count is exact. Entries
/// are pruned lazily when their identifier is next checked.
pub struct SlidingWindowLimiter {
    requests: DashMap<String, RequestLog>,
    blocked: DashMap<String, DateTime<Utc>>,
    clock: SharedClock,
}

impl SlidingWindowLimiter {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            requests: DashMap::new(),
            blocked: DashMap::new(),
            clock,
        }
    }

    /// Returns `true` if `identifier` already has `max_requests` accepted
    /// requests inside the trailing `window_minutes`.
    ///
    /// A rejected request is not recorded. An accepted one is appended to the
    /// identifier's log. If the pruned count has reached twice the quota the
    /// identifier is additionally blocked for an hour.
    pub fn is_rate_limited(&self, identifier: &str, max_requests: u32, window_minutes: u32) -> bool {
        let now = self.clock.now();
        let window = Duration::minutes(i64::from(window_minutes));

        let mut entry = self
            .requests
            .entry(identifier.to_string())
            .or_insert_with(|| RequestLog::new(window));

        let log = entry.value_mut();
        log.window = window;
        log.prune(now);

        let current = log.timestamps.len() as u64;
        let limit = u64::from(max_requests);

        if current < limit {
            log.timestamps.push_back(now);
            return false;
        }

        // Release the shard lock before touching the block list.
        drop(entry);

        if current >= limit * ESCALATION_FACTOR {
            let until = now + Duration::minutes(ESCALATION_BLOCK_MINUTES);
            self.blocked.insert(identifier.to_string(), until);
            tracing::warn!(
                target: "security",
                identifier,
                requests = current,
                max_requests,
                blocked_until = %until,
                "identifier blocked after sustained abuse"
            );
        } else {
            tracing::debug!(identifier, requests = current, max_requests, "request rate limited");
        }

        true
    }

    /// Returns `true` while `identifier` is on the block list.
    ///
    /// An expired block is removed as a side effect.
    pub fn is_blocked(&self, identifier: &str) -> bool {
        let now = self.clock.now();

        match self.blocked.get(identifier).map(|expiry| *expiry.value()) {
            Some(expiry) if now < expiry => true,
            Some(_) => {
                self.blocked.remove_if(identifier, |_, expiry| now >= *expiry);
                false
            }
            None => false,
        }
    }

    /// Drop expired blocks and request logs with no timestamps left in their window.
    pub fn cleanup(&self) {
        let now = self.clock.now();

        self.blocked.retain(|_, expiry| now < *expiry);
        self.requests.retain(|_, log| {
            log.prune(now);
            !log.timestamps.is_empty()
        });

        tracing::debug!(
            tracked = self.requests.len(),
            blocked = self.blocked.len(),
            "sliding window cleanup complete"
        );
    }

    pub fn tracked_identifiers(&self) -> usize {
        self.requests.len()
    }
}
