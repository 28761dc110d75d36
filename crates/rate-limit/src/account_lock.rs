use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use slotguard_common::SharedClock;

/// Explicit, expiring account locks.
///
/// Independent from login throttling: a lock placed here stays until its
/// expiry regardless of later successful logins.
pub struct AccountLocks {
    locks: DashMap<String, DateTime<Utc>>,
    clock: SharedClock,
}

impl AccountLocks {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            locks: DashMap::new(),
            clock,
        }
    }

    /// Lock `identifier` for `duration_minutes`, replacing any existing lock.
    /// Returns the unlock time.
    pub fn lock(&self, identifier: &str, duration_minutes: u32) -> DateTime<Utc> {
        let until = self.clock.now() + Duration::minutes(i64::from(duration_minutes));
        self.locks.insert(identifier.to_string(), until);

        tracing::info!(
            target: "security",
            identifier,
            duration_minutes,
            unlock_at = %until,
            "account locked"
        );

        until
    }

    /// Returns `(true, Some(unlock_at))` while locked and `(false, None)`
    /// otherwise. An expired lock is removed as a side effect.
    pub fn is_locked(&self, identifier: &str) -> (bool, Option<DateTime<Utc>>) {
        let now = self.clock.now();

        match self.locks.get(identifier).map(|until| *until.value()) {
            Some(until) if now < until => (true, Some(until)),
            Some(_) => {
                self.locks.remove_if(identifier, |_, until| now >= *until);
                tracing::debug!(identifier, "account lock expired");
                (false, None)
            }
            None => (false, None),
        }
    }

    pub fn cleanup(&self) {
        let now = self.clock.now();
        self.locks.retain(|_, until| now < *until);
    }
}
