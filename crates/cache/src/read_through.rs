//! Read-through helpers over [`QueryCache`].

use std::time::Duration;

use crate::store::QueryCache;

/// Receives hit/miss notifications from read-through lookups.
///
/// Implementations must not fail the lookup; the performance monitor
/// implements this and swallows its own errors.
pub trait CacheObserver: Send + Sync {
    fn on_hit(&self, key: &str);
    fn on_miss(&self, key: &str);
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CacheObserver for NoopObserver {
    fn on_hit(&self, _key: &str) {}
    fn on_miss(&self, _key: &str) {}
}

/// Return the cached value for `key`, or compute, store and return it.
pub fn cached_query<V, F>(
    cache: &QueryCache<V>,
    observer: &dyn CacheObserver,
    key: &str,
    ttl: Option<Duration>,
    compute: F,
) -> V
where
    V: Clone,
    F: FnOnce() -> V,
{
    if let Some(value) = cache.get(key) {
        observer.on_hit(key);
        return value;
    }

    observer.on_miss(key);
    let value = compute();
    cache.set(key, value.clone(), ttl);
    value
}

/// Like [`cached_query`] for fallible computations. Errors are returned to
/// the caller and never cached.
pub fn try_cached_query<V, E, F>(
    cache: &QueryCache<V>,
    observer: &dyn CacheObserver,
    key: &str,
    ttl: Option<Duration>,
    compute: F,
) -> Result<V, E>
where
    V: Clone,
    F: FnOnce() -> Result<V, E>,
{
    if let Some(value) = cache.get(key) {
        observer.on_hit(key);
        return Ok(value);
    }

    observer.on_miss(key);
    let value = compute()?;
    cache.set(key, value.clone(), ttl);
    Ok(value)
}
