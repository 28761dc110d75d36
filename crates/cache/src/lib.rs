//! Query result caching for the scheduler.
//!
//! - [`QueryCache`] is a bounded, TTL-aware key/value store guarded by a
//!   single mutex.
//! - [`keys`] names the cached reads; [`InvalidationDispatcher`] maps domain
//!   events onto those names so writers only say *what* changed.
//! - [`cached_query`] wraps the get/compute/set dance and reports hits and
//!   misses to a [`CacheObserver`].

pub mod invalidation;
pub mod keys;
pub mod pattern;
pub mod read_through;
pub mod store;

pub use invalidation::{InvalidationDispatcher, InvalidationEvent};
pub use pattern::CachePattern;
pub use read_through::{cached_query, try_cached_query, CacheObserver, NoopObserver};
pub use store::{CacheStats, QueryCache};
