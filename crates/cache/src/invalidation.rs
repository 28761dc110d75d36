use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::keys;
use crate::pattern::CachePattern;
use crate::store::QueryCache;

/// Coarse domain events that make cached reads stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidationEvent {
    UserChanged {
        #[serde(default)]
        user_id: Option<i64>,
    },
    /// The purge covers every user and day; the fields travel with the
    /// event for logging.
    AvailabilityChanged {
        #[serde(default)]
        user_id: Option<i64>,
        #[serde(default)]
        date: Option<NaiveDate>,
    },
    CommentChanged {
        #[serde(default)]
        user_id: Option<i64>,
    },
    AdminDataChanged,
    All,
}

impl InvalidationEvent {
    /// The cache patterns this event purges. `None` means "everything".
    pub fn patterns(&self) -> Option<Vec<CachePattern>> {
        let patterns = match self {
            Self::UserChanged { user_id: Some(id) } => vec![
                CachePattern::prefix(keys::user_availability_scope(*id)),
                CachePattern::prefix(keys::user_comments_scope(*id)),
            ],
            Self::UserChanged { user_id: None } => vec![
                CachePattern::prefix(keys::USER_PREFIX),
                CachePattern::exact(keys::ACTIVE_USERS_COUNT),
            ],
            // An edit can move a slot between users or days and only the new
            // side is reported, so the whole availability family goes.
            Self::AvailabilityChanged { .. } => vec![
                CachePattern::prefix(keys::AVAILABILITY_RANGE_PREFIX),
                CachePattern::prefix(keys::USER_AVAILABILITY_PREFIX),
                CachePattern::prefix(keys::DAILY_AVAILABILITY_PREFIX),
                CachePattern::exact(keys::CONTENT_STATS),
            ],
            Self::CommentChanged { user_id } => vec![
                CachePattern::prefix(keys::RECENT_COMMENTS_PREFIX),
                CachePattern::exact(keys::CONTENT_STATS),
                match user_id {
                    Some(id) => CachePattern::prefix(keys::user_comments_scope(*id)),
                    None => CachePattern::prefix(keys::USER_COMMENTS_PREFIX),
                },
            ],
            Self::AdminDataChanged => vec![
                CachePattern::prefix(keys::RECENT_ADMIN_ACTIONS_PREFIX),
                CachePattern::prefix(keys::ADMIN_ACTIONS_SUMMARY_PREFIX),
                CachePattern::prefix(keys::USERS_PAGINATED_PREFIX),
            ],
            Self::All => return None,
        };
        Some(patterns)
    }
}

/// Translates domain events into cache purges so writers never need to know
/// the cache's key naming.
pub struct InvalidationDispatcher<V> {
    cache: Arc<QueryCache<V>>,
}

impl<V: Clone> InvalidationDispatcher<V> {
    pub fn new(cache: Arc<QueryCache<V>>) -> Self {
        Self { cache }
    }

    /// Purge everything `event` makes stale. Returns the number of entries removed.
    pub fn dispatch(&self, event: &InvalidationEvent) -> usize {
        let removed = match event.patterns() {
            None => self.cache.invalidate(None),
            Some(patterns) => patterns
                .iter()
                .map(|pattern| self.cache.invalidate(Some(pattern)))
                .sum(),
        };

        tracing::info!(event = ?event, removed, "cache invalidated");
        removed
    }

    pub fn user_changed(&self, user_id: Option<i64>) -> usize {
        self.dispatch(&InvalidationEvent::UserChanged { user_id })
    }

    pub fn availability_changed(&self, user_id: Option<i64>, date: Option<NaiveDate>) -> usize {
        self.dispatch(&InvalidationEvent::AvailabilityChanged { user_id, date })
    }

    pub fn comment_changed(&self, user_id: Option<i64>) -> usize {
        self.dispatch(&InvalidationEvent::CommentChanged { user_id })
    }

    pub fn admin_data_changed(&self) -> usize {
        self.dispatch(&InvalidationEvent::AdminDataChanged)
    }

    pub fn invalidate_all(&self) -> usize {
        self.dispatch(&InvalidationEvent::All)
    }
}
