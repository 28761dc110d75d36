//! Cache key naming for the scheduler's cached reads.
//!
//! Segments are joined with `:` so that per-user prefixes such as
//! `user_comments:1:` never match another user's keys (`user_comments:12:`).

use chrono::NaiveDate;

pub const USER_STATS: &str = "user_stats";
pub const ACTIVE_USERS_COUNT: &str = "active_users_count";
pub const CONTENT_STATS: &str = "content_stats";

pub const USER_PREFIX: &str = "user_";
pub const USER_AVAILABILITY_PREFIX: &str = "user_availability:";
pub const USER_COMMENTS_PREFIX: &str = "user_comments:";
pub const AVAILABILITY_RANGE_PREFIX: &str = "availability_range:";
pub const DAILY_AVAILABILITY_PREFIX: &str = "daily_availability:";
pub const RECENT_COMMENTS_PREFIX: &str = "recent_comments:";
pub const RECENT_ADMIN_ACTIONS_PREFIX: &str = "recent_admin_actions:";
pub const ADMIN_ACTIONS_SUMMARY_PREFIX: &str = "admin_actions_summary:";
pub const USERS_PAGINATED_PREFIX: &str = "users_paginated:";

pub fn user_availability(user_id: i64, limit: u32) -> String {
    format!("{}{}:{}", USER_AVAILABILITY_PREFIX, user_id, limit)
}

/// Prefix covering every cached availability page of one user.
pub fn user_availability_scope(user_id: i64) -> String {
    format!("{}{}:", USER_AVAILABILITY_PREFIX, user_id)
}

pub fn user_comments(user_id: i64, limit: u32) -> String {
    format!("{}{}:{}", USER_COMMENTS_PREFIX, user_id, limit)
}

pub fn user_comments_scope(user_id: i64) -> String {
    format!("{}{}:", USER_COMMENTS_PREFIX, user_id)
}

pub fn availability_range(start: NaiveDate, end: NaiveDate) -> String {
    format!("{}{}:{}", AVAILABILITY_RANGE_PREFIX, start, end)
}

pub fn daily_availability(date: NaiveDate) -> String {
    format!("{}{}", DAILY_AVAILABILITY_PREFIX, date)
}

pub fn recent_comments(limit: u32) -> String {
    format!("{}{}", RECENT_COMMENTS_PREFIX, limit)
}

pub fn recent_admin_actions(limit: u32) -> String {
    format!("{}{}", RECENT_ADMIN_ACTIONS_PREFIX, limit)
}

pub fn admin_actions_summary(hours: u32) -> String {
    format!("{}{}", ADMIN_ACTIONS_SUMMARY_PREFIX, hours)
}

pub fn users_paginated(page: u32, per_page: u32) -> String {
    format!("{}{}:{}", USERS_PAGINATED_PREFIX, page, per_page)
}
