pub mod cache;
pub mod health;
pub mod metrics;
pub mod performance;
pub mod throttle;
