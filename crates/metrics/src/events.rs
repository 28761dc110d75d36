use serde::{Deserialize, Serialize};

/// Connection pool lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectionEvent {
    Connect,
    Disconnect,
    Error,
    /// Snapshot of the pool's configuration reported by the driver.
    PoolInfo { pool_size: u32, pool_overflow: i64 },
}

impl ConnectionEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Error => "error",
            Self::PoolInfo { .. } => "pool_info",
        }
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheEvent {
    Hit,
    Miss,
}

impl CacheEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
        }
    }
}
