pub mod clock;
pub mod config;
pub mod error;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{AdminConfig, AppConfig, CacheConfig, MetricsConfig, RateLimitConfig};
pub use error::{GuardError, GuardResult};
