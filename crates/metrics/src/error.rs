use thiserror::Error;

/// Internal telemetry failures. These never reach the caller of a recording
/// method; they are logged and dropped.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),

    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
