//! Error types for the device monitor

/// Errors that can occur in the device monitor
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid device id '{0}'")]
    InvalidDevice(String),

    #[error("Notification not found: {0}")]
    NotificationNotFound(String),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("Dashboard error: {0}")]
    Dashboard(String),
}

/// Result type alias for device monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;
