//! Error types for storage and configuration.

/// Error type for persistent storage access.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed stored value for '{key}': {reason}")]
    Malformed { key: &'static str, reason: String },
    #[error("Backend unavailable: {0}")]
    Backend(String),
    #[error("Write queue closed")]
    QueueClosed,
}

/// Error type for engine configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The UI was opened outside the extension, so host storage is missing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{title}: {message}")]
pub struct HostEnvironmentError {
    pub title: &'static str,
    pub message: &'static str,
}
