//! services/api/src/error.rs
//!
//! Startup and wiring failures of the gateway binary. Request-time failures are
//! mapped to HTTP responses in `web::error` instead.

use crate::config::ConfigError;

/// Everything that can stop the gateway from starting or keep it from serving.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or unparsable environment settings, including unknown provider names.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The Postgres pool could not be opened.
    #[error("Storage connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// The vocabulary tables could not be created or upgraded.
    #[error("Storage migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Binding the listener or serving connections failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
