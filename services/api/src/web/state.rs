//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::{error::HttpError, middleware::RateLimiter};
use std::sync::Arc;
use vocab_core::{
    gateway::ContentGateway,
    ports::{PortError, StorageService},
};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: ContentGateway,
    pub storage: Arc<dyn StorageService>,
    pub config: Arc<Config>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(
        gateway: ContentGateway,
        storage: Arc<dyn StorageService>,
        config: Arc<Config>,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::per_minute(config.rate_limit_max));
        Self {
            gateway,
            storage,
            config,
            rate_limiter,
        }
    }

    /// Maps a port failure to its HTTP form; `public` is the message shown for 500s.
    pub fn fail(&self, public: &'static str, err: PortError) -> HttpError {
        HttpError::from_port(err, public, self.config.development)
    }
}
