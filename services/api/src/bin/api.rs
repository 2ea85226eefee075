//! services/api/src/bin/api.rs

use api_lib::{
    adapters::registry::{connect_storage, AdapterRegistry},
    config::Config,
    error::ApiError,
    web::{router, state::AppState},
};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Resolve Provider Adapters ---
    let registry = AdapterRegistry::from_config(&config);

    // --- 3. Connect Storage (Postgres, or in-memory without DATABASE_URL) ---
    let storage = connect_storage(&config).await?;
    info!(backend = storage.backend_name(), "Storage ready");

    // --- 4. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState::new(registry.gateway(), storage, config.clone()));
    let app = router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
