//! services/api/src/web/mod.rs
//!
//! The HTTP surface: handler groups, error mapping, rate limiting and the
//! router that ties them to the shared `AppState`.

pub mod error;
pub mod extract;
pub mod generation;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use self::{error::HttpError, rest::ApiDoc, state::AppState};

/// Request bodies carry saved-word documents, which can be large.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Builds the complete application: `/api` routes behind the rate limiter,
/// `/health`, Swagger UI, and a JSON 404 for everything else.
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/config", get(rest::config_handler))
        // Word content
        .route("/word/search", get(generation::search_word_handler))
        .route("/word/encyclopedia", get(generation::encyclopedia_handler))
        .route("/word/concept-tree", get(generation::concept_tree_handler))
        .route("/word/episode", get(generation::episode_handler))
        .route("/word/examples", get(generation::examples_handler))
        .route("/word/scenario", get(generation::scenario_handler))
        .route("/word/quiz", post(generation::quiz_handler))
        // Saved words
        .route("/word/save", post(storage::save_word_handler))
        .route("/word/saved", get(storage::saved_words_handler))
        .route("/word/learned", patch(storage::mark_learned_handler))
        .route("/word/{word}", delete(storage::delete_word_handler))
        // Images
        .route("/image/word", post(generation::word_image_handler))
        .route("/image/illustration", post(generation::illustration_handler))
        .route("/image/episode", post(generation::episode_image_handler))
        .route("/image/generate", post(generation::generate_image_handler))
        // Speech
        .route("/tts/speak", post(generation::speak_handler))
        .route("/tts/word/{word}", get(generation::pronounce_handler))
        .route("/tts/sentence", post(generation::sentence_handler))
        .route("/tts/config", get(generation::tts_config_handler))
        // Examples and history
        .route("/storage/example", post(storage::save_example_handler))
        .route("/storage/examples", get(storage::saved_examples_handler))
        .route(
            "/storage/history",
            post(storage::record_search_handler).get(storage::search_history_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ));

    let cors = cors_layer(state.config.cors_allowed_origin.as_deref());

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(rest::health_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn not_found() -> HttpError {
    HttpError::NotFound
}

fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allowed_origin.map(str::parse::<HeaderValue>) {
        Some(Ok(origin)) => {
            info!(?origin, "CORS restricted to one origin");
            layer.allow_origin(origin)
        }
        Some(Err(_)) => {
            warn!("CORS_ALLOWED_ORIGIN is not a valid header value; allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}
