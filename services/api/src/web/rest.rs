//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, the response shapes
//! shared by several handler groups, and the service-level endpoints
//! (`/health`, `/api/config`).

use crate::web::{error::HttpError, extract::Json, generation, state::AppState, storage};
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use vocab_core::domain::{ContentClass, ImageOutput, ImagePayload, JsonObject, SpeechOutput};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        config_handler,
        generation::search_word_handler,
        generation::encyclopedia_handler,
        generation::concept_tree_handler,
        generation::episode_handler,
        generation::examples_handler,
        generation::scenario_handler,
        generation::quiz_handler,
        generation::word_image_handler,
        generation::illustration_handler,
        generation::episode_image_handler,
        generation::generate_image_handler,
        generation::speak_handler,
        generation::pronounce_handler,
        generation::sentence_handler,
        generation::tts_config_handler,
        storage::save_word_handler,
        storage::saved_words_handler,
        storage::mark_learned_handler,
        storage::delete_word_handler,
        storage::save_example_handler,
        storage::saved_examples_handler,
        storage::record_search_handler,
        storage::search_history_handler,
    ),
    components(
        schemas(
            HealthResponse, ProvidersResponse, ClientConfigResponse, GeneratedContent,
            ImageResponse, SpeechResponse, SuccessResponse, ErrorResponse,
        )
    ),
    tags(
        (name = "Vocabulary API", description = "AI-generated word content, images, speech and saved-word storage.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Response Structs
//=========================================================================================

/// A model-generated JSON document; its fields depend on the template.
#[derive(Serialize, ToSchema)]
#[schema(value_type = Object)]
pub struct GeneratedContent(pub JsonObject);

/// An image result. For inline payloads `url` is a `data:` URL.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub url: String,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl From<ImageOutput> for ImageResponse {
    fn from(output: ImageOutput) -> Self {
        match output.payload {
            ImagePayload::Url(url) => Self {
                url,
                provider: output.provider,
                revised_prompt: output.revised_prompt,
                base64: None,
                content_type: None,
            },
            ImagePayload::Inline {
                base64,
                content_type,
            } => Self {
                url: format!("data:{};base64,{}", content_type, base64),
                provider: output.provider,
                revised_prompt: output.revised_prompt,
                base64: Some(base64),
                content_type: Some(content_type),
            },
        }
    }
}

/// Either synthesized audio, or the text for the browser to speak itself.
#[derive(Serialize, ToSchema)]
#[serde(untagged)]
pub enum SpeechResponse {
    Audio {
        provider: String,
        /// Base64-encoded audio.
        audio: String,
        #[serde(rename = "contentType")]
        content_type: String,
    },
    Deferred { provider: String, text: String },
}

impl From<SpeechOutput> for SpeechResponse {
    fn from(output: SpeechOutput) -> Self {
        match output {
            SpeechOutput::Audio {
                provider,
                audio_base64,
                content_type,
            } => SpeechResponse::Audio {
                provider,
                audio: audio_base64,
                content_type,
            },
            SpeechOutput::Deferred { text } => SpeechResponse::Deferred {
                provider: "browser".to_string(),
                text,
            },
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// The body of every 4xx/5xx response.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Diagnostic detail, present only in development.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The trimmed value of a required field, or a 400 with `message`.
pub(crate) fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, HttpError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HttpError::bad_request(message))
}

//=========================================================================================
// Service Endpoints
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ProvidersResponse {
    pub text: String,
    pub image: String,
    pub tts: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub providers: ProvidersResponse,
}

/// Liveness probe that also reports the active provider per content class.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        providers: ProvidersResponse {
            text: state.gateway.provider_name(ContentClass::Text).to_string(),
            image: state.gateway.provider_name(ContentClass::Image).to_string(),
            tts: state.gateway.provider_name(ContentClass::Speech).to_string(),
        },
    })
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfigResponse {
    pub text_provider: String,
    pub image_provider: String,
    pub tts_provider: String,
}

/// Provider selection as the frontend needs it (e.g. to decide on browser speech).
#[utoipa::path(
    get,
    path = "/api/config",
    responses((status = 200, description = "Configured providers", body = ClientConfigResponse))
)]
pub async fn config_handler(State(state): State<Arc<AppState>>) -> Json<ClientConfigResponse> {
    Json(ClientConfigResponse {
        text_provider: state.config.text_provider.to_string(),
        image_provider: state.config.image_provider.to_string(),
        tts_provider: state.config.tts_provider.to_string(),
    })
}
