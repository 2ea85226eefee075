//! services/api/src/web/generation.rs
//!
//! Axum handlers for the content-generation endpoints: word content
//! (`/api/word/*`), images (`/api/image/*`) and speech (`/api/tts/*`).
//! Each handler validates its required fields, calls one gateway method and
//! maps failures with a route-specific message.

use crate::web::{
    error::HttpError,
    extract::{Json, Path, Query},
    rest::{required, GeneratedContent, ImageResponse, SpeechResponse},
    state::AppState,
};
use axum::extract::State;
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use utoipa::{IntoParams, ToSchema};
use vocab_core::{
    domain::{ContentClass, ImageRequest, ImageSize, SpeechRequest, DEFAULT_SPEECH_SPEED},
    gateway::is_semantic_miss,
    prompts::DEFAULT_MEANING_TYPE,
};

const WORD_AND_MEANING_REQUIRED: &str = "단어와 의미가 필요합니다.";
const IMAGE_FAILED: &str = "이미지를 생성하는 중 오류가 발생했습니다.";
const SPEECH_FAILED: &str = "음성을 생성하는 중 오류가 발생했습니다.";

//=========================================================================================
// Request Payload Structs
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// The word to look up.
    pub q: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WordMeaningParams {
    pub word: Option<String>,
    /// The meaning the content should focus on.
    pub meaning: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ExamplesParams {
    pub word: Option<String>,
    pub meaning: Option<String>,
    /// Which meaning group the examples illustrate; defaults to `core`.
    pub meaning_type: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct QuizRequest {
    pub word: Option<String>,
    pub meanings: Option<Vec<String>>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WordImageRequest {
    pub word: Option<String>,
    pub meaning: Option<String>,
    /// Abstract meanings are drawn as diagrams instead of scenes.
    #[serde(default)]
    pub is_complex: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct IllustrationRequest {
    pub word: Option<String>,
    pub meaning: Option<String>,
    #[serde(default)]
    pub context: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeImageRequest {
    pub title: Option<String>,
    pub story_context: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateImageRequest {
    pub prompt: Option<String>,
    /// `"WxH"`, defaults to `1024x1024`.
    pub size: Option<String>,
    /// `vivid` (default) or `natural`.
    pub style: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SpeakRequest {
    pub text: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<f32>,
}

#[derive(Deserialize, ToSchema)]
pub struct SentenceRequest {
    pub sentence: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct VoiceResponse {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TtsConfigResponse {
    pub provider: String,
    pub available_voices: Vec<VoiceResponse>,
}

//=========================================================================================
// Word Content Handlers
//=========================================================================================

/// Look up a word: pronunciation, parts of speech and meanings.
#[utoipa::path(
    get,
    path = "/api/word/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Word information", body = GeneratedContent),
        (status = 400, description = "Missing search term", body = crate::web::rest::ErrorResponse),
        (status = 404, description = "Not an English word; the model's own explanation", body = GeneratedContent),
        (status = 500, description = "Generation failed", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn search_word_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<GeneratedContent>, HttpError> {
    let word = required(&params.q, "검색어를 입력해주세요.")?;
    let info = state
        .gateway
        .word_info(word)
        .await
        .map_err(|e| state.fail("단어 정보를 가져오는 중 오류가 발생했습니다.", e))?;

    if is_semantic_miss(&info) {
        return Err(HttpError::SemanticMiss(info));
    }
    Ok(Json(GeneratedContent(info)))
}

/// Encyclopedia-style explanation of one meaning.
#[utoipa::path(
    get,
    path = "/api/word/encyclopedia",
    params(WordMeaningParams),
    responses(
        (status = 200, description = "Encyclopedia entry", body = GeneratedContent),
        (status = 400, description = "Missing word or meaning", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn encyclopedia_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WordMeaningParams>,
) -> Result<Json<GeneratedContent>, HttpError> {
    let word = required(&params.word, WORD_AND_MEANING_REQUIRED)?;
    let meaning = required(&params.meaning, WORD_AND_MEANING_REQUIRED)?;
    let content = state
        .gateway
        .encyclopedia(word, meaning)
        .await
        .map_err(|e| state.fail("백과사전 정보를 생성하는 중 오류가 발생했습니다.", e))?;
    Ok(Json(GeneratedContent(content)))
}

/// Etymology and related-word tree for one meaning.
#[utoipa::path(
    get,
    path = "/api/word/concept-tree",
    params(WordMeaningParams),
    responses(
        (status = 200, description = "Concept tree", body = GeneratedContent),
        (status = 400, description = "Missing word or meaning", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn concept_tree_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WordMeaningParams>,
) -> Result<Json<GeneratedContent>, HttpError> {
    let word = required(&params.word, WORD_AND_MEANING_REQUIRED)?;
    let meaning = required(&params.meaning, WORD_AND_MEANING_REQUIRED)?;
    let content = state
        .gateway
        .concept_tree(word, meaning)
        .await
        .map_err(|e| state.fail("개념 트리를 생성하는 중 오류가 발생했습니다.", e))?;
    Ok(Json(GeneratedContent(content)))
}

/// A short memorable story built around one meaning.
#[utoipa::path(
    get,
    path = "/api/word/episode",
    params(WordMeaningParams),
    responses(
        (status = 200, description = "Episode", body = GeneratedContent),
        (status = 400, description = "Missing word or meaning", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn episode_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WordMeaningParams>,
) -> Result<Json<GeneratedContent>, HttpError> {
    let word = required(&params.word, WORD_AND_MEANING_REQUIRED)?;
    let meaning = required(&params.meaning, WORD_AND_MEANING_REQUIRED)?;
    let content = state
        .gateway
        .episode(word, meaning)
        .await
        .map_err(|e| state.fail("에피소드를 생성하는 중 오류가 발생했습니다.", e))?;
    Ok(Json(GeneratedContent(content)))
}

/// Example sentences for one meaning.
#[utoipa::path(
    get,
    path = "/api/word/examples",
    params(ExamplesParams),
    responses(
        (status = 200, description = "Example sentences", body = GeneratedContent),
        (status = 400, description = "Missing word or meaning", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn examples_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExamplesParams>,
) -> Result<Json<GeneratedContent>, HttpError> {
    let word = required(&params.word, WORD_AND_MEANING_REQUIRED)?;
    let meaning = required(&params.meaning, WORD_AND_MEANING_REQUIRED)?;
    let meaning_type = params
        .meaning_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_MEANING_TYPE);
    let content = state
        .gateway
        .examples(word, meaning_type, meaning)
        .await
        .map_err(|e| state.fail("예문을 생성하는 중 오류가 발생했습니다.", e))?;
    Ok(Json(GeneratedContent(content)))
}

/// Situational dialogues that use the word.
#[utoipa::path(
    get,
    path = "/api/word/scenario",
    params(WordMeaningParams),
    responses(
        (status = 200, description = "Dialogue scenarios", body = GeneratedContent),
        (status = 400, description = "Missing word or meaning", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn scenario_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WordMeaningParams>,
) -> Result<Json<GeneratedContent>, HttpError> {
    let word = required(&params.word, WORD_AND_MEANING_REQUIRED)?;
    let meaning = required(&params.meaning, WORD_AND_MEANING_REQUIRED)?;
    let content = state
        .gateway
        .scenario(word, meaning)
        .await
        .map_err(|e| state.fail("시나리오를 생성하는 중 오류가 발생했습니다.", e))?;
    Ok(Json(GeneratedContent(content)))
}

/// A five-question fill-in-the-blank quiz over the given meanings.
#[utoipa::path(
    post,
    path = "/api/word/quiz",
    request_body = QuizRequest,
    responses(
        (status = 200, description = "Quiz", body = GeneratedContent),
        (status = 400, description = "Missing word or meanings", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn quiz_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuizRequest>,
) -> Result<Json<GeneratedContent>, HttpError> {
    const MESSAGE: &str = "단어와 의미 목록이 필요합니다.";
    let word = required(&request.word, MESSAGE)?;
    let meanings = request
        .meanings
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| HttpError::bad_request(MESSAGE))?;
    let quiz = state
        .gateway
        .quiz(word, meanings)
        .await
        .map_err(|e| state.fail("퀴즈를 생성하는 중 오류가 발생했습니다.", e))?;
    Ok(Json(GeneratedContent(quiz)))
}

//=========================================================================================
// Image Handlers
//=========================================================================================

/// The key image for a word meaning.
#[utoipa::path(
    post,
    path = "/api/image/word",
    request_body = WordImageRequest,
    responses(
        (status = 200, description = "Generated image", body = ImageResponse),
        (status = 400, description = "Missing word or meaning", body = crate::web::rest::ErrorResponse),
        (status = 422, description = "Rejected by the provider's safety policy")
    )
)]
pub async fn word_image_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WordImageRequest>,
) -> Result<Json<ImageResponse>, HttpError> {
    let word = required(&request.word, WORD_AND_MEANING_REQUIRED)?;
    let meaning = required(&request.meaning, WORD_AND_MEANING_REQUIRED)?;
    let image = state
        .gateway
        .word_image(word, meaning, request.is_complex)
        .await
        .map_err(|e| state.fail(IMAGE_FAILED, e))?;
    Ok(Json(image.into()))
}

/// A cartoon illustration of a meaning, optionally set in a given context.
#[utoipa::path(
    post,
    path = "/api/image/illustration",
    request_body = IllustrationRequest,
    responses(
        (status = 200, description = "Generated illustration", body = ImageResponse),
        (status = 400, description = "Missing word or meaning", body = crate::web::rest::ErrorResponse),
        (status = 422, description = "Rejected by the provider's safety policy")
    )
)]
pub async fn illustration_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IllustrationRequest>,
) -> Result<Json<ImageResponse>, HttpError> {
    let word = required(&request.word, WORD_AND_MEANING_REQUIRED)?;
    let meaning = required(&request.meaning, WORD_AND_MEANING_REQUIRED)?;
    let image = state
        .gateway
        .illustration(word, meaning, request.context.trim())
        .await
        .map_err(|e| state.fail("삽화를 생성하는 중 오류가 발생했습니다.", e))?;
    Ok(Json(image.into()))
}

/// An illustration for a generated episode.
#[utoipa::path(
    post,
    path = "/api/image/episode",
    request_body = EpisodeImageRequest,
    responses(
        (status = 200, description = "Generated illustration", body = ImageResponse),
        (status = 400, description = "Missing title or story context", body = crate::web::rest::ErrorResponse),
        (status = 422, description = "Rejected by the provider's safety policy")
    )
)]
pub async fn episode_image_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EpisodeImageRequest>,
) -> Result<Json<ImageResponse>, HttpError> {
    const MESSAGE: &str = "제목과 이야기 컨텍스트가 필요합니다.";
    let title = required(&request.title, MESSAGE)?;
    let story_context = required(&request.story_context, MESSAGE)?;
    let image = state
        .gateway
        .episode_image(title, story_context)
        .await
        .map_err(|e| state.fail(IMAGE_FAILED, e))?;
    Ok(Json(image.into()))
}

/// An image from a free-form prompt.
#[utoipa::path(
    post,
    path = "/api/image/generate",
    request_body = GenerateImageRequest,
    responses(
        (status = 200, description = "Generated image", body = ImageResponse),
        (status = 400, description = "Missing prompt or invalid size", body = crate::web::rest::ErrorResponse),
        (status = 422, description = "Rejected by the provider's safety policy")
    )
)]
pub async fn generate_image_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<ImageResponse>, HttpError> {
    let prompt = required(&request.prompt, "프롬프트가 필요합니다.")?;

    let mut image_request = ImageRequest::new(prompt);
    if let Some(size) = request.size.as_deref().filter(|s| !s.trim().is_empty()) {
        image_request.size = ImageSize::from_str(size).map_err(|e| state.fail(IMAGE_FAILED, e))?;
    }
    if let Some(style) = request.style.as_deref().filter(|s| !s.trim().is_empty()) {
        image_request.style = style.trim().to_string();
    }

    let image = state
        .gateway
        .generate_image(&image_request)
        .await
        .map_err(|e| state.fail(IMAGE_FAILED, e))?;
    Ok(Json(image.into()))
}

//=========================================================================================
// Speech Handlers
//=========================================================================================

/// Synthesize speech for arbitrary text.
#[utoipa::path(
    post,
    path = "/api/tts/speak",
    request_body = SpeakRequest,
    responses(
        (status = 200, description = "Audio, or text for browser synthesis", body = SpeechResponse),
        (status = 400, description = "Missing text or unknown voice", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn speak_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SpeakRequest>,
) -> Result<Json<SpeechResponse>, HttpError> {
    let text = required(&request.text, "텍스트가 필요합니다.")?;

    let mut speech = SpeechRequest::new(text);
    speech.voice = request.voice.filter(|v| !v.trim().is_empty());
    speech.speed = request.speed.unwrap_or(DEFAULT_SPEECH_SPEED);

    let output = state
        .gateway
        .speak(&speech)
        .await
        .map_err(|e| state.fail(SPEECH_FAILED, e))?;
    Ok(Json(output.into()))
}

/// Slowed-down pronunciation of a single word.
#[utoipa::path(
    get,
    path = "/api/tts/word/{word}",
    params(("word" = String, Path, description = "The word to pronounce.")),
    responses((status = 200, description = "Audio, or text for browser synthesis", body = SpeechResponse))
)]
pub async fn pronounce_handler(
    State(state): State<Arc<AppState>>,
    Path(word): Path<String>,
) -> Result<Json<SpeechResponse>, HttpError> {
    let output = state
        .gateway
        .pronounce(word.trim())
        .await
        .map_err(|e| state.fail("발음을 생성하는 중 오류가 발생했습니다.", e))?;
    Ok(Json(output.into()))
}

/// Normal-speed reading of an example sentence.
#[utoipa::path(
    post,
    path = "/api/tts/sentence",
    request_body = SentenceRequest,
    responses(
        (status = 200, description = "Audio, or text for browser synthesis", body = SpeechResponse),
        (status = 400, description = "Missing sentence", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn sentence_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SentenceRequest>,
) -> Result<Json<SpeechResponse>, HttpError> {
    let sentence = required(&request.sentence, "문장이 필요합니다.")?;
    let output = state
        .gateway
        .speak_sentence(sentence)
        .await
        .map_err(|e| state.fail(SPEECH_FAILED, e))?;
    Ok(Json(output.into()))
}

/// The active speech provider and the voices it accepts.
#[utoipa::path(
    get,
    path = "/api/tts/config",
    responses((status = 200, description = "Speech provider and voice catalog", body = TtsConfigResponse))
)]
pub async fn tts_config_handler(State(state): State<Arc<AppState>>) -> Json<TtsConfigResponse> {
    Json(TtsConfigResponse {
        provider: state.gateway.provider_name(ContentClass::Speech).to_string(),
        available_voices: state
            .gateway
            .voices()
            .into_iter()
            .map(|v| VoiceResponse {
                id: v.id,
                name: v.name,
            })
            .collect(),
    })
}
