//! services/api/src/web/storage.rs
//!
//! Axum handlers for saved words, saved examples and search history. Records
//! are returned as the client's own JSON with the server-side bookkeeping
//! fields (`id`, `savedAt`, ...) merged in.

use crate::web::{
    error::HttpError,
    extract::{Json, Path, Query},
    rest::{required, SuccessResponse},
    state::AppState,
};
use axum::extract::State;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{str::FromStr, sync::Arc};
use utoipa::{IntoParams, ToSchema};
use vocab_core::domain::{
    JsonObject, SavedExample, SavedWord, SearchEntry, SortOrder, WordQuery, WordSort, DEFAULT_USER,
};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

//=========================================================================================
// Request and Response Structs
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct UserParams {
    /// Defaults to `anonymous`.
    pub user_id: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct SavedWordsParams {
    pub user_id: Option<String>,
    /// `savedAt` (default) or `word`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub order: Option<String>,
    pub part_of_speech: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub user_id: Option<String>,
    /// Defaults to 50.
    pub limit: Option<usize>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveWordRequest {
    pub user_id: Option<String>,
    /// The word lookup result as the client holds it; must carry `word`.
    #[schema(value_type = Option<Object>)]
    pub word_data: Option<JsonObject>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkLearnedRequest {
    pub user_id: Option<String>,
    pub word: Option<String>,
    pub is_learned: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveExampleRequest {
    pub user_id: Option<String>,
    /// Must carry `sentence`; `word` is used to build the id.
    #[schema(value_type = Option<Object>)]
    pub example: Option<JsonObject>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordSearchRequest {
    pub user_id: Option<String>,
    pub word: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SavedWordsResponse {
    #[schema(value_type = Vec<Object>)]
    pub words: Vec<JsonObject>,
}

#[derive(Serialize, ToSchema)]
pub struct SaveExampleResponse {
    pub success: bool,
    pub id: String,
}

#[derive(Serialize, ToSchema)]
pub struct SavedExamplesResponse {
    #[schema(value_type = Vec<Object>)]
    pub examples: Vec<JsonObject>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    pub word: String,
    pub searched_at: String,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntryResponse>,
}

//=========================================================================================
// Record Shaping
//=========================================================================================

fn user_or_default(user_id: &Option<String>) -> &str {
    user_id
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(DEFAULT_USER)
}

fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn saved_word_json(word: SavedWord) -> JsonObject {
    let mut object = JsonObject::new();
    object.insert("id".to_string(), Value::String(word.id));
    object.extend(word.data);
    object.insert("savedAt".to_string(), timestamp(word.saved_at));
    object.insert("isLearned".to_string(), Value::Bool(word.is_learned));
    object.insert(
        "learnedAt".to_string(),
        word.learned_at.map(timestamp).unwrap_or(Value::Null),
    );
    object
}

fn saved_example_json(example: SavedExample) -> JsonObject {
    let mut object = JsonObject::new();
    object.insert("id".to_string(), Value::String(example.id));
    object.extend(example.data);
    object.insert("savedAt".to_string(), timestamp(example.saved_at));
    object
}

impl From<SearchEntry> for HistoryEntryResponse {
    fn from(entry: SearchEntry) -> Self {
        Self {
            word: entry.word,
            searched_at: entry.searched_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

fn has_text_field(object: &JsonObject, field: &str) -> bool {
    object
        .get(field)
        .and_then(Value::as_str)
        .is_some_and(|v| !v.trim().is_empty())
}

//=========================================================================================
// Saved Word Handlers
//=========================================================================================

/// Save (or overwrite) a word for a user.
#[utoipa::path(
    post,
    path = "/api/word/save",
    request_body = SaveWordRequest,
    responses(
        (status = 200, description = "Saved", body = SuccessResponse),
        (status = 400, description = "Missing word data", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn save_word_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveWordRequest>,
) -> Result<Json<SuccessResponse>, HttpError> {
    let user_id = user_or_default(&request.user_id);
    let word_data = request
        .word_data
        .filter(|data| has_text_field(data, "word"))
        .ok_or_else(|| HttpError::bad_request("저장할 단어 정보가 필요합니다."))?;

    state
        .storage
        .save_word(user_id, word_data)
        .await
        .map_err(|e| state.fail("단어를 저장하는 중 오류가 발생했습니다.", e))?;
    Ok(SuccessResponse::ok())
}

/// A user's saved words, optionally filtered by part of speech.
#[utoipa::path(
    get,
    path = "/api/word/saved",
    params(SavedWordsParams),
    responses(
        (status = 200, description = "Saved words", body = SavedWordsResponse),
        (status = 400, description = "Unknown sort key or order", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn saved_words_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SavedWordsParams>,
) -> Result<Json<SavedWordsResponse>, HttpError> {
    const MESSAGE: &str = "저장된 단어를 조회하는 중 오류가 발생했습니다.";
    let user_id = user_or_default(&params.user_id);

    let mut query = WordQuery::default();
    if let Some(sort_by) = params.sort_by.as_deref().filter(|s| !s.is_empty()) {
        query.sort_by = WordSort::from_str(sort_by).map_err(|e| state.fail(MESSAGE, e))?;
    }
    if let Some(order) = params.order.as_deref().filter(|s| !s.is_empty()) {
        query.order = SortOrder::from_str(order).map_err(|e| state.fail(MESSAGE, e))?;
    }
    query.part_of_speech = params.part_of_speech.filter(|p| !p.trim().is_empty());

    let words = state
        .storage
        .list_words(user_id, &query)
        .await
        .map_err(|e| state.fail(MESSAGE, e))?;
    Ok(Json(SavedWordsResponse {
        words: words.into_iter().map(saved_word_json).collect(),
    }))
}

/// Mark a saved word as learned (or not).
#[utoipa::path(
    patch,
    path = "/api/word/learned",
    request_body = MarkLearnedRequest,
    responses(
        (status = 200, description = "Updated", body = SuccessResponse),
        (status = 400, description = "Missing word", body = crate::web::rest::ErrorResponse),
        (status = 404, description = "The word was never saved", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn mark_learned_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MarkLearnedRequest>,
) -> Result<Json<SuccessResponse>, HttpError> {
    let user_id = user_or_default(&request.user_id);
    let word = required(&request.word, "단어가 필요합니다.")?;

    state
        .storage
        .mark_learned(user_id, word, request.is_learned.unwrap_or(true))
        .await
        .map_err(|e| state.fail("학습 완료 표시 중 오류가 발생했습니다.", e))?;
    Ok(SuccessResponse::ok())
}

/// Remove a saved word. Removing a word that is not saved succeeds.
#[utoipa::path(
    delete,
    path = "/api/word/{word}",
    params(("word" = String, Path, description = "The saved word."), UserParams),
    responses((status = 200, description = "Deleted", body = SuccessResponse))
)]
pub async fn delete_word_handler(
    State(state): State<Arc<AppState>>,
    Path(word): Path<String>,
    Query(params): Query<UserParams>,
) -> Result<Json<SuccessResponse>, HttpError> {
    let user_id = user_or_default(&params.user_id);
    state
        .storage
        .delete_word(user_id, &word)
        .await
        .map_err(|e| state.fail("단어를 삭제하는 중 오류가 발생했습니다.", e))?;
    Ok(SuccessResponse::ok())
}

//=========================================================================================
// Example and History Handlers
//=========================================================================================

/// Save an example sentence.
#[utoipa::path(
    post,
    path = "/api/storage/example",
    request_body = SaveExampleRequest,
    responses(
        (status = 200, description = "Saved", body = SaveExampleResponse),
        (status = 400, description = "Missing example sentence", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn save_example_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveExampleRequest>,
) -> Result<Json<SaveExampleResponse>, HttpError> {
    let user_id = user_or_default(&request.user_id);
    let example = request
        .example
        .filter(|data| has_text_field(data, "sentence"))
        .ok_or_else(|| HttpError::bad_request("예문 정보가 필요합니다."))?;

    let id = state
        .storage
        .save_example(user_id, example)
        .await
        .map_err(|e| state.fail("예문을 저장하는 중 오류가 발생했습니다.", e))?;
    Ok(Json(SaveExampleResponse { success: true, id }))
}

/// A user's saved examples, newest first.
#[utoipa::path(
    get,
    path = "/api/storage/examples",
    params(UserParams),
    responses((status = 200, description = "Saved examples", body = SavedExamplesResponse))
)]
pub async fn saved_examples_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Result<Json<SavedExamplesResponse>, HttpError> {
    let examples = state
        .storage
        .list_examples(user_or_default(&params.user_id))
        .await
        .map_err(|e| state.fail("예문을 조회하는 중 오류가 발생했습니다.", e))?;
    Ok(Json(SavedExamplesResponse {
        examples: examples.into_iter().map(saved_example_json).collect(),
    }))
}

/// Append a word to the user's search history.
#[utoipa::path(
    post,
    path = "/api/storage/history",
    request_body = RecordSearchRequest,
    responses(
        (status = 200, description = "Recorded", body = SuccessResponse),
        (status = 400, description = "Missing word", body = crate::web::rest::ErrorResponse)
    )
)]
pub async fn record_search_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecordSearchRequest>,
) -> Result<Json<SuccessResponse>, HttpError> {
    let user_id = user_or_default(&request.user_id);
    let word = required(&request.word, "단어가 필요합니다.")?;
    state
        .storage
        .record_search(user_id, word)
        .await
        .map_err(|e| state.fail("검색 기록을 저장하는 중 오류가 발생했습니다.", e))?;
    Ok(SuccessResponse::ok())
}

/// The user's most recent searches, newest first.
#[utoipa::path(
    get,
    path = "/api/storage/history",
    params(HistoryParams),
    responses((status = 200, description = "Search history", body = HistoryResponse))
)]
pub async fn search_history_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, HttpError> {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let history = state
        .storage
        .search_history(user_or_default(&params.user_id), limit)
        .await
        .map_err(|e| state.fail("검색 기록을 조회하는 중 오류가 발생했습니다.", e))?;
    Ok(Json(HistoryResponse {
        history: history.into_iter().map(Into::into).collect(),
    }))
}
