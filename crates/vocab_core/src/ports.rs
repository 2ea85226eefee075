//! crates/vocab_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like provider APIs or databases.

use async_trait::async_trait;

use crate::domain::{
    ImageOutput, ImageRequest, JsonObject, ResponseMode, SavedExample, SavedWord, SearchEntry,
    SpeechOutput, SpeechRequest, TextOutput, VoiceOption, WordQuery,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by every port.
///
/// Adapters translate provider-specific failures into one of these variants; the
/// gateway passes them upward unchanged and the HTTP layer picks the status code.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// A required API key is absent. Raised before any network call.
    #[error("Missing credential: {0}")]
    MissingCredential(String),
    /// The upstream refused the request on content-policy grounds.
    #[error("Rejected by safety policy: {0}")]
    SafetyRejection(String),
    /// A polling adapter ran out of attempts.
    #[error("Generation timed out: {0}")]
    GenerationTimeout(String),
    /// The upstream answered, but not in the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// Network or HTTP-level failure talking to the upstream.
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),
    /// The caller supplied missing or invalid input.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Content-Generation Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Short provider name reported by the health endpoint.
    fn provider_name(&self) -> &'static str;

    /// Runs one system + user instruction pair.
    ///
    /// In [`ResponseMode::Json`] the result is always [`TextOutput::Json`] or a
    /// [`PortError::MalformedResponse`].
    async fn generate(&self, system: &str, user: &str, mode: ResponseMode)
        -> PortResult<TextOutput>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn generate_image(&self, request: &ImageRequest) -> PortResult<ImageOutput>;
}

#[async_trait]
pub trait SpeechSynthesisService: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// The voices this provider accepts in [`SpeechRequest::voice`].
    fn voices(&self) -> Vec<VoiceOption>;

    async fn synthesize(&self, request: &SpeechRequest) -> PortResult<SpeechOutput>;
}

//=========================================================================================
// Persistence Port
//=========================================================================================

#[async_trait]
pub trait StorageService: Send + Sync {
    fn backend_name(&self) -> &'static str;

    // --- Saved Words ---
    /// Stores `data` under (user, lowercased `data.word`), replacing any previous record.
    async fn save_word(&self, user_id: &str, data: JsonObject) -> PortResult<()>;

    async fn list_words(&self, user_id: &str, query: &WordQuery) -> PortResult<Vec<SavedWord>>;

    async fn mark_learned(&self, user_id: &str, word: &str, is_learned: bool) -> PortResult<()>;

    async fn delete_word(&self, user_id: &str, word: &str) -> PortResult<()>;

    // --- Saved Examples ---
    /// Stores an example and returns its generated id.
    async fn save_example(&self, user_id: &str, data: JsonObject) -> PortResult<String>;

    async fn list_examples(&self, user_id: &str) -> PortResult<Vec<SavedExample>>;

    // --- Search History ---
    async fn record_search(&self, user_id: &str, word: &str) -> PortResult<()>;

    /// Returns at most `limit` entries, newest first.
    async fn search_history(&self, user_id: &str, limit: usize) -> PortResult<Vec<SearchEntry>>;
}
