//! services/api/src/adapters/gemini.rs
//!
//! Text adapter for Google Gemini's `generateContent` endpoint. The system role
//! and the user instruction are sent as a single prompt.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vocab_core::{
    domain::{ResponseMode, TextOutput},
    ports::{PortError, PortResult, TextGenerationService},
    structured,
};

use super::http;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Clone)]
pub struct GeminiTextAdapter {
    http: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiTextAdapter {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self::with_base_url(api_key, model, GEMINI_API_BASE)
    }

    pub fn with_base_url(api_key: Option<String>, model: String, base_url: &str) -> Self {
        Self {
            http: http::build_client(http::DEFAULT_TIMEOUT),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TextGenerationService for GeminiTextAdapter {
    fn provider_name(&self) -> &'static str {
        "google"
    }

    async fn generate(
        &self,
        system: &str,
        user: &str,
        mode: ResponseMode,
    ) -> PortResult<TextOutput> {
        let api_key = http::require_key(&self.api_key, "GOOGLE_AI_API_KEY")?;

        let prompt = match mode {
            ResponseMode::Json => format!(
                "{}\n\n{}\n\n{}",
                system,
                user,
                structured::JSON_ONLY_INSTRUCTION
            ),
            ResponseMode::PlainText => format!("{}\n\n{}", system, user),
        };
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        debug!(model = %self.model, ?mode, "Sending Gemini generateContent request");

        let response = self
            .http
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::transport_error("Gemini", e))?;
        let response = http::check_status("Gemini", response, None).await?;
        let body: GenerateResponse = http::read_json("Gemini", response).await?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                PortError::MalformedResponse("Gemini returned no candidate text".to_string())
            })?;

        match mode {
            ResponseMode::Json => structured::extract_json_object(&text).map(TextOutput::Json),
            ResponseMode::PlainText => Ok(TextOutput::Text(text)),
        }
    }
}
