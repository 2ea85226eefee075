//! services/api/src/adapters/anthropic.rs
//!
//! Text adapter for the Anthropic messages API. There is no native JSON mode,
//! so JSON templates go through the tolerant extractor in `vocab_core::structured`.

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

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.7;

// ===== Wire Types =====

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

// ===== Adapter =====

#[derive(Clone)]
pub struct AnthropicTextAdapter {
    http: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl AnthropicTextAdapter {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self::with_base_url(api_key, model, ANTHROPIC_API_BASE)
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
impl TextGenerationService for AnthropicTextAdapter {
    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    async fn generate(
        &self,
        system: &str,
        user: &str,
        mode: ResponseMode,
    ) -> PortResult<TextOutput> {
        let api_key = http::require_key(&self.api_key, "ANTHROPIC_API_KEY")?;

        let content = match mode {
            ResponseMode::Json => format!("{}\n\n{}", user, structured::JSON_ONLY_INSTRUCTION),
            ResponseMode::PlainText => user.to_string(),
        };
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system,
            messages: vec![Message {
                role: "user",
                content,
            }],
        };

        debug!(model = %self.model, ?mode, "Sending Anthropic messages request");

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::transport_error("Anthropic", e))?;
        let response = http::check_status("Anthropic", response, None).await?;
        let body: MessagesResponse = http::read_json("Anthropic", response).await?;

        let text = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .find_map(|block| block.text)
            .ok_or_else(|| {
                PortError::MalformedResponse("Anthropic returned no text block".to_string())
            })?;

        match mode {
            ResponseMode::Json => structured::extract_json_object(&text).map(TextOutput::Json),
            ResponseMode::PlainText => Ok(TextOutput::Text(text)),
        }
    }
}
