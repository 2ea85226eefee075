//! services/api/src/adapters/openai_text.rs
//!
//! This module contains the chat-completion text adapter backed by OpenAI.
//! It implements the `TextGenerationService` port from `vocab_core` and is
//! the only text family with a native JSON response mode.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use tracing::debug;
use vocab_core::{
    domain::{ResponseMode, TextOutput},
    ports::{PortError, PortResult, TextGenerationService},
    structured,
};

use super::openai;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 4096;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationService` using the OpenAI chat API.
#[derive(Clone)]
pub struct OpenAiTextAdapter {
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiTextAdapter {
    /// Creates a new `OpenAiTextAdapter`. Without a client every call fails with
    /// `MissingCredential`.
    pub fn new(client: Option<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for OpenAiTextAdapter {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    async fn generate(
        &self,
        system: &str,
        user: &str,
        mode: ResponseMode,
    ) -> PortResult<TextOutput> {
        let client = openai::require_client(&self.client)?;

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(messages)
            .temperature(TEMPERATURE)
            .max_completion_tokens(MAX_TOKENS);
        if mode == ResponseMode::Json {
            builder.response_format(ResponseFormat::JsonObject);
        }
        let request = builder
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!(model = %self.model, ?mode, "Sending chat completion request");

        // Call the API and manually map the error, which respects the orphan rule.
        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e| openai::map_error(e, None))?;

        // Extract the text content from the first choice in the response.
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::MalformedResponse(
                    "OpenAI returned no text content in its response.".to_string(),
                )
            })?;

        match mode {
            ResponseMode::Json => structured::parse_json_object(&content).map(TextOutput::Json),
            ResponseMode::PlainText => Ok(TextOutput::Text(content)),
        }
    }
}
