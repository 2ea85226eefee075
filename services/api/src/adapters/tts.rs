//! services/api/src/adapters/tts.rs
//!
//! This module contains the adapter for OpenAI's Text-to-Speech (TTS) service.
//! It implements the `SpeechSynthesisService` port from `vocab_core`.

use async_openai::{
    config::OpenAIConfig,
    types::audio::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use vocab_core::{
    domain::{SpeechOutput, SpeechRequest, VoiceOption},
    ports::{PortError, PortResult, SpeechSynthesisService},
};

use super::openai;

const DEFAULT_VOICE: &str = "alloy";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `SpeechSynthesisService` port using the OpenAI TTS API.
#[derive(Clone)]
pub struct OpenAiTtsAdapter {
    client: Option<Client<OpenAIConfig>>,
    model: SpeechModel,
}

impl OpenAiTtsAdapter {
    /// Creates a new `OpenAiTtsAdapter`.
    pub fn new(client: Option<Client<OpenAIConfig>>, model: &str) -> Self {
        let model = match model {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            "gpt-4o-mini-tts" => SpeechModel::Gpt4oMiniTts,
            other => SpeechModel::Other(other.to_string()),
        };
        Self { client, model }
    }
}

/// Resolves a catalog voice name; anything outside the catalog is rejected.
fn parse_voice(name: &str) -> PortResult<Voice> {
    match name.to_lowercase().as_str() {
        "alloy" => Ok(Voice::Alloy),
        "echo" => Ok(Voice::Echo),
        "fable" => Ok(Voice::Fable),
        "onyx" => Ok(Voice::Onyx),
        "nova" => Ok(Voice::Nova),
        "shimmer" => Ok(Voice::Shimmer),
        _ => Err(PortError::InvalidRequest(format!(
            "Invalid TTS voice: '{}'",
            name
        ))),
    }
}

//=========================================================================================
// `SpeechSynthesisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SpeechSynthesisService for OpenAiTtsAdapter {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn voices(&self) -> Vec<VoiceOption> {
        vec![
            VoiceOption::new("alloy", "Alloy (Neutral)"),
            VoiceOption::new("echo", "Echo (Male)"),
            VoiceOption::new("fable", "Fable (British)"),
            VoiceOption::new("onyx", "Onyx (Deep Male)"),
            VoiceOption::new("nova", "Nova (Female)"),
            VoiceOption::new("shimmer", "Shimmer (Soft Female)"),
        ]
    }

    /// Synthesizes MP3 audio and returns it base64-encoded.
    async fn synthesize(&self, request: &SpeechRequest) -> PortResult<SpeechOutput> {
        let voice = parse_voice(request.voice.as_deref().unwrap_or(DEFAULT_VOICE))?;
        let client = openai::require_client(&self.client)?;

        let speech_request = CreateSpeechRequest {
            model: self.model.clone(),
            input: request.text.clone(),
            voice,
            response_format: Some(SpeechResponseFormat::Mp3),
            speed: Some(request.speed),
            ..Default::default()
        };

        // Call the API and manually map the error, which respects the orphan rule.
        let response = client
            .audio()
            .speech()
            .create(speech_request)
            .await
            .map_err(|e| openai::map_error(e, None))?;

        Ok(SpeechOutput::Audio {
            provider: self.provider_name().to_string(),
            audio_base64: STANDARD.encode(&response.bytes),
            content_type: "audio/mpeg".to_string(),
        })
    }
}
