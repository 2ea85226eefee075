//! services/api/src/adapters/elevenlabs.rs
//!
//! Speech adapter for ElevenLabs. Voices are addressed by id and the audio comes
//! back as raw MP3 bytes.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Serialize;
use vocab_core::{
    domain::{SpeechOutput, SpeechRequest, VoiceOption},
    ports::{PortError, PortResult, SpeechSynthesisService},
};

use super::http;

pub const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io";
/// Rachel.
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
const MODEL_ID: &str = "eleven_monolingual_v1";

#[derive(Serialize)]
struct SpeechBody<'a> {
    text: &'a str,
    model_id: &'static str,
    voice_settings: VoiceSettings,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    speed: f32,
}

#[derive(Clone)]
pub struct ElevenLabsAdapter {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl ElevenLabsAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, ELEVENLABS_API_BASE)
    }

    pub fn with_base_url(api_key: Option<String>, base_url: &str) -> Self {
        Self {
            http: http::build_client(http::DEFAULT_TIMEOUT),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SpeechSynthesisService for ElevenLabsAdapter {
    fn provider_name(&self) -> &'static str {
        "elevenlabs"
    }

    fn voices(&self) -> Vec<VoiceOption> {
        vec![
            VoiceOption::new("21m00Tcm4TlvDq8ikWAM", "Rachel"),
            VoiceOption::new("AZnzlk1XvdvUeBnXmlld", "Domi"),
            VoiceOption::new("EXAVITQu4vr4xnSDxMaL", "Bella"),
            VoiceOption::new("MF3mGyEYCl7XYWbV9V6O", "Elli"),
            VoiceOption::new("TxGEqnHWrfWFTfGW9XjX", "Josh"),
        ]
    }

    async fn synthesize(&self, request: &SpeechRequest) -> PortResult<SpeechOutput> {
        let api_key = http::require_key(&self.api_key, "ELEVENLABS_API_KEY")?;
        let voice_id = request.voice.as_deref().unwrap_or(DEFAULT_VOICE_ID);

        let body = SpeechBody {
            text: &request.text,
            model_id: MODEL_ID,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
                speed: request.speed,
            },
        };

        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| PortError::Unexpected(format!("invalid ElevenLabs base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected("ElevenLabs base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(["v1", "text-to-speech", voice_id]);

        let response = self
            .http
            .post(url)
            .header("xi-api-key", api_key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| http::transport_error("ElevenLabs", e))?;
        let response = http::check_status("ElevenLabs", response, None).await?;
        let audio = response
            .bytes()
            .await
            .map_err(|e| http::transport_error("ElevenLabs", e))?;

        if audio.is_empty() {
            return Err(PortError::MalformedResponse(
                "ElevenLabs returned an empty audio body".to_string(),
            ));
        }

        Ok(SpeechOutput::Audio {
            provider: self.provider_name().to_string(),
            audio_base64: STANDARD.encode(&audio),
            content_type: "audio/mpeg".to_string(),
        })
    }
}
