//! services/api/src/adapters/stability.rs
//!
//! The paid synchronous image family backed by Stability's SDXL text-to-image
//! endpoint. Images come back inline as base64 PNG.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vocab_core::{
    domain::{ImageOutput, ImagePayload, ImageRequest},
    ports::{ImageGenerationService, PortError, PortResult},
};

use super::{http, safety::SafetyClassifier};

pub const STABILITY_API_BASE: &str = "https://api.stability.ai";
const ENGINE: &str = "stable-diffusion-xl-1024-v1-0";
const MAX_DIMENSION: u32 = 1024;
const NEGATIVE_PROMPT: &str = "blurry, bad quality, distorted";

#[derive(Serialize)]
struct TextToImageRequest<'a> {
    text_prompts: [TextPrompt<'a>; 2],
    cfg_scale: u32,
    width: u32,
    height: u32,
    samples: u32,
    steps: u32,
}

#[derive(Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
    weight: f32,
}

#[derive(Deserialize)]
struct TextToImageResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Deserialize)]
struct Artifact {
    base64: String,
}

#[derive(Clone)]
pub struct StabilityAdapter {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    safety: SafetyClassifier,
}

impl StabilityAdapter {
    pub fn new(api_key: Option<String>, safety: SafetyClassifier) -> Self {
        Self::with_base_url(api_key, safety, STABILITY_API_BASE)
    }

    pub fn with_base_url(api_key: Option<String>, safety: SafetyClassifier, base_url: &str) -> Self {
        Self {
            http: http::build_client(http::DEFAULT_TIMEOUT),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            safety,
        }
    }
}

#[async_trait]
impl ImageGenerationService for StabilityAdapter {
    fn provider_name(&self) -> &'static str {
        "stability"
    }

    async fn generate_image(&self, request: &ImageRequest) -> PortResult<ImageOutput> {
        let api_key = http::require_key(&self.api_key, "STABILITY_API_KEY")?;
        let size = request.size.clamp(MAX_DIMENSION);

        let body = TextToImageRequest {
            text_prompts: [
                TextPrompt {
                    text: &request.prompt,
                    weight: 1.0,
                },
                TextPrompt {
                    text: NEGATIVE_PROMPT,
                    weight: -1.0,
                },
            ],
            cfg_scale: 7,
            width: size.width,
            height: size.height,
            samples: 1,
            steps: 30,
        };

        debug!(%size, "Sending Stability text-to-image request");

        let response = self
            .http
            .post(format!(
                "{}/v1/generation/{}/text-to-image",
                self.base_url, ENGINE
            ))
            .bearer_auth(api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| http::transport_error("Stability", e))?;
        let response = http::check_status("Stability", response, Some(&self.safety)).await?;
        let parsed: TextToImageResponse = http::read_json("Stability", response).await?;

        let artifact = parsed.artifacts.into_iter().next().ok_or_else(|| {
            PortError::MalformedResponse("Stability returned no artifacts".to_string())
        })?;

        Ok(ImageOutput {
            provider: self.provider_name().to_string(),
            payload: ImagePayload::Inline {
                base64: artifact.base64,
                content_type: "image/png".to_string(),
            },
            revised_prompt: None,
        })
    }
}
