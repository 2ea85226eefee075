//! services/api/src/adapters/leonardo.rs
//!
//! The async-job image family backed by Leonardo. A generation job is created,
//! then its status is polled on a fixed interval until it completes, fails, or
//! the attempt budget runs out.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use vocab_core::{
    domain::{ImageOutput, ImagePayload, ImageRequest},
    ports::{ImageGenerationService, PortError, PortResult},
};

use super::{http, safety::SafetyClassifier};

pub const LEONARDO_API_BASE: &str = "https://cloud.leonardo.ai/api/rest";
/// Leonardo Creative.
const MODEL_ID: &str = "6bef9f1b-29cb-40c7-b9df-32b51c1f67d3";
const NEGATIVE_PROMPT: &str = "blurry, bad quality, distorted, ugly";
const MAX_DIMENSION: u32 = 1024;

pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const POLL_ATTEMPTS: u32 = 30;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateGeneration<'a> {
    prompt: &'a str,
    #[serde(rename = "negative_prompt")]
    negative_prompt: &'static str,
    model_id: &'static str,
    width: u32,
    height: u32,
    #[serde(rename = "num_images")]
    num_images: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateGenerationResponse {
    sd_generation_job: GenerationJob,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationJob {
    generation_id: String,
}

#[derive(Deserialize)]
struct GenerationStatusResponse {
    generations_by_pk: Option<Generation>,
}

#[derive(Deserialize)]
struct Generation {
    status: String,
    #[serde(default)]
    generated_images: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    url: String,
}

#[derive(Clone)]
pub struct LeonardoAdapter {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    safety: SafetyClassifier,
    poll_interval: Duration,
    poll_attempts: u32,
}

impl LeonardoAdapter {
    pub fn new(api_key: Option<String>, safety: SafetyClassifier) -> Self {
        Self::with_base_url(api_key, safety, LEONARDO_API_BASE)
    }

    pub fn with_base_url(api_key: Option<String>, safety: SafetyClassifier, base_url: &str) -> Self {
        Self {
            http: http::build_client(http::DEFAULT_TIMEOUT),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            safety,
            poll_interval: POLL_INTERVAL,
            poll_attempts: POLL_ATTEMPTS,
        }
    }

    /// Overrides the polling schedule.
    pub fn with_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.poll_interval = interval;
        self.poll_attempts = attempts;
        self
    }

    /// Overrides only the wait between status checks; the attempt budget stays.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The longest a job is waited on before `GenerationTimeout`.
    pub fn poll_ceiling(&self) -> Duration {
        self.poll_interval * self.poll_attempts
    }

    async fn create_job(&self, api_key: &str, request: &ImageRequest) -> PortResult<String> {
        let size = request.size.clamp(MAX_DIMENSION);
        let body = CreateGeneration {
            prompt: &request.prompt,
            negative_prompt: NEGATIVE_PROMPT,
            model_id: MODEL_ID,
            width: size.width,
            height: size.height,
            num_images: 1,
        };

        let response = self
            .http
            .post(format!("{}/v1/generations", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::transport_error("Leonardo", e))?;
        let response = http::check_status("Leonardo", response, Some(&self.safety)).await?;
        let created: CreateGenerationResponse = http::read_json("Leonardo", response).await?;
        Ok(created.sd_generation_job.generation_id)
    }

    async fn poll_once(&self, api_key: &str, generation_id: &str) -> PortResult<Option<Generation>> {
        let response = self
            .http
            .get(format!("{}/v1/generations/{}", self.base_url, generation_id))
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| http::transport_error("Leonardo", e))?;
        let response = http::check_status("Leonardo", response, Some(&self.safety)).await?;
        let status: GenerationStatusResponse = http::read_json("Leonardo", response).await?;
        Ok(status.generations_by_pk)
    }
}

#[async_trait]
impl ImageGenerationService for LeonardoAdapter {
    fn provider_name(&self) -> &'static str {
        "leonardo"
    }

    async fn generate_image(&self, request: &ImageRequest) -> PortResult<ImageOutput> {
        let api_key = http::require_key(&self.api_key, "LEONARDO_API_KEY")?;
        let generation_id = self.create_job(api_key, request).await?;
        info!(%generation_id, "Leonardo generation job created");

        for attempt in 1..=self.poll_attempts {
            tokio::time::sleep(self.poll_interval).await;

            let Some(generation) = self.poll_once(api_key, &generation_id).await? else {
                debug!(attempt, "Leonardo generation not visible yet");
                continue;
            };

            match generation.status.as_str() {
                "COMPLETE" => {
                    let image = generation.generated_images.into_iter().next().ok_or_else(|| {
                        PortError::MalformedResponse(
                            "Leonardo completed without images".to_string(),
                        )
                    })?;
                    return Ok(ImageOutput {
                        provider: self.provider_name().to_string(),
                        payload: ImagePayload::Url(image.url),
                        revised_prompt: None,
                    });
                }
                "FAILED" => {
                    return Err(PortError::UpstreamFailure(format!(
                        "Leonardo generation {} failed",
                        generation_id
                    )))
                }
                other => debug!(attempt, status = other, "Leonardo generation pending"),
            }
        }

        Err(PortError::GenerationTimeout(format!(
            "Leonardo generation {} did not complete after {} attempts",
            generation_id, self.poll_attempts
        )))
    }
}
