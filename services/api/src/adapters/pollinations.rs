//! services/api/src/adapters/pollinations.rs
//!
//! The keyless image family: the image lives at a URL derived from the prompt.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, warn};
use vocab_core::{
    domain::{ImageOutput, ImagePayload, ImageRequest},
    ports::{ImageGenerationService, PortError, PortResult},
};

use super::http;

pub const POLLINATIONS_BASE: &str = "https://image.pollinations.ai";

/// The probe only warms up rendering; its outcome is not reported.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct PollinationsAdapter {
    http: Client,
    base_url: String,
}

impl PollinationsAdapter {
    pub fn new() -> Self {
        Self::with_base_url(POLLINATIONS_BASE)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: http::build_client(PROBE_TIMEOUT),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/prompt/{encoded prompt}?width=W&height=H&nologo=true`
    pub fn image_url(&self, request: &ImageRequest) -> PortResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| PortError::Unexpected(format!("invalid Pollinations base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected("Pollinations base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .push("prompt")
            .push(&request.prompt);
        url.query_pairs_mut()
            .append_pair("width", &request.size.width.to_string())
            .append_pair("height", &request.size.height.to_string())
            .append_pair("nologo", "true");
        Ok(url)
    }
}

impl Default for PollinationsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for PollinationsAdapter {
    fn provider_name(&self) -> &'static str {
        "pollinations"
    }

    async fn generate_image(&self, request: &ImageRequest) -> PortResult<ImageOutput> {
        let url = self.image_url(request)?;

        match self.http.head(url.clone()).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => debug!(status = %response.status(), "Pollinations probe answered"),
            Err(e) => warn!("Pollinations probe failed, returning the URL anyway: {}", e),
        }

        Ok(ImageOutput {
            provider: self.provider_name().to_string(),
            payload: ImagePayload::Url(url.into()),
            revised_prompt: None,
        })
    }
}
