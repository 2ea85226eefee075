//! services/api/src/adapters/dalle.rs
//!
//! The paid synchronous image family with safety rejection, backed by DALL·E
//! through `async-openai`.

use async_openai::{
    config::OpenAIConfig,
    types::images::{
        CreateImageRequestArgs, Image, ImageModel, ImageQuality, ImageResponseFormat,
        ImageSize as DalleSize, ImageStyle,
    },
    Client,
};
use async_trait::async_trait;
use tracing::debug;
use vocab_core::{
    domain::{ImageOutput, ImagePayload, ImageRequest, ImageSize},
    ports::{ImageGenerationService, PortError, PortResult},
};

use super::{openai, safety::SafetyClassifier};

#[derive(Clone)]
pub struct DalleAdapter {
    client: Option<Client<OpenAIConfig>>,
    model: String,
    safety: SafetyClassifier,
}

impl DalleAdapter {
    pub fn new(client: Option<Client<OpenAIConfig>>, model: String, safety: SafetyClassifier) -> Self {
        Self {
            client,
            model,
            safety,
        }
    }
}

/// DALL·E 3 renders three sizes only; pick the one with the same orientation.
pub fn nearest_size(size: ImageSize) -> DalleSize {
    if size.width > size.height {
        DalleSize::S1792x1024
    } else if size.height > size.width {
        DalleSize::S1024x1792
    } else {
        DalleSize::S1024x1024
    }
}

fn image_style(style: &str) -> ImageStyle {
    if style.eq_ignore_ascii_case("natural") {
        ImageStyle::Natural
    } else {
        ImageStyle::Vivid
    }
}

fn image_model(model: &str) -> ImageModel {
    match model {
        "dall-e-3" => ImageModel::DallE3,
        "dall-e-2" => ImageModel::DallE2,
        other => ImageModel::Other(other.to_string()),
    }
}

#[async_trait]
impl ImageGenerationService for DalleAdapter {
    fn provider_name(&self) -> &'static str {
        "dalle"
    }

    async fn generate_image(&self, request: &ImageRequest) -> PortResult<ImageOutput> {
        let client = openai::require_client(&self.client)?;

        let dalle_request = CreateImageRequestArgs::default()
            .prompt(request.prompt.as_str())
            .model(image_model(&self.model))
            .n(1u8)
            .size(nearest_size(request.size))
            .style(image_style(&request.style))
            .quality(ImageQuality::Standard)
            .response_format(ImageResponseFormat::Url)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!(model = %self.model, size = %request.size, "Sending DALL·E generation request");

        let response = client
            .images()
            .generate(dalle_request)
            .await
            .map_err(|e| openai::map_error(e, Some(&self.safety)))?;

        let image = response.data.into_iter().next().ok_or_else(|| {
            PortError::MalformedResponse("DALL·E returned no images".to_string())
        })?;

        let (payload, revised_prompt) = match image.as_ref() {
            Image::Url {
                url,
                revised_prompt,
            } => (ImagePayload::Url(url.clone()), revised_prompt.clone()),
            Image::B64Json {
                b64_json,
                revised_prompt,
            } => (
                ImagePayload::Inline {
                    base64: b64_json.to_string(),
                    content_type: "image/png".to_string(),
                },
                revised_prompt.clone(),
            ),
        };

        Ok(ImageOutput {
            provider: self.provider_name().to_string(),
            payload,
            revised_prompt,
        })
    }
}
