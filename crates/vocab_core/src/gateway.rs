//! crates/vocab_core/src/gateway.rs
//!
//! The content-generation gateway: renders a template, hands it to the adapter
//! configured for its content class, and returns the adapter's result.
//!
//! The gateway is stateless. It never retries and never reshapes results beyond
//! unwrapping the text adapter's JSON object.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{
    ContentClass, GenerationRequest, GenerationResult, ImageOutput, ImageRequest, JsonObject,
    ResponseMode, SpeechOutput, SpeechRequest, TemplateId, TextOutput, VoiceOption,
    PRONUNCIATION_SPEED,
};
use crate::ports::{
    ImageGenerationService, PortError, PortResult, SpeechSynthesisService, TextGenerationService,
};
use crate::prompts::{self, TextPrompt, DEFAULT_MEANING_TYPE};

/// True when a text result is the model's "nothing found" answer (`"error": true`).
pub fn is_semantic_miss(result: &JsonObject) -> bool {
    matches!(result.get("error"), Some(serde_json::Value::Bool(true)))
}

/// Dispatches generation calls to one adapter per content class.
#[derive(Clone)]
pub struct ContentGateway {
    text: Arc<dyn TextGenerationService>,
    image: Arc<dyn ImageGenerationService>,
    speech: Arc<dyn SpeechSynthesisService>,
}

impl ContentGateway {
    pub fn new(
        text: Arc<dyn TextGenerationService>,
        image: Arc<dyn ImageGenerationService>,
        speech: Arc<dyn SpeechSynthesisService>,
    ) -> Self {
        Self { text, image, speech }
    }

    /// Name of the adapter serving `class`.
    pub fn provider_name(&self, class: ContentClass) -> &'static str {
        match class {
            ContentClass::Text => self.text.provider_name(),
            ContentClass::Image => self.image.provider_name(),
            ContentClass::Speech => self.speech.provider_name(),
        }
    }

    pub fn voices(&self) -> Vec<VoiceOption> {
        self.speech.voices()
    }

    //=====================================================================================
    // Text Templates
    //=====================================================================================

    pub async fn word_info(&self, word: &str) -> PortResult<JsonObject> {
        self.run_text(TemplateId::WordInfo, prompts::word_info(word)).await
    }

    pub async fn encyclopedia(&self, word: &str, meaning: &str) -> PortResult<JsonObject> {
        self.run_text(TemplateId::Encyclopedia, prompts::encyclopedia(word, meaning))
            .await
    }

    pub async fn concept_tree(&self, word: &str, meaning: &str) -> PortResult<JsonObject> {
        self.run_text(TemplateId::ConceptTree, prompts::concept_tree(word, meaning))
            .await
    }

    pub async fn episode(&self, word: &str, meaning: &str) -> PortResult<JsonObject> {
        self.run_text(TemplateId::Episode, prompts::episode(word, meaning))
            .await
    }

    pub async fn examples(
        &self,
        word: &str,
        meaning_type: &str,
        meaning: &str,
    ) -> PortResult<JsonObject> {
        self.run_text(
            TemplateId::Examples,
            prompts::examples(word, meaning_type, meaning),
        )
        .await
    }

    pub async fn scenario(&self, word: &str, meaning: &str) -> PortResult<JsonObject> {
        self.run_text(TemplateId::Scenario, prompts::scenario(word, meaning))
            .await
    }

    pub async fn quiz(&self, word: &str, meanings: &[String]) -> PortResult<JsonObject> {
        if meanings.iter().all(|m| m.trim().is_empty()) {
            return Err(PortError::InvalidRequest(
                "quiz needs at least one meaning".to_string(),
            ));
        }
        self.run_text(TemplateId::Quiz, prompts::quiz(word, meanings))
            .await
    }

    async fn run_text(&self, template: TemplateId, prompt: TextPrompt) -> PortResult<JsonObject> {
        debug!(%template, provider = self.text.provider_name(), "Rendering text template");
        let output = self
            .text
            .generate(prompt.system, &prompt.user, ResponseMode::Json)
            .await?;

        let object = match output {
            TextOutput::Json(object) => object,
            TextOutput::Text(_) => {
                return Err(PortError::MalformedResponse(format!(
                    "{} adapter returned plain text for a JSON template",
                    self.text.provider_name()
                )))
            }
        };

        // Advisory only: the schema is a prompt contract with the model.
        if !is_semantic_miss(&object) {
            let missing: Vec<&str> = prompt
                .required_fields
                .iter()
                .copied()
                .filter(|field| !object.contains_key(*field))
                .collect();
            if !missing.is_empty() {
                warn!(%template, ?missing, "Model output is missing advertised fields");
            }
        }

        Ok(object)
    }

    //=====================================================================================
    // Image Templates
    //=====================================================================================

    pub async fn word_image(
        &self,
        word: &str,
        meaning: &str,
        is_complex: bool,
    ) -> PortResult<ImageOutput> {
        let request = ImageRequest::new(prompts::word_image(word, meaning, is_complex));
        self.generate_image(&request).await
    }

    pub async fn illustration(
        &self,
        word: &str,
        meaning: &str,
        context: &str,
    ) -> PortResult<ImageOutput> {
        let request = ImageRequest::new(prompts::illustration(word, meaning, context));
        self.generate_image(&request).await
    }

    pub async fn episode_image(&self, title: &str, story_context: &str) -> PortResult<ImageOutput> {
        let request = ImageRequest::new(prompts::episode_image(title, story_context));
        self.generate_image(&request).await
    }

    pub async fn generate_image(&self, request: &ImageRequest) -> PortResult<ImageOutput> {
        debug!(
            provider = self.image.provider_name(),
            size = %request.size,
            "Generating image"
        );
        self.image.generate_image(request).await
    }

    //=====================================================================================
    // Speech
    //=====================================================================================

    pub async fn speak(&self, request: &SpeechRequest) -> PortResult<SpeechOutput> {
        if request.text.trim().is_empty() {
            return Err(PortError::InvalidRequest(
                "speech text must not be empty".to_string(),
            ));
        }
        if !(request.speed.is_finite() && request.speed > 0.0) {
            return Err(PortError::InvalidRequest(format!(
                "speech speed must be a positive number, got {}",
                request.speed
            )));
        }
        self.speech.synthesize(request).await
    }

    /// Slightly slowed-down reading of a single word.
    pub async fn pronounce(&self, word: &str) -> PortResult<SpeechOutput> {
        let mut request = SpeechRequest::new(word);
        request.speed = PRONUNCIATION_SPEED;
        self.speak(&request).await
    }

    pub async fn speak_sentence(&self, sentence: &str) -> PortResult<SpeechOutput> {
        self.speak(&SpeechRequest::new(sentence)).await
    }

    //=====================================================================================
    // Generic Dispatch
    //=====================================================================================

    /// Renders and runs any template from a string-keyed parameter map.
    pub async fn generate(&self, request: &GenerationRequest) -> PortResult<GenerationResult> {
        if request.class != request.template.class() {
            return Err(PortError::InvalidRequest(format!(
                "template '{}' produces {} content, not {}",
                request.template,
                request.template.class().as_str(),
                request.class.as_str()
            )));
        }

        let result = match request.template {
            TemplateId::WordInfo => {
                GenerationResult::Text(self.word_info(request.required("word")?).await?)
            }
            TemplateId::Encyclopedia => GenerationResult::Text(
                self.encyclopedia(request.required("word")?, request.required("meaning")?)
                    .await?,
            ),
            TemplateId::ConceptTree => GenerationResult::Text(
                self.concept_tree(request.required("word")?, request.required("meaning")?)
                    .await?,
            ),
            TemplateId::Episode => GenerationResult::Text(
                self.episode(request.required("word")?, request.required("meaning")?)
                    .await?,
            ),
            TemplateId::Examples => GenerationResult::Text(
                self.examples(
                    request.required("word")?,
                    request.optional("meaningType", DEFAULT_MEANING_TYPE),
                    request.required("meaning")?,
                )
                .await?,
            ),
            TemplateId::Scenario => GenerationResult::Text(
                self.scenario(request.required("word")?, request.required("meaning")?)
                    .await?,
            ),
            TemplateId::Quiz => {
                let meanings: Vec<String> = request
                    .required("meanings")?
                    .split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect();
                GenerationResult::Text(self.quiz(request.required("word")?, &meanings).await?)
            }
            TemplateId::ImageWord => {
                let is_complex = parse_flag(request.optional("isComplex", "false"))?;
                GenerationResult::Image(
                    self.word_image(
                        request.required("word")?,
                        request.required("meaning")?,
                        is_complex,
                    )
                    .await?,
                )
            }
            TemplateId::ImageIllustration => GenerationResult::Image(
                self.illustration(
                    request.required("word")?,
                    request.required("meaning")?,
                    request.optional("context", ""),
                )
                .await?,
            ),
            TemplateId::ImageEpisode => GenerationResult::Image(
                self.episode_image(
                    request.required("title")?,
                    request.required("storyContext")?,
                )
                .await?,
            ),
            TemplateId::ImageGenerate => {
                let mut image = ImageRequest::new(request.required("prompt")?);
                image.size = request.optional("size", "1024x1024").parse()?;
                image.style = request
                    .optional("style", ImageRequest::DEFAULT_STYLE)
                    .to_string();
                GenerationResult::Image(self.generate_image(&image).await?)
            }
            TemplateId::TtsSpeak => {
                let mut speech = SpeechRequest::new(request.required("text")?);
                speech.voice = request.params.get("voice").cloned();
                if let Some(speed) = request.params.get("speed") {
                    speech.speed = parse_speed(speed)?;
                }
                GenerationResult::Speech(self.speak(&speech).await?)
            }
        };

        Ok(result)
    }
}

fn parse_flag(value: &str) -> PortResult<bool> {
    match value.trim() {
        "true" => Ok(true),
        "false" | "" => Ok(false),
        other => Err(PortError::InvalidRequest(format!(
            "expected true or false, got '{}'",
            other
        ))),
    }
}

/// Range checks happen in [`ContentGateway::speak`].
fn parse_speed(value: &str) -> PortResult<f32> {
    value
        .trim()
        .parse::<f32>()
        .map_err(|_| PortError::InvalidRequest(format!("invalid speed '{}'", value)))
}
