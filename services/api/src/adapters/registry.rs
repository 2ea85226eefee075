//! services/api/src/adapters/registry.rs
//!
//! Resolves the configured provider for each content class into a concrete
//! adapter, once, at startup.

use std::{collections::BTreeSet, sync::Arc};

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use vocab_core::{
    gateway::ContentGateway,
    ports::{ImageGenerationService, SpeechSynthesisService, StorageService, TextGenerationService},
};

use super::{
    anthropic::AnthropicTextAdapter, browser_tts::BrowserTtsAdapter, dalle::DalleAdapter,
    db::DbAdapter, elevenlabs::ElevenLabsAdapter, gemini::GeminiTextAdapter,
    leonardo::LeonardoAdapter, memory::MemoryStore, openai, openai_text::OpenAiTextAdapter,
    pollinations::PollinationsAdapter, safety::SafetyClassifier, stability::StabilityAdapter,
    tts::OpenAiTtsAdapter,
};
use crate::config::{Config, ImageProvider, TextProvider, TtsProvider};
use crate::error::ApiError;

/// One adapter per content class.
#[derive(Clone)]
pub struct AdapterRegistry {
    pub text: Arc<dyn TextGenerationService>,
    pub image: Arc<dyn ImageGenerationService>,
    pub speech: Arc<dyn SpeechSynthesisService>,
}

impl AdapterRegistry {
    pub fn from_config(config: &Config) -> Self {
        let keys = &config.api_keys;
        let openai_client = openai::client(keys.openai.as_deref(), None);
        let safety = SafetyClassifier::new(config.safety_phrases.as_slice());

        let text: Arc<dyn TextGenerationService> = match config.text_provider {
            TextProvider::OpenAi => Arc::new(OpenAiTextAdapter::new(
                openai_client.clone(),
                config.text_model.clone(),
            )),
            TextProvider::Anthropic => Arc::new(AnthropicTextAdapter::new(
                keys.anthropic.clone(),
                config.text_model.clone(),
            )),
            TextProvider::Google => Arc::new(GeminiTextAdapter::new(
                keys.google.clone(),
                config.text_model.clone(),
            )),
        };

        let image: Arc<dyn ImageGenerationService> = match config.image_provider {
            ImageProvider::Pollinations => Arc::new(PollinationsAdapter::new()),
            ImageProvider::Dalle => Arc::new(DalleAdapter::new(
                openai_client.clone(),
                config.image_model.clone(),
                safety.clone(),
            )),
            ImageProvider::Stability => {
                Arc::new(StabilityAdapter::new(keys.stability.clone(), safety.clone()))
            }
            ImageProvider::Leonardo => {
                Arc::new(LeonardoAdapter::new(keys.leonardo.clone(), safety.clone()))
            }
        };

        let speech: Arc<dyn SpeechSynthesisService> = match config.tts_provider {
            TtsProvider::OpenAi => {
                Arc::new(OpenAiTtsAdapter::new(openai_client, &config.tts_model))
            }
            TtsProvider::ElevenLabs => Arc::new(ElevenLabsAdapter::new(keys.elevenlabs.clone())),
            TtsProvider::Browser => Arc::new(BrowserTtsAdapter),
        };

        for missing in missing_credentials(config) {
            warn!(
                "{} is not set; calls to the selected provider will fail until it is",
                missing
            );
        }
        info!(
            text = %config.text_provider,
            text_model = %config.text_model,
            image = %config.image_provider,
            tts = %config.tts_provider,
            "Providers selected"
        );

        Self {
            text,
            image,
            speech,
        }
    }

    pub fn gateway(&self) -> ContentGateway {
        ContentGateway::new(self.text.clone(), self.image.clone(), self.speech.clone())
    }
}

/// Credentials the selected providers need but the environment lacks.
pub fn missing_credentials(config: &Config) -> Vec<&'static str> {
    let keys = &config.api_keys;
    let mut needed: Vec<(&'static str, bool)> = Vec::new();

    match config.text_provider {
        TextProvider::OpenAi => needed.push(("OPENAI_API_KEY", keys.openai.is_some())),
        TextProvider::Anthropic => needed.push(("ANTHROPIC_API_KEY", keys.anthropic.is_some())),
        TextProvider::Google => needed.push(("GOOGLE_AI_API_KEY", keys.google.is_some())),
    }
    match config.image_provider {
        ImageProvider::Pollinations => {}
        ImageProvider::Dalle => needed.push(("OPENAI_API_KEY", keys.openai.is_some())),
        ImageProvider::Stability => needed.push(("STABILITY_API_KEY", keys.stability.is_some())),
        ImageProvider::Leonardo => needed.push(("LEONARDO_API_KEY", keys.leonardo.is_some())),
    }
    match config.tts_provider {
        TtsProvider::OpenAi => needed.push(("OPENAI_API_KEY", keys.openai.is_some())),
        TtsProvider::ElevenLabs => {
            needed.push(("ELEVENLABS_API_KEY", keys.elevenlabs.is_some()))
        }
        TtsProvider::Browser => {}
    }

    // A key shared by two classes is reported once.
    let missing: BTreeSet<&'static str> = needed
        .into_iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| name)
        .collect();
    missing.into_iter().collect()
}

/// Connects the document store, or falls back to process memory when no
/// database is configured.
pub async fn connect_storage(config: &Config) -> Result<Arc<dyn StorageService>, ApiError> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL is not set; using the in-memory store (nothing is persisted)");
        return Ok(Arc::new(MemoryStore::new()));
    };

    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    let db_adapter = DbAdapter::new(pool);
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");
    Ok(Arc::new(db_adapter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_source(|key| env.get(key).cloned()).unwrap()
    }

    #[test]
    fn registry_follows_configured_providers() {
        let registry = AdapterRegistry::from_config(&config(&[
            ("TEXT_PROVIDER", "anthropic"),
            ("IMAGE_PROVIDER", "leonardo"),
            ("TTS_PROVIDER", "elevenlabs"),
        ]));
        assert_eq!(registry.text.provider_name(), "anthropic");
        assert_eq!(registry.image.provider_name(), "leonardo");
        assert_eq!(registry.speech.provider_name(), "elevenlabs");
        assert_eq!(registry.speech.voices().len(), 5);
    }

    #[test]
    fn keyless_defaults_only_need_the_text_key() {
        assert_eq!(missing_credentials(&config(&[])), vec!["GOOGLE_AI_API_KEY"]);
        assert!(missing_credentials(&config(&[("GOOGLE_AI_API_KEY", "k")])).is_empty());
    }

    #[test]
    fn shared_openai_key_is_reported_once() {
        let missing = missing_credentials(&config(&[
            ("TEXT_PROVIDER", "openai"),
            ("IMAGE_PROVIDER", "dalle"),
            ("TTS_PROVIDER", "openai"),
        ]));
        assert_eq!(missing, vec!["OPENAI_API_KEY"]);
    }

    #[test]
    fn shared_key_is_reported_once_even_when_not_adjacent() {
        let missing = missing_credentials(&config(&[
            ("TEXT_PROVIDER", "openai"),
            ("IMAGE_PROVIDER", "stability"),
            ("TTS_PROVIDER", "openai"),
        ]));
        assert_eq!(missing, vec!["OPENAI_API_KEY", "STABILITY_API_KEY"]);
    }
}
