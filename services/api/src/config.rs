//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

//=========================================================================================
// Provider Selection
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextProvider {
    OpenAi,
    Anthropic,
    Google,
}

impl TextProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextProvider::OpenAi => "openai",
            TextProvider::Anthropic => "anthropic",
            TextProvider::Google => "google",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            TextProvider::OpenAi => "gpt-4o-mini",
            TextProvider::Anthropic => "claude-3-5-sonnet-latest",
            TextProvider::Google => "gemini-2.5-flash",
        }
    }
}

impl FromStr for TextProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(TextProvider::OpenAi),
            "anthropic" => Ok(TextProvider::Anthropic),
            "google" | "gemini" => Ok(TextProvider::Google),
            other => Err(format!(
                "'{}' is not one of openai, anthropic, google",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageProvider {
    Pollinations,
    Dalle,
    Stability,
    Leonardo,
}

impl ImageProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageProvider::Pollinations => "pollinations",
            ImageProvider::Dalle => "dalle",
            ImageProvider::Stability => "stability",
            ImageProvider::Leonardo => "leonardo",
        }
    }
}

impl FromStr for ImageProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pollinations" => Ok(ImageProvider::Pollinations),
            "dalle" => Ok(ImageProvider::Dalle),
            "stability" => Ok(ImageProvider::Stability),
            "leonardo" => Ok(ImageProvider::Leonardo),
            other => Err(format!(
                "'{}' is not one of pollinations, dalle, stability, leonardo",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsProvider {
    OpenAi,
    ElevenLabs,
    Browser,
}

impl TtsProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsProvider::OpenAi => "openai",
            TtsProvider::ElevenLabs => "elevenlabs",
            TtsProvider::Browser => "browser",
        }
    }
}

impl FromStr for TtsProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(TtsProvider::OpenAi),
            "elevenlabs" => Ok(TtsProvider::ElevenLabs),
            "browser" => Ok(TtsProvider::Browser),
            other => Err(format!(
                "'{}' is not one of openai, elevenlabs, browser",
                other
            )),
        }
    }
}

macro_rules! display_as_str {
    ($($t:ty),*) => {$(
        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )*};
}

display_as_str!(TextProvider, ImageProvider, TtsProvider);

//=========================================================================================
// Config
//=========================================================================================

/// Provider credentials. Every key is optional; adapters report a missing key
/// when they are actually called.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub google: Option<String>,
    pub stability: Option<String>,
    pub leonardo: Option<String>,
    pub elevenlabs: Option<String>,
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |k: &Option<String>| if k.is_some() { "set" } else { "unset" };
        f.debug_struct("ApiKeys")
            .field("openai", &mark(&self.openai))
            .field("anthropic", &mark(&self.anthropic))
            .field("google", &mark(&self.google))
            .field("stability", &mark(&self.stability))
            .field("leonardo", &mark(&self.leonardo))
            .field("elevenlabs", &mark(&self.elevenlabs))
            .finish()
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Postgres connection string; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub log_level: Level,
    /// `APP_ENV=development` adds diagnostic detail to 500 responses.
    pub development: bool,
    pub text_provider: TextProvider,
    pub text_model: String,
    pub image_provider: ImageProvider,
    pub image_model: String,
    pub tts_provider: TtsProvider,
    pub tts_model: String,
    pub api_keys: ApiKeys,
    /// Requests per minute per client IP on `/api`.
    pub rate_limit_max: u32,
    pub safety_phrases: Vec<String>,
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // --- Load Server and Database Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3001".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = var("DATABASE_URL");

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let development = var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("development"))
            .unwrap_or(false);

        // --- Load Provider Selection ---
        let text_provider: TextProvider = parse_var(&var, "TEXT_PROVIDER", "google")?;
        let text_model =
            var("TEXT_MODEL").unwrap_or_else(|| text_provider.default_model().to_string());
        let image_provider: ImageProvider = parse_var(&var, "IMAGE_PROVIDER", "pollinations")?;
        let image_model = var("IMAGE_MODEL").unwrap_or_else(|| "dall-e-3".to_string());
        let tts_provider: TtsProvider = parse_var(&var, "TTS_PROVIDER", "browser")?;
        let tts_model = var("TTS_MODEL").unwrap_or_else(|| "tts-1".to_string());

        // --- Load API Keys (as optional) ---
        let api_keys = ApiKeys {
            openai: var("OPENAI_API_KEY"),
            anthropic: var("ANTHROPIC_API_KEY"),
            google: var("GOOGLE_AI_API_KEY"),
            stability: var("STABILITY_API_KEY"),
            leonardo: var("LEONARDO_API_KEY"),
            elevenlabs: var("ELEVENLABS_API_KEY"),
        };

        // --- Load HTTP Surface Settings ---
        let rate_limit_max: u32 = parse_var(&var, "RATE_LIMIT_MAX", "60")?;
        if rate_limit_max == 0 {
            return Err(ConfigError::InvalidValue(
                "RATE_LIMIT_MAX".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let safety_phrases: Vec<String> = var("SAFETY_PHRASES")
            .unwrap_or_else(|| "safety,policy,content_policy".to_string())
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        let cors_allowed_origin = var("CORS_ALLOWED_ORIGIN");

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            development,
            text_provider,
            text_model,
            image_provider,
            image_model,
            tts_provider,
            tts_model,
            api_keys,
            rate_limit_max,
            safety_phrases,
            cors_allowed_origin,
        })
    }
}

fn parse_var<T, F>(var: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = var(key).unwrap_or_else(|| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}
