//! crates/vocab_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or wire format; the web layer
//! owns the JSON shapes sent to the browser.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::ports::PortError;

/// A JSON object as produced by a text model. Using the map type instead of a bare
/// `Value` guarantees that text results are always objects.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// The user id used when a client does not identify itself.
pub const DEFAULT_USER: &str = "anonymous";

//=========================================================================================
// Generation Requests
//=========================================================================================

/// The three kinds of content the gateway can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentClass {
    Text,
    Image,
    Speech,
}

impl ContentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentClass::Text => "text",
            ContentClass::Image => "image",
            ContentClass::Speech => "speech",
        }
    }
}

/// Identifies one fixed prompt-construction recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    WordInfo,
    Encyclopedia,
    ConceptTree,
    Episode,
    Examples,
    Scenario,
    Quiz,
    ImageWord,
    ImageIllustration,
    ImageEpisode,
    ImageGenerate,
    TtsSpeak,
}

impl TemplateId {
    pub const ALL: [TemplateId; 12] = [
        TemplateId::WordInfo,
        TemplateId::Encyclopedia,
        TemplateId::ConceptTree,
        TemplateId::Episode,
        TemplateId::Examples,
        TemplateId::Scenario,
        TemplateId::Quiz,
        TemplateId::ImageWord,
        TemplateId::ImageIllustration,
        TemplateId::ImageEpisode,
        TemplateId::ImageGenerate,
        TemplateId::TtsSpeak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::WordInfo => "word-info",
            TemplateId::Encyclopedia => "encyclopedia",
            TemplateId::ConceptTree => "concept-tree",
            TemplateId::Episode => "episode",
            TemplateId::Examples => "examples",
            TemplateId::Scenario => "scenario",
            TemplateId::Quiz => "quiz",
            TemplateId::ImageWord => "image-word",
            TemplateId::ImageIllustration => "image-illustration",
            TemplateId::ImageEpisode => "image-episode",
            TemplateId::ImageGenerate => "image-generate",
            TemplateId::TtsSpeak => "tts-speak",
        }
    }

    /// The content class every result of this template belongs to.
    pub fn class(&self) -> ContentClass {
        match self {
            TemplateId::WordInfo
            | TemplateId::Encyclopedia
            | TemplateId::ConceptTree
            | TemplateId::Episode
            | TemplateId::Examples
            | TemplateId::Scenario
            | TemplateId::Quiz => ContentClass::Text,
            TemplateId::ImageWord
            | TemplateId::ImageIllustration
            | TemplateId::ImageEpisode
            | TemplateId::ImageGenerate => ContentClass::Image,
            TemplateId::TtsSpeak => ContentClass::Speech,
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateId {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateId::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PortError::InvalidRequest(format!("unknown template '{}'", s)))
    }
}

/// A single generation call: which template to render and with what parameters.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub class: ContentClass,
    pub template: TemplateId,
    pub params: HashMap<String, String>,
}

impl GenerationRequest {
    pub fn new(template: TemplateId) -> Self {
        Self {
            class: template.class(),
            template,
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Returns a required, non-blank parameter.
    pub fn required(&self, name: &str) -> Result<&str, PortError> {
        match self.params.get(name).map(|v| v.trim()) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(PortError::InvalidRequest(format!(
                "template '{}' requires parameter '{}'",
                self.template, name
            ))),
        }
    }

    /// Returns an optional parameter, falling back to `default` when absent.
    pub fn optional<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.params.get(name).map(String::as_str).unwrap_or(default)
    }
}

/// The polymorphic result of a generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Text(JsonObject),
    Image(ImageOutput),
    Speech(SpeechOutput),
}

impl GenerationResult {
    pub fn class(&self) -> ContentClass {
        match self {
            GenerationResult::Text(_) => ContentClass::Text,
            GenerationResult::Image(_) => ContentClass::Image,
            GenerationResult::Speech(_) => ContentClass::Speech,
        }
    }
}

//=========================================================================================
// Text
//=========================================================================================

/// Whether a text call must come back as a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Json,
    PlainText,
}

/// Normalized output of a text adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum TextOutput {
    Json(JsonObject),
    Text(String),
}

//=========================================================================================
// Images
//=========================================================================================

/// Pixel dimensions parsed from a `"WxH"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const SQUARE_1024: ImageSize = ImageSize {
        width: 1024,
        height: 1024,
    };

    /// Caps each dimension at `max` instead of rejecting oversized requests.
    pub fn clamp(self, max: u32) -> Self {
        Self {
            width: self.width.min(max),
            height: self.height.min(max),
        }
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::SQUARE_1024
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ImageSize {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PortError::InvalidRequest(format!("invalid image size '{}'", s));
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

/// Input to an image adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub size: ImageSize,
    pub style: String,
}

impl ImageRequest {
    pub const DEFAULT_STYLE: &'static str = "vivid";

    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            size: ImageSize::default(),
            style: Self::DEFAULT_STYLE.to_string(),
        }
    }
}

/// Where the generated image can be found.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    Url(String),
    Inline { base64: String, content_type: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageOutput {
    pub provider: String,
    pub payload: ImagePayload,
    /// Some providers rewrite the prompt before rendering.
    pub revised_prompt: Option<String>,
}

//=========================================================================================
// Speech
//=========================================================================================

pub const DEFAULT_SPEECH_SPEED: f32 = 1.0;
pub const PRONUNCIATION_SPEED: f32 = 0.9;

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: Option<String>,
    pub speed: f32,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
            speed: DEFAULT_SPEECH_SPEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechOutput {
    /// Audio synthesized server-side.
    Audio {
        provider: String,
        audio_base64: String,
        content_type: String,
    },
    /// The caller should synthesize `text` locally.
    Deferred { text: String },
}

/// One entry of a provider's voice catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceOption {
    pub id: String,
    pub name: String,
}

impl VoiceOption {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

//=========================================================================================
// Persisted Records
//=========================================================================================

/// A word a user saved, keyed by (user, lowercased word).
#[derive(Debug, Clone, PartialEq)]
pub struct SavedWord {
    pub id: String,
    pub data: JsonObject,
    pub saved_at: DateTime<Utc>,
    pub is_learned: bool,
    pub learned_at: Option<DateTime<Utc>>,
}

/// An example sentence a user saved, keyed by (user, generated id).
#[derive(Debug, Clone, PartialEq)]
pub struct SavedExample {
    pub id: String,
    pub data: JsonObject,
    pub saved_at: DateTime<Utc>,
}

/// One search-history entry, keyed by (user, timestamp).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchEntry {
    pub word: String,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordSort {
    #[default]
    SavedAt,
    Word,
}

impl FromStr for WordSort {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "savedAt" => Ok(WordSort::SavedAt),
            "word" => Ok(WordSort::Word),
            other => Err(PortError::InvalidRequest(format!(
                "cannot sort saved words by '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(PortError::InvalidRequest(format!(
                "unknown sort order '{}'",
                other
            ))),
        }
    }
}

/// Filters and ordering for listing saved words.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordQuery {
    pub sort_by: WordSort,
    pub order: SortOrder,
    pub part_of_speech: Option<String>,
}

/// Upper bound on suffixed ids tried when examples collide within one millisecond.
pub const EXAMPLE_ID_ATTEMPTS: u32 = 16;

/// Builds the id of a saved example from its word and the save time.
///
/// `sequence` 0 gives `{word}_{millis}`; later values append `_{sequence}` so a
/// store can pick a fresh id when the plain one is already taken.
pub fn example_id(word: &str, at: DateTime<Utc>, sequence: u32) -> String {
    match sequence {
        0 => format!("{}_{}", word, at.timestamp_millis()),
        n => format!("{}_{}_{}", word, at.timestamp_millis(), n),
    }
}
