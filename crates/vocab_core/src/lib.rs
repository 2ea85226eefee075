pub mod domain;
pub mod gateway;
pub mod ports;
pub mod prompts;
pub mod structured;

pub use domain::{
    ContentClass, GenerationRequest, GenerationResult, ImageOutput, ImagePayload, ImageRequest,
    ImageSize, JsonObject, ResponseMode, SavedExample, SavedWord, SearchEntry, SortOrder,
    SpeechOutput, SpeechRequest, TemplateId, TextOutput, VoiceOption, WordQuery, WordSort,
};
pub use gateway::{is_semantic_miss, ContentGateway};
pub use ports::{
    ImageGenerationService, PortError, PortResult, SpeechSynthesisService, StorageService,
    TextGenerationService,
};
