pub mod anthropic;
pub mod browser_tts;
pub mod dalle;
pub mod db;
pub mod elevenlabs;
pub mod gemini;
pub mod http;
pub mod leonardo;
pub mod memory;
pub mod openai;
pub mod openai_text;
pub mod pollinations;
pub mod registry;
pub mod safety;
pub mod stability;
pub mod tts;

pub use anthropic::AnthropicTextAdapter;
pub use browser_tts::BrowserTtsAdapter;
pub use dalle::DalleAdapter;
pub use db::DbAdapter;
pub use elevenlabs::ElevenLabsAdapter;
pub use gemini::GeminiTextAdapter;
pub use leonardo::LeonardoAdapter;
pub use memory::MemoryStore;
pub use openai_text::OpenAiTextAdapter;
pub use pollinations::PollinationsAdapter;
pub use registry::AdapterRegistry;
pub use safety::SafetyClassifier;
pub use stability::StabilityAdapter;
pub use tts::OpenAiTtsAdapter;
