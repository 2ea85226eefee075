//! services/api/src/adapters/browser_tts.rs
//!
//! The defer-to-caller speech family: nothing is synthesized server-side.

use async_trait::async_trait;
use vocab_core::{
    domain::{SpeechOutput, SpeechRequest, VoiceOption},
    ports::{PortResult, SpeechSynthesisService},
};

#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTtsAdapter;

#[async_trait]
impl SpeechSynthesisService for BrowserTtsAdapter {
    fn provider_name(&self) -> &'static str {
        "browser"
    }

    fn voices(&self) -> Vec<VoiceOption> {
        vec![VoiceOption::new("browser", "브라우저 기본 음성")]
    }

    async fn synthesize(&self, request: &SpeechRequest) -> PortResult<SpeechOutput> {
        Ok(SpeechOutput::Deferred {
            text: request.text.clone(),
        })
    }
}
