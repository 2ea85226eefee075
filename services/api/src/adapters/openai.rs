//! services/api/src/adapters/openai.rs
//!
//! Client construction and error translation shared by every adapter that goes
//! through `async-openai` (chat, DALL·E and speech).

use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use vocab_core::ports::{PortError, PortResult};

use super::safety::SafetyClassifier;

/// Builds a client when a key is configured. `api_base` overrides the public endpoint.
pub fn client(api_key: Option<&str>, api_base: Option<&str>) -> Option<Client<OpenAIConfig>> {
    let api_key = api_key?;
    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }
    Some(Client::with_config(config))
}

pub fn require_client(
    client: &Option<Client<OpenAIConfig>>,
) -> PortResult<&Client<OpenAIConfig>> {
    client
        .as_ref()
        .ok_or_else(|| PortError::MissingCredential("OPENAI_API_KEY is not set".to_string()))
}

/// Translates an `async-openai` failure into the port taxonomy.
pub fn map_error(e: OpenAIError, safety: Option<&SafetyClassifier>) -> PortError {
    match e {
        OpenAIError::ApiError(api) => {
            let refusal = safety
                .map(|s| {
                    s.is_refusal(&api.message)
                        || api.code.as_deref().map(|c| s.is_refusal(c)).unwrap_or(false)
                })
                .unwrap_or(false);
            if refusal {
                PortError::SafetyRejection(api.message)
            } else {
                PortError::UpstreamFailure(format!("OpenAI API error: {}", api))
            }
        }
        OpenAIError::JSONDeserialize(err, _) => {
            PortError::MalformedResponse(format!("OpenAI response has an unexpected shape: {}", err))
        }
        OpenAIError::InvalidArgument(msg) => PortError::InvalidRequest(msg),
        other => PortError::UpstreamFailure(other.to_string()),
    }
}
