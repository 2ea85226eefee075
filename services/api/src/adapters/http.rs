//! services/api/src/adapters/http.rs
//!
//! Shared plumbing for the adapters that talk to providers over plain `reqwest`.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use vocab_core::ports::{PortError, PortResult};

use super::safety::SafetyClassifier;

/// Client-wide timeout for provider calls that have no tighter bound of their own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Returns the key or a `MissingCredential` naming the variable to set.
pub fn require_key<'a>(key: &'a Option<String>, var: &str) -> PortResult<&'a str> {
    key.as_deref()
        .ok_or_else(|| PortError::MissingCredential(format!("{} is not set", var)))
}

/// Request URLs are stripped from the message; they may carry credentials.
pub fn transport_error(provider: &str, e: reqwest::Error) -> PortError {
    PortError::UpstreamFailure(format!("{} request failed: {}", provider, e.without_url()))
}

/// Passes successful responses through. Error responses become `UpstreamFailure`,
/// or `SafetyRejection` when a classifier is given and recognizes the body.
pub async fn check_status(
    provider: &str,
    response: Response,
    safety: Option<&SafetyClassifier>,
) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if safety.map(|s| s.is_refusal(&body)).unwrap_or(false) {
        return Err(PortError::SafetyRejection(format!("{}: {}", provider, body)));
    }
    Err(PortError::UpstreamFailure(format!(
        "{} returned {}: {}",
        provider, status, body
    )))
}

pub async fn read_json<T: DeserializeOwned>(provider: &str, response: Response) -> PortResult<T> {
    response.json::<T>().await.map_err(|e| {
        PortError::MalformedResponse(format!(
            "{} response has an unexpected shape: {}",
            provider,
            e.without_url()
        ))
    })
}
