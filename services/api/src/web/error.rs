//! services/api/src/web/error.rs
//!
//! How failures leave the HTTP surface. Every error body is JSON with an
//! `error` field; the Korean messages are what the frontend shows verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;
use vocab_core::{domain::JsonObject, ports::PortError};

pub const NOT_FOUND_MESSAGE: &str = "요청한 리소스를 찾을 수 없습니다.";
pub const SAFETY_MESSAGE: &str = "안전 정책으로 인해 이미지를 생성할 수 없습니다.";
pub const RATE_LIMIT_MESSAGE: &str = "요청이 너무 많습니다. 잠시 후 다시 시도해주세요.";

#[derive(Debug)]
pub enum HttpError {
    /// 400 with a caller-facing message.
    BadRequest(String),
    /// 404 for unknown routes and records.
    NotFound,
    /// 404 carrying the model's own `{"error": true, ...}` answer.
    SemanticMiss(JsonObject),
    /// 422 when the image provider refused the prompt.
    SafetyRejected,
    /// 429 from the rate limiter.
    TooManyRequests,
    /// 500; `detail` is only populated in development.
    Internal {
        message: &'static str,
        detail: Option<String>,
    },
}

impl HttpError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError::BadRequest(message.into())
    }

    pub fn from_port(err: PortError, public: &'static str, development: bool) -> Self {
        match err {
            PortError::InvalidRequest(message) => HttpError::BadRequest(message),
            PortError::NotFound(_) => HttpError::NotFound,
            PortError::SafetyRejection(reason) => {
                tracing::warn!(%reason, "Image prompt rejected by provider safety policy");
                HttpError::SafetyRejected
            }
            other => {
                error!("{} ({})", public, other);
                HttpError::Internal {
                    message: public,
                    detail: development.then(|| other.to_string()),
                }
            }
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            HttpError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            HttpError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": NOT_FOUND_MESSAGE })),
            HttpError::SemanticMiss(body) => {
                (StatusCode::NOT_FOUND, serde_json::Value::Object(body))
            }
            HttpError::SafetyRejected => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": true, "message": SAFETY_MESSAGE }),
            ),
            HttpError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": RATE_LIMIT_MESSAGE }),
            ),
            HttpError::Internal { message, detail } => {
                let body = match detail {
                    Some(detail) => json!({ "error": message, "message": detail }),
                    None => json!({ "error": message }),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };
        (status, Json(body)).into_response()
    }
}
