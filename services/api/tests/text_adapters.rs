use api_lib::adapters::{
    anthropic::AnthropicTextAdapter, gemini::GeminiTextAdapter, openai,
    openai_text::OpenAiTextAdapter,
};
use serde_json::json;
use vocab_core::{
    domain::{ResponseMode, TextOutput},
    ports::{PortError, TextGenerationService},
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn openai_adapter(server: &MockServer) -> OpenAiTextAdapter {
    let client = openai::client(Some("test_key"), Some(&server.uri()));
    OpenAiTextAdapter::new(client, "gpt-4o-mini".to_string())
}

//=========================================================================================
// OpenAI (native JSON mode)
//=========================================================================================

#[tokio::test]
async fn openai_json_mode_returns_the_parsed_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test_key"))
        .and(body_partial_json(json!({ "response_format": { "type": "json_object" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            r#"{"word":"run","pronunciation":"/rʌn/","coreMeanings":[{"meaning":"달리다"}]}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let output = openai_adapter(&server)
        .generate("system", "user", ResponseMode::Json)
        .await
        .unwrap();

    match output {
        TextOutput::Json(object) => {
            assert_eq!(object["word"], json!("run"));
            assert_eq!(object["coreMeanings"][0]["meaning"], json!("달리다"));
        }
        other => panic!("expected JSON, got {:?}", other),
    }
}

#[tokio::test]
async fn openai_truncated_json_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_completion(r#"{"word":"run","core"#)),
        )
        .mount(&server)
        .await;

    let err = openai_adapter(&server)
        .generate("system", "user", ResponseMode::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::MalformedResponse(_)), "{:?}", err);
}

#[tokio::test]
async fn openai_client_errors_are_upstream_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "param": null,
                "code": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    let err = openai_adapter(&server)
        .generate("system", "user", ResponseMode::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::UpstreamFailure(_)), "{:?}", err);
}

#[tokio::test]
async fn openai_without_key_fails_before_any_request() {
    let adapter = OpenAiTextAdapter::new(None, "gpt-4o-mini".to_string());
    let err = adapter
        .generate("system", "user", ResponseMode::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::MissingCredential(_)));
}

//=========================================================================================
// Anthropic (extracted JSON)
//=========================================================================================

fn anthropic_reply(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn"
    })
}

#[tokio::test]
async fn anthropic_extracts_json_from_surrounding_prose() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test_key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({ "system": "system", "model": "claude-3-5-sonnet-latest" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_reply(
            "Here is the result:\n```json\n{\"word\": \"run\", \"note\": \"uses {braces}\"}\n```\nEnjoy!",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = AnthropicTextAdapter::with_base_url(
        Some("test_key".to_string()),
        "claude-3-5-sonnet-latest".to_string(),
        &server.uri(),
    );
    let output = adapter
        .generate("system", "user", ResponseMode::Json)
        .await
        .unwrap();

    match output {
        TextOutput::Json(object) => {
            assert_eq!(object["word"], json!("run"));
            assert_eq!(object["note"], json!("uses {braces}"));
        }
        other => panic!("expected JSON, got {:?}", other),
    }
}

#[tokio::test]
async fn anthropic_reply_without_json_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(anthropic_reply("I cannot help with that.")),
        )
        .mount(&server)
        .await;

    let adapter = AnthropicTextAdapter::with_base_url(
        Some("test_key".to_string()),
        "claude-3-5-sonnet-latest".to_string(),
        &server.uri(),
    );
    let err = adapter
        .generate("system", "user", ResponseMode::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::MalformedResponse(_)), "{:?}", err);
}

#[tokio::test]
async fn anthropic_plain_text_mode_returns_the_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_reply("Hello there.")))
        .mount(&server)
        .await;

    let adapter = AnthropicTextAdapter::with_base_url(
        Some("test_key".to_string()),
        "claude-3-5-sonnet-latest".to_string(),
        &server.uri(),
    );
    let output = adapter
        .generate("system", "user", ResponseMode::PlainText)
        .await
        .unwrap();
    assert_eq!(output, TextOutput::Text("Hello there.".to_string()));
}

#[tokio::test]
async fn anthropic_http_errors_are_upstream_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let adapter = AnthropicTextAdapter::with_base_url(
        Some("test_key".to_string()),
        "claude-3-5-sonnet-latest".to_string(),
        &server.uri(),
    );
    let err = adapter
        .generate("system", "user", ResponseMode::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::UpstreamFailure(_)), "{:?}", err);
}

#[tokio::test]
async fn anthropic_without_key_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = AnthropicTextAdapter::with_base_url(
        None,
        "claude-3-5-sonnet-latest".to_string(),
        &server.uri(),
    );
    let err = adapter
        .generate("system", "user", ResponseMode::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::MissingCredential(_)));
}

//=========================================================================================
// Gemini (single prompt, extracted JSON)
//=========================================================================================

#[tokio::test]
async fn gemini_joins_candidate_parts_before_extracting() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "```json\n{\"word\": \"run\"," },
                        { "text": " \"partOfSpeech\": [\"verb\"]}\n```" }
                    ]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = GeminiTextAdapter::with_base_url(
        Some("test_key".to_string()),
        "gemini-2.5-flash".to_string(),
        &server.uri(),
    );
    let output = adapter
        .generate("system", "user", ResponseMode::Json)
        .await
        .unwrap();

    match output {
        TextOutput::Json(object) => {
            assert_eq!(object["word"], json!("run"));
            assert_eq!(object["partOfSpeech"], json!(["verb"]));
        }
        other => panic!("expected JSON, got {:?}", other),
    }
}

#[tokio::test]
async fn gemini_without_candidates_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let adapter = GeminiTextAdapter::with_base_url(
        Some("test_key".to_string()),
        "gemini-2.5-flash".to_string(),
        &server.uri(),
    );
    let err = adapter
        .generate("system", "user", ResponseMode::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::MalformedResponse(_)), "{:?}", err);
}

#[tokio::test]
async fn gemini_errors_never_carry_the_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let adapter = GeminiTextAdapter::with_base_url(
        Some("SECRET-KEY-123".to_string()),
        "gemini-2.5-flash".to_string(),
        &server.uri(),
    );
    let err = adapter
        .generate("system", "user", ResponseMode::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::MalformedResponse(_)), "{:?}", err);
    assert!(!err.to_string().contains("SECRET-KEY-123"), "{}", err);

    // Nothing listens on the discard port, so the request fails to connect.
    let unreachable = GeminiTextAdapter::with_base_url(
        Some("SECRET-KEY-123".to_string()),
        "gemini-2.5-flash".to_string(),
        "http://127.0.0.1:9",
    );
    let err = unreachable
        .generate("system", "user", ResponseMode::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::UpstreamFailure(_)), "{:?}", err);
    assert!(!err.to_string().contains("SECRET-KEY-123"), "{}", err);
}
