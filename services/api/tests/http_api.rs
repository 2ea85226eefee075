use api_lib::{
    adapters::{browser_tts::BrowserTtsAdapter, memory::MemoryStore},
    config::Config,
    web::{router, state::AppState},
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tower::ServiceExt;
use vocab_core::{
    domain::{ImageOutput, ImagePayload, ImageRequest, JsonObject, ResponseMode, TextOutput},
    gateway::ContentGateway,
    ports::{ImageGenerationService, PortError, PortResult, TextGenerationService},
};

//=========================================================================================
// Fakes
//=========================================================================================

/// Answers every text template with the same object and counts the calls.
struct CannedText {
    reply: JsonObject,
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerationService for CannedText {
    fn provider_name(&self) -> &'static str {
        "canned"
    }

    async fn generate(&self, _: &str, _: &str, _: ResponseMode) -> PortResult<TextOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TextOutput::Json(self.reply.clone()))
    }
}

enum ImageBehavior {
    Url,
    Refuse,
    Fail,
}

struct FakeImage(ImageBehavior);

#[async_trait]
impl ImageGenerationService for FakeImage {
    fn provider_name(&self) -> &'static str {
        "fake-image"
    }

    async fn generate_image(&self, request: &ImageRequest) -> PortResult<ImageOutput> {
        match self.0 {
            ImageBehavior::Url => Ok(ImageOutput {
                provider: "fake-image".to_string(),
                payload: ImagePayload::Url(format!("https://img.test/{}", request.size)),
                revised_prompt: None,
            }),
            ImageBehavior::Refuse => Err(PortError::SafetyRejection("policy".to_string())),
            ImageBehavior::Fail => Err(PortError::UpstreamFailure("boom".to_string())),
        }
    }
}

struct TestApp {
    router: Router,
    text: Arc<CannedText>,
}

fn object(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

fn app_with(reply: Value, image: ImageBehavior, env: &[(&str, &str)]) -> TestApp {
    let env: HashMap<String, String> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let config = Config::from_source(|key| env.get(key).cloned()).unwrap();

    let text = Arc::new(CannedText {
        reply: object(reply),
        calls: AtomicUsize::new(0),
    });
    let gateway = ContentGateway::new(
        text.clone(),
        Arc::new(FakeImage(image)),
        Arc::new(BrowserTtsAdapter),
    );
    let state = AppState::new(gateway, Arc::new(MemoryStore::new()), Arc::new(config));
    TestApp {
        router: router(Arc::new(state)),
        text,
    }
}

fn app(reply: Value) -> TestApp {
    app_with(reply, ImageBehavior::Url, &[])
}

fn word_info() -> Value {
    json!({
        "word": "run",
        "pronunciation": "/rʌn/",
        "partOfSpeech": ["verb", "noun"],
        "coreMeanings": [{ "meaning": "달리다", "partOfSpeech": "verb" }]
    })
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send_raw(
    router: &Router,
    uri: &str,
    content_type: Option<&str>,
    body: &'static str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    let response = router
        .clone()
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

//=========================================================================================
// Word Content
//=========================================================================================

#[tokio::test]
async fn word_search_returns_the_model_document() {
    let app = app(word_info());
    let (status, body) = send(&app.router, Method::GET, "/api/word/search?q=%20run%20", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["word"], json!("run"));
    assert_eq!(body["pronunciation"], json!("/rʌn/"));
    assert!(!body["coreMeanings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn word_search_miss_is_404_with_the_model_body() {
    let app = app(json!({ "error": true, "message": "영어 단어가 아닙니다." }));
    let (status, body) = send(&app.router, Method::GET, "/api/word/search?q=asdfgh", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": true, "message": "영어 단어가 아닙니다." }));
}

#[tokio::test]
async fn word_search_requires_a_term() {
    let app = app(word_info());
    let (status, body) = send(&app.router, Method::GET, "/api/word/search?q=%20%20", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("검색어를 입력해주세요."));
    assert_eq!(app.text.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn word_search_does_not_touch_storage() {
    let app = app(word_info());
    send(&app.router, Method::GET, "/api/word/search?q=run", None).await;

    let (_, saved) = send(&app.router, Method::GET, "/api/word/saved", None).await;
    let (_, history) = send(&app.router, Method::GET, "/api/storage/history", None).await;
    assert_eq!(saved, json!({ "words": [] }));
    assert_eq!(history, json!({ "history": [] }));
}

#[tokio::test]
async fn word_content_endpoints_require_word_and_meaning() {
    let app = app(json!({ "title": "t" }));
    for endpoint in ["encyclopedia", "concept-tree", "episode", "examples", "scenario"] {
        let (status, body) = send(
            &app.router,
            Method::GET,
            &format!("/api/word/{}?word=run", endpoint),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", endpoint);
        assert_eq!(body["error"], json!("단어와 의미가 필요합니다."));
    }

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/api/word/episode?word=run&meaning=%EB%8B%AC%EB%A6%AC%EB%8B%A4",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], json!("t"));
}

#[tokio::test]
async fn quiz_needs_meanings_and_returns_the_quizzes() {
    let quizzes: Vec<Value> = (1..=5)
        .map(|id| {
            json!({
                "id": id,
                "question": "I _____ every morning.",
                "answer": "run",
                "difficulty": (["easy", "medium", "hard"][id % 3])
            })
        })
        .collect();
    let app = app(json!({ "quizzes": quizzes }));

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/word/quiz",
        Some(json!({ "word": "run", "meanings": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/word/quiz",
        Some(json!({ "word": "run", "meanings": ["달리다", "운영하다"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let quizzes = body["quizzes"].as_array().unwrap();
    assert_eq!(quizzes.len(), 5);
    for quiz in quizzes {
        assert!(quiz["question"].is_string());
        assert!(quiz["answer"].is_string());
        assert!(["easy", "medium", "hard"].contains(&quiz["difficulty"].as_str().unwrap()));
    }
}

//=========================================================================================
// Images
//=========================================================================================

#[tokio::test]
async fn image_endpoints_return_the_provider_payload() {
    let app = app(json!({}));
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/image/word",
        Some(json!({ "word": "run", "meaning": "달리다" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "url": "https://img.test/1024x1024", "provider": "fake-image" }));

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/image/generate",
        Some(json!({ "prompt": "a cat", "size": "512x768" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], json!("https://img.test/512x768"));
}

#[tokio::test]
async fn invalid_image_size_is_a_bad_request() {
    let app = app(json!({}));
    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/image/generate",
        Some(json!({ "prompt": "a cat", "size": "huge" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn safety_rejection_is_422() {
    let app = app_with(json!({}), ImageBehavior::Refuse, &[]);
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/image/illustration",
        Some(json!({ "word": "run", "meaning": "달리다" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({ "error": true, "message": "안전 정책으로 인해 이미지를 생성할 수 없습니다." })
    );
}

#[tokio::test]
async fn upstream_failures_are_500_with_detail_only_in_development() {
    let request = json!({ "title": "The Race", "storyContext": "a fox runs" });

    let app = app_with(json!({}), ImageBehavior::Fail, &[]);
    let (status, body) =
        send(&app.router, Method::POST, "/api/image/episode", Some(request.clone())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "이미지를 생성하는 중 오류가 발생했습니다." }));

    let app = app_with(json!({}), ImageBehavior::Fail, &[("APP_ENV", "development")]);
    let (_, body) = send(&app.router, Method::POST, "/api/image/episode", Some(request)).await;
    assert!(body["message"].as_str().unwrap().contains("boom"));
}

//=========================================================================================
// Speech
//=========================================================================================

#[tokio::test]
async fn browser_speech_is_deferred_to_the_client() {
    let app = app(json!({}));
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/tts/speak",
        Some(json!({ "text": "Hello there" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "provider": "browser", "text": "Hello there" }));

    let (status, body) = send(&app.router, Method::GET, "/api/tts/word/run", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], json!("run"));

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/tts/sentence",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("문장이 필요합니다."));
}

#[tokio::test]
async fn blank_speech_text_is_rejected() {
    let app = app(json!({}));
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/tts/speak",
        Some(json!({ "text": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("텍스트가 필요합니다."));
}

#[tokio::test]
async fn tts_config_lists_the_voice_catalog() {
    let app = app(json!({}));
    let (status, body) = send(&app.router, Method::GET, "/api/tts/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "provider": "browser",
            "availableVoices": [{ "id": "browser", "name": "브라우저 기본 음성" }]
        })
    );
}

//=========================================================================================
// Storage
//=========================================================================================

#[tokio::test]
async fn saved_words_round_trip() {
    let app = app(json!({}));
    let word = word_info();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/word/save",
        Some(json!({ "userId": "u1", "wordData": word })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (_, body) = send(&app.router, Method::GET, "/api/word/saved?userId=u1", None).await;
    let saved = &body["words"][0];
    assert_eq!(saved["id"], json!("run"));
    assert_eq!(saved["coreMeanings"], word["coreMeanings"]);
    assert_eq!(saved["isLearned"], json!(false));

    let (status, _) = send(
        &app.router,
        Method::PATCH,
        "/api/word/learned",
        Some(json!({ "userId": "u1", "word": "run" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app.router, Method::GET, "/api/word/saved?userId=u1", None).await;
    assert_eq!(body["words"][0]["isLearned"], json!(true));
    assert!(body["words"][0]["learnedAt"].is_string());

    let (status, _) = send(&app.router, Method::DELETE, "/api/word/run?userId=u1", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app.router, Method::GET, "/api/word/saved?userId=u1", None).await;
    assert_eq!(body, json!({ "words": [] }));
}

#[tokio::test]
async fn saving_requires_word_data_and_learning_requires_a_saved_word() {
    let app = app(json!({}));
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/word/save",
        Some(json!({ "wordData": { "pronunciation": "/x/" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("저장할 단어 정보가 필요합니다."));

    let (status, _) = send(
        &app.router,
        Method::PATCH,
        "/api/word/learned",
        Some(json!({ "word": "ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app.router, Method::GET, "/api/word/saved?sortBy=color", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn examples_and_history_default_to_the_anonymous_user() {
    let app = app(json!({}));
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/storage/example",
        Some(json!({ "example": { "word": "run", "sentence": "I **run** daily." } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["id"].as_str().unwrap().starts_with("run_"));

    let (_, body) = send(&app.router, Method::GET, "/api/storage/examples?userId=anonymous", None).await;
    assert_eq!(body["examples"][0]["sentence"], json!("I **run** daily."));

    for word in ["run", "Walk", "jump"] {
        send(
            &app.router,
            Method::POST,
            "/api/storage/history",
            Some(json!({ "word": word })),
        )
        .await;
    }
    let (_, body) = send(&app.router, Method::GET, "/api/storage/history?limit=2", None).await;
    let words: Vec<&str> = body["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["word"].as_str().unwrap())
        .collect();
    assert_eq!(words, vec!["jump", "walk"]);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/storage/example",
        Some(json!({ "example": { "word": "run" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("예문 정보가 필요합니다."));
}

//=========================================================================================
// Service Endpoints and Middleware
//=========================================================================================

#[tokio::test]
async fn health_and_config_report_providers() {
    let app = app(json!({}));
    let (status, body) = send(&app.router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert!(body["timestamp"].is_string());
    assert_eq!(
        body["providers"],
        json!({ "text": "canned", "image": "fake-image", "tts": "browser" })
    );

    let (_, body) = send(&app.router, Method::GET, "/api/config", None).await;
    assert_eq!(
        body,
        json!({ "textProvider": "google", "imageProvider": "pollinations", "ttsProvider": "browser" })
    );
}

#[tokio::test]
async fn unknown_routes_are_json_404s() {
    let app = app(json!({}));
    let (status, body) = send(&app.router, Method::GET, "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "요청한 리소스를 찾을 수 없습니다." }));
}

#[tokio::test]
async fn api_routes_are_rate_limited() {
    let app = app_with(json!({}), ImageBehavior::Url, &[("RATE_LIMIT_MAX", "2")]);
    for _ in 0..2 {
        let (status, _) = send(&app.router, Method::GET, "/api/config", None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(&app.router, Method::GET, "/api/config", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body,
        json!({ "error": "요청이 너무 많습니다. 잠시 후 다시 시도해주세요." })
    );

    // Health checks are outside the limiter.
    let (status, _) = send(&app.router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app(json!({}));
    let (status, body) = send(&app.router, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/word/search"].is_object());
    assert!(body["paths"]["/api/storage/history"]["get"].is_object());
}

//=========================================================================================
// Malformed Input
//=========================================================================================

#[tokio::test]
async fn unparsable_bodies_are_json_400s() {
    let app = app(json!({}));

    let (status, body) = send_raw(
        &app.router,
        "/api/word/quiz",
        Some("application/json"),
        "{not json",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send_raw(
        &app.router,
        "/api/word/quiz",
        None,
        r#"{"word":"run","meanings":["달리다"]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(app.text.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn mistyped_image_fields_are_not_mistaken_for_safety_rejections() {
    let app = app(json!({}));
    let (status, body) = send_raw(
        &app.router,
        "/api/image/word",
        Some("application/json"),
        r#"{"word":"run","meaning":"달리다","isComplex":"yes"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn unparsable_query_strings_are_json_400s() {
    let app = app(json!({}));
    let (status, body) = send(&app.router, Method::GET, "/api/storage/history?limit=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn non_positive_speech_speed_is_a_bad_request() {
    let app = app(json!({}));
    for speed in [0.0, -1.5] {
        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/tts/speak",
            Some(json!({ "text": "Hello", "speed": speed })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("speed"));
    }
}
