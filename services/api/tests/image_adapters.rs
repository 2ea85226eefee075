use api_lib::adapters::{
    dalle::DalleAdapter, leonardo::LeonardoAdapter, openai, pollinations::PollinationsAdapter,
    safety::SafetyClassifier, stability::StabilityAdapter,
};
use serde_json::json;
use std::time::Duration;
use vocab_core::{
    domain::{ImagePayload, ImageRequest, ImageSize},
    ports::{ImageGenerationService, PortError},
};
use wiremock::matchers::{body_partial_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(prompt: &str, size: &str) -> ImageRequest {
    let mut request = ImageRequest::new(prompt);
    request.size = size.parse::<ImageSize>().unwrap();
    request
}

//=========================================================================================
// Pollinations (keyless URL pattern)
//=========================================================================================

#[tokio::test]
async fn pollinations_returns_the_encoded_url_after_probing() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path_regex("^/prompt/.+"))
        .and(query_param("width", "512"))
        .and(query_param("height", "768"))
        .and(query_param("nologo", "true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = PollinationsAdapter::with_base_url(&server.uri());
    let output = adapter
        .generate_image(&request("a red apple", "512x768"))
        .await
        .unwrap();

    assert_eq!(output.provider, "pollinations");
    match output.payload {
        ImagePayload::Url(url) => {
            assert!(url.starts_with(&format!("{}/prompt/a%20red%20apple", server.uri())));
            assert!(url.ends_with("?width=512&height=768&nologo=true"));
        }
        other => panic!("expected a URL, got {:?}", other),
    }
}

#[tokio::test]
async fn pollinations_probe_failure_is_ignored() {
    // Nothing listens on the discard port, so the probe fails to connect.
    let adapter = PollinationsAdapter::with_base_url("http://127.0.0.1:9");
    let output = adapter
        .generate_image(&ImageRequest::new("a cat"))
        .await
        .unwrap();
    assert!(matches!(output.payload, ImagePayload::Url(_)));
}

//=========================================================================================
// Stability (paid synchronous, inline)
//=========================================================================================

#[tokio::test]
async fn stability_clamps_the_size_and_returns_inline_png() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/generation/stable-diffusion-xl-1024-v1-0/text-to-image"))
        .and(header("Authorization", "Bearer test_key"))
        .and(body_partial_json(json!({ "width": 1024, "height": 1024, "samples": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artifacts": [{ "base64": "iVBORw0KGgo=", "seed": 1, "finishReason": "SUCCESS" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = StabilityAdapter::with_base_url(
        Some("test_key".to_string()),
        SafetyClassifier::default(),
        &server.uri(),
    );
    let output = adapter
        .generate_image(&request("a lighthouse", "2048x1536"))
        .await
        .unwrap();

    assert_eq!(
        output.payload,
        ImagePayload::Inline {
            base64: "iVBORw0KGgo=".to_string(),
            content_type: "image/png".to_string(),
        }
    );
}

#[tokio::test]
async fn stability_safety_refusal_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "name": "invalid_prompts",
            "message": "Your prompt was flagged by our content policy"
        })))
        .mount(&server)
        .await;

    let adapter = StabilityAdapter::with_base_url(
        Some("test_key".to_string()),
        SafetyClassifier::default(),
        &server.uri(),
    );
    let err = adapter
        .generate_image(&ImageRequest::new("something"))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::SafetyRejection(_)), "{:?}", err);
}

#[tokio::test]
async fn stability_without_key_is_missing_credential() {
    let adapter =
        StabilityAdapter::with_base_url(None, SafetyClassifier::default(), "http://127.0.0.1:9");
    let err = adapter
        .generate_image(&ImageRequest::new("something"))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::MissingCredential(_)));
}

//=========================================================================================
// Leonardo (async job polling)
//=========================================================================================

fn leonardo(server: &MockServer, attempts: u32) -> LeonardoAdapter {
    LeonardoAdapter::with_base_url(
        Some("test_key".to_string()),
        SafetyClassifier::default(),
        &server.uri(),
    )
    .with_polling(Duration::from_millis(10), attempts)
}

async fn mount_job_creation(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/generations"))
        .and(header("Authorization", "Bearer test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sdGenerationJob": { "generationId": "gen-1", "apiCreditCost": 8 }
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn leonardo_polls_until_complete() {
    let server = MockServer::start().await;
    mount_job_creation(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/generations/gen-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "generations_by_pk": { "status": "PENDING", "generated_images": [] }
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/generations/gen-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "generations_by_pk": {
                "status": "COMPLETE",
                "generated_images": [{ "url": "https://cdn.leonardo.ai/gen-1.png" }]
            }
        })))
        .mount(&server)
        .await;

    let output = leonardo(&server, 5)
        .generate_image(&ImageRequest::new("a fox"))
        .await
        .unwrap();
    assert_eq!(
        output.payload,
        ImagePayload::Url("https://cdn.leonardo.ai/gen-1.png".to_string())
    );
}

#[tokio::test]
async fn leonardo_times_out_after_the_attempt_budget() {
    let server = MockServer::start().await;
    mount_job_creation(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/generations/gen-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "generations_by_pk": { "status": "PENDING", "generated_images": [] }
        })))
        .expect(3)
        .mount(&server)
        .await;

    let err = leonardo(&server, 3)
        .generate_image(&ImageRequest::new("a fox"))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::GenerationTimeout(_)), "{:?}", err);
}

#[tokio::test]
async fn leonardo_default_budget_checks_status_thirty_times() {
    let server = MockServer::start().await;
    mount_job_creation(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/generations/gen-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "generations_by_pk": { "status": "PENDING", "generated_images": [] }
        })))
        .expect(30)
        .mount(&server)
        .await;

    let adapter = LeonardoAdapter::with_base_url(
        Some("test_key".to_string()),
        SafetyClassifier::default(),
        &server.uri(),
    )
    .with_poll_interval(Duration::from_millis(1));
    let err = adapter
        .generate_image(&ImageRequest::new("a fox"))
        .await
        .unwrap_err();

    assert!(matches!(err, PortError::GenerationTimeout(_)), "{:?}", err);
    assert!(err.to_string().contains("after 30 attempts"), "{}", err);
}

#[tokio::test]
async fn leonardo_failed_job_is_an_upstream_failure() {
    let server = MockServer::start().await;
    mount_job_creation(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/generations/gen-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "generations_by_pk": { "status": "FAILED", "generated_images": [] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = leonardo(&server, 5)
        .generate_image(&ImageRequest::new("a fox"))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::UpstreamFailure(_)), "{:?}", err);
}

//=========================================================================================
// DALL·E (async-openai)
//=========================================================================================

fn dalle(server: &MockServer) -> DalleAdapter {
    DalleAdapter::new(
        openai::client(Some("test_key"), Some(&server.uri())),
        "dall-e-3".to_string(),
        SafetyClassifier::default(),
    )
}

#[tokio::test]
async fn dalle_maps_wide_sizes_and_returns_the_revised_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .and(body_partial_json(json!({ "size": "1792x1024", "style": "natural" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created": 1_700_000_000,
            "data": [{
                "url": "https://images.example/abc.png",
                "revised_prompt": "A calm lake at dawn"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut image_request = request("a lake", "1600x900");
    image_request.style = "natural".to_string();
    let output = dalle(&server).generate_image(&image_request).await.unwrap();

    assert_eq!(output.provider, "dalle");
    assert_eq!(
        output.payload,
        ImagePayload::Url("https://images.example/abc.png".to_string())
    );
    assert_eq!(output.revised_prompt.as_deref(), Some("A calm lake at dawn"));
}

#[tokio::test]
async fn dalle_content_policy_refusal_is_a_safety_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Your request was rejected as a result of our safety system.",
                "type": "invalid_request_error",
                "param": null,
                "code": "content_policy_violation"
            }
        })))
        .mount(&server)
        .await;

    let err = dalle(&server)
        .generate_image(&ImageRequest::new("something"))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::SafetyRejection(_)), "{:?}", err);
}
