//! Gemini completion client tests against a mock endpoint

use serde_json::json;
use wiremock::ResponseTemplate;
use wiremock::matchers::{body_json, method, path};

use spark_engine::{
    ApiConfig, ApiKey, Completion, FailureKind, GeminiClient, ModelName, SAFETY_FALLBACK_REPLY,
};

use crate::common::{ENDPOINT_PATH, TEST_KEY, mount_body, mount_reply, start_gemini_mock};

fn client_for(server: &wiremock::MockServer) -> GeminiClient {
    let config = ApiConfig::new(ApiKey::new(TEST_KEY).unwrap(), ModelName::default())
        .with_base_url(format!("{}/v1", server.uri()));
    GeminiClient::new(config).unwrap()
}

#[tokio::test]
async fn sends_only_the_current_prompt() {
    let server = start_gemini_mock().await;
    wiremock::Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_json(json!({"contents": [{"parts": [{"text": "What is React?"}]}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "A UI library."}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let completion = client_for(&server).generate("What is React?").await.unwrap();
    assert_eq!(completion, Completion::Reply("A UI library.".to_string()));
}

#[tokio::test]
async fn joke_scenario_returns_first_candidate_text() {
    let server = start_gemini_mock().await;
    mount_reply(&server, "Why did the scarecrow win an award?").await;

    let completion = client_for(&server).generate("Tell me a joke").await.unwrap();
    assert_eq!(completion.text(), "Why did the scarecrow win an award?");
    assert!(!completion.is_blocked());
}

#[tokio::test]
async fn empty_candidates_fall_back_to_safety_text() {
    let server = start_gemini_mock().await;
    mount_body(&server, 200, json!({"candidates": []})).await;

    let completion = client_for(&server).generate("anything").await.unwrap();
    assert!(completion.is_blocked());
    assert_eq!(completion.text(), SAFETY_FALLBACK_REPLY);
}

#[tokio::test]
async fn empty_text_part_is_treated_as_blocked() {
    let server = start_gemini_mock().await;
    mount_body(
        &server,
        200,
        json!({"candidates": [{"content": {"parts": [{"text": ""}]}, "finishReason": "SAFETY"}]}),
    )
    .await;

    let completion = client_for(&server).generate("anything").await.unwrap();
    assert_eq!(completion, Completion::Blocked);
}

#[tokio::test]
async fn invalid_key_error_is_classified() {
    let server = start_gemini_mock().await;
    mount_body(
        &server,
        400,
        json!({"error": {"code": 400, "message": "API_KEY_INVALID", "status": "INVALID_ARGUMENT"}}),
    )
    .await;

    let err = client_for(&server).generate("hi").await.unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::InvalidCredential);
    assert!(err.user_message().contains("Invalid API key"));
}

#[tokio::test]
async fn unknown_model_reads_as_not_activated() {
    let server = start_gemini_mock().await;
    mount_body(
        &server,
        404,
        json!({"error": {"code": 404, "message": "models/gemini-2.5-flash is not found for API version v1"}}),
    )
    .await;

    let err = client_for(&server).generate("hi").await.unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::EndpointNotActivated);
}

#[tokio::test]
async fn forbidden_reads_as_access_denied() {
    let server = start_gemini_mock().await;
    mount_body(
        &server,
        403,
        json!({"error": {"code": 403, "message": "Error 403: Generative Language API has not been used"}}),
    )
    .await;

    let err = client_for(&server).generate("hi").await.unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::AccessDenied);
    assert!(err.user_message().contains("Generative Language API"));
}

#[tokio::test]
async fn error_without_message_uses_fallback_text() {
    let server = start_gemini_mock().await;
    mount_body(&server, 500, json!({"error": {"code": 500}})).await;

    let err = client_for(&server).generate("hi").await.unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::GenericRemoteFailure);
    let text = err.user_message();
    assert!(text.contains("API Error"), "{text}");
    assert!(text.contains("check your network connection"), "{text}");
}
