//! Gemini prompt author against a mock API.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reel_worker::gemini::{GeminiClient, GeminiConfig};
use reel_worker::{PromptAuthoringService, WorkerError};

fn config(server: &MockServer, models: &[&str]) -> GeminiConfig {
    let mut config = GeminiConfig::new("test-key");
    config.base_url = server.uri();
    config.models = models.iter().map(|m| m.to_string()).collect();
    config
}

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    }))
}

#[tokio::test]
async fn test_author_prompt_sends_scene_and_style() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "A cat sat." }] }]
        })))
        .respond_with(text_response("Slow dolly shot of a tabby cat, cel-shaded."))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(config(&server, &["gemini-2.5-flash"])).unwrap();
    let prompt = client.author_prompt("A cat sat.", "anime").await.unwrap();

    assert_eq!(prompt, "Slow dolly shot of a tabby cat, cel-shaded.");
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let system = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
    assert!(system.contains("'anime'"));
}

#[tokio::test]
async fn test_falls_back_to_next_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/primary:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/secondary:generateContent"))
        .respond_with(text_response("Rain-soaked street at dusk."))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(config(&server, &["primary", "secondary"])).unwrap();
    let prompt = client.author_prompt("It rained.", "noir").await.unwrap();

    assert_eq!(prompt, "Rain-soaked street at dusk.");
}

#[tokio::test]
async fn test_empty_candidates_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(config(&server, &["only"])).unwrap();
    let err = client.author_prompt("A cat sat.", "anime").await.unwrap_err();

    assert!(matches!(err, WorkerError::AiFailed(_)));
}

#[tokio::test]
async fn test_last_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(config(&server, &["a", "b"])).unwrap();
    let err = client.author_prompt("A cat sat.", "anime").await.unwrap_err();

    assert!(err.to_string().contains("400"));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
