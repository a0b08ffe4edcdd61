//! Segmenter client tests against a mock sidecar.

use reel_nlp::{NlpError, SegmenterConfig, SentenceClient};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_segment_returns_sentences_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/segment"))
        .and(body_json(json!({ "text": "A cat sat. A dog ran." })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "sentences": ["A cat sat.", " A dog ran. ", ""] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = SentenceClient::new(SegmenterConfig::new(server.uri())).unwrap();
    let sentences = client.segment("A cat sat. A dog ran.").await.unwrap();

    assert_eq!(sentences, vec!["A cat sat.", "A dog ran."]);
}

#[tokio::test]
async fn test_segment_surfaces_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/segment"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
        .mount(&server)
        .await;

    let client = SentenceClient::new(SegmenterConfig::new(server.uri())).unwrap();
    let err = client.segment("Hello.").await.unwrap_err();

    match &err {
        NlpError::Api { status, body } => {
            assert_eq!(*status, 503);
            assert_eq!(body, "model loading");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_segment_rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/segment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sents": [] })))
        .mount(&server)
        .await;

    let client = SentenceClient::new(SegmenterConfig::new(server.uri())).unwrap();
    assert!(matches!(
        client.segment("Hello.").await,
        Err(NlpError::InvalidResponse(_))
    ));
}
