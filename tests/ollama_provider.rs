// tests/ollama_provider.rs
//
// OllamaProvider + gateway against a wiremock server. Zero retry delay keeps it fast.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mention_moderator::ai_adapter::{OllamaProvider, Provider};
use mention_moderator::config::AiConfig;
use mention_moderator::{Classification, ClassificationGateway, RetryPolicy};

fn ai_config(server: &MockServer) -> AiConfig {
    AiConfig {
        host: server.uri(),
        model: "test-model".into(),
        timeout_secs: 5,
        ..AiConfig::default()
    }
}

fn gateway(server: &MockServer) -> ClassificationGateway {
    ClassificationGateway::new(
        Arc::new(OllamaProvider::new(&ai_config(server))),
        RetryPolicy::new(3, Duration::ZERO),
    )
}

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "test-model",
        "message": { "role": "assistant", "content": content },
        "done": true
    }))
}

#[tokio::test]
async fn request_shape_and_happy_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "stream": false,
            "format": "json"
        })))
        .respond_with(chat_reply(
            r#"{"classification":"SEVERELY_NEGATIVE","reason":"insult","confidence":0.93}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let r = gateway(&server).classify("you are an idiot").await;
    assert_eq!(r.classification, Classification::SeverelyNegative);
    assert_eq!(r.reason, "insult");
    assert!((r.confidence - 0.93).abs() < 1e-6);

    let reqs = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&reqs[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "you are an idiot");
}

#[tokio::test]
async fn server_errors_exhaust_retries_into_fail_safe() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let r = gateway(&server).classify("anything").await;
    assert_eq!(r.classification, Classification::Neutral);
    assert_eq!(r.confidence, 0.0);
}

#[tokio::test]
async fn invalid_model_output_is_retried_then_fails_safe() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(chat_reply(r#"{"classification":"ANGRY","reason":"x","confidence":0.9}"#))
        .expect(3)
        .mount(&server)
        .await;

    let r = gateway(&server).classify("anything").await;
    assert_eq!(r.classification, Classification::Neutral);
    assert_eq!(r.confidence, 0.0);
}

#[tokio::test]
async fn transport_error_is_reported_as_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(&ai_config(&server));
    let err = provider.fetch("hi").await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(provider.name(), "ollama");
}
