// HTTP contract tests for the OpenRouter client

use daily_news::llm::openrouter::OpenRouter;
use daily_news::llm::types::{ChatMessage, ChatRequest};
use daily_news::llm::ChatModel;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> ChatRequest {
    ChatRequest {
        model: "openai/gpt-4o-mini-search-preview".to_string(),
        messages: vec![
            ChatMessage::system("Return JSON only"),
            ChatMessage::user("{\"query\":\"ai\"}"),
        ],
        temperature: 0.0,
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "gen-1",
        "object": "chat.completion",
        "model": "openai/gpt-4o-mini-search-preview",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 30, "total_tokens": 42}
    })
}

#[tokio::test]
async fn test_sends_openai_chat_body_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "openai/gpt-4o-mini-search-preview",
            "temperature": 0.0,
            "messages": [
                {"role": "system", "content": "Return JSON only"},
                {"role": "user", "content": "{\"query\":\"ai\"}"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"results\":[]}")))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenRouter::new("sk-test".to_string(), &format!("{}/api/v1/", server.uri()), 5_000).unwrap();
    let content = client.complete(&request()).await.unwrap();
    assert_eq!(content, "{\"results\":[]}");
}

#[tokio::test]
async fn test_accumulates_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
        .expect(2)
        .mount(&server)
        .await;

    let client = OpenRouter::new("sk-test".to_string(), &server.uri(), 5_000).unwrap();
    client.complete(&request()).await.unwrap();
    client.complete(&request()).await.unwrap();

    let usage = client.usage();
    assert_eq!(usage.requests, 2);
    assert_eq!(usage.prompt_tokens, 24);
    assert_eq!(usage.completion_tokens, 60);
}

#[tokio::test]
async fn test_http_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenRouter::new("sk-test".to_string(), &server.uri(), 5_000).unwrap();
    let err = client.complete(&request()).await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("429"), "unexpected error: {}", msg);
    assert!(msg.contains("rate limited"));
}

#[tokio::test]
async fn test_missing_content_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = OpenRouter::new("sk-test".to_string(), &server.uri(), 5_000).unwrap();
    let err = client.complete(&request()).await.unwrap_err();
    assert!(err.to_string().contains("no message content"));
}
