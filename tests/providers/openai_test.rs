//! OpenAI provider wire format tests.

use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use quarry::providers::openai::{build_request, parse_response, OpenAiProvider};
use quarry::providers::{CompletionRequest, LlmProvider, Message, ProviderError};

fn simple_request() -> CompletionRequest {
    CompletionRequest {
        model: "gpt-4o".to_owned(),
        messages: vec![
            Message::system("You are helpful."),
            Message::user("Topic: tides"),
            Message::assistant("Plan: look up tide tables"),
        ],
    }
}

/// Read headers plus a `Content-Length` body.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end.saturating_add(4).saturating_add(content_length) {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// Serve one HTTP response and hand back the raw request text.
async fn serve_once(status_line: &str, body: &str) -> (String, oneshot::Receiver<String>) {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) => panic!("listener should bind: {err}"),
    };
    let addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(err) => panic!("listener should expose local addr: {err}"),
    };

    let (tx, rx) = oneshot::channel();
    let status_line_owned = status_line.to_owned();
    let body_owned = body.to_owned();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let _ = tx.send(read_request(&mut socket).await);

            let response = format!(
                "HTTP/1.1 {status_line_owned}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body_owned}",
                body_owned.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    (format!("http://{addr}/v1/chat/completions"), rx)
}

#[test]
fn build_request_keeps_model_and_message_order() {
    let req = build_request(&simple_request());
    assert_eq!(req.model, "gpt-4o");
    assert!(!req.stream);
    let roles: Vec<&str> = req.messages.iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, vec!["system", "user", "assistant"]);
    assert_eq!(req.messages[1].content, "Topic: tides");
}

#[test]
fn parse_response_text_only() {
    let body = json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "tide tables bay of fundy"},
            "finish_reason": "stop"
        }],
        "model": "gpt-4o",
        "usage": {"prompt_tokens": 10, "completion_tokens": 5}
    });

    let resp = parse_response(&body.to_string()).expect("should parse");
    assert_eq!(resp.id, "chatcmpl-1");
    assert_eq!(resp.model, "gpt-4o");
    assert_eq!(resp.choices.len(), 1);
    assert_eq!(resp.choices[0].message.role, "assistant");
    assert_eq!(
        resp.choices[0].message.content.as_deref(),
        Some("tide tables bay of fundy")
    );
    assert_eq!(resp.choices[0].finish_reason.as_deref(), Some("stop"));
    let usage = resp.usage.expect("usage should be present");
    assert_eq!(usage.input_tokens, 10);
    assert_eq!(usage.output_tokens, 5);
}

#[test]
fn parse_response_passes_empty_choices_through() {
    let body = json!({"choices": [], "model": "gpt-4o"});
    let resp = parse_response(&body.to_string()).expect("should parse");
    assert!(resp.choices.is_empty());
    assert!(resp.usage.is_none());
    assert_eq!(resp.id, "");
}

#[test]
fn parse_response_keeps_refusal() {
    let body = json!({
        "choices": [{
            "message": {"role": "assistant", "content": null, "refusal": "I can't help with that."},
            "finish_reason": "stop"
        }],
        "model": "gpt-4o"
    });
    let resp = parse_response(&body.to_string()).expect("should parse");
    assert_eq!(
        resp.choices[0].message.refusal.as_deref(),
        Some("I can't help with that.")
    );
    assert!(resp.choices[0].message.content.is_none());
}

#[test]
fn parse_response_keeps_unknown_role() {
    let body = json!({
        "choices": [{"message": {"role": "tool", "content": "x"}, "finish_reason": "stop"}],
        "model": "gpt-4o"
    });
    let resp = parse_response(&body.to_string()).expect("valid JSON should parse");
    assert_eq!(resp.choices[0].message.role, "tool");
    assert_eq!(resp.choices[0].index, 0);
}

#[test]
fn parse_response_tolerates_missing_fields() {
    let resp = parse_response(r#"{"id":"x"}"#).expect("valid JSON should parse");
    assert_eq!(resp.id, "x");
    assert_eq!(resp.model, "");
    assert!(resp.choices.is_empty());

    let resp = parse_response(r#"{"choices":[{"message":{"content":"q"}}]}"#)
        .expect("valid JSON should parse");
    assert_eq!(resp.choices[0].message.role, "assistant");
    assert_eq!(resp.choices[0].message.content.as_deref(), Some("q"));
    assert!(resp.choices[0].finish_reason.is_none());

    let resp = parse_response(r#"{"choices":"none"}"#).expect("valid JSON should parse");
    assert!(resp.choices.is_empty());
}

#[test]
fn parse_response_rejects_non_json() {
    assert!(matches!(
        parse_response("not json at all"),
        Err(ProviderError::Parse(_))
    ));
}

#[test]
fn provider_debug_redacts_key() {
    let provider = OpenAiProvider::new(
        "https://api.openai.com/v1/chat/completions",
        "sk-test-secret",
        Duration::from_secs(5),
    )
    .expect("client should build");
    let rendered = format!("{provider:?}");
    assert!(!rendered.contains("sk-test-secret"));
    assert_eq!(provider.name(), "openai");
}

#[tokio::test]
async fn complete_posts_request_and_parses_reply() {
    let reply = json!({
        "id": "chatcmpl-2",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "\"king tides 2024\""},
            "finish_reason": "stop"
        }],
        "model": "gpt-4o-2024-08-06"
    });
    let (endpoint, captured) = serve_once("200 OK", &reply.to_string()).await;
    let provider = OpenAiProvider::new(endpoint, "test-key", Duration::from_secs(5))
        .expect("client should build");

    let resp = provider
        .complete(&simple_request())
        .await
        .expect("completion should succeed");
    assert_eq!(resp.model, "gpt-4o-2024-08-06");
    assert_eq!(
        resp.choices[0].message.content.as_deref(),
        Some("\"king tides 2024\"")
    );

    let raw = captured.await.expect("request should be captured");
    assert!(raw.starts_with("POST /v1/chat/completions"));
    assert!(raw.to_ascii_lowercase().contains("authorization: bearer test-key"));
    assert!(raw.contains("\"stream\":false"));
    assert!(raw.contains("Topic: tides"));
}

#[tokio::test]
async fn complete_maps_error_status() {
    let (endpoint, _captured) =
        serve_once("429 Too Many Requests", "{\"error\":\"rate limit\"}").await;
    let provider = OpenAiProvider::new(endpoint, "test-key", Duration::from_secs(5))
        .expect("client should build");

    match provider.complete(&simple_request()).await {
        Err(ProviderError::HttpStatus { status, body }) => {
            assert_eq!(status, 429);
            assert!(body.contains("rate limit"));
        }
        other => panic!("expected http status error, got: {other:?}"),
    }
}
