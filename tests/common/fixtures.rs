//! Mock upstream responses for the OpenAI and Gemini wire formats

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, body_string_contains, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Outline the mock model returns, wrapped in a json fence
pub const OUTLINE_RESPONSE: &str = "Here you go:\n```json\n{\"title\":\"Remote Work\",\"outline\":[\
{\"section\":\"Intro\",\"subsections\":[\"why it matters\"]},\
{\"section\":\"Tools\",\"subsections\":[\"chat\",\"video calls\"]},\
{\"section\":\"Wrap-up\",\"subsections\":[]}]}\n```";

/// Gemini `generateContent` response carrying `text`
pub fn gemini_text(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] })
}

/// OpenAI chat completion response carrying `text`
pub fn openai_text(text: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
}

/// OpenAI SSE body delivering `deltas` in order
pub fn openai_sse(deltas: &[&str]) -> String {
    let mut body: String = deltas
        .iter()
        .map(|d| format!("data: {}\n\n", json!({ "choices": [{ "delta": { "content": d } }] })))
        .collect();
    body.push_str("data: [DONE]\n\n");
    body
}

/// Answer Gemini outline prompts with [`OUTLINE_RESPONSE`]
pub async fn mount_gemini_outline(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path_regex(r"^/models/[^/]+:generateContent$"))
        .and(body_string_contains("Topic:"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text(OUTLINE_RESPONSE)))
        .mount(server)
        .await;
}

/// Answer the Gemini prompt for `heading` with `body`
pub async fn mount_gemini_section(server: &MockServer, heading: &str, body: &str) {
    Mock::given(method("POST"))
        .and(path_regex(r"^/models/[^/]+:generateContent$"))
        .and(body_string_contains(format!("Section to write: {heading}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text(body)))
        .mount(server)
        .await;
}

/// Fail the Gemini prompt for `heading` with `status`
pub async fn mount_gemini_section_failure(server: &MockServer, heading: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path_regex(r"^/models/[^/]+:generateContent$"))
        .and(body_string_contains(format!("Section to write: {heading}")))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(json!({ "error": { "message": "model overloaded" } })),
        )
        .mount(server)
        .await;
}

/// Answer OpenAI batch outline prompts with [`OUTLINE_RESPONSE`]
pub async fn mount_openai_outline(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Topic:"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_text(OUTLINE_RESPONSE)))
        .mount(server)
        .await;
}

/// Stream `deltas` for the OpenAI prompt for `heading`
pub async fn mount_openai_section_stream(server: &MockServer, heading: &str, deltas: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "stream": true })))
        .and(body_string_contains(format!("Section to write: {heading}")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(openai_sse(deltas), "text/event-stream"))
        .mount(server)
        .await;
}
