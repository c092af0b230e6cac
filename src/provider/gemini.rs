//! Google Gemini adapter
//!
//! Batch calls go to `models/{model}:generateContent`, streaming calls to
//! `models/{model}:streamGenerateContent?alt=sse`. Requests can carry the
//! Google Search tool so outlines are grounded in current search results.

use super::sse::sse_text_stream;
use super::{ChunkStream, CompletionProvider, StreamingProvider, build_client, check_status};
use crate::config::GeminiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

/// Client for the Gemini `generateContent` family of endpoints
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    search_grounding: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(self) -> Result<Option<String>> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(Error::Transport(format!("Gemini blocked the prompt: {reason}")));
        }

        Ok(self.candidates.into_iter().next().map(|candidate| {
            candidate
                .content
                .map(|content| {
                    content
                        .parts
                        .into_iter()
                        .filter_map(|part| part.text)
                        .collect::<String>()
                })
                .unwrap_or_default()
        }))
    }
}

impl GeminiProvider {
    /// Build the adapter, failing if no API key is configured
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::config("Gemini API key is not set", "providers.gemini.api_key")
            })?;

        Ok(Self {
            client: build_client(config.timeout)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            search_grounding: config.search_grounding,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }]
        });

        if self.search_grounding {
            body["tools"] = json!([{ "googleSearch": {} }]);
        }

        if let Some(temperature) = self.temperature {
            body["generationConfig"] = json!({ "temperature": temperature });
        }

        body
    }

    async fn send(&self, url: String, prompt: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        check_status(response).await
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, model: &str) -> Result<String> {
        tracing::debug!(
            model,
            grounded = self.search_grounding,
            prompt_len = prompt.len(),
            "Gemini completion request"
        );

        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self.send(url, prompt).await?;
        let body: GenerateResponse = response.json().await?;

        body.text()?
            .ok_or_else(|| Error::Transport("Gemini response contained no candidates".to_string()))
    }
}

#[async_trait]
impl StreamingProvider for GeminiProvider {
    async fn complete_stream(&self, prompt: &str, model: &str) -> Result<ChunkStream> {
        tracing::debug!(model, prompt_len = prompt.len(), "Gemini streaming request");

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        );
        let response = self.send(url, prompt).await?;

        Ok(sse_text_stream(response, "gemini", |payload| {
            let chunk: GenerateResponse = serde_json::from_str(payload).map_err(|e| {
                tracing::error!(error = %e, payload, "unreadable Gemini stream chunk");
                Error::Transport(format!("unreadable stream chunk ({e})"))
            })?;
            chunk.text()
        }))
    }
}
