//! OpenAI chat completions adapter

use super::sse::sse_text_stream;
use super::{ChunkStream, CompletionProvider, StreamingProvider, build_client, check_status};
use crate::config::OpenAiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Client for `POST {base_url}/chat/completions`
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChatChunkChoice>,
}

#[derive(Deserialize)]
struct ChatChunkChoice {
    #[serde(default)]
    delta: ChatDelta,
}

#[derive(Deserialize, Default)]
struct ChatDelta {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Build the adapter, failing if no API key is configured
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::config("OpenAI API key is not set", "providers.openai.api_key")
            })?;

        Ok(Self {
            client: build_client(config.timeout)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    async fn send(&self, prompt: &str, model: &str, stream: bool) -> Result<reqwest::Response> {
        let request = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        check_status(response).await
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, model: &str) -> Result<String> {
        tracing::debug!(model, prompt_len = prompt.len(), "OpenAI completion request");

        let response = self.send(prompt, model, false).await?;
        let body: ChatResponse = response.json().await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Transport("OpenAI response contained no message".to_string()))
    }
}

#[async_trait]
impl StreamingProvider for OpenAiProvider {
    async fn complete_stream(&self, prompt: &str, model: &str) -> Result<ChunkStream> {
        tracing::debug!(model, prompt_len = prompt.len(), "OpenAI streaming request");

        let response = self.send(prompt, model, true).await?;
        Ok(sse_text_stream(response, "openai", |payload| {
            let chunk: ChatChunk = serde_json::from_str(payload).map_err(|e| {
                tracing::error!(error = %e, payload, "unreadable OpenAI stream chunk");
                Error::Transport(format!("unreadable stream chunk ({e})"))
            })?;
            Ok(chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content))
        }))
    }
}
