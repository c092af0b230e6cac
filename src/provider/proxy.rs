//! Client for a draftline proxy server
//!
//! Lets a pipeline reach OpenAI without holding the key itself: the proxy
//! (see [`crate::api`]) owns the credential and relays prompts.

use super::sse::text_body_stream;
use super::{ChunkStream, CompletionProvider, StreamingProvider, build_client, check_status};
use crate::config::ProxyClientConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Adapter speaking the proxy's `/api/openai` and `/api/openai-stream` routes
#[derive(Debug, Clone)]
pub struct ProxyClientProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ProxyRequest<'a> {
    prompt: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct ProxyResponse {
    content: String,
}

impl ProxyClientProvider {
    /// Build the adapter, failing if the base URL is blank
    pub fn new(config: &ProxyClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(Error::config(
                "proxy base URL is empty",
                "providers.proxy.base_url",
            ));
        }

        Ok(Self {
            client: build_client(config.timeout)?,
            base_url: base_url.to_string(),
            model: config.model.clone(),
        })
    }

    async fn post(&self, route: &str, prompt: &str, model: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, route))
            .json(&ProxyRequest { prompt, model })
            .send()
            .await?;

        check_status(response).await
    }
}

#[async_trait]
impl CompletionProvider for ProxyClientProvider {
    fn name(&self) -> &str {
        "proxy"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, model: &str) -> Result<String> {
        let response = self.post("/api/openai", prompt, model).await?;
        let body: ProxyResponse = response.json().await?;
        Ok(body.content)
    }
}

#[async_trait]
impl StreamingProvider for ProxyClientProvider {
    async fn complete_stream(&self, prompt: &str, model: &str) -> Result<ChunkStream> {
        let response = self.post("/api/openai-stream", prompt, model).await?;
        Ok(text_body_stream(response, "proxy"))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> ProxyClientProvider {
        ProxyClientProvider::new(&ProxyClientConfig {
            base_url: format!("{}/", server.uri()),
            model: "gpt-5".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn blank_base_url_is_config_error() {
        let result = ProxyClientProvider::new(&ProxyClientConfig {
            base_url: "  ".into(),
            model: "gpt-5".into(),
            timeout: Duration::from_secs(5),
        });
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn complete_posts_prompt_and_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/openai"))
            .and(body_json(serde_json::json!({"prompt": "p", "model": "gpt-5"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"content": "done"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(provider(&server).complete("p", "gpt-5").await.unwrap(), "done");
    }

    #[tokio::test]
    async fn complete_surfaces_proxy_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/openai"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": "validation_error", "message": "unsupported model 'gpt-4'"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server).complete("p", "gpt-4").await.unwrap_err();
        assert!(matches!(err, Error::Provider { status: 400, .. }));
        assert!(err.to_string().contains("unsupported model"));
    }

    #[tokio::test]
    async fn stream_returns_raw_body_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/openai-stream"))
            .respond_with(ResponseTemplate::new(200).set_body_string("日本語の本文"))
            .mount(&server)
            .await;

        let text: String = provider(&server)
            .complete_stream("p", "gpt-5")
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect::<Vec<_>>()
            .await
            .concat();
        assert_eq!(text, "日本語の本文");
    }
}
