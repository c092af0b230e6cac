//! Model provider adapters
//!
//! Two capability levels sit behind trait objects so the pipeline never
//! depends on a concrete vendor:
//! - [`CompletionProvider`] returns the whole response in one round trip
//! - [`StreamingProvider`] additionally yields the response as an ordered,
//!   finite stream of text chunks
//!
//! ## Adapters
//! - [`openai`]: OpenAI chat completions (batch and SSE streaming)
//! - [`gemini`]: Google Gemini `generateContent` (batch and SSE streaming)
//! - [`proxy`]: a draftline proxy server (`/api/openai`, `/api/openai-stream`)

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::types::ProviderSelection;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

pub mod gemini;
pub mod openai;
pub mod prompts;
pub mod proxy;
mod sse;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use proxy::ProxyClientProvider;
pub use sse::{SseLineBuffer, Utf8ChunkDecoder};

/// Ordered stream of response text fragments
///
/// The stream ends when the response is complete. An `Err` item aborts the
/// response; nothing after it should be used. Fragments may be empty.
pub type ChunkStream = BoxStream<'static, Result<String>>;

/// Single round-trip text completion
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Model identifier used when the caller has no preference
    fn default_model(&self) -> &str;

    /// Send `prompt` to `model` and return the full response text
    async fn complete(&self, prompt: &str, model: &str) -> Result<String>;
}

/// Completion delivered incrementally
#[async_trait]
pub trait StreamingProvider: CompletionProvider {
    /// Send `prompt` to `model` and return the response as a chunk stream
    ///
    /// Errors before the first byte (bad status, connection refused) are
    /// returned directly; errors after that arrive as an `Err` item.
    async fn complete_stream(&self, prompt: &str, model: &str) -> Result<ChunkStream>;
}

/// The adapters a pipeline draws on
#[derive(Clone)]
pub struct Providers {
    /// Batch adapter used for outlines and for sections in standard mode
    pub standard: Arc<dyn CompletionProvider>,

    /// Streaming-capable adapter, when one is configured
    pub streaming: Option<Arc<dyn StreamingProvider>>,
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("standard", &self.standard.name())
            .field("streaming", &self.streaming.as_ref().map(|p| p.name()))
            .finish()
    }
}

impl Providers {
    /// Pair a batch adapter with an optional streaming adapter
    pub fn new(
        standard: Arc<dyn CompletionProvider>,
        streaming: Option<Arc<dyn StreamingProvider>>,
    ) -> Self {
        Self {
            standard,
            streaming,
        }
    }

    /// Build adapters from configuration
    ///
    /// Gemini is the standard adapter when its key is set. The streaming
    /// adapter is the configured proxy, or OpenAI when its key is set. If
    /// Gemini is unavailable the streaming adapter also serves batch calls.
    /// Fails with a configuration error when no adapter can be built.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let streaming: Option<Arc<dyn StreamingProvider>> = match &config.proxy {
            Some(proxy) => Some(Arc::new(ProxyClientProvider::new(proxy)?)),
            None => match OpenAiProvider::new(&config.openai) {
                Ok(provider) => Some(Arc::new(provider)),
                Err(e) => {
                    tracing::debug!(error = %e, "streaming provider not configured");
                    None
                }
            },
        };

        let standard: Arc<dyn CompletionProvider> = match GeminiProvider::new(&config.gemini) {
            Ok(provider) => Arc::new(provider),
            Err(e) => match &streaming {
                Some(streaming) => {
                    tracing::info!(
                        error = %e,
                        provider = streaming.name(),
                        "Gemini not configured, using the streaming provider for batch calls"
                    );
                    Arc::new(BatchFromStreaming(streaming.clone()))
                }
                None => {
                    return Err(Error::config(
                        "no model provider is configured (set GEMINI_API_KEY or OPENAI_API_KEY)",
                        "providers",
                    ));
                }
            },
        };

        Ok(Self {
            standard,
            streaming,
        })
    }

    /// Batch adapter for a provider path
    ///
    /// The streaming path answers batch calls (such as the outline request)
    /// with the streaming adapter, so one session talks to one vendor.
    pub fn batch_for(&self, selection: ProviderSelection) -> Result<Arc<dyn CompletionProvider>> {
        match selection {
            ProviderSelection::Standard => Ok(self.standard.clone()),
            ProviderSelection::Streaming => {
                let streaming = self.streaming_provider()?;
                Ok(Arc::new(BatchFromStreaming(streaming)))
            }
        }
    }

    /// The streaming adapter, or a configuration error when none is set up
    pub fn streaming_provider(&self) -> Result<Arc<dyn StreamingProvider>> {
        self.streaming.clone().ok_or_else(|| {
            Error::config(
                "no streaming provider is configured",
                "providers.openai.api_key",
            )
        })
    }
}

/// Exposes a streaming adapter through the batch trait
struct BatchFromStreaming(Arc<dyn StreamingProvider>);

#[async_trait]
impl CompletionProvider for BatchFromStreaming {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn default_model(&self) -> &str {
        self.0.default_model()
    }

    async fn complete(&self, prompt: &str, model: &str) -> Result<String> {
        self.0.complete(prompt, model).await
    }
}

/// Pass a successful response through, or turn it into [`Error::Provider`]
///
/// OpenAI, Gemini and the draftline proxy all report failures as
/// `{"error": {"message": ...}}`; that message is used when present.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        });

    Err(Error::Provider {
        status: status.as_u16(),
        message,
    })
}

/// Shared HTTP client construction for the adapters
pub(crate) fn build_client(timeout: std::time::Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(Error::Network)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderConfig, ProxyClientConfig};
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn from_config_without_keys_is_config_error() {
        let err = Providers::from_config(&ProviderConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn from_config_prefers_gemini_for_batch_and_openai_for_streaming() {
        let mut config = ProviderConfig::default();
        config.gemini.api_key = Some("g".into());
        config.openai.api_key = Some("o".into());
        let providers = Providers::from_config(&config).unwrap();
        assert_eq!(providers.standard.name(), "gemini");
        assert_eq!(providers.streaming.unwrap().name(), "openai");
    }

    #[test]
    fn from_config_falls_back_to_streaming_for_batch() {
        let mut config = ProviderConfig::default();
        config.openai.api_key = Some("o".into());
        let providers = Providers::from_config(&config).unwrap();
        assert_eq!(providers.standard.name(), "openai");
        assert_eq!(providers.standard.default_model(), "gpt-5");
    }

    #[test]
    fn from_config_uses_proxy_when_configured() {
        let config = ProviderConfig {
            proxy: Some(ProxyClientConfig {
                base_url: "http://127.0.0.1:3001".into(),
                model: "gpt-5".into(),
                timeout: Duration::from_secs(5),
            }),
            ..ProviderConfig::default()
        };
        let providers = Providers::from_config(&config).unwrap();
        assert_eq!(providers.streaming.unwrap().name(), "proxy");
    }

    #[tokio::test]
    async fn check_status_extracts_nested_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({"error": {"message": "slow down"}})),
            )
            .mount(&server)
            .await;

        let response = reqwest::get(server.uri()).await.unwrap();
        match check_status(response).await.unwrap_err() {
            Error::Provider { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn check_status_falls_back_to_plain_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let response = reqwest::get(server.uri()).await.unwrap();
        let err = check_status(response).await.unwrap_err();
        assert!(err.to_string().contains("upstream down"));
        assert!(err.is_transport());
    }
}
