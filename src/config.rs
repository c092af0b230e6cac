//! Configuration types for draftline

use crate::types::ProviderSelection;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Main configuration
///
/// Every field has a default, so `Config::default()` is a working setup apart
/// from provider credentials, which come from the environment via
/// [`Config::from_env`] or are set explicitly.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model provider credentials and endpoints
    #[serde(default)]
    pub providers: ProviderConfig,

    /// Pipeline behavior
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Where saved collections are persisted
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// HTTP proxy surface
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

/// Model provider configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI chat completions (streaming-capable)
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Google Gemini (batch provider)
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Route streaming-path requests through a draftline proxy instead of
    /// calling OpenAI directly
    #[serde(default)]
    pub proxy: Option<ProxyClientConfig>,
}

/// OpenAI chat completions configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (env: OPENAI_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL (default: "https://api.openai.com/v1")
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model identifier (default: "gpt-5")
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Request timeout in seconds (default: 300)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            timeout: default_request_timeout(),
        }
    }
}

/// Google Gemini configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key (env: GEMINI_API_KEY, falling back to API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL (default: "https://generativelanguage.googleapis.com/v1beta")
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Model identifier (default: "gemini-2.5-pro")
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Sampling temperature (default: 0.5)
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,

    /// Attach the Google Search tool to requests (default: true)
    #[serde(default = "default_true")]
    pub search_grounding: bool,

    /// Request timeout in seconds (default: 300)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            temperature: default_temperature(),
            search_grounding: true,
            timeout: default_request_timeout(),
        }
    }
}

/// Client-side settings for talking to a draftline proxy
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProxyClientConfig {
    /// Proxy base URL, e.g. "http://127.0.0.1:3001"
    pub base_url: String,

    /// Model identifier sent with every request (default: "gpt-5")
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Request timeout in seconds (default: 300)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

/// Pipeline behavior configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Advisory messages shown in order while the outline is generated.
    /// The last one stays up until the outline resolves.
    #[serde(default = "default_status_messages")]
    pub status_messages: Vec<String>,

    /// Time between status messages in milliseconds (default: 3500)
    #[serde(default = "default_status_interval", with = "duration_millis_serde")]
    pub status_interval: Duration,

    /// Provider path for new sessions (default: standard)
    #[serde(default)]
    pub default_selection: ProviderSelection,

    /// Language the generated outline and prose should be written in
    #[serde(default = "default_output_language")]
    pub output_language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            status_messages: default_status_messages(),
            status_interval: default_status_interval(),
            default_selection: ProviderSelection::default(),
            output_language: default_output_language(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "./draftline.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// Proxy API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Proxy API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:3001, env: PORT overrides the port)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// The only model identifier the proxy accepts (default: "gpt-5")
    #[serde(default = "default_openai_model")]
    pub supported_model: String,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            supported_model: default_openai_model(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

const REDACTED: &str = "***REDACTED***";

impl Config {
    /// Default configuration overlaid with values from the process environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Overlay credentials and port from an environment lookup
    ///
    /// Reads `OPENAI_API_KEY`, `GEMINI_API_KEY` (falling back to `API_KEY`)
    /// and `PORT`. Empty values are ignored; an unparsable `PORT` is logged
    /// and ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.providers.openai.api_key = Some(key);
        }
        if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY")) {
            self.providers.gemini.api_key = Some(key);
        }
        if let Some(port) = non_empty("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.api.bind_address.set_port(port),
                Err(e) => tracing::warn!(port = %port, error = %e, "ignoring invalid PORT"),
            }
        }
    }

    /// Copy of the configuration with every credential masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.providers.openai.api_key.is_some() {
            config.providers.openai.api_key = Some(REDACTED.to_string());
        }
        if config.providers.gemini.api_key.is_some() {
            config.providers.gemini.api_key = Some(REDACTED.to_string());
        }
        config
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-5".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_temperature() -> Option<f32> {
    Some(0.5)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_status_messages() -> Vec<String> {
    vec![
        "Searching for top-ranking articles...".to_string(),
        "Analyzing competing H2 and H3 headings...".to_string(),
        "Drafting the best outline...".to_string(),
        "Running final checks...".to_string(),
    ]
}

fn default_status_interval() -> Duration {
    Duration::from_millis(3500)
}

fn default_output_language() -> String {
    "English".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./draftline.db")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3001))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
