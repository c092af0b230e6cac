//! Test configuration pointing every provider at a mock upstream

use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

use draftline::{Config, Pipeline};

/// Configuration with Gemini and OpenAI both served by `upstream` and a
/// SQLite database inside `dir`
pub fn mock_config(upstream: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();

    config.providers.gemini.api_key = Some("g-test".to_string());
    config.providers.gemini.base_url = upstream.uri();
    config.providers.gemini.timeout = Duration::from_secs(5);

    config.providers.openai.api_key = Some("sk-test".to_string());
    config.providers.openai.base_url = upstream.uri();
    config.providers.openai.timeout = Duration::from_secs(5);

    config.persistence.database_path = dir.path().join("draftline.db");
    config.pipeline.status_interval = Duration::from_millis(20);

    config
}

/// Build a pipeline the same way an application would
pub async fn pipeline_for(config: &Config) -> Pipeline {
    Pipeline::from_config(config)
        .await
        .expect("pipeline should build from a mock config")
}
