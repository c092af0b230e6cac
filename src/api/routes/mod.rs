//! Route handlers for the proxy API
//!
//! - [`proxy`]: batch and streaming completion relay
//! - [`system`]: health and OpenAPI

use serde::{Deserialize, Serialize};

mod proxy;
mod system;

pub use proxy::*;
pub use system::*;

/// Request body for POST /api/openai and POST /api/openai-stream
///
/// Both fields are optional on the wire so that a missing field produces a
/// validation error body instead of an extractor rejection.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CompletionRequest {
    /// Prompt text sent to the model
    #[serde(default)]
    pub prompt: Option<String>,

    /// Model identifier; must equal the server's supported model
    #[serde(default)]
    pub model: Option<String>,
}

/// Response body for POST /api/openai
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CompletionResponse {
    /// Full response text
    pub content: String,
}
