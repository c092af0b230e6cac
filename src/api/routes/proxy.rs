//! Completion relay handlers

use super::{CompletionRequest, CompletionResponse};
use crate::api::state::AppState;
use crate::error::{Error, Result};
use crate::provider::StreamingProvider;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use std::sync::Arc;

/// A validated relay request
struct Relay {
    upstream: Arc<dyn StreamingProvider>,
    prompt: String,
    model: String,
}

/// Check a request against the server state
///
/// Order: upstream credential, then prompt, then model.
fn validate(state: &AppState, request: CompletionRequest) -> Result<Relay> {
    let upstream = state.upstream.clone().ok_or_else(|| {
        Error::config(
            "the server is missing the OpenAI API key",
            "providers.openai.api_key",
        )
    })?;

    let prompt = request
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| Error::Validation("prompt is required".to_string()))?;

    let supported = &state.config.server.api.supported_model;
    let model = match request.model {
        Some(model) if model == *supported => model,
        Some(model) => {
            return Err(Error::Validation(format!(
                "unsupported model '{model}', only '{supported}' is available"
            )));
        }
        None => {
            return Err(Error::Validation(format!(
                "model is required (use '{supported}')"
            )));
        }
    };

    Ok(Relay {
        upstream,
        prompt,
        model,
    })
}

/// POST /api/openai - Relay a prompt and return the whole response
#[utoipa::path(
    post,
    path = "/api/openai",
    tag = "completions",
    request_body = CompletionRequest,
    responses(
        (status = 200, description = "Model response", body = CompletionResponse),
        (status = 400, description = "Missing prompt or unsupported model", body = crate::error::ApiError),
        (status = 500, description = "Server is missing its API key", body = crate::error::ApiError),
        (status = 502, description = "Upstream provider failed", body = crate::error::ApiError)
    )
)]
pub async fn complete(
    State(state): State<AppState>,
    Json(request): Json<CompletionRequest>,
) -> Result<Json<CompletionResponse>> {
    let relay = validate(&state, request)?;

    let content = relay
        .upstream
        .complete(&relay.prompt, &relay.model)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "upstream completion failed"))?;

    Ok(Json(CompletionResponse { content }))
}

/// POST /api/openai-stream - Relay a prompt and stream the response as raw text
///
/// Only non-empty fragments are written. An upstream failure after the body
/// has started is logged and aborts the body, so the client sees a broken
/// transfer instead of a clean end.
#[utoipa::path(
    post,
    path = "/api/openai-stream",
    tag = "completions",
    request_body = CompletionRequest,
    responses(
        (status = 200, description = "Response text, streamed as it is generated", content_type = "text/plain"),
        (status = 400, description = "Missing prompt or unsupported model", body = crate::error::ApiError),
        (status = 500, description = "Server is missing its API key", body = crate::error::ApiError),
        (status = 502, description = "Upstream provider failed before streaming began", body = crate::error::ApiError)
    )
)]
pub async fn complete_stream(
    State(state): State<AppState>,
    Json(request): Json<CompletionRequest>,
) -> Result<Response> {
    let relay = validate(&state, request)?;

    let chunks = relay
        .upstream
        .complete_stream(&relay.prompt, &relay.model)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "upstream stream could not start"))?;

    let body = chunks
        .filter(|item| futures::future::ready(!matches!(item, Ok(text) if text.is_empty())))
        .scan(false, |failed, item| {
            if *failed {
                return futures::future::ready(None);
            }
            futures::future::ready(Some(item.map_err(|e| {
                tracing::error!(error = %e, "upstream stream failed, aborting response");
                *failed = true;
                std::io::Error::other(e.to_string())
            })))
        });

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response())
}
