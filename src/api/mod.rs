//! Completion proxy server
//!
//! Relays prompts to OpenAI with a server-held API key so clients (such as
//! [`crate::provider::ProxyClientProvider`]) never see the credential. Only
//! the configured model identifier is accepted.

use crate::config::Config;
use crate::provider::{OpenAiProvider, StreamingProvider};
use crate::{Error, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the proxy router, building the upstream client from `config`
///
/// A missing OpenAI key does not prevent the router from starting; the
/// completion routes answer with a configuration error instead.
///
/// # Routes
///
/// - `POST /api/openai` - Batch completion, `{prompt, model}` → `{content}`
/// - `POST /api/openai-stream` - Streaming completion as a raw text body
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled),
///   reading its document from [`SWAGGER_DOC_PATH`]
pub fn create_router(config: Arc<Config>) -> Router {
    let upstream: Option<Arc<dyn StreamingProvider>> =
        match OpenAiProvider::new(&config.providers.openai) {
            Ok(provider) => Some(Arc::new(provider)),
            Err(e) => {
                tracing::error!(error = %e, "OpenAI API key is not set, completion routes will fail");
                None
            }
        };

    create_router_with_state(AppState::new(upstream, config))
}

/// Path of the OpenAPI document the Swagger UI loads
pub const SWAGGER_DOC_PATH: &str = "/api-docs/openapi.json";

/// Create the proxy router around an existing state
pub fn create_router_with_state(state: AppState) -> Router {
    let api = state.config.server.api.clone();

    let router = Router::new()
        .route("/api/openai", post(routes::complete))
        .route("/api/openai-stream", post(routes::complete_stream))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // Swagger UI serves its own copy of the document; `/openapi.json` is taken
    let router = if api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url(SWAGGER_DOC_PATH, ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    if api.cors_enabled {
        router.layer(build_cors_layer(&api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` anywhere in the list, or an empty list, allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the proxy server on the configured bind address.
///
/// Runs until SIGTERM or Ctrl+C, then lets in-flight requests finish.
///
/// # Example
///
/// ```no_run
/// use draftline::Config;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::from_env());
/// draftline::api::start_api_server(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(config: Arc<Config>) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(
        address = %bind_address,
        model = %config.server.api.supported_model,
        "Starting API server"
    );

    let app = create_router(config);

    let listener = TcpListener::bind(bind_address).await.map_err(Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

/// Resolves on the first termination signal
///
/// - **Unix:** SIGTERM or SIGINT, falling back to whichever handler could be registered.
/// - **Windows/other:** Ctrl+C.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down API server"),
                _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down API server"),
            }
        }
        (Ok(mut only), Err(e)) | (Err(e), Ok(mut only)) => {
            tracing::warn!(error = %e, "Could not register one signal handler, waiting on the other");
            only.recv().await;
            tracing::info!("Received termination signal, shutting down API server");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down API server"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C, API server runs until killed");
            std::future::pending::<()>().await;
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
