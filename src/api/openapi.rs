//! OpenAPI documentation for the proxy server

use utoipa::OpenApi;

/// OpenAPI documentation for the draftline proxy API
///
/// Served at `/openapi.json` and, when enabled, browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "draftline proxy API",
        version = "0.1.0",
        description = "Relays completion requests to OpenAI with a server-held API key",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:3001", description = "Local development server")
    ),
    paths(
        crate::api::routes::complete,
        crate::api::routes::complete_stream,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::api::routes::CompletionRequest,
        crate::api::routes::CompletionResponse,
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "completions", description = "Batch and streaming completion relay"),
        (name = "system", description = "System endpoints - Health check, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
