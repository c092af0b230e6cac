//! Completion proxy example
//!
//! Runs the proxy that keeps the OpenAI key on the server:
//! - `POST /api/openai` relays a prompt and returns `{content}`
//! - `POST /api/openai-stream` relays a prompt and streams raw text
//! - Swagger UI at `/swagger-ui`
//!
//! Reads `OPENAI_API_KEY` and `PORT` from the environment or a `.env` file.
//!
//! ```bash
//! cargo run --example proxy_server
//! curl -X POST localhost:3001/api/openai-stream \
//!   -H 'content-type: application/json' \
//!   -d '{"prompt": "Say hello", "model": "gpt-5"}'
//! ```

use draftline::Config;
use draftline::api::start_api_server;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let config = Config::from_env();

    if config.providers.openai.api_key.is_none() {
        eprintln!("OPENAI_API_KEY is not set; completion routes will answer 500");
    }

    println!(
        "Listening on http://{} (model {})",
        config.server.api.bind_address, config.server.api.supported_model
    );
    println!("Press Ctrl+C to stop");

    start_api_server(Arc::new(config)).await?;

    Ok(())
}
