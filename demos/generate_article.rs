//! Article generation example
//!
//! Walks one topic through the whole pipeline:
//! - Generating an outline while status messages rotate
//! - Editing the outline
//! - Generating every section (streamed when OPENAI_API_KEY is set)
//! - Rendering markdown and saving it
//!
//! Reads `GEMINI_API_KEY` / `OPENAI_API_KEY` from the environment or a `.env` file.
//!
//! ```bash
//! cargo run --example generate_article -- "remote work tips"
//! ```

use draftline::{Config, Event, Pipeline, ProviderSelection};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let topic = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "remote work tips".to_string());

    let mut config = Config::from_env();
    config.persistence.database_path = "demo-drafts/draftline.db".into();
    if config.providers.openai.api_key.is_some() {
        config.pipeline.default_selection = ProviderSelection::Streaming;
    }

    let pipeline = Pipeline::from_config(&config).await?;

    // Subscribe to events
    let mut events = pipeline.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::StatusMessage { message } => println!("… {message}"),
                Event::OutlineReady { title, sections } => {
                    println!("✓ Outline \"{title}\" with {sections} sections");
                }
                Event::SectionStarted {
                    heading,
                    index,
                    total,
                } => println!("→ [{}/{}] {}", index + 1, total, heading),
                Event::SectionCompleted { heading } => println!("✓ {heading}"),
                Event::GenerationFailed { error } => eprintln!("✗ {error}"),
                Event::Saved { kind, id, updated } => {
                    println!("✓ Saved {kind:?} {id} (updated: {updated})");
                }
                _ => {}
            }
        }
    });

    pipeline.submit_topic(&topic).await?;

    // Outline edits happen before any prose is written
    let title = pipeline
        .snapshot()
        .await
        .outline()
        .map(|o| o.title.clone())
        .unwrap_or_default();
    pipeline.edit_title(format!("{title} (Draft)")).await?;
    pipeline.checkpoint_outline().await?;

    pipeline.generate_article().await?;
    pipeline.checkpoint_article().await?;

    let markdown = pipeline.render_article_markdown().await?;
    pipeline.save_markdown().await?;

    println!("\n{markdown}");
    println!(
        "{} outlines, {} articles, {} markdown documents saved",
        pipeline.saved_outlines().await.len(),
        pipeline.saved_articles().await.len(),
        pipeline.saved_markdowns().await.len()
    );

    Ok(())
}
