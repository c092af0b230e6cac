//! # draftline
//!
//! Outline-first article generation: a topic becomes an editable outline,
//! the outline becomes prose one section at a time, and every stage can be
//! saved as a durable draft.
//!
//! ## Design Philosophy
//!
//! draftline is designed to be:
//! - **One pipeline shape** - Outline first, then sections in outline order
//! - **Provider-agnostic** - Batch and streaming adapters behind traits
//! - **Library-first** - Embed the [`Pipeline`]; the proxy server is optional
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use draftline::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads OPENAI_API_KEY / GEMINI_API_KEY from the environment
//!     let config = Config::from_env();
//!     let pipeline = Pipeline::from_config(&config).await?;
//!
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     pipeline.submit_topic("remote work tips").await?;
//!     pipeline.generate_article().await?;
//!     let markdown = pipeline.render_article_markdown().await?;
//!     println!("{markdown}");
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Completion proxy server
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Section generation and chunk accumulation
pub mod generator;
/// Markdown assembly
pub mod markdown;
/// Outline response parsing
pub mod outline;
/// Generation pipeline controller
pub mod pipeline;
/// Model provider adapters
pub mod provider;
/// Saved-record persistence
pub mod store;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, PipelineConfig, ProviderConfig};
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, Result, ToHttpStatus};
pub use pipeline::{Pipeline, SessionState};
pub use provider::{CompletionProvider, Providers, StreamingProvider};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use types::{
    ArticleContent, ArtifactKind, Event, Outline, Phase, ProviderSelection, RecordId,
    SavedArticle, SavedMarkdown, SavedOutline, Section,
};
