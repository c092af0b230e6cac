//! Section generation
//!
//! One provider call per outline section. In standard mode the body arrives
//! in one piece; in streaming mode it arrives as ordered chunks that are
//! concatenated as they come in.

use crate::error::Result;
use crate::provider::{ChunkStream, Providers, prompts};
use crate::types::{ProviderSelection, Section};
use async_trait::async_trait;
use futures::StreamExt;

/// Append-only body of one section under construction
#[derive(Debug, Clone, Default)]
pub struct SectionAccumulator {
    body: String,
    chunks: usize,
}

impl SectionAccumulator {
    /// Start an empty body
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return the accumulated body
    ///
    /// Empty chunks are ignored and return `None`.
    pub fn push(&mut self, chunk: &str) -> Option<&str> {
        if chunk.is_empty() {
            return None;
        }
        self.body.push_str(chunk);
        self.chunks += 1;
        Some(&self.body)
    }

    /// Number of non-empty chunks appended
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Take the finished body
    pub fn into_body(self) -> String {
        self.body
    }
}

/// Receives the body of a section as it grows
#[async_trait]
pub trait SectionSink: Send {
    /// Called with the accumulated body after every non-empty chunk
    ///
    /// Return `Ok(false)` to stop the section without an error.
    async fn progress(&mut self, body: &str) -> Result<bool>;
}

/// What a section request produced
pub enum SectionOutput {
    /// Batch result: the whole body
    Complete(String),
    /// Streaming result: body chunks in receipt order
    Chunks(ChunkStream),
}

impl std::fmt::Debug for SectionOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionOutput::Complete(body) => f.debug_tuple("Complete").field(body).finish(),
            SectionOutput::Chunks(_) => f.write_str("Chunks(..)"),
        }
    }
}

/// Issues section requests against the adapter for a provider path
#[derive(Debug, Clone)]
pub struct SectionGenerator {
    providers: Providers,
    selection: ProviderSelection,
    language: String,
}

impl SectionGenerator {
    /// Create a generator for one provider path
    pub fn new(providers: Providers, selection: ProviderSelection, language: impl Into<String>) -> Self {
        Self {
            providers,
            selection,
            language: language.into(),
        }
    }

    /// Send the request for one section
    ///
    /// Standard mode awaits the full body; streaming mode returns as soon as
    /// the response starts and hands back the chunk stream.
    pub async fn request(&self, article_title: &str, section: &Section) -> Result<SectionOutput> {
        let prompt = prompts::section_prompt(article_title, section, &self.language);

        match self.selection {
            ProviderSelection::Standard => {
                let provider = &self.providers.standard;
                let body = provider
                    .complete(&prompt, provider.default_model())
                    .await?;
                Ok(SectionOutput::Complete(body))
            }
            ProviderSelection::Streaming => {
                let provider = self.providers.streaming_provider()?;
                let stream = provider
                    .complete_stream(&prompt, provider.default_model())
                    .await?;
                Ok(SectionOutput::Chunks(stream))
            }
        }
    }

    /// Generate one section to completion
    ///
    /// `sink` sees the accumulated body after every non-empty chunk (once,
    /// with the full body, in standard mode). The first stream error aborts
    /// the section. Returns `None` when the sink stopped the section.
    pub async fn generate<S>(
        &self,
        article_title: &str,
        section: &Section,
        sink: &mut S,
    ) -> Result<Option<String>>
    where
        S: SectionSink + ?Sized,
    {
        match self.request(article_title, section).await? {
            SectionOutput::Complete(body) => {
                if !sink.progress(&body).await? {
                    return Ok(None);
                }
                Ok(Some(body))
            }
            SectionOutput::Chunks(mut stream) => {
                let mut accumulator = SectionAccumulator::new();
                while let Some(chunk) = stream.next().await {
                    let Some(body) = accumulator.push(&chunk?) else {
                        continue;
                    };
                    if !sink.progress(body).await? {
                        return Ok(None);
                    }
                }
                tracing::debug!(
                    section = %section.heading,
                    chunks = accumulator.chunks(),
                    "section stream finished"
                );
                Ok(Some(accumulator.into_body()))
            }
        }
    }
}
