//! Outline request and the per-section article loop

use super::{Action, Effect, Pipeline};
use crate::error::Result;
use crate::generator::{SectionGenerator, SectionSink};
use crate::outline::parse_outline;
use crate::provider::prompts;
use crate::types::{Outline, ProviderSelection, RequestToken, Section};
use async_trait::async_trait;

impl Pipeline {
    /// Generate an outline for `topic`
    ///
    /// Resolves once the outline is ready or has failed. A blank topic is a
    /// validation error and changes nothing. Submitting while a generation is
    /// already in flight does nothing and returns `Ok`. If the session was
    /// reset or moved on while the request was out, the result is dropped
    /// and this also returns `Ok`.
    pub async fn submit_topic(&self, topic: &str) -> Result<()> {
        let action = Action::Submit {
            topic: topic.to_string(),
            status: self.config.status_messages.first().cloned(),
        };
        let Some(effects) = self.dispatch(action).await? else {
            tracing::info!("outline submit ignored, a generation is already in flight");
            return Ok(());
        };

        for effect in effects {
            if let Effect::RequestOutline {
                token,
                topic,
                selection,
            } = effect
            {
                return self.run_outline(token, &topic, selection).await;
            }
        }
        Ok(())
    }

    /// Generate every section of the held outline, in order
    ///
    /// Resolves when the article is complete or the first section fails.
    /// Sections finished before a failure keep their content.
    pub async fn generate_article(&self) -> Result<()> {
        let Some(effects) = self.dispatch(Action::GenerateArticle).await? else {
            tracing::info!("article request ignored, a generation is already in flight");
            return Ok(());
        };

        for effect in effects {
            if let Effect::RequestArticle {
                token,
                outline,
                selection,
            } = effect
            {
                return self.run_article(token, outline, selection).await;
            }
        }
        Ok(())
    }

    async fn run_outline(
        &self,
        token: RequestToken,
        topic: &str,
        selection: ProviderSelection,
    ) -> Result<()> {
        tracing::info!(%token, topic = %topic, ?selection, "generating outline");

        match self.request_outline(topic, selection).await {
            Ok(outline) => {
                tracing::info!(
                    %token,
                    title = %outline.title,
                    sections = outline.sections.len(),
                    "outline ready"
                );
                let action = Action::OutlineResolved {
                    token,
                    result: Ok(outline),
                };
                if self.dispatch(action).await?.is_none() {
                    tracing::debug!(%token, "discarding outline for a superseded request");
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%token, error = %e, "outline generation failed");
                let action = Action::OutlineResolved {
                    token,
                    result: Err(e.to_string()),
                };
                match self.dispatch(action).await? {
                    Some(_) => Err(e),
                    None => Ok(()),
                }
            }
        }
    }

    async fn request_outline(&self, topic: &str, selection: ProviderSelection) -> Result<Outline> {
        let provider = self.providers.batch_for(selection)?;
        let prompt = prompts::outline_prompt(topic, &self.config.output_language);
        let raw = provider.complete(&prompt, provider.default_model()).await?;
        parse_outline(&raw)
    }

    async fn run_article(
        &self,
        token: RequestToken,
        outline: Outline,
        selection: ProviderSelection,
    ) -> Result<()> {
        tracing::info!(
            %token,
            title = %outline.title,
            sections = outline.sections.len(),
            ?selection,
            "generating article"
        );

        let generator = SectionGenerator::new(
            self.providers.clone(),
            selection,
            self.config.output_language.clone(),
        );

        for (index, section) in outline.sections.iter().enumerate() {
            if self
                .dispatch(Action::SectionStarted { token, index })
                .await?
                .is_none()
            {
                tracing::debug!(%token, "article request superseded, stopping");
                return Ok(());
            }

            match self
                .generate_section(token, &generator, &outline.title, section)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(%token, "article request superseded mid-section, stopping");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        %token,
                        section = %section.heading,
                        error = %e,
                        "section generation failed, abandoning remaining sections"
                    );
                    let action = Action::SectionFailed {
                        token,
                        error: format!(
                            "failed to generate section '{}': {}",
                            section.heading, e
                        ),
                    };
                    return match self.dispatch(action).await? {
                        Some(_) => Err(e),
                        None => Ok(()),
                    };
                }
            }

            if self
                .dispatch(Action::SectionCompleted { token })
                .await?
                .is_none()
            {
                return Ok(());
            }
        }

        if self
            .dispatch(Action::ArticleCompleted { token })
            .await?
            .is_some()
        {
            tracing::info!(%token, title = %outline.title, "article complete");
        }
        Ok(())
    }

    /// Generate one section, publishing progress as it grows
    ///
    /// Returns `false` if the request was superseded part way.
    async fn generate_section(
        &self,
        token: RequestToken,
        generator: &SectionGenerator,
        article_title: &str,
        section: &Section,
    ) -> Result<bool> {
        let mut sink = ProgressDispatch {
            pipeline: self,
            token,
        };
        let body = generator.generate(article_title, section, &mut sink).await?;
        Ok(body.is_some())
    }
}

/// Turns section progress into reducer actions for one article request
struct ProgressDispatch<'a> {
    pipeline: &'a Pipeline,
    token: RequestToken,
}

#[async_trait]
impl<'a> SectionSink for ProgressDispatch<'a> {
    async fn progress(&mut self, body: &str) -> Result<bool> {
        let action = Action::SectionProgress {
            token: self.token,
            body: body.to_string(),
        };
        Ok(self.pipeline.dispatch(action).await?.is_some())
    }
}
