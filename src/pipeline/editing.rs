//! Local edits, markdown rendering, loading saved records and reset

use super::{Action, Pipeline};
use crate::error::{Error, Result};
use crate::types::{ProviderSelection, RecordId};

impl Pipeline {
    /// Replace the outline title
    pub async fn edit_title(&self, title: impl Into<String>) -> Result<()> {
        self.dispatch(Action::EditTitle(title.into())).await?;
        Ok(())
    }

    /// Replace the heading of the section at `index`
    ///
    /// Rejected when another section already uses the heading.
    pub async fn edit_section_heading(&self, index: usize, heading: impl Into<String>) -> Result<()> {
        let action = Action::EditSectionHeading {
            index,
            heading: heading.into(),
        };
        self.dispatch(action).await?;
        Ok(())
    }

    /// Replace the bullets of the section at `index`, one per line of `text`
    pub async fn edit_bullets(&self, index: usize, text: impl Into<String>) -> Result<()> {
        let action = Action::EditBullets {
            index,
            text: text.into(),
        };
        self.dispatch(action).await?;
        Ok(())
    }

    /// Replace the body of one section of a finished article
    pub async fn edit_article_section(
        &self,
        heading: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<()> {
        let action = Action::EditArticleSection {
            heading: heading.into(),
            body: body.into(),
        };
        self.dispatch(action).await?;
        Ok(())
    }

    /// Replace the markdown editor buffer
    pub async fn edit_markdown(&self, text: impl Into<String>) -> Result<()> {
        self.dispatch(Action::EditMarkdown(text.into())).await?;
        Ok(())
    }

    /// Render the held outline into the markdown buffer and return it
    pub async fn render_outline_markdown(&self) -> Result<String> {
        let mut session = self.session.lock().await;
        self.apply_locked(&mut session, Action::RenderOutlineMarkdown)?;
        Ok(session.state.markdown.clone())
    }

    /// Render the finished article into the markdown buffer and return it
    ///
    /// This closes the article: content, outline and editing ids are
    /// cleared and the session returns to idle with only the buffer.
    pub async fn render_article_markdown(&self) -> Result<String> {
        let mut session = self.session.lock().await;
        self.apply_locked(&mut session, Action::RenderArticleMarkdown)?;
        Ok(session.state.markdown.clone())
    }

    /// Switch between the standard and streaming provider paths
    pub async fn set_selection(&self, selection: ProviderSelection) -> Result<()> {
        if selection == ProviderSelection::Streaming {
            self.providers.streaming_provider()?;
        }
        self.dispatch(Action::SetSelection(selection)).await?;
        Ok(())
    }

    /// Return to idle from any state
    ///
    /// Safe to call during a generation: the request keeps running but its
    /// result is discarded when it arrives.
    pub async fn reset(&self) {
        // Reset is always applied
        let _ = self.dispatch(Action::Reset).await;
        tracing::info!("session reset");
    }

    /// Close the outline being edited without saving
    pub async fn cancel_edit(&self) -> Result<()> {
        self.dispatch(Action::CancelEdit).await?;
        Ok(())
    }

    /// Open a saved outline for editing
    pub async fn load_outline(&self, id: &RecordId) -> Result<()> {
        let saved = self
            .outlines
            .get(id)
            .await
            .ok_or_else(|| Error::NotFound(format!("outline {id}")))?;
        self.dispatch(Action::LoadOutline(saved)).await?;
        tracing::info!(%id, "loaded saved outline");
        Ok(())
    }

    /// Open a saved article for editing
    pub async fn load_article(&self, id: &RecordId) -> Result<()> {
        let saved = self
            .articles
            .get(id)
            .await
            .ok_or_else(|| Error::NotFound(format!("article {id}")))?;
        self.dispatch(Action::LoadArticle(saved)).await?;
        tracing::info!(%id, "loaded saved article");
        Ok(())
    }

    /// Open a saved markdown document in the editor buffer
    pub async fn load_markdown(&self, id: &RecordId) -> Result<()> {
        let saved = self
            .markdowns
            .get(id)
            .await
            .ok_or_else(|| Error::NotFound(format!("markdown {id}")))?;
        self.dispatch(Action::LoadMarkdown(saved)).await?;
        tracing::info!(%id, "loaded saved markdown");
        Ok(())
    }
}
