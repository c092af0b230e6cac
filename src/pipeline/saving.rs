//! Saving, listing and deleting records
//!
//! Saves run under the session lock so the saved snapshot cannot interleave
//! with a transition. Storage failures are logged by the collection and do
//! not fail the save.

use super::{Action, Pipeline};
use crate::error::{Error, Result};
use crate::markdown::markdown_title;
use crate::store::{Collection, SavedRecord};
use crate::types::{RecordId, SavedArticle, SavedMarkdown, SavedOutline};

impl Pipeline {
    /// Save the held outline and return to idle
    ///
    /// Updates the record being edited, if any, otherwise inserts a new one.
    pub async fn save_outline(&self) -> Result<RecordId> {
        self.store_outline(true).await
    }

    /// Save the held outline and keep editing it
    ///
    /// Later saves update the same record.
    pub async fn checkpoint_outline(&self) -> Result<RecordId> {
        self.store_outline(false).await
    }

    /// Save the generated article and return to idle
    pub async fn save_article(&self) -> Result<RecordId> {
        self.store_article(true).await
    }

    /// Save the generated article and keep it open
    pub async fn checkpoint_article(&self) -> Result<RecordId> {
        self.store_article(false).await
    }

    /// Save the markdown buffer as a document
    ///
    /// The title is taken from the first line. The buffer and markdown
    /// editing id are cleared afterwards; the rest of the session is kept.
    pub async fn save_markdown(&self) -> Result<RecordId> {
        let mut session = self.session.lock().await;
        let state = &session.state;
        if state.markdown.trim().is_empty() {
            return Err(Error::Validation("the markdown document is empty".to_string()));
        }

        let content = state.markdown.clone();
        let title = markdown_title(&content);
        let editing = state.editing.markdown.clone();

        let (id, updated) = self
            .markdowns
            .upsert_with(editing.as_ref(), |id, created_at| SavedMarkdown {
                id,
                created_at,
                title,
                content,
            })
            .await;

        tracing::info!(%id, updated, "markdown saved");
        self.apply_locked(
            &mut session,
            Action::MarkdownSaved {
                id: id.clone(),
                updated,
            },
        )?;
        Ok(id)
    }

    /// Saved outlines, newest first
    pub async fn saved_outlines(&self) -> Vec<SavedOutline> {
        self.outlines.list().await
    }

    /// Saved articles, newest first
    pub async fn saved_articles(&self) -> Vec<SavedArticle> {
        self.articles.list().await
    }

    /// Saved markdown documents, newest first
    pub async fn saved_markdowns(&self) -> Vec<SavedMarkdown> {
        self.markdowns.list().await
    }

    /// Delete a saved outline
    pub async fn delete_outline(&self, id: &RecordId) -> Result<()> {
        self.delete_record(&self.outlines, id).await
    }

    /// Delete a saved article
    pub async fn delete_article(&self, id: &RecordId) -> Result<()> {
        self.delete_record(&self.articles, id).await
    }

    /// Delete a saved markdown document
    pub async fn delete_markdown(&self, id: &RecordId) -> Result<()> {
        self.delete_record(&self.markdowns, id).await
    }

    async fn store_outline(&self, close: bool) -> Result<RecordId> {
        let mut session = self.session.lock().await;
        let state = &session.state;
        if state.phase.is_generating() {
            return Err(Error::Validation(
                "cannot save while a generation is in flight".to_string(),
            ));
        }
        let outline = state
            .outline
            .clone()
            .ok_or_else(|| Error::Validation("there is no outline to save".to_string()))?;
        let editing = state.editing.outline.clone();

        let (id, updated) = self
            .outlines
            .upsert_with(editing.as_ref(), |id, created_at| SavedOutline {
                id,
                created_at,
                outline,
            })
            .await;

        tracing::info!(%id, updated, close, "outline saved");
        self.apply_locked(
            &mut session,
            Action::OutlineSaved {
                id: id.clone(),
                updated,
                close,
            },
        )?;
        Ok(id)
    }

    async fn store_article(&self, close: bool) -> Result<RecordId> {
        let mut session = self.session.lock().await;
        let state = &session.state;
        if state.phase.is_generating() {
            return Err(Error::Validation(
                "cannot save while a generation is in flight".to_string(),
            ));
        }
        let outline = state
            .outline
            .clone()
            .ok_or_else(|| Error::Validation("there is no article to save".to_string()))?;
        if state.article.is_empty() {
            return Err(Error::Validation("the article has no content".to_string()));
        }
        let content = state.article.to_parts();
        let editing = state.editing.article.clone();

        let (id, updated) = self
            .articles
            .upsert_with(editing.as_ref(), |id, created_at| SavedArticle {
                id,
                created_at,
                outline,
                content,
            })
            .await;

        tracing::info!(%id, updated, close, "article saved");
        self.apply_locked(
            &mut session,
            Action::ArticleSaved {
                id: id.clone(),
                updated,
                close,
            },
        )?;
        Ok(id)
    }

    async fn delete_record<T: SavedRecord>(
        &self,
        collection: &Collection<T>,
        id: &RecordId,
    ) -> Result<()> {
        if !collection.remove(id).await {
            return Err(Error::NotFound(format!("{} {}", T::KIND, id)));
        }

        tracing::info!(kind = %T::KIND, %id, "record deleted");
        self.dispatch(Action::RecordDeleted {
            kind: T::KIND,
            id: id.clone(),
        })
        .await?;
        Ok(())
    }
}
