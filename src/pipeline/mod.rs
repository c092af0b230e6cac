//! Generation pipeline controller
//!
//! [`Pipeline`] owns one session and drives it through
//! idle → outline → article → markdown. Every state change goes through the
//! pure reducer in [`state`]; this module performs the effects it asks for.
//!
//! Methods are organized by concern:
//! - [`generation`] - Outline request and the per-section article loop
//! - [`status`] - Advisory status rotation while the outline is generated
//! - [`editing`] - Local edits, markdown rendering, loads, reset
//! - [`saving`] - Saving, listing and deleting records

mod editing;
mod generation;
mod saving;
pub mod state;
mod status;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use state::{Action, EditingIds, Effect, Outcome, SessionState, Step};

use crate::config::{Config, PipelineConfig};
use crate::error::{Error, Result};
use crate::provider::Providers;
use crate::store::{Collection, KeyValueStore, SqliteStore};
use crate::types::{Event, ProviderSelection, SavedArticle, SavedMarkdown, SavedOutline};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;

/// Session state plus the handle of its running status rotation
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) state: SessionState,
    pub(crate) rotation: Option<CancellationToken>,
}

/// Pipeline controller (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Pipeline {
    /// The one session, guarded so transitions apply one at a time
    pub(crate) session: Arc<Mutex<Session>>,
    /// Model provider adapters
    pub(crate) providers: Providers,
    /// Saved outlines
    pub(crate) outlines: Collection<SavedOutline>,
    /// Saved articles
    pub(crate) articles: Collection<SavedArticle>,
    /// Saved markdown documents
    pub(crate) markdowns: Collection<SavedMarkdown>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Pipeline configuration
    pub(crate) config: Arc<PipelineConfig>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("providers", &self.providers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a pipeline over the given providers and store
    ///
    /// If the configured default selection is streaming but no streaming
    /// provider is available, the session starts on the standard path.
    pub fn new(
        config: PipelineConfig,
        providers: Providers,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let mut selection = config.default_selection;
        if selection == ProviderSelection::Streaming && providers.streaming.is_none() {
            tracing::warn!("no streaming provider configured, starting on the standard path");
            selection = ProviderSelection::Standard;
        }

        // Buffer of 1000 events so slow subscribers do not lag during streaming
        let (event_tx, _rx) = broadcast::channel(1000);

        Self {
            session: Arc::new(Mutex::new(Session {
                state: SessionState::new(selection),
                rotation: None,
            })),
            providers,
            outlines: Collection::new(store.clone()),
            articles: Collection::new(store.clone()),
            markdowns: Collection::new(store),
            event_tx,
            config: Arc::new(config),
        }
    }

    /// Build providers and open the SQLite store from configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let providers = Providers::from_config(&config.providers)?;
        let store = SqliteStore::new(&config.persistence.database_path).await?;

        tracing::info!(
            standard = providers.standard.name(),
            streaming = providers.streaming.as_ref().map(|p| p.name()),
            database = %config.persistence.database_path.display(),
            "pipeline ready"
        );

        Ok(Self::new(config.pipeline.clone(), providers, Arc::new(store)))
    }

    /// Subscribe to pipeline events
    ///
    /// Each subscriber gets every event emitted after it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Copy of the current session state
    pub async fn snapshot(&self) -> SessionState {
        self.session.lock().await.state.clone()
    }

    /// Apply one action under the session lock
    ///
    /// Returns `None` when the action was ignored, otherwise the provider
    /// requests the caller has to carry out.
    pub(crate) async fn dispatch(&self, action: Action) -> Result<Option<Vec<Effect>>> {
        let mut session = self.session.lock().await;
        self.apply_locked(&mut session, action)
    }

    /// Run the reducer and perform its immediate effects
    ///
    /// Events and status-rotation changes happen here, while the lock is
    /// held, so they are ordered exactly like the transitions that caused
    /// them. Provider requests are handed back to the caller.
    pub(crate) fn apply_locked(
        &self,
        session: &mut Session,
        action: Action,
    ) -> Result<Option<Vec<Effect>>> {
        let state = std::mem::take(&mut session.state);
        let Step {
            state,
            effects,
            outcome,
        } = state.apply(action);
        session.state = state;

        match outcome {
            Outcome::Applied => {}
            Outcome::Ignored(reason) => {
                tracing::debug!(reason, "action ignored");
                return Ok(None);
            }
            Outcome::Rejected(message) => return Err(Error::Validation(message)),
        }

        let mut requests = Vec::new();
        for effect in effects {
            match effect {
                Effect::Emit(event) => {
                    // No subscribers is fine
                    let _ = self.event_tx.send(event);
                }
                Effect::StartStatusRotation { token } => self.start_rotation(session, token),
                Effect::CancelStatusRotation => {
                    if let Some(rotation) = session.rotation.take() {
                        rotation.cancel();
                    }
                }
                request => requests.push(request),
            }
        }
        Ok(Some(requests))
    }
}
