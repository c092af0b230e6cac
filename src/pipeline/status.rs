//! Advisory status rotation while the outline is generated

use super::{Action, Pipeline, Session};
use crate::types::RequestToken;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

impl Pipeline {
    /// Start rotating status messages for an outline request
    ///
    /// The first message is shown by the submit itself; the task walks the
    /// rest of the list once and leaves the last one up.
    pub(super) fn start_rotation(&self, session: &mut Session, token: RequestToken) {
        if let Some(previous) = session.rotation.take() {
            previous.cancel();
        }
        if self.config.status_messages.len() < 2 {
            return;
        }

        let cancel = CancellationToken::new();
        session.rotation = Some(cancel.clone());

        let pipeline = self.clone();
        tokio::spawn(async move {
            pipeline.rotate_status(token, cancel).await;
        });
    }

    async fn rotate_status(self, token: RequestToken, cancel: CancellationToken) {
        let period = self.config.status_interval.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately
        interval.tick().await;

        for message in self.config.status_messages.iter().skip(1) {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(%token, "status rotation cancelled");
                    return;
                }
                _ = interval.tick() => {}
            }

            let action = Action::StatusAdvanced {
                token,
                message: message.clone(),
            };
            match self.dispatch(action).await {
                Ok(Some(_)) => {}
                _ => return,
            }
        }

        tracing::debug!(%token, "status rotation reached its last message");
    }
}
