use super::Pipeline;
use super::state::SessionState;
use super::test_helpers::{OUTLINE_RESPONSE, ScriptedProvider, create_test_pipeline};
use crate::types::Event;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;


/// Pipeline that has already produced the three-section outline
async fn pipeline_with_outline() -> (Pipeline, Arc<ScriptedProvider>) {
    let (pipeline, provider) = create_test_pipeline();
    provider.push_completion(Ok(OUTLINE_RESPONSE.into()));
    pipeline.submit_topic("remote work tips").await.unwrap();
    (pipeline, provider)
}

/// Pipeline holding a finished article generated on the standard path
async fn pipeline_with_article() -> (Pipeline, Arc<ScriptedProvider>) {
    let (pipeline, provider) = pipeline_with_outline().await;
    provider.push_completion(Ok("intro body".into()));
    provider.push_completion(Ok("tools body".into()));
    provider.push_completion(Ok("wrap-up body".into()));
    pipeline.generate_article().await.unwrap();
    (pipeline, provider)
}

/// Everything received so far, without waiting
fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Poll the session until `predicate` holds
async fn wait_for_state<F>(pipeline: &Pipeline, predicate: F) -> SessionState
where
    F: Fn(&SessionState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let state = pipeline.snapshot().await;
            if predicate(&state) {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session did not reach the expected state")
}
