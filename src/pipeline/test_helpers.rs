//! Scripted providers and pipeline constructors for tests.

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::provider::{ChunkStream, CompletionProvider, Providers, StreamingProvider};
use crate::store::{KeyValueStore, MemoryStore};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, oneshot};

/// A well-formed outline response with three sections
pub(crate) const OUTLINE_RESPONSE: &str = "```json\n{\"title\":\"Remote Work\",\"outline\":[\
{\"section\":\"Intro\",\"subsections\":[\"why it matters\"]},\
{\"section\":\"Tools\",\"subsections\":[\"chat\",\"video\"]},\
{\"section\":\"Wrap-up\",\"subsections\":[]}]}\n```";

/// One step of a scripted chunk stream
#[derive(Debug, Clone)]
pub(crate) enum StreamStep {
    /// Yield a chunk
    Chunk(String),
    /// Yield a transport error
    Fail(String),
    /// Wait until the gate is notified
    Pause(Arc<Notify>),
}

enum Completion {
    Ready(Result<String>),
    Pending(oneshot::Receiver<Result<String>>),
}

/// Provider that replays queued responses in order
///
/// Batch and streaming calls draw from separate queues. An exhausted queue
/// answers with a transport error.
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    completions: Mutex<VecDeque<Completion>>,
    streams: Mutex<VecDeque<Vec<StreamStep>>>,
    prompts: Mutex<Vec<String>>,
    called: Notify,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_completion(&self, result: Result<String>) {
        self.completions
            .lock()
            .unwrap()
            .push_back(Completion::Ready(result));
    }

    /// Queue a batch response that is held until the returned sender fires
    pub(crate) fn push_pending_completion(&self) -> oneshot::Sender<Result<String>> {
        let (tx, rx) = oneshot::channel();
        self.completions
            .lock()
            .unwrap()
            .push_back(Completion::Pending(rx));
        tx
    }

    pub(crate) fn push_stream(&self, steps: Vec<StreamStep>) {
        self.streams.lock().unwrap().push_back(steps);
    }

    /// Every prompt received, in call order
    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Wait until at least `n` calls have been made
    pub(crate) async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let notified = self.called.notified();
                if self.calls() >= n {
                    return;
                }
                notified.await;
            }
        })
        .await
        .expect("provider was not called in time");
    }

    fn record(&self, prompt: &str) {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.called.notify_waiters();
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, prompt: &str, _model: &str) -> Result<String> {
        self.record(prompt);
        let next = self.completions.lock().unwrap().pop_front();
        match next {
            Some(Completion::Ready(result)) => result,
            Some(Completion::Pending(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(Error::Transport("response dropped".into()))),
            None => Err(Error::Transport("no scripted completion left".into())),
        }
    }
}

#[async_trait]
impl StreamingProvider for ScriptedProvider {
    async fn complete_stream(&self, prompt: &str, _model: &str) -> Result<ChunkStream> {
        self.record(prompt);
        let steps = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Transport("no scripted stream left".into()))?;

        let stream = futures::stream::iter(steps)
            .then(|step| async move {
                match step {
                    StreamStep::Chunk(text) => Some(Ok(text)),
                    StreamStep::Fail(message) => Some(Err(Error::Transport(message))),
                    StreamStep::Pause(gate) => {
                        gate.notified().await;
                        None
                    }
                }
            })
            .filter_map(futures::future::ready);
        Ok(stream.boxed())
    }
}

/// Pipeline config with a fast status rotation
pub(crate) fn test_pipeline_config() -> PipelineConfig {
    PipelineConfig {
        status_interval: Duration::from_millis(20),
        ..PipelineConfig::default()
    }
}

/// Pipeline over one scripted provider serving both paths and an in-memory store
pub(crate) fn create_test_pipeline() -> (Pipeline, Arc<ScriptedProvider>) {
    let provider = Arc::new(ScriptedProvider::new());
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let pipeline = create_test_pipeline_with(provider.clone(), store);
    (pipeline, provider)
}

pub(crate) fn create_test_pipeline_with(
    provider: Arc<ScriptedProvider>,
    store: Arc<dyn KeyValueStore>,
) -> Pipeline {
    let providers = Providers::new(provider.clone(), Some(provider));
    Pipeline::new(test_pipeline_config(), providers, store)
}
