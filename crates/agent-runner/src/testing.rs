//! Scripted framework components and adapters for tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use hub_core::{AgentConfig, ExecutionRequest};

use crate::adapter::AgentAdapter;
use crate::catalog::{GraphApp, GraphBuilder, Pipeline, ToolLoopAgent};
use crate::checkpoint::CheckpointStore;
use crate::error::{AgentError, Result};
use crate::event::{
    GraphEvent, ModelChunk, NativeEvent, NativeStream, PipelineEvent, ToolLoopStep,
};
use crate::translate::{EventTranslator, PipelineTranslator, DEFAULT_ROOT_NAME};

fn scripted<T: Send + 'static>(
    items: Vec<T>,
    failure: Option<String>,
) -> BoxStream<'static, anyhow::Result<T>> {
    let tail = failure.map(|message| Err(anyhow::anyhow!(message)));
    stream::iter(items.into_iter().map(Ok).chain(tail)).boxed()
}

/// Graph that replays a fixed list of callback events
#[derive(Clone)]
pub struct ScriptedGraph {
    events: Vec<GraphEvent>,
    answer: String,
    failure: Option<String>,
    invocations: Arc<AtomicUsize>,
}

impl ScriptedGraph {
    /// Graph whose run streams `text` as one model message
    pub fn answering(text: &str) -> Self {
        Self::with_events(
            vec![
                GraphEvent::chain_start(DEFAULT_ROOT_NAME),
                GraphEvent::chain_start("agent"),
                GraphEvent::llm_start("model"),
                GraphEvent::model_chunk("model", ModelChunk::text(text)),
                GraphEvent::llm_end("model"),
                GraphEvent::chain_end("agent"),
                GraphEvent::chain_end(DEFAULT_ROOT_NAME),
            ],
            text,
        )
    }

    pub fn with_events(events: Vec<GraphEvent>, answer: &str) -> Self {
        Self {
            events,
            answer: answer.to_string(),
            failure: None,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail with `message` once the scripted events are exhausted
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Number of invoke and stream calls across all compiled copies
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn compiled(&self) -> Arc<dyn GraphApp> {
        Arc::new(self.clone())
    }
}

impl GraphBuilder for ScriptedGraph {
    fn compile(&self, _checkpointer: Arc<dyn CheckpointStore>) -> anyhow::Result<Arc<dyn GraphApp>> {
        Ok(self.compiled())
    }
}

#[async_trait]
impl GraphApp for ScriptedGraph {
    async fn invoke(&self, _query: &str, _thread_id: &str) -> anyhow::Result<String> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(anyhow::anyhow!(message.clone())),
            None => Ok(self.answer.clone()),
        }
    }

    fn stream_events(
        &self,
        _query: &str,
        _thread_id: &str,
    ) -> BoxStream<'static, anyhow::Result<GraphEvent>> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        scripted(self.events.clone(), self.failure.clone())
    }
}

/// Tool loop that replays fixed steps
pub struct ScriptedToolLoop {
    steps: Vec<ToolLoopStep>,
    failure: Option<String>,
}

impl ScriptedToolLoop {
    pub fn new(steps: Vec<ToolLoopStep>) -> Self {
        Self {
            steps,
            failure: None,
        }
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }
}

impl ToolLoopAgent for ScriptedToolLoop {
    fn run(&self, _query: &str, _thread_id: &str) -> anyhow::Result<String> {
        if let Some(message) = &self.failure {
            anyhow::bail!("{message}");
        }
        Ok(self
            .steps
            .iter()
            .filter_map(|step| match step {
                ToolLoopStep::Answer { text } => Some(text.as_str()),
                _ => None,
            })
            .collect())
    }

    fn steps(
        &self,
        _query: &str,
        _thread_id: &str,
    ) -> Box<dyn Iterator<Item = anyhow::Result<ToolLoopStep>> + Send> {
        let tail = self
            .failure
            .clone()
            .map(|message| Err(anyhow::anyhow!(message)));
        Box::new(self.steps.clone().into_iter().map(Ok).chain(tail))
    }
}

/// Pipeline that replays fixed events
pub struct ScriptedPipeline {
    events: Vec<PipelineEvent>,
    answer: String,
}

impl ScriptedPipeline {
    pub fn new(events: Vec<PipelineEvent>, answer: &str) -> Self {
        Self {
            events,
            answer: answer.to_string(),
        }
    }
}

#[async_trait]
impl Pipeline for ScriptedPipeline {
    async fn run(&self, _query: &str, _thread_id: &str) -> anyhow::Result<String> {
        Ok(self.answer.clone())
    }

    fn stream(
        &self,
        _query: &str,
        _thread_id: &str,
    ) -> BoxStream<'static, anyhow::Result<PipelineEvent>> {
        scripted(self.events.clone(), None)
    }
}

/// Call counters shared between a mock adapter and its test
#[derive(Debug, Default, Clone)]
pub struct AdapterCalls {
    pub initialize: Arc<AtomicUsize>,
    pub invoke: Arc<AtomicUsize>,
    pub stream: Arc<AtomicUsize>,
    pub close: Arc<AtomicUsize>,
}

impl AdapterCalls {
    pub fn executions(&self) -> usize {
        self.invoke.load(Ordering::SeqCst) + self.stream.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.close.load(Ordering::SeqCst)
    }
}

/// Adapter that answers with a fixed response and streams pipeline events
pub struct MockAdapter {
    response: String,
    events: Vec<PipelineEvent>,
    failure: Option<String>,
    calls: AdapterCalls,
}

impl MockAdapter {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            events: vec![PipelineEvent::Chunk {
                content: response.to_string(),
            }],
            failure: None,
            calls: AdapterCalls::default(),
        }
    }

    pub fn with_events(mut self, events: Vec<PipelineEvent>) -> Self {
        self.events = events;
        self
    }

    /// Fail invoke, and fail the stream after its events
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> AdapterCalls {
        self.calls.clone()
    }
}

#[async_trait]
impl AgentAdapter for MockAdapter {
    fn framework(&self) -> &'static str {
        "mock"
    }

    async fn initialize(&mut self, _config: &AgentConfig) -> Result<()> {
        self.calls.initialize.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn invoke(&self, _request: &ExecutionRequest) -> Result<String> {
        self.calls.invoke.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(AgentError::execution(message.clone())),
            None => Ok(self.response.clone()),
        }
    }

    async fn stream(&self, _request: &ExecutionRequest) -> Result<NativeStream> {
        self.calls.stream.fetch_add(1, Ordering::SeqCst);
        let stream = scripted(self.events.clone(), self.failure.clone()).map(|item| {
            item.map(NativeEvent::Pipeline)
                .map_err(AgentError::from_framework)
        });
        Ok(NativeStream::Async(stream.boxed()))
    }

    fn translator(&self) -> Box<dyn EventTranslator> {
        Box::new(PipelineTranslator::new())
    }

    async fn close(&mut self) -> Result<()> {
        self.calls.close.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn mock_config() -> AgentConfig {
    AgentConfig::new("mock-agent", "Mock agent", "mock")
}
