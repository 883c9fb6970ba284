//! Framework component catalog
//!
//! Agent configurations refer to framework components by symbolic name.
//! The embedding application registers those components here at process
//! start; adapters resolve them during `initialize`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::checkpoint::CheckpointStore;
use crate::error::{AgentError, Result};
use crate::event::{GraphEvent, PipelineEvent, ToolLoopStep};

/// Graph application compiled against a checkpointer
#[async_trait]
pub trait GraphApp: Send + Sync {
    /// Run the graph to completion and return the final answer
    async fn invoke(&self, query: &str, thread_id: &str) -> anyhow::Result<String>;

    /// Run the graph, yielding callback events as they happen
    fn stream_events(
        &self,
        query: &str,
        thread_id: &str,
    ) -> BoxStream<'static, anyhow::Result<GraphEvent>>;
}

/// Uncompiled graph definition
pub trait GraphBuilder: Send + Sync {
    fn compile(&self, checkpointer: Arc<dyn CheckpointStore>) -> anyhow::Result<Arc<dyn GraphApp>>;
}

/// Registered graph: either still buildable or already frozen
#[derive(Clone)]
pub enum GraphEntry {
    Buildable(Arc<dyn GraphBuilder>),
    Compiled(Arc<dyn GraphApp>),
}

/// Blocking, imperative tool-loop agent
pub trait ToolLoopAgent: Send + Sync {
    /// Run to completion and return the answer. Blocks the calling thread.
    fn run(&self, query: &str, thread_id: &str) -> anyhow::Result<String>;

    /// Lazily produce the agent's steps. Each `next()` may block.
    fn steps(
        &self,
        query: &str,
        thread_id: &str,
    ) -> Box<dyn Iterator<Item = anyhow::Result<ToolLoopStep>> + Send>;
}

/// Pipeline of components
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn run(&self, query: &str, thread_id: &str) -> anyhow::Result<String>;

    fn stream(
        &self,
        query: &str,
        thread_id: &str,
    ) -> BoxStream<'static, anyhow::Result<PipelineEvent>>;
}

/// Named framework components available to adapters
#[derive(Clone, Default)]
pub struct FrameworkCatalog {
    graphs: HashMap<String, GraphEntry>,
    tool_loops: HashMap<String, Arc<dyn ToolLoopAgent>>,
    pipelines: HashMap<String, Arc<dyn Pipeline>>,
}

impl fmt::Debug for FrameworkCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameworkCatalog")
            .field("graphs", &self.graphs.keys().collect::<Vec<_>>())
            .field("tool_loops", &self.tool_loops.keys().collect::<Vec<_>>())
            .field("pipelines", &self.pipelines.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FrameworkCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_graph(&mut self, name: impl Into<String>, builder: Arc<dyn GraphBuilder>) {
        self.graphs
            .insert(name.into(), GraphEntry::Buildable(builder));
    }

    /// Register a graph that was compiled elsewhere
    ///
    /// Such graphs cannot be hosted: the adapter has to attach its own
    /// checkpointer. They are accepted here so that configuration mistakes
    /// surface as configuration errors rather than missing symbols.
    pub fn register_compiled_graph(&mut self, name: impl Into<String>, app: Arc<dyn GraphApp>) {
        self.graphs.insert(name.into(), GraphEntry::Compiled(app));
    }

    pub fn register_tool_loop(&mut self, name: impl Into<String>, agent: Arc<dyn ToolLoopAgent>) {
        self.tool_loops.insert(name.into(), agent);
    }

    pub fn register_pipeline(&mut self, name: impl Into<String>, pipeline: Arc<dyn Pipeline>) {
        self.pipelines.insert(name.into(), pipeline);
    }

    /// Resolve a graph that can still be compiled
    pub fn graph_builder(&self, name: &str) -> Result<Arc<dyn GraphBuilder>> {
        match self.graphs.get(name) {
            Some(GraphEntry::Buildable(builder)) => Ok(Arc::clone(builder)),
            Some(GraphEntry::Compiled(_)) => Err(AgentError::configuration(format!(
                "graph '{name}' is already compiled; register its builder so a checkpointer can be attached"
            ))),
            None => Err(AgentError::load(format!("graph '{name}' is not registered"))),
        }
    }

    pub fn tool_loop(&self, name: &str) -> Result<Arc<dyn ToolLoopAgent>> {
        self.tool_loops
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::load(format!("tool loop '{name}' is not registered")))
    }

    pub fn pipeline(&self, name: &str) -> Result<Arc<dyn Pipeline>> {
        self.pipelines
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::load(format!("pipeline '{name}' is not registered")))
    }
}
