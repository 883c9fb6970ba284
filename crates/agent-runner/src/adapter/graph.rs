//! Adapter for graph-orchestration frameworks

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use hub_core::{AgentConfig, ExecutionRequest};
use serde::Deserialize;
use tracing::{debug, info};

use super::{not_initialized, parse_params, AgentAdapter};
use crate::catalog::{FrameworkCatalog, GraphApp};
use crate::checkpoint::{CheckpointSettings, CheckpointStore};
use crate::error::{AgentError, Result};
use crate::event::{NativeEvent, NativeStream};
use crate::translate::{EventTranslator, GraphTranslator, DEFAULT_ROOT_NAME};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GraphParams {
    /// Catalog name of the graph builder
    graph: String,
    #[serde(default)]
    root_name: Option<String>,
    #[serde(default)]
    checkpoint: CheckpointSettings,
}

struct CompiledGraph {
    app: Arc<dyn GraphApp>,
    checkpointer: Arc<dyn CheckpointStore>,
}

/// Hosts a graph compiled against an adapter-owned checkpointer
pub struct GraphAdapter {
    catalog: Arc<FrameworkCatalog>,
    root_name: String,
    graph: Option<CompiledGraph>,
}

impl GraphAdapter {
    pub fn new(catalog: Arc<FrameworkCatalog>) -> Self {
        Self {
            catalog,
            root_name: DEFAULT_ROOT_NAME.to_string(),
            graph: None,
        }
    }

    fn app(&self) -> Result<&Arc<dyn GraphApp>> {
        self.graph
            .as_ref()
            .map(|graph| &graph.app)
            .ok_or_else(|| not_initialized(self.framework()))
    }
}

#[async_trait]
impl AgentAdapter for GraphAdapter {
    fn framework(&self) -> &'static str {
        "graph"
    }

    async fn initialize(&mut self, config: &AgentConfig) -> Result<()> {
        let params: GraphParams = parse_params(config)?;
        let builder = self.catalog.graph_builder(&params.graph)?;

        let checkpointer = params.checkpoint.open().await?;
        let app = builder.compile(Arc::clone(&checkpointer)).map_err(|e| {
            AgentError::configuration(format!("failed to compile graph '{}': {e:#}", params.graph))
        })?;

        if let Some(root_name) = params.root_name {
            self.root_name = root_name;
        }
        info!(
            "Compiled graph '{}' for agent {} (checkpoint: {:?})",
            params.graph, config.id, params.checkpoint
        );
        self.graph = Some(CompiledGraph { app, checkpointer });
        Ok(())
    }

    async fn invoke(&self, request: &ExecutionRequest) -> Result<String> {
        self.app()?
            .invoke(&request.query, request.thread_id())
            .await
            .map_err(AgentError::from_framework)
    }

    async fn stream(&self, request: &ExecutionRequest) -> Result<NativeStream> {
        let events = self
            .app()?
            .stream_events(&request.query, request.thread_id())
            .map(|item| {
                item.map(NativeEvent::Graph)
                    .map_err(AgentError::from_framework)
            });
        Ok(NativeStream::Async(events.boxed()))
    }

    fn translator(&self) -> Box<dyn EventTranslator> {
        Box::new(GraphTranslator::new(self.root_name.clone()))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(graph) = self.graph.take() {
            debug!("Closing graph checkpointer");
            graph.checkpointer.close().await?;
        }
        Ok(())
    }
}
