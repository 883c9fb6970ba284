//! Adapter for blocking tool-loop agents

use std::sync::Arc;

use async_trait::async_trait;
use hub_core::{AgentConfig, ExecutionRequest};
use serde::Deserialize;
use tracing::info;

use super::{not_initialized, parse_params, AgentAdapter};
use crate::catalog::{FrameworkCatalog, ToolLoopAgent};
use crate::error::{AgentError, Result};
use crate::event::{NativeEvent, NativeStream};
use crate::translate::{EventTranslator, ToolLoopTranslator};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolLoopParams {
    agent: String,
}

/// Hosts a tool-loop agent whose calls block the calling thread
///
/// `invoke` runs on the blocking pool; `stream` hands back a blocking
/// iterator which the router drains through the stream bridge.
pub struct ToolLoopAdapter {
    catalog: Arc<FrameworkCatalog>,
    agent: Option<Arc<dyn ToolLoopAgent>>,
}

impl ToolLoopAdapter {
    pub fn new(catalog: Arc<FrameworkCatalog>) -> Self {
        Self {
            catalog,
            agent: None,
        }
    }

    fn agent(&self) -> Result<Arc<dyn ToolLoopAgent>> {
        self.agent
            .clone()
            .ok_or_else(|| not_initialized(self.framework()))
    }
}

#[async_trait]
impl AgentAdapter for ToolLoopAdapter {
    fn framework(&self) -> &'static str {
        "tool_loop"
    }

    async fn initialize(&mut self, config: &AgentConfig) -> Result<()> {
        let params: ToolLoopParams = parse_params(config)?;
        self.agent = Some(self.catalog.tool_loop(&params.agent)?);
        info!("Resolved tool loop '{}' for agent {}", params.agent, config.id);
        Ok(())
    }

    async fn invoke(&self, request: &ExecutionRequest) -> Result<String> {
        let agent = self.agent()?;
        let query = request.query.clone();
        let thread_id = request.thread_id().to_string();

        tokio::task::spawn_blocking(move || agent.run(&query, &thread_id))
            .await
            .map_err(|e| AgentError::execution(format!("tool loop worker failed: {e}")))?
            .map_err(AgentError::from_framework)
    }

    async fn stream(&self, request: &ExecutionRequest) -> Result<NativeStream> {
        let steps = self
            .agent()?
            .steps(&request.query, request.thread_id())
            .map(|item| {
                item.map(NativeEvent::ToolLoop)
                    .map_err(AgentError::from_framework)
            });
        Ok(NativeStream::Blocking(Box::new(steps)))
    }

    fn translator(&self) -> Box<dyn EventTranslator> {
        Box::new(ToolLoopTranslator::new())
    }

    async fn close(&mut self) -> Result<()> {
        self.agent = None;
        Ok(())
    }
}
