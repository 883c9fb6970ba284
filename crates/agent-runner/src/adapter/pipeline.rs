//! Adapter for pipeline/component frameworks

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use hub_core::{AgentConfig, ExecutionRequest};
use serde::Deserialize;
use tracing::info;

use super::{not_initialized, parse_params, AgentAdapter};
use crate::catalog::{FrameworkCatalog, Pipeline};
use crate::error::{AgentError, Result};
use crate::event::{NativeEvent, NativeStream};
use crate::translate::{EventTranslator, PipelineTranslator};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PipelineParams {
    pipeline: String,
}

pub struct PipelineAdapter {
    catalog: Arc<FrameworkCatalog>,
    pipeline: Option<Arc<dyn Pipeline>>,
}

impl PipelineAdapter {
    pub fn new(catalog: Arc<FrameworkCatalog>) -> Self {
        Self {
            catalog,
            pipeline: None,
        }
    }

    fn pipeline(&self) -> Result<&Arc<dyn Pipeline>> {
        self.pipeline
            .as_ref()
            .ok_or_else(|| not_initialized(self.framework()))
    }
}

#[async_trait]
impl AgentAdapter for PipelineAdapter {
    fn framework(&self) -> &'static str {
        "pipeline"
    }

    async fn initialize(&mut self, config: &AgentConfig) -> Result<()> {
        let params: PipelineParams = parse_params(config)?;
        self.pipeline = Some(self.catalog.pipeline(&params.pipeline)?);
        info!("Resolved pipeline '{}' for agent {}", params.pipeline, config.id);
        Ok(())
    }

    async fn invoke(&self, request: &ExecutionRequest) -> Result<String> {
        self.pipeline()?
            .run(&request.query, request.thread_id())
            .await
            .map_err(AgentError::from_framework)
    }

    async fn stream(&self, request: &ExecutionRequest) -> Result<NativeStream> {
        let events = self
            .pipeline()?
            .stream(&request.query, request.thread_id())
            .map(|item| {
                item.map(NativeEvent::Pipeline)
                    .map_err(AgentError::from_framework)
            });
        Ok(NativeStream::Async(events.boxed()))
    }

    fn translator(&self) -> Box<dyn EventTranslator> {
        Box::new(PipelineTranslator::new())
    }

    async fn close(&mut self) -> Result<()> {
        self.pipeline = None;
        Ok(())
    }
}
