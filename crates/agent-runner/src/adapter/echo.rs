//! Built-in stateful echo agent
//!
//! Counts calls per thread in its checkpoint store and answers
//! `echo #<n>: <query>`. Useful as a smoke test for session stickiness: the
//! counter only advances when the same thread id comes back.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use hub_core::{AgentConfig, ExecutionRequest};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{not_initialized, parse_params, AgentAdapter};
use crate::checkpoint::{CheckpointSettings, CheckpointStore};
use crate::error::Result;
use crate::event::{NativeEvent, NativeStream, PipelineEvent};
use crate::translate::{EventTranslator, PipelineTranslator};

const COMPONENT: &str = "echo";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EchoParams {
    #[serde(default)]
    checkpoint: CheckpointSettings,
}

#[derive(Default)]
pub struct EchoAdapter {
    store: Option<Arc<dyn CheckpointStore>>,
    // Serializes read-modify-write of the counter
    counter_lock: Mutex<()>,
}

impl EchoAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    async fn next_count(&self, thread_id: &str) -> Result<u64> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| not_initialized(self.framework()))?;

        let _guard = self.counter_lock.lock().await;
        let previous = store
            .load(thread_id)
            .await?
            .and_then(|checkpoint| checkpoint.state.get("count").and_then(|c| c.as_u64()))
            .unwrap_or(0);
        let count = previous + 1;
        store.save(thread_id, json!({ "count": count })).await?;
        debug!("Echo thread {} is at call {}", thread_id, count);
        Ok(count)
    }

    async fn answer(&self, request: &ExecutionRequest) -> Result<String> {
        let count = self.next_count(request.thread_id()).await?;
        Ok(format!("echo #{}: {}", count, request.query))
    }
}

#[async_trait]
impl AgentAdapter for EchoAdapter {
    fn framework(&self) -> &'static str {
        "echo"
    }

    async fn initialize(&mut self, config: &AgentConfig) -> Result<()> {
        let params: EchoParams = parse_params(config)?;
        self.store = Some(params.checkpoint.open().await?);
        info!("Echo agent {} ready (checkpoint: {:?})", config.id, params.checkpoint);
        Ok(())
    }

    async fn invoke(&self, request: &ExecutionRequest) -> Result<String> {
        self.answer(request).await
    }

    async fn stream(&self, request: &ExecutionRequest) -> Result<NativeStream> {
        let answer = self.answer(request).await?;
        let events = vec![
            PipelineEvent::ComponentStarted {
                name: COMPONENT.to_string(),
            },
            PipelineEvent::Chunk { content: answer },
            PipelineEvent::ComponentFinished {
                name: COMPONENT.to_string(),
            },
        ];
        let stream = stream::iter(events.into_iter().map(|e| Ok(NativeEvent::Pipeline(e))));
        Ok(NativeStream::Async(stream.boxed()))
    }

    fn translator(&self) -> Box<dyn EventTranslator> {
        Box::new(PipelineTranslator::new())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(store) = self.store.take() {
            store.close().await?;
        }
        Ok(())
    }
}
