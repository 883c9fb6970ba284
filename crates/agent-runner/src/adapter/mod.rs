//! Uniform adapter contract over execution frameworks
//!
//! Each supported framework gets one `AgentAdapter` implementation. Adapters
//! are created uninitialized by the registry, initialized once from the
//! agent configuration, serve any number of requests and are closed once.

use async_trait::async_trait;
use hub_core::{AgentConfig, ExecutionRequest};
use serde::de::DeserializeOwned;

use crate::error::{AgentError, Result};
use crate::event::NativeStream;
use crate::translate::EventTranslator;

mod echo;
mod graph;
mod pipeline;
mod tool_loop;

pub use echo::EchoAdapter;
pub use graph::GraphAdapter;
pub use pipeline::PipelineAdapter;
pub use tool_loop::ToolLoopAdapter;

#[async_trait]
pub trait AgentAdapter: Send + Sync {
    /// Framework name, for logging
    fn framework(&self) -> &'static str;

    /// Resolve framework components and open resources
    ///
    /// Fails with `Configuration` on invalid or missing parameters and with
    /// `Load` when a referenced component cannot be resolved.
    async fn initialize(&mut self, config: &AgentConfig) -> Result<()>;

    /// Run the agent to completion and return its answer
    async fn invoke(&self, request: &ExecutionRequest) -> Result<String>;

    /// Start a run and return its native events
    ///
    /// The returned sequence is lazy, finite and can be consumed once.
    async fn stream(&self, request: &ExecutionRequest) -> Result<NativeStream>;

    /// Fresh translator for one run of this adapter's native events
    fn translator(&self) -> Box<dyn EventTranslator>;

    /// Release resources. Calling it again is harmless.
    async fn close(&mut self) -> Result<()>;
}

/// Decode the adapter-specific parameter blob of a configuration
///
/// Missing parameters decode as an empty object so that adapters with only
/// optional parameters accept a bare configuration.
pub(crate) fn parse_params<T: DeserializeOwned>(config: &AgentConfig) -> Result<T> {
    let params = if config.params.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        config.params.clone()
    };
    serde_json::from_value(params).map_err(|e| {
        AgentError::configuration(format!(
            "invalid parameters for {} agent '{}': {}",
            config.agent_type, config.id, e
        ))
    })
}

pub(crate) fn not_initialized(framework: &str) -> AgentError {
    AgentError::NotInitialized {
        agent_id: format!("<{framework} adapter>"),
    }
}
