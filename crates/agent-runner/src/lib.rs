//! Agent Runner - hosts agents built on different execution frameworks
//!
//! This crate turns one configured agent into a uniform execution
//! surface: adapters wrap each framework, translators reshape native
//! events into the canonical event protocol, the stream bridge folds
//! blocking producers into async streams and guardrails gate what goes in
//! and comes out.

mod adapter;
mod bridge;
mod catalog;
mod checkpoint;
mod error;
mod event;
mod guardrail;
mod handle;
mod registry;
mod router;
pub mod translate;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::{AgentAdapter, EchoAdapter, GraphAdapter, PipelineAdapter, ToolLoopAdapter};
pub use bridge::{StreamBridge, DEFAULT_BRIDGE_CAPACITY};
pub use catalog::{FrameworkCatalog, GraphApp, GraphBuilder, GraphEntry, Pipeline, ToolLoopAgent};
pub use checkpoint::{
    Checkpoint, CheckpointSettings, CheckpointStore, FileCheckpointStore, MemoryCheckpointStore,
};
pub use error::{AgentError, Result};
pub use event::{
    BlockingEventIter, GraphEvent, GraphEventKind, ModelChunk, NativeEvent, NativeEventStream,
    NativeStream, PipelineEvent, ToolCallChunk, ToolLoopStep,
};
pub use guardrail::{
    BlockedTermsValidator, Guardrail, GuardrailGate, GuardrailPosition, GuardrailSpec,
    MaxLengthValidator, RemoteValidator, Validator, ValidatorSpec,
};
pub use handle::AgentHandle;
pub use registry::{AdapterContext, AdapterRegistry};
pub use router::{CanonicalEventStream, ExecutionRouter, RequestPhase, RouterConfig};
