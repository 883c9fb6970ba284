//! Framework-native event types
//!
//! Each supported execution framework reports progress with its own,
//! structurally different events. Adapters hand these to the router
//! untouched; translators turn them into canonical events.

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;

/// Event produced by one of the supported execution frameworks
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    Graph(GraphEvent),
    ToolLoop(ToolLoopStep),
    Pipeline(PipelineEvent),
}

/// Kind of a graph-orchestration callback event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphEventKind {
    ChainStart,
    ChainEnd,
    LlmStart,
    LlmEnd,
    ChatModelStream,
    ToolStart,
    ToolEnd,
}

/// Graph framework event: `(kind, name, payload)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEvent {
    pub kind: GraphEventKind,
    pub name: String,
    #[serde(default)]
    pub payload: Value,
}

impl GraphEvent {
    pub fn new(kind: GraphEventKind, name: impl Into<String>, payload: Value) -> Self {
        Self {
            kind,
            name: name.into(),
            payload,
        }
    }

    pub fn chain_start(name: impl Into<String>) -> Self {
        Self::new(GraphEventKind::ChainStart, name, Value::Null)
    }

    pub fn chain_end(name: impl Into<String>) -> Self {
        Self::new(GraphEventKind::ChainEnd, name, Value::Null)
    }

    pub fn llm_start(name: impl Into<String>) -> Self {
        Self::new(GraphEventKind::LlmStart, name, Value::Null)
    }

    pub fn llm_end(name: impl Into<String>) -> Self {
        Self::new(GraphEventKind::LlmEnd, name, Value::Null)
    }

    pub fn tool_start(name: impl Into<String>) -> Self {
        Self::new(GraphEventKind::ToolStart, name, Value::Null)
    }

    pub fn tool_end(name: impl Into<String>) -> Self {
        Self::new(GraphEventKind::ToolEnd, name, Value::Null)
    }

    /// Streamed model output, wrapped the way graph frameworks emit it
    pub fn model_chunk(name: impl Into<String>, chunk: ModelChunk) -> Self {
        Self::new(
            GraphEventKind::ChatModelStream,
            name,
            json!({ "chunk": chunk }),
        )
    }

    /// Decode the model chunk carried by a `ChatModelStream` payload
    pub fn chunk(&self) -> serde_json::Result<ModelChunk> {
        let raw = self.payload.get("chunk").cloned().unwrap_or(Value::Null);
        serde_json::from_value(raw)
    }
}

/// One streamed fragment of model output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelChunk {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tool_call_chunks: Vec<ToolCallChunk>,
}

impl ModelChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_call_chunks: Vec::new(),
        }
    }

    pub fn tool_call(chunk: ToolCallChunk) -> Self {
        Self {
            content: String::new(),
            tool_call_chunks: vec![chunk],
        }
    }
}

/// Streamed tool-call fragment
///
/// Only the first fragment of a call carries `id` and `name`; later ones
/// usually carry just an `args` piece.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub args: String,
}

impl ToolCallChunk {
    pub fn first(id: impl Into<String>, name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            args: args.into(),
        }
    }

    pub fn args(args: impl Into<String>) -> Self {
        Self {
            id: None,
            name: None,
            args: args.into(),
        }
    }
}

/// Step of an imperative tool-loop agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolLoopStep {
    Thought { text: String },
    ToolCode { tool: String, code: String },
    ToolOutput { output: String },
    Answer { text: String },
}

/// Event of a pipeline/component framework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    ComponentStarted { name: String },
    ComponentFinished { name: String },
    Chunk { content: String },
    ToolInvocation { id: String, name: String, arguments: String },
    ToolResult { id: String, output: String },
}

/// Async native event source
pub type NativeEventStream = BoxStream<'static, Result<NativeEvent>>;

/// Blocking native event source, consumed through the stream bridge
pub type BlockingEventIter = Box<dyn Iterator<Item = Result<NativeEvent>> + Send>;

/// Lazy, finite, non-restartable sequence of native events
pub enum NativeStream {
    Async(NativeEventStream),
    Blocking(BlockingEventIter),
}

impl std::fmt::Debug for NativeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Async(_) => f.write_str("NativeStream::Async"),
            Self::Blocking(_) => f.write_str("NativeStream::Blocking"),
        }
    }
}
