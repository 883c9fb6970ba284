//! Translator for graph-orchestration frameworks
//!
//! Graph frameworks report callbacks as `(kind, name, payload)` triples.
//! The root chain is the graph itself; nested chains and tools become steps,
//! model invocations become thinking spans and streamed model output becomes
//! text messages and tool calls.

use hub_core::CanonicalEvent;
use tracing::{debug, warn};

use super::{foreign_event, EventTranslator, RunContext};
use crate::event::{GraphEvent, GraphEventKind, ModelChunk, NativeEvent};

/// Name graph frameworks give the outermost chain by default
pub const DEFAULT_ROOT_NAME: &str = "LangGraph";

/// Translates graph callbacks into canonical events
///
/// Steps are flat: at most one step is open at a time. A chain or tool that
/// starts inside another step finishes that step first, and the outer
/// step's own `chain_end` then finds nothing open and emits nothing. So
/// `tools { search }` comes out as `tools` followed by `search`, not as
/// `search` nested inside `tools`.
pub struct GraphTranslator {
    root_name: String,
}

impl GraphTranslator {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
        }
    }

    fn translate_graph(&self, event: GraphEvent, ctx: &mut RunContext) -> Vec<CanonicalEvent> {
        let mut out = Vec::new();
        match event.kind {
            GraphEventKind::ChainStart if event.name == self.root_name => {
                ctx.start_run(&mut out);
            }
            GraphEventKind::ChainStart => ctx.start_step(&event.name, &mut out),
            GraphEventKind::ChainEnd => ctx.finish_step(&mut out),
            GraphEventKind::LlmStart => ctx.start_thinking(None, &mut out),
            GraphEventKind::LlmEnd => ctx.end_thinking(&mut out),
            GraphEventKind::ChatModelStream => match event.chunk() {
                Ok(chunk) => model_chunk(chunk, ctx, &mut out),
                Err(e) => warn!("Dropping malformed model chunk from {}: {}", event.name, e),
            },
            GraphEventKind::ToolStart => ctx.start_step(&event.name, &mut out),
            GraphEventKind::ToolEnd => {
                ctx.close_tool_call(&mut out);
                ctx.finish_step(&mut out);
            }
        }
        out
    }
}

impl Default for GraphTranslator {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_NAME)
    }
}

impl EventTranslator for GraphTranslator {
    fn framework(&self) -> &'static str {
        "graph"
    }

    fn translate(&mut self, event: NativeEvent, ctx: &mut RunContext) -> Vec<CanonicalEvent> {
        match event {
            NativeEvent::Graph(event) => self.translate_graph(event, ctx),
            other => foreign_event(self.framework(), &other),
        }
    }
}

fn model_chunk(chunk: ModelChunk, ctx: &mut RunContext, out: &mut Vec<CanonicalEvent>) {
    if chunk.content.is_empty() && chunk.tool_call_chunks.is_empty() {
        return;
    }
    ctx.open_message(out);
    ctx.append_text(&chunk.content, out);

    for call in chunk.tool_call_chunks {
        // Only the first fragment of a call names it; later fragments ride on
        // whichever call is currently open.
        match (call.id.as_deref(), call.name.as_deref()) {
            (Some(id), name) => ctx.open_tool_call(id, name.unwrap_or("unknown"), out),
            (None, Some(name)) if ctx.current_tool_call_id().is_none() => {
                let id = ctx.next_id();
                ctx.open_tool_call(&id, name, out);
            }
            _ => {}
        }
        if !ctx.append_tool_args(&call.args, out) {
            debug!("Dropping tool call fragment with no open call");
        }
    }
}
