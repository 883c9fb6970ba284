//! Translator for imperative tool-loop frameworks
//!
//! Tool-loop agents emit a flat sequence of `thought`, `tool_code`,
//! `tool_output` and `answer` steps. The assistant message opens lazily on
//! the first `tool_code` or `answer`, and every `tool_code`/`tool_output`
//! pair becomes one tool call.

use hub_core::CanonicalEvent;
use tracing::{debug, warn};

use super::{foreign_event, EventTranslator, RunContext};
use crate::event::{NativeEvent, ToolLoopStep};

/// Label of the thinking span a `thought` step becomes
const THOUGHT_TITLE: &str = "thought";

#[derive(Debug, Default)]
pub struct ToolLoopTranslator;

impl ToolLoopTranslator {
    pub fn new() -> Self {
        Self
    }
}

impl EventTranslator for ToolLoopTranslator {
    fn framework(&self) -> &'static str {
        "tool_loop"
    }

    fn translate(&mut self, event: NativeEvent, ctx: &mut RunContext) -> Vec<CanonicalEvent> {
        let step = match event {
            NativeEvent::ToolLoop(step) => step,
            other => return foreign_event(self.framework(), &other),
        };

        let mut out = Vec::new();
        match step {
            ToolLoopStep::Thought { text } => {
                // The protocol has no thinking content, only a span label
                debug!("Agent thought: {}", text);
                ctx.start_thinking(Some(THOUGHT_TITLE.to_string()), &mut out);
                ctx.end_thinking(&mut out);
            }
            ToolLoopStep::ToolCode { tool, code } => {
                ctx.open_message(&mut out);
                let id = ctx.next_id();
                ctx.open_tool_call(&id, &tool, &mut out);
                ctx.append_tool_args(&code, &mut out);
            }
            ToolLoopStep::ToolOutput { output } => {
                if ctx.current_tool_call_id().is_none() {
                    warn!("Tool output without a preceding tool_code step");
                }
                debug!("Tool produced {} bytes of output", output.len());
                ctx.close_tool_call(&mut out);
            }
            ToolLoopStep::Answer { text } => ctx.append_text(&text, &mut out),
        }
        out
    }
}
