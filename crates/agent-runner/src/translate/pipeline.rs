//! Translator for pipeline/component frameworks

use hub_core::CanonicalEvent;

use super::{foreign_event, EventTranslator, RunContext};
use crate::event::{NativeEvent, PipelineEvent};

/// Components map to steps, generator chunks to message content and tool
/// invocations to complete tool calls.
#[derive(Debug, Default)]
pub struct PipelineTranslator;

impl PipelineTranslator {
    pub fn new() -> Self {
        Self
    }
}

impl EventTranslator for PipelineTranslator {
    fn framework(&self) -> &'static str {
        "pipeline"
    }

    fn translate(&mut self, event: NativeEvent, ctx: &mut RunContext) -> Vec<CanonicalEvent> {
        let event = match event {
            NativeEvent::Pipeline(event) => event,
            other => return foreign_event(self.framework(), &other),
        };

        let mut out = Vec::new();
        match event {
            PipelineEvent::ComponentStarted { name } => ctx.start_step(&name, &mut out),
            PipelineEvent::ComponentFinished { name } => {
                if ctx.current_step_name() == Some(name.as_str()) {
                    ctx.finish_step(&mut out);
                }
            }
            PipelineEvent::Chunk { content } => ctx.append_text(&content, &mut out),
            PipelineEvent::ToolInvocation {
                id,
                name,
                arguments,
            } => {
                ctx.open_message(&mut out);
                ctx.open_tool_call(&id, &name, &mut out);
                ctx.append_tool_args(&arguments, &mut out);
            }
            PipelineEvent::ToolResult { id, .. } => {
                if ctx.current_tool_call_id() == Some(id.as_str()) {
                    ctx.close_tool_call(&mut out);
                }
            }
        }
        out
    }
}
