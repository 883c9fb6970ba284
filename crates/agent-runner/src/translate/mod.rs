//! Translators from framework-native events to canonical events

use hub_core::CanonicalEvent;
use tracing::warn;

use crate::event::NativeEvent;

mod context;
pub mod graph;
pub mod pipeline;
pub mod tool_loop;

pub use context::{RunContext, RunPhase};
pub use graph::{GraphTranslator, DEFAULT_ROOT_NAME};
pub use pipeline::PipelineTranslator;
pub use tool_loop::ToolLoopTranslator;

/// Trait for translating one framework's native events
///
/// Implementations hold no run state of their own beyond framework
/// specifics; everything the protocol ordering depends on lives in the
/// `RunContext`.
pub trait EventTranslator: Send {
    /// Framework name, for logging
    fn framework(&self) -> &'static str;

    /// Translate one native event, updating the run context
    fn translate(&mut self, event: NativeEvent, ctx: &mut RunContext) -> Vec<CanonicalEvent>;
}

/// Log and drop an event that belongs to a different framework
pub(crate) fn foreign_event(framework: &str, event: &NativeEvent) -> Vec<CanonicalEvent> {
    warn!(
        "{} translator dropped an event from another framework: {:?}",
        framework, event
    );
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{GraphEvent, ModelChunk, PipelineEvent, ToolCallChunk, ToolLoopStep};
    use hub_core::run::check_event_sequence;
    use proptest::prelude::*;

    /// Native event shape before tool call ids are assigned
    #[derive(Debug, Clone)]
    enum GraphOp {
        Event(GraphEvent),
        /// First fragment of a new call; the id comes from the position
        NamedCall { name: String, args: String },
        /// Fragment naming a call but carrying no id
        AnonymousCall { name: String },
        Args(String),
    }

    #[derive(Debug, Clone)]
    enum PipelineOp {
        Event(PipelineEvent),
        Invocation { name: String, arguments: String },
        Result { call: usize },
    }

    fn text() -> impl Strategy<Value = String> {
        "[a-z {}:\"]{0,8}"
    }

    fn graph_op() -> impl Strategy<Value = GraphOp> {
        let step = prop::sample::select(vec![DEFAULT_ROOT_NAME, "agent", "tools", "search"]);
        prop_oneof![
            step.clone().prop_map(|n| GraphOp::Event(GraphEvent::chain_start(n))),
            step.clone().prop_map(|n| GraphOp::Event(GraphEvent::chain_end(n))),
            step.clone().prop_map(|n| GraphOp::Event(GraphEvent::tool_start(n))),
            step.prop_map(|n| GraphOp::Event(GraphEvent::tool_end(n))),
            Just(GraphOp::Event(GraphEvent::llm_start("model"))),
            Just(GraphOp::Event(GraphEvent::llm_end("model"))),
            text().prop_map(|t| GraphOp::Event(GraphEvent::model_chunk("model", ModelChunk::text(t)))),
            (text(), text()).prop_map(|(name, args)| GraphOp::NamedCall { name, args }),
            text().prop_map(|name| GraphOp::AnonymousCall { name }),
            text().prop_map(GraphOp::Args),
        ]
    }

    fn graph_events(ops: Vec<GraphOp>) -> Vec<NativeEvent> {
        ops.into_iter()
            .enumerate()
            .map(|(i, op)| {
                let event = match op {
                    GraphOp::Event(event) => event,
                    GraphOp::NamedCall { name, args } => GraphEvent::model_chunk(
                        "model",
                        ModelChunk::tool_call(ToolCallChunk::first(format!("call-{i}"), name, args)),
                    ),
                    GraphOp::AnonymousCall { name } => GraphEvent::model_chunk(
                        "model",
                        ModelChunk::tool_call(ToolCallChunk {
                            id: None,
                            name: Some(name),
                            args: String::new(),
                        }),
                    ),
                    GraphOp::Args(args) => {
                        GraphEvent::model_chunk("model", ModelChunk::tool_call(ToolCallChunk::args(args)))
                    }
                };
                NativeEvent::Graph(event)
            })
            .collect()
    }

    fn tool_loop_step() -> impl Strategy<Value = ToolLoopStep> {
        prop_oneof![
            text().prop_map(|text| ToolLoopStep::Thought { text }),
            text().prop_map(|code| ToolLoopStep::ToolCode {
                tool: "python".to_string(),
                code
            }),
            text().prop_map(|output| ToolLoopStep::ToolOutput { output }),
            text().prop_map(|text| ToolLoopStep::Answer { text }),
        ]
    }

    fn pipeline_op() -> impl Strategy<Value = PipelineOp> {
        let component = prop::sample::select(vec!["retriever", "prompt", "generator"]);
        prop_oneof![
            component
                .clone()
                .prop_map(|n| PipelineOp::Event(PipelineEvent::ComponentStarted { name: n.to_string() })),
            component.prop_map(|n| PipelineOp::Event(PipelineEvent::ComponentFinished {
                name: n.to_string()
            })),
            text().prop_map(|content| PipelineOp::Event(PipelineEvent::Chunk { content })),
            (text(), text()).prop_map(|(name, arguments)| PipelineOp::Invocation { name, arguments }),
            (0usize..40).prop_map(|call| PipelineOp::Result { call }),
        ]
    }

    fn pipeline_events(ops: Vec<PipelineOp>) -> Vec<PipelineEvent> {
        ops.into_iter()
            .enumerate()
            .map(|(i, op)| match op {
                PipelineOp::Event(event) => event,
                PipelineOp::Invocation { name, arguments } => PipelineEvent::ToolInvocation {
                    id: format!("call-{i}"),
                    name,
                    arguments,
                },
                PipelineOp::Result { call } => PipelineEvent::ToolResult {
                    id: format!("call-{call}"),
                    output: String::new(),
                },
            })
            .collect()
    }

    /// Translate a run the way the router does, failing after `events` when
    /// `failure` is set
    fn drive(
        translator: &mut dyn EventTranslator,
        events: Vec<NativeEvent>,
        failure: Option<String>,
    ) -> Vec<CanonicalEvent> {
        let mut ctx = RunContext::new("thread");
        let mut out = Vec::new();
        for event in events {
            out.extend(translator.translate(event, &mut ctx));
        }
        if let Some(message) = failure {
            ctx.fail(&message, &mut out);
        }
        ctx.finish(&mut out);
        out
    }

    fn has_error_note(events: &[CanonicalEvent]) -> bool {
        events.iter().any(|e| {
            matches!(e, CanonicalEvent::TextMessageContent { delta, .. } if delta.starts_with("Error: "))
        })
    }

    proptest! {
        #[test]
        fn graph_runs_are_well_formed(
            ops in proptest::collection::vec(graph_op(), 0..40),
            failure in proptest::option::of("[a-z ]{1,12}"),
        ) {
            let failed = failure.is_some();
            let events = drive(&mut GraphTranslator::default(), graph_events(ops), failure);
            prop_assert!(check_event_sequence(&events).is_ok(), "{:?}", check_event_sequence(&events));
            prop_assert_eq!(has_error_note(&events), failed);
        }

        #[test]
        fn tool_loop_runs_are_well_formed(
            steps in proptest::collection::vec(tool_loop_step(), 0..40),
            failure in proptest::option::of("[a-z ]{1,12}"),
        ) {
            let events = steps.into_iter().map(NativeEvent::ToolLoop).collect();
            let events = drive(&mut ToolLoopTranslator::new(), events, failure);
            prop_assert!(check_event_sequence(&events).is_ok(), "{:?}", check_event_sequence(&events));
        }

        #[test]
        fn pipeline_runs_are_well_formed(
            ops in proptest::collection::vec(pipeline_op(), 0..40),
            failure in proptest::option::of("[a-z ]{1,12}"),
        ) {
            let events = pipeline_events(ops).into_iter().map(NativeEvent::Pipeline).collect();
            let events = drive(&mut PipelineTranslator::new(), events, failure);
            prop_assert!(check_event_sequence(&events).is_ok(), "{:?}", check_event_sequence(&events));
        }
    }
}
