//! Demo framework components registered at startup
//!
//! `demo` is a small graph that looks the query up with a tool and answers
//! with it; `calculator` is a blocking tool loop evaluating `a <op> b`.

use std::sync::Arc;

use agent_runner::translate::DEFAULT_ROOT_NAME as ROOT;
use agent_runner::{
    CheckpointStore, FrameworkCatalog, GraphApp, GraphBuilder, GraphEvent, ModelChunk,
    ToolCallChunk, ToolLoopAgent, ToolLoopStep,
};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::json;

pub fn register(catalog: &mut FrameworkCatalog) {
    catalog.register_graph("demo", Arc::new(DemoGraph));
    catalog.register_tool_loop("calculator", Arc::new(Calculator));
}

pub struct DemoGraph;

impl GraphBuilder for DemoGraph {
    fn compile(&self, checkpointer: Arc<dyn CheckpointStore>) -> anyhow::Result<Arc<dyn GraphApp>> {
        Ok(Arc::new(DemoGraphApp { checkpointer }))
    }
}

struct DemoGraphApp {
    checkpointer: Arc<dyn CheckpointStore>,
}

/// Bump the per-thread turn counter and return the new value
async fn record_turn(checkpointer: &dyn CheckpointStore, thread_id: &str) -> anyhow::Result<u64> {
    let turn = checkpointer
        .load(thread_id)
        .await?
        .and_then(|c| c.state.get("turns").and_then(|t| t.as_u64()))
        .unwrap_or(0)
        + 1;
    checkpointer.save(thread_id, json!({ "turns": turn })).await?;
    Ok(turn)
}

fn answer(query: &str, turn: u64) -> String {
    format!("Turn {turn}: you asked about \"{query}\"")
}

#[async_trait]
impl GraphApp for DemoGraphApp {
    async fn invoke(&self, query: &str, thread_id: &str) -> anyhow::Result<String> {
        let turn = record_turn(self.checkpointer.as_ref(), thread_id).await?;
        Ok(answer(query, turn))
    }

    fn stream_events(
        &self,
        query: &str,
        thread_id: &str,
    ) -> BoxStream<'static, anyhow::Result<GraphEvent>> {
        let checkpointer = Arc::clone(&self.checkpointer);
        let query = query.to_string();
        let thread_id = thread_id.to_string();

        Box::pin(async_stream::try_stream! {
            yield GraphEvent::chain_start(ROOT);
            yield GraphEvent::chain_start("agent");
            yield GraphEvent::llm_start("model");
            let args = json!({ "query": query }).to_string();
            yield GraphEvent::model_chunk(
                "model",
                ModelChunk::tool_call(ToolCallChunk::first("lookup-1", "lookup", args)),
            );
            yield GraphEvent::llm_end("model");
            yield GraphEvent::chain_end("agent");

            yield GraphEvent::tool_start("lookup");
            let turn = record_turn(checkpointer.as_ref(), &thread_id).await?;
            yield GraphEvent::tool_end("lookup");

            yield GraphEvent::chain_start("agent");
            yield GraphEvent::llm_start("model");
            for word in answer(&query, turn).split_inclusive(' ') {
                yield GraphEvent::model_chunk("model", ModelChunk::text(word));
            }
            yield GraphEvent::llm_end("model");
            yield GraphEvent::chain_end("agent");
            yield GraphEvent::chain_end(ROOT);
        })
    }
}

pub struct Calculator;

#[derive(Debug, Clone, Copy)]
struct Expression {
    lhs: f64,
    op: char,
    rhs: f64,
}

impl Expression {
    fn parse(query: &str) -> Option<Self> {
        let query = query.trim();
        // Skip a leading sign so "-3 + 4" splits on the '+'
        let (index, op) = query
            .char_indices()
            .skip(1)
            .find(|(_, c)| matches!(c, '+' | '-' | '*' | '/'))?;
        let lhs = query[..index].trim().parse().ok()?;
        let rhs = query[index + op.len_utf8()..].trim().parse().ok()?;
        Some(Self { lhs, op, rhs })
    }

    fn eval(&self) -> anyhow::Result<f64> {
        Ok(match self.op {
            '+' => self.lhs + self.rhs,
            '-' => self.lhs - self.rhs,
            '*' => self.lhs * self.rhs,
            '/' if self.rhs == 0.0 => anyhow::bail!("division by zero"),
            '/' => self.lhs / self.rhs,
            other => anyhow::bail!("unsupported operator {other}"),
        })
    }

    fn code(&self) -> String {
        format!("print({} {} {})", self.lhs, self.op, self.rhs)
    }
}

const UNSUPPORTED: &str = "I can only evaluate expressions like `2 + 3`.";

impl ToolLoopAgent for Calculator {
    fn run(&self, query: &str, _thread_id: &str) -> anyhow::Result<String> {
        match Expression::parse(query) {
            Some(expr) => Ok(format!("{} = {}", query.trim(), expr.eval()?)),
            None => Ok(UNSUPPORTED.to_string()),
        }
    }

    fn steps(
        &self,
        query: &str,
        _thread_id: &str,
    ) -> Box<dyn Iterator<Item = anyhow::Result<ToolLoopStep>> + Send> {
        let Some(expr) = Expression::parse(query) else {
            return Box::new(std::iter::once(Ok(ToolLoopStep::Answer {
                text: UNSUPPORTED.to_string(),
            })));
        };

        let query = query.trim().to_string();
        let mut stage = 0;
        let mut failed = false;
        // Each step is computed only when pulled; nothing follows an error
        Box::new(std::iter::from_fn(move || {
            if failed {
                return None;
            }
            stage += 1;
            let step = match stage {
                1 => Ok(ToolLoopStep::Thought {
                    text: format!("I should compute {query} with python"),
                }),
                2 => Ok(ToolLoopStep::ToolCode {
                    tool: "python".to_string(),
                    code: expr.code(),
                }),
                3 => expr.eval().map(|value| ToolLoopStep::ToolOutput {
                    output: value.to_string(),
                }),
                4 => expr.eval().map(|value| ToolLoopStep::Answer {
                    text: format!("{query} = {value}"),
                }),
                _ => return None,
            };
            failed = step.is_err();
            Some(step)
        }))
    }
}
