//! Per-run translation state
//!
//! `RunContext` tracks which message, tool call and step are currently open
//! for one in-flight run. All state changes go through named transitions that
//! emit the matching canonical events, so the ordering rules of the protocol
//! hold no matter which framework drives the run:
//!
//! - `RunStarted` is emitted before anything else, exactly once
//! - opening a tool call while another is open ends the previous one first
//! - `finish` closes whatever is still open and emits `RunFinished` last
//! - after `finish`, every transition is a no-op

use hub_core::{CanonicalEvent, MessageRole};
use uuid::Uuid;

/// Coarse phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    Running,
    Finished,
}

/// Mutable state owned by exactly one run
#[derive(Debug)]
pub struct RunContext {
    run_id: String,
    thread_id: String,
    phase: RunPhase,
    current_message_id: Option<String>,
    current_tool_call_id: Option<String>,
    current_step_name: Option<String>,
    thinking: bool,
}

impl RunContext {
    /// Create a context with a fresh run id
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self::with_run_id(thread_id, Uuid::new_v4().to_string())
    }

    pub fn with_run_id(thread_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            thread_id: thread_id.into(),
            phase: RunPhase::NotStarted,
            current_message_id: None,
            current_tool_call_id: None,
            current_step_name: None,
            thinking: false,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == RunPhase::Finished
    }

    pub fn current_message_id(&self) -> Option<&str> {
        self.current_message_id.as_deref()
    }

    pub fn current_tool_call_id(&self) -> Option<&str> {
        self.current_tool_call_id.as_deref()
    }

    pub fn current_step_name(&self) -> Option<&str> {
        self.current_step_name.as_deref()
    }

    /// Generate an id unique within this run
    pub fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Emit `RunStarted` unless the run has already started
    pub fn start_run(&mut self, out: &mut Vec<CanonicalEvent>) {
        if self.phase != RunPhase::NotStarted {
            return;
        }
        self.phase = RunPhase::Running;
        out.push(CanonicalEvent::RunStarted {
            thread_id: self.thread_id.clone(),
            run_id: self.run_id.clone(),
        });
    }

    /// Enter a named step, finishing the previous one if still open
    pub fn start_step(&mut self, name: &str, out: &mut Vec<CanonicalEvent>) {
        if self.is_finished() {
            return;
        }
        self.start_run(out);
        self.finish_step(out);
        self.current_step_name = Some(name.to_string());
        out.push(CanonicalEvent::StepStarted {
            step_name: name.to_string(),
        });
    }

    pub fn finish_step(&mut self, out: &mut Vec<CanonicalEvent>) {
        if self.is_finished() {
            return;
        }
        if let Some(step_name) = self.current_step_name.take() {
            out.push(CanonicalEvent::StepFinished { step_name });
        }
    }

    pub fn start_thinking(&mut self, title: Option<String>, out: &mut Vec<CanonicalEvent>) {
        if self.is_finished() {
            return;
        }
        self.start_run(out);
        if self.thinking {
            return;
        }
        self.thinking = true;
        out.push(CanonicalEvent::ThinkingStart { title });
    }

    pub fn end_thinking(&mut self, out: &mut Vec<CanonicalEvent>) {
        if self.is_finished() || !self.thinking {
            return;
        }
        self.thinking = false;
        out.push(CanonicalEvent::ThinkingEnd);
    }

    /// Open an assistant message unless one is open; returns its id
    pub fn open_message(&mut self, out: &mut Vec<CanonicalEvent>) -> Option<String> {
        if self.is_finished() {
            return None;
        }
        self.start_run(out);
        if let Some(id) = &self.current_message_id {
            return Some(id.clone());
        }
        let message_id = self.next_id();
        self.current_message_id = Some(message_id.clone());
        out.push(CanonicalEvent::TextMessageStart {
            message_id: message_id.clone(),
            role: MessageRole::Assistant,
        });
        Some(message_id)
    }

    /// Append text to the open message, opening one if needed
    pub fn append_text(&mut self, delta: &str, out: &mut Vec<CanonicalEvent>) {
        if delta.is_empty() {
            return;
        }
        if let Some(message_id) = self.open_message(out) {
            out.push(CanonicalEvent::TextMessageContent {
                message_id,
                delta: delta.to_string(),
            });
        }
    }

    pub fn close_message(&mut self, out: &mut Vec<CanonicalEvent>) {
        if self.is_finished() {
            return;
        }
        if let Some(message_id) = self.current_message_id.take() {
            out.push(CanonicalEvent::TextMessageEnd { message_id });
        }
    }

    /// Open a tool call
    ///
    /// Frameworks give no explicit end signal when one streamed call is
    /// followed by another, so a different id implicitly ends the open call.
    /// Re-opening the id that is already open does nothing.
    pub fn open_tool_call(&mut self, id: &str, name: &str, out: &mut Vec<CanonicalEvent>) {
        if self.is_finished() {
            return;
        }
        self.start_run(out);
        if self.current_tool_call_id.as_deref() == Some(id) {
            return;
        }
        self.close_tool_call(out);
        self.current_tool_call_id = Some(id.to_string());
        out.push(CanonicalEvent::ToolCallStart {
            tool_call_id: id.to_string(),
            tool_call_name: name.to_string(),
            parent_message_id: self.current_message_id.clone(),
        });
    }

    /// Append an argument fragment to the open tool call
    ///
    /// Returns false when there is no open call to attach the fragment to.
    pub fn append_tool_args(&mut self, delta: &str, out: &mut Vec<CanonicalEvent>) -> bool {
        if self.is_finished() {
            return false;
        }
        let Some(tool_call_id) = self.current_tool_call_id.clone() else {
            return false;
        };
        if !delta.is_empty() {
            out.push(CanonicalEvent::ToolCallArgs {
                tool_call_id,
                delta: delta.to_string(),
            });
        }
        true
    }

    pub fn close_tool_call(&mut self, out: &mut Vec<CanonicalEvent>) {
        if self.is_finished() {
            return;
        }
        if let Some(tool_call_id) = self.current_tool_call_id.take() {
            out.push(CanonicalEvent::ToolCallEnd { tool_call_id });
        }
    }

    /// Report a failure inside the run as a text note
    pub fn fail(&mut self, message: &str, out: &mut Vec<CanonicalEvent>) {
        self.append_text(&format!("Error: {message}"), out);
    }

    /// Close everything still open and emit `RunFinished`
    pub fn finish(&mut self, out: &mut Vec<CanonicalEvent>) {
        if self.is_finished() {
            return;
        }
        self.start_run(out);
        self.close_tool_call(out);
        self.close_message(out);
        self.end_thinking(out);
        self.finish_step(out);
        self.phase = RunPhase::Finished;
        out.push(CanonicalEvent::RunFinished {
            thread_id: self.thread_id.clone(),
            run_id: self.run_id.clone(),
        });
    }
}
