//! Ordering rules of a canonical event sequence
//!
//! A well-formed run starts with exactly one `RunStarted`, ends with exactly
//! one `RunFinished`, ends every message it starts and ends every tool call
//! before the next one starts.

use std::collections::HashSet;

use thiserror::Error;

use super::event::CanonicalEvent;

/// Why an event sequence is not well-formed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceViolation {
    #[error("sequence is empty")]
    Empty,

    #[error("first event is {found}, expected RUN_STARTED")]
    NotStartedFirst { found: &'static str },

    #[error("last event is {found}, expected RUN_FINISHED")]
    NotFinishedLast { found: &'static str },

    #[error("{event} appears {count} times")]
    Repeated { event: &'static str, count: usize },

    #[error("event {index} ({event}) refers to {id}, which is not open")]
    NotOpen {
        index: usize,
        event: &'static str,
        id: String,
    },

    #[error("event {index} reuses id {id}")]
    Reused { index: usize, id: String },

    #[error("tool call {open} still open when tool call {next} started")]
    OverlappingToolCalls { open: String, next: String },

    #[error("{id} is still open at RUN_FINISHED")]
    LeftOpen { id: String },
}

/// Check a complete run against the ordering rules
pub fn check_event_sequence(events: &[CanonicalEvent]) -> Result<(), SequenceViolation> {
    let first = events.first().ok_or(SequenceViolation::Empty)?;
    if !matches!(first, CanonicalEvent::RunStarted { .. }) {
        return Err(SequenceViolation::NotStartedFirst {
            found: first.name(),
        });
    }
    if let Some(last) = events.last() {
        if !last.is_terminal() {
            return Err(SequenceViolation::NotFinishedLast { found: last.name() });
        }
    }
    for event in ["RUN_STARTED", "RUN_FINISHED"] {
        let count = events.iter().filter(|e| e.name() == event).count();
        if count != 1 {
            return Err(SequenceViolation::Repeated { event, count });
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut open_messages: HashSet<&str> = HashSet::new();
    let mut open_tool_call: Option<&str> = None;

    for (index, event) in events.iter().enumerate() {
        match event {
            CanonicalEvent::TextMessageStart { message_id, .. } => {
                if !seen.insert(message_id.as_str()) {
                    return Err(SequenceViolation::Reused {
                        index,
                        id: message_id.clone(),
                    });
                }
                open_messages.insert(message_id.as_str());
            }
            CanonicalEvent::TextMessageContent { message_id, .. } => {
                if !open_messages.contains(message_id.as_str()) {
                    return Err(not_open(index, event, message_id));
                }
            }
            CanonicalEvent::TextMessageEnd { message_id } => {
                if !open_messages.remove(message_id.as_str()) {
                    return Err(not_open(index, event, message_id));
                }
            }
            CanonicalEvent::ToolCallStart { tool_call_id, .. } => {
                if let Some(open) = open_tool_call {
                    return Err(SequenceViolation::OverlappingToolCalls {
                        open: open.to_string(),
                        next: tool_call_id.clone(),
                    });
                }
                if !seen.insert(tool_call_id.as_str()) {
                    return Err(SequenceViolation::Reused {
                        index,
                        id: tool_call_id.clone(),
                    });
                }
                open_tool_call = Some(tool_call_id.as_str());
            }
            CanonicalEvent::ToolCallArgs { tool_call_id, .. } => {
                if open_tool_call != Some(tool_call_id.as_str()) {
                    return Err(not_open(index, event, tool_call_id));
                }
            }
            CanonicalEvent::ToolCallEnd { tool_call_id } => {
                if open_tool_call != Some(tool_call_id.as_str()) {
                    return Err(not_open(index, event, tool_call_id));
                }
                open_tool_call = None;
            }
            CanonicalEvent::RunFinished { .. } => {
                if let Some(open) = open_tool_call {
                    return Err(SequenceViolation::LeftOpen {
                        id: open.to_string(),
                    });
                }
                if let Some(open) = open_messages.iter().next() {
                    return Err(SequenceViolation::LeftOpen {
                        id: open.to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn not_open(index: usize, event: &CanonicalEvent, id: &str) -> SequenceViolation {
    SequenceViolation::NotOpen {
        index,
        event: event.name(),
        id: id.to_string(),
    }
}
