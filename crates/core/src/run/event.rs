//! Canonical run events
//!
//! Every execution framework reports progress in its own vocabulary. The
//! runner re-shapes those native events into this single ordered protocol,
//! which is what HTTP clients receive one JSON object per SSE frame.

use serde::{Deserialize, Serialize};

/// Role attached to a text message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Assistant,
    User,
    System,
}

/// Protocol-level event, independent of any framework's native events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum CanonicalEvent {
    RunStarted {
        thread_id: String,
        run_id: String,
    },
    StepStarted {
        step_name: String,
    },
    StepFinished {
        step_name: String,
    },
    ThinkingStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    ThinkingEnd,
    TextMessageStart {
        message_id: String,
        role: MessageRole,
    },
    TextMessageContent {
        message_id: String,
        delta: String,
    },
    TextMessageEnd {
        message_id: String,
    },
    ToolCallStart {
        tool_call_id: String,
        tool_call_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_message_id: Option<String>,
    },
    ToolCallArgs {
        tool_call_id: String,
        delta: String,
    },
    ToolCallEnd {
        tool_call_id: String,
    },
    RunFinished {
        thread_id: String,
        run_id: String,
    },
}

impl CanonicalEvent {
    /// Wire name of the event (the `type` tag)
    pub fn name(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "RUN_STARTED",
            Self::StepStarted { .. } => "STEP_STARTED",
            Self::StepFinished { .. } => "STEP_FINISHED",
            Self::ThinkingStart { .. } => "THINKING_START",
            Self::ThinkingEnd => "THINKING_END",
            Self::TextMessageStart { .. } => "TEXT_MESSAGE_START",
            Self::TextMessageContent { .. } => "TEXT_MESSAGE_CONTENT",
            Self::TextMessageEnd { .. } => "TEXT_MESSAGE_END",
            Self::ToolCallStart { .. } => "TOOL_CALL_START",
            Self::ToolCallArgs { .. } => "TOOL_CALL_ARGS",
            Self::ToolCallEnd { .. } => "TOOL_CALL_END",
            Self::RunFinished { .. } => "RUN_FINISHED",
        }
    }

    /// Whether this event ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RunFinished { .. })
    }

    /// Message id carried by text message events
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::TextMessageStart { message_id, .. }
            | Self::TextMessageContent { message_id, .. }
            | Self::TextMessageEnd { message_id } => Some(message_id),
            _ => None,
        }
    }

    /// Tool call id carried by tool call events
    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Self::ToolCallStart { tool_call_id, .. }
            | Self::ToolCallArgs { tool_call_id, .. }
            | Self::ToolCallEnd { tool_call_id } => Some(tool_call_id),
            _ => None,
        }
    }
}
