//! Request and response bodies for a single execution

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One query against a hosted agent
///
/// `session_id` doubles as the thread id: adapters use it to resume
/// persisted conversation state, so it is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub session_id: String,
    pub query: String,
}

impl ExecutionRequest {
    pub fn new(session_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            query: query.into(),
        }
    }

    /// Thread id used for checkpoint lookups
    pub fn thread_id(&self) -> &str {
        &self.session_id
    }

    pub fn validate(&self) -> Result<()> {
        if self.session_id.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "session_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Response to a single (non-streaming) invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub session_id: String,
    pub response: String,
}
