//! Error types for agent-runner

use thiserror::Error;

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can occur while hosting and executing an agent
#[derive(Debug, Error)]
pub enum AgentError {
    /// Agent configuration is invalid or incomplete
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A referenced adapter or framework component could not be resolved
    #[error("Load error: {message}")]
    Load { message: String },

    /// Agent was used before initialize()
    #[error("Agent {agent_id} is not initialized")]
    NotInitialized { agent_id: String },

    /// Agent was used after close()
    #[error("Agent {agent_id} is closed")]
    Closed { agent_id: String },

    /// Adapter failed during invoke or stream
    #[error("Execution failed: {message}")]
    Execution { message: String },

    /// Request failed validation
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// A guardrail rejected the input or output
    #[error("Rejected by guardrail {guardrail}: {message}")]
    GuardrailRejected { guardrail: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AgentError {
    /// Create a Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a Load error
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    /// Create an Execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Wrap an opaque framework failure
    ///
    /// Errors that started out as an `AgentError` (a closed checkpoint store
    /// surfacing through a graph, say) come back unchanged.
    pub fn from_framework(err: anyhow::Error) -> Self {
        match err.downcast::<AgentError>() {
            Ok(err) => err,
            Err(err) => Self::Execution {
                message: format!("{err:#}"),
            },
        }
    }

    /// Whether this is a guardrail rejection rather than a failure
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::GuardrailRejected { .. })
    }
}

impl From<hub_core::Error> for AgentError {
    fn from(err: hub_core::Error) -> Self {
        match err {
            hub_core::Error::InvalidConfig(message) => Self::Configuration { message },
            hub_core::Error::InvalidRequest(message) => Self::InvalidRequest { message },
            hub_core::Error::Io(e) => Self::Io(e),
            hub_core::Error::Serialization(e) => Self::Serialization(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_error_is_wrapped_once() {
        let err = AgentError::from_framework(anyhow::anyhow!("model crashed"));
        assert_eq!(err.to_string(), "Execution failed: model crashed");

        let inner = AgentError::execution("checkpoint store is closed");
        let err = AgentError::from_framework(anyhow::Error::from(inner));
        assert_eq!(err.to_string(), "Execution failed: checkpoint store is closed");
    }

    #[test]
    fn test_framework_error_keeps_its_kind() {
        let err = AgentError::from_framework(anyhow::Error::from(AgentError::Closed {
            agent_id: "a".to_string(),
        }));
        assert!(matches!(err, AgentError::Closed { .. }));
    }
}
