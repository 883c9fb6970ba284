//! Agent configuration model

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration record for one hosted agent.
///
/// `agent_type` names an adapter registered with the runner; `params` is
/// interpreted by that adapter alone and stays opaque everywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub agent_type: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl AgentConfig {
    /// Create a configuration with empty parameters
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        agent_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            agent_type: agent_type.into(),
            params: serde_json::Value::Null,
        }
    }

    /// Set the adapter parameters
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    /// Check the fields every adapter relies on
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidConfig("agent id must not be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "agent {} has an empty name",
                self.id
            )));
        }
        if self.agent_type.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "agent {} has no adapter type",
                self.id
            )));
        }
        if !(self.params.is_null() || self.params.is_object()) {
            return Err(Error::InvalidConfig(format!(
                "params for agent {} must be a JSON object",
                self.id
            )));
        }
        Ok(())
    }
}
