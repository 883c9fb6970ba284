//! Server and host configuration
//!
//! Server settings come from `HUB_*` environment variables. The hosted agent
//! and its guardrails come from an optional host-config JSON file; without
//! one the server hosts the built-in echo agent.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use agent_runner::{GuardrailSpec, RouterConfig, DEFAULT_BRIDGE_CAPACITY};
use anyhow::Context;
use hub_core::AgentConfig;
use serde::{Deserialize, Serialize};
use serde_json::json;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8081";
const DEFAULT_DATA_DIR: &str = ".hub-data";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub host_config: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub stream_buffer: usize,
    pub stream_output_check: bool,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr = lookup("HUB_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("HUB_BIND_ADDR is not a socket address")?;

        let stream_buffer = match lookup("HUB_STREAM_BUFFER") {
            Some(value) => value
                .parse::<usize>()
                .with_context(|| format!("HUB_STREAM_BUFFER is not a number: {value}"))?,
            None => DEFAULT_BRIDGE_CAPACITY,
        };

        Ok(Self {
            bind_addr,
            host_config: lookup("HUB_HOST_CONFIG").map(PathBuf::from),
            data_dir: lookup("HUB_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            stream_buffer,
            stream_output_check: lookup("HUB_STREAM_OUTPUT_CHECK")
                .map(|value| parse_flag(&value))
                .unwrap_or(false),
        })
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            stream_buffer: self.stream_buffer,
            stream_output_check: self.stream_output_check,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// The hosted agent and its guardrails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    pub agent: AgentConfig,
    #[serde(default)]
    pub guardrails: Vec<GuardrailSpec>,
}

impl HostConfig {
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read host config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid host config {}", path.display()))
    }

    /// Built-in echo agent checkpointing into `data_dir`
    pub fn echo(data_dir: &Path) -> Self {
        let agent = AgentConfig::new("echo", "Echo agent", "echo").with_params(json!({
            "checkpoint": {
                "kind": "file",
                "path": data_dir.join("echo-checkpoints.json"),
            }
        }));
        Self {
            agent,
            guardrails: Vec::new(),
        }
    }
}
