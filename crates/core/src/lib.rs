//! Core library for Agent Hub
//!
//! This crate contains the framework-agnostic data model shared by the
//! runner and the HTTP surface:
//! - Agent configuration and lifecycle state
//! - Execution requests and responses
//! - Canonical run events

pub mod agent;
pub mod error;
pub mod run;

pub use agent::{AgentConfig, LifecycleState};
pub use error::Error;
pub use run::{CanonicalEvent, ExecutionRequest, ExecutionResponse, MessageRole};
pub type Result<T> = std::result::Result<T, Error>;
