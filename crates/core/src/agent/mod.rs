//! Agent definitions
//!
//! An agent is described by an opaque configuration blob plus the
//! symbolic name of the adapter that knows how to run it.

mod config;
mod lifecycle;

pub use config::AgentConfig;
pub use lifecycle::LifecycleState;
