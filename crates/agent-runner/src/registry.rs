//! Adapter registry
//!
//! Maps the symbolic `type` of an agent configuration to a constructor for
//! the matching adapter. Built-in framework adapters register themselves in
//! `with_builtins`; embedding applications may add their own.

use std::collections::HashMap;
use std::sync::Arc;

use hub_core::AgentConfig;
use tracing::debug;

use crate::adapter::{AgentAdapter, EchoAdapter, GraphAdapter, PipelineAdapter, ToolLoopAdapter};
use crate::catalog::FrameworkCatalog;
use crate::error::{AgentError, Result};
use crate::handle::AgentHandle;

/// Shared inputs for adapter constructors
#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub catalog: Arc<FrameworkCatalog>,
}

type AdapterFactory = Arc<dyn Fn(&AdapterContext) -> Box<dyn AgentAdapter> + Send + Sync>;

pub struct AdapterRegistry {
    context: AdapterContext,
    factories: HashMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    /// Empty registry over `catalog`
    pub fn new(catalog: Arc<FrameworkCatalog>) -> Self {
        Self {
            context: AdapterContext { catalog },
            factories: HashMap::new(),
        }
    }

    /// Registry with the `graph`, `tool_loop`, `pipeline` and `echo` adapters
    pub fn with_builtins(catalog: Arc<FrameworkCatalog>) -> Self {
        let mut registry = Self::new(catalog);
        registry.register("graph", |ctx| {
            Box::new(GraphAdapter::new(Arc::clone(&ctx.catalog)))
        });
        registry.register("tool_loop", |ctx| {
            Box::new(ToolLoopAdapter::new(Arc::clone(&ctx.catalog)))
        });
        registry.register("pipeline", |ctx| {
            Box::new(PipelineAdapter::new(Arc::clone(&ctx.catalog)))
        });
        registry.register("echo", |_| Box::new(EchoAdapter::new()));
        registry
    }

    /// Register a constructor, replacing any previous one with that name
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&AdapterContext) -> Box<dyn AgentAdapter> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Registered adapter types, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Build an uninitialized handle for `config`
    pub fn create(&self, config: AgentConfig) -> Result<AgentHandle> {
        let factory = self.factories.get(&config.agent_type).ok_or_else(|| {
            AgentError::load(format!(
                "no adapter registered for type '{}' (known: {})",
                config.agent_type,
                self.types().join(", ")
            ))
        })?;
        debug!("Creating {} adapter for agent {}", config.agent_type, config.id);
        let adapter = factory(&self.context);
        Ok(AgentHandle::new(config, adapter))
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("types", &self.types())
            .finish()
    }
}
