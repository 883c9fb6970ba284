//! Application state

use std::sync::Arc;

use agent_runner::{
    AdapterRegistry, AgentHandle, ExecutionRouter, FrameworkCatalog, GuardrailGate, RouterConfig,
};

use crate::config::HostConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    router: ExecutionRouter,
}

impl AppState {
    pub fn new(router: ExecutionRouter) -> Self {
        Self {
            inner: Arc::new(AppStateInner { router }),
        }
    }

    /// Create, initialize and gate the agent described by `host`
    pub async fn from_host(
        host: &HostConfig,
        catalog: FrameworkCatalog,
        config: RouterConfig,
    ) -> agent_runner::Result<Self> {
        let registry = AdapterRegistry::with_builtins(Arc::new(catalog));
        let gate = GuardrailGate::from_specs(&host.guardrails)?;
        let handle = Arc::new(registry.create(host.agent.clone())?);
        handle.initialize().await?;

        tracing::info!(
            "Hosting agent {} ({}) with {} input and {} output guardrails",
            handle.id(),
            handle.agent_type(),
            gate.input().len(),
            gate.output().len()
        );
        Ok(Self::new(ExecutionRouter::new(handle, gate, config)))
    }

    pub fn router(&self) -> &ExecutionRouter {
        &self.inner.router
    }

    pub fn handle(&self) -> &Arc<AgentHandle> {
        self.inner.router.handle()
    }
}
