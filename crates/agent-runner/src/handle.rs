//! Agent handle: one configured adapter plus its lifecycle

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use hub_core::{AgentConfig, ExecutionRequest, LifecycleState};
use tokio::sync::{OwnedRwLockReadGuard, RwLock};
use tracing::{debug, info, warn};

use crate::adapter::AgentAdapter;
use crate::error::{AgentError, Result};
use crate::event::NativeStream;
use crate::translate::EventTranslator;

struct HandleInner {
    state: LifecycleState,
    adapter: Box<dyn AgentAdapter>,
}

/// The object callers execute against, independent of the framework behind it
///
/// Executions share the inner lock; `initialize` and `close` take it
/// exclusively, so closing waits for in-flight calls to release the adapter.
/// A streamed run holds its share of the lock until its native events are
/// dropped, not just until the run has started.
pub struct AgentHandle {
    config: AgentConfig,
    inner: Arc<RwLock<HandleInner>>,
}

/// Native events of one run together with the read lease that keeps the
/// adapter open underneath them
struct Leased<S> {
    events: S,
    _lease: OwnedRwLockReadGuard<HandleInner>,
}

impl<S: Stream + Unpin> Stream for Leased<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_next_unpin(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.events.size_hint()
    }
}

impl<I: Iterator> Iterator for Leased<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.events.next()
    }
}

impl AgentHandle {
    pub fn new(config: AgentConfig, adapter: Box<dyn AgentAdapter>) -> Self {
        Self {
            config,
            inner: Arc::new(RwLock::new(HandleInner {
                state: LifecycleState::Uninitialized,
                adapter,
            })),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn agent_type(&self) -> &str {
        &self.config.agent_type
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub async fn state(&self) -> LifecycleState {
        self.inner.read().await.state
    }

    /// Initialize the adapter from this handle's configuration
    pub async fn initialize(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.state {
            LifecycleState::Uninitialized => {}
            LifecycleState::Initialized => {
                return Err(AgentError::configuration(format!(
                    "agent {} is already initialized",
                    self.config.id
                )));
            }
            LifecycleState::Closed => return Err(self.closed()),
        }

        self.config.validate()?;
        inner.adapter.initialize(&self.config).await?;
        inner.state = LifecycleState::Initialized;
        info!(
            "Initialized agent {} ({}, {} adapter)",
            self.config.id,
            self.config.name,
            inner.adapter.framework()
        );
        Ok(())
    }

    pub async fn invoke(&self, request: &ExecutionRequest) -> Result<String> {
        let inner = self.inner.read().await;
        self.check_ready(inner.state)?;
        inner.adapter.invoke(request).await
    }

    /// Start a run, returning its native events and a translator for them
    ///
    /// `close` waits until the returned events are dropped.
    pub async fn stream(
        &self,
        request: &ExecutionRequest,
    ) -> Result<(NativeStream, Box<dyn EventTranslator>)> {
        let lease = Arc::clone(&self.inner).read_owned().await;
        self.check_ready(lease.state)?;
        let events = lease.adapter.stream(request).await?;
        let translator = lease.adapter.translator();

        let events = match events {
            NativeStream::Async(events) => NativeStream::Async(Box::pin(Leased {
                events,
                _lease: lease,
            })),
            NativeStream::Blocking(events) => NativeStream::Blocking(Box::new(Leased {
                events,
                _lease: lease,
            })),
        };
        Ok((events, translator))
    }

    /// Release the adapter's resources
    ///
    /// Only the first call releases anything; later calls return `Ok(())`.
    /// The handle is closed afterwards even if the release itself failed.
    pub async fn close(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        let previous = std::mem::replace(&mut inner.state, LifecycleState::Closed);
        match previous {
            LifecycleState::Closed => {
                debug!("Agent {} already closed", self.config.id);
                Ok(())
            }
            LifecycleState::Uninitialized => {
                info!("Closed agent {} before it was initialized", self.config.id);
                Ok(())
            }
            LifecycleState::Initialized => {
                let result = inner.adapter.close().await;
                match &result {
                    Ok(()) => info!("Closed agent {}", self.config.id),
                    Err(e) => warn!("Agent {} failed to release resources: {}", self.config.id, e),
                }
                result
            }
        }
    }

    fn check_ready(&self, state: LifecycleState) -> Result<()> {
        match state {
            LifecycleState::Initialized => Ok(()),
            LifecycleState::Uninitialized => Err(AgentError::NotInitialized {
                agent_id: self.config.id.clone(),
            }),
            LifecycleState::Closed => Err(self.closed()),
        }
    }

    fn closed(&self) -> AgentError {
        AgentError::Closed {
            agent_id: self.config.id.clone(),
        }
    }
}

impl std::fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandle")
            .field("id", &self.config.id)
            .field("type", &self.config.agent_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{mock_config, MockAdapter};

    #[tokio::test]
    async fn test_invoke_before_initialize_fails() {
        let handle = AgentHandle::new(mock_config(), Box::new(MockAdapter::new("hi")));
        let err = handle
            .invoke(&ExecutionRequest::new("s", "q"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::NotInitialized { .. }));
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let adapter = MockAdapter::new("hi");
        let calls = adapter.calls();
        let handle = AgentHandle::new(mock_config(), Box::new(adapter));

        handle.initialize().await.unwrap();
        assert_eq!(handle.state().await, LifecycleState::Initialized);
        assert_eq!(
            handle.invoke(&ExecutionRequest::new("s", "q")).await.unwrap(),
            "hi"
        );

        handle.close().await.unwrap();
        assert_eq!(handle.state().await, LifecycleState::Closed);
        let err = handle
            .invoke(&ExecutionRequest::new("s", "q"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Closed { .. }));
        assert_eq!(calls.executions(), 1);
    }

    #[tokio::test]
    async fn test_close_twice_releases_once() {
        let adapter = MockAdapter::new("hi");
        let calls = adapter.calls();
        let handle = AgentHandle::new(mock_config(), Box::new(adapter));
        handle.initialize().await.unwrap();

        handle.close().await.unwrap();
        handle.close().await.unwrap();
        assert_eq!(calls.closes(), 1);
    }

    #[tokio::test]
    async fn test_close_waits_for_streamed_run() {
        let adapter = MockAdapter::new("hi");
        let calls = adapter.calls();
        let handle = Arc::new(AgentHandle::new(mock_config(), Box::new(adapter)));
        handle.initialize().await.unwrap();

        let (events, _translator) = handle
            .stream(&ExecutionRequest::new("s", "q"))
            .await
            .unwrap();

        let closing = tokio::spawn({
            let handle = Arc::clone(&handle);
            async move { handle.close().await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!closing.is_finished(), "close ran under a live stream");
        assert_eq!(calls.closes(), 0);

        drop(events);
        closing.await.unwrap().unwrap();
        assert_eq!(calls.closes(), 1);
        assert_eq!(handle.state().await, LifecycleState::Closed);
    }

    #[tokio::test]
    async fn test_initialize_twice_is_rejected() {
        let adapter = MockAdapter::new("hi");
        let calls = adapter.calls();
        let handle = AgentHandle::new(mock_config(), Box::new(adapter));

        handle.initialize().await.unwrap();
        assert!(matches!(
            handle.initialize().await,
            Err(AgentError::Configuration { .. })
        ));
        assert_eq!(calls.initialize.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_never_reaches_adapter() {
        let adapter = MockAdapter::new("hi");
        let calls = adapter.calls();
        let handle = AgentHandle::new(
            AgentConfig::new("", "Nameless", "mock"),
            Box::new(adapter),
        );

        assert!(matches!(
            handle.initialize().await,
            Err(AgentError::Configuration { .. })
        ));
        assert_eq!(handle.state().await, LifecycleState::Uninitialized);
        assert_eq!(calls.initialize.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
