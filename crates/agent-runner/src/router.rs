//! Execution router: guardrails, adapter call, translation
//!
//! Every request walks `Pending → InputGuardrails → Invoking →
//! OutputGuardrails → Done`, leaving early to `Rejected` when a guardrail
//! says no or to `Failed` when the adapter errors.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use hub_core::{CanonicalEvent, ExecutionRequest};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bridge::{StreamBridge, DEFAULT_BRIDGE_CAPACITY};
use crate::error::{AgentError, Result};
use crate::event::{NativeEventStream, NativeStream};
use crate::guardrail::GuardrailGate;
use crate::handle::AgentHandle;
use crate::translate::RunContext;

/// Canonical events of one run, always ending with `RunFinished`
pub type CanonicalEventStream = BoxStream<'static, CanonicalEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Pending,
    InputGuardrails,
    Invoking,
    OutputGuardrails,
    Done,
    Rejected,
    Failed,
}

impl RequestPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Rejected | Self::Failed)
    }
}

/// Logs the phase transitions of one request
#[derive(Debug)]
struct PhaseTracker {
    session_id: String,
    run_id: Option<String>,
    phase: RequestPhase,
}

impl PhaseTracker {
    fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            run_id: None,
            phase: RequestPhase::Pending,
        }
    }

    fn enter(&mut self, next: RequestPhase) {
        debug!(
            session_id = %self.session_id,
            run_id = ?self.run_id,
            "Request phase {:?} -> {:?}",
            self.phase,
            next
        );
        self.phase = next;
    }
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Items buffered between a blocking producer and the run
    pub stream_buffer: usize,
    /// Check the accumulated streamed text against output guardrails
    pub stream_output_check: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            stream_buffer: DEFAULT_BRIDGE_CAPACITY,
            stream_output_check: false,
        }
    }
}

pub struct ExecutionRouter {
    handle: Arc<AgentHandle>,
    gate: Arc<GuardrailGate>,
    bridge: StreamBridge,
    config: RouterConfig,
}

impl ExecutionRouter {
    pub fn new(handle: Arc<AgentHandle>, gate: GuardrailGate, config: RouterConfig) -> Self {
        Self {
            handle,
            gate: Arc::new(gate),
            bridge: StreamBridge::new(config.stream_buffer),
            config,
        }
    }

    pub fn handle(&self) -> &Arc<AgentHandle> {
        &self.handle
    }

    pub fn gate(&self) -> &GuardrailGate {
        &self.gate
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Run the agent to completion
    pub async fn invoke(&self, request: &ExecutionRequest) -> Result<String> {
        request.validate()?;
        let mut tracker = PhaseTracker::new(&request.session_id);
        self.check_input(request, &mut tracker).await?;

        tracker.enter(RequestPhase::Invoking);
        let response = match self.handle.invoke(request).await {
            Ok(response) => response,
            Err(e) => {
                tracker.enter(RequestPhase::Failed);
                error!("Agent {} failed to answer: {}", self.handle.id(), e);
                return Err(e);
            }
        };

        tracker.enter(RequestPhase::OutputGuardrails);
        if let Err(e) = self.gate.check_output(&response).await {
            tracker.enter(RequestPhase::Rejected);
            return Err(e);
        }

        tracker.enter(RequestPhase::Done);
        Ok(response)
    }

    /// Start a run and return its canonical events
    ///
    /// Errors are returned only when nothing has run yet: an invalid
    /// request, an input guardrail rejection or an unusable handle. Once the
    /// stream exists it always ends with `RunFinished`; adapter failures
    /// become an error note inside the run. Dropping the stream cancels the
    /// run's producer.
    pub async fn stream(&self, request: ExecutionRequest) -> Result<CanonicalEventStream> {
        request.validate()?;
        let mut tracker = PhaseTracker::new(&request.session_id);
        self.check_input(&request, &mut tracker).await?;

        let ctx = RunContext::new(request.thread_id());
        tracker.run_id = Some(ctx.run_id().to_string());
        tracker.enter(RequestPhase::Invoking);
        info!(
            "Streaming run {} for session {} on agent {}",
            ctx.run_id(),
            request.session_id,
            self.handle.id()
        );

        let cancel = CancellationToken::new();
        let started = match self.handle.stream(&request).await {
            Ok((events, translator)) => Ok((self.native_events(events, &cancel), translator)),
            Err(e @ (AgentError::NotInitialized { .. } | AgentError::Closed { .. })) => {
                tracker.enter(RequestPhase::Failed);
                return Err(e);
            }
            Err(e) => Err(e),
        };

        let gate = Arc::clone(&self.gate);
        let check_output = self.config.stream_output_check;
        let guard = cancel.drop_guard();

        let events = async_stream::stream! {
            let _guard = guard;
            let mut tracker = tracker;
            let mut ctx = ctx;
            let mut text = String::new();
            let mut failure = None;

            match started {
                Ok((mut native, mut translator)) => {
                    while let Some(item) = native.next().await {
                        match item {
                            Ok(event) => {
                                for out in translator.translate(event, &mut ctx) {
                                    if let CanonicalEvent::TextMessageContent { delta, .. } = &out {
                                        text.push_str(delta);
                                    }
                                    yield out;
                                }
                            }
                            Err(e) => {
                                failure = Some(e);
                                break;
                            }
                        }
                    }
                }
                Err(e) => failure = Some(e),
            }

            let mut tail = Vec::new();
            match failure {
                Some(e) => {
                    error!("Run {} failed: {}", ctx.run_id(), e);
                    ctx.fail(&e.to_string(), &mut tail);
                    tracker.enter(RequestPhase::Failed);
                }
                None if check_output => {
                    tracker.enter(RequestPhase::OutputGuardrails);
                    match gate.check_output(&text).await {
                        Ok(()) => tracker.enter(RequestPhase::Done),
                        Err(e) => {
                            if let AgentError::GuardrailRejected { message, .. } = &e {
                                ctx.append_text(message, &mut tail);
                            }
                            tracker.enter(RequestPhase::Rejected);
                        }
                    }
                }
                None => tracker.enter(RequestPhase::Done),
            }
            ctx.finish(&mut tail);
            for out in tail {
                yield out;
            }
        };

        Ok(events.boxed())
    }

    async fn check_input(
        &self,
        request: &ExecutionRequest,
        tracker: &mut PhaseTracker,
    ) -> Result<()> {
        tracker.enter(RequestPhase::InputGuardrails);
        if let Err(e) = self.gate.check_input(&request.query).await {
            warn!("Input rejected for session {}: {}", request.session_id, e);
            tracker.enter(RequestPhase::Rejected);
            return Err(e);
        }
        Ok(())
    }

    fn native_events(&self, events: NativeStream, cancel: &CancellationToken) -> NativeEventStream {
        match events {
            NativeStream::Async(stream) => stream,
            NativeStream::Blocking(iter) => self.bridge.spawn(iter, cancel.clone()),
        }
    }
}
