//! Guardrails: ordered content validators around an execution
//!
//! Input guardrails run before the adapter is called, output guardrails
//! after it answers. A guardrail never errors; a validator that fails or
//! panics counts as a rejection.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AgentError, Result};

mod remote;
mod validators;

pub use remote::RemoteValidator;
pub use validators::{BlockedTermsValidator, MaxLengthValidator};

/// Content check behind a guardrail
#[async_trait]
pub trait Validator: Send + Sync {
    /// `Ok(true)` when the text is acceptable
    async fn check(&self, text: &str) -> anyhow::Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailPosition {
    Input,
    Output,
}

/// A named validator with the message shown to the user on rejection
#[derive(Clone)]
pub struct Guardrail {
    name: String,
    position: GuardrailPosition,
    message: String,
    validator: Arc<dyn Validator>,
}

impl Guardrail {
    pub fn new(
        name: impl Into<String>,
        position: GuardrailPosition,
        message: impl Into<String>,
        validator: Arc<dyn Validator>,
    ) -> Self {
        Self {
            name: name.into(),
            position,
            message: message.into(),
            validator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> GuardrailPosition {
        self.position
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Run the validator, failing closed
    pub async fn validate(&self, text: &str) -> bool {
        match AssertUnwindSafe(self.validator.check(text))
            .catch_unwind()
            .await
        {
            Ok(Ok(allowed)) => {
                debug!("Guardrail {} allowed: {}", self.name, allowed);
                allowed
            }
            Ok(Err(e)) => {
                warn!("Guardrail {} failed, rejecting: {:#}", self.name, e);
                false
            }
            Err(_) => {
                warn!("Guardrail {} panicked, rejecting", self.name);
                false
            }
        }
    }

    fn rejection(&self) -> AgentError {
        AgentError::GuardrailRejected {
            guardrail: self.name.clone(),
            message: self.message.clone(),
        }
    }
}

impl std::fmt::Debug for Guardrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guardrail")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("message", &self.message)
            .finish()
    }
}

/// Serialized form of a guardrail, as supplied by host configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailSpec {
    pub name: String,
    pub position: GuardrailPosition,
    pub message: String,
    #[serde(flatten)]
    pub validator: ValidatorSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "validator", rename_all = "snake_case")]
pub enum ValidatorSpec {
    BlockedTerms {
        terms: Vec<String>,
    },
    MaxLength {
        max_chars: usize,
    },
    Remote {
        url: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

impl ValidatorSpec {
    fn build(&self) -> Result<Arc<dyn Validator>> {
        Ok(match self {
            Self::BlockedTerms { terms } => Arc::new(BlockedTermsValidator::new(terms.clone())),
            Self::MaxLength { max_chars } => Arc::new(MaxLengthValidator::new(*max_chars)),
            Self::Remote {
                url,
                api_key,
                timeout_secs,
            } => {
                if url.trim().is_empty() {
                    return Err(AgentError::configuration("remote guardrail needs a url"));
                }
                Arc::new(RemoteValidator::new(url.clone(), api_key.clone(), *timeout_secs))
            }
        })
    }
}

/// Ordered guardrails for both positions
#[derive(Debug, Clone, Default)]
pub struct GuardrailGate {
    input: Vec<Guardrail>,
    output: Vec<Guardrail>,
}

impl GuardrailGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build guardrails in declaration order
    pub fn from_specs(specs: &[GuardrailSpec]) -> Result<Self> {
        let mut gate = Self::new();
        for spec in specs {
            let validator = spec.validator.build()?;
            gate.push(Guardrail::new(
                spec.name.clone(),
                spec.position,
                spec.message.clone(),
                validator,
            ));
        }
        Ok(gate)
    }

    /// Append a guardrail after those already registered for its position
    pub fn push(&mut self, guardrail: Guardrail) {
        match guardrail.position {
            GuardrailPosition::Input => self.input.push(guardrail),
            GuardrailPosition::Output => self.output.push(guardrail),
        }
    }

    pub fn with(mut self, guardrail: Guardrail) -> Self {
        self.push(guardrail);
        self
    }

    pub fn input(&self) -> &[Guardrail] {
        &self.input
    }

    pub fn output(&self) -> &[Guardrail] {
        &self.output
    }

    pub async fn check_input(&self, text: &str) -> Result<()> {
        check_all(&self.input, text).await
    }

    pub async fn check_output(&self, text: &str) -> Result<()> {
        check_all(&self.output, text).await
    }
}

async fn check_all(guardrails: &[Guardrail], text: &str) -> Result<()> {
    for guardrail in guardrails {
        if !guardrail.validate(text).await {
            warn!("Guardrail {} rejected the text", guardrail.name);
            return Err(guardrail.rejection());
        }
    }
    Ok(())
}
