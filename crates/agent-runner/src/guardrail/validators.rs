//! Local validators

use async_trait::async_trait;

use super::Validator;

/// Rejects text containing any of the configured terms, ignoring case
#[derive(Debug, Clone)]
pub struct BlockedTermsValidator {
    terms: Vec<String>,
}

impl BlockedTermsValidator {
    pub fn new(terms: Vec<String>) -> Self {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

#[async_trait]
impl Validator for BlockedTermsValidator {
    async fn check(&self, text: &str) -> anyhow::Result<bool> {
        let text = text.to_lowercase();
        Ok(!self.terms.iter().any(|term| text.contains(term.as_str())))
    }
}

/// Rejects text longer than `max_chars` characters
#[derive(Debug, Clone, Copy)]
pub struct MaxLengthValidator {
    max_chars: usize,
}

impl MaxLengthValidator {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

#[async_trait]
impl Validator for MaxLengthValidator {
    async fn check(&self, text: &str) -> anyhow::Result<bool> {
        Ok(text.chars().count() <= self.max_chars)
    }
}
