//! Validator backed by an HTTP moderation endpoint

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Validator;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Serialize)]
struct CheckRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct CheckResponse {
    allowed: bool,
}

/// POSTs `{"text": ...}` and expects `{"allowed": bool}` back
pub struct RemoteValidator {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl RemoteValidator {
    pub fn new(url: String, api_key: Option<String>, timeout_secs: Option<u64>) -> Self {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            url,
            api_key,
        }
    }
}

#[async_trait]
impl Validator for RemoteValidator {
    async fn check(&self, text: &str) -> anyhow::Result<bool> {
        let mut request = self.client.post(&self.url).json(&CheckRequest { text });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let res = request
            .send()
            .await
            .with_context(|| format!("failed to reach moderation endpoint {}", self.url))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            anyhow::bail!("moderation endpoint returned {}: {}", status, body);
        }

        let verdict: CheckResponse = res
            .json()
            .await
            .context("moderation endpoint returned an invalid body")?;
        debug!("Moderation endpoint {} verdict: {}", self.url, verdict.allowed);
        Ok(verdict.allowed)
    }
}
