//! OpenRouter chat-completions client.
//!
//! Speaks the OpenAI-compatible `/chat/completions` endpoint with bearer
//! auth. One attempt per call; failures surface to the caller.

use super::types::*;
use super::ChatModel;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub struct OpenRouter {
    client: Client,
    api_key: String,
    base_url: String,
    requests: AtomicU64,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
}

impl OpenRouter {
    pub fn new(api_key: String, base_url: &str, timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            requests: AtomicU64::new(0),
            prompt_tokens: AtomicU64::new(0),
            completion_tokens: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl ChatModel for OpenRouter {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::info!(model = %request.model, "LLM call");
        tracing::debug!(
            model = %request.model,
            input = %serde_json::to_string_pretty(&request.messages).unwrap_or_default(),
            "LLM input"
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .with_context(|| format!("OpenRouter request failed ({})", request.model))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenRouter {} ({}): {}", request.model, status, body);
        }

        let parsed: CompletionResponse = resp
            .json()
            .await
            .context("failed to parse OpenRouter response")?;

        self.requests.fetch_add(1, Ordering::Relaxed);
        if let Some(usage) = &parsed.usage {
            self.prompt_tokens.fetch_add(usage.prompt_tokens, Ordering::Relaxed);
            self.completion_tokens.fetch_add(usage.completion_tokens, Ordering::Relaxed);
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .with_context(|| format!("OpenRouter {} returned no message content", request.model))?;

        tracing::debug!(model = %request.model, output = %content, "LLM output");
        Ok(content)
    }

    fn usage(&self) -> TokenUsage {
        TokenUsage {
            requests: self.requests.load(Ordering::Relaxed),
            prompt_tokens: self.prompt_tokens.load(Ordering::Relaxed),
            completion_tokens: self.completion_tokens.load(Ordering::Relaxed),
        }
    }
}
