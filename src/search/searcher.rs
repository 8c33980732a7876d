use crate::config::Config;
use crate::engine::RawResult;
use crate::llm::types::ChatRequest;
use crate::llm::{complete_json, ChatModel, LlmResponse};
use anyhow::{Context, Result};
use serde::Deserialize;

const SYSTEM_PROMPT: &str = "Return JSON only as {\"results\":[{\"title\",\"url\",\"snippet\",\"source\",\"published_at\"}...]}. \
published_at must be an ISO 8601 timestamp. No prose. If nothing recent, return {\"results\":[]}.";
const TEMPERATURE: f32 = 0.0;

/// Search models answer either with the wrapped object or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchReply {
    Wrapped { results: Vec<RawResult> },
    Bare(Vec<RawResult>),
}

impl LlmResponse for SearchReply {}

impl SearchReply {
    fn into_results(self) -> Vec<RawResult> {
        match self {
            SearchReply::Wrapped { results } | SearchReply::Bare(results) => results,
        }
    }
}

pub struct WebSearcher<'a> {
    model: &'a dyn ChatModel,
    model_name: &'a str,
    results_per_query: usize,
    attempts: u32,
}

impl<'a> WebSearcher<'a> {
    pub fn new(model: &'a dyn ChatModel, config: &'a Config) -> Self {
        Self {
            model,
            model_name: &config.openrouter.search_model,
            results_per_query: config.search.results_per_query,
            attempts: config.openrouter.max_parse_attempts,
        }
    }

    /// Run one query against the search-capable model.
    pub async fn search(&self, query: &str) -> Result<Vec<RawResult>> {
        tracing::info!(query, limit = self.results_per_query, "search");
        let payload = serde_json::json!({
            "task": "search",
            "query": query,
            "return": {
                "format": "json",
                "fields": ["title", "url", "snippet", "source", "published_at"],
            },
            "limit": self.results_per_query,
        });
        let request = ChatRequest::json_prompt(self.model_name, SYSTEM_PROMPT, &payload, TEMPERATURE);

        let reply: SearchReply = complete_json(self.model, &request, self.attempts)
            .await
            .with_context(|| format!("search failed for query {:?}", query))?;

        let mut results = reply.into_results();
        results.truncate(self.results_per_query);
        tracing::debug!(query, count = results.len(), "search results");
        Ok(results)
    }
}
