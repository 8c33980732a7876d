use super::clean_queries;
use crate::config::Config;
use crate::engine::Article;
use crate::llm::types::ChatRequest;
use crate::llm::{complete_json, ChatModel, LlmResponse};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = "Output strict JSON: {\"action\":\"deepen|stop\",\"reason\":\"\",\"next_focus\":[\"...\"]}. \
next_focus is required when action is deepen. No prose.";
const TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Action {
    Deepen,
    Stop,
}

#[derive(Debug, Deserialize)]
struct DecisionReply {
    action: Action,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    next_focus: Vec<String>,
}

impl LlmResponse for DecisionReply {
    fn validate(&self) -> Result<()> {
        if self.action == Action::Deepen && self.next_focus.iter().all(|q| q.trim().is_empty()) {
            anyhow::bail!("\"deepen\" requires at least one query in \"next_focus\"");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Decision {
    Stop { reason: String },
    Deepen { reason: String, queries: Vec<String> },
}

impl Decision {
    pub fn reason(&self) -> &str {
        match self {
            Decision::Stop { reason } | Decision::Deepen { reason, .. } => reason,
        }
    }
}

/// What the oracle sees of each kept article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewItem {
    pub title: String,
    pub source: String,
    pub url: String,
}

impl From<&Article> for PreviewItem {
    fn from(a: &Article) -> Self {
        Self {
            title: a.title.clone(),
            source: a.source.clone(),
            url: a.url.clone(),
        }
    }
}

/// Inputs for one stop/deepen decision.
pub struct DecisionContext<'c> {
    pub topic: &'c str,
    pub iteration: u32,
    pub depth: u32,
    pub window_hours: u32,
    pub preview: &'c [PreviewItem],
    pub plan_rationale: &'c str,
}

pub struct DecisionOracle<'a> {
    model: &'a dyn ChatModel,
    model_name: &'a str,
    max_queries: usize,
    attempts: u32,
}

impl<'a> DecisionOracle<'a> {
    pub fn new(model: &'a dyn ChatModel, config: &'a Config) -> Self {
        Self {
            model,
            model_name: &config.openrouter.decider_model,
            max_queries: config.search.max_followup_queries,
            attempts: config.openrouter.max_parse_attempts,
        }
    }

    pub async fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Decision> {
        tracing::info!(topic = ctx.topic, iteration = ctx.iteration, "deciding next step");
        let payload = serde_json::json!({
            "topic": ctx.topic,
            "iteration": ctx.iteration,
            "max_depth": ctx.depth,
            "window": format!("last {} hours", ctx.window_hours),
            "recent_preview": ctx.preview,
            "plan_rationale": ctx.plan_rationale,
            "instruction": "If strong, novel, credible signals exist, stop. Otherwise deepen and propose 1-3 targeted queries.",
        });
        let request = ChatRequest::json_prompt(self.model_name, SYSTEM_PROMPT, &payload, TEMPERATURE);

        let reply: DecisionReply = complete_json(self.model, &request, self.attempts)
            .await
            .context("stop/deepen decision failed")?;

        Ok(match reply.action {
            Action::Stop => Decision::Stop { reason: reply.reason },
            Action::Deepen => Decision::Deepen {
                reason: reply.reason,
                queries: clean_queries(&reply.next_focus, self.max_queries),
            },
        })
    }
}
