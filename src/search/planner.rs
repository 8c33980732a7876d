use super::clean_queries;
use crate::config::Config;
use crate::llm::types::ChatRequest;
use crate::llm::{complete_json, ChatModel, LlmResponse};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = "Output strict JSON: {\"queries\":[\"...\"],\"rationale\":\"\",\"expected_signals\":[\"...\"]}. \
Keep queries focused and recent. No prose.";
const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Deserialize)]
struct PlanReply {
    queries: Vec<String>,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    expected_signals: Vec<String>,
}

impl LlmResponse for PlanReply {
    fn validate(&self) -> Result<()> {
        if self.queries.iter().all(|q| q.trim().is_empty()) {
            anyhow::bail!("\"queries\" must contain at least one non-empty query");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub queries: Vec<String>,
    pub rationale: String,
    pub expected_signals: Vec<String>,
}

pub struct QueryPlanner<'a> {
    model: &'a dyn ChatModel,
    model_name: &'a str,
    max_queries: usize,
    attempts: u32,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(model: &'a dyn ChatModel, config: &'a Config) -> Self {
        Self {
            model,
            model_name: &config.openrouter.planner_model,
            max_queries: config.search.max_planned_queries,
            attempts: config.openrouter.max_parse_attempts,
        }
    }

    /// Turn a topic into the initial search queries. One LLM call (plus
    /// re-asks on malformed replies); failure ends the run.
    pub async fn plan(&self, topic: &str, window_hours: u32, depth: u32) -> Result<Plan> {
        tracing::info!(topic, depth, "planning queries");
        let payload = serde_json::json!({
            "goal": "Find the most important, novel, credible items on the topic.",
            "topic": topic,
            "time_window": format!("last {} hours", window_hours),
            "depth": depth,
            "constraints": {
                "max_queries": self.max_queries,
                "focus": "high-impact, credible sources, actionable insights",
            },
            "output": ["queries", "rationale", "expected_signals"],
        });
        let request = ChatRequest::json_prompt(self.model_name, SYSTEM_PROMPT, &payload, TEMPERATURE);

        let reply: PlanReply = complete_json(self.model, &request, self.attempts)
            .await
            .context("query planning failed")?;

        let plan = Plan {
            queries: clean_queries(&reply.queries, self.max_queries),
            rationale: reply.rationale,
            expected_signals: reply.expected_signals,
        };
        tracing::debug!(queries = ?plan.queries, "plan ready");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ReplayModel;

    #[tokio::test]
    async fn test_plan_caps_and_cleans_queries() {
        let config = Config::embedded().unwrap();
        let model = ReplayModel::ok(&[r#"{"queries":["a"," a ","b","c","d"],"rationale":"why"}"#]);
        let plan = QueryPlanner::new(&model, &config).plan("AI", 48, 2).await.unwrap();
        assert_eq!(plan.queries, vec!["a", "b", "c"]);
        assert_eq!(plan.rationale, "why");
        assert!(plan.expected_signals.is_empty());

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].model, config.openrouter.planner_model);
        assert!(requests[0].messages[1].content.contains("\"topic\":\"AI\""));
    }

    #[tokio::test]
    async fn test_empty_plan_is_rejected() {
        let config = Config::embedded().unwrap();
        let model = ReplayModel::ok(&[r#"{"queries":[]}"#, r#"{"queries":["  "]}"#]);
        let err = QueryPlanner::new(&model, &config).plan("AI", 48, 2).await.unwrap_err();
        assert!(format!("{:#}", err).contains("query planning failed"));
        assert_eq!(model.calls(), 2);
    }
}
