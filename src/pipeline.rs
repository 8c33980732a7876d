//! The plan → search → filter → decide loop, followed by ranking.
//!
//! Everything runs sequentially: one query at a time, one stage after the
//! other. The loop deepens at most `depth` times; once that budget is spent
//! the oracle is not consulted again.

use crate::config::Config;
use crate::engine::article::short_hash;
use crate::engine::{Article, ArticleFilter, FilterStats, RankedArticle, Ranker, SourceTiers, Whitelist};
use crate::llm::types::TokenUsage;
use crate::llm::ChatModel;
use crate::search::{
    clean_queries, Decision, DecisionContext, DecisionOracle, Plan, PreviewItem, QueryPlanner,
    WebSearcher,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub topic: String,
    /// Maximum number of deepen cycles.
    pub depth: u32,
    pub window_hours: u32,
    pub limit: usize,
    pub now: DateTime<Utc>,
}

/// One pass of the loop: what was searched, what survived, what was decided.
#[derive(Debug, Clone, Serialize)]
pub struct StepLog {
    pub iteration: u32,
    pub queries: Vec<String>,
    pub found_raw: usize,
    #[serde(flatten)]
    pub stats: FilterStats,
    /// `None` when the deepen budget was already spent.
    pub decision: Option<Decision>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub count: usize,
    pub candidates: usize,
    pub searches: usize,
    pub deepen_cycles: u32,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub topic: String,
    pub generated_at: DateTime<Utc>,
    pub window_hours: u32,
    pub depth: u32,
    pub limit: usize,
    pub plan: Plan,
    pub items: Vec<RankedArticle>,
    pub log: Vec<StepLog>,
    pub summary: RunSummary,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    model: &'a dyn ChatModel,
    whitelist: Whitelist,
    tiers: SourceTiers,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, model: &'a dyn ChatModel) -> Self {
        Self {
            config,
            model,
            whitelist: Whitelist::new(&config.whitelist),
            tiers: SourceTiers::new(&config.ranking),
        }
    }

    pub async fn run(&self, opts: &RunOptions) -> Result<RunReport> {
        let topic = opts.topic.trim();
        if topic.is_empty() {
            anyhow::bail!("topic must not be empty");
        }
        if opts.window_hours == 0 {
            anyhow::bail!("window must be at least 1 hour");
        }
        if opts.limit == 0 {
            anyhow::bail!("limit must be at least 1");
        }

        let run_id = format!("{}-{}", opts.now.format("%Y%m%d%H%M%S"), short_hash(topic));
        tracing::info!(
            run_id = %run_id,
            topic,
            depth = opts.depth,
            window_hours = opts.window_hours,
            limit = opts.limit,
            "run started"
        );

        let planner = QueryPlanner::new(self.model, self.config);
        let searcher = WebSearcher::new(self.model, self.config);
        let oracle = DecisionOracle::new(self.model, self.config);
        let mut filter = ArticleFilter::new(
            topic,
            &run_id,
            opts.now,
            opts.window_hours,
            &self.whitelist,
            &self.tiers,
        );

        let plan = planner.plan(topic, opts.window_hours, opts.depth).await?;
        let mut queries = plan.queries.clone();
        let mut executed: HashSet<String> = HashSet::new();
        let mut articles: Vec<Article> = Vec::new();
        let mut log = Vec::new();
        let mut searches = 0;
        let mut iteration = 0;

        loop {
            let mut raw = Vec::new();
            for query in &queries {
                executed.insert(query.to_lowercase());
                raw.extend(searcher.search(query).await?);
                searches += 1;
            }
            let found_raw = raw.len();
            let (kept, stats) = filter.apply(raw, iteration);
            tracing::info!(
                topic,
                iteration,
                found_raw,
                kept = stats.kept,
                dropped_duplicate = stats.dropped_duplicate,
                dropped_old = stats.dropped_old,
                dropped_source = stats.dropped_source,
                dropped_invalid = stats.dropped_invalid,
                "batch filtered"
            );

            let preview: Vec<PreviewItem> = kept
                .iter()
                .take(self.config.search.preview_size)
                .map(PreviewItem::from)
                .collect();
            articles.extend(kept);

            let mut step = StepLog {
                iteration,
                queries: std::mem::take(&mut queries),
                found_raw,
                stats,
                decision: None,
            };

            if iteration >= opts.depth {
                tracing::info!(topic, iteration, "deepen budget spent, stopping");
                log.push(step);
                break;
            }

            let decision = oracle
                .decide(&DecisionContext {
                    topic,
                    iteration,
                    depth: opts.depth,
                    window_hours: opts.window_hours,
                    preview: &preview,
                    plan_rationale: &plan.rationale,
                })
                .await?;
            tracing::info!(
                topic,
                iteration,
                deepen = matches!(decision, Decision::Deepen { .. }),
                reason = decision.reason(),
                "decision"
            );
            step.decision = Some(decision.clone());
            log.push(step);

            match decision {
                Decision::Stop { .. } => break,
                Decision::Deepen { queries: proposed, .. } => {
                    let next = self.followup_queries(topic, &proposed, &executed);
                    if next.is_empty() {
                        tracing::info!(topic, iteration, "no new queries to run, stopping");
                        break;
                    }
                    queries = next;
                    iteration += 1;
                }
            }
        }

        let candidates = articles.len();
        let ranker = Ranker::new(&self.config.ranking, &self.tiers, topic);
        let items = ranker.rank(articles, opts.now, opts.limit);
        tracing::info!(topic, candidates, count = items.len(), searches, "run ranked");

        Ok(RunReport {
            summary: RunSummary {
                count: items.len(),
                candidates,
                searches,
                deepen_cycles: iteration,
                usage: self.model.usage(),
            },
            run_id,
            topic: topic.to_string(),
            generated_at: opts.now,
            window_hours: opts.window_hours,
            depth: opts.depth,
            limit: opts.limit,
            plan,
            items,
            log,
        })
    }

    /// Oracle proposals plus matching confirm packs, minus anything this run
    /// already searched.
    fn followup_queries(&self, topic: &str, proposed: &[String], executed: &HashSet<String>) -> Vec<String> {
        let packs = self
            .config
            .search
            .confirm_packs
            .iter()
            .filter(|p| p.applies_to(topic))
            .flat_map(|p| p.queries.iter().cloned());
        let candidates: Vec<String> = proposed.iter().cloned().chain(packs).collect();
        clean_queries(&candidates, usize::MAX)
            .into_iter()
            .filter(|q| !executed.contains(&q.to_lowercase()))
            .collect()
    }
}
