//! Normalize, deduplicate and filter raw search hits into articles.

use super::article::{parse_published, short_hash, Article, RawResult};
use super::sources::{SourceTiers, Whitelist};
use super::tags::tags_for;
use super::url::{host_and_path, normalize_url};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Per-batch counts of what the filter kept and why it dropped the rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub kept: usize,
    pub dropped_invalid: usize,
    pub dropped_duplicate: usize,
    pub dropped_old: usize,
    pub dropped_source: usize,
}

/// Run-scoped filter. Remembers every normalized URL it has seen so
/// duplicates are caught across loop iterations.
pub struct ArticleFilter<'a> {
    topic: String,
    run_id: String,
    now: DateTime<Utc>,
    window: Duration,
    whitelist: &'a Whitelist,
    tiers: &'a SourceTiers,
    seen: HashSet<String>,
}

impl<'a> ArticleFilter<'a> {
    pub fn new(
        topic: &str,
        run_id: &str,
        now: DateTime<Utc>,
        window_hours: u32,
        whitelist: &'a Whitelist,
        tiers: &'a SourceTiers,
    ) -> Self {
        Self {
            topic: topic.to_string(),
            run_id: run_id.to_string(),
            now,
            window: Duration::hours(i64::from(window_hours)),
            whitelist,
            tiers,
            seen: HashSet::new(),
        }
    }

    /// Filter one batch of raw hits, in order: URL normalization and
    /// deduplication, recency window, topic whitelist.
    pub fn apply(&mut self, raw: Vec<RawResult>, depth: u32) -> (Vec<Article>, FilterStats) {
        let mut stats = FilterStats::default();
        let mut kept = Vec::new();

        for item in raw {
            let Some(url) = item.url.as_deref().and_then(normalize_url) else {
                stats.dropped_invalid += 1;
                continue;
            };
            let Some((host, path)) = host_and_path(&url) else {
                stats.dropped_invalid += 1;
                continue;
            };

            if !self.seen.insert(url.clone()) {
                stats.dropped_duplicate += 1;
                continue;
            }

            let published = item.published_raw().and_then(parse_published);
            let Some(published) = published.filter(|p| self.now - *p <= self.window) else {
                stats.dropped_old += 1;
                continue;
            };

            if !self.whitelist.allows(&self.topic, &host, &path) {
                tracing::trace!(%url, "source not whitelisted");
                stats.dropped_source += 1;
                continue;
            }

            let title = item
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| host.clone());
            let mut article = Article {
                id: format!("{}-{}", self.run_id, short_hash(&url)),
                tier: self.tiers.tier_of(&host),
                url,
                title,
                source: host,
                published,
                snippet: item.snippet.map(|s| s.trim().to_string()).unwrap_or_default(),
                depth,
                tags: Vec::new(),
            };
            article.tags = tags_for(&article, &self.topic, self.now);
            kept.push(article);
        }

        stats.kept = kept.len();
        (kept, stats)
    }
}
