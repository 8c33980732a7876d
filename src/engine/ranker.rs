//! Article scoring and final ordering.
//!
//! score = 1.0 + source weight + recency + relevance - penalties
//!
//! Recency decays by half every `recency_half_life_hours`. Relevance is a
//! keyword heuristic over title and snippet. Ties go to the more recent
//! article, then to the one found first. At most `newsletter_cap`
//! newsletters and `evergreen_cap` evergreen items survive.

use super::article::{Article, RankedArticle, SourceTier, Tag};
use super::sources::SourceTiers;
use super::tags::{
    contains_any, is_github, is_major_github_release, BIG_NEWS_TERMS, NOVELTY_TERMS,
    RESEARCH_TERMS,
};
use crate::config::RankingConfig;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

const TOPIC_TERM_WEIGHT: f64 = 0.1;
const TOPIC_TERM_CAP: f64 = 0.3;
const NOVELTY_WEIGHT: f64 = 0.2;
const RESEARCH_WEIGHT: f64 = 0.15;
const UNRANKED_NOVELTY_SCALE: f64 = 0.4;
const BIG_NEWS_WEIGHT: f64 = 0.25;
const BIG_NEWS_HIGH_TIER_BONUS: f64 = 0.08;
const CONFIRMED_BONUS: f64 = 0.25;

const UNRANKED_PENALTY: f64 = 0.15;
const UNCERTAIN_PENALTY: f64 = 0.25;
const NEWSLETTER_PENALTY_INITIAL: f64 = 0.2;
const NEWSLETTER_PENALTY_DEEPEN: f64 = 0.1;
const GITHUB_PENALTY: f64 = 0.3;
const GITHUB_NON_RELEASE_PENALTY: f64 = 0.5;
const EVERGREEN_PENALTY: f64 = 0.35;

/// Words too common in topics to count as relevance signals.
const STOPWORDS: &[&str] = &["the", "and", "for", "with", "news", "latest", "from"];

pub struct Ranker<'a> {
    tiers: &'a SourceTiers,
    recency_weight: f64,
    half_life_hours: f64,
    newsletter_cap: usize,
    evergreen_cap: usize,
    topic_terms: Vec<String>,
}

impl<'a> Ranker<'a> {
    pub fn new(config: &RankingConfig, tiers: &'a SourceTiers, topic: &str) -> Self {
        let topic_terms = topic
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() >= 2 && !STOPWORDS.contains(w))
            .map(str::to_string)
            .collect();
        Self {
            tiers,
            recency_weight: config.recency_weight,
            half_life_hours: config.recency_half_life_hours,
            newsletter_cap: config.newsletter_cap,
            evergreen_cap: config.evergreen_cap,
            topic_terms,
        }
    }

    /// Strictly decreasing in age; future timestamps count as age zero.
    pub fn recency(&self, published: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let age_hours = ((now - published).num_seconds().max(0) as f64) / 3600.0;
        self.recency_weight * 0.5f64.powf(age_hours / self.half_life_hours)
    }

    pub fn relevance(&self, article: &Article) -> f64 {
        let text = article.text();

        let hits = self
            .topic_terms
            .iter()
            .filter(|t| text.contains(t.as_str()))
            .count();
        let mut score = (hits as f64 * TOPIC_TERM_WEIGHT).min(TOPIC_TERM_CAP);

        let mut novelty = 0.0;
        if contains_any(&text, NOVELTY_TERMS) {
            novelty += NOVELTY_WEIGHT;
        }
        if contains_any(&text, RESEARCH_TERMS) {
            novelty += RESEARCH_WEIGHT;
        }
        if article.tier == SourceTier::Unranked {
            novelty *= UNRANKED_NOVELTY_SCALE;
        }
        score += novelty;

        if contains_any(&text, BIG_NEWS_TERMS) {
            score += BIG_NEWS_WEIGHT;
            if article.tier == SourceTier::High {
                score += BIG_NEWS_HIGH_TIER_BONUS;
            }
        }
        score
    }

    fn penalties(&self, article: &Article) -> f64 {
        let mut p = 0.0;
        if article.tier == SourceTier::Unranked {
            p += UNRANKED_PENALTY;
        }
        if article.has_tag(Tag::Uncertain) {
            p += UNCERTAIN_PENALTY;
        }
        if article.has_tag(Tag::Newsletter) {
            p += if article.depth == 0 {
                NEWSLETTER_PENALTY_INITIAL
            } else {
                NEWSLETTER_PENALTY_DEEPEN
            };
        }
        if article.tier == SourceTier::Unranked && is_github(article) {
            p += GITHUB_PENALTY;
            if !is_major_github_release(article) {
                p += GITHUB_NON_RELEASE_PENALTY;
            }
        }
        if article.has_tag(Tag::Evergreen) {
            p += EVERGREEN_PENALTY;
        }
        p
    }

    pub fn score(&self, article: &Article, now: DateTime<Utc>) -> f64 {
        let mut s = 1.0 + self.tiers.weight_of(&article.source);
        s += self.recency(article.published, now);
        s += self.relevance(article);
        if article.depth >= 1 && article.tier == SourceTier::High {
            s += CONFIRMED_BONUS;
        }
        s - self.penalties(article)
    }

    /// Score, sort and truncate. Deterministic for a fixed `now`.
    pub fn rank(&self, articles: Vec<Article>, now: DateTime<Utc>, limit: usize) -> Vec<RankedArticle> {
        let mut scored: Vec<(usize, RankedArticle)> = articles
            .into_iter()
            .enumerate()
            .map(|(idx, article)| {
                let score = self.score(&article, now);
                (idx, RankedArticle { article, score })
            })
            .collect();

        scored.sort_by(|(ia, a), (ib, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.article.published.cmp(&a.article.published))
                .then_with(|| ia.cmp(ib))
        });

        let mut newsletters = 0;
        let mut evergreens = 0;
        scored
            .into_iter()
            .map(|(_, ranked)| ranked)
            .filter(|ranked| {
                if ranked.article.has_tag(Tag::Newsletter) {
                    newsletters += 1;
                    if newsletters > self.newsletter_cap {
                        return false;
                    }
                }
                if ranked.article.has_tag(Tag::Evergreen) {
                    evergreens += 1;
                    if evergreens > self.evergreen_cap {
                        return false;
                    }
                }
                true
            })
            .take(limit)
            .collect()
    }
}
