//! Keyword heuristics over article text and the tags derived from them.

use super::article::{Article, SourceTier, Tag};
use chrono::{DateTime, Utc};

pub const NOVELTY_TERMS: &[&str] = &[
    "introducing", "launch", "launches", "unveils", "announces", "announcement", "benchmark",
    "sota", "state-of-the-art", "general availability", "released", "open-sourced",
    "release notes", "breakthrough",
];

pub const RESEARCH_TERMS: &[&str] = &[
    "paper", "arxiv", "preprint", "nature", "science", "neurips", "iclr", "icml", "jmlr",
    "openreview", "dataset", "model card", "system card",
];

pub const BIG_NEWS_TERMS: &[&str] = &[
    "raises", "funding", "round", "valuation", "acquires", "acquisition", "merger", "merges",
    "m&a", "8-k", "guidance", "outlook", "profit warning", "buyback", "dividend", "capex",
    "capital expenditures", "capital spending", "infrastructure", "data center", "hyperscale",
    "regulator", "regulatory", "approval", "ban", "investigation", "lawsuit", "settlement",
    "fine", "launch", "introducing", "release", "general availability", "price cut", "pricing",
];

const SENSATIONAL_TERMS: &[&str] = &["arc-agi", "surpasses human"];

const LISTICLE_TERMS: &[&str] = &[
    "best stocks", "best picks", "share tips", "top picks", "stocks to buy",
];

const MAJOR_ORGS: &[&str] = &[
    "microsoft", "openai", "google", "deepmind", "anthropic", "nvidia", "meta", "facebook",
    "apple", "amazon", "aws", "huggingface", "alphabet",
];

const RELEASE_TERMS: &[&str] = &[
    "release", "tag", "changelog", "notes", "launch", "general availability", "releases/",
];

/// Articles older than this get the `old` tag regardless of the window.
const OLD_AFTER_HOURS: i64 = 7 * 24;

/// On best-picks topics, items older than this need a catalyst to count as news.
const PICKS_FRESH_HOURS: i64 = 72;

pub fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| text.contains(t))
}

pub fn is_newsletter_like(source: &str, url: &str, title: &str) -> bool {
    let s = format!("{} {} {}", source, url, title).to_lowercase();
    s.contains("newsletter") || s.contains("substack.com")
}

/// "Best picks" style topics, e.g. "best AI stocks" or "tech stock picks".
pub fn is_best_picks_topic(topic: &str) -> bool {
    let t = topic.to_lowercase();
    t.contains("best picks") || (t.contains("stocks") && (t.contains("best") || t.contains("picks")))
}

pub fn is_github(article: &Article) -> bool {
    article.source.contains("github") || article.title.to_lowercase().contains("github")
}

/// A GitHub hit worth keeping: a release from a major organisation.
pub fn is_major_github_release(article: &Article) -> bool {
    let s = format!("{} {} {}", article.url, article.title, article.snippet).to_lowercase();
    contains_any(&s, MAJOR_ORGS) && contains_any(&s, RELEASE_TERMS)
}

/// Derive tags from tier, text, age and the topic being researched.
pub fn tags_for(article: &Article, topic: &str, now: DateTime<Utc>) -> Vec<Tag> {
    let text = article.text();
    let age_hours = (now - article.published).num_hours();
    let mut tags = Vec::new();

    if age_hours > OLD_AFTER_HOURS {
        tags.push(Tag::Old);
    }
    match article.tier {
        SourceTier::High => tags.push(Tag::Primary),
        SourceTier::Medium | SourceTier::Unranked => {
            if contains_any(&text, NOVELTY_TERMS) || contains_any(&text, RESEARCH_TERMS) {
                tags.push(Tag::Hype);
            }
        }
    }
    if article.tier == SourceTier::Unranked || contains_any(&text, SENSATIONAL_TERMS) {
        tags.push(Tag::Uncertain);
    }
    let stale_pick = is_best_picks_topic(topic)
        && age_hours > PICKS_FRESH_HOURS
        && !contains_any(&text, BIG_NEWS_TERMS);
    if stale_pick || contains_any(&text, LISTICLE_TERMS) {
        tags.push(Tag::Evergreen);
    }
    if is_newsletter_like(&article.source, &article.url, &article.title) {
        tags.push(Tag::Newsletter);
    }
    tags
}
