//! Immutable source policy: per-topic whitelists and credibility tiers.

use super::article::SourceTier;
use super::url::domain_matches;
use crate::config::{RankingConfig, WhitelistConfig};
use std::collections::BTreeMap;

const HIGH_TIER_DEFAULT_WEIGHT: f64 = 0.6;
const MEDIUM_TIER_DEFAULT_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct Whitelist {
    default: Vec<String>,
    topics: BTreeMap<String, Vec<String>>,
}

impl Whitelist {
    pub fn new(config: &WhitelistConfig) -> Self {
        Self {
            default: config.default.clone(),
            topics: config
                .topics
                .iter()
                .map(|(topic, domains)| (topic_key(topic), domains.clone()))
                .collect(),
        }
    }

    /// Trusted domains for a topic. Topics are matched case-insensitively;
    /// unknown topics get the default list.
    pub fn for_topic(&self, topic: &str) -> &[String] {
        self.topics
            .get(&topic_key(topic))
            .map(Vec::as_slice)
            .unwrap_or(&self.default)
    }

    pub fn allows(&self, topic: &str, host: &str, path: &str) -> bool {
        self.for_topic(topic)
            .iter()
            .any(|pattern| domain_matches(host, path, pattern))
    }
}

fn topic_key(topic: &str) -> String {
    topic.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[derive(Debug, Clone)]
pub struct SourceTiers {
    high: Vec<String>,
    medium: Vec<String>,
    weights: Vec<(String, f64)>,
}

impl SourceTiers {
    pub fn new(config: &RankingConfig) -> Self {
        Self {
            high: config.high_tier.clone(),
            medium: config.medium_tier.clone(),
            weights: config
                .domain_weights
                .iter()
                .map(|(d, w)| (d.clone(), *w))
                .collect(),
        }
    }

    pub fn tier_of(&self, host: &str) -> SourceTier {
        if self.high.iter().any(|d| domain_matches(host, "/", d)) {
            SourceTier::High
        } else if self.medium.iter().any(|d| domain_matches(host, "/", d)) {
            SourceTier::Medium
        } else {
            SourceTier::Unranked
        }
    }

    /// Highest configured weight among matching domains, falling back to
    /// the tier default.
    pub fn weight_of(&self, host: &str) -> f64 {
        let configured = self
            .weights
            .iter()
            .filter(|(d, _)| domain_matches(host, "/", d))
            .map(|(_, w)| *w)
            .fold(None, |best: Option<f64>, w| Some(best.map_or(w, |b| b.max(w))));
        configured.unwrap_or(match self.tier_of(host) {
            SourceTier::High => HIGH_TIER_DEFAULT_WEIGHT,
            SourceTier::Medium => MEDIUM_TIER_DEFAULT_WEIGHT,
            SourceTier::Unranked => 0.0,
        })
    }
}
