use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY};
use serde::{Deserialize, Serialize};

/// One search hit as returned by the search model. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    /// Fallback keys some search models use instead of `published_at`.
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl RawResult {
    /// The first non-blank of `published_at`, `published`, `date`.
    pub fn published_raw(&self) -> Option<&str> {
        [&self.published_at, &self.published, &self.date]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .find(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTier {
    High,
    Medium,
    Unranked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Primary,
    Hype,
    Uncertain,
    Evergreen,
    Newsletter,
    Old,
}

/// A filtered search hit. Unique by `url` within a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub id: String,
    pub url: String,
    pub title: String,
    pub source: String,
    pub published: DateTime<Utc>,
    pub snippet: String,
    pub tier: SourceTier,
    /// Loop iteration that found the article; 0 for the planned queries.
    pub depth: u32,
    pub tags: Vec<Tag>,
}

impl Article {
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// Lowercased title and snippet, the text keyword heuristics look at.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.snippet).to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedArticle {
    #[serde(flatten)]
    pub article: Article,
    pub score: f64,
}

/// First 10 hex chars of the SHA-1 of `input`.
pub fn short_hash(input: &str) -> String {
    digest(&SHA1_FOR_LEGACY_USE_ONLY, input.as_bytes())
        .as_ref()
        .iter()
        .take(5)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Parse a published timestamp as the search model tends to emit it.
///
/// RFC 3339 is preferred; naive date-times are taken as UTC and a bare date
/// is midnight UTC.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
