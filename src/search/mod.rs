//! LLM-backed pipeline stages: query planning, web search and the
//! stop/deepen decision.

pub mod oracle;
pub mod planner;
pub mod searcher;

pub use oracle::{Decision, DecisionContext, DecisionOracle, PreviewItem};
pub use planner::{Plan, QueryPlanner};
pub use searcher::WebSearcher;

/// Trim, drop blanks and case-insensitive repeats, keep at most `cap`.
pub(crate) fn clean_queries(raw: &[String], cap: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for q in raw {
        if out.len() >= cap {
            break;
        }
        let q = q.split_whitespace().collect::<Vec<_>>().join(" ");
        if q.is_empty() || out.iter().any(|seen| seen.eq_ignore_ascii_case(&q)) {
            continue;
        }
        out.push(q);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_queries() {
        let raw = vec![
            "  AI  chips ".to_string(),
            "".to_string(),
            "ai chips".to_string(),
            "model launches".to_string(),
            "regulation".to_string(),
        ];
        assert_eq!(clean_queries(&raw, 2), vec!["AI chips", "model launches"]);
        assert_eq!(clean_queries(&raw, 10).len(), 3);
        assert!(clean_queries(&[], 3).is_empty());
        assert!(clean_queries(&raw, 0).is_empty());
    }
}
