//! Persist a run report as one JSON file.

use crate::pipeline::RunReport;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// `<YYYY-MM-DD_HH-MM-SS>_<topic-slug>.json`
pub fn output_file_name(topic: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}.json", at.format("%Y-%m-%d_%H-%M-%S"), slug(topic))
}

fn slug(topic: &str) -> String {
    let words: Vec<String> = topic
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    if words.is_empty() {
        "topic".to_string()
    } else {
        words.join("-")
    }
}

/// Write the report into `dir`, creating it if needed. The file appears
/// only once fully written.
pub fn write_report(dir: &Path, report: &RunReport) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let path = dir.join(output_file_name(&report.topic, report.generated_at));
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;

    if let Err(e) = std::fs::write(&tmp, json) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("failed to write {}", tmp.display()));
    }
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("failed to move report into {}", path.display()));
    }

    tracing::info!(path = %path.display(), items = report.items.len(), "report written");
    Ok(path)
}
