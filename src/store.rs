//! Analysis record persistence.
//!
//! Records are pretty-printed JSON files in a flat results directory,
//! keyed by a game-name slug plus a UTC timestamp. Persistence is
//! best-effort from the caller's perspective: a failed save is logged
//! and the verdict is still returned.

use crate::models::{AnalysisRecord, RecommendedAction};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Summary of one stored analysis, for history listings.
#[derive(Debug, Clone)]
pub struct StoredSummary {
    /// Record id (file stem).
    pub id: String,
    pub game_name: String,
    pub analysis_date: DateTime<Utc>,
    pub weighted_score: f64,
    pub recommended_action: RecommendedAction,
}

/// File-based store for analysis records.
pub struct AnalysisStore {
    results_dir: PathBuf,
}

impl AnalysisStore {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Persist one record. Returns the path it was written to.
    pub fn save(&self, record: &AnalysisRecord) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.results_dir).with_context(|| {
            format!(
                "Failed to create results directory: {}",
                self.results_dir.display()
            )
        })?;

        let id = format!(
            "{}_{}",
            slugify(&record.metadata.game.name),
            record.metadata.analysis_date.format("%Y%m%d_%H%M%S")
        );
        let path = self.results_dir.join(format!("{}.json", id));

        let content =
            serde_json::to_string_pretty(record).context("Failed to serialize analysis record")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write analysis record: {}", path.display()))?;

        debug!("Saved analysis record to {}", path.display());
        Ok(path)
    }

    /// Load one record by id.
    pub fn load(&self, id: &str) -> Result<AnalysisRecord> {
        let path = self.results_dir.join(format!("{}.json", id));
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read analysis record: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse analysis record: {}", path.display()))
    }

    /// List stored analyses, newest first.
    ///
    /// Unreadable or unparseable files are skipped with a warning, not
    /// treated as fatal.
    pub fn list(&self) -> Result<Vec<StoredSummary>> {
        if !self.results_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.results_dir).with_context(|| {
            format!(
                "Failed to read results directory: {}",
                self.results_dir.display()
            )
        })?;

        let mut summaries = Vec::new();

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let id = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };

            match self.load(&id) {
                Ok(record) => summaries.push(StoredSummary {
                    id,
                    game_name: record.metadata.game.name,
                    analysis_date: record.metadata.analysis_date,
                    weighted_score: record.aggregate.weighted_score,
                    recommended_action: record.aggregate.recommended_action,
                }),
                Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
            }
        }

        summaries.sort_by(|a, b| b.analysis_date.cmp(&a.analysis_date));
        Ok(summaries)
    }
}

/// Turn a game name into a filesystem-safe slug.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_separator = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            slug.push('_');
            last_was_separator = true;
        }
    }

    while slug.ends_with('_') {
        slug.pop();
    }

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}
