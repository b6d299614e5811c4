//! Evaluation report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::TextFieldId;
use crate::scoring::SubmissionScore;
use crate::statistics::BatchStatistics;

/// A complete evaluation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Name of the scoring policy used.
    pub policy: String,
    /// Labels of the free-text form fields, by field index.
    #[serde(default)]
    pub field_labels: Vec<String>,
    /// Successfully scored documents, in file name order.
    pub submissions: Vec<SubmissionReport>,
    /// One note per document that could not be scored.
    pub failures: Vec<EvaluationFailure>,
    pub statistics: BatchStatistics,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// The score of one evaluated document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    /// File name of the evaluated document.
    pub document: String,
    #[serde(flatten)]
    pub score: SubmissionScore,
}

impl SubmissionReport {
    /// Free-text answers as `(label, value)`, in field index order.
    ///
    /// Fields without a configured label fall back to their raw name.
    pub fn labelled_text(&self, labels: &[String]) -> Vec<(String, String)> {
        let mut out: Vec<(usize, String, String)> = self
            .score
            .text_fields
            .iter()
            .map(|(name, value)| {
                let index = name.parse::<TextFieldId>().ok().map(|id| id.index);
                let label = index
                    .and_then(|i| labels.get(i))
                    .cloned()
                    .unwrap_or_else(|| name.clone());
                (index.unwrap_or(usize::MAX), label, value.clone())
            })
            .collect();
        out.sort_by_key(|(i, _, _)| *i);
        out.into_iter().map(|(_, l, v)| (l, v)).collect()
    }
}

/// A document that was skipped during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationFailure {
    pub document: String,
    pub reason: String,
}

impl EvaluationReport {
    pub fn new(policy: impl Into<String>, field_labels: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            policy: policy.into(),
            field_labels,
            submissions: Vec::new(),
            failures: Vec::new(),
            statistics: BatchStatistics::default(),
            duration_ms: 0,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: EvaluationReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Look up a scored document by file name.
    pub fn submission(&self, document: &str) -> Option<&SubmissionReport> {
        self.submissions.iter().find(|s| s.document == document)
    }
}
