//! Batch evaluation of completed answer documents.
//!
//! A document that cannot be read, attributed to a test, or scored is
//! recorded as a failure in the report and the batch moves on.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use crate::engine::ProgressReporter;
use crate::error::ExamError;
use crate::model::SolutionBook;
use crate::report::{EvaluationFailure, EvaluationReport, SubmissionReport};
use crate::scoring::{score_submission, ScoredSubmission, ScoringPolicy, SubmissionScore};
use crate::statistics::compute_statistics;
use crate::traits::FieldExtractor;

/// List the documents in `dir` the extractor accepts, sorted by path.
pub fn collect_documents(dir: &Path, extractor: &dyn FieldExtractor) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && extractor.accepts(&path) {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

/// Score a single document.
pub fn evaluate_document(
    extractor: &dyn FieldExtractor,
    path: &Path,
    book: &SolutionBook,
    policy: &ScoringPolicy,
) -> Result<SubmissionScore> {
    let fields = extractor.extract(path)?;
    let submission = ScoredSubmission::from_fields(&fields)?;
    Ok(score_submission(book, &submission, policy)?)
}

/// Score every document and build the report.
///
/// Only errors outside single documents abort; extraction failures and
/// document-scoped [`ExamError`]s become report failures.
pub fn evaluate_batch(
    extractor: &dyn FieldExtractor,
    documents: &[PathBuf],
    book: &SolutionBook,
    policy: &ScoringPolicy,
    field_labels: Vec<String>,
    progress: &dyn ProgressReporter,
) -> Result<EvaluationReport> {
    let start = Instant::now();
    let mut report = EvaluationReport::new(policy.name(), field_labels);

    for path in documents {
        let document = display_name(path);
        match evaluate_document(extractor, path, book, policy) {
            Ok(score) => {
                tracing::debug!(%document, total = score.total, "scored");
                progress.on_document_scored(&document, &score);
                report.submissions.push(SubmissionReport { document, score });
            }
            Err(e) => {
                if let Some(exam) = e.downcast_ref::<ExamError>() {
                    if !exam.is_document_scoped() {
                        return Err(e.context(format!("evaluation aborted at {document}")));
                    }
                }
                let reason = format!("{e:#}");
                tracing::warn!(%document, "skipping submission: {reason}");
                progress.on_document_skipped(&document, &reason);
                report.failures.push(EvaluationFailure { document, reason });
            }
        }
    }

    let scores: Vec<SubmissionScore> = report.submissions.iter().map(|s| s.score.clone()).collect();
    report.statistics = compute_statistics(&scores);
    let elapsed = start.elapsed();
    report.duration_ms = elapsed.as_millis() as u64;
    progress.on_batch_complete(
        documents.len(),
        report.submissions.len(),
        report.failures.len(),
        elapsed,
    );
    Ok(report)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use super::*;
    use crate::engine::NoopReporter;
    use crate::model::{SolutionEntry, SolutionKey};
    use crate::traits::{FieldStore, FieldValue};

    /// Serves stores by file name; unknown names fail to extract.
    struct InMemory(HashMap<String, FieldStore>);

    impl FieldExtractor for InMemory {
        fn accepts(&self, path: &Path) -> bool {
            path.extension().is_some_and(|e| e == "json")
        }

        fn extract(&self, path: &Path) -> Result<FieldStore> {
            self.0
                .get(&display_name(path))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("unreadable"))
        }
    }

    fn store(entries: &[(&str, FieldValue)]) -> FieldStore {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn book() -> SolutionBook {
        let entry = |correct: &[u32]| SolutionEntry {
            file_index: 1,
            problem_id: "a".into(),
            points: 2.0,
            correct: correct.iter().copied().collect::<BTreeSet<_>>(),
        };
        SolutionBook::from([
            (1, SolutionKey::from([(1, entry(&[2]))])),
            (2, SolutionKey::from([(1, entry(&[]))])),
        ])
    }

    fn extractor() -> InMemory {
        InMemory(HashMap::from([
            (
                "test1.json".to_string(),
                store(&[
                    ("1:1:1:a:1", FieldValue::Unchecked),
                    ("1:1:1:a:2", FieldValue::Checked),
                    ("t1:0", FieldValue::Text("Ada".into())),
                ]),
            ),
            ("test2.json".to_string(), store(&[("2:1:1:a:1", FieldValue::Checked)])),
            ("test3.json".to_string(), store(&[("3:1:1:a:1", FieldValue::Checked)])),
            ("mixed.json".to_string(), store(&[("1:1:1:a:1", FieldValue::Checked), ("2:1:1:a:1", FieldValue::Checked)])),
        ]))
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn partial_failures_are_recorded() {
        let docs = paths(&["test1.json", "test3.json", "mixed.json", "gone.json"]);
        let report = evaluate_batch(
            &extractor(),
            &docs,
            &book(),
            &ScoringPolicy::Regular,
            vec!["Name".into()],
            &NoopReporter,
        )
        .unwrap();

        assert_eq!(report.submissions.len(), 1);
        assert_eq!(report.submissions[0].document, "test1.json");
        assert_eq!(report.submissions[0].score.total, 2.0);
        assert_eq!(report.failures.len(), 3);
        assert!(report.failures[0].reason.contains("test 3"));
        assert_eq!(report.statistics.scores.count, 1);
        assert_eq!(report.policy, "regular");
    }

    #[test]
    fn scoring_errors_are_document_scoped() {
        let docs = paths(&["test2.json", "test1.json"]);
        let report = evaluate_batch(
            &extractor(),
            &docs,
            &book(),
            &ScoringPolicy::Negative,
            vec![],
            &NoopReporter,
        )
        .unwrap();
        assert_eq!(report.submissions.len(), 1);
        assert_eq!(report.failures[0].document, "test2.json");
        assert!(report.failures[0].reason.contains("no correct answers"));
    }

    #[test]
    fn collect_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.json", "a.json", "notes.txt"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.json")).unwrap();
        let docs = collect_documents(dir.path(), &extractor()).unwrap();
        let names: Vec<String> = docs.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }
}
