pub mod eval;
pub mod gen;
pub mod init;
pub mod merge;
pub mod validate;

use std::time::Duration;

use teztyt_core::engine::{AcceptedTest, ProgressReporter};
use teztyt_core::scoring::SubmissionScore;

/// Console progress reporter.
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_test_start(&self, test_id: u32) {
        eprintln!("  Starting: test {test_id}");
    }

    fn on_test_accepted(&self, test: &AcceptedTest) {
        eprintln!(
            "  Done: test {} [{} page(s), {} attempt(s)] {}",
            test.test_id,
            test.page_count,
            test.attempts,
            test.artifact.document.display()
        );
    }

    fn on_test_failed(&self, test_id: u32, error: &str) {
        eprintln!("  ERROR: test {test_id}: {error}");
    }

    fn on_document_scored(&self, document: &str, score: &SubmissionScore) {
        eprintln!(
            "  Scored: {document} (test {}) {:.2}/{:.2}",
            score.test_id, score.total, score.max_total
        );
    }

    fn on_document_skipped(&self, document: &str, reason: &str) {
        eprintln!("  SKIPPED: {document}: {reason}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} succeeded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}
