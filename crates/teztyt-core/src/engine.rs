//! Batch generation orchestrator.
//!
//! Generates tests `1..=n` one after another: each test is assembled, fitted
//! to the page budget, and its solution key appended to the batch's book.
//! The first failing test ends the batch; tests accepted before it are kept.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::assembler::{Assembler, Selection};
use crate::error::ExamError;
use crate::merge::FormDocument;
use crate::model::{ProblemBank, RetryStrategy, SolutionBook};
use crate::pagefit::{FitStep, PageFitController};
use crate::scoring::SubmissionScore;
use crate::traits::{Composer, RenderedArtifact, Renderer};

/// Configuration for batch generation.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Number of tests; ids run from 1.
    pub number: u32,
    pub max_pages: u32,
    /// Total attempts per test.
    pub max_attempts: u32,
    pub retry_strategy: RetryStrategy,
    /// Documents are named `<prefix><test id>`.
    pub out_file_prefix: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            number: 1,
            max_pages: 2,
            max_attempts: 5,
            retry_strategy: RetryStrategy::Resample,
            out_file_prefix: "test".into(),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_test_start(&self, test_id: u32);
    fn on_test_accepted(&self, test: &AcceptedTest);
    fn on_test_failed(&self, test_id: u32, error: &str);
    fn on_document_scored(&self, document: &str, score: &SubmissionScore);
    fn on_document_skipped(&self, document: &str, reason: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_test_start(&self, _: u32) {}
    fn on_test_accepted(&self, _: &AcceptedTest) {}
    fn on_test_failed(&self, _: u32, _: &str) {}
    fn on_document_scored(&self, _: &str, _: &SubmissionScore) {}
    fn on_document_skipped(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// A test that fit into the page budget.
#[derive(Debug, Clone)]
pub struct AcceptedTest {
    pub test_id: u32,
    pub page_count: u32,
    pub attempts: u32,
    pub artifact: RenderedArtifact,
    /// Form field registry of the rendered document.
    pub form: FormDocument,
    pub trace: Vec<FitStep>,
}

/// The test that ended a batch early.
#[derive(Debug)]
pub struct BatchFailure {
    pub test_id: u32,
    pub error: ExamError,
}

/// Everything a batch produced, including a partial batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub accepted: Vec<AcceptedTest>,
    /// Solution keys of the accepted tests.
    pub solutions: SolutionBook,
    pub failure: Option<BatchFailure>,
    pub duration_ms: u64,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Drives assembly and page fitting for a whole batch.
pub struct BatchGenerator<'a> {
    bank: &'a ProblemBank,
    composer: &'a dyn Composer,
    renderer: &'a dyn Renderer,
    config: GenerationConfig,
}

impl<'a> BatchGenerator<'a> {
    pub fn new(
        bank: &'a ProblemBank,
        composer: &'a dyn Composer,
        renderer: &'a dyn Renderer,
        config: GenerationConfig,
    ) -> Self {
        Self {
            bank,
            composer,
            renderer,
            config,
        }
    }

    /// Generate the batch. `rng` is the only randomness source.
    pub async fn run<R: Rng>(
        &self,
        selection: &Selection,
        rng: R,
        progress: &dyn ProgressReporter,
    ) -> BatchOutcome {
        let start = Instant::now();
        let mut assembler = Assembler::new(self.bank, self.composer, rng);
        let controller =
            PageFitController::new(self.renderer, self.config.max_pages, self.config.max_attempts);
        let strategy = self.config.retry_strategy;

        let mut accepted = Vec::new();
        let mut solutions = SolutionBook::new();
        let mut failure = None;

        for test_id in 1..=self.config.number {
            progress.on_test_start(test_id);
            let fitted = controller
                .fit(test_id, |rejected| match (strategy, rejected) {
                    (RetryStrategy::Reshuffle, Some(draft)) => assembler.reshuffle(draft),
                    _ => assembler.assemble(test_id, selection),
                })
                .await;

            match fitted {
                Ok(fitted) => {
                    let name = format!("{}{}", self.config.out_file_prefix, test_id);
                    let test = AcceptedTest {
                        test_id,
                        page_count: fitted.page_count,
                        attempts: fitted.attempts,
                        form: FormDocument::from_draft(name, &fitted.draft, fitted.page_count),
                        artifact: fitted.artifact,
                        trace: fitted.trace,
                    };
                    tracing::info!(
                        test_id,
                        pages = test.page_count,
                        attempts = test.attempts,
                        "test accepted"
                    );
                    progress.on_test_accepted(&test);
                    solutions.insert(test_id, fitted.draft.key);
                    accepted.push(test);
                }
                Err(error) => {
                    tracing::error!(test_id, "generation failed: {error}");
                    progress.on_test_failed(test_id, &error.to_string());
                    failure = Some(BatchFailure { test_id, error });
                    break;
                }
            }
        }

        let elapsed = start.elapsed();
        progress.on_batch_complete(
            self.config.number as usize,
            accepted.len(),
            usize::from(failure.is_some()),
            elapsed,
        );

        BatchOutcome {
            accepted,
            solutions,
            failure,
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}
