//! Exam engine error types.
//!
//! Defined once in `teztyt-core` so the generation and evaluation engines can
//! classify failures (fatal for the run vs. scoped to one document) without
//! string matching. File loaders wrap these in `anyhow` with context; callers
//! recover them with `downcast_ref::<ExamError>()`.

use thiserror::Error;

/// Errors raised by assembly, rendering, the solution store, and scoring.
#[derive(Debug, Error)]
pub enum ExamError {
    /// The number of per-file selections differs from the number of loaded files.
    #[error("expected a selection for each of the {expected} problem files, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// A by-count selection asked for more problems than a file holds.
    #[error("file {file_index} holds {available} problems, {requested} requested")]
    InsufficientProblems {
        file_index: usize,
        requested: usize,
        available: usize,
    },

    /// The same problem id appears twice in one problem file.
    #[error("duplicate problem id `{id}` in {source_name}")]
    DuplicateProblemId { source_name: String, id: String },

    /// An explicit selection names a problem that its file does not contain.
    #[error("problem `{id}` not found in file {file_index}")]
    UnknownProblemId { file_index: usize, id: String },

    /// A problem violates a load-time invariant.
    #[error("invalid problem `{id}` in {source_name}: {reason}")]
    InvalidProblem {
        source_name: String,
        id: String,
        reason: String,
    },

    /// A field name could not be decoded into its components.
    #[error("malformed field identifier `{0}`")]
    MalformedIdentifier(String),

    /// A solution file line or record does not match the expected layout.
    #[error("malformed solution file at line {line}: {reason}")]
    MalformedSolutionFile { line: usize, reason: String },

    /// The same test id occurs twice in one solution file.
    #[error("duplicate test id {0} in solution file")]
    DuplicateTestId(u32),

    /// A submission refers to a test with no loaded solution key.
    #[error("no solution key for test {0}")]
    UnknownTestId(u32),

    /// A proportional policy was asked to score a problem with no correct answers.
    #[error("cannot score problem {sequence} with `{policy}`: it has no correct answers")]
    DivisionByZeroScoring { policy: String, sequence: u32 },

    /// The configured scoring policy is neither built in nor registered.
    #[error("unknown scoring policy `{0}`")]
    UnknownScoringPolicy(String),

    /// Every attempt to fit a test into the page budget failed.
    #[error(
        "test {test_id} could not fit into {max_pages} page(s) after {attempts} attempt(s) (last: {last_pages})"
    )]
    PageBudgetExceeded {
        test_id: u32,
        attempts: u32,
        max_pages: u32,
        last_pages: u32,
    },

    /// The render collaborator produced no readable page count.
    #[error("page count unavailable for test {test_id}: {reason}")]
    PageCountUnavailable { test_id: u32, reason: String },

    /// The external typesetting toolchain cannot be found.
    #[error("{0} cannot be found")]
    ToolchainUnavailable(String),

    /// A document offered for merging lacks its form field registry.
    #[error("document `{0}` has no form field registry")]
    FieldRegistryMissing(String),

    /// Merging would introduce a second field with an existing name.
    #[error("field `{field}` from `{document}` is already registered")]
    DuplicateFieldName { document: String, field: String },

    /// A scanned field store cannot be attributed to a single test.
    #[error("malformed submission: {0}")]
    MalformedSubmission(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExamError {
    /// Returns `true` if this error concerns one evaluated document only.
    ///
    /// Batch evaluation records these against the document and moves on;
    /// everything else aborts the run.
    pub fn is_document_scoped(&self) -> bool {
        matches!(
            self,
            ExamError::MalformedIdentifier(_)
                | ExamError::MalformedSubmission(_)
                | ExamError::UnknownTestId(_)
                | ExamError::DivisionByZeroScoring { .. }
        )
    }

    /// Returns `true` if the typesetting toolchain itself failed, so no later
    /// test of the batch could succeed either.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExamError::ToolchainUnavailable(_) | ExamError::PageCountUnavailable { .. }
        )
    }
}
