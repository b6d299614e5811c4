//! Trait definitions for the engine's external collaborators.
//!
//! The typesetting backend (`teztyt-latex`) implements [`Composer`] and
//! [`Renderer`]; the form backend (`teztyt-forms`) implements
//! [`FieldExtractor`]. The core never looks inside rendered documents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExamError;
use crate::model::{ProblemBank, TestInstance};

// ---------------------------------------------------------------------------
// Document composition
// ---------------------------------------------------------------------------

/// Turns an assembled test into document source text.
pub trait Composer: Send + Sync {
    /// Produce the full source of one test document.
    ///
    /// Every option of every selected problem must be rendered with the
    /// field identifier from [`crate::model::SelectedProblem::field_names`].
    fn compose(&self, bank: &ProblemBank, instance: &TestInstance) -> String;

    /// Number of free-text fields (`t<test>:<index>`) placed on every form.
    fn text_field_count(&self) -> usize {
        0
    }
}

// ---------------------------------------------------------------------------
// Render / measure
// ---------------------------------------------------------------------------

/// Backend that typesets a document and reports its length.
///
/// Calls are awaited one at a time and carry no timeout of their own.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render document source into a paginated artifact.
    ///
    /// A failed compilation is not an error here; it shows up when the
    /// artifact is measured. Only a missing toolchain is reported.
    async fn render(&self, request: &RenderRequest) -> Result<RenderedArtifact, ExamError>;

    /// Report the page count of a rendered artifact.
    async fn measure(&self, artifact: &RenderedArtifact) -> Result<u32, ExamError>;
}

/// Request to render one test document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    pub test_id: u32,
    /// 1-based attempt number within the page-fit loop.
    pub attempt: u32,
    /// Full document source.
    pub source: String,
}

/// Opaque handle to a rendered document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedArtifact {
    pub test_id: u32,
    /// The paginated output (e.g. a PDF).
    pub document: PathBuf,
    /// Whether the external tool reported success.
    pub tool_succeeded: bool,
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

/// Value of one form field as read back from a completed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValue {
    Checked,
    Unchecked,
    /// The field exists but carries no value; counts as unchecked.
    Absent,
    Text(String),
}

/// Field name to value mapping of one completed document.
pub type FieldStore = BTreeMap<String, FieldValue>;

/// Backend that reads form fields out of completed answer documents.
pub trait FieldExtractor: Send + Sync {
    /// Whether `path` looks like a document this extractor can read.
    fn accepts(&self, path: &Path) -> bool;

    /// Read every form field of the document.
    fn extract(&self, path: &Path) -> anyhow::Result<FieldStore>;
}
