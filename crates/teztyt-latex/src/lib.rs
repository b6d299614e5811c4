//! teztyt-latex: LaTeX composition and pdflatex rendering.
//!
//! Writes one `.tex` file per test attempt, compiles it with the configured
//! pdflatex, and reads the resulting page count from the compiler log.

pub mod compiler;
pub mod composer;
pub mod mock;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use teztyt_core::config::ExamConfig;
use teztyt_core::traits::{RenderRequest, RenderedArtifact, Renderer};
use teztyt_core::ExamError;

pub use composer::LatexComposer;

/// Renderer backed by a local pdflatex installation.
pub struct LatexRenderer {
    out_dir: PathBuf,
    pdflatex: String,
    parameters: Vec<String>,
    out_file_prefix: String,
}

impl LatexRenderer {
    pub fn new(out_dir: impl Into<PathBuf>, pdflatex: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            pdflatex: pdflatex.into(),
            parameters: Vec::new(),
            out_file_prefix: "test".into(),
        }
    }

    pub fn from_config(out_dir: impl Into<PathBuf>, config: &ExamConfig) -> Self {
        Self::new(out_dir, config.latex.pdflatex.clone())
            .with_parameters(config.latex.latex_parameters.clone())
            .with_prefix(config.out_file_prefix.clone())
    }

    pub fn with_parameters(mut self, parameters: Vec<String>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.out_file_prefix = prefix.into();
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn stem(&self, test_id: u32) -> String {
        format!("{}{}", self.out_file_prefix, test_id)
    }
}

#[async_trait]
impl Renderer for LatexRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedArtifact, ExamError> {
        let stem = self.stem(request.test_id);
        let tex = self.out_dir.join(format!("{stem}.tex"));

        tokio::fs::create_dir_all(&self.out_dir).await?;
        tokio::fs::write(&tex, &request.source).await?;
        tracing::debug!(
            test_id = request.test_id,
            attempt = request.attempt,
            tex = %tex.display(),
            "compiling"
        );

        let output =
            compiler::compile(&self.pdflatex, &self.parameters, &self.out_dir, &tex).await?;

        Ok(RenderedArtifact {
            test_id: request.test_id,
            document: self.out_dir.join(format!("{stem}.pdf")),
            tool_succeeded: output.success,
        })
    }

    async fn measure(&self, artifact: &RenderedArtifact) -> Result<u32, ExamError> {
        let stem = self.stem(artifact.test_id);
        let log_path = self.out_dir.join(format!("{stem}.log"));
        let unavailable = |reason: String| ExamError::PageCountUnavailable {
            test_id: artifact.test_id,
            reason,
        };

        // pdflatex logs are not always valid UTF-8.
        let bytes = tokio::fs::read(&log_path)
            .await
            .map_err(|e| unavailable(format!("cannot read {}: {e}", log_path.display())))?;
        let log = String::from_utf8_lossy(&bytes);

        compiler::page_count_from_log(&log, &stem)
            .ok_or_else(|| unavailable(format!("no page count in {}", log_path.display())))
    }
}
