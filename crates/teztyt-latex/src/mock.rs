//! Scripted renderer for testing.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use teztyt_core::traits::{RenderRequest, RenderedArtifact, Renderer};
use teztyt_core::ExamError;

/// A renderer that reports page counts from a script instead of compiling.
///
/// The n-th render is measured as `pages[n]`; once the script runs out the
/// last entry repeats. An empty script measures every document as one page.
pub struct ScriptedRenderer {
    pages: Vec<u32>,
    /// Reported as missing on every render when set.
    missing_toolchain: Option<String>,
    call_count: AtomicU32,
    requests: Mutex<Vec<RenderRequest>>,
}

impl ScriptedRenderer {
    pub fn new(pages: Vec<u32>) -> Self {
        Self {
            pages,
            missing_toolchain: None,
            call_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every document fits into one page.
    pub fn fitting() -> Self {
        Self::new(Vec::new())
    }

    /// Every render fails as if `name` were not installed.
    pub fn missing_toolchain(name: &str) -> Self {
        Self {
            missing_toolchain: Some(name.to_string()),
            ..Self::fitting()
        }
    }

    /// Number of render calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Every render request received, in order.
    pub fn requests(&self) -> Vec<RenderRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedArtifact, ExamError> {
        if let Some(name) = &self.missing_toolchain {
            return Err(ExamError::ToolchainUnavailable(name.clone()));
        }
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        Ok(RenderedArtifact {
            test_id: request.test_id,
            document: PathBuf::from(format!("scripted-{}-{}.pdf", request.test_id, request.attempt)),
            tool_succeeded: true,
        })
    }

    async fn measure(&self, _artifact: &RenderedArtifact) -> Result<u32, ExamError> {
        let index = self.call_count().saturating_sub(1) as usize;
        Ok(self
            .pages
            .get(index)
            .or(self.pages.last())
            .copied()
            .unwrap_or(1))
    }
}
