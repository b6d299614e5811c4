//! Page-fit retry loop.
//!
//! Each attempt renders a fresh draft and measures it. A test is accepted
//! once a draft fits into `max_pages`; after `max_attempts` rejected drafts
//! the test fails with [`ExamError::PageBudgetExceeded`].

use serde::{Deserialize, Serialize};

use crate::assembler::Draft;
use crate::error::ExamError;
use crate::traits::{RenderRequest, RenderedArtifact, Renderer};

/// States a test passes through while being fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "pages")]
pub enum FitState {
    Draft,
    Rendered,
    Measured(u32),
    Accepted,
    Retrying,
    Failed,
}

/// One recorded state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitStep {
    pub attempt: u32,
    pub state: FitState,
}

/// A test whose rendered form fits the page budget.
#[derive(Debug, Clone)]
pub struct FittedTest {
    pub draft: Draft,
    pub artifact: RenderedArtifact,
    pub page_count: u32,
    /// Number of attempts used, including the accepted one.
    pub attempts: u32,
    pub trace: Vec<FitStep>,
}

/// Drives drafts through render and measure until one fits.
pub struct PageFitController<'a> {
    renderer: &'a dyn Renderer,
    max_pages: u32,
    max_attempts: u32,
}

impl<'a> PageFitController<'a> {
    pub fn new(renderer: &'a dyn Renderer, max_pages: u32, max_attempts: u32) -> Self {
        Self {
            renderer,
            max_pages,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Fit one test.
    ///
    /// `next_draft` is called once per attempt. It receives the draft the
    /// previous attempt rejected, or `None` on the first attempt. Errors from
    /// it, from rendering, or from measuring end the loop immediately.
    pub async fn fit<F>(&self, test_id: u32, mut next_draft: F) -> Result<FittedTest, ExamError>
    where
        F: FnMut(Option<&Draft>) -> Result<Draft, ExamError>,
    {
        let mut trace = Vec::new();
        let mut rejected: Option<Draft> = None;
        let mut last_pages = 0;

        for attempt in 1..=self.max_attempts {
            let draft = next_draft(rejected.as_ref())?;
            trace.push(FitStep {
                attempt,
                state: FitState::Draft,
            });

            let artifact = self
                .renderer
                .render(&RenderRequest {
                    test_id,
                    attempt,
                    source: draft.source.clone(),
                })
                .await?;
            if !artifact.tool_succeeded {
                tracing::warn!(test_id, attempt, "renderer reported a failed run");
            }
            trace.push(FitStep {
                attempt,
                state: FitState::Rendered,
            });

            let pages = self.renderer.measure(&artifact).await?;
            trace.push(FitStep {
                attempt,
                state: FitState::Measured(pages),
            });
            tracing::info!(test_id, attempt, pages, max_pages = self.max_pages, "measured");

            if pages <= self.max_pages {
                trace.push(FitStep {
                    attempt,
                    state: FitState::Accepted,
                });
                return Ok(FittedTest {
                    draft,
                    artifact,
                    page_count: pages,
                    attempts: attempt,
                    trace,
                });
            }

            last_pages = pages;
            let state = if attempt < self.max_attempts {
                FitState::Retrying
            } else {
                FitState::Failed
            };
            trace.push(FitStep { attempt, state });
            tracing::debug!(test_id, attempt, pages, ?state, "draft rejected");
            rejected = Some(draft);
        }

        tracing::warn!(test_id, attempts = self.max_attempts, "page budget exceeded");
        Err(ExamError::PageBudgetExceeded {
            test_id,
            attempts: self.max_attempts,
            max_pages: self.max_pages,
            last_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::model::{SolutionKey, TestInstance};

    struct Scripted {
        pages: Vec<Option<u32>>,
        calls: Mutex<usize>,
    }

    impl Scripted {
        fn new(pages: &[u32]) -> Self {
            Self {
                pages: pages.iter().copied().map(Some).collect(),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Renderer for Scripted {
        async fn render(&self, request: &RenderRequest) -> Result<RenderedArtifact, ExamError> {
            *self.calls.lock().unwrap() += 1;
            Ok(RenderedArtifact {
                test_id: request.test_id,
                document: PathBuf::from(format!("t{}-{}.pdf", request.test_id, request.attempt)),
                tool_succeeded: true,
            })
        }

        async fn measure(&self, artifact: &RenderedArtifact) -> Result<u32, ExamError> {
            let idx = self.calls() - 1;
            self.pages
                .get(idx)
                .copied()
                .flatten()
                .ok_or_else(|| ExamError::PageCountUnavailable {
                    test_id: artifact.test_id,
                    reason: "no log".into(),
                })
        }
    }

    fn draft(n: usize) -> Draft {
        Draft {
            instance: TestInstance {
                test_id: 1,
                problems: vec![],
            },
            key: SolutionKey::new(),
            fields: vec![],
            source: format!("draft {n}"),
        }
    }

    #[tokio::test]
    async fn accepted_on_third_attempt() {
        let renderer = Scripted::new(&[5, 5, 3]);
        let controller = PageFitController::new(&renderer, 3, 3);
        let mut produced = 0;
        let fitted = controller
            .fit(1, |_| {
                produced += 1;
                Ok(draft(produced))
            })
            .await
            .unwrap();
        assert_eq!(fitted.attempts, 3);
        assert_eq!(fitted.page_count, 3);
        assert_eq!(fitted.draft.source, "draft 3");
        assert_eq!(renderer.calls(), 3);
        assert_eq!(
            fitted.trace.last(),
            Some(&FitStep {
                attempt: 3,
                state: FitState::Accepted
            })
        );
        assert_eq!(
            fitted
                .trace
                .iter()
                .filter(|s| s.state == FitState::Retrying)
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn fails_after_exactly_max_attempts() {
        let renderer = Scripted::new(&[5, 5, 5, 1]);
        let controller = PageFitController::new(&renderer, 3, 3);
        let err = controller.fit(4, |_| Ok(draft(0))).await.unwrap_err();
        assert!(matches!(
            err,
            ExamError::PageBudgetExceeded {
                test_id: 4,
                attempts: 3,
                max_pages: 3,
                last_pages: 5
            }
        ));
        assert_eq!(renderer.calls(), 3);
    }

    #[tokio::test]
    async fn retry_sees_rejected_draft() {
        let renderer = Scripted::new(&[9, 1]);
        let controller = PageFitController::new(&renderer, 2, 5);
        let mut seen = Vec::new();
        let mut n = 0;
        controller
            .fit(1, |prev| {
                seen.push(prev.map(|d| d.source.clone()));
                n += 1;
                Ok(draft(n))
            })
            .await
            .unwrap();
        assert_eq!(seen, vec![None, Some("draft 1".to_string())]);
    }

    #[tokio::test]
    async fn missing_page_count_is_not_retried() {
        let renderer = Scripted {
            pages: vec![None, Some(1)],
            calls: Mutex::new(0),
        };
        let controller = PageFitController::new(&renderer, 2, 5);
        let err = controller.fit(2, |_| Ok(draft(0))).await.unwrap_err();
        assert!(matches!(err, ExamError::PageCountUnavailable { test_id: 2, .. }));
        assert_eq!(renderer.calls(), 1);
    }

    #[tokio::test]
    async fn draft_errors_stop_the_loop() {
        let renderer = Scripted::new(&[1]);
        let controller = PageFitController::new(&renderer, 2, 5);
        let err = controller
            .fit(1, |_| Err(ExamError::ArityMismatch { expected: 2, actual: 1 }))
            .await
            .unwrap_err();
        assert!(matches!(err, ExamError::ArityMismatch { .. }));
        assert_eq!(renderer.calls(), 0);
    }
}
