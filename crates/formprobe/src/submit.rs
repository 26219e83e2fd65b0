//! Submission Controller
//!
//! Activates the first visible, clickable control from a prioritized
//! selector list, then waits a fixed settle interval so asynchronous
//! submission handling can start.

use crate::driver::{FormDriver, FormDriverExt};
use crate::result::{FormError, FormResult};
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Terminal state of a submission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// A control was activated
    Submitted,
    /// No control resolved
    NotFound,
}

/// Which selector matched, or everything that was tried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionAttempt {
    /// Terminal state
    pub status: SubmissionStatus,
    /// Selector that was activated
    pub selector: Option<String>,
    /// Selectors tried, in order
    pub tried: Vec<String>,
}

impl SubmissionAttempt {
    /// Attempt that found nothing
    #[must_use]
    pub fn not_found(tried: Vec<String>) -> Self {
        Self {
            status: SubmissionStatus::NotFound,
            selector: None,
            tried,
        }
    }

    /// Whether a control was activated
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.status == SubmissionStatus::Submitted
    }
}

/// Locates and activates the submit control
#[derive(Debug, Clone, Copy)]
pub struct SubmissionController<'a> {
    controls: &'a [Selector],
    settle: Duration,
}

impl<'a> SubmissionController<'a> {
    /// Create a controller over a prioritized selector list
    #[must_use]
    pub const fn new(controls: &'a [Selector], settle: Duration) -> Self {
        Self { controls, settle }
    }

    /// Click the first visible, clickable submit control
    ///
    /// Safe to call again after a successful submission; the search simply
    /// runs again against whatever the page shows now.
    pub async fn submit(&self, driver: &dyn FormDriver) -> FormResult<SubmissionAttempt> {
        let mut tried = Vec::with_capacity(self.controls.len());
        for selector in self.controls {
            let css = selector.to_css();
            tried.push(css.clone());
            for node in driver.query_visible(None, selector).await? {
                match driver.click(node).await {
                    Ok(()) => {
                        tracing::debug!(selector = %css, settle_ms = self.settle.as_millis() as u64, "submit clicked");
                        tokio::time::sleep(self.settle).await;
                        return Ok(SubmissionAttempt {
                            status: SubmissionStatus::Submitted,
                            selector: Some(css),
                            tried,
                        });
                    }
                    Err(e) => {
                        tracing::debug!(selector = %css, error = %e, "submit candidate not clickable");
                    }
                }
            }
        }
        Err(FormError::SubmitControlNotFound { tried })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::markers::MarkerTable;
    use crate::mock_page::{ClickEffect, MockElement, MockPage};

    fn controller(table: &MarkerTable) -> SubmissionController<'_> {
        SubmissionController::new(&table.submit_controls, Duration::from_millis(1))
    }

    mod fallback_tests {
        use super::*;

        #[tokio::test]
        async fn test_first_priority_wins() {
            let page = MockPage::new();
            page.add(None, MockElement::new("button").attr("type", "submit"));
            page.add(None, MockElement::new("button").test_id("submit-button"));
            let table = MarkerTable::default();
            let attempt = controller(&table).submit(&page).await.unwrap();
            assert!(attempt.is_submitted());
            assert_eq!(
                attempt.selector.as_deref(),
                Some(r#"[data-testid="submit-button"]"#)
            );
            assert_eq!(attempt.tried.len(), 1);
        }

        #[tokio::test]
        async fn test_hidden_primary_falls_back() {
            let page = MockPage::new();
            page.add(None, MockElement::new("button").test_id("submit-button").hidden());
            page.add(None, MockElement::new("button").attr("type", "submit"));
            let table = MarkerTable::default();
            let attempt = controller(&table).submit(&page).await.unwrap();
            assert_eq!(attempt.selector.as_deref(), Some(r#"button[type="submit"]"#));
            assert_eq!(attempt.tried.len(), 2);
        }

        #[tokio::test]
        async fn test_nothing_matches() {
            let page = MockPage::new();
            page.add(None, MockElement::new("button").text("Cancel"));
            let table = MarkerTable::default();
            match controller(&table).submit(&page).await.unwrap_err() {
                FormError::SubmitControlNotFound { tried } => assert_eq!(tried.len(), 3),
                other => panic!("unexpected error: {other}"),
            }
            assert!(!page.was_called("click"));
        }
    }

    mod repeat_tests {
        use super::*;

        #[tokio::test]
        async fn test_repeat_after_submit_does_not_crash() {
            let page = MockPage::new();
            let button = page.add(None, MockElement::new("button").test_id("submit-button"));
            page.on_click(button, ClickEffect::Hide(vec![button]));
            let table = MarkerTable::default();
            let c = controller(&table);
            assert!(c.submit(&page).await.unwrap().is_submitted());
            let again = c.submit(&page).await;
            assert!(matches!(
                again,
                Err(FormError::SubmitControlNotFound { .. })
            ));
        }

        #[tokio::test]
        async fn test_repeat_with_control_still_visible() {
            let page = MockPage::new();
            page.add(None, MockElement::new("button").test_id("submit-button"));
            let table = MarkerTable::default();
            let c = controller(&table);
            assert!(c.submit(&page).await.unwrap().is_submitted());
            assert!(c.submit(&page).await.unwrap().is_submitted());
        }
    }
}
