//! Success Verifier
//!
//! Best-effort heuristic: the signals are checked in priority order and
//! the first one that holds decides. A `false` verdict means no signal
//! was seen, not that the submission was rejected.

use crate::driver::FormDriver;
use crate::markers::SuccessSignal;
use crate::result::FormResult;
use crate::wait::{wait_for_condition, wait_for_visible, WaitOptions};
use regex::Regex;

/// Evaluates success signals against a page
#[derive(Debug, Clone, Copy)]
pub struct SuccessVerifier<'a> {
    signals: &'a [SuccessSignal],
    wait: WaitOptions,
}

impl<'a> SuccessVerifier<'a> {
    /// Create a verifier; each polled signal gets `wait` to appear
    #[must_use]
    pub const fn new(signals: &'a [SuccessSignal], wait: WaitOptions) -> Self {
        Self { signals, wait }
    }

    /// Number of configured signals
    #[must_use]
    pub const fn len(&self) -> usize {
        self.signals.len()
    }

    /// Whether no signals are configured
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// First signal that holds, in priority order
    pub async fn first_match(&self, driver: &dyn FormDriver) -> Option<&'a SuccessSignal> {
        for signal in self.signals {
            match self.check(driver, signal).await {
                Ok(true) => return Some(signal),
                Ok(false) => {}
                // A page error while probing means this signal did not hold.
                Err(e) => tracing::debug!(%signal, error = %e, "success signal check errored"),
            }
        }
        None
    }

    /// Whether any signal holds
    pub async fn verify(&self, driver: &dyn FormDriver) -> bool {
        self.first_match(driver).await.is_some()
    }

    async fn check(&self, driver: &dyn FormDriver, signal: &SuccessSignal) -> FormResult<bool> {
        match signal {
            SuccessSignal::Element(selector) => {
                Ok(wait_for_visible(driver, None, selector, &self.wait).await.is_ok())
            }
            SuccessSignal::TextPattern(pattern) => {
                let re = match Regex::new(pattern) {
                    Ok(re) => re,
                    Err(e) => {
                        tracing::warn!(%pattern, error = %e, "invalid success pattern");
                        return Ok(false);
                    }
                };
                let re = &re;
                let found = wait_for_condition(&format!("text /{pattern}/"), &self.wait, || async move {
                    let text = driver.visible_text().await?;
                    Ok(re.is_match(&text).then_some(()))
                })
                .await;
                Ok(found.is_ok())
            }
            SuccessSignal::ContentSubstring(needles) => {
                let content = driver.content().await?.to_lowercase();
                Ok(needles
                    .iter()
                    .any(|n| content.contains(&n.to_lowercase())))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::markers::MarkerTable;
    use crate::mock_page::{MockElement, MockPage};
    use crate::selector::Selector;

    fn fast() -> WaitOptions {
        WaitOptions::new().with_timeout(20).with_poll_interval(5)
    }

    mod signal_tests {
        use super::*;

        #[tokio::test]
        async fn test_modal_image_is_first_signal() {
            let page = MockPage::new();
            let modal = page.add(None, MockElement::new("div").class("ant-modal-content"));
            page.add(Some(modal), MockElement::new("img").attr("alt", "Thank you"));
            let table = MarkerTable::default();
            let v = SuccessVerifier::new(&table.success_signals, fast());
            assert_eq!(v.first_match(&page).await, table.success_signals.first());
        }

        #[tokio::test]
        async fn test_text_pattern_case_insensitive() {
            let page = MockPage::new();
            page.add(None, MockElement::new("h2").text("RESPONSE RECEIVED"));
            let table = MarkerTable::default();
            let v = SuccessVerifier::new(&table.success_signals, fast());
            assert_eq!(
                v.first_match(&page).await,
                Some(&SuccessSignal::TextPattern("(?i)response received".into()))
            );
        }

        #[tokio::test]
        async fn test_content_substring_fallback() {
            let page = MockPage::new();
            page.add(None, MockElement::new("div").text("Form Submitted").hidden());
            let table = MarkerTable::default();
            let v = SuccessVerifier::new(&table.success_signals, fast());
            assert!(matches!(
                v.first_match(&page).await,
                Some(SuccessSignal::ContentSubstring(_))
            ));
        }

        #[tokio::test]
        async fn test_no_signal_is_false() {
            let page = MockPage::new();
            page.add(None, MockElement::new("p").text("Please correct the errors"));
            let table = MarkerTable::default();
            let v = SuccessVerifier::new(&table.success_signals, fast());
            assert!(!v.verify(&page).await);
        }

        #[tokio::test]
        async fn test_priority_short_circuits() {
            let page = MockPage::new();
            page.add(None, MockElement::new("div").class("embed-submitted"));
            let signals = vec![
                SuccessSignal::Element(Selector::class("embed-submitted")),
                SuccessSignal::Element(Selector::class("never")),
            ];
            let v = SuccessVerifier::new(&signals, fast());
            assert_eq!(v.first_match(&page).await, Some(&signals[0]));
        }

        #[tokio::test]
        async fn test_invalid_pattern_does_not_match() {
            let page = MockPage::new();
            page.add(None, MockElement::new("p").text("anything"));
            let signals = vec![SuccessSignal::TextPattern("(".into())];
            assert!(!SuccessVerifier::new(&signals, fast()).verify(&page).await);
        }
    }
}
