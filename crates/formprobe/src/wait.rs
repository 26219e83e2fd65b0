//! Wait Mechanisms
//!
//! Bounded, async polling for content that renders after an interaction
//! (dropdown lists, picker panels, the form itself). Every wait has a
//! timeout; a stalled render surfaces as [`FormError::Timeout`] rather than
//! a hang.

use crate::driver::{FormDriver, FormDriverExt, NodeRef};
use crate::result::{FormError, FormResult};
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for panel/option waits (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult<T> {
    /// The value the condition produced
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `check` until it yields `Some`, or fail after the timeout.
///
/// The condition is always evaluated at least once, so a zero timeout
/// degrades to a single check.
pub async fn wait_for_condition<T, F, Fut>(
    waited_for: &str,
    options: &WaitOptions,
    mut check: F,
) -> FormResult<WaitResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FormResult<Option<T>>>,
{
    let start = Instant::now();
    loop {
        if let Some(value) = check().await? {
            return Ok(WaitResult {
                value,
                elapsed: start.elapsed(),
            });
        }
        if start.elapsed() >= options.timeout() {
            return Err(FormError::Timeout {
                waited_for: waited_for.to_string(),
                ms: options.timeout_ms,
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Wait until at least one visible element matches `selector`.
pub async fn wait_for_visible(
    driver: &dyn FormDriver,
    scope: Option<NodeRef>,
    selector: &Selector,
    options: &WaitOptions,
) -> FormResult<Vec<NodeRef>> {
    let waited_for = format!("visible {selector}");
    let result = wait_for_condition(&waited_for, options, || async move {
        let nodes = driver.query_visible(scope, selector).await?;
        Ok((!nodes.is_empty()).then_some(nodes))
    })
    .await?;
    tracing::trace!(
        selector = %selector,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "wait satisfied"
    );
    Ok(result.value)
}

/// Wait until any element matches `selector`, visible or not.
pub async fn wait_for_attached(
    driver: &dyn FormDriver,
    selector: &Selector,
    options: &WaitOptions,
) -> FormResult<Vec<NodeRef>> {
    let waited_for = format!("{selector}");
    let result = wait_for_condition(&waited_for, options, || async move {
        let nodes = driver.query_all(None, selector).await?;
        Ok((!nodes.is_empty()).then_some(nodes))
    })
    .await?;
    Ok(result.value)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock_page::{MockElement, MockPage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast() -> WaitOptions {
        WaitOptions::new().with_timeout(60).with_poll_interval(5)
    }

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_wait_options_default() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_wait_options_builder() {
            let opts = WaitOptions::new().with_timeout(250).with_poll_interval(10);
            assert_eq!(opts.timeout(), Duration::from_millis(250));
            assert_eq!(opts.poll_interval(), Duration::from_millis(10));
        }

        #[test]
        fn test_wait_options_partial_yaml() {
            let opts: WaitOptions = serde_yaml_ng::from_str("timeout_ms: 900").unwrap();
            assert_eq!(opts.timeout_ms, 900);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }
    }

    mod condition_tests {
        use super::*;

        #[tokio::test]
        async fn test_condition_eventually_true() {
            let calls = AtomicUsize::new(0);
            let result = wait_for_condition("third call", &fast(), || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok((n >= 2).then_some(n))
            })
            .await
            .unwrap();
            assert_eq!(result.value, 2);
        }

        #[tokio::test]
        async fn test_condition_times_out() {
            let err = wait_for_condition::<(), _, _>("never", &fast(), || async { Ok(None) })
                .await
                .unwrap_err();
            match err {
                FormError::Timeout { waited_for, ms } => {
                    assert_eq!(waited_for, "never");
                    assert_eq!(ms, 60);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_zero_timeout_checks_once() {
            let calls = AtomicUsize::new(0);
            let opts = WaitOptions::new().with_timeout(0);
            let _ = wait_for_condition::<(), _, _>("once", &opts, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .await;
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_condition_error_propagates() {
            let err = wait_for_condition::<(), _, _>("boom", &fast(), || async {
                Err(FormError::page("detached"))
            })
            .await
            .unwrap_err();
            assert!(matches!(err, FormError::PageError { .. }));
        }
    }

    mod element_wait_tests {
        use super::*;

        #[tokio::test]
        async fn test_wait_for_visible_ignores_hidden() {
            let page = MockPage::new();
            page.add(None, MockElement::new("div").class("panel").hidden());
            let err = wait_for_visible(&page, None, &Selector::class("panel"), &fast())
                .await
                .unwrap_err();
            assert!(matches!(err, FormError::Timeout { .. }));
        }

        #[tokio::test]
        async fn test_wait_for_visible_finds_rendered() {
            let page = MockPage::new();
            let panel = page.add(None, MockElement::new("div").class("panel"));
            let found = wait_for_visible(&page, None, &Selector::class("panel"), &fast())
                .await
                .unwrap();
            assert_eq!(found, vec![panel]);
        }

        #[tokio::test]
        async fn test_wait_for_attached_accepts_hidden() {
            let page = MockPage::new();
            let root = page.add(None, MockElement::new("div").class("root").hidden());
            let found = wait_for_attached(&page, &Selector::class("root"), &fast())
                .await
                .unwrap();
            assert_eq!(found, vec![root]);
        }
    }
}
