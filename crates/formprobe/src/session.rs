//! Form Session
//!
//! A [`FormSession`] is one form instance under test. It owns its driver
//! exclusively and moves through `Unloaded -> Loaded -> Submitted`; all
//! operations are issued sequentially against that one page.

use crate::config::FormConfig;
use crate::diagnostics::ArtifactStore;
use crate::dispatch::FillDispatcher;
use crate::driver::FormDriver;
use crate::field::{Field, FillMode};
use crate::observe::{FillObserver, FormEvent, TracingObserver};
use crate::report::{FillReport, RunReport};
use crate::result::{FormError, FormResult};
use crate::submit::{SubmissionAttempt, SubmissionController};
use crate::verify::SuccessVerifier;
use crate::wait::wait_for_attached;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Load state of a form instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// Nothing confirmed yet
    Unloaded,
    /// Form-ready marker seen
    Loaded,
    /// Submit control activated
    Submitted,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unloaded => f.write_str("unloaded"),
            Self::Loaded => f.write_str("loaded"),
            Self::Submitted => f.write_str("submitted"),
        }
    }
}

/// One form instance under test
pub struct FormSession<D: FormDriver> {
    driver: D,
    config: FormConfig,
    observer: Box<dyn FillObserver>,
    artifacts: ArtifactStore,
    state: LoadState,
    url: String,
    started: Instant,
    fill: Option<FillReport>,
    submission: Option<SubmissionAttempt>,
    verified: Option<bool>,
    success_signal: Option<String>,
}

impl<D: FormDriver> fmt::Debug for FormSession<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSession")
            .field("state", &self.state)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl<D: FormDriver> FormSession<D> {
    /// Create a session with a tracing observer
    #[must_use]
    pub fn new(driver: D, config: FormConfig) -> Self {
        let artifacts = config
            .artifacts_dir
            .clone()
            .map_or_else(ArtifactStore::disabled, ArtifactStore::new);
        Self {
            driver,
            config,
            observer: Box::new(TracingObserver),
            artifacts,
            state: LoadState::Unloaded,
            url: String::new(),
            started: Instant::now(),
            fill: None,
            submission: None,
            verified: None,
            success_signal: None,
        }
    }

    /// Replace the observer
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn FillObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the artifact store
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: ArtifactStore) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Current load state
    #[must_use]
    pub const fn state(&self) -> LoadState {
        self.state
    }

    /// Session configuration
    #[must_use]
    pub const fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Where failed-field snapshots are written
    #[must_use]
    pub const fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Underlying driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Take the driver back
    #[must_use]
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Navigate to `url` and wait for the form-ready marker
    pub async fn open(&mut self, url: &str) -> FormResult<()> {
        self.started = Instant::now();
        self.driver.navigate(url).await?;
        self.url = url.to_string();
        self.await_ready().await
    }

    /// Use a page that is already navigated; waits for the form-ready marker
    pub async fn attach(&mut self) -> FormResult<()> {
        self.started = Instant::now();
        self.url = self.driver.current_url().await?;
        self.await_ready().await
    }

    async fn await_ready(&mut self) -> FormResult<()> {
        let wait = self.config.form_ready_wait();
        wait_for_attached(&self.driver, &self.config.markers.form_ready, &wait)
            .await
            .map_err(|e| match e {
                FormError::Timeout { .. } => FormError::FormNotReady {
                    url: self.url.clone(),
                    message: e.to_string(),
                },
                other => other,
            })?;
        self.state = LoadState::Loaded;
        self.observer.on_event(&FormEvent::FormLoaded {
            url: self.url.clone(),
        });
        Ok(())
    }

    /// Fill the form's fields
    pub async fn fill_all(&mut self, mode: FillMode) -> FormResult<Vec<Field>> {
        if self.state != LoadState::Loaded {
            return Err(FormError::invalid_state(format!(
                "fill_all needs a loaded form, session is {}",
                self.state
            )));
        }
        let mut report = FillReport::new(mode);
        let result = FillDispatcher::new(
            &self.driver,
            &self.config,
            self.observer.as_ref(),
            &self.artifacts,
        )
        .fill_all(mode, &mut report)
        .await;
        self.fill = Some(report);
        result
    }

    /// Activate the submit control
    ///
    /// May be called again after a successful submission.
    pub async fn submit(&mut self) -> FormResult<SubmissionAttempt> {
        if self.state == LoadState::Unloaded {
            return Err(FormError::invalid_state("submit needs a loaded form"));
        }
        let controller = SubmissionController::new(
            &self.config.markers.submit_controls,
            self.config.submit_settle(),
        );
        match controller.submit(&self.driver).await {
            Ok(attempt) => {
                self.state = LoadState::Submitted;
                self.observer.on_event(&FormEvent::Submitted {
                    selector: attempt.selector.clone().unwrap_or_default(),
                });
                self.submission = Some(attempt.clone());
                Ok(attempt)
            }
            Err(FormError::SubmitControlNotFound { tried }) => {
                self.observer.on_event(&FormEvent::SubmitNotFound {
                    tried: tried.clone(),
                });
                self.submission = Some(SubmissionAttempt::not_found(tried.clone()));
                Err(FormError::SubmitControlNotFound { tried })
            }
            Err(e) => Err(e),
        }
    }

    /// Check the success signals; `false` is a verdict, not an error
    pub async fn verify(&mut self) -> bool {
        let verifier =
            SuccessVerifier::new(&self.config.markers.success_signals, self.config.success_wait());
        let matched = verifier.first_match(&self.driver).await;
        match matched {
            Some(signal) => {
                let signal = signal.to_string();
                self.observer.on_event(&FormEvent::SuccessSignalMatched {
                    signal: signal.clone(),
                });
                self.success_signal = Some(signal);
                self.verified = Some(true);
            }
            None => {
                self.observer.on_event(&FormEvent::VerificationFailed {
                    checked: verifier.len(),
                });
                self.verified = Some(false);
            }
        }
        self.verified == Some(true)
    }

    /// Fill, submit and verify a loaded form
    ///
    /// Run-fatal errors propagate; [`Self::report`] still describes how far
    /// the run got.
    pub async fn run(&mut self, mode: FillMode) -> FormResult<RunReport> {
        self.fill_all(mode).await?;
        self.submit().await?;
        self.verify().await;
        Ok(self.report())
    }

    /// Report of everything the session has done so far
    #[must_use]
    pub fn report(&self) -> RunReport {
        let fill = self
            .fill
            .clone()
            .unwrap_or_else(|| FillReport::new(self.config.mode));
        let mut report = RunReport::new(self.url.clone(), fill);
        report.submission = self.submission.clone();
        report.verified = self.verified;
        report.success_signal = self.success_signal.clone();
        report.duration_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock_page::{MockElement, MockPage};
    use crate::observe::RecordingObserver;
    use crate::wait::WaitOptions;
    use std::sync::Arc;

    fn config() -> FormConfig {
        FormConfig::default()
            .without_artifacts()
            .with_wait(WaitOptions::new().with_timeout(20).with_poll_interval(5))
            .with_form_ready_timeout(20)
            .with_submit_settle(1)
            .with_success_signal_timeout(10)
    }

    fn ready_page() -> MockPage {
        let page = MockPage::new();
        page.add(
            None,
            MockElement::new("div").test_id("form-fields:question-q1:label"),
        );
        page
    }

    mod state_tests {
        use super::*;

        #[tokio::test]
        async fn test_open_moves_to_loaded() {
            let rec = Arc::new(RecordingObserver::new());
            let mut s = FormSession::new(ready_page(), config())
                .with_observer(Box::new(Arc::clone(&rec)));
            assert_eq!(s.state(), LoadState::Unloaded);
            s.open("http://localhost/form").await.unwrap();
            assert_eq!(s.state(), LoadState::Loaded);
            assert!(s.driver().was_called("navigate:http://localhost/form"));
            assert_eq!(
                rec.events()[0],
                FormEvent::FormLoaded {
                    url: "http://localhost/form".into()
                }
            );
        }

        #[tokio::test]
        async fn test_missing_marker_is_form_not_ready() {
            let mut s = FormSession::new(MockPage::new(), config());
            let err = s.open("http://localhost/form").await.unwrap_err();
            assert!(matches!(err, FormError::FormNotReady { .. }));
            assert!(err.is_run_fatal());
            assert_eq!(s.state(), LoadState::Unloaded);
        }

        #[tokio::test]
        async fn test_fill_requires_loaded() {
            let mut s = FormSession::new(ready_page(), config());
            let err = s.fill_all(FillMode::AllFields).await.unwrap_err();
            assert!(matches!(err, FormError::InvalidState { .. }));
        }

        #[tokio::test]
        async fn test_submit_moves_to_submitted() {
            let page = ready_page();
            page.add(None, MockElement::new("button").test_id("submit-button"));
            let mut s = FormSession::new(page, config());
            s.attach().await.unwrap();
            s.submit().await.unwrap();
            assert_eq!(s.state(), LoadState::Submitted);
            // a second submit re-runs the search
            assert!(s.submit().await.is_ok());
            assert!(s.fill_all(FillMode::AllFields).await.is_err());
        }
    }

    mod artifact_tests {
        use super::*;
        use std::path::Path;

        #[test]
        fn test_default_config_captures_snapshots() {
            let session = FormSession::new(MockPage::new(), FormConfig::default());
            assert_eq!(session.artifacts().dir(), Some(Path::new("artifacts")));
        }

        #[test]
        fn test_opt_out_disables_snapshots() {
            let session = FormSession::new(MockPage::new(), config());
            assert!(session.artifacts().path_for("q").is_none());
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_run_reports_signal() {
            let page = ready_page();
            page.add(None, MockElement::new("button").test_id("submit-button"));
            page.push_text("Thank you for your response");
            let mut s = FormSession::new(page, config());
            s.attach().await.unwrap();
            let report = s.run(FillMode::RequiredOnly).await.unwrap();
            assert!(report.passed());
            assert_eq!(report.success_signal.as_deref(), Some("text /(?i)thank you/"));
            assert!(report.submission.unwrap().is_submitted());
        }

        #[tokio::test]
        async fn test_verify_false_is_not_error() {
            let page = ready_page();
            let mut s = FormSession::new(page, config());
            s.attach().await.unwrap();
            assert!(!s.verify().await);
            assert_eq!(s.report().verified, Some(false));
        }
    }
}
