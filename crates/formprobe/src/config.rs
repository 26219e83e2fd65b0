//! Run configuration.
//!
//! Every field has a default, so a YAML file only needs to name what it
//! changes:
//!
//! ```yaml
//! url: http://localhost:3000/embed/form/abc
//! mode: required-only
//! submit_settle_ms: 1500
//! markers:
//!   submit_controls:
//!     - test_id: submit-button
//! ```

use crate::browser::BrowserConfig;
use crate::field::FillMode;
use crate::markers::MarkerTable;
use crate::result::{FormError, FormResult};
use crate::synth::ValueSynthesizer;
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default wait for the form-ready marker (30 seconds)
pub const DEFAULT_FORM_READY_TIMEOUT_MS: u64 = 30_000;

/// Default settle interval after clicking submit (3 seconds)
pub const DEFAULT_SUBMIT_SETTLE_MS: u64 = 3_000;

/// Default per-signal wait during verification (1 second)
pub const DEFAULT_SUCCESS_SIGNAL_TIMEOUT_MS: u64 = 1_000;

/// Default upper bound on checkboxes ticked per field
pub const DEFAULT_MULTI_CHOICE_CAP: usize = 2;

/// Default snapshot directory, relative to the working directory
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Configuration for one form run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Form URL
    pub url: Option<String>,
    /// Fill mode
    pub mode: FillMode,
    /// Bound on waiting for the form-ready marker
    pub form_ready_timeout_ms: u64,
    /// Bound on panel and option-list waits
    pub wait: WaitOptions,
    /// Pause after activating submit
    pub submit_settle_ms: u64,
    /// Bound on each polled success signal
    pub success_signal_timeout_ms: u64,
    /// Most checkboxes ticked in one multi-choice field
    pub multi_choice_cap: usize,
    /// Where diagnostic screenshots go; `null` disables them
    pub artifacts_dir: Option<PathBuf>,
    /// Browser launch settings
    pub browser: BrowserConfig,
    /// Rendered-markup contract
    pub markers: MarkerTable,
    /// Literal fill values
    pub values: ValueSynthesizer,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            url: None,
            mode: FillMode::default(),
            form_ready_timeout_ms: DEFAULT_FORM_READY_TIMEOUT_MS,
            wait: WaitOptions::default(),
            submit_settle_ms: DEFAULT_SUBMIT_SETTLE_MS,
            success_signal_timeout_ms: DEFAULT_SUCCESS_SIGNAL_TIMEOUT_MS,
            multi_choice_cap: DEFAULT_MULTI_CHOICE_CAP,
            artifacts_dir: Some(PathBuf::from(DEFAULT_ARTIFACTS_DIR)),
            browser: BrowserConfig::default(),
            markers: MarkerTable::default(),
            values: ValueSynthesizer::default(),
        }
    }
}

impl FormConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate YAML
    pub fn from_yaml_str(yaml: &str) -> FormResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_file(path: &Path) -> FormResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> FormResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> FormResult<()> {
        if self.multi_choice_cap == 0 {
            return Err(FormError::config("multi_choice_cap must be at least 1"));
        }
        if self.wait.poll_interval_ms == 0 {
            return Err(FormError::config("wait.poll_interval_ms must be non-zero"));
        }
        self.markers.validate()
    }

    /// Set the form URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the fill mode
    #[must_use]
    pub const fn with_mode(mut self, mode: FillMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the form-ready timeout
    #[must_use]
    pub const fn with_form_ready_timeout(mut self, ms: u64) -> Self {
        self.form_ready_timeout_ms = ms;
        self
    }

    /// Set panel/option wait options
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Set the submit settle interval
    #[must_use]
    pub const fn with_submit_settle(mut self, ms: u64) -> Self {
        self.submit_settle_ms = ms;
        self
    }

    /// Set the per-signal verification timeout
    #[must_use]
    pub const fn with_success_signal_timeout(mut self, ms: u64) -> Self {
        self.success_signal_timeout_ms = ms;
        self
    }

    /// Set the multi-choice cap
    #[must_use]
    pub const fn with_multi_choice_cap(mut self, cap: usize) -> Self {
        self.multi_choice_cap = cap;
        self
    }

    /// Set the artifacts directory
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }

    /// Never write diagnostic screenshots
    #[must_use]
    pub fn without_artifacts(mut self) -> Self {
        self.artifacts_dir = None;
        self
    }

    /// Set browser launch settings
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserConfig) -> Self {
        self.browser = browser;
        self
    }

    /// Replace the marker table
    #[must_use]
    pub fn with_markers(mut self, markers: MarkerTable) -> Self {
        self.markers = markers;
        self
    }

    /// Number of checkboxes a multi-choice field gets in `mode`
    ///
    /// All-fields runs tick two to exercise multi-select, required-only
    /// runs tick one; both are bounded by the cap.
    #[must_use]
    pub fn choice_count(&self, mode: FillMode) -> usize {
        let policy = match mode {
            FillMode::AllFields => 2,
            FillMode::RequiredOnly => 1,
        };
        policy.min(self.multi_choice_cap).max(1)
    }

    /// Wait options for the form-ready marker
    #[must_use]
    pub const fn form_ready_wait(&self) -> WaitOptions {
        self.wait.with_timeout(self.form_ready_timeout_ms)
    }

    /// Wait options for each polled success signal
    #[must_use]
    pub const fn success_wait(&self) -> WaitOptions {
        self.wait.with_timeout(self.success_signal_timeout_ms)
    }

    /// Submit settle interval
    #[must_use]
    pub const fn submit_settle(&self) -> Duration {
        Duration::from_millis(self.submit_settle_ms)
    }
}
