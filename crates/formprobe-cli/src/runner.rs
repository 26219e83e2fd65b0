//! Runs form sessions against a live browser

use crate::error::{CliError, CliResult};
use formprobe::{FillMode, FormConfig, FormDriver, FormResult, FormSession, RunReport};
use std::future::Future;

/// Drive one session through open, fill, submit and verify
///
/// A run-fatal error does not abort the caller: it is recorded in the
/// returned report, which then reads as failed.
pub async fn run_session<D: FormDriver>(
    driver: D,
    config: &FormConfig,
    url: &str,
    mode: FillMode,
) -> RunReport {
    let mut session = FormSession::new(driver, config.clone().with_mode(mode));
    let outcome = match session.open(url).await {
        Ok(()) => session.run(mode).await.map(|_| ()),
        Err(e) => Err(e),
    };
    let mut report = session.report();
    if report.url.is_empty() {
        report.url = url.to_string();
    }
    if let Err(e) = outcome {
        tracing::warn!(mode = %mode, error = %e, "form run aborted");
        report.error = Some(e.to_string());
    }
    report
}

/// Run each mode on a page from `open_page`, in order
///
/// A page that cannot be opened stops the remaining modes; the caller
/// still owns whatever produced the pages and must tear it down.
pub async fn run_modes<D, F, Fut>(
    config: &FormConfig,
    url: &str,
    modes: &[FillMode],
    mut open_page: F,
) -> CliResult<Vec<RunReport>>
where
    D: FormDriver,
    F: FnMut() -> Fut,
    Fut: Future<Output = FormResult<D>>,
{
    let mut reports = Vec::with_capacity(modes.len());
    for mode in modes {
        let driver = open_page().await?;
        reports.push(run_session(driver, config, url, *mode).await);
    }
    Ok(reports)
}

/// Executes the configured fill modes, one fresh page per mode
#[derive(Debug, Clone)]
pub struct TestRunner {
    config: FormConfig,
    modes: Vec<FillMode>,
}

impl TestRunner {
    /// Create a runner
    #[must_use]
    pub const fn new(config: FormConfig, modes: Vec<FillMode>) -> Self {
        Self { config, modes }
    }

    /// Fill modes in run order
    #[must_use]
    pub fn modes(&self) -> &[FillMode] {
        &self.modes
    }

    /// Launch chromium and run every mode
    #[cfg(feature = "browser")]
    pub async fn run(&self) -> CliResult<Vec<RunReport>> {
        use formprobe::Browser;

        let url = self
            .config
            .url
            .clone()
            .ok_or_else(|| CliError::invalid_argument("no form URL"))?;
        let browser = Browser::launch(self.config.browser.clone()).await?;
        let outcome = run_modes(&self.config, &url, &self.modes, || browser.new_page()).await;
        if let Err(e) = browser.close().await {
            if outcome.is_ok() {
                return Err(e.into());
            }
            tracing::warn!(error = %e, "browser close failed after aborted run");
        }
        outcome
    }

    /// Live runs need the `browser` feature
    #[cfg(not(feature = "browser"))]
    #[allow(clippy::unused_async)]
    pub async fn run(&self) -> CliResult<Vec<RunReport>> {
        Err(CliError::BrowserUnavailable)
    }
}

/// Turn a set of reports into the process verdict
pub fn verdict(reports: &[RunReport]) -> CliResult<()> {
    let failed = reports.iter().filter(|r| !r.passed()).count();
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::RunsFailed {
            failed,
            total: reports.len(),
        })
    }
}
