//! Terminal output

use console::{style, Style, Term};
use formprobe::{FillOutcome, MarkerTable, RunReport};

/// Writes styled status lines to stderr
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    fn prefixed(&self, glyph: &str, plain: &str, style: &Style, message: &str) {
        let prefix = if self.use_color {
            style.apply_to(glyph).to_string()
        } else {
            plain.to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("✓", "PASS", &Style::new().green().bold(), message);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        self.prefixed("✗", "FAIL", &Style::new().red().bold(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("⚠", "WARN", &Style::new().yellow().bold(), message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("ℹ", "INFO", &Style::new().blue().bold(), message);
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print per-field lines and the verdict of one run
    pub fn run_report(&self, report: &RunReport) {
        self.header(&format!("{} ({})", report.url, report.fill.mode));
        if !self.quiet {
            for line in field_lines(report) {
                let _ = self.term.write_line(&line);
            }
        }
        if let Some(signal) = &report.success_signal {
            self.info(&format!("success signal: {signal}"));
        }
        if let Some(error) = &report.error {
            self.warning(error);
        }
        if report.passed() {
            self.success(&report.summary());
        } else {
            self.failure(&report.summary());
        }
    }
}

/// One line per field record
#[must_use]
pub fn field_lines(report: &RunReport) -> Vec<String> {
    report
        .fill
        .fields
        .iter()
        .map(|f| {
            let kind = f.kind.map_or_else(|| "-".to_string(), |k| k.to_string());
            let detail = match f.outcome {
                FillOutcome::Filled => f.value.clone().unwrap_or_default(),
                FillOutcome::Failed => f.error.clone().unwrap_or_default(),
                FillOutcome::Skipped | FillOutcome::Unresolved => String::new(),
            };
            let required = if f.required { "*" } else { " " };
            let outcome = f.outcome.to_string();
            format!("  {required} {:<24} {kind:<14} {outcome:<10} {detail}", f.id)
                .trim_end()
                .to_string()
        })
        .collect()
}

/// Plain-text listing of a marker table
#[must_use]
pub fn render_markers(table: &MarkerTable) -> String {
    let mut out = String::new();
    out.push_str(&format!("form ready:   {}\n", table.form_ready));
    out.push_str(&format!("field item:   {}\n", table.field_item));
    out.push_str(&format!("required:     {}\n", table.required_marker));
    out.push_str("\nclassification rules:\n");
    for rule in table.ordered_rules() {
        out.push_str(&format!("  {}. {}\n", rule.priority, rule.kind));
        for marker in &rule.markers {
            out.push_str(&format!("       {}", marker.selector));
            if marker.guard != formprobe::Guard::None {
                out.push_str(&format!("  [{:?}]", marker.guard));
            }
            out.push('\n');
        }
    }
    out.push_str("\nsubmit controls:\n");
    for selector in &table.submit_controls {
        out.push_str(&format!("  {selector}\n"));
    }
    out.push_str("\nsuccess signals:\n");
    for signal in &table.success_signals {
        out.push_str(&format!("  {signal}\n"));
    }
    out
}
