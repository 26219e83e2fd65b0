//! Run reports.
//!
//! A [`FillReport`] records what happened to every enumerated field; a
//! [`RunReport`] adds the submission attempt and the success verdict.
//! Both serialize to JSON for post-run inspection.

use crate::field::{Field, FillMode, FillOutcome};
use crate::markers::ControlKind;
use crate::result::FormResult;
use crate::submit::SubmissionAttempt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// What happened to one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Field identifier
    pub id: String,
    /// Required flag
    pub required: bool,
    /// Classified kind (absent when the field was skipped unclassified)
    pub kind: Option<ControlKind>,
    /// Final outcome
    pub outcome: FillOutcome,
    /// Applied value, if any
    pub value: Option<String>,
    /// Error text for failed fields
    pub error: Option<String>,
    /// Diagnostic screenshot, if one was written
    pub snapshot: Option<PathBuf>,
}

impl FieldRecord {
    /// Record the current state of a field
    #[must_use]
    pub fn from_field(field: &Field) -> Self {
        Self {
            id: field.id.clone(),
            required: field.required,
            kind: field.kind(),
            outcome: field.outcome(),
            value: None,
            error: None,
            snapshot: None,
        }
    }

    /// Attach the applied value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Attach an error
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attach a snapshot path
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: Option<PathBuf>) -> Self {
        self.snapshot = snapshot;
        self
    }
}

/// Result of one fill pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillReport {
    /// Unique run id
    pub run_id: Uuid,
    /// Mode used
    pub mode: FillMode,
    /// When the pass started
    pub started_at: DateTime<Utc>,
    /// Per-field records, in document order
    pub fields: Vec<FieldRecord>,
}

impl FillReport {
    /// Start an empty report
    #[must_use]
    pub fn new(mode: FillMode) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            mode,
            started_at: Utc::now(),
            fields: Vec::new(),
        }
    }

    /// Append a field record
    pub fn record(&mut self, record: FieldRecord) {
        self.fields.push(record);
    }

    fn count(&self, outcome: FillOutcome) -> usize {
        self.fields.iter().filter(|f| f.outcome == outcome).count()
    }

    /// Number of filled fields
    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.count(FillOutcome::Filled)
    }

    /// Number of skipped fields
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(FillOutcome::Skipped)
    }

    /// Number of failed fields
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(FillOutcome::Failed)
    }

    /// Number of required fields seen
    #[must_use]
    pub fn required_count(&self) -> usize {
        self.fields.iter().filter(|f| f.required).count()
    }

    /// Look up a field record
    #[must_use]
    pub fn field(&self, id: &str) -> Option<&FieldRecord> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// Result of a complete load/fill/submit/verify run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Page URL
    pub url: String,
    /// Fill pass
    pub fill: FillReport,
    /// Submission attempt, if submission was reached
    pub submission: Option<SubmissionAttempt>,
    /// Success verdict, if verification was reached
    pub verified: Option<bool>,
    /// Signal that matched, if any
    pub success_signal: Option<String>,
    /// Run-fatal error, if one aborted the run
    pub error: Option<String>,
    /// Wall-clock duration
    pub duration_ms: u64,
}

impl RunReport {
    /// Report for a run that has only produced a fill report so far
    #[must_use]
    pub fn new(url: impl Into<String>, fill: FillReport) -> Self {
        Self {
            url: url.into(),
            fill,
            submission: None,
            verified: None,
            success_signal: None,
            error: None,
            duration_ms: 0,
        }
    }

    /// Whether the run reached a positive verdict without a fatal error
    #[must_use]
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.verified == Some(true)
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} [{}]: {} filled, {} skipped, {} failed of {} fields ({} required) in {}ms",
            if self.passed() { "PASS" } else { "FAIL" },
            self.fill.mode,
            self.fill.filled_count(),
            self.fill.skipped_count(),
            self.fill.failed_count(),
            self.fill.fields.len(),
            self.fill.required_count(),
            self.duration_ms,
        )
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> FormResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty JSON to `path`
    pub fn write_json(&self, path: &Path) -> FormResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::NodeRef;

    fn record(id: &str, required: bool, outcome: FillOutcome) -> FieldRecord {
        let mut f = Field::new(id, 0, NodeRef::new(0), required);
        f.set_kind(ControlKind::Text).unwrap();
        f.resolve(outcome).unwrap();
        FieldRecord::from_field(&f)
    }

    mod fill_report_tests {
        use super::*;

        #[test]
        fn test_counters() {
            let mut report = FillReport::new(FillMode::AllFields);
            report.record(record("a", true, FillOutcome::Filled));
            report.record(record("b", false, FillOutcome::Failed).with_error("timeout"));
            report.record(record("c", false, FillOutcome::Skipped));
            assert_eq!(report.filled_count(), 1);
            assert_eq!(report.failed_count(), 1);
            assert_eq!(report.skipped_count(), 1);
            assert_eq!(report.required_count(), 1);
            assert_eq!(report.field("b").unwrap().error.as_deref(), Some("timeout"));
        }

        #[test]
        fn test_run_ids_are_unique() {
            assert_ne!(
                FillReport::new(FillMode::AllFields).run_id,
                FillReport::new(FillMode::AllFields).run_id
            );
        }
    }

    mod run_report_tests {
        use super::*;

        #[test]
        fn test_passed_requires_verdict() {
            let mut run = RunReport::new("http://x", FillReport::new(FillMode::RequiredOnly));
            assert!(!run.passed());
            run.verified = Some(true);
            assert!(run.passed());
            assert!(run.summary().starts_with("PASS [required-only]"));
            run.error = Some("boom".into());
            assert!(!run.passed());
        }

        #[test]
        fn test_json_file() {
            let tmp = tempfile::tempdir().unwrap();
            let path = tmp.path().join("out/report.json");
            let mut fill = FillReport::new(FillMode::AllFields);
            fill.record(record("email", true, FillOutcome::Filled).with_value("test@example.com"));
            let run = RunReport::new("http://x", fill);
            run.write_json(&path).unwrap();

            let json: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
            assert_eq!(json["fill"]["mode"], "all-fields");
            assert_eq!(json["fill"]["fields"][0]["outcome"], "filled");
            assert_eq!(json["fill"]["fields"][0]["kind"], "text");
        }
    }
}
