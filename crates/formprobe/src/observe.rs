//! Structured observation of a fill run.
//!
//! The engine never writes to stdout/stderr itself. It reports what it
//! does as [`FormEvent`]s to an injected [`FillObserver`]. The default
//! [`TracingObserver`] forwards events to `tracing`; tests use
//! [`RecordingObserver`] to assert on the sequence.

use crate::field::FillMode;
use crate::markers::ControlKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

/// Something observable that happened during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FormEvent {
    /// The form-ready marker appeared
    FormLoaded {
        /// Page URL
        url: String,
    },
    /// Enumeration finished
    FieldsEnumerated {
        /// Number of top-level fields
        count: usize,
        /// Number carrying the required marker
        required: usize,
    },
    /// A field is about to be processed
    FieldDiscovered {
        /// Field identifier
        field: String,
        /// Required flag
        required: bool,
    },
    /// Classification finished
    FieldClassified {
        /// Field identifier
        field: String,
        /// Resolved kind
        kind: ControlKind,
    },
    /// A value was accepted
    FieldFilled {
        /// Field identifier
        field: String,
        /// Kind used
        kind: ControlKind,
        /// Applied value
        value: String,
    },
    /// A field was left alone
    FieldSkipped {
        /// Field identifier
        field: String,
        /// Why
        reason: String,
    },
    /// A field could not be filled
    FieldFailed {
        /// Field identifier
        field: String,
        /// Required flag
        required: bool,
        /// Error text
        error: String,
    },
    /// A diagnostic screenshot was written
    SnapshotCaptured {
        /// Field identifier
        field: String,
        /// Artifact path
        path: PathBuf,
    },
    /// The fill pass finished
    FillCompleted {
        /// Mode used
        mode: FillMode,
        /// Filled count
        filled: usize,
        /// Skipped count
        skipped: usize,
        /// Failed count
        failed: usize,
    },
    /// A submit control was activated
    Submitted {
        /// Matching selector
        selector: String,
    },
    /// No submit control resolved
    SubmitNotFound {
        /// Selectors tried
        tried: Vec<String>,
    },
    /// A success signal matched
    SuccessSignalMatched {
        /// Signal description
        signal: String,
    },
    /// No success signal matched
    VerificationFailed {
        /// Number of signals checked
        checked: usize,
    },
}

/// Receives run events
pub trait FillObserver: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &FormEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl FillObserver for TracingObserver {
    fn on_event(&self, event: &FormEvent) {
        match event {
            FormEvent::FormLoaded { url } => tracing::info!(%url, "form loaded"),
            FormEvent::FieldsEnumerated { count, required } => {
                tracing::info!(count, required, "fields enumerated");
            }
            FormEvent::FieldDiscovered { field, required } => {
                tracing::debug!(%field, required, "processing field");
            }
            FormEvent::FieldClassified { field, kind } => {
                tracing::debug!(%field, %kind, "field classified");
            }
            FormEvent::FieldFilled { field, kind, value } => {
                tracing::info!(%field, %kind, %value, "field filled");
            }
            FormEvent::FieldSkipped { field, reason } => {
                tracing::info!(%field, %reason, "field skipped");
            }
            FormEvent::FieldFailed {
                field,
                required: true,
                error,
            } => tracing::error!(%field, %error, "required field failed"),
            FormEvent::FieldFailed { field, error, .. } => {
                tracing::warn!(%field, %error, "field failed");
            }
            FormEvent::SnapshotCaptured { field, path } => {
                tracing::info!(%field, path = %path.display(), "snapshot captured");
            }
            FormEvent::FillCompleted {
                mode,
                filled,
                skipped,
                failed,
            } => tracing::info!(%mode, filled, skipped, failed, "fill completed"),
            FormEvent::Submitted { selector } => tracing::info!(%selector, "form submitted"),
            FormEvent::SubmitNotFound { tried } => {
                tracing::error!(tried = ?tried, "submit control not found");
            }
            FormEvent::SuccessSignalMatched { signal } => {
                tracing::info!(%signal, "success signal matched");
            }
            FormEvent::VerificationFailed { checked } => {
                tracing::warn!(checked, "no success signal matched");
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<FormEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    #[must_use]
    pub fn events(&self) -> Vec<FormEvent> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Recorded events matching `pred`
    #[must_use]
    pub fn count(&self, pred: impl Fn(&FormEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl FillObserver for RecordingObserver {
    fn on_event(&self, event: &FormEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

impl<T: FillObserver + ?Sized> FillObserver for std::sync::Arc<T> {
    fn on_event(&self, event: &FormEvent) {
        (**self).on_event(event);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    mod recording_tests {
        use super::*;

        #[test]
        fn test_records_in_order() {
            let rec = RecordingObserver::new();
            rec.on_event(&FormEvent::FormLoaded {
                url: "http://localhost".into(),
            });
            rec.on_event(&FormEvent::Submitted {
                selector: "[data-testid=\"submit-button\"]".into(),
            });
            let events = rec.events();
            assert_eq!(events.len(), 2);
            assert!(matches!(events[0], FormEvent::FormLoaded { .. }));
            assert_eq!(rec.count(|e| matches!(e, FormEvent::Submitted { .. })), 1);
        }

        #[test]
        fn test_shared_through_arc() {
            let rec = Arc::new(RecordingObserver::new());
            let as_observer: Box<dyn FillObserver> = Box::new(Arc::clone(&rec));
            as_observer.on_event(&FormEvent::VerificationFailed { checked: 8 });
            assert_eq!(rec.events().len(), 1);
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn test_event_json_is_tagged() {
            let json = serde_json::to_value(FormEvent::FieldClassified {
                field: "q1".into(),
                kind: ControlKind::Select,
            })
            .unwrap();
            assert_eq!(json["event"], "field_classified");
            assert_eq!(json["kind"], "select");
        }
    }

    mod tracing_tests {
        use super::*;

        #[test]
        fn test_tracing_observer_accepts_all_events() {
            let obs = TracingObserver;
            obs.on_event(&FormEvent::FieldFailed {
                field: "q".into(),
                required: true,
                error: "boom".into(),
            });
            obs.on_event(&FormEvent::FillCompleted {
                mode: FillMode::RequiredOnly,
                filled: 1,
                skipped: 2,
                failed: 0,
            });
        }
    }
}
