//! Fill Dispatcher
//!
//! Runs enumerate, then classify / synthesize / protocol per field, and
//! applies the escalation policy: a failure on a non-required field is
//! recorded and the pass continues, a failure on a required field
//! (including a required field nothing could classify) aborts the pass
//! with [`FormError::RequiredFieldUnfillable`].

use crate::classify::Classifier;
use crate::config::FormConfig;
use crate::diagnostics::ArtifactStore;
use crate::driver::FormDriver;
use crate::enumerate::FieldEnumerator;
use crate::field::{Field, FillMode, FillOutcome};
use crate::observe::{FillObserver, FormEvent};
use crate::protocol::{protocol_for, ProtocolContext};
use crate::report::{FieldRecord, FillReport};
use crate::result::{FormError, FormResult};

/// Orchestrates one fill pass over a loaded form
#[derive(Clone, Copy)]
pub struct FillDispatcher<'a> {
    driver: &'a dyn FormDriver,
    config: &'a FormConfig,
    observer: &'a dyn FillObserver,
    artifacts: &'a ArtifactStore,
}

impl std::fmt::Debug for FillDispatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FillDispatcher")
            .field("artifacts", &self.artifacts)
            .finish_non_exhaustive()
    }
}

impl<'a> FillDispatcher<'a> {
    /// Create a dispatcher
    #[must_use]
    pub fn new(
        driver: &'a dyn FormDriver,
        config: &'a FormConfig,
        observer: &'a dyn FillObserver,
        artifacts: &'a ArtifactStore,
    ) -> Self {
        Self {
            driver,
            config,
            observer,
            artifacts,
        }
    }

    /// Fill every enumerated field according to `mode`
    ///
    /// Records are appended to `report` as fields resolve, so a run-fatal
    /// error still leaves the fields processed so far in the report.
    pub async fn fill_all(&self, mode: FillMode, report: &mut FillReport) -> FormResult<Vec<Field>> {
        let mut fields = FieldEnumerator::new(&self.config.markers)
            .enumerate(self.driver)
            .await?;
        self.observer.on_event(&FormEvent::FieldsEnumerated {
            count: fields.len(),
            required: fields.iter().filter(|f| f.required).count(),
        });

        let ctx = ProtocolContext {
            driver: self.driver,
            panels: &self.config.markers.panels,
            synth: &self.config.values,
            wait: self.config.wait,
            choice_count: self.config.choice_count(mode),
        };

        for field in &mut fields {
            let record = self.process(&ctx, field, mode).await?;
            let fatal = field.required && field.outcome() == FillOutcome::Failed;
            let reason = record.error.clone().unwrap_or_default();
            report.record(record);
            if fatal {
                return Err(FormError::RequiredFieldUnfillable {
                    field: field.id.clone(),
                    reason,
                });
            }
        }

        self.observer.on_event(&FormEvent::FillCompleted {
            mode,
            filled: report.filled_count(),
            skipped: report.skipped_count(),
            failed: report.failed_count(),
        });
        Ok(fields)
    }

    async fn process(
        &self,
        ctx: &ProtocolContext<'_>,
        field: &mut Field,
        mode: FillMode,
    ) -> FormResult<FieldRecord> {
        self.observer.on_event(&FormEvent::FieldDiscovered {
            field: field.id.clone(),
            required: field.required,
        });

        if mode == FillMode::RequiredOnly && !field.required {
            return self.skip(field, "not required");
        }

        let classification = match Classifier::new(&self.config.markers)
            .classify(self.driver, field)
            .await
        {
            Ok(c) => c,
            Err(e) => return self.fail(field, e.to_string()).await,
        };
        field.set_kind(classification.kind)?;
        self.observer.on_event(&FormEvent::FieldClassified {
            field: field.id.clone(),
            kind: classification.kind,
        });

        let (Some(protocol), Some(control)) =
            (protocol_for(classification.kind), classification.control)
        else {
            if field.required {
                return self.fail(field, "no recognizable control".to_string()).await;
            }
            return self.skip(field, "no recognizable control");
        };

        tracing::debug!(field = %field.id, protocol = protocol.name(), "applying protocol");
        match protocol.apply(ctx, field, control).await {
            Ok(value) => {
                field.resolve(FillOutcome::Filled)?;
                self.observer.on_event(&FormEvent::FieldFilled {
                    field: field.id.clone(),
                    kind: classification.kind,
                    value: value.clone(),
                });
                Ok(FieldRecord::from_field(field).with_value(value))
            }
            Err(e) => self.fail(field, e.to_string()).await,
        }
    }

    fn skip(&self, field: &mut Field, reason: &str) -> FormResult<FieldRecord> {
        field.resolve(FillOutcome::Skipped)?;
        self.observer.on_event(&FormEvent::FieldSkipped {
            field: field.id.clone(),
            reason: reason.to_string(),
        });
        Ok(FieldRecord::from_field(field))
    }

    async fn fail(&self, field: &mut Field, error: String) -> FormResult<FieldRecord> {
        let snapshot = self.artifacts.capture(self.driver, &field.id).await;
        if let Some(path) = &snapshot {
            self.observer.on_event(&FormEvent::SnapshotCaptured {
                field: field.id.clone(),
                path: path.clone(),
            });
        }
        field.resolve(FillOutcome::Failed)?;
        self.observer.on_event(&FormEvent::FieldFailed {
            field: field.id.clone(),
            required: field.required,
            error: error.clone(),
        });
        Ok(FieldRecord::from_field(field)
            .with_error(error)
            .with_snapshot(snapshot))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock_page::{MockElement, MockPage};
    use crate::observe::RecordingObserver;
    use crate::wait::WaitOptions;
    use crate::NodeRef;

    fn config() -> FormConfig {
        FormConfig::default().with_wait(WaitOptions::new().with_timeout(30).with_poll_interval(5))
    }

    fn item(page: &MockPage, id: &str, required: bool) -> NodeRef {
        let node = page.add(
            None,
            MockElement::new("div").test_id(format!("form-fields:form-item-{id}")),
        );
        if required {
            page.add(Some(node), MockElement::new("span").attr("style", "color: #ea8dea"));
        }
        node
    }

    fn text_input(page: &MockPage, root: NodeRef, id: &str) -> NodeRef {
        page.add(
            Some(root),
            MockElement::new("input").test_id(format!("form-fields:question-{id}:input:text-input")),
        )
    }

    mod mode_tests {
        use super::*;

        #[tokio::test]
        async fn test_all_fields_resolves_everything() {
            let page = MockPage::new();
            let a = item(&page, "a", true);
            let a_in = text_input(&page, a, "a");
            let b = item(&page, "b", false);
            let b_in = text_input(&page, b, "b");
            let c = item(&page, "c", false);
            page.add(Some(c), MockElement::new("canvas"));

            let (cfg, obs, store) = (config(), RecordingObserver::new(), ArtifactStore::disabled());
            let mut report = FillReport::new(FillMode::AllFields);
            let fields = FillDispatcher::new(&page, &cfg, &obs, &store)
                .fill_all(FillMode::AllFields, &mut report)
                .await
                .unwrap();

            assert!(fields.iter().all(|f| f.outcome().is_resolved()));
            assert_eq!(page.value_of(a_in).as_deref(), Some("Test input for a"));
            assert_eq!(page.value_of(b_in).as_deref(), Some("Test input for b"));
            assert_eq!(fields[2].outcome(), FillOutcome::Skipped);
            assert_eq!(report.filled_count(), 2);
            assert_eq!(
                obs.count(|e| matches!(e, FormEvent::FillCompleted { .. })),
                1
            );
        }

        #[tokio::test]
        async fn test_required_only_skips_optional_without_touching() {
            let page = MockPage::new();
            let a = item(&page, "a", true);
            text_input(&page, a, "a");
            let b = item(&page, "b", false);
            let b_in = text_input(&page, b, "b");

            let (cfg, obs, store) = (config(), RecordingObserver::new(), ArtifactStore::disabled());
            let mut report = FillReport::new(FillMode::RequiredOnly);
            let fields = FillDispatcher::new(&page, &cfg, &obs, &store)
                .fill_all(FillMode::RequiredOnly, &mut report)
                .await
                .unwrap();

            assert_eq!(fields[0].outcome(), FillOutcome::Filled);
            assert_eq!(fields[1].outcome(), FillOutcome::Skipped);
            assert_eq!(fields[1].kind(), None);
            assert_eq!(page.value_of(b_in), None);
        }

        #[tokio::test]
        async fn test_empty_form() {
            let page = MockPage::new();
            let (cfg, obs, store) = (config(), RecordingObserver::new(), ArtifactStore::disabled());
            let mut report = FillReport::new(FillMode::AllFields);
            let fields = FillDispatcher::new(&page, &cfg, &obs, &store)
                .fill_all(FillMode::AllFields, &mut report)
                .await
                .unwrap();
            assert!(fields.is_empty());
            assert!(obs
                .events()
                .contains(&FormEvent::FieldsEnumerated { count: 0, required: 0 }));
        }
    }

    mod escalation_tests {
        use super::*;

        #[tokio::test]
        async fn test_optional_failure_continues() {
            let page = MockPage::new();
            let a = item(&page, "a", false);
            page.add(Some(a), MockElement::new("div").class("ant-select"));
            let b = item(&page, "b", true);
            let b_in = text_input(&page, b, "b");

            let (cfg, obs, store) = (config(), RecordingObserver::new(), ArtifactStore::disabled());
            let mut report = FillReport::new(FillMode::AllFields);
            let fields = FillDispatcher::new(&page, &cfg, &obs, &store)
                .fill_all(FillMode::AllFields, &mut report)
                .await
                .unwrap();
            assert_eq!(fields[0].outcome(), FillOutcome::Failed);
            assert_eq!(fields[1].outcome(), FillOutcome::Filled);
            assert!(page.value_of(b_in).is_some());
            assert!(report.field("a").unwrap().error.is_some());
        }

        #[tokio::test]
        async fn test_required_unknown_is_fatal_with_snapshot() {
            let page = MockPage::new();
            page.set_screenshot(vec![1, 2, 3]);
            let a = item(&page, "mystery", true);
            page.add(Some(a), MockElement::new("canvas"));

            let tmp = tempfile::tempdir().unwrap();
            let (cfg, obs) = (config(), RecordingObserver::new());
            let store = ArtifactStore::new(tmp.path());
            let mut report = FillReport::new(FillMode::RequiredOnly);
            let err = FillDispatcher::new(&page, &cfg, &obs, &store)
                .fill_all(FillMode::RequiredOnly, &mut report)
                .await
                .unwrap_err();

            match err {
                FormError::RequiredFieldUnfillable { field, .. } => assert_eq!(field, "mystery"),
                other => panic!("unexpected error: {other}"),
            }
            assert!(tmp.path().join("debug-field-mystery.png").exists());
            assert_eq!(report.failed_count(), 1);
            assert!(report.field("mystery").unwrap().snapshot.is_some());
        }

        #[tokio::test]
        async fn test_fatal_stops_before_later_fields() {
            let page = MockPage::new();
            let a = item(&page, "a", true);
            page.add(Some(a), MockElement::new("input").class("ant-input").hidden());
            let b = item(&page, "b", true);
            let b_in = text_input(&page, b, "b");

            let (cfg, obs, store) = (config(), RecordingObserver::new(), ArtifactStore::disabled());
            let mut report = FillReport::new(FillMode::AllFields);
            let result = FillDispatcher::new(&page, &cfg, &obs, &store)
                .fill_all(FillMode::AllFields, &mut report)
                .await;
            assert!(matches!(result, Err(FormError::RequiredFieldUnfillable { .. })));
            assert_eq!(page.value_of(b_in), None);
            assert_eq!(report.fields.len(), 1);
        }
    }
}
