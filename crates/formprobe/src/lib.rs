//! Formprobe: adaptive discovery and filling of rendered web forms
//!
//! Formprobe takes a dynamically rendered form whose markup it has never
//! seen, finds its question fields, works out which kind of control each
//! one is, fills it through the right interaction sequence, submits the
//! form and checks that a success indicator appeared.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         FormSession                               │
//! │   open ──► fill_all ─────────────────────► submit ──► verify      │
//! │               │                                                   │
//! │               ▼                                                   │
//! │   FieldEnumerator ─► Classifier ─► ValueSynthesizer ─► Protocol   │
//! │          │               │                                 │      │
//! │          └───────────────┴──── MarkerTable ────────────────┘      │
//! │                                                                   │
//! │   FormDriver (CdpDriver | MockPage)      FillObserver (tracing)   │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use formprobe::{FillMode, FormConfig, FormSession, MockPage};
//!
//! # async fn demo() -> formprobe::FormResult<()> {
//! let mut session = FormSession::new(MockPage::new(), FormConfig::default());
//! session.open("http://localhost:3000/embed/form/abc").await?;
//! let report = session.run(FillMode::RequiredOnly).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod browser;
mod classify;
mod config;
mod diagnostics;
mod dispatch;
mod driver;
mod enumerate;
mod field;
mod markers;
mod mock_page;
mod observe;
mod protocol;
mod report;
mod result;
mod selector;
mod session;
mod submit;
mod synth;
mod verify;

/// Bounded waits for asynchronously rendered content
pub mod wait;

pub use browser::BrowserConfig;
#[cfg(feature = "browser")]
pub use browser::{Browser, CdpDriver};
pub use classify::{Classification, Classifier};
pub use config::{
    FormConfig, DEFAULT_ARTIFACTS_DIR, DEFAULT_FORM_READY_TIMEOUT_MS, DEFAULT_MULTI_CHOICE_CAP,
    DEFAULT_SUBMIT_SETTLE_MS, DEFAULT_SUCCESS_SIGNAL_TIMEOUT_MS,
};
pub use diagnostics::ArtifactStore;
pub use dispatch::FillDispatcher;
pub use driver::{FormDriver, FormDriverExt, HandleArena, NodeRef, Screenshot};
pub use enumerate::FieldEnumerator;
pub use field::{Field, FillMode, FillOutcome};
pub use markers::{
    default_rules, ClassificationRule, ControlKind, Guard, Marker, MarkerTable, PanelMarkers,
    SuccessSignal,
};
pub use mock_page::{ClickEffect, MockElement, MockPage};
pub use observe::{FillObserver, FormEvent, RecordingObserver, TracingObserver};
pub use protocol::{
    protocol_for, DatePanel, DirectFill, InteractionProtocol, MultiChoice, ProtocolContext,
    SearchableSelect, SingleChoice, TimePanel,
};
pub use report::{FieldRecord, FillReport, RunReport};
pub use result::{FormError, FormResult};
pub use selector::{Selector, FIELD_PLACEHOLDER, TEST_ID_ATTR};
pub use session::{FormSession, LoadState};
pub use submit::{SubmissionAttempt, SubmissionController, SubmissionStatus};
pub use synth::{ValueSynthesizer, ID_PLACEHOLDER};
pub use verify::SuccessVerifier;
pub use wait::{WaitOptions, WaitResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_public_defaults_agree() {
        let config = FormConfig::default();
        assert_eq!(config.multi_choice_cap, DEFAULT_MULTI_CHOICE_CAP);
        assert!(protocol_for(ControlKind::Unknown).is_none());
        assert_eq!(
            protocol_for(ControlKind::Time).map(|p| p.name()),
            Some("time-panel")
        );
    }
}
