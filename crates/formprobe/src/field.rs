//! Fields discovered on a rendered form.

use crate::driver::NodeRef;
use crate::markers::ControlKind;
use crate::result::{FormError, FormResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-field fill outcome
///
/// Transitions only forward: `Unresolved` to one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillOutcome {
    /// Not processed yet
    #[default]
    Unresolved,
    /// A value was accepted
    Filled,
    /// Deliberately left alone
    Skipped,
    /// Processing failed
    Failed,
}

impl FillOutcome {
    /// Whether the outcome is terminal
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

impl fmt::Display for FillOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unresolved => "unresolved",
            Self::Filled => "filled",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Which fields a fill pass touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillMode {
    /// Every field, exercising each control type
    #[default]
    AllFields,
    /// Only fields carrying the required marker
    RequiredOnly,
}

impl fmt::Display for FillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllFields => f.write_str("all-fields"),
            Self::RequiredOnly => f.write_str("required-only"),
        }
    }
}

impl std::str::FromStr for FillMode {
    type Err = FormError;

    fn from_str(s: &str) -> FormResult<Self> {
        match s {
            "all" | "all-fields" => Ok(Self::AllFields),
            "required" | "required-only" => Ok(Self::RequiredOnly),
            other => Err(FormError::config(format!("unknown fill mode `{other}`"))),
        }
    }
}

/// One question/control unit of a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Opaque identifier, unique within the form
    pub id: String,
    /// Position in document order
    pub index: usize,
    /// Whether the required marker is present
    pub required: bool,
    /// Root container handle
    pub root: NodeRef,
    kind: Option<ControlKind>,
    outcome: FillOutcome,
}

impl Field {
    /// Create an unclassified, unresolved field
    #[must_use]
    pub fn new(id: impl Into<String>, index: usize, root: NodeRef, required: bool) -> Self {
        Self {
            id: id.into(),
            index,
            required,
            root,
            kind: None,
            outcome: FillOutcome::Unresolved,
        }
    }

    /// Classified kind, if classification ran
    #[must_use]
    pub const fn kind(&self) -> Option<ControlKind> {
        self.kind
    }

    /// Current outcome
    #[must_use]
    pub const fn outcome(&self) -> FillOutcome {
        self.outcome
    }

    /// Fix the control kind for the rest of the run
    pub fn set_kind(&mut self, kind: ControlKind) -> FormResult<()> {
        match self.kind {
            Some(existing) if existing != kind => Err(FormError::invalid_state(format!(
                "field {} already classified as {existing}",
                self.id
            ))),
            _ => {
                self.kind = Some(kind);
                Ok(())
            }
        }
    }

    /// Move to a terminal outcome
    pub fn resolve(&mut self, outcome: FillOutcome) -> FormResult<()> {
        if !outcome.is_resolved() {
            return Err(FormError::invalid_state(format!(
                "field {} cannot be reset to unresolved",
                self.id
            )));
        }
        if self.outcome.is_resolved() {
            return Err(FormError::invalid_state(format!(
                "field {} already {}",
                self.id, self.outcome
            )));
        }
        self.outcome = outcome;
        Ok(())
    }
}
