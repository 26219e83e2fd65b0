//! Marker table: the rendered-markup contract the engine depends on.
//!
//! Everything the engine knows about the renderer's markup lives here:
//! how to find the form and its fields, which structural markers identify
//! each control family (in priority order), where option lists and picker
//! panels render, the submit-control fallback list and the success signals.
//! When the renderer changes its markup, this table is what gets updated,
//! either in code or through a YAML config.
//!
//! Each control family carries three alternative marker sets: the
//! attribute-qualified test id for the field, a bare test-id suffix, and a
//! generic ant-design class marker.

use crate::result::{FormError, FormResult};
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// The input-widget family a field resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// Single-line text
    Text,
    /// Multi-line text
    Textarea,
    /// Numeric input
    Number,
    /// Radio group
    SingleChoice,
    /// Checkbox group
    MultiChoice,
    /// Searchable dropdown
    Select,
    /// Date picker
    Date,
    /// Time picker
    Time,
    /// Nothing recognizable
    Unknown,
}

impl ControlKind {
    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::SingleChoice => "single-choice",
            Self::MultiChoice => "multi-choice",
            Self::Select => "select",
            Self::Date => "date",
            Self::Time => "time",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the kind is filled by typing a synthesized value
    #[must_use]
    pub const fn is_direct_fill(&self) -> bool {
        matches!(self, Self::Text | Self::Textarea | Self::Number)
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra condition a marker match must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    /// Any match counts
    #[default]
    None,
    /// Element carries neither `readonly` nor `disabled`
    Editable,
    /// Placeholder (own or first nested input) mentions "time"
    TimeHint,
    /// Placeholder does not mention "time"
    NotTimeHint,
}

/// One structural marker for a control family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Field-scoped selector; may use the `{field}` placeholder
    pub selector: Selector,
    /// Additional guard
    #[serde(default)]
    pub guard: Guard,
}

impl Marker {
    /// Marker without a guard
    #[must_use]
    pub const fn new(selector: Selector) -> Self {
        Self {
            selector,
            guard: Guard::None,
        }
    }

    /// Marker with a guard
    #[must_use]
    pub const fn guarded(selector: Selector, guard: Guard) -> Self {
        Self { selector, guard }
    }
}

/// An ordered (priority, predicate, protocol) triple
///
/// The predicate holds when any of `markers` matches inside the field.
/// The protocol is implied by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    /// Lower runs first
    pub priority: u8,
    /// Control kind this rule resolves to
    pub kind: ControlKind,
    /// Alternative markers, tried in order
    pub markers: Vec<Marker>,
}

/// One heuristic check that submission succeeded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessSignal {
    /// A visible element
    Element(Selector),
    /// A regex matched against the rendered body text
    TextPattern(String),
    /// Any of these substrings in the raw page markup
    ContentSubstring(Vec<String>),
}

impl fmt::Display for SuccessSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(sel) => write!(f, "element {sel}"),
            Self::TextPattern(p) => write!(f, "text /{p}/"),
            Self::ContentSubstring(subs) => write!(f, "content contains {subs:?}"),
        }
    }
}

/// Markers used by the interaction protocols once a field is classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelMarkers {
    /// Inner input of a numeric control wrapper
    pub number_input: Selector,
    /// Option inside a radio group
    pub radio_option: Selector,
    /// Option inside a checkbox group
    pub checkbox_option: Selector,
    /// Free-text box revealed by an "other" choice (field scoped)
    pub other_input: Selector,
    /// Option rendered in the page-level dropdown list
    pub select_option: Selector,
    /// Date picker panel
    pub date_panel: Selector,
    /// Cell marked as today
    pub date_today_cell: Selector,
    /// Any day cell
    pub date_cell: Selector,
    /// Class carried by unselectable day cells
    pub date_disabled_class: String,
    /// Time picker panel
    pub time_panel: Selector,
    /// Column inside the time panel (hours first, then minutes)
    pub time_column: Selector,
    /// Cell inside a time column
    pub time_cell: Selector,
    /// Class carried by unselectable time cells
    pub time_disabled_class: String,
    /// Confirm button of the picker, if the picker has one
    pub time_confirm: Selector,
}

impl Default for PanelMarkers {
    fn default() -> Self {
        Self {
            number_input: Selector::tag("input"),
            radio_option: Selector::class("ant-radio"),
            checkbox_option: Selector::class("ant-checkbox"),
            other_input: Selector::test_id_contains("other-input"),
            select_option: Selector::class("ant-select-dropdown")
                .descendant(Selector::class("ant-select-item-option")),
            date_panel: Selector::class("ant-picker-panel"),
            date_today_cell: Selector::class("ant-picker-cell-today"),
            date_cell: Selector::class("ant-picker-cell"),
            date_disabled_class: "ant-picker-cell-disabled".to_string(),
            time_panel: Selector::class("ant-picker-time-panel"),
            time_column: Selector::class("ant-picker-time-panel-column"),
            time_cell: Selector::class("ant-picker-time-panel-cell"),
            time_disabled_class: "ant-picker-time-panel-cell-disabled".to_string(),
            time_confirm: Selector::class("ant-picker-ok").descendant(Selector::tag("button")),
        }
    }
}

/// The complete rendered-markup contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerTable {
    /// Present once the form has rendered
    pub form_ready: Selector,
    /// Root container of one question
    pub field_item: Selector,
    /// Prefix stripped from the field item's test id to get the identifier
    pub field_id_prefix: String,
    /// Visual "required" marker inside a field item
    pub required_marker: Selector,
    /// Classification rules
    pub rules: Vec<ClassificationRule>,
    /// Protocol markers
    pub panels: PanelMarkers,
    /// Submit controls, in priority order
    pub submit_controls: Vec<Selector>,
    /// Success signals, in priority order
    pub success_signals: Vec<SuccessSignal>,
}

const QUESTION_INPUT: &str = "form-fields:question-{field}:input";

fn qualified(suffix: &str) -> Selector {
    Selector::test_id(format!("{QUESTION_INPUT}:{suffix}"))
}

fn bare(suffix: &str) -> Selector {
    Selector::test_id_suffix(format!(":{suffix}"))
}

fn rule(priority: u8, kind: ControlKind, markers: Vec<Marker>) -> ClassificationRule {
    ClassificationRule {
        priority,
        kind,
        markers,
    }
}

/// Default classification rules, in priority order
#[must_use]
pub fn default_rules() -> Vec<ClassificationRule> {
    use ControlKind as K;
    use Guard as G;
    vec![
        rule(
            1,
            K::Text,
            vec![
                Marker::guarded(qualified("text-input"), G::Editable),
                Marker::guarded(bare("text-input"), G::Editable),
                Marker::guarded(Selector::tag_with_class("input", "ant-input"), G::Editable),
            ],
        ),
        rule(
            2,
            K::Textarea,
            vec![
                Marker::new(qualified("text-area")),
                Marker::new(bare("text-area")),
                Marker::new(Selector::tag("textarea")),
            ],
        ),
        rule(
            3,
            K::Number,
            vec![
                Marker::new(qualified("number-input")),
                Marker::new(bare("number-input")),
                Marker::new(Selector::class("ant-input-number")),
            ],
        ),
        rule(
            4,
            K::SingleChoice,
            vec![
                Marker::new(qualified("radio:group")),
                Marker::new(bare("radio:group")),
                Marker::new(Selector::class("ant-radio-group")),
            ],
        ),
        rule(
            5,
            K::MultiChoice,
            vec![
                Marker::new(qualified("checkboxes:group")),
                Marker::new(bare("checkboxes:group")),
                Marker::new(Selector::class("ant-checkbox-group")),
            ],
        ),
        rule(
            6,
            K::Select,
            vec![
                Marker::new(qualified("dropdown:select")),
                Marker::new(bare("dropdown:select")),
                Marker::new(Selector::class("ant-select")),
            ],
        ),
        rule(
            7,
            K::Date,
            vec![
                Marker::new(qualified("date:picker")),
                Marker::new(bare("date:picker")),
                Marker::guarded(Selector::class("ant-picker"), G::NotTimeHint),
            ],
        ),
        rule(
            8,
            K::Time,
            vec![
                Marker::new(qualified("time:picker")),
                Marker::new(bare("time:picker")),
                Marker::guarded(Selector::class("ant-picker"), G::TimeHint),
            ],
        ),
    ]
}

impl Default for MarkerTable {
    fn default() -> Self {
        Self {
            form_ready: Selector::test_id_contains("form-fields:question-"),
            field_item: Selector::test_id_contains("form-fields:form-item-"),
            field_id_prefix: "form-fields:form-item-".to_string(),
            required_marker: Selector::attr_contains("span", "style", "color: #ea8dea"),
            rules: default_rules(),
            panels: PanelMarkers::default(),
            submit_controls: vec![
                Selector::test_id("submit-button"),
                Selector::attr("button", "type", "submit"),
                Selector::attr("input", "type", "submit"),
            ],
            success_signals: vec![
                SuccessSignal::Element(
                    Selector::class("ant-modal-content")
                        .descendant(Selector::attr("img", "alt", "Thank you")),
                ),
                SuccessSignal::TextPattern("(?i)thank you".to_string()),
                SuccessSignal::TextPattern("(?i)response received".to_string()),
                SuccessSignal::TextPattern("(?i)submitted".to_string()),
                SuccessSignal::TextPattern("(?i)success".to_string()),
                SuccessSignal::Element(Selector::class("embed-submitted")),
                SuccessSignal::Element(Selector::class("ant-modal")),
                SuccessSignal::ContentSubstring(vec![
                    "thank".to_string(),
                    "success".to_string(),
                    "submitted".to_string(),
                ]),
            ],
        }
    }
}

impl MarkerTable {
    /// Rules sorted by ascending priority
    #[must_use]
    pub fn ordered_rules(&self) -> Vec<&ClassificationRule> {
        let mut rules: Vec<&ClassificationRule> = self.rules.iter().collect();
        rules.sort_by_key(|r| r.priority);
        rules
    }

    /// Check the table for contradictions
    pub fn validate(&self) -> FormResult<()> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.priority) {
                return Err(FormError::config(format!(
                    "duplicate classification priority {}",
                    rule.priority
                )));
            }
            if rule.kind == ControlKind::Unknown {
                return Err(FormError::config(
                    "a classification rule cannot resolve to `unknown`",
                ));
            }
            if rule.markers.is_empty() {
                return Err(FormError::config(format!(
                    "rule {} ({}) has no markers",
                    rule.priority, rule.kind
                )));
            }
        }
        if self.submit_controls.is_empty() {
            return Err(FormError::config("no submit controls configured"));
        }
        for signal in &self.success_signals {
            if let SuccessSignal::TextPattern(pattern) = signal {
                regex::Regex::new(pattern).map_err(|e| {
                    FormError::config(format!("invalid success pattern {pattern:?}: {e}"))
                })?;
            }
        }
        Ok(())
    }
}
