//! Interaction Protocols
//!
//! One strategy per control family. Each protocol drives a single field
//! from its initial state to "value accepted", waiting (bounded) for any
//! asynchronously rendered panel or option list along the way. Choice
//! protocols always take the first available option(s); which option is
//! chosen carries no meaning.
//!
//! Protocols return the value they applied, as a short description for
//! the report. Any error leaves the field to be marked failed by the
//! dispatcher.

use crate::driver::{FormDriver, FormDriverExt, NodeRef};
use crate::field::Field;
use crate::markers::{ControlKind, PanelMarkers};
use crate::result::{FormError, FormResult};
use crate::selector::Selector;
use crate::synth::ValueSynthesizer;
use crate::wait::{wait_for_visible, WaitOptions};
use async_trait::async_trait;

/// Everything a protocol needs besides the field itself
#[derive(Clone, Copy)]
pub struct ProtocolContext<'a> {
    /// Page driver
    pub driver: &'a dyn FormDriver,
    /// Option and panel markers
    pub panels: &'a PanelMarkers,
    /// Literal values
    pub synth: &'a ValueSynthesizer,
    /// Bound for panel and option-list waits
    pub wait: WaitOptions,
    /// How many options a multi-choice protocol selects
    pub choice_count: usize,
}

impl std::fmt::Debug for ProtocolContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolContext")
            .field("wait", &self.wait)
            .field("choice_count", &self.choice_count)
            .finish_non_exhaustive()
    }
}

/// Interaction sequence for one control family
#[async_trait]
pub trait InteractionProtocol: Send + Sync {
    /// Short protocol name
    fn name(&self) -> &'static str;

    /// Drive `control` (the element that classified `field`) to a filled state
    async fn apply(
        &self,
        ctx: &ProtocolContext<'_>,
        field: &Field,
        control: NodeRef,
    ) -> FormResult<String>;
}

/// Protocol for a classified kind; `None` for [`ControlKind::Unknown`]
#[must_use]
pub fn protocol_for(kind: ControlKind) -> Option<&'static dyn InteractionProtocol> {
    match kind {
        ControlKind::Text => Some(&DirectFill {
            kind: ControlKind::Text,
        }),
        ControlKind::Textarea => Some(&DirectFill {
            kind: ControlKind::Textarea,
        }),
        ControlKind::Number => Some(&DirectFill {
            kind: ControlKind::Number,
        }),
        ControlKind::SingleChoice => Some(&SingleChoice),
        ControlKind::MultiChoice => Some(&MultiChoice),
        ControlKind::Select => Some(&SearchableSelect),
        ControlKind::Date => Some(&DatePanel),
        ControlKind::Time => Some(&TimePanel),
        ControlKind::Unknown => None,
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// The control itself when it is an input, else its first nested match
async fn fillable_within(
    driver: &dyn FormDriver,
    node: NodeRef,
    inner: &Selector,
) -> FormResult<NodeRef> {
    let tag = driver.tag_name(node).await?;
    if tag == "input" || tag == "textarea" {
        return Ok(node);
    }
    driver
        .query_first(Some(node), inner)
        .await?
        .ok_or_else(|| FormError::not_interactable(format!("no {inner} inside {node}")))
}

/// First visible, enabled match of `selector` under `scope`
async fn first_enabled(
    driver: &dyn FormDriver,
    scope: NodeRef,
    selector: &Selector,
    disabled_class: &str,
) -> FormResult<Option<NodeRef>> {
    for node in driver.query_visible(Some(scope), selector).await? {
        if !driver.has_class(node, disabled_class).await? {
            return Ok(Some(node));
        }
    }
    Ok(None)
}

/// Fill the field's "other" free-text box if a choice revealed one
async fn fill_other_input(ctx: &ProtocolContext<'_>, field: &Field) -> FormResult<bool> {
    let selector = ctx.panels.other_input.for_field(&field.id);
    let Some(other) = ctx
        .driver
        .query_visible(Some(field.root), &selector)
        .await?
        .into_iter()
        .next()
    else {
        return Ok(false);
    };
    let input = fillable_within(ctx.driver, other, &Selector::tag("input")).await?;
    ctx.driver.fill(input, &ctx.synth.other_text).await?;
    tracing::debug!(field = %field.id, "other input filled");
    Ok(true)
}

fn with_other(value: String, other: bool) -> String {
    if other {
        format!("{value} + other text")
    } else {
        value
    }
}

// =============================================================================
// DIRECT FILL
// =============================================================================

/// `empty -> filled` for text, textarea and numeric inputs
#[derive(Debug, Clone, Copy)]
pub struct DirectFill {
    kind: ControlKind,
}

#[async_trait]
impl InteractionProtocol for DirectFill {
    fn name(&self) -> &'static str {
        "direct-fill"
    }

    async fn apply(
        &self,
        ctx: &ProtocolContext<'_>,
        field: &Field,
        control: NodeRef,
    ) -> FormResult<String> {
        let input = fillable_within(ctx.driver, control, &ctx.panels.number_input).await?;
        let placeholder = ctx.driver.attribute(input, "placeholder").await?;
        let value = ctx
            .synth
            .synthesize(&field.id, self.kind, placeholder.as_deref())
            .ok_or_else(|| {
                FormError::invalid_state(format!("no value for {} field", self.kind))
            })?;
        ctx.driver.fill(input, &value).await?;
        tracing::debug!(field = %field.id, kind = %self.kind, state = "filled", "direct fill");
        Ok(value)
    }
}

// =============================================================================
// CHOICE GROUPS
// =============================================================================

/// `closed -> selected`: click the first option of a radio group
#[derive(Debug, Clone, Copy)]
pub struct SingleChoice;

#[async_trait]
impl InteractionProtocol for SingleChoice {
    fn name(&self) -> &'static str {
        "single-choice"
    }

    async fn apply(
        &self,
        ctx: &ProtocolContext<'_>,
        field: &Field,
        control: NodeRef,
    ) -> FormResult<String> {
        let options = ctx
            .driver
            .query_visible(Some(control), &ctx.panels.radio_option)
            .await?;
        let first = options
            .first()
            .copied()
            .ok_or_else(|| FormError::not_interactable("radio group has no options"))?;
        ctx.driver.click(first).await?;
        tracing::debug!(field = %field.id, options = options.len(), state = "selected", "single choice");
        let other = fill_other_input(ctx, field).await?;
        Ok(with_other(format!("option 1 of {}", options.len()), other))
    }
}

/// `closed -> selected(n)`: click the first `choice_count` checkboxes
#[derive(Debug, Clone, Copy)]
pub struct MultiChoice;

#[async_trait]
impl InteractionProtocol for MultiChoice {
    fn name(&self) -> &'static str {
        "multi-choice"
    }

    async fn apply(
        &self,
        ctx: &ProtocolContext<'_>,
        field: &Field,
        control: NodeRef,
    ) -> FormResult<String> {
        let options = ctx
            .driver
            .query_visible(Some(control), &ctx.panels.checkbox_option)
            .await?;
        if options.is_empty() {
            return Err(FormError::not_interactable("checkbox group has no options"));
        }
        let picked = ctx.choice_count.max(1).min(options.len());
        for option in &options[..picked] {
            ctx.driver.click(*option).await?;
        }
        tracing::debug!(field = %field.id, picked, state = "selected", "multi choice");
        let other = fill_other_input(ctx, field).await?;
        Ok(with_other(
            format!("{picked} of {} options", options.len()),
            other,
        ))
    }
}

// =============================================================================
// PANELS
// =============================================================================

/// `closed -> opened -> optionListRendered -> selected -> closed`
#[derive(Debug, Clone, Copy)]
pub struct SearchableSelect;

#[async_trait]
impl InteractionProtocol for SearchableSelect {
    fn name(&self) -> &'static str {
        "searchable-select"
    }

    async fn apply(
        &self,
        ctx: &ProtocolContext<'_>,
        field: &Field,
        control: NodeRef,
    ) -> FormResult<String> {
        ctx.driver.click(control).await?;
        tracing::debug!(field = %field.id, state = "opened", "select");
        // The option list renders at page level, outside the field.
        let options =
            wait_for_visible(ctx.driver, None, &ctx.panels.select_option, &ctx.wait).await?;
        tracing::debug!(field = %field.id, options = options.len(), state = "option-list-rendered", "select");
        let first = options[0];
        let label = ctx.driver.attribute(first, "title").await?;
        ctx.driver.click(first).await?;
        tracing::debug!(field = %field.id, state = "selected", "select");
        Ok(label.unwrap_or_else(|| format!("option 1 of {}", options.len())))
    }
}

/// `closed -> opened -> panelRendered -> selected`, preferring today
#[derive(Debug, Clone, Copy)]
pub struct DatePanel;

#[async_trait]
impl InteractionProtocol for DatePanel {
    fn name(&self) -> &'static str {
        "date-panel"
    }

    async fn apply(
        &self,
        ctx: &ProtocolContext<'_>,
        field: &Field,
        control: NodeRef,
    ) -> FormResult<String> {
        let p = ctx.panels;
        ctx.driver.click(control).await?;
        tracing::debug!(field = %field.id, state = "opened", "date picker");
        let panels = wait_for_visible(ctx.driver, None, &p.date_panel, &ctx.wait).await?;
        let panel = panels[0];
        tracing::debug!(field = %field.id, state = "panel-rendered", "date picker");

        let (cell, which) =
            match first_enabled(ctx.driver, panel, &p.date_today_cell, &p.date_disabled_class)
                .await?
            {
                Some(today) => (today, "today"),
                None => (
                    first_enabled(ctx.driver, panel, &p.date_cell, &p.date_disabled_class)
                        .await?
                        .ok_or_else(|| {
                            FormError::not_interactable("date panel has no selectable cell")
                        })?,
                    "first available",
                ),
            };
        let title = ctx.driver.attribute(cell, "title").await?;
        ctx.driver.click(cell).await?;
        tracing::debug!(field = %field.id, cell = which, state = "selected", "date picker");
        Ok(title.unwrap_or_else(|| which.to_string()))
    }
}

/// `closed -> opened -> panelRendered -> hourSelected -> minuteSelected -> confirmed`
#[derive(Debug, Clone, Copy)]
pub struct TimePanel;

#[async_trait]
impl InteractionProtocol for TimePanel {
    fn name(&self) -> &'static str {
        "time-panel"
    }

    async fn apply(
        &self,
        ctx: &ProtocolContext<'_>,
        field: &Field,
        control: NodeRef,
    ) -> FormResult<String> {
        let p = ctx.panels;
        ctx.driver.click(control).await?;
        tracing::debug!(field = %field.id, state = "opened", "time picker");
        let panels = wait_for_visible(ctx.driver, None, &p.time_panel, &ctx.wait).await?;
        let panel = panels[0];
        tracing::debug!(field = %field.id, state = "panel-rendered", "time picker");

        let columns = ctx.driver.query_visible(Some(panel), &p.time_column).await?;
        if columns.len() < 2 {
            return Err(FormError::not_interactable(format!(
                "time panel has {} column(s), expected hours and minutes",
                columns.len()
            )));
        }
        for (column, state) in columns.iter().zip(["hour-selected", "minute-selected"]) {
            let cell = first_enabled(ctx.driver, *column, &p.time_cell, &p.time_disabled_class)
                .await?
                .ok_or_else(|| FormError::not_interactable("time column has no selectable cell"))?;
            ctx.driver.click(cell).await?;
            tracing::debug!(field = %field.id, state, "time picker");
        }

        // Pickers without a confirm button commit on selection.
        let confirmed = match ctx
            .driver
            .query_visible(None, &p.time_confirm)
            .await?
            .first()
        {
            Some(ok) => {
                ctx.driver.click(*ok).await?;
                true
            }
            None => false,
        };
        tracing::debug!(field = %field.id, confirmed, state = "confirmed", "time picker");
        Ok("first open slot".to_string())
    }
}
