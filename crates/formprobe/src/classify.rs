//! Control Classifier
//!
//! Resolves a field to a [`ControlKind`] by walking the marker table's
//! classification rules. Every query is scoped to the field's root
//! container, so markup from neighbouring fields (or page-level dropdown
//! lists) never leaks into the decision. Exact test ids outrank generic
//! classes across all rules: a radio group that wraps an antd "other"
//! input is a radio group, not a text box. Nothing matching yields
//! [`ControlKind::Unknown`] rather than an error.

use crate::driver::{FormDriver, FormDriverExt, NodeRef};
use crate::field::Field;
use crate::markers::{ControlKind, Guard, Marker, MarkerTable};
use crate::result::FormResult;

/// Outcome of classifying one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Resolved kind
    pub kind: ControlKind,
    /// Element that satisfied the winning marker
    pub control: Option<NodeRef>,
}

impl Classification {
    /// Nothing matched
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            kind: ControlKind::Unknown,
            control: None,
        }
    }
}

/// Priority-ordered classifier over a [`MarkerTable`]
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    table: &'a MarkerTable,
}

impl<'a> Classifier<'a> {
    /// Create a classifier for a marker table
    #[must_use]
    pub const fn new(table: &'a MarkerTable) -> Self {
        Self { table }
    }

    /// Classify one field
    ///
    /// Marker sets are tried in passes: every rule's qualified test id,
    /// then every bare suffix, then every generic class. Within a pass
    /// the lowest priority number wins.
    pub async fn classify(
        &self,
        driver: &dyn FormDriver,
        field: &Field,
    ) -> FormResult<Classification> {
        let depth = self
            .table
            .rules
            .iter()
            .map(|r| r.markers.len())
            .max()
            .unwrap_or(0);
        let rules = self.table.ordered_rules();
        for set in 0..depth {
            for rule in &rules {
                let Some(marker) = rule.markers.get(set) else {
                    continue;
                };
                if let Some(control) = self.match_marker(driver, field, rule.kind, marker).await? {
                    tracing::trace!(
                        field = %field.id,
                        kind = %rule.kind,
                        marker = %marker.selector,
                        pass = set,
                        "marker matched"
                    );
                    return Ok(Classification {
                        kind: rule.kind,
                        control: Some(control),
                    });
                }
            }
        }
        Ok(Classification::unknown())
    }

    async fn match_marker(
        &self,
        driver: &dyn FormDriver,
        field: &Field,
        kind: ControlKind,
        marker: &Marker,
    ) -> FormResult<Option<NodeRef>> {
        let selector = marker.selector.for_field(&field.id);
        for node in driver.query_all(Some(field.root), &selector).await? {
            if kind == ControlKind::Text && self.is_other_input(driver, field, node).await? {
                continue;
            }
            if guard_holds(driver, node, marker.guard).await? {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// Node is, or sits inside, a choice field's "other" free-text box
    async fn is_other_input(
        &self,
        driver: &dyn FormDriver,
        field: &Field,
        node: NodeRef,
    ) -> FormResult<bool> {
        let other = self.table.panels.other_input.for_field(&field.id);
        if driver.query_all(Some(field.root), &other).await?.contains(&node) {
            return Ok(true);
        }
        driver.has_ancestor(node, &other).await
    }
}

async fn guard_holds(driver: &dyn FormDriver, node: NodeRef, guard: Guard) -> FormResult<bool> {
    match guard {
        Guard::None => Ok(true),
        Guard::Editable => Ok(driver.attribute(node, "readonly").await?.is_none()
            && driver.attribute(node, "disabled").await?.is_none()),
        Guard::TimeHint => has_time_hint(driver, node).await,
        Guard::NotTimeHint => Ok(!has_time_hint(driver, node).await?),
    }
}

/// Placeholder of the control, or of its first nested input, mentions "time"
async fn has_time_hint(driver: &dyn FormDriver, node: NodeRef) -> FormResult<bool> {
    let mut placeholder = driver.attribute(node, "placeholder").await?;
    if placeholder.is_none() {
        if let Some(input) = driver
            .query_first(Some(node), &crate::selector::Selector::tag("input"))
            .await?
        {
            placeholder = driver.attribute(input, "placeholder").await?;
        }
    }
    Ok(placeholder.is_some_and(|p| p.to_lowercase().contains("time")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock_page::{MockElement, MockPage};
    use proptest::prelude::*;

    fn item(page: &MockPage, id: &str) -> Field {
        let root = page.add(
            None,
            MockElement::new("div").test_id(format!("form-fields:form-item-{id}")),
        );
        Field::new(id, 0, root, false)
    }

    fn question(page: &MockPage, field: &Field, tag: &str, suffix: &str) -> NodeRef {
        page.add(
            Some(field.root),
            MockElement::new(tag).test_id(format!(
                "form-fields:question-{}:input:{suffix}",
                field.id
            )),
        )
    }

    async fn kind_of(page: &MockPage, field: &Field) -> ControlKind {
        let table = MarkerTable::default();
        Classifier::new(&table)
            .classify(page, field)
            .await
            .unwrap()
            .kind
    }

    mod marker_set_tests {
        use super::*;

        #[tokio::test]
        async fn test_qualified_test_id() {
            let page = MockPage::new();
            let f = item(&page, "a1");
            let input = question(&page, &f, "input", "text-input");
            let table = MarkerTable::default();
            let c = Classifier::new(&table).classify(&page, &f).await.unwrap();
            assert_eq!(c.kind, ControlKind::Text);
            assert_eq!(c.control, Some(input));
        }

        #[tokio::test]
        async fn test_bare_suffix() {
            let page = MockPage::new();
            let f = item(&page, "a1");
            page.add(
                Some(f.root),
                MockElement::new("div").test_id("legacy:radio:group"),
            );
            assert_eq!(kind_of(&page, &f).await, ControlKind::SingleChoice);
        }

        #[tokio::test]
        async fn test_generic_classes() {
            let page = MockPage::new();
            let f = item(&page, "n");
            page.add(Some(f.root), MockElement::new("div").class("ant-input-number"));
            assert_eq!(kind_of(&page, &f).await, ControlKind::Number);

            let g = item(&page, "s");
            page.add(Some(g.root), MockElement::new("div").class("ant-select"));
            assert_eq!(kind_of(&page, &g).await, ControlKind::Select);
        }

        #[tokio::test]
        async fn test_nothing_matches_is_unknown() {
            let page = MockPage::new();
            let f = item(&page, "x");
            page.add(Some(f.root), MockElement::new("canvas"));
            let table = MarkerTable::default();
            let c = Classifier::new(&table).classify(&page, &f).await.unwrap();
            assert_eq!(c, Classification::unknown());
        }
    }

    mod guard_tests {
        use super::*;

        #[tokio::test]
        async fn test_readonly_text_input_is_not_text() {
            let page = MockPage::new();
            let f = item(&page, "r");
            page.add(
                Some(f.root),
                MockElement::new("input")
                    .class("ant-input")
                    .attr("readonly", ""),
            );
            assert_eq!(kind_of(&page, &f).await, ControlKind::Unknown);
        }

        #[tokio::test]
        async fn test_generic_picker_time_hint() {
            let page = MockPage::new();
            let f = item(&page, "t");
            let picker = page.add(Some(f.root), MockElement::new("div").class("ant-picker"));
            page.add(
                Some(picker),
                MockElement::new("input").attr("placeholder", "Select Time"),
            );
            assert_eq!(kind_of(&page, &f).await, ControlKind::Time);
        }

        #[tokio::test]
        async fn test_generic_picker_defaults_to_date() {
            let page = MockPage::new();
            let f = item(&page, "d");
            let picker = page.add(Some(f.root), MockElement::new("div").class("ant-picker"));
            page.add(
                Some(picker),
                MockElement::new("input").attr("placeholder", "Select date"),
            );
            assert_eq!(kind_of(&page, &f).await, ControlKind::Date);
        }

        #[tokio::test]
        async fn test_explicit_time_marker_beats_hint() {
            let page = MockPage::new();
            let f = item(&page, "t2");
            let picker = question(&page, &f, "div", "time:picker");
            page.add(
                Some(picker),
                MockElement::new("input").attr("placeholder", "Pick a slot"),
            );
            assert_eq!(kind_of(&page, &f).await, ControlKind::Time);
        }
    }

    mod pass_order_tests {
        use super::*;

        fn radio_with_other(page: &MockPage, f: &Field, other_visible: bool) -> NodeRef {
            let group = question(page, f, "div", "radio:group");
            page.add(Some(group), MockElement::new("span").class("ant-radio"));
            let mut other = MockElement::new("input")
                .class("ant-input")
                .test_id(format!("form-fields:question-{}:other-input", f.id));
            if !other_visible {
                other = other.hidden();
            }
            page.add(Some(group), other);
            group
        }

        #[tokio::test]
        async fn test_radio_group_with_other_input_is_single_choice() {
            let page = MockPage::new();
            let f = item(&page, "q1");
            let group = radio_with_other(&page, &f, true);
            let table = MarkerTable::default();
            let c = Classifier::new(&table).classify(&page, &f).await.unwrap();
            assert_eq!(c.kind, ControlKind::SingleChoice);
            assert_eq!(c.control, Some(group));
        }

        #[tokio::test]
        async fn test_hidden_other_input_does_not_shadow_group() {
            let page = MockPage::new();
            let f = item(&page, "q2");
            radio_with_other(&page, &f, false);
            assert_eq!(kind_of(&page, &f).await, ControlKind::SingleChoice);
        }

        #[tokio::test]
        async fn test_generic_choice_group_with_other_input() {
            let page = MockPage::new();
            let f = item(&page, "q3");
            let group = page.add(Some(f.root), MockElement::new("div").class("ant-checkbox-group"));
            let wrapper = page.add(
                Some(group),
                MockElement::new("span").test_id("form-fields:question-q3:other-input"),
            );
            page.add(Some(wrapper), MockElement::new("input").class("ant-input"));
            assert_eq!(kind_of(&page, &f).await, ControlKind::MultiChoice);
        }

        #[tokio::test]
        async fn test_bare_suffix_beats_earlier_generic_class() {
            let page = MockPage::new();
            let f = item(&page, "q4");
            page.add(Some(f.root), MockElement::new("input").class("ant-input"));
            page.add(
                Some(f.root),
                MockElement::new("div").test_id("legacy:dropdown:select"),
            );
            assert_eq!(kind_of(&page, &f).await, ControlKind::Select);
        }

        #[tokio::test]
        async fn test_plain_generic_text_input_still_text() {
            let page = MockPage::new();
            let f = item(&page, "q5");
            page.add(Some(f.root), MockElement::new("input").class("ant-input"));
            assert_eq!(kind_of(&page, &f).await, ControlKind::Text);
        }
    }

    mod scope_tests {
        use super::*;

        #[tokio::test]
        async fn test_neighbouring_field_does_not_leak() {
            let page = MockPage::new();
            let a = item(&page, "a");
            let b = item(&page, "b");
            question(&page, &b, "input", "text-input");
            page.add(Some(a.root), MockElement::new("div").class("ant-select"));
            assert_eq!(kind_of(&page, &a).await, ControlKind::Select);
            assert_eq!(kind_of(&page, &b).await, ControlKind::Text);
        }

        #[tokio::test]
        async fn test_page_level_dropdown_ignored() {
            let page = MockPage::new();
            let f = item(&page, "p");
            page.add(None, MockElement::new("div").class("ant-checkbox-group"));
            assert_eq!(kind_of(&page, &f).await, ControlKind::Unknown);
        }
    }

    mod priority_tests {
        use super::*;

        const SUFFIXES: [(&str, &str, ControlKind); 8] = [
            ("input", "text-input", ControlKind::Text),
            ("textarea", "text-area", ControlKind::Textarea),
            ("div", "number-input", ControlKind::Number),
            ("div", "radio:group", ControlKind::SingleChoice),
            ("div", "checkboxes:group", ControlKind::MultiChoice),
            ("div", "dropdown:select", ControlKind::Select),
            ("div", "date:picker", ControlKind::Date),
            ("div", "time:picker", ControlKind::Time),
        ];

        proptest! {
            #[test]
            fn prop_first_priority_wins_and_is_stable(
                present in proptest::collection::vec(any::<bool>(), 8),
                reversed in any::<bool>(),
            ) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .unwrap();
                let page = MockPage::new();
                let f = item(&page, "q");
                let mut order: Vec<usize> = (0..8).collect();
                if reversed {
                    order.reverse();
                }
                for i in order {
                    if present[i] {
                        let (tag, suffix, _) = SUFFIXES[i];
                        question(&page, &f, tag, suffix);
                    }
                }
                let expected = SUFFIXES
                    .iter()
                    .zip(&present)
                    .find(|(_, p)| **p)
                    .map_or(ControlKind::Unknown, |((_, _, k), _)| *k);

                let first = rt.block_on(kind_of(&page, &f));
                let second = rt.block_on(kind_of(&page, &f));
                prop_assert_eq!(first, expected);
                prop_assert_eq!(first, second);
            }
        }
    }
}
