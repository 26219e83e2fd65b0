//! In-memory page for exercising the engine without a browser.
//!
//! A [`MockPage`] is a flat arena of elements with parent links. It matches
//! structured [`Selector`]s directly (raw [`Selector::Css`] never matches),
//! tracks visibility, input values and checked state, and can run simple
//! click effects so that panels and dropdowns "render" when opened.

use crate::driver::{FormDriver, NodeRef, Screenshot};
use crate::result::{FormError, FormResult};
use crate::selector::{Selector, TEST_ID_ATTR};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// What happens when a mock element is clicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    /// Make these elements visible
    Show(Vec<NodeRef>),
    /// Hide these elements
    Hide(Vec<NodeRef>),
    /// Toggle the clicked element's checked state
    Toggle,
    /// Check the clicked element and uncheck every other element of the group
    SelectExclusive {
        /// Container whose descendants form the group
        group: NodeRef,
    },
    /// Append text to the page body
    AppendText(String),
}

/// Builder for a mock element
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    hidden: bool,
}

impl MockElement {
    /// Create a new element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Set the `data-testid` attribute
    #[must_use]
    pub fn test_id(self, id: impl Into<String>) -> Self {
        self.attr(TEST_ID_ATTR, id)
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add a class
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set text content
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Start hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

#[derive(Debug, Clone)]
struct MockNode {
    parent: Option<NodeRef>,
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    visible: bool,
    value: Option<String>,
    checked: bool,
    on_click: Vec<ClickEffect>,
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    nodes: Vec<MockNode>,
    extra_text: Vec<String>,
    call_history: Vec<String>,
    screenshot: Vec<u8>,
}

/// In-memory page implementing [`FormDriver`]
#[derive(Debug, Default)]
pub struct MockPage {
    state: Mutex<MockState>,
}

impl MockPage {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Append an element under `parent` (or at the document root)
    pub fn add(&self, parent: Option<NodeRef>, element: MockElement) -> NodeRef {
        let mut state = self.lock();
        let node = NodeRef::new(state.nodes.len());
        state.nodes.push(MockNode {
            parent,
            tag: element.tag,
            attributes: element.attributes,
            classes: element.classes,
            text: element.text,
            visible: !element.hidden,
            value: None,
            checked: false,
            on_click: Vec::new(),
        });
        node
    }

    /// Register an effect that runs when `node` is clicked
    pub fn on_click(&self, node: NodeRef, effect: ClickEffect) {
        if let Some(n) = self.lock().nodes.get_mut(node.index()) {
            n.on_click.push(effect);
        }
    }

    /// Change visibility of an element
    pub fn set_visible(&self, node: NodeRef, visible: bool) {
        if let Some(n) = self.lock().nodes.get_mut(node.index()) {
            n.visible = visible;
        }
    }

    /// Add free text to the page body
    pub fn push_text(&self, text: impl Into<String>) {
        self.lock().extra_text.push(text.into());
    }

    /// Bytes returned by [`FormDriver::screenshot`]
    pub fn set_screenshot(&self, data: Vec<u8>) {
        self.lock().screenshot = data;
    }

    /// Current value of an input element
    #[must_use]
    pub fn value_of(&self, node: NodeRef) -> Option<String> {
        self.lock()
            .nodes
            .get(node.index())
            .and_then(|n| n.value.clone())
    }

    /// Whether an element is checked
    #[must_use]
    pub fn is_checked(&self, node: NodeRef) -> bool {
        self.lock()
            .nodes
            .get(node.index())
            .is_some_and(|n| n.checked)
    }

    /// Number of checked elements among `nodes`
    #[must_use]
    pub fn checked_count(&self, nodes: &[NodeRef]) -> usize {
        nodes.iter().filter(|n| self.is_checked(**n)).count()
    }

    /// Recorded driver calls
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Check if a method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }
}

impl MockState {
    fn node(&self, node: NodeRef) -> FormResult<&MockNode> {
        self.nodes.get(node.index()).ok_or(FormError::StaleElement {
            index: node.index(),
        })
    }

    fn ancestors(&self, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        std::iter::successors(
            self.nodes.get(node.index()).and_then(|n| n.parent),
            move |p| self.nodes.get(p.index()).and_then(|n| n.parent),
        )
    }

    fn is_descendant_of(&self, node: NodeRef, ancestor: NodeRef) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    fn visible(&self, node: NodeRef) -> bool {
        self.nodes.get(node.index()).is_some_and(|n| n.visible)
            && self
                .ancestors(node)
                .all(|a| self.nodes.get(a.index()).is_some_and(|n| n.visible))
    }

    fn matches(&self, node: NodeRef, selector: &Selector) -> bool {
        let Some(n) = self.nodes.get(node.index()) else {
            return false;
        };
        let attr = |name: &str| n.attributes.get(name).map(String::as_str);
        match selector {
            Selector::TestId(id) => attr(TEST_ID_ATTR) == Some(id.as_str()),
            Selector::TestIdContains(id) => attr(TEST_ID_ATTR).is_some_and(|v| v.contains(id)),
            Selector::TestIdSuffix(id) => attr(TEST_ID_ATTR).is_some_and(|v| v.ends_with(id)),
            Selector::Class(c) => n.classes.iter().any(|x| x == c),
            Selector::Tag(t) => n.tag == *t,
            Selector::TagWithClass { tag, class } => {
                n.tag == *tag && n.classes.iter().any(|x| x == class)
            }
            Selector::Attr { tag, name, value } => {
                n.tag == *tag && attr(name) == Some(value.as_str())
            }
            Selector::AttrContains { tag, name, value } => {
                n.tag == *tag && attr(name).is_some_and(|v| v.contains(value.as_str()))
            }
            Selector::Descendant(outer, inner) => {
                self.matches(node, inner) && self.ancestors(node).any(|a| self.matches(a, outer))
            }
            Selector::Css(_) => false,
        }
    }

    fn render(&self, node: NodeRef, out: &mut String) {
        let Some(n) = self.nodes.get(node.index()) else {
            return;
        };
        out.push('<');
        out.push_str(&n.tag);
        for (k, v) in &n.attributes {
            out.push_str(&format!(" {k}={v:?}"));
        }
        if !n.classes.is_empty() {
            out.push_str(&format!(" class={:?}", n.classes.join(" ")));
        }
        out.push('>');
        out.push_str(&n.text);
        for (idx, child) in self.nodes.iter().enumerate() {
            if child.parent == Some(node) {
                self.render(NodeRef::new(idx), out);
            }
        }
        out.push_str(&format!("</{}>", n.tag));
    }
}

#[async_trait]
impl FormDriver for MockPage {
    async fn navigate(&mut self, url: &str) -> FormResult<()> {
        let mut state = self.lock();
        state.call_history.push(format!("navigate:{url}"));
        state.url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> FormResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn query_all(
        &self,
        scope: Option<NodeRef>,
        selector: &Selector,
    ) -> FormResult<Vec<NodeRef>> {
        let state = self.lock();
        let found = (0..state.nodes.len())
            .map(NodeRef::new)
            .filter(|n| scope.map_or(true, |s| state.is_descendant_of(*n, s)))
            .filter(|n| state.matches(*n, selector))
            .collect();
        Ok(found)
    }

    async fn attribute(&self, node: NodeRef, name: &str) -> FormResult<Option<String>> {
        let state = self.lock();
        let n = state.node(node)?;
        if name == "class" {
            return Ok((!n.classes.is_empty()).then(|| n.classes.join(" ")));
        }
        Ok(n.attributes.get(name).cloned())
    }

    async fn tag_name(&self, node: NodeRef) -> FormResult<String> {
        Ok(self.lock().node(node)?.tag.clone())
    }

    async fn is_visible(&self, node: NodeRef) -> FormResult<bool> {
        let state = self.lock();
        state.node(node)?;
        Ok(state.visible(node))
    }

    async fn has_ancestor(&self, node: NodeRef, selector: &Selector) -> FormResult<bool> {
        let state = self.lock();
        state.node(node)?;
        let found = state.ancestors(node).any(|a| state.matches(a, selector));
        Ok(found)
    }

    async fn click(&self, node: NodeRef) -> FormResult<()> {
        let mut state = self.lock();
        state.call_history.push(format!("click:{node}"));
        if !state.visible(node) {
            return Err(FormError::not_interactable(format!(
                "element {node} is not visible"
            )));
        }
        let effects = state.node(node)?.on_click.clone();
        for effect in effects {
            match effect {
                ClickEffect::Show(targets) => {
                    for t in targets {
                        if let Some(n) = state.nodes.get_mut(t.index()) {
                            n.visible = true;
                        }
                    }
                }
                ClickEffect::Hide(targets) => {
                    for t in targets {
                        if let Some(n) = state.nodes.get_mut(t.index()) {
                            n.visible = false;
                        }
                    }
                }
                ClickEffect::Toggle => {
                    let n = &mut state.nodes[node.index()];
                    n.checked = !n.checked;
                }
                ClickEffect::SelectExclusive { group } => {
                    let members: Vec<usize> = (0..state.nodes.len())
                        .filter(|i| state.is_descendant_of(NodeRef::new(*i), group))
                        .collect();
                    for i in members {
                        state.nodes[i].checked = false;
                    }
                    state.nodes[node.index()].checked = true;
                }
                ClickEffect::AppendText(text) => state.extra_text.push(text),
            }
        }
        Ok(())
    }

    async fn fill(&self, node: NodeRef, value: &str) -> FormResult<()> {
        let mut state = self.lock();
        state.call_history.push(format!("fill:{node}"));
        if !state.visible(node) {
            return Err(FormError::not_interactable(format!(
                "element {node} is not visible"
            )));
        }
        let n = &mut state.nodes[node.index()];
        if n.tag != "input" && n.tag != "textarea" {
            return Err(FormError::not_interactable(format!(
                "<{}> {node} is not fillable",
                n.tag
            )));
        }
        n.value = Some(value.to_string());
        Ok(())
    }

    async fn content(&self) -> FormResult<String> {
        let state = self.lock();
        let mut out = String::from("<html><body>");
        for (idx, n) in state.nodes.iter().enumerate() {
            if n.parent.is_none() {
                state.render(NodeRef::new(idx), &mut out);
            }
        }
        for text in &state.extra_text {
            out.push_str(text);
        }
        out.push_str("</body></html>");
        Ok(out)
    }

    async fn visible_text(&self) -> FormResult<String> {
        let state = self.lock();
        let mut parts: Vec<&str> = (0..state.nodes.len())
            .filter(|i| state.visible(NodeRef::new(*i)))
            .map(|i| state.nodes[i].text.as_str())
            .filter(|t| !t.is_empty())
            .collect();
        parts.extend(state.extra_text.iter().map(String::as_str));
        Ok(parts.join("\n"))
    }

    async fn screenshot(&self) -> FormResult<Screenshot> {
        let mut state = self.lock();
        state.call_history.push("screenshot".to_string());
        Ok(Screenshot::new(state.screenshot.clone()))
    }
}
