//! FormDriver - Abstract page automation trait
//!
//! The engine only ever talks to a page through [`FormDriver`]. This keeps
//! the discovery and fill logic independent of the browser binding and lets
//! tests run the whole engine against [`crate::MockPage`].
//!
//! # Implementations
//!
//! - `CdpDriver` - real Chromium over CDP (feature `browser`)
//! - [`crate::MockPage`] - in-memory element tree for unit tests

use crate::result::{FormError, FormResult};
use crate::selector::Selector;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::SystemTime;

/// Opaque handle to an element within one page session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(usize);

impl NodeRef {
    /// Create a handle from an arena index
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Arena index of this handle
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Backend handles interned behind [`NodeRef`]s
///
/// One key (a backend node id) always maps to the same `NodeRef` until
/// [`clear`](Self::clear), so polling the same elements does not grow
/// the arena.
#[derive(Debug)]
pub struct HandleArena<K, T> {
    handles: Vec<T>,
    by_key: HashMap<K, NodeRef>,
}

impl<K: Hash + Eq, T> Default for HandleArena<K, T> {
    fn default() -> Self {
        Self {
            handles: Vec::new(),
            by_key: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq, T> HandleArena<K, T> {
    /// Empty arena
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle` under `key`
    ///
    /// A key seen before keeps its `NodeRef`; the redundant handle is
    /// handed back so the caller can release it.
    pub fn intern(&mut self, key: K, handle: T) -> (NodeRef, Option<T>) {
        if let Some(node) = self.by_key.get(&key) {
            return (*node, Some(handle));
        }
        let node = NodeRef::new(self.handles.len());
        self.handles.push(handle);
        self.by_key.insert(key, node);
        (node, None)
    }

    /// Handle behind `node`
    pub fn get(&self, node: NodeRef) -> FormResult<&T> {
        self.handles.get(node.index()).ok_or(FormError::StaleElement {
            index: node.index(),
        })
    }

    /// Drop every handle; outstanding `NodeRef`s become stale
    pub fn clear(&mut self) {
        self.handles.clear();
        self.by_key.clear();
    }

    /// Number of distinct handles
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether nothing is interned
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Timestamp when screenshot was taken
    pub timestamp: SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            timestamp: SystemTime::now(),
        }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if screenshot has data
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Abstract driver trait for page automation
///
/// Handles returned by one driver are only meaningful to that driver.
/// All queries are non-blocking snapshots of the current page; waiting is
/// layered on top by [`crate::wait`].
#[async_trait]
pub trait FormDriver: Send + Sync {
    /// Navigate to URL
    async fn navigate(&mut self, url: &str) -> FormResult<()>;

    /// Get current URL
    async fn current_url(&self) -> FormResult<String>;

    /// All elements matching `selector`, in document order.
    ///
    /// With a scope, only strict descendants of that element are returned.
    async fn query_all(
        &self,
        scope: Option<NodeRef>,
        selector: &Selector,
    ) -> FormResult<Vec<NodeRef>>;

    /// Read an attribute
    async fn attribute(&self, node: NodeRef, name: &str) -> FormResult<Option<String>>;

    /// Lowercase tag name
    async fn tag_name(&self, node: NodeRef) -> FormResult<String>;

    /// Whether the element is rendered and visible
    async fn is_visible(&self, node: NodeRef) -> FormResult<bool>;

    /// Whether any ancestor of `node` matches `selector`
    async fn has_ancestor(&self, node: NodeRef, selector: &Selector) -> FormResult<bool>;

    /// Click element
    async fn click(&self, node: NodeRef) -> FormResult<()>;

    /// Replace the element's value with `value`
    async fn fill(&self, node: NodeRef, value: &str) -> FormResult<()>;

    /// Serialized page markup
    async fn content(&self) -> FormResult<String>;

    /// Rendered text of the page body
    async fn visible_text(&self) -> FormResult<String>;

    /// Take screenshot
    async fn screenshot(&self) -> FormResult<Screenshot>;
}

/// Convenience queries built on top of [`FormDriver`]
#[async_trait]
pub trait FormDriverExt: FormDriver {
    /// First matching element, if any
    async fn query_first(
        &self,
        scope: Option<NodeRef>,
        selector: &Selector,
    ) -> FormResult<Option<NodeRef>> {
        Ok(self.query_all(scope, selector).await?.into_iter().next())
    }

    /// Matching elements that are currently visible
    async fn query_visible(
        &self,
        scope: Option<NodeRef>,
        selector: &Selector,
    ) -> FormResult<Vec<NodeRef>> {
        let mut visible = Vec::new();
        for node in self.query_all(scope, selector).await? {
            if self.is_visible(node).await? {
                visible.push(node);
            }
        }
        Ok(visible)
    }

    /// Whether the element carries `class` in its class list
    async fn has_class(&self, node: NodeRef, class: &str) -> FormResult<bool> {
        Ok(self
            .attribute(node, "class")
            .await?
            .is_some_and(|list| list.split_whitespace().any(|c| c == class)))
    }
}

impl<T: FormDriver + ?Sized> FormDriverExt for T {}
