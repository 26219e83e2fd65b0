//! Structured selectors for locating form elements.
//!
//! Selectors are kept structured rather than as raw CSS so that the same
//! marker can be rendered to CSS for a live browser and matched directly
//! against the in-memory [`crate::MockPage`]. String payloads may carry a
//! `{field}` placeholder that is resolved against a field identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder replaced by the field identifier in templated selectors
pub const FIELD_PLACEHOLDER: &str = "{field}";

/// Attribute used by the renderer for stable test hooks
pub const TEST_ID_ATTR: &str = "data-testid";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Exact test id (`[data-testid="x"]`)
    TestId(String),
    /// Test id substring (`[data-testid*="x"]`)
    TestIdContains(String),
    /// Test id suffix (`[data-testid$="x"]`)
    TestIdSuffix(String),
    /// Class name (`.x`)
    Class(String),
    /// Tag name (`input`)
    Tag(String),
    /// Tag qualified by class (`input.ant-input`)
    TagWithClass {
        /// Tag name
        tag: String,
        /// Class name
        class: String,
    },
    /// Exact attribute value (`img[alt="Thank you"]`)
    Attr {
        /// Tag name
        tag: String,
        /// Attribute name
        name: String,
        /// Attribute value
        value: String,
    },
    /// Attribute substring (`span[style*="color: red"]`)
    AttrContains {
        /// Tag name
        tag: String,
        /// Attribute name
        name: String,
        /// Substring of the attribute value
        value: String,
    },
    /// Descendant combinator (`a b`)
    Descendant(Box<Selector>, Box<Selector>),
    /// Raw CSS passed through to the browser
    Css(String),
}

impl Selector {
    /// Create an exact test id selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a test id substring selector
    #[must_use]
    pub fn test_id_contains(fragment: impl Into<String>) -> Self {
        Self::TestIdContains(fragment.into())
    }

    /// Create a test id suffix selector
    #[must_use]
    pub fn test_id_suffix(suffix: impl Into<String>) -> Self {
        Self::TestIdSuffix(suffix.into())
    }

    /// Create a class selector
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    /// Create a tag selector
    #[must_use]
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(name.into())
    }

    /// Create a tag-with-class selector
    #[must_use]
    pub fn tag_with_class(tag: impl Into<String>, class: impl Into<String>) -> Self {
        Self::TagWithClass {
            tag: tag.into(),
            class: class.into(),
        }
    }

    /// Create an exact attribute selector
    #[must_use]
    pub fn attr(tag: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Attr {
            tag: tag.into(),
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create an attribute substring selector
    #[must_use]
    pub fn attr_contains(
        tag: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::AttrContains {
            tag: tag.into(),
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a raw CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Narrow this selector to descendants matching `inner`
    #[must_use]
    pub fn descendant(self, inner: Self) -> Self {
        Self::Descendant(Box::new(self), Box::new(inner))
    }

    /// Whether any payload carries the `{field}` placeholder
    #[must_use]
    pub fn is_templated(&self) -> bool {
        match self {
            Self::TestId(s)
            | Self::TestIdContains(s)
            | Self::TestIdSuffix(s)
            | Self::Class(s)
            | Self::Tag(s)
            | Self::Css(s) => s.contains(FIELD_PLACEHOLDER),
            Self::TagWithClass { tag, class } => {
                tag.contains(FIELD_PLACEHOLDER) || class.contains(FIELD_PLACEHOLDER)
            }
            Self::Attr { value, .. } | Self::AttrContains { value, .. } => {
                value.contains(FIELD_PLACEHOLDER)
            }
            Self::Descendant(outer, inner) => outer.is_templated() || inner.is_templated(),
        }
    }

    /// Resolve the `{field}` placeholder against a field identifier
    #[must_use]
    pub fn for_field(&self, field_id: &str) -> Self {
        let sub = |s: &String| s.replace(FIELD_PLACEHOLDER, field_id);
        match self {
            Self::TestId(s) => Self::TestId(sub(s)),
            Self::TestIdContains(s) => Self::TestIdContains(sub(s)),
            Self::TestIdSuffix(s) => Self::TestIdSuffix(sub(s)),
            Self::Class(s) => Self::Class(sub(s)),
            Self::Tag(s) => Self::Tag(sub(s)),
            Self::Css(s) => Self::Css(sub(s)),
            Self::TagWithClass { tag, class } => Self::TagWithClass {
                tag: sub(tag),
                class: sub(class),
            },
            Self::Attr { tag, name, value } => Self::Attr {
                tag: sub(tag),
                name: name.clone(),
                value: sub(value),
            },
            Self::AttrContains { tag, name, value } => Self::AttrContains {
                tag: sub(tag),
                name: name.clone(),
                value: sub(value),
            },
            Self::Descendant(outer, inner) => Self::Descendant(
                Box::new(outer.for_field(field_id)),
                Box::new(inner.for_field(field_id)),
            ),
        }
    }

    /// Render as a CSS selector string
    #[must_use]
    pub fn to_css(&self) -> String {
        match self {
            Self::TestId(id) => format!("[{TEST_ID_ATTR}={id:?}]"),
            Self::TestIdContains(id) => format!("[{TEST_ID_ATTR}*={id:?}]"),
            Self::TestIdSuffix(id) => format!("[{TEST_ID_ATTR}$={id:?}]"),
            Self::Class(c) => format!(".{c}"),
            Self::Tag(t) => t.clone(),
            Self::TagWithClass { tag, class } => format!("{tag}.{class}"),
            Self::Attr { tag, name, value } => format!("{tag}[{name}={value:?}]"),
            Self::AttrContains { tag, name, value } => format!("{tag}[{name}*={value:?}]"),
            Self::Descendant(outer, inner) => format!("{} {}", outer.to_css(), inner.to_css()),
            Self::Css(s) => s.clone(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}
