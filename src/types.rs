//! Core value types shared across the engine.
//!
//! - [`AttrValue`] - closed union of attribute values the applier understands
//! - [`ResolvedItem`] - a rendered node paired with the domain value that produced it
//! - [`RenderingUpdate`] - per-pass reconciliation report (added/updated/removed)

use crate::lifecycle::LiveNode;

// =============================================================================
// Attribute Values
// =============================================================================

/// Value of a node attribute.
///
/// Scalar variants map straight onto backend properties. The two composite
/// variants carry ordered key/value pairs so repeated applications stay
/// deterministic:
/// - [`AttrValue::Style`] - inline style declarations
/// - [`AttrValue::Bag`] - a generic attribute bag (keys kebab-cased on apply)
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Style(Vec<(String, String)>),
    Bag(Vec<(String, String)>),
}

impl AttrValue {
    /// Human-readable variant name, used in mismatch warnings.
    pub(crate) fn shape(&self) -> &'static str {
        match self {
            AttrValue::Text(_) => "text",
            AttrValue::Number(_) => "number",
            AttrValue::Flag(_) => "flag",
            AttrValue::Style(_) => "style",
            AttrValue::Bag(_) => "bag",
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Number(value as f64)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

// =============================================================================
// Resolution Reports
// =============================================================================

/// A live node together with the domain value it was rendered from.
///
/// `domain_data` is `None` when the node did not come from a stream
/// emission (initial values, placeholders).
#[derive(Clone)]
pub struct ResolvedItem<TDomain> {
    pub domain_data: Option<TDomain>,
    pub node: LiveNode,
}

/// What one reconciliation pass did to a parent's child list.
///
/// `updated` is always empty: matched items are left untouched rather
/// than patched in place. The bucket stays in the report so observers
/// written against the full shape keep compiling.
pub struct RenderingUpdate<TDomain> {
    pub added: Vec<ResolvedItem<TDomain>>,
    pub updated: Vec<ResolvedItem<TDomain>>,
    pub removed: Vec<ResolvedItem<TDomain>>,
}

impl<TDomain> RenderingUpdate<TDomain> {
    pub(crate) fn new(
        added: Vec<ResolvedItem<TDomain>>,
        removed: Vec<ResolvedItem<TDomain>>,
    ) -> Self {
        Self { added, updated: Vec::new(), removed }
    }
}
