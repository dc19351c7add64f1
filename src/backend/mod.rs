//! Node-realization boundary.
//!
//! The engine drives host nodes only through [`BackendNode`], and obtains
//! them only through a [`NodeRegistry`] injected at render time. Nothing in
//! here is global: two trees can run against two registries side by side.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::types::AttrValue;

pub mod memory;

// =============================================================================
// Backend Node
// =============================================================================

/// A live host node the engine can mutate.
///
/// Child indices are the engine's source of truth: `insert_child`,
/// `replace_child` and `remove_child` are index-addressed and the engine
/// keeps its own child list mirroring the backend's.
pub trait BackendNode {
    /// Set a scalar property by name (passthrough attributes).
    fn set_property(&self, name: &str, value: &AttrValue);

    /// Set the aggregate class string.
    fn set_class(&self, class: &str);

    /// Set one inline style declaration (name already kebab-cased).
    fn set_style_property(&self, name: &str, value: &str);

    /// Set one generic attribute (name already kebab-cased).
    fn set_attribute(&self, name: &str, value: &str);

    fn insert_child(&self, index: usize, child: Rc<dyn BackendNode>);
    fn replace_child(&self, index: usize, child: Rc<dyn BackendNode>);
    fn remove_child(&self, index: usize);

    /// Assign an advisory display-order hint to the child at `child_index`.
    /// Hints never move the child physically.
    fn set_order_hint(&self, child_index: usize, hint: usize);

    /// Whether this node's layout honors order hints. Reconciliation warns
    /// (and still assigns hints) when ordering is requested on a node that
    /// does not.
    fn honors_order_hints(&self) -> bool {
        false
    }

    /// Downcast support for backends that expose inspection APIs.
    fn as_any(self: Rc<Self>) -> Rc<dyn Any>;
}

// =============================================================================
// Node Registry
// =============================================================================

/// Reserved kind for the single-child binder's placeholder node.
pub const PLACEHOLDER_KIND: &str = "placeholder";

/// Constructor for a backend node; receives the requested kind so one
/// constructor can serve a family of kinds.
pub type NodeConstructor = Rc<dyn Fn(&str) -> Rc<dyn BackendNode>>;

#[derive(Debug, Error)]
pub enum RealizeError {
    #[error("no constructor registered for node kind `{kind}`")]
    UnknownKind { kind: String },
}

/// Injectable kind -> constructor table.
///
/// Every registry carries a placeholder constructor from birth, so the
/// single-child binder can always realize its anchor node.
pub struct NodeRegistry {
    constructors: HashMap<String, NodeConstructor>,
    placeholder: NodeConstructor,
}

impl NodeRegistry {
    pub fn new(placeholder: NodeConstructor) -> Self {
        Self { constructors: HashMap::new(), placeholder }
    }

    /// Register (or override) the constructor for `kind`.
    pub fn register(&mut self, kind: impl Into<String>, constructor: NodeConstructor) {
        self.constructors.insert(kind.into(), constructor);
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        kind == PLACEHOLDER_KIND || self.constructors.contains_key(kind)
    }

    /// Realize a backend node for `kind`, or report the missing constructor.
    pub fn try_realize(&self, kind: &str) -> Result<Rc<dyn BackendNode>, RealizeError> {
        if kind == PLACEHOLDER_KIND {
            return Ok((self.placeholder)(kind));
        }
        match self.constructors.get(kind) {
            Some(constructor) => Ok(constructor(kind)),
            None => Err(RealizeError::UnknownKind { kind: kind.to_string() }),
        }
    }

    /// Realize a backend node for `kind`.
    ///
    /// # Panics
    /// Panics if `kind` has no registered constructor. An unknown kind in a
    /// description is a programming error, surfaced at the requesting call.
    pub fn realize(&self, kind: &str) -> Rc<dyn BackendNode> {
        match self.try_realize(kind) {
            Ok(node) => node,
            Err(error) => panic!("{error}"),
        }
    }

    /// Realize the reserved placeholder node.
    pub fn realize_placeholder(&self) -> Rc<dyn BackendNode> {
        (self.placeholder)(PLACEHOLDER_KIND)
    }
}
