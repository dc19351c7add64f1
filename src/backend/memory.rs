//! In-memory backend.
//!
//! Records every mutation the engine performs so tests can inspect the
//! resulting tree: properties, class, styles, attribute bag, children and
//! order hints. Also the reference for what a real backend must implement.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::backend::{BackendNode, NodeRegistry};
use crate::lifecycle::LiveNode;
use crate::types::AttrValue;

/// A host node held entirely in memory.
pub struct MemoryNode {
    kind: String,
    properties: RefCell<HashMap<String, AttrValue>>,
    class: RefCell<Option<String>>,
    styles: RefCell<HashMap<String, String>>,
    attributes: RefCell<HashMap<String, String>>,
    children: RefCell<Vec<Rc<MemoryNode>>>,
    order_hint: Cell<Option<usize>>,
    ordered_layout: Cell<bool>,
}

impl MemoryNode {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            properties: RefCell::new(HashMap::new()),
            class: RefCell::new(None),
            styles: RefCell::new(HashMap::new()),
            attributes: RefCell::new(HashMap::new()),
            children: RefCell::new(Vec::new()),
            order_hint: Cell::new(None),
            ordered_layout: Cell::new(true),
        }
    }

    /// Downcast the backend of a live node. Panics if the node was not
    /// realized by this backend (test helper).
    pub fn of(node: &LiveNode) -> Rc<MemoryNode> {
        node.backend()
            .as_any()
            .downcast::<MemoryNode>()
            .unwrap_or_else(|_| panic!("live node `{}` has a non-memory backend", node.kind()))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn property(&self, name: &str) -> Option<AttrValue> {
        self.properties.borrow().get(name).cloned()
    }

    pub fn class(&self) -> Option<String> {
        self.class.borrow().clone()
    }

    pub fn style(&self, name: &str) -> Option<String> {
        self.styles.borrow().get(name).cloned()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    pub fn child(&self, index: usize) -> Option<Rc<MemoryNode>> {
        self.children.borrow().get(index).cloned()
    }

    /// Kinds of all children, in tree order.
    pub fn child_kinds(&self) -> Vec<String> {
        self.children.borrow().iter().map(|child| child.kind.clone()).collect()
    }

    pub fn order_hint(&self) -> Option<usize> {
        self.order_hint.get()
    }

    /// Simulate a layout that ignores order hints.
    pub fn set_ordered_layout(&self, ordered: bool) {
        self.ordered_layout.set(ordered);
    }

    fn downcast_child(child: Rc<dyn BackendNode>) -> Rc<MemoryNode> {
        child
            .as_any()
            .downcast::<MemoryNode>()
            .unwrap_or_else(|_| panic!("memory backend received a foreign child node"))
    }
}

impl BackendNode for MemoryNode {
    fn set_property(&self, name: &str, value: &AttrValue) {
        self.properties.borrow_mut().insert(name.to_string(), value.clone());
    }

    fn set_class(&self, class: &str) {
        *self.class.borrow_mut() = Some(class.to_string());
    }

    fn set_style_property(&self, name: &str, value: &str) {
        self.styles.borrow_mut().insert(name.to_string(), value.to_string());
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.attributes.borrow_mut().insert(name.to_string(), value.to_string());
    }

    fn insert_child(&self, index: usize, child: Rc<dyn BackendNode>) {
        self.children.borrow_mut().insert(index, Self::downcast_child(child));
    }

    fn replace_child(&self, index: usize, child: Rc<dyn BackendNode>) {
        self.children.borrow_mut()[index] = Self::downcast_child(child);
    }

    fn remove_child(&self, index: usize) {
        self.children.borrow_mut().remove(index);
    }

    fn set_order_hint(&self, child_index: usize, hint: usize) {
        let children = self.children.borrow();
        if let Some(child) = children.get(child_index) {
            child.order_hint.set(Some(hint));
        }
    }

    fn honors_order_hints(&self) -> bool {
        self.ordered_layout.get()
    }

    fn as_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Build a registry serving the given kinds, all backed by [`MemoryNode`].
pub fn registry(kinds: &[&str]) -> NodeRegistry {
    let constructor: Rc<dyn Fn(&str) -> Rc<dyn BackendNode>> =
        Rc::new(|kind: &str| Rc::new(MemoryNode::new(kind)) as Rc<dyn BackendNode>);
    let mut registry = NodeRegistry::new(constructor.clone());
    for kind in kinds {
        registry.register(*kind, constructor.clone());
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_scalar_mutations() {
        let node = MemoryNode::new("panel");
        node.set_property("title", &AttrValue::from("hello"));
        node.set_class("wide tall");
        node.set_style_property("background-color", "teal");
        node.set_attribute("data-id", "42");

        assert_eq!(node.property("title"), Some(AttrValue::Text("hello".to_string())));
        assert_eq!(node.class(), Some("wide tall".to_string()));
        assert_eq!(node.style("background-color"), Some("teal".to_string()));
        assert_eq!(node.attribute("data-id"), Some("42".to_string()));
    }

    #[test]
    fn test_index_addressed_children() {
        let parent = MemoryNode::new("panel");
        parent.insert_child(0, Rc::new(MemoryNode::new("a")));
        parent.insert_child(1, Rc::new(MemoryNode::new("c")));
        parent.insert_child(1, Rc::new(MemoryNode::new("b")));
        assert_eq!(parent.child_kinds(), vec!["a", "b", "c"]);

        parent.replace_child(1, Rc::new(MemoryNode::new("x")));
        assert_eq!(parent.child_kinds(), vec!["a", "x", "c"]);

        parent.remove_child(0);
        assert_eq!(parent.child_kinds(), vec!["x", "c"]);
    }

    #[test]
    fn test_order_hints_do_not_move_children() {
        let parent = MemoryNode::new("panel");
        parent.insert_child(0, Rc::new(MemoryNode::new("a")));
        parent.insert_child(1, Rc::new(MemoryNode::new("b")));

        parent.set_order_hint(0, 1);
        parent.set_order_hint(1, 0);

        assert_eq!(parent.child_kinds(), vec!["a", "b"], "hints never reorder");
        assert_eq!(parent.child(0).unwrap().order_hint(), Some(1));
        assert_eq!(parent.child(1).unwrap().order_hint(), Some(0));
    }

    #[test]
    fn test_registry_serves_all_kinds() {
        let registry = registry(&["panel", "label"]);
        assert!(registry.is_registered("panel"));
        assert!(registry.is_registered("label"));
        assert!(!registry.is_registered("dialog"));
    }
}
