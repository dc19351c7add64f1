//! Live node lifecycle.
//!
//! A [`LiveNode`] wraps a realized backend node and owns everything that
//! must die with it: active subscriptions, disconnect hooks, and child
//! nodes. Two states:
//!
//! ```text
//! Detached --attach--> Attached --detach--> Detached (consumed)
//! ```
//!
//! Attach wires the node's description (static attributes, reactive
//! attributes, children, attach hook). Detach tears down in strict reverse
//! order: subscriptions (newest first), then disconnect hooks (newest
//! first), then the detach hook, then children. Both are idempotent; a
//! second attach after teardown is a logged no-op.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::applier;
use crate::backend::{BackendNode, NodeRegistry};
use crate::description::{AttrSpec, ChildEntry, ChildrenSpec, NodeDescription};
use crate::render;
use crate::source::Subscription;

#[derive(Clone, Copy, PartialEq)]
enum NodeState {
    Detached,
    Attached,
}

struct NodeInner {
    kind: String,
    backend: Rc<dyn BackendNode>,
    registry: Rc<NodeRegistry>,
    state: Cell<NodeState>,
    /// Description awaiting attach. `None` after attach has consumed it.
    pending: RefCell<Option<NodeDescription>>,
    subscriptions: RefCell<Vec<Subscription>>,
    disconnect_hooks: RefCell<Vec<Box<dyn FnOnce()>>>,
    children: RefCell<Vec<LiveNode>>,
    on_detach: RefCell<Option<Box<dyn FnOnce(&LiveNode)>>>,
}

/// A realized node in the live tree.
///
/// Cheap to clone; clones share the same underlying node.
#[derive(Clone)]
pub struct LiveNode {
    inner: Rc<NodeInner>,
}

/// Non-owning handle, used by binding callbacks so a pending emission
/// never keeps a discarded subtree alive.
#[derive(Clone)]
pub struct WeakLiveNode {
    inner: Weak<NodeInner>,
}

impl WeakLiveNode {
    pub fn upgrade(&self) -> Option<LiveNode> {
        self.inner.upgrade().map(|inner| LiveNode { inner })
    }
}

impl LiveNode {
    /// Realize `desc` against `registry`. Panics if the kind is unknown.
    pub(crate) fn realize(desc: NodeDescription, registry: &Rc<NodeRegistry>) -> LiveNode {
        let backend = registry.realize(desc.kind());
        LiveNode {
            inner: Rc::new(NodeInner {
                kind: desc.kind().to_string(),
                backend,
                registry: registry.clone(),
                state: Cell::new(NodeState::Detached),
                pending: RefCell::new(Some(desc)),
                subscriptions: RefCell::new(Vec::new()),
                disconnect_hooks: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
                on_detach: RefCell::new(None),
            }),
        }
    }

    /// Realize the reserved placeholder node (empty description).
    pub(crate) fn placeholder(registry: &Rc<NodeRegistry>) -> LiveNode {
        let backend = registry.realize_placeholder();
        LiveNode {
            inner: Rc::new(NodeInner {
                kind: crate::backend::PLACEHOLDER_KIND.to_string(),
                backend,
                registry: registry.clone(),
                state: Cell::new(NodeState::Detached),
                pending: RefCell::new(Some(NodeDescription::new(
                    crate::backend::PLACEHOLDER_KIND,
                ))),
                subscriptions: RefCell::new(Vec::new()),
                disconnect_hooks: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
                on_detach: RefCell::new(None),
            }),
        }
    }

    // =========================================================================
    // Attach / Detach
    // =========================================================================

    /// Wire the node's description and mark it attached.
    pub fn attach(&self) {
        if self.inner.state.get() == NodeState::Attached {
            return;
        }
        let Some(desc) = self.inner.pending.borrow_mut().take() else {
            tracing::warn!(kind = %self.inner.kind, "attach on a torn-down node, ignoring");
            return;
        };
        self.inner.state.set(NodeState::Attached);

        let (attrs, children, on_attach, on_detach) = desc.into_parts();
        *self.inner.on_detach.borrow_mut() = on_detach;

        // Static attributes first, then reactive connections.
        let mut reactive = Vec::new();
        for (name, attr) in attrs {
            match attr {
                AttrSpec::Static(value) => {
                    applier::apply(self.inner.backend.as_ref(), &name, &value);
                }
                AttrSpec::Reactive(connect) => reactive.push(connect),
            }
        }
        for connect in reactive {
            let subscription = connect(self);
            self.own_subscription(subscription);
        }

        match children {
            ChildrenSpec::Entries(entries) => {
                // Entries claim slots in declaration order; bound entries
                // start out holding their placeholder.
                for (index, entry) in entries.into_iter().enumerate() {
                    match entry {
                        ChildEntry::Node(child_desc) => {
                            let child = render::render(child_desc, &self.inner.registry);
                            self.adopt_child_at(index, child);
                        }
                        ChildEntry::Bound(connect) => {
                            let subscription = connect(self, index);
                            self.own_subscription(subscription);
                        }
                    }
                }
            }
            ChildrenSpec::List(connect) => {
                let subscription = connect(self);
                self.own_subscription(subscription);
            }
        }

        if let Some(on_attach) = on_attach {
            on_attach(self);
        }
    }

    /// Tear the node down. Safe to call more than once.
    pub fn detach(&self) {
        if self.inner.state.get() != NodeState::Attached {
            return;
        }
        self.inner.state.set(NodeState::Detached);

        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        for subscription in subscriptions.into_iter().rev() {
            subscription.cancel();
        }

        let hooks = std::mem::take(&mut *self.inner.disconnect_hooks.borrow_mut());
        for hook in hooks.into_iter().rev() {
            hook();
        }

        if let Some(on_detach) = self.inner.on_detach.borrow_mut().take() {
            on_detach(self);
        }

        let children = self.inner.children.borrow().clone();
        for child in children {
            child.detach();
        }
    }

    // =========================================================================
    // Ownership Surface
    // =========================================================================

    /// Tie a subscription to this node's lifetime. On a node that is not
    /// attached the subscription is cancelled on the spot.
    pub fn own_subscription(&self, subscription: Subscription) {
        if self.inner.state.get() != NodeState::Attached {
            tracing::warn!(
                kind = %self.inner.kind,
                "subscription handed to a detached node, cancelling immediately"
            );
            subscription.cancel();
            return;
        }
        self.inner.subscriptions.borrow_mut().push(subscription);
    }

    /// Register a hook to run at teardown (reverse registration order).
    pub fn register_disconnect_hook(&self, hook: impl FnOnce() + 'static) {
        if self.inner.state.get() != NodeState::Attached {
            tracing::warn!(
                kind = %self.inner.kind,
                "disconnect hook registered on a detached node, running immediately"
            );
            hook();
            return;
        }
        self.inner.disconnect_hooks.borrow_mut().push(Box::new(hook));
    }

    // =========================================================================
    // Child Management
    // =========================================================================

    /// Insert `child` at `index` (backend and engine lists stay mirrored)
    /// and attach it.
    pub(crate) fn adopt_child_at(&self, index: usize, child: LiveNode) {
        self.inner.backend.insert_child(index, child.inner.backend.clone());
        self.inner.children.borrow_mut().insert(index, child.clone());
        child.attach();
    }

    /// Remove and tear down the child at `index`.
    pub(crate) fn drop_child_at(&self, index: usize) -> LiveNode {
        let child = self.inner.children.borrow_mut().remove(index);
        self.inner.backend.remove_child(index);
        child.detach();
        child
    }

    /// Swap the child at `index` for `child`, tearing down the previous
    /// occupant.
    pub(crate) fn replace_child_at(&self, index: usize, child: LiveNode) {
        let previous = {
            let mut children = self.inner.children.borrow_mut();
            std::mem::replace(&mut children[index], child.clone())
        };
        self.inner.backend.replace_child(index, child.inner.backend.clone());
        previous.detach();
        child.attach();
    }

    /// Drop every child, last first.
    pub(crate) fn clear_children(&self) {
        while self.child_count() > 0 {
            let index = self.child_count() - 1;
            self.drop_child_at(index);
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn kind(&self) -> &str {
        &self.inner.kind
    }

    pub fn backend(&self) -> Rc<dyn BackendNode> {
        self.inner.backend.clone()
    }

    pub fn registry(&self) -> &Rc<NodeRegistry> {
        &self.inner.registry
    }

    pub fn is_attached(&self) -> bool {
        self.inner.state.get() == NodeState::Attached
    }

    pub fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    pub fn child(&self, index: usize) -> Option<LiveNode> {
        self.inner.children.borrow().get(index).cloned()
    }

    pub fn ptr_eq(&self, other: &LiveNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakLiveNode {
        WeakLiveNode { inner: Rc::downgrade(&self.inner) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{self, MemoryNode};
    use crate::types::AttrValue;
    use std::cell::RefCell;

    fn registry() -> Rc<NodeRegistry> {
        Rc::new(memory::registry(&["panel", "label"]))
    }

    #[test]
    fn test_attach_applies_static_attributes_and_children() {
        let registry = registry();
        let desc = NodeDescription::new("panel")
            .attr("title", "hello")
            .child(NodeDescription::new("label").attr("text", "a"))
            .child(NodeDescription::new("label").attr("text", "b"));
        let node = LiveNode::realize(desc, &registry);

        assert!(!node.is_attached());
        assert_eq!(node.child_count(), 0, "wiring is deferred to attach");

        node.attach();
        assert!(node.is_attached());
        let backend = MemoryNode::of(&node);
        assert_eq!(backend.property("title"), Some(AttrValue::Text("hello".to_string())));
        assert_eq!(backend.child_kinds(), vec!["label", "label"]);
        assert!(node.child(0).unwrap().is_attached(), "static children attach recursively");
    }

    #[test]
    fn test_teardown_reverse_order() {
        let registry = registry();
        let order = Rc::new(RefCell::new(Vec::new()));

        let node = LiveNode::realize(NodeDescription::new("panel"), &registry);
        node.attach();

        for label in ["sub1", "sub2"] {
            let order_clone = order.clone();
            node.own_subscription(Subscription::new(move || {
                order_clone.borrow_mut().push(label);
            }));
        }
        for label in ["hook1", "hook2"] {
            let order_clone = order.clone();
            node.register_disconnect_hook(move || {
                order_clone.borrow_mut().push(label);
            });
        }

        node.detach();
        assert_eq!(
            *order.borrow(),
            vec!["sub2", "sub1", "hook2", "hook1"],
            "subscriptions reverse, then hooks reverse"
        );
    }

    #[test]
    fn test_detach_is_idempotent_and_reattach_is_a_noop() {
        let registry = registry();
        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();

        let node = LiveNode::realize(NodeDescription::new("panel"), &registry);
        node.attach();
        node.register_disconnect_hook(move || {
            *count_clone.borrow_mut() += 1;
        });

        node.detach();
        node.detach();
        assert_eq!(*count.borrow(), 1, "hooks run exactly once");

        node.attach();
        assert!(!node.is_attached(), "a torn-down node cannot come back");
    }

    #[test]
    fn test_attach_and_detach_hooks_fire() {
        let registry = registry();
        let events = Rc::new(RefCell::new(Vec::new()));
        let attach_events = events.clone();
        let detach_events = events.clone();

        let desc = NodeDescription::new("panel")
            .on_attach(move |node| {
                attach_events.borrow_mut().push(format!("attach:{}", node.kind()));
            })
            .on_detach(move |node| {
                detach_events.borrow_mut().push(format!("detach:{}", node.kind()));
            });
        let node = LiveNode::realize(desc, &registry);
        node.attach();
        node.detach();
        assert_eq!(*events.borrow(), vec!["attach:panel", "detach:panel"]);
    }

    #[test]
    fn test_subscription_on_detached_node_cancels_immediately() {
        let registry = registry();
        let cancelled = Rc::new(RefCell::new(false));
        let cancelled_clone = cancelled.clone();

        let node = LiveNode::realize(NodeDescription::new("panel"), &registry);
        node.attach();
        node.detach();
        node.own_subscription(Subscription::new(move || {
            *cancelled_clone.borrow_mut() = true;
        }));
        assert!(*cancelled.borrow(), "no dangling subscriptions on dead nodes");
    }

    #[test]
    fn test_detach_cascades_to_children() {
        let registry = registry();
        let desc = NodeDescription::new("panel")
            .child(NodeDescription::new("label"));
        let node = LiveNode::realize(desc, &registry);
        node.attach();
        let child = node.child(0).unwrap();
        assert!(child.is_attached());

        node.detach();
        assert!(!child.is_attached(), "teardown reaches every descendant");
    }
}
