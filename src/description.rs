//! Declarative node descriptions.
//!
//! A [`NodeDescription`] is the immutable input to the renderer: a kind
//! identifier, an ordered attribute list (static values or reactive
//! connectors), one children mechanism, and optional attach/detach hooks.
//! It is consumed at attach time.
//!
//! Children use one of two mechanisms per node:
//! - an entry list mixing static children ([`NodeDescription::child`])
//!   and individually bound children ([`NodeDescription::child_binding`]),
//!   each bound entry anchored to its own placeholder slot;
//! - a reconciled list ([`NodeDescription::children`]).
//!
//! Mixing mechanisms is a configuration error: the conflicting call is
//! logged and ignored, the node keeps its existing children setup.

use crate::binding::{self, Binding};
use crate::lifecycle::LiveNode;
use crate::reconcile::{self, ListPolicy};
use crate::source::{Source, Subscription};
use crate::types::AttrValue;

/// Deferred wiring installed at attach; returns the subscription the
/// owning node must hold.
pub(crate) type Connector = Box<dyn FnOnce(&LiveNode) -> Subscription>;

/// Deferred wiring for a bound child entry; receives the slot index the
/// entry occupies in the parent's child list.
pub(crate) type SlotConnector = Box<dyn FnOnce(&LiveNode, usize) -> Subscription>;

pub(crate) enum AttrSpec {
    Static(AttrValue),
    Reactive(Connector),
}

/// One position in an entry-list children setup.
pub(crate) enum ChildEntry {
    Node(NodeDescription),
    Bound(SlotConnector),
}

pub(crate) enum ChildrenSpec {
    Entries(Vec<ChildEntry>),
    List(Connector),
}

impl ChildrenSpec {
    fn mechanism(&self) -> &'static str {
        match self {
            ChildrenSpec::Entries(_) => "entries",
            ChildrenSpec::List(_) => "list",
        }
    }
}

pub struct NodeDescription {
    kind: String,
    attrs: Vec<(String, AttrSpec)>,
    children: ChildrenSpec,
    on_attach: Option<Box<dyn FnOnce(&LiveNode)>>,
    on_detach: Option<Box<dyn FnOnce(&LiveNode)>>,
}

impl NodeDescription {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: Vec::new(),
            children: ChildrenSpec::Entries(Vec::new()),
            on_attach: None,
            on_detach: None,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Static attribute, applied once at attach.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.push((name.into(), AttrSpec::Static(value.into())));
        self
    }

    /// Stream-driven attribute: each emitted value is applied as-is.
    pub fn attr_stream(
        self,
        name: impl Into<String>,
        source: impl Source<AttrValue> + 'static,
    ) -> Self {
        self.attr_binding(name, Binding::new(source, |value: &AttrValue| value.clone()))
    }

    /// Binding-driven attribute: domain emissions are mapped (and
    /// optionally transformed) into attribute values.
    pub fn attr_binding<TDomain: 'static>(
        mut self,
        name: impl Into<String>,
        binding: Binding<TDomain, AttrValue>,
    ) -> Self {
        let name = name.into();
        let attr_name = name.clone();
        self.attrs.push((
            name,
            AttrSpec::Reactive(Box::new(move |node: &LiveNode| {
                binding::connect_attr(binding, node, attr_name)
            })),
        ));
        self
    }

    // =========================================================================
    // Children
    // =========================================================================

    /// Append a static child entry.
    pub fn child(mut self, child: NodeDescription) -> Self {
        match &mut self.children {
            ChildrenSpec::Entries(entries) => entries.push(ChildEntry::Node(child)),
            other => {
                tracing::error!(
                    kind = %self.kind,
                    existing = other.mechanism(),
                    "static child added to a node with reconciled children, ignoring"
                );
            }
        }
        self
    }

    /// Append a bound child entry: the slot it occupies follows a stream
    /// of optional descriptions, with a placeholder standing in while no
    /// child is present. Bound entries mix freely with static siblings.
    pub fn child_binding<TDomain: 'static>(
        mut self,
        binding: Binding<TDomain, Option<NodeDescription>>,
    ) -> Self {
        match &mut self.children {
            ChildrenSpec::Entries(entries) => {
                entries.push(ChildEntry::Bound(Box::new(
                    move |node: &LiveNode, slot: usize| binding::connect_child(binding, node, slot),
                )));
            }
            other => {
                tracing::error!(
                    kind = %self.kind,
                    existing = other.mechanism(),
                    "bound child added to a node with reconciled children, ignoring"
                );
            }
        }
        self
    }

    /// Reconcile the node's child list under a [`ListPolicy`].
    pub fn children<TDomain: Clone + 'static>(
        mut self,
        policy: impl Into<ListPolicy<TDomain>>,
    ) -> Self {
        if !self.children_slot_free() {
            return self;
        }
        let policy = policy.into();
        self.children = ChildrenSpec::List(Box::new(move |node: &LiveNode| {
            reconcile::connect(policy, node)
        }));
        self
    }

    fn children_slot_free(&mut self) -> bool {
        match &self.children {
            ChildrenSpec::Entries(entries) if entries.is_empty() => true,
            other => {
                tracing::error!(
                    kind = %self.kind,
                    existing = other.mechanism(),
                    "children already configured, ignoring the new reconciled setup"
                );
                false
            }
        }
    }

    // =========================================================================
    // Hooks
    // =========================================================================

    pub fn on_attach(mut self, hook: impl FnOnce(&LiveNode) + 'static) -> Self {
        self.on_attach = Some(Box::new(hook));
        self
    }

    pub fn on_detach(mut self, hook: impl FnOnce(&LiveNode) + 'static) -> Self {
        self.on_detach = Some(Box::new(hook));
        self
    }

    #[allow(clippy::type_complexity)]
    pub(crate) fn into_parts(
        self,
    ) -> (
        Vec<(String, AttrSpec)>,
        ChildrenSpec,
        Option<Box<dyn FnOnce(&LiveNode)>>,
        Option<Box<dyn FnOnce(&LiveNode)>>,
    ) {
        (self.attrs, self.children, self.on_attach, self.on_detach)
    }
}
