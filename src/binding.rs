//! Reactive bindings.
//!
//! A [`Binding`] couples a domain stream to a rendered result: `map`
//! projects each emission, an optional `initial` value stands in before
//! the first emission, an optional `transform` post-processes every
//! projected value (initial included), and `on_resolved` observes each
//! application after it lands in the tree.
//!
//! Delivery pipeline per value:
//!
//! ```text
//! emission -> map -> transform -> apply -> on_resolved
//! initial  ->        transform -> apply -> on_resolved   (domain_data: None)
//! ```

use std::rc::Rc;

use crate::applier;
use crate::description::NodeDescription;
use crate::lifecycle::LiveNode;
use crate::render;
use crate::source::{Source, Subscription};
use crate::types::ResolvedItem;

pub struct Binding<TDomain, TResult> {
    source: Rc<dyn Source<TDomain>>,
    map: Rc<dyn Fn(&TDomain) -> TResult>,
    initial: Option<TResult>,
    transform: Option<Rc<dyn Fn(TResult) -> TResult>>,
    on_resolved: Option<Rc<dyn Fn(&ResolvedItem<TDomain>)>>,
}

impl<TDomain: 'static, TResult: 'static> Binding<TDomain, TResult> {
    pub fn new(
        source: impl Source<TDomain> + 'static,
        map: impl Fn(&TDomain) -> TResult + 'static,
    ) -> Self {
        Self {
            source: Rc::new(source),
            map: Rc::new(map),
            initial: None,
            transform: None,
            on_resolved: None,
        }
    }

    /// Value applied at connect time, before the first emission.
    pub fn initial(mut self, value: TResult) -> Self {
        self.initial = Some(value);
        self
    }

    /// Post-process every delivered value, the initial one included.
    pub fn transform(mut self, transform: impl Fn(TResult) -> TResult + 'static) -> Self {
        self.transform = Some(Rc::new(transform));
        self
    }

    /// Observe each application once it has landed in the live tree.
    pub fn on_resolved(mut self, callback: impl Fn(&ResolvedItem<TDomain>) + 'static) -> Self {
        self.on_resolved = Some(Rc::new(callback));
        self
    }

    /// Wire the binding: deliver `initial` (if any), then subscribe.
    ///
    /// `apply` lands one value in the tree and returns the node it
    /// resolved to, or `None` when the target is gone and the delivery
    /// must be dropped silently.
    pub(crate) fn connect(
        self,
        mut apply: impl FnMut(TResult) -> Option<LiveNode> + 'static,
    ) -> Subscription {
        let Binding { source, map, initial, transform, on_resolved } = self;

        let mut deliver = move |result: TResult, domain_data: Option<TDomain>| {
            let result = match &transform {
                Some(transform) => transform(result),
                None => result,
            };
            if let Some(node) = apply(result) {
                if let Some(on_resolved) = &on_resolved {
                    on_resolved(&ResolvedItem { domain_data, node });
                }
            }
        };

        if let Some(initial) = initial {
            deliver(initial, None);
        }

        source.subscribe(Box::new(move |domain: TDomain| {
            let result = map(&domain);
            deliver(result, Some(domain));
        }))
    }
}

/// Attribute wiring: each delivered value goes through the applier.
pub(crate) fn connect_attr<TDomain: 'static>(
    binding: Binding<TDomain, crate::types::AttrValue>,
    node: &LiveNode,
    name: String,
) -> Subscription {
    let weak = node.downgrade();
    binding.connect(move |value| {
        let node = weak.upgrade()?;
        applier::apply(node.backend().as_ref(), &name, &value);
        Some(node)
    })
}

/// Bound-child wiring: the parent's child slot at `slot` always holds
/// either the bound child or a placeholder. Slots are stable because
/// entry-list children never insert or remove, only replace in place.
pub(crate) fn connect_child<TDomain: 'static>(
    binding: Binding<TDomain, Option<NodeDescription>>,
    parent: &LiveNode,
    slot: usize,
) -> Subscription {
    parent.adopt_child_at(slot, LiveNode::placeholder(parent.registry()));

    let weak = parent.downgrade();
    binding.connect(move |desc| {
        let parent = weak.upgrade()?;
        let next = match desc {
            Some(desc) => render::render(desc, parent.registry()),
            None => LiveNode::placeholder(parent.registry()),
        };
        parent.replace_child_at(slot, next.clone());
        Some(next)
    })
}
