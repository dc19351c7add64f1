//! List reconciliation.
//!
//! Keeps a parent's child list synchronized with a stream of domain
//! collections under one of three policies:
//!
//! - **replace** - every emission is the authoritative description set;
//!   all current children are swapped out wholesale.
//! - **append** - every emission is a delta; items are rendered and
//!   appended, nothing is ever removed.
//! - **sync** - every emission is the authoritative domain set; unmatched
//!   new items are appended, unmatched tracked items are removed, matched
//!   items are left untouched.
//!
//! An optional `order` comparator assigns zero-based display-order hints
//! after every pass. Hints are advisory: children are never physically
//! moved, and a parent whose layout ignores hints triggers a one-time
//! warning.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::Rc;

use crate::binding::Binding;
use crate::description::NodeDescription;
use crate::lifecycle::{LiveNode, WeakLiveNode};
use crate::render;
use crate::source::{Source, Subscription};
use crate::types::{RenderingUpdate, ResolvedItem};

type ItemToNode<TDomain> = Rc<dyn Fn(&TDomain) -> NodeDescription>;
type OrderFn<TDomain> = Rc<dyn Fn(&TDomain, &TDomain) -> Ordering>;
type CompareFn<TDomain> = Rc<dyn Fn(&TDomain, &TDomain) -> bool>;
type UpdateFn<TDomain> = Rc<dyn Fn(&LiveNode, &RenderingUpdate<TDomain>)>;

// =============================================================================
// Policies
// =============================================================================

/// How a reconciled child list interprets emissions.
pub enum ListPolicy<TDomain> {
    Replace(Binding<TDomain, Vec<NodeDescription>>),
    Append(AppendList<TDomain>),
    Sync(SyncList<TDomain>),
}

impl<TDomain: 'static> ListPolicy<TDomain> {
    /// Wholesale replacement driven by a binding (supports `initial`,
    /// `transform` and `on_resolved`, which receives the parent).
    pub fn replace(binding: Binding<TDomain, Vec<NodeDescription>>) -> Self {
        ListPolicy::Replace(binding)
    }
}

/// Append-only policy: emissions are deltas.
pub struct AppendList<TDomain> {
    source: Rc<dyn Source<Vec<TDomain>>>,
    item_to_node: ItemToNode<TDomain>,
    order: Option<OrderFn<TDomain>>,
    on_update: Option<UpdateFn<TDomain>>,
}

impl<TDomain: 'static> AppendList<TDomain> {
    pub fn new(
        source: impl Source<Vec<TDomain>> + 'static,
        item_to_node: impl Fn(&TDomain) -> NodeDescription + 'static,
    ) -> Self {
        Self {
            source: Rc::new(source),
            item_to_node: Rc::new(item_to_node),
            order: None,
            on_update: None,
        }
    }

    /// Sort comparator for display-order hints.
    pub fn order(mut self, order: impl Fn(&TDomain, &TDomain) -> Ordering + 'static) -> Self {
        self.order = Some(Rc::new(order));
        self
    }

    /// Observe each reconciliation pass.
    pub fn on_update(
        mut self,
        on_update: impl Fn(&LiveNode, &RenderingUpdate<TDomain>) + 'static,
    ) -> Self {
        self.on_update = Some(Rc::new(on_update));
        self
    }
}

/// Set-synchronization policy: emissions are authoritative sets.
pub struct SyncList<TDomain> {
    source: Rc<dyn Source<Vec<TDomain>>>,
    item_to_node: ItemToNode<TDomain>,
    compare: CompareFn<TDomain>,
    order: Option<OrderFn<TDomain>>,
    on_update: Option<UpdateFn<TDomain>>,
}

impl<TDomain: 'static> SyncList<TDomain> {
    /// Matching defaults to value equality.
    pub fn new(
        source: impl Source<Vec<TDomain>> + 'static,
        item_to_node: impl Fn(&TDomain) -> NodeDescription + 'static,
    ) -> Self
    where
        TDomain: PartialEq,
    {
        Self::with_compare(source, item_to_node, |a, b| a == b)
    }

    /// Matching under a custom equivalence.
    pub fn with_compare(
        source: impl Source<Vec<TDomain>> + 'static,
        item_to_node: impl Fn(&TDomain) -> NodeDescription + 'static,
        compare: impl Fn(&TDomain, &TDomain) -> bool + 'static,
    ) -> Self {
        Self {
            source: Rc::new(source),
            item_to_node: Rc::new(item_to_node),
            compare: Rc::new(compare),
            order: None,
            on_update: None,
        }
    }

    pub fn compare(mut self, compare: impl Fn(&TDomain, &TDomain) -> bool + 'static) -> Self {
        self.compare = Rc::new(compare);
        self
    }

    pub fn order(mut self, order: impl Fn(&TDomain, &TDomain) -> Ordering + 'static) -> Self {
        self.order = Some(Rc::new(order));
        self
    }

    pub fn on_update(
        mut self,
        on_update: impl Fn(&LiveNode, &RenderingUpdate<TDomain>) + 'static,
    ) -> Self {
        self.on_update = Some(Rc::new(on_update));
        self
    }
}

impl<TDomain> From<AppendList<TDomain>> for ListPolicy<TDomain> {
    fn from(list: AppendList<TDomain>) -> Self {
        ListPolicy::Append(list)
    }
}

impl<TDomain> From<SyncList<TDomain>> for ListPolicy<TDomain> {
    fn from(list: SyncList<TDomain>) -> Self {
        ListPolicy::Sync(list)
    }
}

// =============================================================================
// Wiring
// =============================================================================

/// Single dispatch point used at attach time.
pub(crate) fn connect<TDomain: Clone + 'static>(
    policy: ListPolicy<TDomain>,
    parent: &LiveNode,
) -> Subscription {
    match policy {
        ListPolicy::Replace(binding) => connect_replace(binding, parent),
        ListPolicy::Append(list) => Tracker::connect(
            list.source,
            list.item_to_node,
            list.order,
            list.on_update,
            DiffMode::Append,
            parent,
        ),
        ListPolicy::Sync(list) => Tracker::connect(
            list.source,
            list.item_to_node,
            list.order,
            list.on_update,
            DiffMode::Sync { compare: list.compare },
            parent,
        ),
    }
}

fn connect_replace<TDomain: 'static>(
    binding: Binding<TDomain, Vec<NodeDescription>>,
    parent: &LiveNode,
) -> Subscription {
    let weak = parent.downgrade();
    binding.connect(move |descs| {
        let parent = weak.upgrade()?;
        parent.clear_children();
        for (index, desc) in descs.into_iter().enumerate() {
            let child = render::render(desc, parent.registry());
            parent.adopt_child_at(index, child);
        }
        Some(parent)
    })
}

// =============================================================================
// Tracked Diffing
// =============================================================================

enum DiffMode<TDomain> {
    Append,
    Sync { compare: CompareFn<TDomain> },
}

/// Shared state behind the append and sync policies: the ordered list of
/// tracked items, mirroring the parent's backend child order.
struct Tracker<TDomain> {
    parent: WeakLiveNode,
    items: RefCell<Vec<ResolvedItem<TDomain>>>,
    item_to_node: ItemToNode<TDomain>,
    order: Option<OrderFn<TDomain>>,
    on_update: Option<UpdateFn<TDomain>>,
    warned_unordered: Cell<bool>,
}

impl<TDomain: Clone + 'static> Tracker<TDomain> {
    fn connect(
        source: Rc<dyn Source<Vec<TDomain>>>,
        item_to_node: ItemToNode<TDomain>,
        order: Option<OrderFn<TDomain>>,
        on_update: Option<UpdateFn<TDomain>>,
        mode: DiffMode<TDomain>,
        parent: &LiveNode,
    ) -> Subscription {
        let tracker = Rc::new(Tracker {
            parent: parent.downgrade(),
            items: RefCell::new(Vec::new()),
            item_to_node,
            order,
            on_update,
            warned_unordered: Cell::new(false),
        });
        source.subscribe(Box::new(move |batch: Vec<TDomain>| match &mode {
            DiffMode::Append => tracker.append(batch),
            DiffMode::Sync { compare } => tracker.sync(batch, compare),
        }))
    }

    /// Render and append every item in the batch.
    fn append(&self, batch: Vec<TDomain>) {
        let Some(parent) = self.parent.upgrade() else { return };
        let added = self.append_items(&parent, batch);
        self.finish_pass(&parent, RenderingUpdate::new(added, Vec::new()));
    }

    /// Reconcile the tracked set against an authoritative batch:
    /// additions first (batch order, appended at the end), then removals
    /// (removed in descending index order, reported in tracked order).
    fn sync(&self, batch: Vec<TDomain>, compare: &CompareFn<TDomain>) {
        let Some(parent) = self.parent.upgrade() else { return };

        let tracked_len = self.items.borrow().len();
        let keep: Vec<bool> = {
            let items = self.items.borrow();
            items
                .iter()
                .map(|item| {
                    item.domain_data
                        .as_ref()
                        .is_some_and(|tracked| batch.iter().any(|new| compare(tracked, new)))
                })
                .collect()
        };

        let mut additions: Vec<TDomain> = Vec::new();
        for candidate in batch {
            let already_tracked = {
                let items = self.items.borrow();
                items.iter().any(|item| {
                    item.domain_data
                        .as_ref()
                        .is_some_and(|tracked| compare(tracked, &candidate))
                })
            };
            if already_tracked {
                continue;
            }
            if additions.iter().any(|accepted| compare(accepted, &candidate)) {
                tracing::warn!(
                    kind = %parent.kind(),
                    "duplicate item within one emission, skipping"
                );
                continue;
            }
            additions.push(candidate);
        }

        let added = self.append_items(&parent, additions);

        let mut removed = Vec::new();
        for index in (0..tracked_len).rev() {
            if keep[index] {
                continue;
            }
            let item = self.items.borrow_mut().remove(index);
            parent.drop_child_at(index);
            removed.push(item);
        }
        removed.reverse();

        self.finish_pass(&parent, RenderingUpdate::new(added, removed));
    }

    fn append_items(&self, parent: &LiveNode, batch: Vec<TDomain>) -> Vec<ResolvedItem<TDomain>> {
        let mut added = Vec::new();
        for domain in batch {
            let node = render::render((self.item_to_node)(&domain), parent.registry());
            let index = self.items.borrow().len();
            self.items.borrow_mut().push(ResolvedItem {
                domain_data: Some(domain.clone()),
                node: node.clone(),
            });
            parent.adopt_child_at(index, node.clone());
            added.push(ResolvedItem { domain_data: Some(domain), node });
        }
        added
    }

    fn finish_pass(&self, parent: &LiveNode, update: RenderingUpdate<TDomain>) {
        self.assign_order_hints(parent);
        if let Some(on_update) = &self.on_update {
            on_update(parent, &update);
        }
    }

    /// Sort a snapshot of tracked indices and hand out hints `0..k-1`.
    /// Runs after every pass so hints stay dense across removals.
    fn assign_order_hints(&self, parent: &LiveNode) {
        let Some(order) = &self.order else { return };
        if !parent.backend().honors_order_hints() && !self.warned_unordered.get() {
            self.warned_unordered.set(true);
            tracing::warn!(
                kind = %parent.kind(),
                "order hints requested on a layout that does not honor them"
            );
        }
        let items = self.items.borrow();
        let mut indices: Vec<usize> = (0..items.len()).collect();
        indices.sort_by(|&a, &b| {
            match (items[a].domain_data.as_ref(), items[b].domain_data.as_ref()) {
                (Some(lhs), Some(rhs)) => order(lhs, rhs),
                _ => Ordering::Equal,
            }
        });
        let backend = parent.backend();
        for (hint, child_index) in indices.into_iter().enumerate() {
            backend.set_order_hint(child_index, hint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{self, MemoryNode};
    use crate::backend::NodeRegistry;
    use crate::testing::Emitter;

    fn registry() -> Rc<NodeRegistry> {
        Rc::new(memory::registry(&["panel", "item"]))
    }

    fn item(name: &str) -> NodeDescription {
        NodeDescription::new("item").attr("name", name)
    }

    fn mounted_list<TDomain: Clone + 'static>(policy: impl Into<ListPolicy<TDomain>>) -> LiveNode {
        let node = render::render(NodeDescription::new("panel").children(policy), &registry());
        node.attach();
        node
    }

    fn names(parent: &LiveNode) -> Vec<String> {
        (0..parent.child_count())
            .map(|index| {
                let child = parent.child(index).unwrap();
                match MemoryNode::of(&child).property("name") {
                    Some(crate::types::AttrValue::Text(name)) => name,
                    other => panic!("item without a name property: {other:?}"),
                }
            })
            .collect()
    }

    #[test]
    fn test_append_accumulates_deltas() {
        let emitter: Emitter<Vec<String>> = Emitter::new();
        let parent = mounted_list(AppendList::new(emitter.clone(), |name: &String| item(name)));

        emitter.emit(vec!["a".to_string()]);
        emitter.emit(vec!["b".to_string(), "c".to_string()]);
        assert_eq!(names(&parent), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sync_matches_and_diffs() {
        let emitter: Emitter<Vec<String>> = Emitter::new();
        let parent = mounted_list(SyncList::new(emitter.clone(), |name: &String| item(name)));

        emitter.emit(vec!["a".to_string(), "b".to_string()]);
        let node_a = parent.child(0).unwrap();

        emitter.emit(vec!["b".to_string(), "c".to_string()]);
        assert_eq!(names(&parent), vec!["b", "c"]);
        assert!(!node_a.is_attached(), "removed item is torn down");
        assert!(
            parent.child(0).unwrap().is_attached(),
            "matched item survives untouched"
        );
    }

    #[test]
    fn test_sync_skips_duplicates_within_one_emission() {
        let emitter: Emitter<Vec<String>> = Emitter::new();
        let parent = mounted_list(SyncList::new(emitter.clone(), |name: &String| item(name)));

        emitter.emit(vec!["a".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(names(&parent), vec!["a", "b"], "tracked set holds no equal pair");
    }

    #[test]
    fn test_replace_swaps_wholesale_with_initial() {
        let emitter: Emitter<Vec<String>> = Emitter::new();
        let binding = Binding::new(emitter.clone(), |batch: &Vec<String>| {
            batch.iter().map(|name| item(name)).collect()
        })
        .initial(vec![item("loading")]);

        let parent = mounted_list(ListPolicy::replace(binding));
        assert_eq!(names(&parent), vec!["loading"], "initial set shows before first emission");

        emitter.emit(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(names(&parent), vec!["a", "b"]);
    }

    #[test]
    fn test_order_hints_stay_dense_after_removal() {
        let emitter: Emitter<Vec<String>> = Emitter::new();
        let parent = mounted_list(
            SyncList::new(emitter.clone(), |name: &String| item(name)).order(|a, b| a.cmp(b)),
        );

        emitter.emit(vec!["c".to_string(), "a".to_string(), "b".to_string()]);
        emitter.emit(vec!["c".to_string(), "a".to_string()]);

        let backend = MemoryNode::of(&parent);
        let mut hints: Vec<usize> = (0..backend.child_count())
            .map(|index| backend.child(index).unwrap().order_hint().unwrap())
            .collect();
        hints.sort_unstable();
        assert_eq!(hints, vec![0, 1], "hints form a dense zero-based sequence");
    }

    #[test]
    fn test_on_update_reports_empty_updated_bucket() {
        let emitter: Emitter<Vec<String>> = Emitter::new();
        let reports: Rc<RefCell<Vec<(usize, usize, usize)>>> = Rc::new(RefCell::new(Vec::new()));
        let reports_clone = reports.clone();

        let _parent = mounted_list(
            SyncList::new(emitter.clone(), |name: &String| item(name)).on_update(
                move |_parent, update| {
                    reports_clone.borrow_mut().push((
                        update.added.len(),
                        update.updated.len(),
                        update.removed.len(),
                    ));
                },
            ),
        );

        emitter.emit(vec!["a".to_string(), "b".to_string()]);
        emitter.emit(vec!["b".to_string()]);
        assert_eq!(*reports.borrow(), vec![(2, 0, 0), (0, 0, 1)]);
    }
}
