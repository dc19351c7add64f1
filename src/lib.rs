//! # rxtree
//!
//! Reactive node-tree rendering and list reconciliation.
//!
//! Built on [spark-signals](https://crates.io/crates/spark-signals) for
//! fine-grained reactivity: any `Signal` is a [`Source`] out of the box,
//! and any other push-based stream plugs in through the same trait.
//!
//! ## Architecture
//!
//! Declarative [`NodeDescription`]s are realized into [`LiveNode`]s
//! through an injectable [`NodeRegistry`]:
//!
//! ```text
//! NodeDescription → render → LiveNode → attach → wired backend tree
//! ```
//!
//! Attributes and children can be bound to streams: a [`Binding`] drives
//! a single attribute or child slot, a [`ListPolicy`] (`replace`,
//! `append`, `sync`) keeps a whole child list reconciled. Detaching a
//! node cancels every subscription and runs every disconnect hook in
//! reverse registration order, recursively.
//!
//! ## Modules
//!
//! - [`types`] - attribute values, resolution reports
//! - [`source`] - stream boundary (`Source`, `Subscription`)
//! - [`backend`] - host-node boundary, registry, in-memory backend
//! - [`description`] - declarative node builder
//! - [`binding`] - value bindings for attributes and single children
//! - [`reconcile`] - list reconciliation policies
//! - [`lifecycle`] - live-node attach/detach state machine
//! - [`render`] - render/mount entry points
//! - [`testing`] - deterministic emitter for tests

#![forbid(unsafe_code)]

pub mod applier;
pub mod backend;
pub mod binding;
pub mod description;
pub mod lifecycle;
pub mod reconcile;
pub mod render;
pub mod source;
pub mod testing;
pub mod types;

// Re-export the working surface
pub use backend::{BackendNode, NodeConstructor, NodeRegistry, RealizeError, PLACEHOLDER_KIND};
pub use binding::Binding;
pub use description::NodeDescription;
pub use lifecycle::{LiveNode, WeakLiveNode};
pub use reconcile::{AppendList, ListPolicy, SyncList};
pub use render::{mount, render, MountHandle};
pub use source::{Source, Subscription};
pub use testing::Emitter;
pub use types::{AttrValue, RenderingUpdate, ResolvedItem};
