//! Rendering entry points.
//!
//! [`render`] realizes a description into a detached [`LiveNode`];
//! [`mount`] additionally attaches it and hands back a [`MountHandle`]
//! whose drop tears the tree down.

use std::rc::Rc;

use crate::backend::NodeRegistry;
use crate::description::NodeDescription;
use crate::lifecycle::LiveNode;

/// Realize `desc` against `registry` without attaching.
///
/// # Panics
/// Panics if any kind reachable from `desc` at realize time is not
/// registered. Child kinds are realized lazily at attach, so their
/// panics surface there.
pub fn render(desc: NodeDescription, registry: &Rc<NodeRegistry>) -> LiveNode {
    LiveNode::realize(desc, registry)
}

/// Render and attach in one step.
pub fn mount(desc: NodeDescription, registry: &Rc<NodeRegistry>) -> MountHandle {
    let root = render(desc, registry);
    root.attach();
    MountHandle { root }
}

/// Owns a mounted tree. Dropping the handle unmounts it.
pub struct MountHandle {
    root: LiveNode,
}

impl MountHandle {
    pub fn root(&self) -> &LiveNode {
        &self.root
    }

    /// Tear the tree down now.
    pub fn unmount(self) {
        self.root.detach();
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.root.detach();
    }
}
