// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Top-down hit testing with ancestor preemption.
//!
//! The walk starts at a root group. At every group it asks the group's
//! [`Layout`](trellis_item_tree::Layout) whether it is opaque; an opaque
//! layout ends the walk right there and its group becomes the target, however
//! deep the tree below the point goes. Otherwise the walk descends into the
//! child the layout reports under the point (by default, the topmost visible
//! child whose display frame contains it) and repeats.

use kurbo::Point;
use smallvec::SmallVec;
use trellis_item_tree::{ItemFlags, ItemId, Tree};

use crate::targets;

/// Which items hit testing may land on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitTestFilter {
    /// Flags an item must carry to be hit.
    pub required: ItemFlags,
}

impl Default for HitTestFilter {
    fn default() -> Self {
        Self {
            required: ItemFlags::VISIBLE,
        }
    }
}

impl HitTestFilter {
    /// Require `flags` on every hit item.
    pub fn with_required(mut self, flags: ItemFlags) -> Self {
        self.required = flags;
        self
    }

    fn accepts(&self, tree: &Tree, id: ItemId) -> bool {
        tree.flags(id).is_some_and(|f| f.contains(self.required))
    }
}

/// Result of a hit test.
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    /// The item events at the point go to.
    pub target: ItemId,
    /// Items from the root down to `target`, inclusive.
    pub path: SmallVec<[ItemId; 8]>,
    /// The point in `target`'s content space.
    pub location: Point,
    /// Set when `target`'s opaque layout swallowed the hit although one of its
    /// children lies under the point.
    pub preempted_by: Option<ItemId>,
}

/// Hit test `point`, given in `root`'s content space.
///
/// Returns `None` when `root` is stale, filtered out, or the point lies
/// outside its content bounds.
pub fn hit_test(tree: &Tree, root: ItemId, point: Point, filter: HitTestFilter) -> Option<Hit> {
    if !filter.accepts(tree, root) || !tree.content_bounds(root)?.contains(point) {
        return None;
    }
    let mut path = SmallVec::new();
    path.push(root);
    let mut current = root;
    let mut location = point;
    let mut preempted_by = None;
    loop {
        let layout = tree.layout(current);
        let child = match layout {
            Some(layout) => layout.item_at_location(tree, current, location),
            None => tree.topmost_child_at(current, location),
        }
        .filter(|&child| filter.accepts(tree, child));
        let Some(child) = child else { break };
        if layout.is_some_and(|l| l.is_opaque()) {
            tracing::trace!(target: targets::HIT, group = ?current, ?child, "opaque layout preempts descent");
            preempted_by = Some(current);
            break;
        }
        let Some(local) = tree.convert_point_from_ancestor(current, child, location) else {
            break;
        };
        tracing::trace!(target: targets::HIT, ?child, ?local, "descend");
        path.push(child);
        current = child;
        location = local;
    }
    Some(Hit {
        target: current,
        path,
        location,
        preempted_by,
    })
}
