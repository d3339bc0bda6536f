// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout seam used by hit testing and drop-index computation.
//!
//! Layout algorithms (measurement, arrangement) live outside this crate. A
//! group's layout only answers the questions the interaction core needs:
//! whether it swallows events for its whole subtree, which child sits under a
//! point, and where a drop at a point would insert.

use alloc::boxed::Box;
use core::fmt::Debug;

use kurbo::Point;

use crate::tree::Tree;
use crate::types::ItemId;

/// Interaction-facing part of a group's layout.
pub trait Layout: Debug {
    /// Whether this layout preempts hit testing of everything below its group.
    ///
    /// An opaque layout (for example a table with a row selection model, or a
    /// native widget) receives events for its group regardless of which
    /// descendant lies under the pointer.
    fn is_opaque(&self) -> bool {
        false
    }

    /// The child of `group` under `location`, given in `group`'s content space.
    fn item_at_location(&self, tree: &Tree, group: ItemId, location: Point) -> Option<ItemId> {
        tree.topmost_child_at(group, location)
    }

    /// Insertion index for a drop at `location`, or `None` when the layout has
    /// no notion of ordering (the drop then happens "onto" the group).
    fn insertion_index(&self, _tree: &Tree, _group: ItemId, _location: Point) -> Option<usize> {
        None
    }

    /// Clone this layout for a duplicated group, if the layout supports it.
    fn duplicate(&self) -> Option<Box<dyn Layout>> {
        None
    }
}

/// Layout placing children at their own frames; the last child is on top.
#[derive(Clone, Copy, Debug, Default)]
pub struct FreeLayout;

impl Layout for FreeLayout {
    fn duplicate(&self) -> Option<Box<dyn Layout>> {
        Some(Box::new(*self))
    }
}

/// Layout that handles all events for its group itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpaqueLayout;

impl Layout for OpaqueLayout {
    fn is_opaque(&self) -> bool {
        true
    }

    fn duplicate(&self) -> Option<Box<dyn Layout>> {
        Some(Box::new(*self))
    }
}

/// Vertical list: children are ordered top to bottom and drops insert
/// between them.
#[derive(Clone, Copy, Debug, Default)]
pub struct ColumnLayout;

impl Layout for ColumnLayout {
    fn insertion_index(&self, tree: &Tree, group: ItemId, location: Point) -> Option<usize> {
        let children = tree.children_of(group);
        let index = children
            .iter()
            .position(|&child| {
                tree.display_frame(child)
                    .is_some_and(|frame| location.y < frame.center().y)
            })
            .unwrap_or(children.len());
        Some(index)
    }

    fn duplicate(&self) -> Option<Box<dyn Layout>> {
        Some(Box::new(*self))
    }
}
