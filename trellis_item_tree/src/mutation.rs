// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutation records returned from commit.

use alloc::vec::Vec;

use crate::types::ItemId;

/// One structural change of the tree.
///
/// Moving an item that already had a parent is always reported as a single
/// [`Mutation::Moved`], never as a removal followed by an insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// `item` was attached to `group` at `index`.
    Inserted {
        /// Receiving group.
        group: ItemId,
        /// Attached item.
        item: ItemId,
        /// Position in the group.
        index: usize,
    },
    /// `item` was detached from `group`, where it sat at `index`.
    Removed {
        /// Former parent.
        group: ItemId,
        /// Detached item.
        item: ItemId,
        /// Former position.
        index: usize,
    },
    /// `item` moved between (or within) groups.
    Moved {
        /// Moved item.
        item: ItemId,
        /// Former parent.
        from: ItemId,
        /// Former position.
        from_index: usize,
        /// New parent.
        to: ItemId,
        /// New position.
        to_index: usize,
    },
    /// `decorator` became the outermost wrapper of `item`'s chain.
    Decorated {
        /// The node that was wrapped.
        item: ItemId,
        /// The new wrapper.
        decorator: ItemId,
    },
    /// `decorator` was spliced out of the chain around `item`.
    Undecorated {
        /// The node the decorator wrapped.
        item: ItemId,
        /// The removed wrapper.
        decorator: ItemId,
    },
}

/// A batched set of changes drained by [`crate::Tree::commit`].
#[derive(Clone, Debug, Default)]
pub struct Changes {
    /// Mutations in the order they happened.
    pub mutations: Vec<Mutation>,
    /// Groups whose arranged geometry must be recomputed, in the order they
    /// were first invalidated.
    pub dirty_groups: Vec<ItemId>,
}

impl Changes {
    /// Returns true if nothing changed since the last commit.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty() && self.dirty_groups.is_empty()
    }
}
