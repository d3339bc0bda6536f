// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Seams towards the model layer: mirrored mutations and child sources.

use core::fmt::Debug;

use crate::tree::Tree;
use crate::types::{ItemId, Represented};

/// Receives mutations of a group so the represented collection can follow.
///
/// Hooks fire strictly after the tree mutation completed and the tree is
/// internally consistent again. Exactly one hook fires per affected group and
/// item.
pub trait ModelMirror: Debug {
    /// `item` was appended to the group.
    fn item_added(&mut self, item: ItemId, object: Option<&Represented>);

    /// `item` was inserted at `index`.
    fn item_inserted(&mut self, item: ItemId, object: Option<&Represented>, index: usize);

    /// `item`, formerly at `index`, left the group.
    fn item_removed(&mut self, item: ItemId, object: Option<&Represented>, index: usize);
}

/// External provider of a group's children.
///
/// When a group has a source, [`Tree::reload`] replaces its children with the
/// items the source produces.
pub trait ItemSource: Debug {
    /// Number of children the group should have.
    fn item_count(&self, tree: &Tree, group: ItemId) -> usize;

    /// Create the detached child for `index`.
    fn item_at(&mut self, tree: &mut Tree, group: ItemId, index: usize) -> ItemId;
}
