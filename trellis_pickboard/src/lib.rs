// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Pickboard: the scoped store shared by drag and drop, cut, copy, and paste.
//!
//! Picking something (starting a drag, cutting, copying) places a [`Picked`]
//! object on the active [`Pickboard`]; putting it down (dropping, pasting)
//! takes it off again. One [`PickingMask`] on the originating event tells the
//! handlers involved which of these operations is happening.
//!
//! Several objects picked at once travel as one [`PickCollection`]. A later
//! drop re-expands it into that many distinct insertions, never one composite
//! object.
//!
//! ```rust
//! use trellis_item_tree::{ItemDesc, Tree};
//! use trellis_pickboard::{PickCollection, Picked, Pickboards};
//!
//! let mut tree = Tree::new();
//! let a = tree.insert_item(ItemDesc::default());
//! let b = tree.insert_item(ItemDesc::default());
//!
//! let mut boards = Pickboards::new();
//! let board = boards.active_mut();
//! let reference = board.push_object(Picked::Collection(PickCollection::from_items([a, b])));
//! assert_eq!(board.object_for_ref(reference).unwrap().count(), 2);
//!
//! // Removing `a` from the tree elsewhere must not leave it on the board.
//! boards.forget_item(a);
//! assert_eq!(boards.active().top_object().unwrap().items(), vec![b]);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
mod mask;
mod pickboard;
mod picked;
mod registry;

pub use error::{PickboardError, PickboardResult};
pub use mask::PickingMask;
pub use pickboard::{PickRef, Pickboard, PickboardScope};
pub use picked::{PickCollection, PickType, Picked};
pub use registry::Pickboards;

/// Target names for log filtering.
pub mod targets {
    /// Pickboard contents and activation.
    pub const PICKBOARD: &str = "trellis::pickboard";
}
