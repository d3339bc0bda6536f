// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Item Tree: the presentation tree of items, groups, and decorators.
//!
//! - Items are presentation objects with a frame, flags, an optional shared
//!   action handler, and an optional represented model object.
//! - Groups are items owning an ordered list of children and an optional
//!   [`Layout`] that answers hit-testing and drop-index questions.
//! - Decorators wrap exactly one node to add chrome (window frames, title
//!   bars, scrolling) without becoming part of the semantic hierarchy.
//!
//! All nodes live in one generational arena owned by [`Tree`]. Relationships
//! pointing "up" (parent, decorated item, enclosing item) are [`ItemId`]s, so
//! nothing in the tree forms a reference cycle, and a stale id is simply
//! rejected instead of dangling.
//!
//! ## Batched updates
//!
//! Structural edits are applied immediately and recorded as [`Mutation`]s.
//! [`Tree::commit`] drains them together with the set of groups whose
//! arrangement needs recomputing, once per event-loop turn.
//!
//! ## Mirroring
//!
//! A group with [`Tree::set_mutates_represented_object`] enabled reports each
//! insertion and removal to its [`ModelMirror`] after the tree is consistent
//! again, so the represented collection can follow the presentation.
//!
//! ## API overview
//!
//! - [`Tree::insert_item`], [`Tree::insert_group`], [`Tree::insert_decorator`] create detached nodes.
//! - [`Tree::add_child`], [`Tree::insert_child`], [`Tree::move_items`], [`Tree::remove_child`],
//!   [`Tree::destroy`] edit the hierarchy.
//! - [`Tree::set_decorator`] / [`Tree::remove_decorator`] manage decorator chains;
//!   [`Tree::first_decorated_item`] and [`Tree::last_decorator`] walk them.
//! - [`Tree::index_path`], [`Tree::base_item`], [`Tree::window_backed_item`] navigate upward.
//! - [`Tree::convert_point_from_ancestor`] and friends map between coordinate spaces.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use trellis_item_tree::{DecoratorKind, ItemDesc, Tree};
//!
//! let mut tree = Tree::new();
//! let canvas = tree.insert_group(ItemDesc::with_frame(Rect::new(0.0, 0.0, 800.0, 600.0)));
//! let note = tree.insert_item(ItemDesc::with_frame(Rect::new(100.0, 100.0, 300.0, 200.0)));
//! tree.add_child(canvas, note).unwrap();
//!
//! let bar = tree.insert_decorator(DecoratorKind::TitleBar { height: 20.0 });
//! tree.set_decorator(note, bar).unwrap();
//!
//! assert_eq!(tree.first_decorated_item(bar), note);
//! assert_eq!(tree.topmost_child_at(canvas, Point::new(110.0, 105.0)), Some(note));
//! assert_eq!(
//!     tree.convert_point_to_content(note, Point::new(110.0, 130.0)),
//!     Some(Point::new(10.0, 10.0))
//! );
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod decorator;
mod error;
mod layout;
mod model;
mod mutation;
mod tree;
mod types;

pub use error::{TreeError, TreeResult};
pub use layout::{ColumnLayout, FreeLayout, Layout, OpaqueLayout};
pub use model::{ItemSource, ModelMirror};
pub use mutation::{Changes, Mutation};
pub use tree::{Ancestors, Tree};
pub use types::{
    Autoresizing, ControllerId, DecoratorKind, HandlerId, ItemDesc, ItemFlags, ItemId, ItemKind,
    Represented,
};

/// Target names for log filtering.
///
/// Use these with `tracing` directives, for example
/// `RUST_LOG=trellis::tree=debug`.
pub mod targets {
    /// Structural mutations of the tree.
    pub const TREE: &str = "trellis::tree";
    /// Decorator attachment and removal.
    pub const DECORATOR: &str = "trellis::decorator";
}
