// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Responder: turning hits into semantic actions, and moving things
//! around with drag and drop, cut, copy, and paste.
//!
//! ## Pieces
//!
//! - [`hit_test`] finds the item under a point. A group whose layout is
//!   opaque swallows the hit for its whole subtree.
//! - [`responder_chain`] lists who may answer an action starting from an
//!   item: the item, its decorators, its controller, then its enclosing
//!   group, up to the root.
//! - [`dispatch`] offers an [`Action`] to the focused window, the main
//!   window, and the process-wide fallbacks, stopping at the first
//!   [`ActionHandler`] returning [`Handled::Yes`].
//! - [`PickDropCoordinator`] runs one drag session; [`cut`], [`copy`], and
//!   [`paste`] share its handler hooks through the picking mask.
//!
//! Handlers are registered once in [`Handlers`] and referred to from items by
//! [`HandlerId`](trellis_item_tree::HandlerId). Everything a handler mutates
//! comes in through [`ActionCx`].
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use kurbo::{Point, Rect};
//! use trellis_item_tree::{ItemDesc, Tree};
//! use trellis_pickboard::Pickboards;
//! use trellis_responder::{
//!     ActionCx, DragOutcome, Handlers, HitTestFilter, PickDropCoordinator, StandardHandler,
//!     ValidatedDrop, hit_test,
//! };
//!
//! let mut tree = Tree::new();
//! let mut handlers = Handlers::new();
//! let standard = handlers.register(Rc::new(StandardHandler::new()));
//!
//! let desk = tree.insert_group(ItemDesc::with_frame(Rect::new(0.0, 0.0, 400.0, 300.0)).handler(standard));
//! let tray = tree.insert_group(ItemDesc::with_frame(Rect::new(200.0, 0.0, 400.0, 300.0)));
//! let card = tree.insert_item(ItemDesc::with_frame(Rect::new(10.0, 10.0, 60.0, 40.0)));
//! tree.add_child(desk, tray).unwrap();
//! tree.add_child(desk, card).unwrap();
//!
//! let mut boards = Pickboards::new();
//! let mut cx = ActionCx::new(&mut tree, &mut boards);
//!
//! let start = Point::new(20.0, 20.0);
//! let grabbed = hit_test(cx.tree, desk, start, HitTestFilter::default()).unwrap();
//! assert_eq!(grabbed.target, card);
//!
//! let mut session = PickDropCoordinator::begin(&handlers, &mut cx, card, start, false).unwrap();
//! let end = Point::new(300.0, 150.0);
//! let over = hit_test(cx.tree, desk, end, HitTestFilter::default()).unwrap();
//! session.drag_over(&handlers, &mut cx, Some(over.target), end);
//! let outcome = session.drop(&handlers, &mut cx, end).unwrap();
//!
//! assert_eq!(outcome, DragOutcome::Dropped(ValidatedDrop { target: tray, index: 0 }));
//! assert_eq!(cx.tree.parent_of(card), Some(tray));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod action;
mod chain;
mod dispatcher;
mod error;
mod handler;
mod hit;
mod registry;

pub mod pick_drop;

pub use action::{Action, EditCommand, Handled, Key, KeyInput, Modifiers, Touch};
pub use chain::{Responder, ResponderChain, next_responder, responder_chain};
pub use dispatcher::{
    Dispatched, HandledBy, Outcome, ScopeKind, Scopes, WindowScope, dispatch, dispatch_to_chain, run,
};
pub use error::{DragError, DragResult};
pub use handler::{
    ActionCx, ActionHandler, DropIndex, StandardHandler, ValidatedDrop, insert_picked_items,
};
pub use hit::{Hit, HitTestFilter, hit_test};
pub use pick_drop::{DragOutcome, DragState, PickDropCoordinator, copy, cut, paste};
pub use registry::{Handlers, SharedHandler};

/// Target names for log filtering.
pub mod targets {
    /// Dispatch walks and handler decisions.
    pub const DISPATCH: &str = "trellis::dispatch";
    /// Hit-test descent.
    pub const HIT: &str = "trellis::hit";
    /// Drag sessions and pickboard transfers.
    pub const DRAG: &str = "trellis::drag";
}
