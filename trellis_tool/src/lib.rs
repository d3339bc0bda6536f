// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Tool: interpreting raw input against an item tree.
//!
//! This crate sits between the host's event loop and the dispatch core in
//! `trellis_responder`. The host feeds canonical [`InputEvent`]s into a
//! [`Context`]; the context hit tests them, keeps the hover state, recognizes
//! clicks, double clicks, and drags, and turns them into semantic actions.
//!
//! ## Tools
//!
//! Each group that carries a layout owns a [`Tool`]. One tool is active at a
//! time and holds the [`HoverStack`]; when the pointer moves into a nested
//! layout, its tool may take over according to its [`ActivationStrategy`]:
//! [`ActivateOnEnter`] follows the pointer, while [`ActivateOnDoubleClick`]
//! suits editors that should only grab input once the user asks for it.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use kurbo::{Point, Rect};
//! use trellis_item_tree::{ItemDesc, Tree};
//! use trellis_responder::{DragOutcome, Handlers, StandardHandler};
//! use trellis_tool::{Context, InputEvent, Response};
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
//! let mut cx = Context::new(tree, desk);
//! cx.handlers = handlers;
//!
//! assert_eq!(cx.handle_input(InputEvent::pointer_down(Point::new(20.0, 20.0))), Response::Pressed(card));
//! cx.handle_input(InputEvent::pointer_moved(Point::new(300.0, 150.0)));
//! let response = cx.handle_input(InputEvent::pointer_up(Point::new(300.0, 150.0)));
//!
//! assert!(matches!(response, Response::Dropped(DragOutcome::Dropped(_))));
//! assert_eq!(cx.tree.parent_of(card), Some(tray));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod activation;
mod click;
mod config;
mod context;
mod hover;
mod input;
mod tool;

pub use activation::{ActivateOnDoubleClick, ActivateOnEnter, ActivationStrategy, ActivationTrigger};
pub use click::{ClickResult, ClickState, PointerId, Press};
pub use config::ToolConfig;
pub use context::{Context, Response};
pub use hover::{HoverEvent, HoverEvents, HoverStack};
pub use input::{InputEvent, InputKind};
pub use tool::{Cursor, Tool};

/// Target names for log filtering.
pub mod targets {
    /// Tool activation, hand-over, and gesture recognition.
    pub const TOOL: &str = "trellis::tool";
}
