// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch of semantic actions across window scopes.
//!
//! ## Semantics
//!
//! An action is offered to an ordered list of scopes:
//!
//! 1. the tree of the focused window, walking the responder chain from the
//!    hit-test target (or the window's first responder);
//! 2. only if unhandled, the tree of the main window, walking from its first
//!    responder (skipped when it is the focused window);
//! 3. only if still unhandled, the process-wide fallback handlers, in order.
//!
//! Each scope is an independent chain walk. The first handler returning
//! [`Handled::Yes`] ends dispatch. A miss is not an error: the result simply
//! names no handler.
//!
//! ## Minimal example
//!
//! ```
//! use std::rc::Rc;
//! use kurbo::{Point, Rect};
//! use trellis_item_tree::{ItemDesc, Tree};
//! use trellis_pickboard::Pickboards;
//! use trellis_responder::{
//!     Action, ActionCx, Handlers, Responder, ScopeKind, Scopes, StandardHandler, WindowScope,
//!     dispatch,
//! };
//!
//! let mut tree = Tree::new();
//! let mut handlers = Handlers::new();
//! let standard = handlers.register(Rc::new(StandardHandler::new()));
//!
//! let root = tree.insert_group(ItemDesc::with_frame(Rect::new(0.0, 0.0, 100.0, 100.0)));
//! let list = tree.insert_group(ItemDesc::with_frame(Rect::new(0.0, 0.0, 50.0, 50.0)).handler(standard));
//! let row = tree.insert_item(ItemDesc::with_frame(Rect::new(0.0, 0.0, 50.0, 10.0)));
//! tree.add_child(root, list).unwrap();
//! tree.add_child(list, row).unwrap();
//!
//! let mut boards = Pickboards::new();
//! let mut cx = ActionCx::new(&mut tree, &mut boards);
//! let scopes = Scopes::focused(WindowScope::new(root));
//! let click = Action::Click { location: Point::new(5.0, 5.0), count: 1 };
//!
//! // `row` has no handler, so the click climbs to `list`, whose handler
//! // selects `list` within `root`.
//! let result = dispatch(&handlers, &mut cx, &scopes, Some(row), &click);
//! assert_eq!(result.handled_by, Some(Responder::Item(list).into()));
//! assert_eq!(result.scope, Some(ScopeKind::FocusedWindow));
//! ```

use trellis_item_tree::ItemId;

use crate::action::{Action, Handled};
use crate::chain::{Responder, responder_chain};
use crate::handler::ActionCx;
use crate::registry::Handlers;
use crate::targets;

/// Propagation control for [`run`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Keep walking.
    Continue,
    /// Stop at this responder.
    Stop,
}

/// Walk `chain` in order, calling `handler` for each responder until it
/// returns [`Outcome::Stop`].
///
/// Returns the responder where the walk stopped, or `None` if it ran to the
/// end of the chain.
pub fn run<'a, E>(
    chain: &'a [Responder],
    event: &mut E,
    mut handler: impl FnMut(&Responder, &mut E) -> Outcome,
) -> Option<&'a Responder> {
    for responder in chain {
        if handler(responder, event) == Outcome::Stop {
            return Some(responder);
        }
    }
    None
}

/// The tree of one window taking part in dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WindowScope {
    /// Root item of the window's tree.
    pub root: ItemId,
    /// Item keyboard-like actions start at, if any.
    pub first_responder: Option<ItemId>,
}

impl WindowScope {
    /// A scope rooted at `root` without a first responder.
    pub fn new(root: ItemId) -> Self {
        Self {
            root,
            first_responder: None,
        }
    }

    /// Set the first responder.
    pub fn with_first_responder(mut self, item: ItemId) -> Self {
        self.first_responder = Some(item);
        self
    }

    fn start(&self) -> ItemId {
        self.first_responder.unwrap_or(self.root)
    }
}

/// The window scopes an action is offered to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Scopes {
    /// The focused window.
    pub focused: Option<WindowScope>,
    /// The main window, tried after the focused one.
    pub main: Option<WindowScope>,
}

impl Scopes {
    /// Only a focused window, which is also the main window.
    pub fn focused(scope: WindowScope) -> Self {
        Self {
            focused: Some(scope),
            main: None,
        }
    }

    /// Set the main window.
    pub fn with_main(mut self, scope: WindowScope) -> Self {
        self.main = Some(scope);
        self
    }
}

/// Which scope handled an action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// The focused window's tree.
    FocusedWindow,
    /// The main window's tree.
    MainWindow,
    /// The process-wide fallbacks.
    Fallback,
}

/// Who handled an action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HandledBy {
    /// A responder of a window tree.
    Responder(Responder),
    /// The process-wide fallback at this position.
    Fallback(usize),
}

impl From<Responder> for HandledBy {
    fn from(responder: Responder) -> Self {
        Self::Responder(responder)
    }
}

/// Result of [`dispatch`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Dispatched {
    /// Who handled the action; `None` when nobody did.
    pub handled_by: Option<HandledBy>,
    /// In which scope it was handled.
    pub scope: Option<ScopeKind>,
}

impl Dispatched {
    /// Returns true if some handler handled the action.
    pub fn is_handled(&self) -> bool {
        self.handled_by.is_some()
    }
}

/// Offer `action` to the responder chain starting at `start`.
///
/// Returns the responder that handled it.
pub fn dispatch_to_chain(
    handlers: &Handlers,
    cx: &mut ActionCx<'_>,
    start: ItemId,
    action: &Action,
) -> Option<Responder> {
    let chain = responder_chain(cx.tree, start);
    run(&chain, cx, |responder, cx| {
        let Some(handler) = handlers.responder_handler(cx.tree, *responder) else {
            return Outcome::Continue;
        };
        tracing::trace!(target: targets::DISPATCH, ?responder, ?action, "offer");
        match handler.handle(cx, responder.item(), action) {
            Handled::Yes => Outcome::Stop,
            Handled::No => Outcome::Continue,
        }
    })
    .copied()
}

/// Offer `action` to the focused window, the main window, then the
/// process-wide fallbacks.
///
/// `start` is the item the walk in the focused window begins at, usually the
/// hit-test target; without it the focused window's first responder is used.
pub fn dispatch(
    handlers: &Handlers,
    cx: &mut ActionCx<'_>,
    scopes: &Scopes,
    start: Option<ItemId>,
    action: &Action,
) -> Dispatched {
    if let Some(focused) = scopes.focused {
        let start = start.unwrap_or_else(|| focused.start());
        if let Some(responder) = dispatch_to_chain(handlers, cx, start, action) {
            tracing::debug!(target: targets::DISPATCH, ?responder, ?action, "handled in focused window");
            return Dispatched {
                handled_by: Some(responder.into()),
                scope: Some(ScopeKind::FocusedWindow),
            };
        }
    }
    if let Some(main) = scopes.main
        && scopes.focused.is_none_or(|focused| focused.root != main.root)
        && let Some(responder) = dispatch_to_chain(handlers, cx, main.start(), action)
    {
        tracing::debug!(target: targets::DISPATCH, ?responder, ?action, "handled in main window");
        return Dispatched {
            handled_by: Some(responder.into()),
            scope: Some(ScopeKind::MainWindow),
        };
    }
    for (index, fallback) in handlers.fallbacks().iter().enumerate() {
        let item = start
            .or_else(|| scopes.focused.map(|s| s.start()))
            .or_else(|| scopes.main.map(|s| s.start()));
        let Some(item) = item else { break };
        if fallback.handle(cx, item, action).is_handled() {
            tracing::debug!(target: targets::DISPATCH, index, ?action, "handled by fallback");
            return Dispatched {
                handled_by: Some(HandledBy::Fallback(index)),
                scope: Some(ScopeKind::Fallback),
            };
        }
    }
    tracing::trace!(target: targets::DISPATCH, ?action, "unhandled");
    Dispatched::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use trellis_item_tree::{ControllerId, ItemDesc, Tree};
    use trellis_pickboard::Pickboards;

    use crate::action::{Key, KeyInput};
    use crate::handler::ActionHandler;

    /// Records every offer and handles actions only when `accept` is set.
    struct Probe {
        name: &'static str,
        accept: bool,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl ActionHandler for Probe {
        fn handle_key_down(&self, _cx: &mut ActionCx<'_>, _item: ItemId, _key: KeyInput) -> Handled {
            self.log.borrow_mut().push(self.name);
            self.accept.into()
        }
    }

    fn probe(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str, accept: bool) -> Rc<Probe> {
        Rc::new(Probe {
            name,
            accept,
            log: log.clone(),
        })
    }

    fn key() -> Action {
        Action::KeyDown(KeyInput::new(Key::Character('a')))
    }

    #[test]
    fn run_stops_at_first_stop() {
        let mut tree = Tree::new();
        let ids: Vec<Responder> = (0..3)
            .map(|_| Responder::Item(tree.insert_item(ItemDesc::default())))
            .collect();
        let mut seen = 0;
        let stopped = run(&ids, &mut seen, |r, seen| {
            *seen += 1;
            if *r == ids[1] { Outcome::Stop } else { Outcome::Continue }
        });
        assert_eq!(stopped, Some(&ids[1]));
        assert_eq!(seen, 2);
    }

    #[test]
    fn focused_then_main_then_fallback() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tree = Tree::new();
        let mut handlers = Handlers::new();
        let focused_id = handlers.register(probe(&log, "focused", false));
        let main_id = handlers.register(probe(&log, "main", false));
        handlers.push_fallback(probe(&log, "app", true));

        let focused_root = tree.insert_group(ItemDesc::default().handler(focused_id));
        let main_root = tree.insert_group(ItemDesc::default().handler(main_id));
        let mut boards = Pickboards::new();
        let mut cx = ActionCx::new(&mut tree, &mut boards);
        let scopes = Scopes::focused(WindowScope::new(focused_root))
            .with_main(WindowScope::new(main_root));

        let result = dispatch(&handlers, &mut cx, &scopes, None, &key());
        assert_eq!(result.handled_by, Some(HandledBy::Fallback(0)));
        assert_eq!(result.scope, Some(ScopeKind::Fallback));
        assert_eq!(*log.borrow(), alloc::vec!["focused", "main", "app"]);
    }

    #[test]
    fn handled_in_focused_window_stops_dispatch() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tree = Tree::new();
        let mut handlers = Handlers::new();
        let leaf_id = handlers.register(probe(&log, "leaf", false));
        let root_id = handlers.register(probe(&log, "root", true));
        let main_id = handlers.register(probe(&log, "main", true));

        let root = tree.insert_group(ItemDesc::default().handler(root_id));
        let leaf = tree.insert_item(ItemDesc::default().handler(leaf_id));
        tree.add_child(root, leaf).unwrap();
        let main_root = tree.insert_group(ItemDesc::default().handler(main_id));
        let mut boards = Pickboards::new();
        let mut cx = ActionCx::new(&mut tree, &mut boards);
        let scopes = Scopes::focused(WindowScope::new(root).with_first_responder(leaf))
            .with_main(WindowScope::new(main_root));

        let result = dispatch(&handlers, &mut cx, &scopes, None, &key());
        assert_eq!(result.handled_by, Some(HandledBy::Responder(Responder::Item(root))));
        assert_eq!(result.scope, Some(ScopeKind::FocusedWindow));
        assert_eq!(*log.borrow(), alloc::vec!["leaf", "root"]);
    }

    #[test]
    fn controller_answers_before_parent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tree = Tree::new();
        let mut handlers = Handlers::new();
        let root_id = handlers.register(probe(&log, "root", true));
        handlers.register_controller(ControllerId(1), probe(&log, "controller", true));

        let root = tree.insert_group(ItemDesc::default().handler(root_id));
        let doc = tree.insert_group(ItemDesc::default());
        tree.add_child(root, doc).unwrap();
        tree.set_controller(doc, Some(ControllerId(1))).unwrap();
        let mut boards = Pickboards::new();
        let mut cx = ActionCx::new(&mut tree, &mut boards);

        let result = dispatch(
            &handlers,
            &mut cx,
            &Scopes::focused(WindowScope::new(root)),
            Some(doc),
            &key(),
        );
        assert_eq!(
            result.handled_by,
            Some(HandledBy::Responder(Responder::Controller {
                controller: ControllerId(1),
                item: doc
            }))
        );
        assert_eq!(*log.borrow(), alloc::vec!["controller"]);
    }

    #[test]
    fn miss_is_not_an_error() {
        let mut tree = Tree::new();
        let root = tree.insert_group(ItemDesc::default());
        let mut boards = Pickboards::new();
        let mut cx = ActionCx::new(&mut tree, &mut boards);
        let result = dispatch(
            &Handlers::new(),
            &mut cx,
            &Scopes::focused(WindowScope::new(root)),
            None,
            &key(),
        );
        assert!(!result.is_handled());
        assert_eq!(result, Dispatched::default());
    }

    #[test]
    fn main_window_equal_to_focused_is_not_walked_twice() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tree = Tree::new();
        let mut handlers = Handlers::new();
        let id = handlers.register(probe(&log, "root", false));
        let root = tree.insert_group(ItemDesc::default().handler(id));
        let mut boards = Pickboards::new();
        let mut cx = ActionCx::new(&mut tree, &mut boards);
        let scope = WindowScope::new(root);
        dispatch(
            &handlers,
            &mut cx,
            &Scopes::focused(scope).with_main(scope),
            None,
            &key(),
        );
        assert_eq!(*log.borrow(), alloc::vec!["root"]);
    }
}
