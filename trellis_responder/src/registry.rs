// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registry of shared action handlers and controllers.

use alloc::rc::Rc;
use alloc::vec::Vec;

use hashbrown::HashMap;
use trellis_item_tree::{ControllerId, HandlerId, ItemId, Tree};

use crate::chain::{Responder, next_responder};
use crate::handler::ActionHandler;

/// Shared handler reference.
pub type SharedHandler = Rc<dyn ActionHandler>;

/// Owns the action handlers items refer to by [`HandlerId`], the handlers of
/// bound controllers, and the ordered process-wide fallbacks tried after every
/// window scope.
#[derive(Default)]
pub struct Handlers {
    handlers: HashMap<HandlerId, SharedHandler>,
    controllers: HashMap<ControllerId, SharedHandler>,
    fallbacks: Vec<SharedHandler>,
    next_id: u32,
}

impl core::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Handlers")
            .field("handlers", &self.handlers.len())
            .field("controllers", &self.controllers.len())
            .field("fallbacks", &self.fallbacks.len())
            .finish_non_exhaustive()
    }
}

impl Handlers {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared handler and return the key items use to refer to it.
    pub fn register(&mut self, handler: SharedHandler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.insert(id, handler);
        id
    }

    /// Bind a handler to a controller key.
    pub fn register_controller(&mut self, controller: ControllerId, handler: SharedHandler) {
        self.controllers.insert(controller, handler);
    }

    /// Append a process-wide fallback handler.
    pub fn push_fallback(&mut self, handler: SharedHandler) {
        self.fallbacks.push(handler);
    }

    /// Process-wide fallbacks, in the order they are tried.
    pub fn fallbacks(&self) -> &[SharedHandler] {
        &self.fallbacks
    }

    /// Handler registered under `id`.
    pub fn get(&self, id: HandlerId) -> Option<&SharedHandler> {
        self.handlers.get(&id)
    }

    /// Handler bound to an item, if any.
    pub fn handler_for(&self, tree: &Tree, item: ItemId) -> Option<&SharedHandler> {
        tree.handler(item).and_then(|id| self.handlers.get(&id))
    }

    /// Handler acting for one responder.
    pub fn responder_handler(&self, tree: &Tree, responder: Responder) -> Option<&SharedHandler> {
        match responder {
            Responder::Item(id) => self.handler_for(tree, id),
            Responder::Controller { controller, .. } => self.controllers.get(&controller),
        }
    }

    /// First handler along the responder chain starting at `item`.
    pub fn nearest_handler(&self, tree: &Tree, item: ItemId) -> Option<(Responder, SharedHandler)> {
        if !tree.is_alive(item) {
            return None;
        }
        let mut current = Some(Responder::Item(item));
        while let Some(responder) = current {
            if let Some(handler) = self.responder_handler(tree, responder) {
                return Some((responder, handler.clone()));
            }
            current = next_responder(tree, responder);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::StandardHandler;
    use trellis_item_tree::ItemDesc;

    #[test]
    fn nearest_handler_prefers_controller_over_enclosing_group() {
        let mut tree = Tree::new();
        let mut handlers = Handlers::new();
        let group_handler = handlers.register(Rc::new(StandardHandler::new()));
        let controller = ControllerId(7);
        handlers.register_controller(controller, Rc::new(StandardHandler::new()));

        let group = tree.insert_group(ItemDesc::default().handler(group_handler));
        let item = tree.insert_item(ItemDesc::default());
        tree.add_child(group, item).unwrap();

        let (responder, _) = handlers.nearest_handler(&tree, item).unwrap();
        assert_eq!(responder, Responder::Item(group));

        tree.set_controller(item, Some(controller)).unwrap();
        let (responder, _) = handlers.nearest_handler(&tree, item).unwrap();
        assert_eq!(responder, Responder::Controller { controller, item });
        assert!(handlers.handler_for(&tree, item).is_none());
    }

    #[test]
    fn stale_items_have_no_handler() {
        let mut tree = Tree::new();
        let mut handlers = Handlers::new();
        let id = handlers.register(Rc::new(StandardHandler::new()));
        let item = tree.insert_item(ItemDesc::default().handler(id));
        assert!(handlers.handler_for(&tree, item).is_some());
        tree.destroy(item).unwrap();
        assert!(handlers.nearest_handler(&tree, item).is_none());
        assert!(handlers.handler_for(&tree, item).is_none());
    }
}
