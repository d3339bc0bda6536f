// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Responder chains.
//!
//! ## Order
//!
//! Starting from an item, the next responder is:
//!
//! - the item's decorator, if it has one;
//! - otherwise, once the outermost decorator (or an undecorated item) is
//!   reached, the controller bound to the semantic item, if any;
//! - otherwise the enclosing item, that is the semantic item's parent group.
//!
//! A controller therefore sits between an item's decorators and its parent,
//! and is visited exactly once per item.

use smallvec::SmallVec;
use trellis_item_tree::{ControllerId, ItemId, Tree};

use crate::targets;

/// One link of a responder chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Responder {
    /// An item, group, or decorator.
    Item(ItemId),
    /// The controller bound to `item`.
    Controller {
        /// The controller.
        controller: ControllerId,
        /// The item the controller is bound to.
        item: ItemId,
    },
}

impl Responder {
    /// The item this responder acts for.
    pub fn item(self) -> ItemId {
        match self {
            Self::Item(id) | Self::Controller { item: id, .. } => id,
        }
    }
}

/// Responder chain from `start` to the root, inclusive.
pub type ResponderChain = SmallVec<[Responder; 8]>;

/// The responder after `responder`, or `None` at the end of the chain.
pub fn next_responder(tree: &Tree, responder: Responder) -> Option<Responder> {
    match responder {
        Responder::Item(id) => {
            if let Some(decorator) = tree.decorator_of(id) {
                return Some(Responder::Item(decorator));
            }
            let semantic = tree.first_decorated_item(id);
            if let Some(controller) = tree.controller(semantic) {
                return Some(Responder::Controller {
                    controller,
                    item: semantic,
                });
            }
            tree.parent_of(semantic).map(Responder::Item)
        }
        Responder::Controller { item, .. } => tree.parent_of(item).map(Responder::Item),
    }
}

/// Collect the full responder chain starting at `start`.
///
/// Returns an empty chain for stale ids.
pub fn responder_chain(tree: &Tree, start: ItemId) -> ResponderChain {
    let mut out = ResponderChain::new();
    if !tree.is_alive(start) {
        tracing::warn!(target: targets::DISPATCH, ?start, "responder chain requested for stale item");
        return out;
    }
    let mut current = Some(Responder::Item(start));
    while let Some(responder) = current {
        out.push(responder);
        current = next_responder(tree, responder);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_item_tree::{DecoratorKind, ItemDesc};

    #[test]
    fn chain_visits_decorators_then_controller_then_parent() {
        let mut tree = Tree::new();
        let root = tree.insert_group(ItemDesc::default());
        let doc = tree.insert_group(ItemDesc::default());
        let leaf = tree.insert_item(ItemDesc::default());
        tree.add_child(root, doc).unwrap();
        tree.add_child(doc, leaf).unwrap();
        let scroll = tree.insert_decorator(DecoratorKind::Scroll {
            offset: kurbo::Vec2::ZERO,
        });
        let window = tree.insert_decorator(DecoratorKind::Window);
        tree.set_decorator(doc, scroll).unwrap();
        tree.set_decorator(doc, window).unwrap();
        tree.set_controller(doc, Some(ControllerId(4))).unwrap();

        let chain = responder_chain(&tree, leaf);
        assert_eq!(
            chain.as_slice(),
            &[
                Responder::Item(leaf),
                Responder::Item(doc),
                Responder::Item(scroll),
                Responder::Item(window),
                Responder::Controller {
                    controller: ControllerId(4),
                    item: doc
                },
                Responder::Item(root),
            ]
        );
    }

    #[test]
    fn chain_ends_at_root() {
        let mut tree = Tree::new();
        let root = tree.insert_group(ItemDesc::default());
        assert_eq!(next_responder(&tree, Responder::Item(root)), None);
        assert_eq!(responder_chain(&tree, root).len(), 1);
        tree.destroy(root).unwrap();
        assert!(responder_chain(&tree, root).is_empty());
    }
}
