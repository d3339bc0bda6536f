// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The hovered-item stack.
//!
//! A [`HoverStack`] remembers the hit-test path under the pointer, outermost
//! item at the bottom and the innermost on top. Feeding it the next path
//! yields the minimal set of transitions: exits for the items no longer under
//! the pointer, innermost first, then enters for the new ones, outermost
//! first. Descendants stop being highlighted before their ancestors do, and
//! ancestors light up before their descendants.
//!
//! ```
//! use trellis_item_tree::{ItemDesc, Tree};
//! use trellis_tool::{HoverEvent, HoverStack};
//!
//! let mut tree = Tree::new();
//! let [root, a, b, c] = [(); 4].map(|_| tree.insert_group(ItemDesc::default()));
//!
//! let mut hover = HoverStack::new();
//! assert_eq!(
//!     hover.update(&[root, a, b]).as_slice(),
//!     &[HoverEvent::Enter(root), HoverEvent::Enter(a), HoverEvent::Enter(b)]
//! );
//! assert_eq!(
//!     hover.update(&[root, c]).as_slice(),
//!     &[HoverEvent::Exit(b), HoverEvent::Exit(a), HoverEvent::Enter(c)]
//! );
//! assert!(hover.update(&[root, c]).is_empty());
//! ```

use alloc::vec::Vec;

use smallvec::SmallVec;
use trellis_item_tree::ItemId;

/// One hover transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HoverEvent {
    /// The pointer entered this item.
    Enter(ItemId),
    /// The pointer left this item.
    Exit(ItemId),
}

impl HoverEvent {
    /// The item concerned.
    pub fn item(self) -> ItemId {
        match self {
            Self::Enter(id) | Self::Exit(id) => id,
        }
    }
}

/// Transitions produced by one update.
pub type HoverEvents = SmallVec<[HoverEvent; 8]>;

/// Stack of hovered items, innermost on top.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HoverStack {
    stack: Vec<ItemId>,
}

impl HoverStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stack with `path` (outermost first) and return the
    /// transitions between the two.
    pub fn update(&mut self, path: &[ItemId]) -> HoverEvents {
        let common = self
            .stack
            .iter()
            .zip(path)
            .take_while(|(old, new)| old == new)
            .count();
        let mut events = HoverEvents::new();
        events.extend(self.stack[common..].iter().rev().map(|&id| HoverEvent::Exit(id)));
        events.extend(path[common..].iter().map(|&id| HoverEvent::Enter(id)));
        self.stack.clear();
        self.stack.extend_from_slice(path);
        events
    }

    /// Empty the stack, returning exits for everything on it.
    pub fn clear(&mut self) -> HoverEvents {
        self.update(&[])
    }

    /// The innermost hovered item.
    pub fn top(&self) -> Option<ItemId> {
        self.stack.last().copied()
    }

    /// Hovered items, outermost first.
    pub fn items(&self) -> &[ItemId] {
        &self.stack
    }

    /// Returns true if `item` is hovered.
    pub fn contains(&self, item: ItemId) -> bool {
        self.stack.contains(&item)
    }

    /// Number of hovered items.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns true if nothing is hovered.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Drop `item` and everything hovered inside it, without transitions.
    ///
    /// Used when `item` leaves the tree. Returns true if it was hovered.
    pub fn forget_item(&mut self, item: ItemId) -> bool {
        match self.stack.iter().position(|&id| id == item) {
            Some(index) => {
                self.stack.truncate(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_item_tree::{ItemDesc, Tree};

    fn ids<const N: usize>() -> [ItemId; N] {
        let mut tree = Tree::new();
        [(); N].map(|_| tree.insert_item(ItemDesc::default()))
    }

    #[test]
    fn exits_innermost_first_then_enters_outermost_first() {
        let [r, a, b, c, d] = ids();
        let mut hover = HoverStack::new();
        hover.update(&[r, a, b]);
        let events = hover.update(&[r, c, d]);
        assert_eq!(
            events.as_slice(),
            &[
                HoverEvent::Exit(b),
                HoverEvent::Exit(a),
                HoverEvent::Enter(c),
                HoverEvent::Enter(d)
            ]
        );
        assert_eq!(hover.top(), Some(d));
    }

    #[test]
    fn identical_paths_are_idempotent() {
        let [r, a] = ids();
        let mut hover = HoverStack::new();
        hover.update(&[r, a]);
        assert!(hover.update(&[r, a]).is_empty());
        assert!(hover.update(&[r, a]).is_empty());
    }

    #[test]
    fn moving_to_an_ancestor_only_exits() {
        let [r, a, b] = ids();
        let mut hover = HoverStack::new();
        hover.update(&[r, a, b]);
        assert_eq!(hover.update(&[r]).as_slice(), &[HoverEvent::Exit(b), HoverEvent::Exit(a)]);
        assert_eq!(
            hover.clear().as_slice(),
            &[HoverEvent::Exit(r)]
        );
        assert!(hover.is_empty());
    }

    #[test]
    fn forgetting_drops_the_item_and_its_descendants() {
        let [r, a, b, c] = ids();
        let mut hover = HoverStack::new();
        hover.update(&[r, a, b]);
        assert!(!hover.forget_item(c));
        assert!(hover.forget_item(a));
        assert_eq!(hover.items(), &[r]);
        // Nothing is left to exit for the forgotten items.
        assert_eq!(hover.update(&[r]).len(), 0);
    }
}
