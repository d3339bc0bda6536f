// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single named, scoped pickboard.

use alloc::collections::VecDeque;
use alloc::string::String;

use trellis_item_tree::ItemId;

use crate::error::{PickboardError, PickboardResult};
use crate::picked::Picked;
use crate::targets;

/// Opaque reference to an object on a pickboard.
///
/// References are unique per board and never reused, even after the object
/// they named was removed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickRef(u64);

/// Who can see a pickboard.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PickboardScope {
    /// Shared with other processes.
    System,
    /// Shared by the documents of one project.
    Project,
    /// Private to this process.
    Local,
}

#[derive(Clone, Debug)]
struct Entry {
    reference: PickRef,
    object: Picked,
}

/// Ordered store of picked objects.
///
/// Entries are kept oldest first. [`push_object`](Self::push_object) and
/// [`pop_object`](Self::pop_object) use the board as a stack (newest on top);
/// [`append_object`](Self::append_object) and
/// [`pop_first_object`](Self::pop_first_object) use it as a queue.
#[derive(Clone, Debug)]
pub struct Pickboard {
    name: String,
    scope: PickboardScope,
    entries: VecDeque<Entry>,
    next_ref: u64,
    active: bool,
}

impl Pickboard {
    /// Create an empty, inactive board.
    pub fn new(name: impl Into<String>, scope: PickboardScope) -> Self {
        Self {
            name: name.into(),
            scope,
            entries: VecDeque::new(),
            next_ref: 0,
            active: false,
        }
    }

    /// Name of the board.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scope of the board.
    pub fn scope(&self) -> PickboardScope {
        self.scope
    }

    /// Whether this is the active board of its registry.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        if self.active && !active {
            tracing::debug!(target: targets::PICKBOARD, name = %self.name, "pickboard became inactive");
        }
        self.active = active;
    }

    /// Number of objects on the board.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the board holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn issue(&mut self, object: Picked) -> Entry {
        let reference = PickRef(self.next_ref);
        self.next_ref += 1;
        Entry { reference, object }
    }

    /// Put `object` on top of the stack.
    pub fn push_object(&mut self, object: Picked) -> PickRef {
        let entry = self.issue(object);
        let reference = entry.reference;
        tracing::debug!(target: targets::PICKBOARD, ?reference, object = ?entry.object, "push");
        self.entries.push_back(entry);
        reference
    }

    /// Take the object on top of the stack (the newest one).
    pub fn pop_object(&mut self) -> PickboardResult<Picked> {
        let entry = self.entries.pop_back().ok_or(PickboardError::Empty)?;
        Ok(entry.object)
    }

    /// Enqueue `object` behind everything already on the board.
    pub fn append_object(&mut self, object: Picked) -> PickRef {
        let entry = self.issue(object);
        let reference = entry.reference;
        tracing::debug!(target: targets::PICKBOARD, ?reference, object = ?entry.object, "append");
        self.entries.push_back(entry);
        reference
    }

    /// Take the oldest object.
    pub fn pop_first_object(&mut self) -> PickboardResult<Picked> {
        let entry = self.entries.pop_front().ok_or(PickboardError::Empty)?;
        Ok(entry.object)
    }

    /// Newest object, without removing it.
    pub fn top_object(&self) -> Option<&Picked> {
        self.entries.back().map(|e| &e.object)
    }

    /// Oldest object, without removing it.
    pub fn first_object(&self) -> Option<&Picked> {
        self.entries.front().map(|e| &e.object)
    }

    /// Reference of the newest object.
    pub fn top_reference(&self) -> Option<PickRef> {
        self.entries.back().map(|e| e.reference)
    }

    /// Object named by `reference`.
    pub fn object_for_ref(&self, reference: PickRef) -> PickboardResult<&Picked> {
        self.entries
            .iter()
            .find(|e| e.reference == reference)
            .map(|e| &e.object)
            .ok_or(PickboardError::UnknownReference(reference))
    }

    /// Remove and return the object named by `reference`.
    pub fn remove_object(&mut self, reference: PickRef) -> PickboardResult<Picked> {
        let index = self
            .entries
            .iter()
            .position(|e| e.reference == reference)
            .ok_or(PickboardError::UnknownReference(reference))?;
        self.entries
            .remove(index)
            .map(|e| e.object)
            .ok_or(PickboardError::UnknownReference(reference))
    }

    /// Drop every reference to `item`.
    ///
    /// Collections shrink; entries left empty disappear. Returns the number of
    /// entries that changed.
    pub fn forget_item(&mut self, item: ItemId) -> usize {
        let mut changed = 0;
        self.entries.retain_mut(|entry| {
            if !entry.object.contains_item(item) {
                return true;
            }
            changed += 1;
            match entry.object.without_item(item) {
                Some(rest) => {
                    entry.object = rest;
                    true
                }
                None => false,
            }
        });
        if changed > 0 {
            tracing::debug!(target: targets::PICKBOARD, ?item, changed, name = %self.name, "forgot item");
        }
        changed
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picked::PickCollection;
    use alloc::vec::Vec;
    use trellis_item_tree::{ItemDesc, Tree};

    fn items(n: usize) -> Vec<ItemId> {
        let mut tree = Tree::new();
        (0..n).map(|_| tree.insert_item(ItemDesc::default())).collect()
    }

    #[test]
    fn push_pop_is_lifo() {
        let ids = items(2);
        let (x, y) = (ids[0], ids[1]);
        let mut board = Pickboard::new("test", PickboardScope::Local);
        board.push_object(Picked::Item(x));
        board.push_object(Picked::Item(y));
        assert_eq!(board.pop_object(), Ok(Picked::Item(y)));
        assert_eq!(board.pop_object(), Ok(Picked::Item(x)));
        assert_eq!(board.pop_object(), Err(PickboardError::Empty));
    }

    #[test]
    fn append_pop_first_is_fifo() {
        let ids = items(2);
        let (x, y) = (ids[0], ids[1]);
        let mut board = Pickboard::new("test", PickboardScope::Local);
        board.append_object(Picked::Item(x));
        board.append_object(Picked::Item(y));
        assert_eq!(board.pop_first_object(), Ok(Picked::Item(x)));
        assert_eq!(board.pop_first_object(), Ok(Picked::Item(y)));
        assert!(board.is_empty());
    }

    #[test]
    fn every_push_is_poppable_once() {
        let ids = items(5);
        let mut board = Pickboard::new("test", PickboardScope::Project);
        for &id in &ids {
            board.push_object(Picked::Item(id));
        }
        let mut popped = Vec::new();
        while let Ok(Picked::Item(id)) = board.pop_object() {
            popped.push(id);
        }
        popped.reverse();
        assert_eq!(popped, ids);
    }

    #[test]
    fn references_are_unique_and_not_reused() {
        let ids = items(2);
        let mut board = Pickboard::new("test", PickboardScope::Local);
        let a = board.push_object(Picked::Item(ids[0]));
        assert_eq!(board.remove_object(a), Ok(Picked::Item(ids[0])));
        let b = board.push_object(Picked::Item(ids[1]));
        assert_ne!(a, b);
        assert_eq!(
            board.object_for_ref(a),
            Err(PickboardError::UnknownReference(a))
        );
        assert_eq!(board.object_for_ref(b), Ok(&Picked::Item(ids[1])));
    }

    #[test]
    fn forget_item_scrubs_collections() {
        let ids = items(3);
        let mut board = Pickboard::new("test", PickboardScope::Local);
        board.push_object(Picked::Item(ids[0]));
        board.push_object(Picked::Collection(PickCollection::from_items([
            ids[0], ids[1],
        ])));
        board.push_object(Picked::Item(ids[2]));
        assert_eq!(board.forget_item(ids[0]), 2);
        assert_eq!(board.len(), 2);
        assert_eq!(board.first_object().map(Picked::items), Some(alloc::vec![ids[1]]));
        assert_eq!(board.top_object(), Some(&Picked::Item(ids[2])));
    }
}
