// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Picked objects and pick collections.

use alloc::rc::Rc;
use alloc::vec::Vec;

use smallvec::SmallVec;
use trellis_item_tree::{ItemId, Represented};

/// Type tag of a picked object, used by drop targets to decide acceptance.
///
/// Tags are plain strings so applications can mint their own, in the style of
/// MIME types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickType(pub &'static str);

impl PickType {
    /// A presentation item picked out of the tree.
    pub const ITEM: Self = Self("trellis/item");
    /// Plain text.
    pub const TEXT: Self = Self("text/plain");

    /// Name of the type tag.
    pub fn name(self) -> &'static str {
        self.0
    }
}

/// Something that has been picked: one item, one typed value, or an ordered
/// bundle of several picked objects.
#[derive(Clone)]
pub enum Picked {
    /// A presentation item. While on a pickboard it may be detached.
    Item(ItemId),
    /// A model value with its type tag.
    Value {
        /// Type tag.
        ty: PickType,
        /// The value itself.
        value: Represented,
    },
    /// Several objects picked together.
    Collection(PickCollection),
}

impl core::fmt::Debug for Picked {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Item(id) => f.debug_tuple("Item").field(id).finish(),
            Self::Value { ty, .. } => f
                .debug_struct("Value")
                .field("ty", ty)
                .finish_non_exhaustive(),
            Self::Collection(c) => f.debug_tuple("Collection").field(c).finish(),
        }
    }
}

impl PartialEq for Picked {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Item(a), Self::Item(b)) => a == b,
            (Self::Value { ty: ta, value: va }, Self::Value { ty: tb, value: vb }) => {
                ta == tb && Rc::ptr_eq(va, vb)
            }
            (Self::Collection(a), Self::Collection(b)) => a == b,
            _ => false,
        }
    }
}

impl From<ItemId> for Picked {
    fn from(id: ItemId) -> Self {
        Self::Item(id)
    }
}

impl Picked {
    /// Distinct type tags of the picked objects, in first-seen order.
    ///
    /// A collection reports the types of its elements, never a type of its own.
    pub fn types(&self) -> SmallVec<[PickType; 2]> {
        let mut out = SmallVec::new();
        let mut push = |ty: PickType| {
            if !out.contains(&ty) {
                out.push(ty);
            }
        };
        match self {
            Self::Item(_) => push(PickType::ITEM),
            Self::Value { ty, .. } => push(*ty),
            Self::Collection(c) => c.iter().for_each(|p| match p {
                Self::Item(_) => push(PickType::ITEM),
                Self::Value { ty, .. } => push(*ty),
                Self::Collection(_) => {}
            }),
        }
        out
    }

    /// Returns true if `item` is this object or part of it.
    pub fn contains_item(&self, item: ItemId) -> bool {
        match self {
            Self::Item(id) => *id == item,
            Self::Value { .. } => false,
            Self::Collection(c) => c.contains_item(item),
        }
    }

    /// Items among the picked objects, in order.
    pub fn items(&self) -> Vec<ItemId> {
        match self {
            Self::Item(id) => alloc::vec![*id],
            Self::Value { .. } => Vec::new(),
            Self::Collection(c) => c.items(),
        }
    }

    /// Number of distinct objects a drop of this will insert.
    pub fn count(&self) -> usize {
        match self {
            Self::Collection(c) => c.len(),
            _ => 1,
        }
    }

    /// This object with every reference to `item` removed.
    ///
    /// Returns `None` when nothing is left.
    pub fn without_item(&self, item: ItemId) -> Option<Self> {
        match self {
            Self::Item(id) if *id == item => None,
            Self::Collection(c) if c.contains_item(item) => {
                let rest = c.without_item(item);
                (!rest.is_empty()).then_some(Self::Collection(rest))
            }
            other => Some(other.clone()),
        }
    }
}

/// An immutable, ordered bundle of picked objects.
///
/// Dropping a collection inserts each element as its own object, keeping the
/// order. Nested collections are flattened on construction, so elements are
/// always items or values.
#[derive(Clone, PartialEq)]
pub struct PickCollection {
    objects: Rc<[Picked]>,
}

impl core::fmt::Debug for PickCollection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.objects.iter()).finish()
    }
}

impl PickCollection {
    /// Bundle `objects`, flattening nested collections.
    pub fn new(objects: impl IntoIterator<Item = Picked>) -> Self {
        let mut flat = Vec::new();
        for object in objects {
            match object {
                Picked::Collection(inner) => flat.extend(inner.iter().cloned()),
                other => flat.push(other),
            }
        }
        Self {
            objects: flat.into(),
        }
    }

    /// Bundle items, in the given order.
    pub fn from_items(items: impl IntoIterator<Item = ItemId>) -> Self {
        Self::new(items.into_iter().map(Picked::Item))
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the collection holds nothing.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate the objects in order.
    pub fn iter(&self) -> core::slice::Iter<'_, Picked> {
        self.objects.iter()
    }

    /// Object at `index`.
    pub fn get(&self, index: usize) -> Option<&Picked> {
        self.objects.get(index)
    }

    /// Returns true if `item` is one of the objects.
    pub fn contains_item(&self, item: ItemId) -> bool {
        self.objects.iter().any(|p| p.contains_item(item))
    }

    /// Items among the objects, in order.
    pub fn items(&self) -> Vec<ItemId> {
        self.objects
            .iter()
            .filter_map(|p| match p {
                Picked::Item(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// A new collection without `item`.
    pub fn without_item(&self, item: ItemId) -> Self {
        Self::new(
            self.objects
                .iter()
                .filter(|p| !p.contains_item(item))
                .cloned(),
        )
    }
}

impl<'a> IntoIterator for &'a PickCollection {
    type Item = &'a Picked;
    type IntoIter = core::slice::Iter<'a, Picked>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_item_tree::{ItemDesc, Tree};

    fn items(n: usize) -> Vec<ItemId> {
        let mut tree = Tree::new();
        (0..n).map(|_| tree.insert_item(ItemDesc::default())).collect()
    }

    #[test]
    fn collections_flatten_and_keep_order() {
        let ids = items(3);
        let inner = PickCollection::from_items([ids[1], ids[2]]);
        let outer = PickCollection::new([Picked::Item(ids[0]), Picked::Collection(inner)]);
        assert_eq!(outer.len(), 3);
        assert_eq!(outer.items(), ids);
    }

    #[test]
    fn without_item_shrinks_or_vanishes() {
        let ids = items(2);
        let both = Picked::Collection(PickCollection::from_items(ids.clone()));
        let rest = both.without_item(ids[0]).unwrap();
        assert_eq!(rest.items(), alloc::vec![ids[1]]);
        assert!(rest.without_item(ids[1]).is_none());
        assert!(Picked::Item(ids[0]).without_item(ids[0]).is_none());
        assert_eq!(
            Picked::Item(ids[1]).without_item(ids[0]),
            Some(Picked::Item(ids[1]))
        );
    }

    #[test]
    fn types_of_mixed_collection() {
        let ids = items(2);
        let text: Represented = Rc::new("hello");
        let mixed = Picked::Collection(PickCollection::new([
            Picked::Item(ids[0]),
            Picked::Value {
                ty: PickType::TEXT,
                value: text,
            },
            Picked::Item(ids[1]),
        ]));
        assert_eq!(mixed.types().as_slice(), &[PickType::ITEM, PickType::TEXT]);
        assert_eq!(mixed.count(), 3);
    }
}
