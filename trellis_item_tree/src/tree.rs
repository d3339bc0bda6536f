// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, mutation, traversal, selection.

use alloc::{boxed::Box, vec, vec::Vec};

use hashbrown::HashMap;
use kurbo::{Affine, Point, Rect};
use smallvec::SmallVec;

use crate::error::{TreeError, TreeResult};
use crate::layout::Layout;
use crate::model::{ItemSource, ModelMirror};
use crate::mutation::{Changes, Mutation};
use crate::targets;
use crate::types::{
    Autoresizing, ControllerId, DecoratorKind, HandlerId, ItemDesc, ItemFlags, ItemId, ItemKind,
    Represented,
};

/// Arena holding every item, group, and decorator of a presentation tree.
///
/// Children and decorated content are owned downward; parent, decorated-item
/// and enclosing-item links are plain [`ItemId`]s, so the structure never forms
/// reference cycles. An item has at most one parent group at a time and a
/// decorator wraps at most one node.
///
/// Structural edits are applied immediately. Observers learn about them in
/// batches: each edit appends to a pending [`Changes`] record and marks the
/// affected groups dirty, and [`Tree::commit`] drains that record once per
/// event-loop turn.
///
/// ## Example
///
/// ```rust
/// use kurbo::Rect;
/// use trellis_item_tree::{ItemDesc, Mutation, Tree};
///
/// let mut tree = Tree::new();
/// let a = tree.insert_group(ItemDesc::with_frame(Rect::new(0.0, 0.0, 100.0, 100.0)));
/// let c = tree.insert_group(ItemDesc::default());
/// let b = tree.insert_item(ItemDesc::default());
/// tree.add_child(a, b).unwrap();
/// tree.add_child(a, c).unwrap();
/// let _ = tree.commit();
///
/// // Reparenting is reported once, as a move.
/// tree.add_child(c, b).unwrap();
/// let changes = tree.commit();
/// assert_eq!(changes.mutations.len(), 1);
/// assert!(matches!(changes.mutations[0], Mutation::Moved { .. }));
/// assert_eq!(tree.parent_of(b), Some(c));
/// ```
pub struct Tree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    changes: Changes,
    /// freed ids not yet drained by `take_destroyed`
    destroyed: Vec<ItemId>,
    layouts: HashMap<ItemId, Box<dyn Layout>>,
    sources: HashMap<ItemId, Box<dyn ItemSource>>,
    mirrors: HashMap<ItemId, Box<dyn ModelMirror>>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("pending_mutations", &self.changes.mutations.len())
            .field("layouts", &self.layouts.len())
            .finish_non_exhaustive()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Geometry and autoresizing a decorator took over when it was attached.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Snapshot {
    pub(crate) frame: Rect,
    pub(crate) autoresizing: Autoresizing,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    generation: u32,
    pub(crate) kind: ItemKind,
    pub(crate) parent: Option<ItemId>,
    /// Position in `parent`'s children, kept current so index paths are O(depth).
    pub(crate) index: usize,
    pub(crate) children: Vec<ItemId>,
    pub(crate) decorator: Option<ItemId>,
    pub(crate) decorated: Option<ItemId>,
    pub(crate) frame: Rect,
    pub(crate) transform: Affine,
    pub(crate) autoresizing: Autoresizing,
    pub(crate) flags: ItemFlags,
    pub(crate) handler: Option<HandlerId>,
    pub(crate) controller: Option<ControllerId>,
    pub(crate) represented: Option<Represented>,
    pub(crate) mutates_represented: bool,
    pub(crate) snapshot: Option<Snapshot>,
    dirty: bool,
}

impl Node {
    fn new(generation: u32, kind: ItemKind, desc: ItemDesc) -> Self {
        Self {
            generation,
            kind,
            parent: None,
            index: 0,
            children: Vec::new(),
            decorator: None,
            decorated: None,
            frame: desc.frame,
            transform: desc.transform,
            autoresizing: desc.autoresizing,
            flags: desc.flags,
            handler: desc.handler,
            controller: None,
            represented: desc.represented,
            mutates_represented: false,
            snapshot: None,
            dirty: false,
        }
    }
}

/// Which mirror hook an attachment reports to the receiving group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Hook {
    Append,
    Insert,
}

impl Tree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            changes: Changes::default(),
            destroyed: Vec::new(),
            layouts: HashMap::new(),
            sources: HashMap::new(),
            mirrors: HashMap::new(),
        }
    }

    fn alloc(&mut self, kind: ItemKind, desc: ItemDesc) -> ItemId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, kind, desc));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ItemId indices are 32-bit; the arena never grows past u32::MAX slots."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, kind, desc)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ItemId indices are 32-bit; the arena never grows past u32::MAX slots."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        ItemId::new(idx, generation)
    }

    /// Create a detached leaf item.
    pub fn insert_item(&mut self, desc: ItemDesc) -> ItemId {
        self.alloc(ItemKind::Item, desc)
    }

    /// Create a detached, empty item group.
    pub fn insert_group(&mut self, desc: ItemDesc) -> ItemId {
        self.alloc(ItemKind::Group, desc)
    }

    /// Create a detached decorator of the given kind.
    pub fn insert_decorator(&mut self, kind: DecoratorKind) -> ItemId {
        let desc = ItemDesc {
            flags: ItemFlags::VISIBLE,
            ..ItemDesc::default()
        };
        self.alloc(ItemKind::Decorator(kind), desc)
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: ItemId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Number of live nodes, decorators included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Returns true if the tree holds no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- structure ---

    /// Append `item` to `group`.
    ///
    /// If `item` already has a parent it is moved, and the move is recorded as
    /// a single [`Mutation::Moved`].
    ///
    /// # Panics
    ///
    /// Panics if `item` is a decorator or if `item` is `group` or one of its
    /// ancestors.
    pub fn add_child(&mut self, group: ItemId, item: ItemId) -> TreeResult<()> {
        let len = self.group_node(group)?.children.len();
        self.attach(group, len, &[item], Hook::Append)
    }

    /// Insert `item` into `group` at the gap `index` (`0..=len`).
    ///
    /// `index` refers to the children as they are before the call; when `item`
    /// already sits before that gap in the same group, it ends up at
    /// `index - 1`.
    ///
    /// # Panics
    ///
    /// Same preconditions as [`Tree::add_child`].
    pub fn insert_child(&mut self, group: ItemId, index: usize, item: ItemId) -> TreeResult<()> {
        self.attach(group, index, &[item], Hook::Insert)
    }

    /// Move or insert several distinct items so that they occupy consecutive
    /// positions starting at the gap `index`, in the given order.
    ///
    /// Each previously attached item is reported as one [`Mutation::Moved`],
    /// each detached one as one [`Mutation::Inserted`].
    ///
    /// # Panics
    ///
    /// Panics if `items` contains duplicates, plus the preconditions of
    /// [`Tree::add_child`].
    pub fn move_items(&mut self, group: ItemId, index: usize, items: &[ItemId]) -> TreeResult<()> {
        self.attach(group, index, items, Hook::Insert)
    }

    /// Move `item` into `group` at the gap `index`; see [`Tree::insert_child`].
    pub fn move_item(&mut self, item: ItemId, group: ItemId, index: usize) -> TreeResult<()> {
        self.insert_child(group, index, item)
    }

    fn attach(&mut self, group: ItemId, gap: usize, items: &[ItemId], hook: Hook) -> TreeResult<()> {
        let len = self.group_node(group)?.children.len();
        if gap > len {
            return Err(TreeError::IndexOutOfBounds { index: gap, len });
        }
        for (i, &item) in items.iter().enumerate() {
            let node = self.node_opt(item).ok_or(TreeError::StaleItem(item))?;
            assert!(
                !node.kind.is_decorator(),
                "decorator {item:?} cannot be the child of a group"
            );
            assert!(
                !self.is_ancestor_or_self(item, group),
                "cannot insert {item:?} into itself or its descendant {group:?}"
            );
            assert!(!items[..i].contains(&item), "{item:?} listed twice");
        }

        // Positions before anything is detached, for the mutation records.
        let origins: SmallVec<[Option<(ItemId, usize)>; 4]> = items
            .iter()
            .map(|&item| {
                let node = self.node(item);
                node.parent.map(|p| (p, node.index))
            })
            .collect();
        let shift = origins
            .iter()
            .filter(|o| matches!(o, Some((p, i)) if *p == group && *i < gap))
            .count();
        let start = gap - shift;

        for &item in items {
            if let Some(parent) = self.node(item).parent {
                self.unlink_parent(item, parent);
                self.mark_dirty(parent);
            }
        }
        for (offset, &item) in items.iter().enumerate() {
            self.link_parent(item, group, start + offset);
        }
        self.mark_dirty(group);

        for (offset, (&item, origin)) in items.iter().zip(origins.iter()).enumerate() {
            let to_index = start + offset;
            let mutation = match *origin {
                Some((from, from_index)) => Mutation::Moved {
                    item,
                    from,
                    from_index,
                    to: group,
                    to_index,
                },
                None => Mutation::Inserted {
                    group,
                    item,
                    index: to_index,
                },
            };
            self.record(mutation);
        }

        // The tree is consistent again; only now does the model hear about it.
        for (offset, (&item, origin)) in items.iter().zip(origins.iter()).enumerate() {
            let object = self.node(item).represented.clone();
            if let Some((from, from_index)) = *origin {
                self.mirror(from, |m| m.item_removed(item, object.as_ref(), from_index));
            }
            let index = start + offset;
            match hook {
                Hook::Append => self.mirror(group, |m| m.item_added(item, object.as_ref())),
                Hook::Insert => {
                    self.mirror(group, |m| m.item_inserted(item, object.as_ref(), index));
                }
            }
        }
        Ok(())
    }

    /// Detach `item` from its parent group and return its former index.
    ///
    /// The item stays alive (for example while it sits on a pickboard); its
    /// parent reference becomes `None`.
    pub fn remove_child(&mut self, item: ItemId) -> TreeResult<usize> {
        let node = self.node_opt(item).ok_or(TreeError::StaleItem(item))?;
        let parent = node.parent.ok_or(TreeError::Detached(item))?;
        let index = node.index;
        self.unlink_parent(item, parent);
        self.mark_dirty(parent);
        let mutation = Mutation::Removed {
            group: parent,
            item,
            index,
        };
        self.record(mutation);
        let object = self.node(item).represented.clone();
        self.mirror(parent, |m| m.item_removed(item, object.as_ref(), index));
        Ok(index)
    }

    /// Free `item`, its subtree, and every decorator around them.
    ///
    /// A decorator passed directly is first spliced out of its chain, which
    /// restores the geometry of the node it wrapped.
    pub fn destroy(&mut self, item: ItemId) -> TreeResult<()> {
        let node = self.node_opt(item).ok_or(TreeError::StaleItem(item))?;
        if node.kind.is_decorator() {
            if node.decorated.is_some() {
                self.remove_decorator(item)?;
            }
            let outer = self.node(item).decorator;
            debug_assert!(outer.is_none(), "spliced decorator keeps no wrapper");
            self.free(item);
            return Ok(());
        }
        if node.parent.is_some() {
            self.remove_child(item)?;
        }
        let mut stack = vec![item];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            stack.extend(node.children.iter().copied());
            if let Some(decorator) = node.decorator {
                stack.push(decorator);
            }
            self.free(id);
        }
        Ok(())
    }

    fn free(&mut self, id: ItemId) {
        self.destroyed.push(id);
        self.layouts.remove(&id);
        self.sources.remove(&id);
        self.mirrors.remove(&id);
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Deep-copy an item or group subtree into new detached nodes.
    ///
    /// Represented objects are shared, layouts are duplicated when they
    /// support it. Decorators, sources, mirrors, and controllers are not
    /// copied. Passing a decorator copies the item it decorates.
    pub fn duplicate(&mut self, item: ItemId) -> TreeResult<ItemId> {
        if !self.is_alive(item) {
            return Err(TreeError::StaleItem(item));
        }
        let item = self.first_decorated_item(item);
        let copy = self.duplicate_node(item);
        let children = self.node(item).children.clone();
        for child in children {
            let child_copy = self.duplicate(child)?;
            let index = self.node(copy).children.len();
            self.link_parent(child_copy, copy, index);
        }
        Ok(copy)
    }

    fn duplicate_node(&mut self, item: ItemId) -> ItemId {
        let node = self.node(item);
        let kind = node.kind;
        let desc = ItemDesc {
            frame: node.frame,
            transform: node.transform,
            flags: node.flags,
            autoresizing: node.autoresizing,
            handler: node.handler,
            represented: node.represented.clone(),
        };
        let mutates = node.mutates_represented;
        let layout = self.layouts.get(&item).and_then(|l| l.duplicate());
        let copy = self.alloc(kind, desc);
        self.node_mut(copy).mutates_represented = mutates;
        if let Some(layout) = layout {
            self.layouts.insert(copy, layout);
        }
        copy
    }

    /// Drain the changes recorded since the last commit.
    ///
    /// This is the batching point for deferred layout: callers recompute the
    /// arranged geometry of `dirty_groups` once per event-loop turn. Geometry
    /// read between a mutation and the next commit may be stale.
    pub fn commit(&mut self) -> Changes {
        let changes = core::mem::take(&mut self.changes);
        for &group in &changes.dirty_groups {
            if let Some(node) = self.node_opt_mut(group) {
                node.dirty = false;
            }
        }
        changes
    }

    /// Drain the ids freed since the last call, decorators and descendants
    /// included.
    ///
    /// Owners of side tables keyed by [`ItemId`] use this to drop entries for
    /// items destroyed by code they do not control.
    pub fn take_destroyed(&mut self) -> Vec<ItemId> {
        core::mem::take(&mut self.destroyed)
    }

    /// Mutations recorded since the last commit.
    pub fn pending_mutations(&self) -> &[Mutation] {
        &self.changes.mutations
    }

    // --- accessors ---

    /// Kind of a live node.
    pub fn kind(&self, id: ItemId) -> Option<ItemKind> {
        self.node_opt(id).map(|n| n.kind)
    }

    /// Returns true if `id` is a live group.
    pub fn is_group(&self, id: ItemId) -> bool {
        self.node_opt(id).is_some_and(|n| n.kind.is_group())
    }

    /// Returns true if `id` is a live decorator.
    pub fn is_decorator(&self, id: ItemId) -> bool {
        self.node_opt(id).is_some_and(|n| n.kind.is_decorator())
    }

    /// Parent group of a live item, or `None` for roots, decorators, and stale ids.
    pub fn parent_of(&self, id: ItemId) -> Option<ItemId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Children of a group, or an empty slice for leaves and stale ids.
    pub fn children_of(&self, id: ItemId) -> &[ItemId] {
        self.node_opt(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Position of an item in its parent group.
    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.node_opt(id)
            .and_then(|n| n.parent.is_some().then_some(n.index))
    }

    /// Frame of a node in its enclosing item's content space.
    pub fn frame(&self, id: ItemId) -> Option<Rect> {
        self.node_opt(id).map(|n| n.frame)
    }

    /// Bounds of a node's content in its own coordinate space.
    pub fn content_bounds(&self, id: ItemId) -> Option<Rect> {
        self.node_opt(id)
            .map(|n| Rect::from_origin_size(Point::ORIGIN, n.frame.size()))
    }

    /// Update a node's frame and invalidate the group that arranges it.
    pub fn set_frame(&mut self, id: ItemId, frame: Rect) -> TreeResult<()> {
        let node = self.node_opt_mut(id).ok_or(TreeError::StaleItem(id))?;
        if node.frame != frame {
            node.frame = frame;
            let semantic = self.first_decorated_item(id);
            if let Some(parent) = self.parent_of(semantic) {
                self.mark_dirty(parent);
            }
        }
        Ok(())
    }

    /// Content transform of a node.
    pub fn transform(&self, id: ItemId) -> Option<Affine> {
        self.node_opt(id).map(|n| n.transform)
    }

    /// Update a node's content transform.
    pub fn set_transform(&mut self, id: ItemId, transform: Affine) -> TreeResult<()> {
        let node = self.node_opt_mut(id).ok_or(TreeError::StaleItem(id))?;
        node.transform = transform;
        Ok(())
    }

    /// Autoresizing mask of a node.
    pub fn autoresizing(&self, id: ItemId) -> Option<Autoresizing> {
        self.node_opt(id).map(|n| n.autoresizing)
    }

    /// Update a node's autoresizing mask.
    pub fn set_autoresizing(&mut self, id: ItemId, mask: Autoresizing) -> TreeResult<()> {
        let node = self.node_opt_mut(id).ok_or(TreeError::StaleItem(id))?;
        node.autoresizing = mask;
        Ok(())
    }

    /// Flags of a node.
    pub fn flags(&self, id: ItemId) -> Option<ItemFlags> {
        self.node_opt(id).map(|n| n.flags)
    }

    /// Replace a node's flags.
    pub fn set_flags(&mut self, id: ItemId, flags: ItemFlags) -> TreeResult<()> {
        let node = self.node_opt_mut(id).ok_or(TreeError::StaleItem(id))?;
        node.flags = flags;
        Ok(())
    }

    /// Show or hide a node. Hidden nodes are skipped by hit testing.
    pub fn set_visible(&mut self, id: ItemId, visible: bool) -> TreeResult<()> {
        let node = self.node_opt_mut(id).ok_or(TreeError::StaleItem(id))?;
        node.flags.set(ItemFlags::VISIBLE, visible);
        Ok(())
    }

    /// Action handler key of a node.
    pub fn handler(&self, id: ItemId) -> Option<HandlerId> {
        self.node_opt(id).and_then(|n| n.handler)
    }

    /// Bind (or unbind) a shared action handler.
    pub fn set_handler(&mut self, id: ItemId, handler: Option<HandlerId>) -> TreeResult<()> {
        let node = self.node_opt_mut(id).ok_or(TreeError::StaleItem(id))?;
        node.handler = handler;
        Ok(())
    }

    /// Controller bound to an item.
    pub fn controller(&self, id: ItemId) -> Option<ControllerId> {
        self.node_opt(id).and_then(|n| n.controller)
    }

    /// Bind (or unbind) a controller. An item with a controller is a base item.
    pub fn set_controller(&mut self, id: ItemId, controller: Option<ControllerId>) -> TreeResult<()> {
        let node = self.node_opt_mut(id).ok_or(TreeError::StaleItem(id))?;
        node.controller = controller;
        Ok(())
    }

    /// Represented model object of an item.
    pub fn represented(&self, id: ItemId) -> Option<&Represented> {
        self.node_opt(id).and_then(|n| n.represented.as_ref())
    }

    /// Replace the represented model object of an item.
    pub fn set_represented(&mut self, id: ItemId, object: Option<Represented>) -> TreeResult<()> {
        let node = self.node_opt_mut(id).ok_or(TreeError::StaleItem(id))?;
        node.represented = object;
        Ok(())
    }

    // --- layout, model, and source seams ---

    /// Install the layout of a group; this invalidates its arranged geometry.
    pub fn set_layout(&mut self, group: ItemId, layout: Box<dyn Layout>) -> TreeResult<()> {
        self.group_node(group)?;
        self.layouts.insert(group, layout);
        self.mark_dirty(group);
        Ok(())
    }

    /// Remove the layout of a group.
    pub fn remove_layout(&mut self, group: ItemId) -> Option<Box<dyn Layout>> {
        let layout = self.layouts.remove(&group)?;
        self.mark_dirty(group);
        Some(layout)
    }

    /// Layout of a group, if one is installed.
    pub fn layout(&self, group: ItemId) -> Option<&dyn Layout> {
        if !self.is_alive(group) {
            return None;
        }
        self.layouts.get(&group).map(|l| &**l)
    }

    /// Whether mutations of `group` are mirrored to its model.
    pub fn mutates_represented_object(&self, group: ItemId) -> bool {
        self.node_opt(group).is_some_and(|n| n.mutates_represented)
    }

    /// Enable or disable mirroring of `group`'s mutations to its model.
    pub fn set_mutates_represented_object(&mut self, group: ItemId, enabled: bool) -> TreeResult<()> {
        self.group_node(group)?;
        self.node_mut(group).mutates_represented = enabled;
        Ok(())
    }

    /// Install the receiver of mirrored mutations for `group`.
    pub fn set_model_mirror(&mut self, group: ItemId, mirror: Box<dyn ModelMirror>) -> TreeResult<()> {
        self.group_node(group)?;
        self.mirrors.insert(group, mirror);
        Ok(())
    }

    /// Remove and return the mirror of `group`.
    pub fn take_model_mirror(&mut self, group: ItemId) -> Option<Box<dyn ModelMirror>> {
        self.mirrors.remove(&group)
    }

    /// Borrow the mirror of `group`.
    pub fn model_mirror(&self, group: ItemId) -> Option<&dyn ModelMirror> {
        self.mirrors.get(&group).map(|m| &**m)
    }

    fn mirror(&mut self, group: ItemId, f: impl FnOnce(&mut dyn ModelMirror)) {
        if !self.mutates_represented_object(group) {
            return;
        }
        if let Some(mirror) = self.mirrors.get_mut(&group) {
            f(&mut **mirror);
        }
    }

    /// Install an external provider of `group`'s children.
    pub fn set_source(&mut self, group: ItemId, source: Box<dyn ItemSource>) -> TreeResult<()> {
        self.group_node(group)?;
        self.sources.insert(group, source);
        Ok(())
    }

    /// Remove the source of `group`.
    pub fn remove_source(&mut self, group: ItemId) -> Option<Box<dyn ItemSource>> {
        self.sources.remove(&group)
    }

    /// Replace the children of a sourced group with fresh items from its source.
    ///
    /// Returns the new number of children. Groups without a source are left
    /// unchanged.
    pub fn reload(&mut self, group: ItemId) -> TreeResult<usize> {
        self.group_node(group)?;
        let Some(mut source) = self.sources.remove(&group) else {
            return Ok(self.children_of(group).len());
        };
        let result = self.reload_from(group, &mut *source);
        self.sources.insert(group, source);
        result
    }

    fn reload_from(&mut self, group: ItemId, source: &mut dyn ItemSource) -> TreeResult<usize> {
        let old: Vec<ItemId> = self.children_of(group).to_vec();
        for child in old {
            self.destroy(child)?;
        }
        let count = source.item_count(self, group);
        for index in 0..count {
            let item = source.item_at(self, group, index);
            self.add_child(group, item)?;
        }
        tracing::debug!(target: targets::TREE, ?group, count, "reloaded group from source");
        Ok(count)
    }

    // --- selection ---

    /// Select or deselect an item. Returns whether the item is now selected.
    ///
    /// Items without [`ItemFlags::SELECTABLE`] never become selected.
    pub fn set_selected(&mut self, id: ItemId, selected: bool) -> TreeResult<bool> {
        let node = self.node_opt_mut(id).ok_or(TreeError::StaleItem(id))?;
        let selected = selected && node.flags.contains(ItemFlags::SELECTABLE);
        node.flags.set(ItemFlags::SELECTED, selected);
        Ok(selected)
    }

    /// Make exactly the children at `indexes` selected.
    pub fn set_selection_indexes(&mut self, group: ItemId, indexes: &[usize]) -> TreeResult<()> {
        let len = self.group_node(group)?.children.len();
        if let Some(&index) = indexes.iter().find(|&&i| i >= len) {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        for i in 0..len {
            let child = self.node(group).children[i];
            self.set_selected(child, indexes.contains(&i))?;
        }
        Ok(())
    }

    /// Indexes of the selected children of `group`, ascending.
    pub fn selection_indexes(&self, group: ItemId) -> Vec<usize> {
        self.children_of(group)
            .iter()
            .enumerate()
            .filter(|(_, c)| self.is_selected(**c))
            .map(|(i, _)| i)
            .collect()
    }

    /// Selected children of `group`, in child order.
    pub fn selected_items(&self, group: ItemId) -> Vec<ItemId> {
        self.children_of(group)
            .iter()
            .copied()
            .filter(|&c| self.is_selected(c))
            .collect()
    }

    /// Returns true if the item is selected.
    pub fn is_selected(&self, id: ItemId) -> bool {
        self.node_opt(id)
            .is_some_and(|n| n.flags.contains(ItemFlags::SELECTED))
    }

    // --- traversal ---

    /// Iterate the ancestors of an item, nearest first.
    pub fn ancestors(&self, id: ItemId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent_of(id),
        }
    }

    /// Returns true if `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: ItemId, id: ItemId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Returns true if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: ItemId, id: ItemId) -> bool {
        ancestor == id || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Topmost ancestor of an item (the item itself when it is a root).
    pub fn root_of(&self, id: ItemId) -> ItemId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Index path leading from `relative_to` down to `id`.
    ///
    /// Returns an empty path when both are the same item and `None` when
    /// `relative_to` is not an ancestor of `id`. Runs in O(depth).
    pub fn index_path(&self, id: ItemId, relative_to: ItemId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = self.node_opt(id).map(|_| id)?;
        while current != relative_to {
            let node = self.node(current);
            let parent = node.parent?;
            path.push(node.index);
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    /// Item reached by following `path` down from `root`.
    pub fn item_at_index_path(&self, root: ItemId, path: &[usize]) -> Option<ItemId> {
        let mut current = self.node_opt(root).map(|_| root)?;
        for &index in path {
            current = *self.children_of(current).get(index)?;
        }
        Some(current)
    }

    /// Nearest ancestor-or-self acting as a controller boundary.
    pub fn base_item(&self, id: ItemId) -> Option<ItemId> {
        let id = self.first_decorated_item(id);
        core::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&a| self.controller(a).is_some())
    }

    /// Nearest ancestor-or-self whose outermost decorator is a window.
    pub fn window_backed_item(&self, id: ItemId) -> Option<ItemId> {
        let id = self.first_decorated_item(id);
        core::iter::once(id).chain(self.ancestors(id)).find(|&a| {
            let outer = self.last_decorator(a);
            outer != a && matches!(self.kind(outer), Some(ItemKind::Decorator(DecoratorKind::Window)))
        })
    }

    /// The item and all its descendants, in pre-order.
    pub fn subtree(&self, id: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        if !self.is_alive(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children_of(current).iter().rev().copied());
        }
        out
    }

    /// Topmost visible child of `group` whose display frame contains
    /// `location` (in `group`'s content space). Later children are on top.
    pub fn topmost_child_at(&self, group: ItemId, location: Point) -> Option<ItemId> {
        self.children_of(group).iter().rev().copied().find(|&child| {
            self.flags(child)
                .is_some_and(|f| f.contains(ItemFlags::VISIBLE))
                && self
                    .display_frame(child)
                    .is_some_and(|frame| frame.contains(location))
        })
    }

    // --- internals ---

    fn group_node(&self, group: ItemId) -> TreeResult<&Node> {
        let node = self.node_opt(group).ok_or(TreeError::StaleItem(group))?;
        if !node.kind.is_group() {
            return Err(TreeError::NotAGroup(group));
        }
        Ok(node)
    }

    pub(crate) fn mark_dirty(&mut self, group: ItemId) {
        if let Some(node) = self.node_opt_mut(group)
            && !node.dirty
        {
            node.dirty = true;
            self.changes.dirty_groups.push(group);
        }
    }

    pub(crate) fn record(&mut self, mutation: Mutation) {
        tracing::debug!(target: targets::TREE, ?mutation, "tree mutation");
        self.changes.mutations.push(mutation);
    }

    /// Access a node; panics if `id` is stale.
    pub(crate) fn node(&self, id: ItemId) -> &Node {
        self.node_opt(id).expect("dangling ItemId")
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: ItemId) -> &mut Node {
        self.node_opt_mut(id).expect("dangling ItemId")
    }

    pub(crate) fn node_opt(&self, id: ItemId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    pub(crate) fn node_opt_mut(&mut self, id: ItemId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn link_parent(&mut self, id: ItemId, parent: ItemId, index: usize) {
        self.node_mut(parent).children.insert(index, id);
        self.node_mut(id).parent = Some(parent);
        self.renumber(parent, index);
    }

    fn unlink_parent(&mut self, id: ItemId, parent: ItemId) {
        let index = self.node(id).index;
        debug_assert_eq!(
            self.node(parent).children.get(index),
            Some(&id),
            "cached child index out of date"
        );
        self.node_mut(parent).children.remove(index);
        self.node_mut(id).parent = None;
        self.renumber(parent, index);
    }

    fn renumber(&mut self, group: ItemId, from: usize) {
        let len = self.node(group).children.len();
        for i in from..len {
            let child = self.node(group).children[i];
            self.node_mut(child).index = i;
        }
    }
}

/// Iterator over the ancestors of an item, nearest first.
#[derive(Clone, Debug)]
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<ItemId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ItemId;

    fn next(&mut self) -> Option<ItemId> {
        let current = self.next?;
        self.next = self.tree.parent_of(current);
        Some(current)
    }
}
