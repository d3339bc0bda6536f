// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The action handler interface and the standard handler.

use core::cell::Cell;

use kurbo::{Point, Vec2};
use smallvec::SmallVec;
use trellis_item_tree::{ItemFlags, ItemId, Tree};
use trellis_pickboard::{PickCollection, PickType, Picked, Pickboards, PickingMask};

use crate::action::{Action, EditCommand, Handled, Key, KeyInput, Modifiers, Touch};
use crate::pick_drop;
use crate::targets;

/// Mutable state handlers act on.
///
/// Built by the caller for one dispatch and threaded through every handler
/// call; there is no ambient global state.
#[derive(Debug)]
pub struct ActionCx<'a> {
    /// The presentation tree.
    pub tree: &'a mut Tree,
    /// The pickboards.
    pub pickboards: &'a mut Pickboards,
    /// Modifiers held when the action happened.
    pub modifiers: Modifiers,
    /// Picking mask of the originating event.
    pub picking_mask: PickingMask,
}

impl<'a> ActionCx<'a> {
    /// Create a context without modifiers or picking mask.
    pub fn new(tree: &'a mut Tree, pickboards: &'a mut Pickboards) -> Self {
        Self {
            tree,
            pickboards,
            modifiers: Modifiers::empty(),
            picking_mask: PickingMask::empty(),
        }
    }

    /// Set the modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set the picking mask.
    pub fn with_picking_mask(mut self, mask: PickingMask) -> Self {
        self.picking_mask = mask;
        self
    }

    /// Map a location from the root content space into `item`'s content space.
    pub fn local_point(&self, item: ItemId, location: Point) -> Option<Point> {
        let root = self.tree.root_of(self.tree.first_decorated_item(item));
        self.tree.convert_point_from_ancestor(root, item, location)
    }
}

/// Where a drop lands inside the target group.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DropIndex {
    /// Insert at this gap.
    At(usize),
    /// Drop "onto" the group; the handler decides the position.
    Undetermined,
}

/// An accepted drop: the group receiving the objects and the gap they go to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ValidatedDrop {
    /// Receiving group.
    pub target: ItemId,
    /// Gap index in `target`.
    pub index: usize,
}

/// Responds to semantic actions for the items bound to it.
///
/// Handlers are shared by many items and take `&self`; transient session state
/// lives in cells. Every action method defaults to [`Handled::No`], so a
/// handler implements only what it responds to. Query methods answer yes/no
/// questions and must not mutate anything.
pub trait ActionHandler {
    /// Route an action to the matching method.
    fn handle(&self, cx: &mut ActionCx<'_>, item: ItemId, action: &Action) -> Handled {
        match *action {
            Action::Click { location, count } => self.handle_click(cx, item, location, count),
            Action::DoubleClick { location } => self.handle_double_click(cx, item, location),
            Action::DragBy { delta } => self.handle_drag_by(cx, item, delta),
            Action::KeyDown(key) => self.handle_key_down(cx, item, key),
            Action::KeyUp(key) => self.handle_key_up(cx, item, key),
            Action::BeginTouch(touch) => self.handle_begin_touch(cx, item, touch),
            Action::MoveTouch(touch) => self.handle_move_touch(cx, item, touch),
            Action::EndTouch(touch) => self.handle_end_touch(cx, item, touch),
            Action::Enter => self.handle_enter(cx, item),
            Action::Exit => self.handle_exit(cx, item),
            Action::Edit(command) => self.handle_edit(cx, item, command),
        }
    }

    /// A click on `item`.
    fn handle_click(&self, cx: &mut ActionCx<'_>, item: ItemId, location: Point, count: u32) -> Handled {
        let _ = (cx, item, location, count);
        Handled::No
    }

    /// A double click on `item`.
    fn handle_double_click(&self, cx: &mut ActionCx<'_>, item: ItemId, location: Point) -> Handled {
        let _ = (cx, item, location);
        Handled::No
    }

    /// A plain drag of `item` by `delta`.
    fn handle_drag_by(&self, cx: &mut ActionCx<'_>, item: ItemId, delta: Vec2) -> Handled {
        let _ = (cx, item, delta);
        Handled::No
    }

    /// A key press.
    fn handle_key_down(&self, cx: &mut ActionCx<'_>, item: ItemId, key: KeyInput) -> Handled {
        let _ = (cx, item, key);
        Handled::No
    }

    /// A key release.
    fn handle_key_up(&self, cx: &mut ActionCx<'_>, item: ItemId, key: KeyInput) -> Handled {
        let _ = (cx, item, key);
        Handled::No
    }

    /// A touch started on `item`.
    fn handle_begin_touch(&self, cx: &mut ActionCx<'_>, item: ItemId, touch: Touch) -> Handled {
        let _ = (cx, item, touch);
        Handled::No
    }

    /// A touch moved.
    fn handle_move_touch(&self, cx: &mut ActionCx<'_>, item: ItemId, touch: Touch) -> Handled {
        let _ = (cx, item, touch);
        Handled::No
    }

    /// A touch ended.
    fn handle_end_touch(&self, cx: &mut ActionCx<'_>, item: ItemId, touch: Touch) -> Handled {
        let _ = (cx, item, touch);
        Handled::No
    }

    /// The pointer entered `item`.
    fn handle_enter(&self, cx: &mut ActionCx<'_>, item: ItemId) -> Handled {
        let _ = (cx, item);
        Handled::No
    }

    /// The pointer left `item`.
    fn handle_exit(&self, cx: &mut ActionCx<'_>, item: ItemId) -> Handled {
        let _ = (cx, item);
        Handled::No
    }

    /// An editing command targeting `item`.
    fn handle_edit(&self, cx: &mut ActionCx<'_>, item: ItemId, command: EditCommand) -> Handled {
        let _ = (cx, item, command);
        Handled::No
    }

    /// Whether `item` may become selected.
    fn can_select(&self, tree: &Tree, item: ItemId) -> bool {
        tree.flags(item)
            .is_some_and(|f| f.contains(ItemFlags::SELECTABLE))
    }

    /// Whether `item` may be dragged. A forced pick overrides a `false`.
    fn can_drag_item(&self, tree: &Tree, item: ItemId) -> bool {
        tree.is_alive(item)
    }

    /// Whether `item` leaves its group as soon as it is picked with `mask`.
    fn should_remove_item_at_pick_time(&self, tree: &Tree, item: ItemId, mask: PickingMask) -> bool {
        let _ = (tree, item);
        mask.removes_source()
    }

    /// Whether drops of this type are accepted.
    fn can_accept_type(&self, ty: PickType) -> bool {
        ty == PickType::ITEM
    }

    /// A drag of `item` starts at `location`. Returning `false` vetoes it.
    fn handle_drag_item_begin(&self, cx: &mut ActionCx<'_>, item: ItemId, location: Point) -> bool {
        let _ = (cx, item, location);
        true
    }

    /// A drag carrying `picked` entered drop target `target`.
    fn handle_drag_enter(&self, cx: &mut ActionCx<'_>, target: ItemId, picked: &Picked, location: Point) {
        let _ = (cx, target, picked, location);
    }

    /// A drag carrying `picked` moved over drop target `target`.
    fn handle_drag_move_over(&self, cx: &mut ActionCx<'_>, target: ItemId, picked: &Picked, location: Point) {
        let _ = (cx, target, picked, location);
    }

    /// A drag carrying `picked` left drop target `target`.
    fn handle_drag_exit(&self, cx: &mut ActionCx<'_>, target: ItemId, picked: &Picked) {
        let _ = (cx, target, picked);
    }

    /// Decide whether `target` accepts `picked` at `proposed`, and where.
    ///
    /// Must be free of side effects: it may run any number of times before
    /// the single commit. The default accepts into groups whose handler
    /// accepts every picked type, never into a picked item or its subtree,
    /// and resolves an undetermined index to the end of the group.
    fn handle_validate_drop(
        &self,
        tree: &Tree,
        target: ItemId,
        picked: &Picked,
        proposed: DropIndex,
    ) -> Option<ValidatedDrop> {
        if !tree.is_group(target) {
            return None;
        }
        let types = picked.types();
        if types.is_empty() || !types.iter().all(|&ty| self.can_accept_type(ty)) {
            return None;
        }
        if picked
            .items()
            .iter()
            .any(|&item| !tree.is_alive(item) || tree.is_ancestor_or_self(item, target))
        {
            return None;
        }
        let len = tree.children_of(target).len();
        let index = match proposed {
            DropIndex::At(index) => index.min(len),
            DropIndex::Undetermined => len,
        };
        Some(ValidatedDrop { target, index })
    }

    /// Insert one picked object. Runs once per committed drop.
    fn handle_drop_object(&self, cx: &mut ActionCx<'_>, object: &Picked, drop: ValidatedDrop) -> bool {
        match *object {
            Picked::Item(item) => insert_picked_items(cx, &[item], drop),
            _ => false,
        }
    }

    /// Insert every object of a collection as its own child, in order.
    fn handle_drop_collection(
        &self,
        cx: &mut ActionCx<'_>,
        collection: &PickCollection,
        drop: ValidatedDrop,
    ) -> bool {
        let items = collection.items();
        if items.len() != collection.len() {
            return false;
        }
        insert_picked_items(cx, &items, drop)
    }

    /// A drag of `item` finished. Called exactly once per session.
    fn handle_drag_end(&self, cx: &mut ActionCx<'_>, item: ItemId, was_cancelled: bool) {
        let _ = (cx, item, was_cancelled);
    }
}

/// Insert picked items into a validated drop position.
///
/// Items are inserted as they are (moving attached ones), except that a copy,
/// or a paste of items still in the tree, inserts duplicates.
pub fn insert_picked_items(cx: &mut ActionCx<'_>, items: &[ItemId], drop: ValidatedDrop) -> bool {
    let copy = cx.picking_mask.contains(PickingMask::COPY);
    let paste = cx.picking_mask.contains(PickingMask::PASTE);
    if items.iter().any(|&item| !cx.tree.is_alive(item)) {
        return false;
    }
    let mut placed: SmallVec<[ItemId; 8]> = SmallVec::new();
    let mut copies: SmallVec<[ItemId; 8]> = SmallVec::new();
    for &item in items {
        if copy || (paste && cx.tree.parent_of(item).is_some()) {
            match cx.tree.duplicate(item) {
                Ok(dup) => {
                    placed.push(dup);
                    copies.push(dup);
                }
                Err(_) => {
                    discard_copies(cx.tree, &copies);
                    return false;
                }
            }
        } else {
            placed.push(item);
        }
    }
    match cx.tree.move_items(drop.target, drop.index, &placed) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(target: targets::DRAG, ?err, "drop insertion failed");
            discard_copies(cx.tree, &copies);
            false
        }
    }
}

fn discard_copies(tree: &mut Tree, copies: &[ItemId]) {
    for &copy in copies {
        // Copies are fresh and detached.
        let _ = tree.destroy(copy);
    }
}

/// General-purpose handler for items in editable groups.
///
/// - Clicks select (shift toggles); double clicks start editing the item.
/// - Escape ends editing; Delete and Backspace remove the selection.
/// - A plain drag moves the item's display surface.
/// - Cut, copy, and paste go through the active pickboard.
#[derive(Debug)]
pub struct StandardHandler {
    remove_items_at_pick_time: bool,
    accepted_types: SmallVec<[PickType; 2]>,
    field_editor_item: Cell<Option<ItemId>>,
}

impl Default for StandardHandler {
    fn default() -> Self {
        Self {
            remove_items_at_pick_time: false,
            accepted_types: SmallVec::from_slice(&[PickType::ITEM]),
            field_editor_item: Cell::new(None),
        }
    }
}

impl StandardHandler {
    /// Create a handler accepting item drops.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove dragged items from their group as soon as the drag starts.
    pub fn with_remove_items_at_pick_time(mut self, remove: bool) -> Self {
        self.remove_items_at_pick_time = remove;
        self
    }

    /// Replace the accepted drop types.
    pub fn with_accepted_types(mut self, types: &[PickType]) -> Self {
        self.accepted_types = SmallVec::from_slice(types);
        self
    }

    /// Item currently being edited, if any.
    pub fn field_editor_item(&self) -> Option<ItemId> {
        self.field_editor_item.get()
    }

    fn end_editing(&self) -> Option<ItemId> {
        self.field_editor_item.take()
    }

    /// Items an edit command on `item` applies to: the selected siblings when
    /// `item` is part of the selection, else `item` alone.
    fn edit_scope(tree: &Tree, item: ItemId) -> SmallVec<[ItemId; 8]> {
        match tree.parent_of(item) {
            Some(group) if tree.is_selected(item) => tree.selected_items(group).into_iter().collect(),
            _ => SmallVec::from_slice(&[item]),
        }
    }
}

impl ActionHandler for StandardHandler {
    fn handle_click(&self, cx: &mut ActionCx<'_>, item: ItemId, _location: Point, _count: u32) -> Handled {
        let (Some(group), Some(index)) = (cx.tree.parent_of(item), cx.tree.index_of(item)) else {
            return Handled::No;
        };
        if !self.can_select(cx.tree, item) {
            return Handled::No;
        }
        if self.field_editor_item.get() != Some(item) {
            self.end_editing();
        }
        let result = if cx.modifiers.contains(Modifiers::SHIFT) {
            let selected = cx.tree.is_selected(item);
            cx.tree.set_selected(item, !selected).map(|_| ())
        } else {
            cx.tree.set_selection_indexes(group, &[index])
        };
        result.is_ok().into()
    }

    fn handle_double_click(&self, cx: &mut ActionCx<'_>, item: ItemId, _location: Point) -> Handled {
        if !cx.tree.is_alive(item) {
            return Handled::No;
        }
        tracing::debug!(target: targets::DISPATCH, ?item, "begin editing");
        self.field_editor_item.set(Some(item));
        Handled::Yes
    }

    fn handle_drag_by(&self, cx: &mut ActionCx<'_>, item: ItemId, delta: Vec2) -> Handled {
        let surface = cx.tree.display_surface(item);
        let Some(frame) = cx.tree.frame(surface) else {
            return Handled::No;
        };
        cx.tree.set_frame(surface, frame + delta).is_ok().into()
    }

    fn handle_key_down(&self, cx: &mut ActionCx<'_>, item: ItemId, key: KeyInput) -> Handled {
        match key.key {
            Key::Escape => self.end_editing().is_some().into(),
            Key::Delete | Key::Backspace if self.field_editor_item.get().is_none() => {
                self.handle_edit(cx, item, EditCommand::Delete)
            }
            _ => Handled::No,
        }
    }

    fn handle_edit(&self, cx: &mut ActionCx<'_>, item: ItemId, command: EditCommand) -> Handled {
        if !cx.tree.is_alive(item) {
            return Handled::No;
        }
        match command {
            EditCommand::Cut => pick_drop::cut(cx, self, item).is_ok().into(),
            EditCommand::Copy => pick_drop::copy(cx, self, item).is_ok().into(),
            EditCommand::Paste => {
                let (target, index) = if cx.tree.is_group(item) {
                    (item, DropIndex::Undetermined)
                } else {
                    let Some(parent) = cx.tree.parent_of(item) else {
                        return Handled::No;
                    };
                    let after = cx.tree.index_of(item).map_or(0, |i| i + 1);
                    (parent, DropIndex::At(after))
                };
                pick_drop::paste(cx, self, target, index).is_ok().into()
            }
            EditCommand::Delete => {
                let scope = Self::edit_scope(cx.tree, item);
                if scope.iter().any(|&id| !cx.tree.is_alive(id)) {
                    return Handled::No;
                }
                // Destroying an ancestor already frees its descendants.
                let doomed: SmallVec<[ItemId; 8]> = scope
                    .iter()
                    .copied()
                    .filter(|&id| !scope.iter().any(|&other| cx.tree.is_ancestor(other, id)))
                    .collect();
                if self
                    .field_editor_item
                    .get()
                    .is_some_and(|editing| doomed.iter().any(|&id| cx.tree.is_ancestor_or_self(id, editing)))
                {
                    self.end_editing();
                }
                for id in doomed {
                    for gone in cx.tree.subtree(id) {
                        cx.pickboards.forget_item(gone);
                    }
                    if let Err(err) = cx.tree.destroy(id) {
                        tracing::warn!(target: targets::DISPATCH, ?err, "delete failed");
                    }
                }
                Handled::Yes
            }
            EditCommand::SelectAll => {
                let group = if cx.tree.is_group(item) {
                    Some(item)
                } else {
                    cx.tree.parent_of(item)
                };
                let Some(group) = group else {
                    return Handled::No;
                };
                let all: SmallVec<[usize; 16]> = (0..cx.tree.children_of(group).len()).collect();
                cx.tree.set_selection_indexes(group, &all).is_ok().into()
            }
        }
    }

    fn should_remove_item_at_pick_time(&self, _tree: &Tree, _item: ItemId, mask: PickingMask) -> bool {
        mask.removes_source()
            || (self.remove_items_at_pick_time && mask.contains(PickingMask::DRAG))
    }

    fn can_accept_type(&self, ty: PickType) -> bool {
        self.accepted_types.contains(&ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use trellis_item_tree::ItemDesc;

    struct Fixture {
        tree: Tree,
        boards: Pickboards,
        group: ItemId,
        items: [ItemId; 3],
    }

    fn fixture() -> Fixture {
        let mut tree = Tree::new();
        let group = tree.insert_group(ItemDesc::with_frame(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let items = [(); 3].map(|_| tree.insert_item(ItemDesc::with_frame(Rect::new(0.0, 0.0, 10.0, 10.0))));
        for i in items {
            tree.add_child(group, i).unwrap();
        }
        Fixture {
            tree,
            boards: Pickboards::new(),
            group,
            items,
        }
    }

    #[test]
    fn click_selects_exclusively_and_shift_toggles() {
        let mut f = fixture();
        let handler = StandardHandler::new();
        let mut cx = ActionCx::new(&mut f.tree, &mut f.boards);
        let click = Action::Click {
            location: Point::ZERO,
            count: 1,
        };
        assert_eq!(handler.handle(&mut cx, f.items[0], &click), Handled::Yes);
        assert_eq!(handler.handle(&mut cx, f.items[2], &click), Handled::Yes);
        assert_eq!(cx.tree.selection_indexes(f.group), alloc::vec![2]);

        cx.modifiers = Modifiers::SHIFT;
        handler.handle(&mut cx, f.items[0], &click);
        assert_eq!(cx.tree.selection_indexes(f.group), alloc::vec![0, 2]);
    }

    #[test]
    fn double_click_edits_and_escape_ends() {
        let mut f = fixture();
        let handler = StandardHandler::new();
        let mut cx = ActionCx::new(&mut f.tree, &mut f.boards);
        let escape = Action::KeyDown(KeyInput::new(Key::Escape));
        assert_eq!(handler.handle(&mut cx, f.items[1], &escape), Handled::No);
        handler.handle(
            &mut cx,
            f.items[1],
            &Action::DoubleClick {
                location: Point::ZERO,
            },
        );
        assert_eq!(handler.field_editor_item(), Some(f.items[1]));
        assert_eq!(handler.handle(&mut cx, f.items[1], &escape), Handled::Yes);
        assert_eq!(handler.field_editor_item(), None);
    }

    #[test]
    fn drag_by_moves_display_surface() {
        let mut f = fixture();
        let handler = StandardHandler::new();
        let mut cx = ActionCx::new(&mut f.tree, &mut f.boards);
        handler.handle(
            &mut cx,
            f.items[0],
            &Action::DragBy {
                delta: Vec2::new(3.0, 4.0),
            },
        );
        assert_eq!(cx.tree.frame(f.items[0]), Some(Rect::new(3.0, 4.0, 13.0, 14.0)));
    }

    #[test]
    fn delete_removes_selection() {
        let mut f = fixture();
        f.tree.set_selection_indexes(f.group, &[0, 2]).unwrap();
        let handler = StandardHandler::new();
        let mut cx = ActionCx::new(&mut f.tree, &mut f.boards);
        let delete = Action::KeyDown(KeyInput::new(Key::Delete));
        assert_eq!(handler.handle(&mut cx, f.items[2], &delete), Handled::Yes);
        assert_eq!(cx.tree.children_of(f.group), &[f.items[1]]);
        assert!(!cx.tree.is_alive(f.items[0]));
    }

    #[test]
    fn delete_forgets_descendants_on_pickboards() {
        let mut f = fixture();
        let inner = f.tree.insert_group(ItemDesc::default());
        let nested = f.tree.insert_item(ItemDesc::default());
        f.tree.add_child(f.group, inner).unwrap();
        f.tree.add_child(inner, nested).unwrap();
        f.boards.active_mut().push_object(Picked::Item(nested));
        let handler = StandardHandler::new();
        let mut cx = ActionCx::new(&mut f.tree, &mut f.boards);
        assert_eq!(handler.handle_edit(&mut cx, inner, EditCommand::Delete), Handled::Yes);
        assert!(!cx.tree.is_alive(nested));
        assert!(cx.pickboards.active().is_empty());
    }

    #[test]
    fn delete_of_a_stale_item_changes_nothing() {
        let mut f = fixture();
        let gone = f.items[1];
        f.tree.destroy(gone).unwrap();
        let handler = StandardHandler::new();
        let mut cx = ActionCx::new(&mut f.tree, &mut f.boards);
        assert_eq!(handler.handle_edit(&mut cx, gone, EditCommand::Delete), Handled::No);
        assert_eq!(cx.tree.children_of(f.group), &[f.items[0], f.items[2]]);
    }

    #[test]
    fn failed_insertion_discards_copies() {
        let mut f = fixture();
        let before = f.tree.len();
        let mut cx = ActionCx::new(&mut f.tree, &mut f.boards).with_picking_mask(PickingMask::COPY);
        let drop = ValidatedDrop {
            target: f.group,
            index: 99,
        };
        assert!(!insert_picked_items(&mut cx, &[f.items[0], f.items[1]], drop));
        assert_eq!(cx.tree.len(), before);
        assert_eq!(cx.tree.children_of(f.group), &f.items);
    }

    #[test]
    fn validation_rejects_foreign_types_and_own_subtree() {
        let mut f = fixture();
        let inner = f.tree.insert_group(ItemDesc::default());
        f.tree.add_child(f.group, inner).unwrap();
        let handler = StandardHandler::new();
        let text = Picked::Value {
            ty: PickType::TEXT,
            value: alloc::rc::Rc::new("x"),
        };
        assert_eq!(
            handler.handle_validate_drop(&f.tree, f.group, &text, DropIndex::Undetermined),
            None
        );
        // A group cannot be dropped into itself.
        assert_eq!(
            handler.handle_validate_drop(&f.tree, inner, &Picked::Item(inner), DropIndex::At(0)),
            None
        );
        // Leaves are never drop targets.
        assert_eq!(
            handler.handle_validate_drop(&f.tree, f.items[0], &Picked::Item(inner), DropIndex::At(0)),
            None
        );
        assert_eq!(
            handler.handle_validate_drop(&f.tree, f.group, &Picked::Item(f.items[0]), DropIndex::At(99)),
            Some(ValidatedDrop {
                target: f.group,
                index: 4
            })
        );
        let texts = StandardHandler::new().with_accepted_types(&[PickType::TEXT]);
        assert!(
            texts
                .handle_validate_drop(&f.tree, f.group, &text, DropIndex::Undetermined)
                .is_some()
        );
    }

    #[test]
    fn remove_at_pick_time_follows_mask() {
        let f = fixture();
        let keep = StandardHandler::new();
        let remove = StandardHandler::new().with_remove_items_at_pick_time(true);
        let item = f.items[0];
        assert!(!keep.should_remove_item_at_pick_time(&f.tree, item, PickingMask::DRAG_PICK));
        assert!(keep.should_remove_item_at_pick_time(&f.tree, item, PickingMask::CUT_PICK));
        assert!(remove.should_remove_item_at_pick_time(&f.tree, item, PickingMask::DRAG_PICK));
        assert!(!remove.should_remove_item_at_pick_time(&f.tree, item, PickingMask::COPY_PICK));
    }
}
