// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pick/drop coordinator and the cut, copy, and paste operations.
//!
//! ## Sessions
//!
//! A [`PickDropCoordinator`] lives for exactly one drag. [`begin`] asks the
//! source handler whether the drag may start, picks the payload, and puts it
//! on the active pickboard. Every pointer move goes through
//! [`drag_over`], which separates the *hovered* item from the *drop target*:
//! the nearest ancestor-or-self of the hovered item whose handler validates
//! the payload. Destination callbacks only ever reach drop targets.
//!
//! The session ends through [`drop`] or [`cancel`]. Both consume the
//! coordinator, so the source handler sees exactly one
//! [`handle_drag_end`](ActionHandler::handle_drag_end) per session, and at
//! most one commit ever reaches the target.
//!
//! ```text
//! Idle -> Dragging -> { EnteredTarget <-> MovedOverTarget }* -> { Dropped | Cancelled }
//! ```
//!
//! [`begin`]: PickDropCoordinator::begin
//! [`drag_over`]: PickDropCoordinator::drag_over
//! [`drop`]: PickDropCoordinator::drop
//! [`cancel`]: PickDropCoordinator::cancel

use alloc::string::String;

use kurbo::Point;
use smallvec::SmallVec;
use trellis_item_tree::{ItemId, Tree};
use trellis_pickboard::{PickCollection, PickRef, Picked, PickingMask};

use crate::error::{DragError, DragResult};
use crate::handler::{ActionCx, ActionHandler};
use crate::registry::{Handlers, SharedHandler};
use crate::targets;

pub use crate::handler::{DropIndex, ValidatedDrop};

/// Where a drag session stands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DragState {
    /// No session.
    Idle,
    /// Picked, not over any drop target.
    Dragging,
    /// Just entered a drop target.
    EnteredTarget,
    /// Moving over the current drop target.
    MovedOverTarget,
    /// Committed.
    Dropped,
    /// Aborted.
    Cancelled,
}

impl DragState {
    /// Returns true for [`Dropped`](Self::Dropped) and
    /// [`Cancelled`](Self::Cancelled).
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Dropped | Self::Cancelled)
    }
}

/// How a session ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DragOutcome {
    /// The payload was inserted here.
    Dropped(ValidatedDrop),
    /// Nothing was inserted; items removed at pick time are back in place.
    Cancelled,
}

impl DragOutcome {
    /// Returns true if the session ended without a commit.
    pub fn was_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Origin {
    item: ItemId,
    group: ItemId,
    index: usize,
    removed: bool,
}

/// One drag session.
pub struct PickDropCoordinator {
    state: DragState,
    source: ItemId,
    source_handler: SharedHandler,
    payload: Option<Picked>,
    board: String,
    reference: PickRef,
    origins: SmallVec<[Origin; 4]>,
    mask: PickingMask,
    hovered: Option<ItemId>,
    target: Option<(ItemId, SharedHandler)>,
}

impl core::fmt::Debug for PickDropCoordinator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PickDropCoordinator")
            .field("state", &self.state)
            .field("source", &self.source)
            .field("payload", &self.payload)
            .field("board", &self.board)
            .field("reference", &self.reference)
            .field("mask", &self.mask)
            .field("hovered", &self.hovered)
            .field("target", &self.target.as_ref().map(|(id, _)| *id))
            .finish_non_exhaustive()
    }
}

impl PickDropCoordinator {
    /// Start dragging `source` from `location` (root content space).
    ///
    /// `force` is the forced-pick modifier: it overrides a `false` from
    /// [`can_drag_item`](ActionHandler::can_drag_item), but not a veto from
    /// [`handle_drag_item_begin`](ActionHandler::handle_drag_item_begin).
    /// The picking mask of `cx` defaults to [`PickingMask::DRAG_PICK`] when
    /// empty.
    pub fn begin(
        handlers: &Handlers,
        cx: &mut ActionCx<'_>,
        source: ItemId,
        location: Point,
        force: bool,
    ) -> DragResult<Self> {
        if !cx.tree.is_alive(source) {
            tracing::warn!(target: targets::DRAG, ?source, "drag requested for stale item");
            return Err(DragError::Stale(source));
        }
        let source = cx.tree.first_decorated_item(source);
        let (_, handler) = handlers
            .nearest_handler(cx.tree, source)
            .ok_or(DragError::NoHandler(source))?;
        if !force && !handler.can_drag_item(cx.tree, source) {
            return Err(DragError::Vetoed(source));
        }
        if !handler.handle_drag_item_begin(cx, source, location) {
            return Err(DragError::Vetoed(source));
        }
        let mask = if cx.picking_mask.is_empty() {
            PickingMask::DRAG_PICK
        } else {
            cx.picking_mask
        };
        let payload = payload_for(cx.tree, source);
        let origins = pick(cx.tree, &*handler, &payload, mask)?;
        let board = String::from(cx.pickboards.active_name());
        let reference = cx.pickboards.active_mut().push_object(payload.clone());
        tracing::debug!(target: targets::DRAG, ?source, ?payload, ?mask, "drag began");
        Ok(Self {
            state: DragState::Dragging,
            source,
            source_handler: handler,
            payload: Some(payload),
            board,
            reference,
            origins,
            mask,
            hovered: None,
            target: None,
        })
    }

    /// Current state.
    pub fn state(&self) -> DragState {
        self.state
    }

    /// The dragged item.
    pub fn source(&self) -> ItemId {
        self.source
    }

    /// What is being dragged, if anything is left of it.
    pub fn payload(&self) -> Option<&Picked> {
        self.payload.as_ref()
    }

    /// Reference of the payload on the pickboard it was pushed to.
    pub fn reference(&self) -> PickRef {
        self.reference
    }

    /// Picking mask the payload was picked with.
    pub fn mask(&self) -> PickingMask {
        self.mask
    }

    /// Item under the pointer at the last move.
    pub fn hovered(&self) -> Option<ItemId> {
        self.hovered
    }

    /// Current drop target.
    pub fn target(&self) -> Option<ItemId> {
        self.target.as_ref().map(|(id, _)| *id)
    }

    /// Track the pointer over `hovered` at `location` (root content space).
    ///
    /// Sends exit to the previous drop target and enter to the new one when
    /// the target changes, and move-over while it stays the same.
    pub fn drag_over(
        &mut self,
        handlers: &Handlers,
        cx: &mut ActionCx<'_>,
        hovered: Option<ItemId>,
        location: Point,
    ) -> DragState {
        self.hovered = hovered;
        let next = self
            .resolve(handlers, cx.tree, hovered, location)
            .map(|(handler, drop)| (drop.target, handler));
        let Some(payload) = self.payload.as_ref() else {
            return self.state;
        };
        let previous = self.target.as_ref().map(|(id, _)| *id);
        match next {
            Some((id, handler)) if previous == Some(id) => {
                handler.handle_drag_move_over(cx, id, payload, location);
                self.state = DragState::MovedOverTarget;
            }
            next => {
                if let Some((old, old_handler)) = self.target.take()
                    && cx.tree.is_alive(old)
                {
                    old_handler.handle_drag_exit(cx, old, payload);
                }
                if let Some((id, handler)) = next {
                    tracing::debug!(target: targets::DRAG, target = ?id, "entered drop target");
                    handler.handle_drag_enter(cx, id, payload, location);
                    self.target = Some((id, handler));
                    self.state = DragState::EnteredTarget;
                } else {
                    self.state = DragState::Dragging;
                }
            }
        }
        self.state
    }

    /// Where a drop at `location` over the last hovered item would land.
    ///
    /// Pure: it may be asked any number of times and never mutates anything.
    pub fn validate(&self, handlers: &Handlers, tree: &Tree, location: Point) -> Option<ValidatedDrop> {
        self.resolve(handlers, tree, self.hovered, location)
            .map(|(_, drop)| drop)
    }

    /// End the session by dropping at `location` over the last hovered item.
    ///
    /// Commits at most once. A drop nobody accepts, or a commit the target
    /// refuses, ends the session cancelled.
    pub fn drop(
        mut self,
        handlers: &Handlers,
        cx: &mut ActionCx<'_>,
        location: Point,
    ) -> DragResult<DragOutcome> {
        self.payload = self.take_payload(cx);
        let Some((handler, drop)) = self.resolve(handlers, cx.tree, self.hovered, location) else {
            tracing::debug!(target: targets::DRAG, source = ?self.source, "drop rejected");
            return Ok(self.finish_cancelled(cx));
        };
        let Some(payload) = self.payload.take() else {
            return Ok(self.finish_cancelled(cx));
        };

        let saved = cx.picking_mask;
        cx.picking_mask = PickingMask::DRAG_DROP | (self.mask & PickingMask::COPY);
        let committed = match &payload {
            Picked::Collection(collection) => handler.handle_drop_collection(cx, collection, drop),
            object => handler.handle_drop_object(cx, object, drop),
        };
        cx.picking_mask = saved;

        if !committed {
            tracing::debug!(target: targets::DRAG, target = ?drop.target, "commit refused");
            self.payload = Some(payload);
            return Ok(self.finish_cancelled(cx));
        }
        tracing::debug!(target: targets::DRAG, ?drop, "dropped");
        self.target = None;
        self.origins.clear();
        self.state = DragState::Dropped;
        self.source_handler.handle_drag_end(cx, self.source, false);
        Ok(DragOutcome::Dropped(drop))
    }

    /// End the session without dropping.
    pub fn cancel(mut self, cx: &mut ActionCx<'_>) -> DragOutcome {
        self.payload = self.take_payload(cx);
        self.finish_cancelled(cx)
    }

    /// Stop referring to `item`, which is leaving the tree for good.
    pub fn forget_item(&mut self, item: ItemId) {
        self.payload = self.payload.take().and_then(|p| p.without_item(item));
        self.origins.retain(|o| o.item != item);
        if self.hovered == Some(item) {
            self.hovered = None;
        }
        if self.target.as_ref().is_some_and(|(id, _)| *id == item) {
            self.target = None;
            self.state = DragState::Dragging;
        }
    }

    /// Take the payload off its pickboard.
    ///
    /// The board copy is authoritative, since pickboards are scrubbed when
    /// items leave the tree.
    fn take_payload(&mut self, cx: &mut ActionCx<'_>) -> Option<Picked> {
        let local = self.payload.take();
        match cx.pickboards.get_mut(&self.board) {
            Some(board) => board.remove_object(self.reference).ok(),
            None => local,
        }
    }

    fn finish_cancelled(mut self, cx: &mut ActionCx<'_>) -> DragOutcome {
        if let Some((target, handler)) = self.target.take()
            && let Some(payload) = self.payload.as_ref()
            && cx.tree.is_alive(target)
        {
            handler.handle_drag_exit(cx, target, payload);
        }
        restore(cx.tree, &mut self.origins);
        self.payload = None;
        self.hovered = None;
        self.state = DragState::Cancelled;
        tracing::debug!(target: targets::DRAG, source = ?self.source, "drag cancelled");
        self.source_handler.handle_drag_end(cx, self.source, true);
        DragOutcome::Cancelled
    }

    /// Nearest ancestor-or-self of `hovered` accepting the payload, outside
    /// the dragged subtrees.
    fn resolve(
        &self,
        handlers: &Handlers,
        tree: &Tree,
        hovered: Option<ItemId>,
        location: Point,
    ) -> Option<(SharedHandler, ValidatedDrop)> {
        let payload = self.payload.as_ref()?;
        let hovered = hovered.filter(|&id| tree.is_alive(id))?;
        let dragged = payload.items();
        let mut candidate = Some(tree.first_decorated_item(hovered));
        while let Some(item) = candidate {
            candidate = tree.parent_of(item);
            if dragged.iter().any(|&d| tree.is_ancestor_or_self(d, item)) {
                continue;
            }
            let Some((_, handler)) = handlers.nearest_handler(tree, item) else {
                continue;
            };
            let proposed = proposed_index(tree, item, location);
            if let Some(drop) = handler.handle_validate_drop(tree, item, payload, proposed) {
                return Some((handler, drop));
            }
        }
        None
    }
}

/// Insertion index the layout of `group` proposes for `location`, given in
/// the content space of the tree root.
pub fn proposed_index(tree: &Tree, group: ItemId, location: Point) -> DropIndex {
    let root = tree.root_of(group);
    tree.layout(group)
        .zip(tree.convert_point_from_ancestor(root, group, location))
        .and_then(|(layout, local)| layout.insertion_index(tree, group, local))
        .map_or(DropIndex::Undetermined, DropIndex::At)
}

/// What picking `item` picks: the selected siblings as one collection when
/// `item` is part of a multiple selection, else `item` alone.
pub fn payload_for(tree: &Tree, item: ItemId) -> Picked {
    let item = tree.first_decorated_item(item);
    if tree.is_selected(item)
        && let Some(group) = tree.parent_of(item)
    {
        let selected = tree.selected_items(group);
        if selected.len() > 1 {
            return Picked::Collection(PickCollection::from_items(selected));
        }
    }
    Picked::Item(item)
}

/// Record where every picked item sits, then detach those the handler wants
/// removed at pick time. Each item is detached at most once.
fn pick(
    tree: &mut Tree,
    handler: &dyn ActionHandler,
    payload: &Picked,
    mask: PickingMask,
) -> DragResult<SmallVec<[Origin; 4]>> {
    let mut origins: SmallVec<[Origin; 4]> = SmallVec::new();
    for item in payload.items() {
        let (Some(group), Some(index)) = (tree.parent_of(item), tree.index_of(item)) else {
            continue;
        };
        let remove = handler.should_remove_item_at_pick_time(tree, item, mask);
        origins.push(Origin {
            item,
            group,
            index,
            removed: remove,
        });
    }
    for origin in &origins {
        if origin.removed {
            tree.remove_child(origin.item)?;
        }
    }
    Ok(origins)
}

/// Put items removed at pick time back where they were.
fn restore(tree: &mut Tree, origins: &mut SmallVec<[Origin; 4]>) {
    origins.sort_by_key(|o| o.index);
    for origin in origins.drain(..) {
        if !origin.removed || !tree.is_alive(origin.item) || tree.parent_of(origin.item).is_some() {
            continue;
        }
        let len = tree.children_of(origin.group).len();
        if let Err(err) = tree.insert_child(origin.group, origin.index.min(len), origin.item) {
            tracing::warn!(target: targets::DRAG, item = ?origin.item, ?err, "could not restore picked item");
        }
    }
}

fn pick_to_board(
    cx: &mut ActionCx<'_>,
    handler: &dyn ActionHandler,
    item: ItemId,
    mask: PickingMask,
) -> DragResult<PickRef> {
    if !cx.tree.is_alive(item) {
        return Err(DragError::Stale(item));
    }
    let payload = payload_for(cx.tree, item);
    pick(cx.tree, handler, &payload, mask)?;
    tracing::debug!(target: targets::DRAG, ?payload, ?mask, "picked to pickboard");
    Ok(cx.pickboards.active_mut().push_object(payload))
}

/// Cut `item` (or the selection it belongs to) onto the active pickboard.
///
/// The picked items leave their group when the handler asks for removal with
/// a cut mask, which the default handler always does.
pub fn cut(cx: &mut ActionCx<'_>, handler: &dyn ActionHandler, item: ItemId) -> DragResult<PickRef> {
    pick_to_board(cx, handler, item, PickingMask::CUT_PICK)
}

/// Copy `item` (or the selection it belongs to) onto the active pickboard.
pub fn copy(cx: &mut ActionCx<'_>, handler: &dyn ActionHandler, item: ItemId) -> DragResult<PickRef> {
    pick_to_board(cx, handler, item, PickingMask::COPY_PICK)
}

/// Paste the newest object of the active pickboard into `target`.
///
/// The object stays on the board, so pasting again inserts copies.
pub fn paste(
    cx: &mut ActionCx<'_>,
    handler: &dyn ActionHandler,
    target: ItemId,
    index: DropIndex,
) -> DragResult<ValidatedDrop> {
    let object = cx
        .pickboards
        .active()
        .top_object()
        .cloned()
        .ok_or(DragError::NothingToPaste)?;
    let drop = handler
        .handle_validate_drop(cx.tree, target, &object, index)
        .ok_or(DragError::Rejected(target))?;
    let saved = cx.picking_mask;
    cx.picking_mask = PickingMask::PASTE_DROP;
    let committed = match &object {
        Picked::Collection(collection) => handler.handle_drop_collection(cx, collection, drop),
        object => handler.handle_drop_object(cx, object, drop),
    };
    cx.picking_mask = saved;
    if !committed {
        return Err(DragError::Rejected(drop.target));
    }
    tracing::debug!(target: targets::DRAG, ?drop, "pasted");
    Ok(drop)
}
