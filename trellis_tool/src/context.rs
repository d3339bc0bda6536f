// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The explicit UI context every input event goes through.
//!
//! A [`Context`] owns what would otherwise be process-wide state: the tree,
//! the handler registry, the pickboards, the window scopes, the tools with the
//! active one among them, and the drag session in flight. Tests build one per
//! case; hosts build one per UI.
//!
//! ## Tools
//!
//! Every group with a [`Layout`](trellis_item_tree::Layout) owns a
//! [`Tool`], created the first time the pointer reaches it; the focused
//! window's root always owns one. When the pointer moves, the active tool
//! hands over to the tool of a nested layout according to that tool's
//! [`ActivationStrategy`], and back to the enclosing one when the nested
//! strategy lets go. Tool swaps wait while a press or drag is in flight.
//!
//! ## Gestures
//!
//! A press followed by a release becomes a click (and a double click when it
//! follows another one quickly). A press followed by enough pointer travel
//! starts a drag session on the pressed item; if its handler refuses to be
//! picked, the motion is delivered as [`Action::DragBy`] instead.

use alloc::boxed::Box;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Point;
use smallvec::SmallVec;
use trellis_item_tree::{ItemId, Tree, TreeError, TreeResult};
use trellis_pickboard::{PickingMask, Pickboards};
use trellis_responder::{
    Action, ActionCx, Dispatched, DragOutcome, DragState, Handlers, Hit, Key, PickDropCoordinator,
    Scopes, Touch, WindowScope, dispatch, hit_test,
};

use crate::activation::{ActivationStrategy, ActivationTrigger};
use crate::click::{ClickResult, PointerId};
use crate::config::ToolConfig;
use crate::hover::{HoverEvent, HoverEvents, HoverStack};
use crate::input::{InputEvent, InputKind};
use crate::targets;
use crate::tool::{Cursor, Tool};

type Path = SmallVec<[ItemId; 8]>;

/// What an input event led to.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Response {
    /// Nothing.
    #[default]
    Ignored,
    /// The pointer moved; these hover transitions were delivered.
    Hover(HoverEvents),
    /// A press started on this item.
    Pressed(ItemId),
    /// An action was dispatched. For a double click, this is the result of
    /// the double-click action that followed the click.
    Dispatched(Dispatched),
    /// The drag session moved on.
    Drag(DragState),
    /// The drag session ended.
    Dropped(DragOutcome),
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Gesture {
    pointer: PointerId,
    target: ItemId,
    origin: Point,
    last: Point,
    dragging_by: bool,
}

/// Explicit owner of the interaction state.
pub struct Context {
    /// The presentation tree.
    pub tree: Tree,
    /// Shared action handlers.
    pub handlers: Handlers,
    /// The pickboards.
    pub pickboards: Pickboards,
    scopes: Scopes,
    config: ToolConfig,
    tools: HashMap<ItemId, Tool>,
    active_tool: Option<ItemId>,
    gesture: Option<Gesture>,
    drag: Option<PickDropCoordinator>,
}

impl core::fmt::Debug for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Context")
            .field("scopes", &self.scopes)
            .field("config", &self.config)
            .field("tools", &self.tools.len())
            .field("active_tool", &self.active_tool)
            .field("gesture", &self.gesture)
            .field("drag", &self.drag)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// A context whose focused window is rooted at `root`.
    pub fn new(tree: Tree, root: ItemId) -> Self {
        Self {
            tree,
            handlers: Handlers::new(),
            pickboards: Pickboards::new(),
            scopes: Scopes::focused(WindowScope::new(root)),
            config: ToolConfig::default(),
            tools: HashMap::new(),
            active_tool: None,
            gesture: None,
            drag: None,
        }
    }

    /// Replace the configuration. Affects tools created afterwards.
    pub fn with_config(mut self, config: ToolConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration.
    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// The window scopes.
    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    /// Replace the window scopes.
    pub fn set_scopes(&mut self, scopes: Scopes) {
        self.scopes = scopes;
    }

    /// Make `item` the focused window's first responder.
    pub fn set_first_responder(&mut self, item: Option<ItemId>) {
        if let Some(focused) = self.scopes.focused.as_mut() {
            focused.first_responder = item;
        }
    }

    /// Select the activation strategy of the tool owned by `owner`.
    pub fn set_activation_strategy(&mut self, owner: ItemId, strategy: Box<dyn ActivationStrategy>) {
        let config = self.config;
        let tool = self
            .tools
            .remove(&owner)
            .unwrap_or_else(|| Tool::new(owner, &config));
        self.tools.insert(owner, tool.with_strategy(strategy));
    }

    /// The tool owned by `owner`, if it was created.
    pub fn tool(&self, owner: ItemId) -> Option<&Tool> {
        self.tools.get(&owner)
    }

    /// The active tool.
    pub fn active_tool(&self) -> Option<&Tool> {
        self.active_tool.and_then(|owner| self.tools.get(&owner))
    }

    /// The innermost hovered item.
    pub fn hovered(&self) -> Option<ItemId> {
        self.active_tool().and_then(|tool| tool.hover_stack().top())
    }

    /// The drag session in flight.
    pub fn drag_session(&self) -> Option<&PickDropCoordinator> {
        self.drag.as_ref()
    }

    /// State of the drag session; [`DragState::Idle`] without one.
    pub fn drag_state(&self) -> DragState {
        self.drag.as_ref().map_or(DragState::Idle, |s| s.state())
    }

    /// Owner of the tool responsible for `item`: its nearest ancestor-or-self
    /// with a layout, else its root.
    pub fn tool_owner_for(&self, item: ItemId) -> ItemId {
        let item = self.tree.first_decorated_item(item);
        core::iter::once(item)
            .chain(self.tree.ancestors(item))
            .find(|&a| self.tree.layout(a).is_some())
            .unwrap_or_else(|| self.tree.root_of(item))
    }

    /// Interpret one input event.
    ///
    /// Handlers may destroy or detach items while the event is processed;
    /// references to them are dropped before this returns.
    pub fn handle_input(&mut self, event: InputEvent) -> Response {
        let response = self.interpret(event);
        self.settle();
        response
    }

    fn interpret(&mut self, event: InputEvent) -> Response {
        match event.kind {
            InputKind::PointerMoved { pointer, position } => self.pointer_moved(pointer, position, &event),
            InputKind::PointerDown { pointer, position } => self.pointer_down(pointer, position, &event),
            InputKind::PointerUp { pointer, position } => self.pointer_up(pointer, position, &event),
            InputKind::KeyDown(key) => {
                if key.key == Key::Escape && self.drag.is_some() {
                    return self.cancel_gesture(&event);
                }
                let action = match InputEvent::edit_shortcut(key) {
                    Some(command) => Action::Edit(command),
                    None => Action::KeyDown(key),
                };
                Response::Dispatched(self.dispatch_from(None, action, &event))
            }
            InputKind::KeyUp(key) => Response::Dispatched(self.dispatch_from(None, Action::KeyUp(key), &event)),
            InputKind::TouchBegan(touch) => self.touch(touch, Action::BeginTouch(touch), &event),
            InputKind::TouchMoved(touch) => self.touch(touch, Action::MoveTouch(touch), &event),
            InputKind::TouchEnded(touch) => self.touch(touch, Action::EndTouch(touch), &event),
            InputKind::Command(command) => {
                Response::Dispatched(self.dispatch_from(None, Action::Edit(command), &event))
            }
            InputKind::Cancel => self.cancel_gesture(&event),
        }
    }

    /// Dispatch `action` across the window scopes, starting at `start` (the
    /// first responder when `None`).
    pub fn dispatch_action(&mut self, start: Option<ItemId>, action: Action) -> Dispatched {
        let dispatched = self.dispatch_from(start, action, &InputEvent::new(InputKind::Cancel));
        self.settle();
        dispatched
    }

    /// Detach `item` from its group and drop every reference the context
    /// holds to it or its descendants: pickboard entries, hover stacks, the
    /// pending press, and the drag session.
    pub fn remove_item(&mut self, item: ItemId) -> TreeResult<usize> {
        if !self.tree.is_alive(item) {
            return Err(TreeError::StaleItem(item));
        }
        if self.tree.parent_of(item).is_none() {
            return Err(TreeError::Detached(item));
        }
        self.scrub(item);
        self.tree.remove_child(item)
    }

    /// Like [`remove_item`](Self::remove_item), then free the subtree.
    pub fn destroy_item(&mut self, item: ItemId) -> TreeResult<()> {
        if !self.tree.is_alive(item) {
            return Err(TreeError::StaleItem(item));
        }
        self.scrub(item);
        self.tree.destroy(item)?;
        self.settle();
        Ok(())
    }

    // --- pointer ---

    fn pointer_moved(&mut self, pointer: PointerId, position: Point, event: &InputEvent) -> Response {
        let hit = self.hit(position);
        let path: Path = hit.as_ref().map(|h| h.path.clone()).unwrap_or_default();
        let hovered = hit.map(|h| h.target);
        if self.gesture.is_none() && self.drag.is_none() {
            self.track_activation(&path);
        }
        let transitions = self.update_hover(&path, event);

        if self.drag.is_some() {
            return Response::Drag(self.drag_over(hovered, position, event));
        }
        let Some(mut gesture) = self.gesture.filter(|g| g.pointer == pointer) else {
            return Response::Hover(transitions);
        };
        if let Some(tool) = self.active_tool_mut() {
            tool.clicks_mut().on_move(pointer, position);
        }
        if !gesture.dragging_by && gesture.origin.distance(position) > self.config.drag_distance {
            match self.begin_drag(gesture, event) {
                Ok(()) => {
                    // The pick may have taken items out of the tree.
                    let hit = self.hit(position);
                    let path: Path = hit.as_ref().map(|h| h.path.clone()).unwrap_or_default();
                    self.update_hover(&path, event);
                    let hovered = hit.map(|h| h.target);
                    return Response::Drag(self.drag_over(hovered, position, event));
                }
                Err(err) => {
                    tracing::debug!(target: targets::TOOL, ?err, "not picked, dragging by delta");
                    gesture.dragging_by = true;
                }
            }
        }
        if gesture.dragging_by {
            let delta = position - gesture.last;
            gesture.last = position;
            self.gesture = Some(gesture);
            let dispatched = self.dispatch_from(Some(gesture.target), Action::DragBy { delta }, event);
            return Response::Dispatched(dispatched);
        }
        Response::Hover(transitions)
    }

    fn pointer_down(&mut self, pointer: PointerId, position: Point, event: &InputEvent) -> Response {
        let hit = self.hit(position);
        let path: Path = hit.as_ref().map(|h| h.path.clone()).unwrap_or_default();
        self.release_outside(&path);
        let Some(hit) = hit else {
            return Response::Ignored;
        };
        if self.active_tool.is_none() {
            self.track_activation(&path);
        }
        if let Some(tool) = self.active_tool_mut() {
            tool.clicks_mut()
                .on_down(pointer, hit.target, position, event.timestamp);
        }
        self.gesture = Some(Gesture {
            pointer,
            target: hit.target,
            origin: position,
            last: position,
            dragging_by: false,
        });
        Response::Pressed(hit.target)
    }

    fn pointer_up(&mut self, pointer: PointerId, position: Point, event: &InputEvent) -> Response {
        let gesture = self.gesture.take_if(|g| g.pointer == pointer);
        let hit = self.hit(position);
        let hovered = hit.as_ref().map(|h| h.target);

        if let Some(mut session) = self.drag.take() {
            if let Some(tool) = self.active_tool_mut() {
                tool.clicks_mut().cancel(pointer);
                tool.set_cursor(Cursor::Arrow);
            }
            let mut cx = ActionCx::new(&mut self.tree, &mut self.pickboards).with_modifiers(event.modifiers);
            session.drag_over(&self.handlers, &mut cx, hovered, position);
            return match session.drop(&self.handlers, &mut cx, position) {
                Ok(outcome) => Response::Dropped(outcome),
                Err(err) => {
                    tracing::warn!(target: targets::TOOL, ?err, "drop failed");
                    Response::Ignored
                }
            };
        }

        let Some(gesture) = gesture else {
            return Response::Ignored;
        };
        let result = match self.active_tool_mut() {
            Some(tool) if gesture.dragging_by => {
                tool.clicks_mut().cancel(pointer);
                return Response::Ignored;
            }
            Some(tool) => tool
                .clicks_mut()
                .on_up(pointer, hovered, position, event.timestamp),
            None => ClickResult::Suppressed(None),
        };
        let ClickResult::Click { target, count } = result else {
            return Response::Ignored;
        };
        let mut dispatched = self.dispatch_from(Some(target), Action::Click { location: position, count }, event);
        if count == 2 {
            dispatched = self.dispatch_from(Some(target), Action::DoubleClick { location: position }, event);
            let path = hit.map(|h| h.path).unwrap_or_default();
            self.activate_on_double_click(&path);
        }
        Response::Dispatched(dispatched)
    }

    fn touch(&mut self, touch: Touch, action: Action, event: &InputEvent) -> Response {
        match self.hit(touch.location) {
            Some(hit) => Response::Dispatched(self.dispatch_from(Some(hit.target), action, event)),
            None => Response::Ignored,
        }
    }

    fn cancel_gesture(&mut self, event: &InputEvent) -> Response {
        if let Some(gesture) = self.gesture.take()
            && let Some(tool) = self.active_tool_mut()
        {
            tool.clicks_mut().cancel(gesture.pointer);
        }
        let Some(session) = self.drag.take() else {
            return Response::Ignored;
        };
        if let Some(tool) = self.active_tool_mut() {
            tool.set_cursor(Cursor::Arrow);
        }
        let mut cx = ActionCx::new(&mut self.tree, &mut self.pickboards).with_modifiers(event.modifiers);
        Response::Dropped(session.cancel(&mut cx))
    }

    // --- drag ---

    fn begin_drag(&mut self, gesture: Gesture, event: &InputEvent) -> trellis_responder::DragResult<()> {
        let mask = if event.picking_mask.is_empty() {
            PickingMask::DRAG_PICK
        } else {
            event.picking_mask
        };
        let force = !self.config.force_pick_modifier.is_empty()
            && event.modifiers.contains(self.config.force_pick_modifier);
        let mut cx = ActionCx::new(&mut self.tree, &mut self.pickboards)
            .with_modifiers(event.modifiers)
            .with_picking_mask(mask);
        let session = PickDropCoordinator::begin(&self.handlers, &mut cx, gesture.target, gesture.origin, force)?;
        self.drag = Some(session);
        if let Some(tool) = self.active_tool_mut() {
            tool.clicks_mut().cancel(gesture.pointer);
            tool.set_cursor(Cursor::Grabbing);
        }
        Ok(())
    }

    fn drag_over(&mut self, hovered: Option<ItemId>, position: Point, event: &InputEvent) -> DragState {
        let Some(session) = self.drag.as_mut() else {
            return DragState::Idle;
        };
        let mut cx = ActionCx::new(&mut self.tree, &mut self.pickboards).with_modifiers(event.modifiers);
        let state = session.drag_over(&self.handlers, &mut cx, hovered, position);
        let cursor = match session.target() {
            Some(_) if session.mask().contains(PickingMask::COPY) => Cursor::Copy,
            Some(_) => Cursor::Grabbing,
            None => Cursor::NotAllowed,
        };
        if let Some(tool) = self.active_tool_mut() {
            tool.set_cursor(cursor);
        }
        state
    }

    // --- dispatch ---

    fn dispatch_from(&mut self, start: Option<ItemId>, action: Action, event: &InputEvent) -> Dispatched {
        let mut cx = ActionCx::new(&mut self.tree, &mut self.pickboards)
            .with_modifiers(event.modifiers)
            .with_picking_mask(event.picking_mask);
        dispatch(&self.handlers, &mut cx, &self.scopes, start, &action)
    }

    fn hit(&self, position: Point) -> Option<Hit> {
        let root = self.scopes.focused?.root;
        hit_test(&self.tree, root, position, self.config.hit_filter)
    }

    /// Diff the active tool's hover stack against `path` and deliver the
    /// transitions to the items' own handlers.
    fn update_hover(&mut self, path: &[ItemId], event: &InputEvent) -> HoverEvents {
        let transitions = match self.active_tool_mut() {
            Some(tool) => tool.hover_stack_mut().update(path),
            None => HoverEvents::new(),
        };
        let mut cx = ActionCx::new(&mut self.tree, &mut self.pickboards).with_modifiers(event.modifiers);
        for transition in &transitions {
            let (item, action) = match *transition {
                HoverEvent::Enter(id) => (id, Action::Enter),
                HoverEvent::Exit(id) => (id, Action::Exit),
            };
            if let Some(handler) = self.handlers.handler_for(cx.tree, item).cloned() {
                handler.handle(&mut cx, item, &action);
            }
        }
        transitions
    }

    // --- tools ---

    fn tool_entry(&mut self, owner: ItemId) -> &mut Tool {
        let config = self.config;
        self.tools
            .entry(owner)
            .or_insert_with(|| Tool::new(owner, &config))
    }

    fn active_tool_mut(&mut self) -> Option<&mut Tool> {
        let owner = self.active_tool?;
        Some(self.tool_entry(owner))
    }

    fn switch_tool(&mut self, owner: ItemId) {
        if self.active_tool == Some(owner) {
            return;
        }
        let hover = match self.active_tool.and_then(|old| self.tools.get_mut(&old)) {
            Some(old) => old.did_become_inactive(),
            None => HoverStack::new(),
        };
        tracing::debug!(target: targets::TOOL, from = ?self.active_tool, to = ?owner, "switching tool");
        self.tool_entry(owner).did_become_active(hover);
        self.active_tool = Some(owner);
    }

    /// Layout owners along a hit path: the root, then every group with a
    /// layout, outermost first.
    fn owners(&self, path: &[ItemId]) -> Path {
        path.iter()
            .enumerate()
            .filter(|&(i, &id)| i == 0 || self.tree.layout(id).is_some())
            .map(|(_, &id)| id)
            .collect()
    }

    /// Nearest enclosing owner of a tool owner.
    fn parent_owner(&self, owner: ItemId) -> Option<ItemId> {
        self.tree
            .ancestors(owner)
            .find(|&a| self.tree.layout(a).is_some() || self.tree.parent_of(a).is_none())
    }

    fn track_activation(&mut self, path: &[ItemId]) {
        let owners = self.owners(path);
        let Some(&outermost) = owners.first() else {
            return;
        };
        let mut active = match self.active_tool {
            Some(owner) if self.tree.is_alive(owner) => owner,
            _ => outermost,
        };
        while !owners.contains(&active)
            && self
                .tool_entry(active)
                .deactivates_on(ActivationTrigger::PointerExited)
        {
            match self.parent_owner(active) {
                Some(parent) => active = parent,
                None => break,
            }
        }
        if let Some(index) = owners.iter().position(|&o| o == active) {
            for &inner in &owners[index + 1..] {
                if !self
                    .tool_entry(inner)
                    .activates_on(ActivationTrigger::PointerEntered)
                {
                    break;
                }
                active = inner;
            }
        }
        self.switch_tool(active);
    }

    fn release_outside(&mut self, path: &[ItemId]) {
        let Some(mut active) = self.active_tool else {
            return;
        };
        while !path.contains(&active)
            && self
                .tool_entry(active)
                .deactivates_on(ActivationTrigger::ClickedOutside)
        {
            match self.parent_owner(active) {
                Some(parent) => active = parent,
                None => break,
            }
        }
        self.switch_tool(active);
    }

    fn activate_on_double_click(&mut self, path: &[ItemId]) {
        let owners = self.owners(path);
        let Some(index) = self
            .active_tool
            .and_then(|active| owners.iter().position(|&o| o == active))
        else {
            return;
        };
        for &inner in &owners[index + 1..] {
            if self
                .tool_entry(inner)
                .activates_on(ActivationTrigger::DoubleClicked)
            {
                self.switch_tool(inner);
                return;
            }
        }
    }

    /// Drop every reference to `item` and its descendants.
    fn scrub(&mut self, item: ItemId) {
        let subtree = self.tree.subtree(item);
        self.forget_items(&subtree);
        tracing::debug!(target: targets::TOOL, ?item, count = subtree.len(), "scrubbed removed items");
    }

    /// Catch up with tree changes made by handlers: forget destroyed items,
    /// and stop hovering or focusing items that left their window.
    fn settle(&mut self) {
        let destroyed = self.tree.take_destroyed();
        if !destroyed.is_empty() {
            self.forget_items(&destroyed);
            tracing::debug!(target: targets::TOOL, count = destroyed.len(), "forgot destroyed items");
        }
        let tree = &self.tree;
        let stray = |id: ItemId, window: ItemId| !tree.is_alive(id) || tree.root_of(id) != window;
        for tool in self.tools.values_mut() {
            let window = tree.root_of(tool.owner());
            if let Some(&first) = tool.hover_stack().items().iter().find(|&&id| stray(id, window)) {
                tool.forget_item(first);
            }
        }
        for scope in [self.scopes.focused.as_mut(), self.scopes.main.as_mut()]
            .into_iter()
            .flatten()
        {
            if scope.first_responder.is_some_and(|r| stray(r, scope.root)) {
                scope.first_responder = None;
            }
        }
    }

    fn forget_items(&mut self, items: &[ItemId]) {
        if self.active_tool.is_some_and(|owner| items.contains(&owner)) {
            match self.scopes.focused.map(|s| s.root) {
                Some(root) if !items.contains(&root) => self.switch_tool(root),
                _ => {
                    if let Some(tool) = self.active_tool.and_then(|owner| self.tools.get_mut(&owner)) {
                        tool.did_become_inactive();
                    }
                    self.active_tool = None;
                }
            }
        }
        for &id in items {
            self.pickboards.forget_item(id);
            for tool in self.tools.values_mut() {
                tool.forget_item(id);
            }
            if let Some(session) = self.drag.as_mut() {
                session.forget_item(id);
            }
            self.tools.remove(&id);
        }
        if self.gesture.is_some_and(|g| items.contains(&g.target)) {
            self.gesture = None;
        }
        for scope in [self.scopes.focused.as_mut(), self.scopes.main.as_mut()]
            .into_iter()
            .flatten()
        {
            if scope.first_responder.is_some_and(|r| items.contains(&r)) {
                scope.first_responder = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::RefCell;
    use kurbo::{Rect, Vec2};
    use trellis_item_tree::{ColumnLayout, FreeLayout, HandlerId, ItemDesc, OpaqueLayout};
    use trellis_pickboard::Picked;
    use trellis_responder::{
        ActionHandler, EditCommand, Handled, HandledBy, KeyInput, Modifiers, Responder, StandardHandler,
    };

    use crate::activation::ActivateOnDoubleClick;

    #[derive(Clone, Debug, PartialEq)]
    enum Event {
        Enter(ItemId),
        Exit(ItemId),
        Click(ItemId, u32),
        DoubleClick(ItemId),
        DragBy(ItemId, Vec2),
        End(ItemId, bool),
    }

    struct Recorder {
        log: Rc<RefCell<Vec<Event>>>,
        draggable: bool,
        standard: StandardHandler,
    }

    impl ActionHandler for Recorder {
        fn handle_click(&self, _cx: &mut ActionCx<'_>, item: ItemId, _: Point, count: u32) -> Handled {
            self.log.borrow_mut().push(Event::Click(item, count));
            Handled::Yes
        }

        fn handle_double_click(&self, _cx: &mut ActionCx<'_>, item: ItemId, _: Point) -> Handled {
            self.log.borrow_mut().push(Event::DoubleClick(item));
            Handled::Yes
        }

        fn handle_enter(&self, _cx: &mut ActionCx<'_>, item: ItemId) -> Handled {
            self.log.borrow_mut().push(Event::Enter(item));
            Handled::Yes
        }

        fn handle_exit(&self, _cx: &mut ActionCx<'_>, item: ItemId) -> Handled {
            self.log.borrow_mut().push(Event::Exit(item));
            Handled::Yes
        }

        fn handle_drag_by(&self, _cx: &mut ActionCx<'_>, item: ItemId, delta: Vec2) -> Handled {
            self.log.borrow_mut().push(Event::DragBy(item, delta));
            Handled::Yes
        }

        fn handle_edit(&self, cx: &mut ActionCx<'_>, item: ItemId, command: EditCommand) -> Handled {
            self.standard.handle_edit(cx, item, command)
        }

        fn can_drag_item(&self, tree: &Tree, item: ItemId) -> bool {
            self.draggable && tree.is_alive(item)
        }

        fn should_remove_item_at_pick_time(&self, _tree: &Tree, _item: ItemId, mask: PickingMask) -> bool {
            mask.contains(PickingMask::DRAG) || mask.removes_source()
        }

        fn handle_drag_end(&self, _cx: &mut ActionCx<'_>, item: ItemId, was_cancelled: bool) {
            self.log.borrow_mut().push(Event::End(item, was_cancelled));
        }
    }

    struct Fixture {
        cx: Context,
        log: Rc<RefCell<Vec<Event>>>,
        root: ItemId,
        panel: ItemId,
        b: ItemId,
        c: ItemId,
        editor: ItemId,
    }

    /// root (400 x 300)
    /// ├── panel (0..200, column layout)
    /// │   ├── b (0..40)
    /// │   └── c (50..150, column layout)
    /// └── editor (200..400, free layout, double-click activation)
    fn fixture(draggable: bool) -> Fixture {
        let mut tree = Tree::new();
        let mut handlers = Handlers::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let rec: HandlerId = handlers.register(Rc::new(Recorder {
            log: log.clone(),
            draggable,
            standard: StandardHandler::new(),
        }));
        let group = |tree: &mut Tree, r: Rect| tree.insert_group(ItemDesc::with_frame(r).handler(rec));
        let root = group(&mut tree, Rect::new(0.0, 0.0, 400.0, 300.0));
        let panel = group(&mut tree, Rect::new(0.0, 0.0, 200.0, 300.0));
        let c = group(&mut tree, Rect::new(0.0, 50.0, 200.0, 150.0));
        let editor = group(&mut tree, Rect::new(200.0, 0.0, 400.0, 300.0));
        let b = tree.insert_item(ItemDesc::with_frame(Rect::new(0.0, 0.0, 200.0, 40.0)).handler(rec));
        tree.add_child(root, panel).unwrap();
        tree.add_child(root, editor).unwrap();
        tree.add_child(panel, b).unwrap();
        tree.add_child(panel, c).unwrap();
        tree.set_layout(panel, Box::new(ColumnLayout)).unwrap();
        tree.set_layout(c, Box::new(ColumnLayout)).unwrap();
        tree.set_layout(editor, Box::new(FreeLayout)).unwrap();

        let mut cx = Context::new(tree, root);
        cx.handlers = handlers;
        cx.set_activation_strategy(editor, Box::new(ActivateOnDoubleClick));
        Fixture {
            cx,
            log,
            root,
            panel,
            b,
            c,
            editor,
        }
    }

    fn moved(x: f64, y: f64) -> InputEvent {
        InputEvent::pointer_moved(Point::new(x, y))
    }

    fn click_at(cx: &mut Context, p: Point, t: u64) -> Response {
        cx.handle_input(InputEvent::pointer_down(p).at(t));
        cx.handle_input(InputEvent::pointer_up(p).at(t + 10))
    }

    #[test]
    fn hover_enters_outermost_first_and_exits_innermost_first() {
        let mut f = fixture(true);
        f.cx.handle_input(moved(10.0, 10.0));
        assert_eq!(
            *f.log.borrow(),
            alloc::vec![Event::Enter(f.root), Event::Enter(f.panel), Event::Enter(f.b)]
        );
        f.log.borrow_mut().clear();
        f.cx.handle_input(moved(300.0, 10.0));
        assert_eq!(
            *f.log.borrow(),
            alloc::vec![Event::Exit(f.b), Event::Exit(f.panel), Event::Enter(f.editor)]
        );
        assert_eq!(f.cx.hovered(), Some(f.editor));
    }

    #[test]
    fn nested_layout_tool_activates_on_enter_and_hands_back_on_exit() {
        let mut f = fixture(true);
        f.cx.handle_input(moved(10.0, 10.0));
        assert_eq!(f.cx.active_tool().map(Tool::owner), Some(f.panel));
        f.cx.handle_input(moved(10.0, 60.0));
        assert_eq!(f.cx.active_tool().map(Tool::owner), Some(f.c));
        // The hover stack travels with the active tool.
        assert!(f.cx.tool(f.panel).unwrap().hover_stack().is_empty());
        assert_eq!(f.cx.tool(f.c).unwrap().hover_stack().top(), Some(f.c));
        assert!(!f.cx.tool(f.panel).unwrap().is_active());

        f.cx.handle_input(moved(10.0, 10.0));
        assert_eq!(f.cx.active_tool().map(Tool::owner), Some(f.panel));
        // The editor only reacts to double clicks.
        f.cx.handle_input(moved(300.0, 10.0));
        assert_eq!(f.cx.active_tool().map(Tool::owner), Some(f.root));
    }

    #[test]
    fn double_click_activation_and_outside_release() {
        let mut f = fixture(true);
        let inside = Point::new(300.0, 100.0);
        f.cx.handle_input(InputEvent::pointer_moved(inside));
        assert_eq!(f.cx.active_tool().map(Tool::owner), Some(f.root));

        click_at(&mut f.cx, inside, 0);
        let response = click_at(&mut f.cx, inside, 100);
        assert_eq!(
            response,
            Response::Dispatched(Dispatched {
                handled_by: Some(HandledBy::Responder(Responder::Item(f.editor))),
                scope: Some(trellis_responder::ScopeKind::FocusedWindow),
            })
        );
        assert!(f.log.borrow().contains(&Event::Click(f.editor, 2)));
        assert!(f.log.borrow().contains(&Event::DoubleClick(f.editor)));
        assert_eq!(f.cx.active_tool().map(Tool::owner), Some(f.editor));

        // Hovering elsewhere does not release it.
        f.cx.handle_input(moved(10.0, 10.0));
        assert_eq!(f.cx.active_tool().map(Tool::owner), Some(f.editor));
        // A press outside does.
        f.cx.handle_input(InputEvent::pointer_down(Point::new(10.0, 10.0)).at(1_000));
        assert_eq!(f.cx.active_tool().map(Tool::owner), Some(f.root));
    }

    #[test]
    fn opaque_layout_receives_clicks_meant_for_descendants() {
        let mut tree = Tree::new();
        let mut handlers = Handlers::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let rec = handlers.register(Rc::new(Recorder {
            log: log.clone(),
            draggable: true,
            standard: StandardHandler::new(),
        }));
        let root = tree.insert_group(ItemDesc::with_frame(Rect::new(0.0, 0.0, 200.0, 200.0)));
        let i1 = tree.insert_group(ItemDesc::with_frame(Rect::new(0.0, 0.0, 100.0, 100.0)).handler(rec));
        let i2 = tree.insert_group(ItemDesc::with_frame(Rect::new(5.0, 5.0, 60.0, 60.0)).handler(rec));
        let i3 = tree.insert_item(ItemDesc::with_frame(Rect::new(5.0, 5.0, 20.0, 20.0)).handler(rec));
        tree.add_child(root, i1).unwrap();
        tree.add_child(i1, i2).unwrap();
        tree.add_child(i2, i3).unwrap();
        tree.set_layout(i1, Box::new(OpaqueLayout)).unwrap();
        tree.set_layout(i2, Box::new(FreeLayout)).unwrap();
        let mut cx = Context::new(tree, root);
        cx.handlers = handlers;

        let p = Point::new(15.0, 15.0);
        cx.handle_input(InputEvent::pointer_moved(p));
        assert_eq!(cx.active_tool().map(Tool::owner), Some(i1));
        assert_eq!(cx.tool_owner_for(i3), i2);
        let response = click_at(&mut cx, p, 0);
        assert_eq!(
            response,
            Response::Dispatched(Dispatched {
                handled_by: Some(HandledBy::Responder(Responder::Item(i1))),
                scope: Some(trellis_responder::ScopeKind::FocusedWindow),
            })
        );
        let log = log.borrow();
        assert!(log.contains(&Event::Click(i1, 1)));
        assert!(!log.iter().any(|e| matches!(e, Event::Click(id, _) if *id == i3 || *id == i2)));
    }

    #[test]
    fn dragging_b_onto_c_through_input() {
        let mut f = fixture(true);
        f.cx.handle_input(moved(10.0, 10.0));
        assert_eq!(f.cx.handle_input(InputEvent::pointer_down(Point::new(10.0, 10.0))), Response::Pressed(f.b));
        // Within the drag distance: still a press.
        assert!(matches!(f.cx.handle_input(moved(11.0, 11.0)), Response::Hover(_)));
        assert_eq!(f.cx.drag_state(), DragState::Idle);

        assert!(matches!(f.cx.handle_input(moved(10.0, 30.0)), Response::Drag(_)));
        assert_eq!(f.cx.tree.children_of(f.panel), &[f.c]);
        assert_eq!(f.cx.active_tool().map(Tool::cursor), Some(Cursor::Grabbing));

        assert_eq!(f.cx.handle_input(moved(10.0, 120.0)), Response::Drag(DragState::EnteredTarget));
        assert_eq!(f.cx.drag_session().and_then(PickDropCoordinator::target), Some(f.c));

        let response = f.cx.handle_input(InputEvent::pointer_up(Point::new(10.0, 120.0)));
        assert!(matches!(response, Response::Dropped(DragOutcome::Dropped(_))));
        assert_eq!(f.cx.tree.parent_of(f.b), Some(f.c));
        assert_eq!(f.cx.drag_state(), DragState::Idle);
        let log = f.log.borrow();
        assert_eq!(log.iter().filter(|e| matches!(e, Event::End(..))).count(), 1);
        assert!(log.contains(&Event::End(f.b, false)));
        assert!(!log.iter().any(|e| matches!(e, Event::Click(..))));
    }

    #[test]
    fn escape_cancels_the_drag_and_restores_the_item() {
        let mut f = fixture(true);
        f.cx.handle_input(InputEvent::pointer_down(Point::new(10.0, 10.0)));
        f.cx.handle_input(moved(10.0, 30.0));
        assert_eq!(f.cx.tree.parent_of(f.b), None);
        let response = f.cx.handle_input(InputEvent::new(InputKind::KeyDown(KeyInput::new(Key::Escape))));
        assert_eq!(response, Response::Dropped(DragOutcome::Cancelled));
        assert_eq!(f.cx.tree.children_of(f.panel), &[f.b, f.c]);
        assert!(f.cx.pickboards.active().is_empty());
        assert_eq!(*f.log.borrow().last().unwrap(), Event::End(f.b, true));
        // The release after a cancelled drag is not a click.
        assert_eq!(f.cx.handle_input(InputEvent::pointer_up(Point::new(10.0, 30.0))), Response::Ignored);
    }

    #[test]
    fn refused_pick_drags_by_delta_and_forced_pick_overrides() {
        let mut f = fixture(false);
        f.cx.handle_input(InputEvent::pointer_down(Point::new(10.0, 10.0)));
        f.cx.handle_input(moved(10.0, 30.0));
        f.cx.handle_input(moved(15.0, 30.0));
        f.cx.handle_input(InputEvent::pointer_up(Point::new(15.0, 30.0)));
        let drags: Vec<Event> = f
            .log
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::DragBy(..) | Event::Click(..)))
            .cloned()
            .collect();
        assert_eq!(
            drags,
            alloc::vec![
                Event::DragBy(f.b, Vec2::new(0.0, 20.0)),
                Event::DragBy(f.b, Vec2::new(5.0, 0.0))
            ]
        );
        assert_eq!(f.cx.drag_state(), DragState::Idle);

        f.cx.handle_input(InputEvent::pointer_down(Point::new(10.0, 10.0)));
        f.cx.handle_input(moved(10.0, 30.0).with_modifiers(Modifiers::ALT));
        assert_eq!(f.cx.drag_session().map(PickDropCoordinator::source), Some(f.b));
        f.cx.handle_input(InputEvent::new(InputKind::Cancel));
        assert_eq!(f.cx.drag_state(), DragState::Idle);
    }

    #[test]
    fn removing_an_item_scrubs_every_reference() {
        let mut f = fixture(true);
        f.cx.handle_input(moved(10.0, 10.0));
        f.cx.pickboards.active_mut().push_object(Picked::Item(f.b));
        f.cx.set_first_responder(Some(f.b));
        assert!(f.cx.active_tool().unwrap().hover_stack().contains(f.b));

        assert_eq!(f.cx.remove_item(f.b), Ok(0));
        assert_eq!(f.cx.tree.parent_of(f.b), None);
        assert!(f.cx.pickboards.active().is_empty());
        assert!(!f.cx.active_tool().unwrap().hover_stack().contains(f.b));
        assert_eq!(f.cx.scopes().focused.unwrap().first_responder, None);
        assert_eq!(f.cx.remove_item(f.b), Err(TreeError::Detached(f.b)));
    }

    #[test]
    fn hover_follows_the_tree_after_a_pick_removes_the_item() {
        let mut f = fixture(true);
        f.cx.handle_input(moved(20.0, 20.0));
        f.cx.handle_input(InputEvent::pointer_down(Point::new(20.0, 20.0)));
        f.log.borrow_mut().clear();
        let p = Point::new(20.0, 35.0);
        assert!(matches!(f.cx.handle_input(InputEvent::pointer_moved(p)), Response::Drag(_)));
        assert_eq!(f.cx.tree.parent_of(f.b), None);
        let path = f.cx.hit(p).map(|h| h.path).unwrap_or_default();
        assert_eq!(f.cx.active_tool().unwrap().hover_stack().items(), path.as_slice());
        assert!(f.log.borrow().contains(&Event::Exit(f.b)));
    }

    #[test]
    fn dispatched_delete_forgets_the_destroyed_subtree() {
        let mut f = fixture(true);
        let rec = f.cx.tree.handler(f.c);
        let x = f
            .cx
            .tree
            .insert_item(ItemDesc::with_frame(Rect::new(0.0, 0.0, 200.0, 20.0)));
        f.cx.tree.set_handler(x, rec).unwrap();
        f.cx.tree.add_child(f.c, x).unwrap();
        f.cx.handle_input(moved(10.0, 60.0));
        assert_eq!(f.cx.hovered(), Some(x));
        assert_eq!(f.cx.active_tool().map(Tool::owner), Some(f.c));
        f.cx.pickboards.active_mut().push_object(Picked::Item(x));
        f.cx.set_first_responder(Some(f.c));

        let response = f.cx.handle_input(InputEvent::new(InputKind::Command(EditCommand::Delete)));
        assert!(matches!(response, Response::Dispatched(d) if d.is_handled()));
        assert!(!f.cx.tree.is_alive(f.c));
        assert!(!f.cx.tree.is_alive(x));
        assert_eq!(f.cx.active_tool().map(Tool::owner), Some(f.root));
        assert_eq!(f.cx.active_tool().unwrap().hover_stack().items(), &[f.root, f.panel]);
        assert!(f.cx.tool(f.c).is_none());
        assert!(f.cx.pickboards.active().is_empty());
        assert_eq!(f.cx.scopes().focused.unwrap().first_responder, None);
    }

    #[test]
    fn dispatched_cut_stops_hovering_the_detached_item() {
        let mut f = fixture(true);
        f.cx.handle_input(moved(10.0, 10.0));
        f.cx.set_first_responder(Some(f.b));
        let response = f.cx.handle_input(InputEvent::new(InputKind::Command(EditCommand::Cut)));
        assert!(matches!(response, Response::Dispatched(d) if d.is_handled()));
        assert_eq!(f.cx.tree.parent_of(f.b), None);
        assert_eq!(f.cx.pickboards.active().top_object(), Some(&Picked::Item(f.b)));
        assert_eq!(f.cx.active_tool().unwrap().hover_stack().items(), &[f.root, f.panel]);
        assert_eq!(f.cx.scopes().focused.unwrap().first_responder, None);
    }

    #[test]
    fn destroying_the_dragged_item_ends_the_session_cancelled() {
        let mut f = fixture(true);
        f.cx.handle_input(InputEvent::pointer_down(Point::new(10.0, 10.0)));
        f.cx.handle_input(moved(10.0, 30.0));
        f.cx.destroy_item(f.b).unwrap();
        assert!(f.cx.drag_session().unwrap().payload().is_none());
        let response = f.cx.handle_input(InputEvent::pointer_up(Point::new(10.0, 120.0)));
        assert_eq!(response, Response::Dropped(DragOutcome::Cancelled));
        assert_eq!(f.cx.tree.children_of(f.c), &[] as &[ItemId]);
        let log = f.log.borrow();
        assert_eq!(log.iter().filter(|e| matches!(e, Event::End(..))).count(), 1);
    }

    #[test]
    fn shortcuts_copy_and_paste_through_the_first_responder() {
        let mut f = fixture(true);
        f.cx.set_first_responder(Some(f.b));
        let copy = KeyInput::new(Key::Character('c')).with_modifiers(Modifiers::META);
        f.cx.handle_input(InputEvent::new(InputKind::KeyDown(copy)));
        assert_eq!(f.cx.pickboards.active().top_object(), Some(&Picked::Item(f.b)));

        f.cx.set_first_responder(Some(f.c));
        let paste = KeyInput::new(Key::Character('v')).with_modifiers(Modifiers::META);
        let response = f.cx.handle_input(InputEvent::new(InputKind::KeyDown(paste)));
        assert!(matches!(response, Response::Dispatched(d) if d.is_handled()));
        let pasted = f.cx.tree.children_of(f.c);
        assert_eq!(pasted.len(), 1);
        assert_ne!(pasted[0], f.b);
        assert_eq!(f.cx.tree.parent_of(f.b), Some(f.panel));
    }
}
