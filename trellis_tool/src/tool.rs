// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tools: per-layout interpreters of pointer input.

use alloc::boxed::Box;

use trellis_item_tree::ItemId;

use crate::activation::{ActivateOnEnter, ActivationStrategy, ActivationTrigger};
use crate::click::ClickState;
use crate::config::ToolConfig;
use crate::hover::HoverStack;
use crate::targets;

/// Pointer shape a tool asks for.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// The platform arrow.
    #[default]
    Arrow,
    /// Something under the pointer can be picked up.
    Grab,
    /// Something is being dragged.
    Grabbing,
    /// A drop here would copy.
    Copy,
    /// Nothing here accepts the drag.
    NotAllowed,
}

/// The input interpreter bound to one layout owner group.
///
/// Only the active tool holds a hover stack; it is handed over as a whole
/// when another tool takes over, so hovering stays continuous.
#[derive(Debug)]
pub struct Tool {
    owner: ItemId,
    hover: HoverStack,
    cursor: Cursor,
    clicks: ClickState,
    strategy: Box<dyn ActivationStrategy>,
    active: bool,
}

impl Tool {
    /// An inactive tool for `owner` that activates on pointer enter.
    pub fn new(owner: ItemId, config: &ToolConfig) -> Self {
        Self {
            owner,
            hover: HoverStack::new(),
            cursor: Cursor::Arrow,
            clicks: ClickState::with_thresholds(
                config.click_move_tolerance,
                config.click_time_tolerance,
                config.double_click_interval,
            ),
            strategy: Box::new(ActivateOnEnter),
            active: false,
        }
    }

    /// Replace the activation strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn ActivationStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// The layout owner group this tool interprets input for.
    pub fn owner(&self) -> ItemId {
        self.owner
    }

    /// Returns true while this is the context's active tool.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Hovered items, while active.
    pub fn hover_stack(&self) -> &HoverStack {
        &self.hover
    }

    pub(crate) fn hover_stack_mut(&mut self) -> &mut HoverStack {
        &mut self.hover
    }

    /// Requested pointer shape.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Request a pointer shape.
    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// Press tracking and click counting.
    pub fn clicks(&self) -> &ClickState {
        &self.clicks
    }

    pub(crate) fn clicks_mut(&mut self) -> &mut ClickState {
        &mut self.clicks
    }

    /// The activation strategy.
    pub fn strategy(&self) -> &dyn ActivationStrategy {
        &*self.strategy
    }

    /// Whether `trigger` activates this tool.
    pub fn activates_on(&self, trigger: ActivationTrigger) -> bool {
        self.strategy.activates_on(trigger)
    }

    /// Whether `trigger` deactivates this tool.
    pub fn deactivates_on(&self, trigger: ActivationTrigger) -> bool {
        self.strategy.deactivates_on(trigger)
    }

    /// Take over as active tool, inheriting the outgoing tool's hover stack.
    pub fn did_become_active(&mut self, hover: HoverStack) {
        tracing::debug!(target: targets::TOOL, owner = ?self.owner, "tool became active");
        self.active = true;
        self.hover = hover;
    }

    /// Stop being the active tool. Releases the hover stack, which is returned
    /// for the incoming tool, resets the cursor, and forgets pending presses.
    pub fn did_become_inactive(&mut self) -> HoverStack {
        tracing::debug!(target: targets::TOOL, owner = ?self.owner, "tool became inactive");
        self.active = false;
        self.cursor = Cursor::Arrow;
        self.clicks.clear();
        core::mem::take(&mut self.hover)
    }

    /// Drop every reference to `item`.
    pub fn forget_item(&mut self, item: ItemId) {
        self.hover.forget_item(item);
        self.clicks.forget_item(item);
    }
}
