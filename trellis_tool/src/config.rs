// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tuning knobs for input interpretation.

use trellis_responder::{HitTestFilter, Modifiers};

/// How the [`Context`](crate::Context) interprets raw input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolConfig {
    /// Pointer travel, in root content units, that turns a press into a drag.
    pub drag_distance: f64,
    /// Longest pause between clicks that count as a double click, in
    /// milliseconds.
    pub double_click_interval: u64,
    /// Pointer travel still accepted for a click released off its item.
    pub click_move_tolerance: Option<f64>,
    /// Press duration still accepted for a click released off its item, in
    /// milliseconds.
    pub click_time_tolerance: Option<u64>,
    /// Modifier that forces a pick of items whose handler refuses dragging.
    pub force_pick_modifier: Modifiers,
    /// Which items the pointer can hit.
    pub hit_filter: HitTestFilter,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            drag_distance: 4.0,
            double_click_interval: 500,
            click_move_tolerance: Some(5.0),
            click_time_tolerance: Some(100),
            force_pick_modifier: Modifiers::ALT,
            hit_filter: HitTestFilter::default(),
        }
    }
}

impl ToolConfig {
    /// Set the drag start distance.
    pub fn with_drag_distance(mut self, distance: f64) -> Self {
        self.drag_distance = distance;
        self
    }

    /// Set the double-click interval.
    pub fn with_double_click_interval(mut self, millis: u64) -> Self {
        self.double_click_interval = millis;
        self
    }

    /// Set the click tolerances.
    pub fn with_click_tolerances(mut self, movement: Option<f64>, millis: Option<u64>) -> Self {
        self.click_move_tolerance = movement;
        self.click_time_tolerance = millis;
        self
    }

    /// Set the forced-pick modifier.
    pub fn with_force_pick_modifier(mut self, modifiers: Modifiers) -> Self {
        self.force_pick_modifier = modifiers;
        self
    }

    /// Set the hit-test filter.
    pub fn with_hit_filter(mut self, filter: HitTestFilter) -> Self {
        self.hit_filter = filter;
        self
    }
}
