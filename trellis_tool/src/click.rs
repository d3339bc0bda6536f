// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Click recognition for items that may move under the pointer.
//!
//! A press remembers the item it started on. Releasing over the same item is
//! always a click. Releasing elsewhere is still a click when the pointer
//! stayed within the movement tolerance and the press was short enough,
//! since the item itself may have moved away (a pressed-state animation, a
//! layout pass). Once the pointer travels beyond the movement tolerance, the
//! press can no longer become a click.
//!
//! Consecutive clicks on the same item within the double-click interval
//! count up, so the second one reports `count == 2`.
//!
//! ```
//! use kurbo::Point;
//! use trellis_item_tree::{ItemDesc, Tree};
//! use trellis_tool::{ClickResult, ClickState};
//!
//! let mut tree = Tree::new();
//! let button = tree.insert_item(ItemDesc::default());
//!
//! let mut clicks = ClickState::new();
//! clicks.on_down(0, button, Point::new(10.0, 10.0), 1_000);
//! assert_eq!(
//!     clicks.on_up(0, Some(button), Point::new(11.0, 10.0), 1_050),
//!     ClickResult::Click { target: button, count: 1 }
//! );
//! clicks.on_down(0, button, Point::new(10.0, 10.0), 1_200);
//! assert_eq!(
//!     clicks.on_up(0, Some(button), Point::new(10.0, 10.0), 1_250),
//!     ClickResult::Click { target: button, count: 2 }
//! );
//! ```

use alloc::collections::BTreeMap;

use kurbo::Point;
use trellis_item_tree::ItemId;

/// Identifies one pointer (mouse, pen, or touch contact).
pub type PointerId = u64;

/// An in-flight press.
#[derive(Clone, Debug, PartialEq)]
pub struct Press {
    /// Item the press started on.
    pub target: ItemId,
    /// Where the press started.
    pub down_position: Point,
    /// When the press started, in milliseconds.
    pub down_time: u64,
    /// Set once the pointer moved beyond the movement tolerance.
    pub distance_exceeded: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct LastClick {
    target: ItemId,
    position: Point,
    time: u64,
    count: u32,
}

/// Result of releasing a press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickResult {
    /// A click on `target`; `count` is 2 for a double click, and so on.
    Click {
        /// The clicked item.
        target: ItemId,
        /// Consecutive click count.
        count: u32,
    },
    /// No click. Carries the pressed item, if there was a press.
    Suppressed(Option<ItemId>),
}

/// Press tracking and click counting, per pointer.
#[derive(Clone, Debug)]
pub struct ClickState {
    presses: BTreeMap<PointerId, Press>,
    /// Maximum pointer travel for a release away from the pressed item to
    /// still count. `None` disables the tolerance.
    pub move_tolerance: Option<f64>,
    /// Maximum press duration, in milliseconds, for a release away from the
    /// pressed item to still count. `None` disables the tolerance.
    pub time_tolerance: Option<u64>,
    /// Longest pause, in milliseconds, between clicks that count up.
    pub double_click_interval: u64,
    last_click: Option<LastClick>,
}

impl Default for ClickState {
    fn default() -> Self {
        Self::new()
    }
}

impl ClickState {
    /// Recognizer with a 5 pixel, 100 ms tolerance and a 500 ms double-click
    /// interval.
    pub fn new() -> Self {
        Self::with_thresholds(Some(5.0), Some(100), 500)
    }

    /// Recognizer with explicit tolerances.
    pub fn with_thresholds(
        move_tolerance: Option<f64>,
        time_tolerance: Option<u64>,
        double_click_interval: u64,
    ) -> Self {
        Self {
            presses: BTreeMap::new(),
            move_tolerance,
            time_tolerance,
            double_click_interval,
            last_click: None,
        }
    }

    /// Record a press of `pointer` on `target`.
    pub fn on_down(&mut self, pointer: PointerId, target: ItemId, position: Point, timestamp: u64) {
        self.presses.insert(
            pointer,
            Press {
                target,
                down_position: position,
                down_time: timestamp,
                distance_exceeded: false,
            },
        );
    }

    /// Track pointer movement during a press.
    ///
    /// Returns the pressed item the first time the pointer leaves the
    /// movement tolerance.
    pub fn on_move(&mut self, pointer: PointerId, position: Point) -> Option<ItemId> {
        let press = self.presses.get_mut(&pointer)?;
        let threshold = self.move_tolerance?;
        if press.distance_exceeded || press.down_position.distance(position) <= threshold {
            return None;
        }
        press.distance_exceeded = true;
        Some(press.target)
    }

    /// Release `pointer` over `current_target`.
    pub fn on_up(
        &mut self,
        pointer: PointerId,
        current_target: Option<ItemId>,
        position: Point,
        timestamp: u64,
    ) -> ClickResult {
        let Some(press) = self.presses.remove(&pointer) else {
            return ClickResult::Suppressed(None);
        };
        let accepted = if current_target == Some(press.target) {
            true
        } else if press.distance_exceeded
            || (self.move_tolerance.is_none() && self.time_tolerance.is_none())
        {
            false
        } else {
            let moved_ok = self
                .move_tolerance
                .is_none_or(|t| press.down_position.distance(position) <= t);
            let time_ok = self
                .time_tolerance
                .is_none_or(|t| timestamp.saturating_sub(press.down_time) <= t);
            moved_ok && time_ok
        };
        if !accepted {
            return ClickResult::Suppressed(Some(press.target));
        }
        let count = match self.last_click {
            Some(last)
                if last.target == press.target
                    && press.down_time.saturating_sub(last.time) <= self.double_click_interval
                    && self
                        .move_tolerance
                        .is_none_or(|t| last.position.distance(press.down_position) <= t) =>
            {
                last.count + 1
            }
            _ => 1,
        };
        self.last_click = Some(LastClick {
            target: press.target,
            position: press.down_position,
            time: timestamp,
            count,
        });
        ClickResult::Click {
            target: press.target,
            count,
        }
    }

    /// Forget the press of `pointer`. Returns true if there was one.
    pub fn cancel(&mut self, pointer: PointerId) -> bool {
        self.presses.remove(&pointer).is_some()
    }

    /// Returns true if `pointer` is pressed.
    pub fn is_pressed(&self, pointer: PointerId) -> bool {
        self.presses.contains_key(&pointer)
    }

    /// The press of `pointer`, if any.
    pub fn press(&self, pointer: PointerId) -> Option<&Press> {
        self.presses.get(&pointer)
    }

    /// Forget every press and the click history.
    pub fn clear(&mut self) {
        self.presses.clear();
        self.last_click = None;
    }

    /// Drop presses and click history involving `item`.
    pub fn forget_item(&mut self, item: ItemId) {
        self.presses.retain(|_, press| press.target != item);
        if self.last_click.is_some_and(|last| last.target == item) {
            self.last_click = None;
        }
    }
}
