// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canonical input events handed over by the host.

use kurbo::Point;
use trellis_pickboard::PickingMask;
use trellis_responder::{EditCommand, Key, KeyInput, Modifiers, Touch};

use crate::click::PointerId;

/// What happened.
///
/// Pointer positions are in the content space of the focused window's root.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InputKind {
    /// A pointer moved, pressed or not.
    PointerMoved {
        /// Which pointer.
        pointer: PointerId,
        /// Where it is now.
        position: Point,
    },
    /// A pointer button went down.
    PointerDown {
        /// Which pointer.
        pointer: PointerId,
        /// Where.
        position: Point,
    },
    /// A pointer button went up.
    PointerUp {
        /// Which pointer.
        pointer: PointerId,
        /// Where.
        position: Point,
    },
    /// A key went down.
    KeyDown(KeyInput),
    /// A key went up.
    KeyUp(KeyInput),
    /// A touch started.
    TouchBegan(Touch),
    /// A touch moved.
    TouchMoved(Touch),
    /// A touch ended.
    TouchEnded(Touch),
    /// An editing command from a menu.
    Command(EditCommand),
    /// The host aborted the current gesture.
    Cancel,
}

/// A canonical input event: what happened, plus the modifiers and picking
/// mask the host attached to it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InputEvent {
    /// What happened.
    pub kind: InputKind,
    /// Modifiers held.
    pub modifiers: Modifiers,
    /// Picking mask; empty for events that pick nothing.
    pub picking_mask: PickingMask,
    /// Milliseconds on the host clock.
    pub timestamp: u64,
}

impl InputEvent {
    /// An event without modifiers, mask, or timestamp.
    pub fn new(kind: InputKind) -> Self {
        Self {
            kind,
            modifiers: Modifiers::empty(),
            picking_mask: PickingMask::empty(),
            timestamp: 0,
        }
    }

    /// Pointer 0 moved to `position`.
    pub fn pointer_moved(position: Point) -> Self {
        Self::new(InputKind::PointerMoved { pointer: 0, position })
    }

    /// Pointer 0 pressed at `position`.
    pub fn pointer_down(position: Point) -> Self {
        Self::new(InputKind::PointerDown { pointer: 0, position })
    }

    /// Pointer 0 released at `position`.
    pub fn pointer_up(position: Point) -> Self {
        Self::new(InputKind::PointerUp { pointer: 0, position })
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

    /// Set the timestamp.
    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The editing command a key press stands for: the command (or control)
    /// modifier with X, C, V, or A.
    pub fn edit_shortcut(key: KeyInput) -> Option<EditCommand> {
        if !key
            .modifiers
            .intersects(Modifiers::META | Modifiers::CONTROL)
        {
            return None;
        }
        match key.key {
            Key::Character(c) => match c.to_ascii_lowercase() {
                'x' => Some(EditCommand::Cut),
                'c' => Some(EditCommand::Copy),
                'v' => Some(EditCommand::Paste),
                'a' => Some(EditCommand::SelectAll),
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_need_a_command_modifier() {
        let plain = KeyInput::new(Key::Character('c'));
        assert_eq!(InputEvent::edit_shortcut(plain), None);
        let copy = plain.with_modifiers(Modifiers::META);
        assert_eq!(InputEvent::edit_shortcut(copy), Some(EditCommand::Copy));
        let paste = KeyInput::new(Key::Character('V')).with_modifiers(Modifiers::CONTROL | Modifiers::SHIFT);
        assert_eq!(InputEvent::edit_shortcut(paste), Some(EditCommand::Paste));
        let escape = KeyInput::new(Key::Escape).with_modifiers(Modifiers::CONTROL);
        assert_eq!(InputEvent::edit_shortcut(escape), None);
    }
}
