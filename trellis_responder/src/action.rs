// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Semantic actions delivered to action handlers.
//!
//! Handlers never see raw input. Tools translate pointer, keyboard, and touch
//! primitives into these actions; locations are in the content space of the
//! root of the tree the action is dispatched in.

use kurbo::{Point, Vec2};

bitflags::bitflags! {
    /// Keyboard modifiers held during an action.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Shift.
        const SHIFT   = 0b0001;
        /// Control.
        const CONTROL = 0b0010;
        /// Alt / Option.
        const ALT     = 0b0100;
        /// Meta / Command.
        const META    = 0b1000;
    }
}

/// A logical key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Escape.
    Escape,
    /// Enter / Return.
    Enter,
    /// Tab.
    Tab,
    /// Backspace.
    Backspace,
    /// Forward delete.
    Delete,
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
    /// Up arrow.
    ArrowUp,
    /// Down arrow.
    ArrowDown,
    /// A key producing a character.
    Character(char),
}

/// A key press or release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyInput {
    /// The key.
    pub key: Key,
    /// Modifiers held.
    pub modifiers: Modifiers,
    /// Whether this is an auto-repeat.
    pub repeat: bool,
}

impl KeyInput {
    /// A non-repeated key without modifiers.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
            repeat: false,
        }
    }

    /// Set the modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// One touch point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Touch {
    /// Identifier stable for the lifetime of the touch.
    pub id: u64,
    /// Current location.
    pub location: Point,
}

/// Editing commands shared by menus, shortcuts, and handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditCommand {
    /// Pick the selection onto the pickboard and remove it.
    Cut,
    /// Pick the selection onto the pickboard.
    Copy,
    /// Drop the top of the pickboard.
    Paste,
    /// Remove the selection.
    Delete,
    /// Select every sibling.
    SelectAll,
}

/// The closed set of semantic actions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// A completed click. `count` is 1 for single clicks, 2 for the second
    /// click of a double click, and so on.
    Click {
        /// Where the click happened.
        location: Point,
        /// Click count.
        count: u32,
    },
    /// A double click.
    DoubleClick {
        /// Where the double click happened.
        location: Point,
    },
    /// The pointer dragged by `delta` without a pick session.
    DragBy {
        /// Movement since the previous step.
        delta: Vec2,
    },
    /// A key went down.
    KeyDown(KeyInput),
    /// A key went up.
    KeyUp(KeyInput),
    /// A touch started.
    BeginTouch(Touch),
    /// A touch moved.
    MoveTouch(Touch),
    /// A touch ended.
    EndTouch(Touch),
    /// The pointer entered the item.
    Enter,
    /// The pointer left the item.
    Exit,
    /// An editing command.
    Edit(EditCommand),
}

impl Action {
    /// Location carried by the action, if any.
    pub fn location(&self) -> Option<Point> {
        match *self {
            Self::Click { location, .. } | Self::DoubleClick { location } => Some(location),
            Self::BeginTouch(t) | Self::MoveTouch(t) | Self::EndTouch(t) => Some(t.location),
            _ => None,
        }
    }
}

/// Whether a responder fully handled an action.
///
/// There is no partial handling: `No` means dispatch goes on unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Handled {
    /// The action was handled; dispatch stops.
    Yes,
    /// The action was not handled; the next responder is tried.
    #[default]
    No,
}

impl Handled {
    /// Returns true for [`Handled::Yes`].
    pub fn is_handled(self) -> bool {
        self == Self::Yes
    }
}

impl From<bool> for Handled {
    fn from(handled: bool) -> Self {
        if handled { Self::Yes } else { Self::No }
    }
}
