// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the item tree: identifiers, flags, node kinds, and item descriptions.

use alloc::rc::Rc;
use core::any::Any;

use kurbo::{Affine, Rect, Vec2};

/// Identifier for an item, group, or decorator in the tree (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) u32, pub(crate) u32);

impl ItemId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Key of a shared action handler.
///
/// Items only hold this key; the handler objects themselves live in a registry
/// owned by the dispatch layer, so many items can share one handler.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u32);

/// Key of a controller bound to a base item.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ControllerId(pub u32);

/// The model object an item presents.
///
/// Represented objects are owned by the model layer and shared with the tree.
pub type Represented = Rc<dyn Any>;

bitflags::bitflags! {
    /// Per-item state flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ItemFlags: u8 {
        /// Item is visible and participates in hit testing.
        const VISIBLE    = 0b0000_0001;
        /// Item is currently selected in its parent group.
        const SELECTED   = 0b0000_0010;
        /// Item may become selected.
        const SELECTABLE = 0b0000_0100;
    }
}

impl Default for ItemFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::SELECTABLE
    }
}

bitflags::bitflags! {
    /// How an item's frame follows the size of its enclosing item.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Autoresizing: u8 {
        /// Left margin is flexible.
        const FLEXIBLE_MIN_X  = 0b0000_0001;
        /// Width is flexible.
        const FLEXIBLE_WIDTH  = 0b0000_0010;
        /// Right margin is flexible.
        const FLEXIBLE_MAX_X  = 0b0000_0100;
        /// Top margin is flexible.
        const FLEXIBLE_MIN_Y  = 0b0000_1000;
        /// Height is flexible.
        const FLEXIBLE_HEIGHT = 0b0001_0000;
        /// Bottom margin is flexible.
        const FLEXIBLE_MAX_Y  = 0b0010_0000;
    }
}

impl Autoresizing {
    /// Width and height both follow the enclosing item.
    pub const FILL: Self = Self::FLEXIBLE_WIDTH.union(Self::FLEXIBLE_HEIGHT);
}

/// What a decorator draws around the item it wraps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DecoratorKind {
    /// A window frame. A window is always the outermost decorator.
    Window,
    /// A title bar of the given height above the content.
    TitleBar {
        /// Height of the bar, in decorator coordinates.
        height: f64,
    },
    /// A scroll frame; `offset` is the scrolled distance of the content.
    Scroll {
        /// Current scroll position of the content.
        offset: Vec2,
    },
    /// Application-defined decoration with no chrome of its own.
    Custom(u32),
}

impl DecoratorKind {
    /// Translation from content space into decorator space.
    pub fn content_offset(&self) -> Vec2 {
        match *self {
            Self::Window | Self::Custom(_) => Vec2::ZERO,
            Self::TitleBar { height } => Vec2::new(0.0, height),
            Self::Scroll { offset } => -offset,
        }
    }

    /// Extra room the decoration adds around content of the wrapped size.
    pub fn chrome(&self) -> Vec2 {
        match *self {
            Self::TitleBar { height } => Vec2::new(0.0, height),
            Self::Window | Self::Scroll { .. } | Self::Custom(_) => Vec2::ZERO,
        }
    }

    /// Whether this decorator may wrap a node of the given kind.
    ///
    /// A window never wraps another window.
    pub fn can_decorate(&self, target: &ItemKind) -> bool {
        !matches!(
            (self, target),
            (Self::Window, ItemKind::Decorator(Self::Window))
        )
    }

    /// Whether a node of this kind accepts being wrapped by another decorator.
    pub fn accepts_decorator(&self, _decorator: &Self) -> bool {
        !matches!(self, Self::Window)
    }
}

/// Node kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ItemKind {
    /// Leaf presentation item.
    Item,
    /// Item owning an ordered sequence of children.
    Group,
    /// Non-semantic wrapper around exactly one item or decorator.
    Decorator(DecoratorKind),
}

impl ItemKind {
    /// Returns true for groups.
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group)
    }

    /// Returns true for decorators.
    pub fn is_decorator(&self) -> bool {
        matches!(self, Self::Decorator(_))
    }
}

/// Description of a new item.
#[derive(Clone)]
pub struct ItemDesc {
    /// Frame in the enclosing item's content space.
    pub frame: Rect,
    /// Transform applied to the content about the frame origin.
    pub transform: Affine,
    /// State flags.
    pub flags: ItemFlags,
    /// Autoresizing mask.
    pub autoresizing: Autoresizing,
    /// Shared action handler key.
    pub handler: Option<HandlerId>,
    /// Presented model object.
    pub represented: Option<Represented>,
}

impl Default for ItemDesc {
    fn default() -> Self {
        Self {
            frame: Rect::ZERO,
            transform: Affine::IDENTITY,
            flags: ItemFlags::default(),
            autoresizing: Autoresizing::empty(),
            handler: None,
            represented: None,
        }
    }
}

impl core::fmt::Debug for ItemDesc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ItemDesc")
            .field("frame", &self.frame)
            .field("transform", &self.transform)
            .field("flags", &self.flags)
            .field("autoresizing", &self.autoresizing)
            .field("handler", &self.handler)
            .field("represented", &self.represented.is_some())
            .finish()
    }
}

impl ItemDesc {
    /// An item description with the given frame and default state.
    pub fn with_frame(frame: Rect) -> Self {
        Self {
            frame,
            ..Self::default()
        }
    }

    /// Set the handler key.
    pub fn handler(mut self, handler: HandlerId) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Set the represented object.
    pub fn represented(mut self, object: Represented) -> Self {
        self.represented = Some(object);
        self
    }

    /// Set the flags.
    pub fn flags(mut self, flags: ItemFlags) -> Self {
        self.flags = flags;
        self
    }
}
