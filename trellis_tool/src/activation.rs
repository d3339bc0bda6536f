// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! When a nested layout's tool takes over from its parent's.

use core::fmt::Debug;

/// Something that happened to a tool's owner group.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActivationTrigger {
    /// The pointer moved into the owner.
    PointerEntered,
    /// The pointer moved out of the owner.
    PointerExited,
    /// The owner, or something inside it, was double clicked.
    DoubleClicked,
    /// A press landed outside the owner.
    ClickedOutside,
}

/// Policy deciding when a tool becomes active and when it lets go.
///
/// Selected per tool, so specialized tools can change the policy without the
/// dispatch core knowing about them.
pub trait ActivationStrategy: Debug {
    /// Whether `trigger` activates the tool while its parent's tool is active.
    fn activates_on(&self, trigger: ActivationTrigger) -> bool;

    /// Whether `trigger` hands control back to the parent's tool.
    fn deactivates_on(&self, trigger: ActivationTrigger) -> bool;
}

/// Active while the pointer is inside the owner. The default.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivateOnEnter;

impl ActivationStrategy for ActivateOnEnter {
    fn activates_on(&self, trigger: ActivationTrigger) -> bool {
        trigger == ActivationTrigger::PointerEntered
    }

    fn deactivates_on(&self, trigger: ActivationTrigger) -> bool {
        trigger == ActivationTrigger::PointerExited
    }
}

/// Activated by a double click inside the owner, released by a click outside
/// it. Suits embedded editors that should not grab the pointer on hover.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivateOnDoubleClick;

impl ActivationStrategy for ActivateOnDoubleClick {
    fn activates_on(&self, trigger: ActivationTrigger) -> bool {
        trigger == ActivationTrigger::DoubleClicked
    }

    fn deactivates_on(&self, trigger: ActivationTrigger) -> bool {
        trigger == ActivationTrigger::ClickedOutside
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ActivationTrigger::*;

    #[test]
    fn enter_strategy_follows_the_pointer() {
        let s = ActivateOnEnter;
        assert!(s.activates_on(PointerEntered));
        assert!(!s.activates_on(DoubleClicked));
        assert!(s.deactivates_on(PointerExited));
        assert!(!s.deactivates_on(ClickedOutside));
    }

    #[test]
    fn double_click_strategy_ignores_hover() {
        let s = ActivateOnDoubleClick;
        assert!(!s.activates_on(PointerEntered));
        assert!(s.activates_on(DoubleClicked));
        assert!(!s.deactivates_on(PointerExited));
        assert!(s.deactivates_on(ClickedOutside));
    }
}
