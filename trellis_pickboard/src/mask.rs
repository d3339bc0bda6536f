// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The picking mask carried by pick-related events.

bitflags::bitflags! {
    /// Which pick operation an event takes part in.
    ///
    /// One mask unifies drag, drop, cut, copy, and paste, so a single handler
    /// query (for example whether an item leaves its group at pick time) can
    /// decide from the mask alone.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PickingMask: u8 {
        /// Something is being picked up.
        const PICK  = 0b0000_0001;
        /// Something is being put down.
        const DROP  = 0b0000_0010;
        /// The pick or drop is part of a pointer drag.
        const DRAG  = 0b0000_0100;
        /// The picked objects stay where they are.
        const COPY  = 0b0000_1000;
        /// The picked objects leave their origin.
        const CUT   = 0b0001_0000;
        /// The drop comes from the pickboard rather than a drag.
        const PASTE = 0b0010_0000;
    }
}

impl PickingMask {
    /// Mask of a pointer drag picking its source.
    pub const DRAG_PICK: Self = Self::DRAG.union(Self::PICK);
    /// Mask of a pointer drag dropping onto its target.
    pub const DRAG_DROP: Self = Self::DRAG.union(Self::DROP);
    /// Mask of a cut edit command.
    pub const CUT_PICK: Self = Self::CUT.union(Self::PICK);
    /// Mask of a copy edit command.
    pub const COPY_PICK: Self = Self::COPY.union(Self::PICK);
    /// Mask of a paste edit command.
    pub const PASTE_DROP: Self = Self::PASTE.union(Self::DROP);

    /// Returns true when the picked objects are expected to leave their origin.
    pub fn removes_source(self) -> bool {
        self.contains(Self::CUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cut_removes_source() {
        assert!(PickingMask::CUT_PICK.removes_source());
        assert!(!PickingMask::COPY_PICK.removes_source());
        assert!(!PickingMask::DRAG_PICK.removes_source());
        assert!((PickingMask::DRAG_PICK | PickingMask::CUT).removes_source());
    }
}
