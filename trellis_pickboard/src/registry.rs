// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The set of pickboards and which one is active.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use hashbrown::HashMap;
use trellis_item_tree::ItemId;

use crate::error::{PickboardError, PickboardResult};
use crate::pickboard::{Pickboard, PickboardScope};
use crate::targets;

/// Named pickboards with exactly one active board.
///
/// The registry is owned by the UI context rather than being process-global,
/// so each test or document window can carry its own.
#[derive(Clone, Debug)]
pub struct Pickboards {
    boards: HashMap<String, Pickboard>,
    active: String,
}

impl Default for Pickboards {
    fn default() -> Self {
        Self::new()
    }
}

impl Pickboards {
    /// Name of the shared, system-scoped board.
    pub const GENERAL: &'static str = "general";
    /// Name of the process-local board, active by default.
    pub const LOCAL: &'static str = "local";

    /// Create the standard registry with the general and local boards.
    pub fn new() -> Self {
        let mut boards = HashMap::new();
        boards.insert(
            Self::GENERAL.to_string(),
            Pickboard::new(Self::GENERAL, PickboardScope::System),
        );
        let mut local = Pickboard::new(Self::LOCAL, PickboardScope::Local);
        local.set_active(true);
        boards.insert(Self::LOCAL.to_string(), local);
        Self {
            boards,
            active: Self::LOCAL.to_string(),
        }
    }

    /// Add a board, replacing any board of the same name.
    ///
    /// Replacing the active board keeps it active.
    pub fn insert(&mut self, mut board: Pickboard) {
        board.set_active(board.name() == self.active);
        self.boards.insert(board.name().to_string(), board);
    }

    /// Board named `name`.
    pub fn get(&self, name: &str) -> Option<&Pickboard> {
        self.boards.get(name)
    }

    /// Board named `name`, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Pickboard> {
        self.boards.get_mut(name)
    }

    /// Make `name` the active board.
    ///
    /// The outgoing board is told first; afterwards exactly one board is
    /// active.
    pub fn activate(&mut self, name: &str) -> PickboardResult<()> {
        if !self.boards.contains_key(name) {
            return Err(PickboardError::UnknownPickboard(name.to_string()));
        }
        if self.active == name {
            return Ok(());
        }
        if let Some(outgoing) = self.boards.get_mut(&self.active) {
            outgoing.set_active(false);
        }
        if let Some(incoming) = self.boards.get_mut(name) {
            incoming.set_active(true);
        }
        tracing::debug!(target: targets::PICKBOARD, from = %self.active, to = name, "switched active pickboard");
        self.active = name.to_string();
        Ok(())
    }

    /// Name of the active board.
    pub fn active_name(&self) -> &str {
        &self.active
    }

    /// The active board.
    pub fn active(&self) -> &Pickboard {
        &self.boards[&self.active]
    }

    /// The active board, mutably.
    pub fn active_mut(&mut self) -> &mut Pickboard {
        self.boards
            .get_mut(&self.active)
            .expect("the active pickboard is always registered")
    }

    /// Names of all boards, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.boards.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Drop every reference to `item` from every board.
    pub fn forget_item(&mut self, item: ItemId) -> usize {
        self.boards.values_mut().map(|b| b.forget_item(item)).sum()
    }
}
