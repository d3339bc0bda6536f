// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors of pick and drop operations.

use thiserror::Error;
use trellis_item_tree::{ItemId, TreeError};
use trellis_pickboard::PickboardError;

/// Failures of drag, cut, copy, and paste.
///
/// A rejected drop is not an error of the session: the session simply ends
/// cancelled. These errors cover operations that could not start at all.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum DragError {
    /// The item's handler refused to let it be picked.
    #[error("{0:?} cannot be dragged")]
    Vetoed(ItemId),

    /// No responder of the item has an action handler.
    #[error("no action handler for {0:?}")]
    NoHandler(ItemId),

    /// The item no longer exists.
    #[error("stale item id {0:?}")]
    Stale(ItemId),

    /// The pickboard holds nothing to paste.
    #[error("nothing to paste")]
    NothingToPaste,

    /// The drop target rejected the picked objects.
    #[error("{0:?} does not accept the picked objects")]
    Rejected(ItemId),

    /// A tree operation failed.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// A pickboard operation failed.
    #[error(transparent)]
    Pickboard(#[from] PickboardError),
}

/// Result type for pick and drop operations.
pub type DragResult<T> = Result<T, DragError>;
