// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for tree operations.

use thiserror::Error;

use crate::types::ItemId;

/// Recoverable failures of tree operations.
///
/// Structural violations (decoration cycles, making a group its own
/// descendant, using a decorator as a child) are not represented here: they
/// are precondition failures and panic.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// The identifier does not refer to a live node.
    #[error("stale item id {0:?}")]
    StaleItem(ItemId),

    /// The operation needs a group.
    #[error("{0:?} is not an item group")]
    NotAGroup(ItemId),

    /// The operation needs a decorator.
    #[error("{0:?} is not a decorator")]
    NotADecorator(ItemId),

    /// The item has no parent group.
    #[error("{0:?} has no parent group")]
    Detached(ItemId),

    /// A child index was past the end of the group.
    #[error("index {index} out of bounds for group of {len} children")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Number of children.
        len: usize,
    },

    /// The decorator or the decorated chain vetoed the decoration.
    #[error("{decorator:?} cannot decorate {item:?}")]
    DecoratorRejected {
        /// Item whose chain was being extended.
        item: ItemId,
        /// Rejected decorator.
        decorator: ItemId,
    },
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
