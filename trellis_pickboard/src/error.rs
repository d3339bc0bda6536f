// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pickboard errors.

use alloc::string::String;

use thiserror::Error;

use crate::pickboard::PickRef;

/// Failures of pickboard operations.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum PickboardError {
    /// The reference was never issued by this board or was already removed.
    #[error("unknown pickboard reference {0:?}")]
    UnknownReference(PickRef),

    /// No board with this name is registered.
    #[error("no pickboard named {0:?}")]
    UnknownPickboard(String),

    /// The board holds no objects.
    #[error("pickboard is empty")]
    Empty,
}

/// Result type for pickboard operations.
pub type PickboardResult<T> = Result<T, PickboardError>;
