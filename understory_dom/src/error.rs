// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exceptions surfaced by tree operations.

use core::fmt;

/// Error returned by a failed DOM operation.
///
/// Every variant maps to a legacy numeric DOM exception code through [`DomException::code`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DomException {
    /// An offset was negative or past the end of the character data (`INDEX_SIZE_ERR`).
    IndexSize,
    /// The node may not be inserted here (`HIERARCHY_REQUEST_ERR`).
    HierarchyRequest,
    /// The container or its data is read-only (`NO_MODIFICATION_ALLOWED_ERR`).
    NoModificationAllowed,
    /// The node is not a child of this container, or the id is stale (`NOT_FOUND_ERR`).
    NotFound,
    /// The operation is not supported for this kind of node (`INVALID_NODE_TYPE_ERR`).
    InvalidNodeType,
    /// A listener failed with a script-defined code.
    Listener(u16),
}

impl DomException {
    /// `INDEX_SIZE_ERR`.
    pub const INDEX_SIZE_ERR: u16 = 1;
    /// `HIERARCHY_REQUEST_ERR`.
    pub const HIERARCHY_REQUEST_ERR: u16 = 3;
    /// `NO_MODIFICATION_ALLOWED_ERR`.
    pub const NO_MODIFICATION_ALLOWED_ERR: u16 = 7;
    /// `NOT_FOUND_ERR`.
    pub const NOT_FOUND_ERR: u16 = 8;
    /// `INVALID_NODE_TYPE_ERR`.
    pub const INVALID_NODE_TYPE_ERR: u16 = 24;

    /// The numeric exception code.
    pub const fn code(self) -> u16 {
        match self {
            Self::IndexSize => Self::INDEX_SIZE_ERR,
            Self::HierarchyRequest => Self::HIERARCHY_REQUEST_ERR,
            Self::NoModificationAllowed => Self::NO_MODIFICATION_ALLOWED_ERR,
            Self::NotFound => Self::NOT_FOUND_ERR,
            Self::InvalidNodeType => Self::INVALID_NODE_TYPE_ERR,
            Self::Listener(code) => code,
        }
    }
}

impl fmt::Display for DomException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexSize => f.write_str("index or size is out of range"),
            Self::HierarchyRequest => f.write_str("node cannot be inserted at this point"),
            Self::NoModificationAllowed => f.write_str("node is read-only"),
            Self::NotFound => f.write_str("node was not found"),
            Self::InvalidNodeType => f.write_str("operation not supported by this node type"),
            Self::Listener(code) => write!(f, "listener raised exception code {code}"),
        }
    }
}

impl core::error::Error for DomException {}
