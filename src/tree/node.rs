// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{attributes::Attributes, time::Ticks};
use std::sync::Arc;

/// Handle to a node inside a [`Forest`](crate::tree::Forest) arena.
///
/// Nodes do not own each other; ownership lives in the arena, so dropping a
/// forest never recurses through deep trees.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct NodeId(pub(crate) u32);

/// A single file or directory.
#[derive(Debug)]
pub struct Node {
    /// Entry name, unique below its parent under case-insensitive comparison.
    pub name: String,

    /// Immutable after creation.
    pub is_directory: bool,

    /// Attribute bit set; `DIRECTORY` iff `is_directory`.
    pub attributes: Attributes,

    /// Byte size; zero for directories.
    pub size_bytes: u64,

    /// Creation timestamp.
    pub creation: Ticks,

    /// Last read access.
    pub last_access: Ticks,

    /// Last content write.
    pub last_write: Ticks,

    /// Last metadata change.
    pub change: Ticks,

    /// Seed driving every random decision below this node.
    pub generation_seed: u64,

    /// How many children this directory will materialize on first expansion.
    pub planned_child_count: u32,

    /// Latch: once `true`, `children` is authoritative.
    pub children_generated: bool,

    /// Explicit content written by a host; `None` means bytes are synthesized
    /// on demand from `generation_seed`.
    pub materialized_content: Option<Arc<Vec<u8>>>,

    /// Non-owning back reference.
    pub parent: Option<NodeId>,

    /// Owned child handles.
    pub children: Vec<NodeId>,
}

impl Node {
    /// Returns `true` when a non-recursive delete must refuse this node.
    ///
    /// An unexpanded directory counts as non-empty when it still plans to
    /// generate children.
    #[must_use]
    pub fn considered_non_empty(&self) -> bool {
        if !self.is_directory {
            return false;
        }

        if self.children_generated {
            !self.children.is_empty()
        } else {
            self.planned_child_count > 0
        }
    }

    /// Sets all mutation timestamps to `now`.
    pub fn touch(&mut self, now: Ticks) {
        self.last_write = now;
        self.change = now;
        self.last_access = now;
    }
}

/// Returns `true` if `name` is acceptable as an entry name.
#[must_use]
pub fn is_name_valid(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }

    !name.contains(['\\', '/', ':', '*', '?', '"', '<', '>', '|'])
}
