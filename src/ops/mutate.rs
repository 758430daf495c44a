// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! In-tree mutation primitives shared by the operation drivers.
//!
//! All functions here run under the tree lock and never invoke callbacks.

use super::OpFlags;
use crate::{
    attributes::Attributes,
    filesystem::EngineState,
    path::eq_ignore_case,
    time::now_ticks,
    tree::{is_name_valid, NodeId},
    Error,
};

/// Generates children of `id`, and of its immediate subdirectories when
/// `levels > 0`.
///
/// A directory about to be cloned materializes one extra level so the copy
/// is observable without touching the source again.
pub(crate) fn ensure_levels(state: &mut EngineState, id: NodeId, levels: u32) {
    let params = state.params();
    state.forest.ensure_children(&params, id);

    if levels == 0 {
        return;
    }

    let subdirectories: Vec<NodeId> = state
        .forest
        .node(id)
        .children
        .iter()
        .copied()
        .filter(|&child| state.forest.node(child).is_directory)
        .collect();

    for child in subdirectories {
        ensure_levels(state, child, levels - 1);
    }
}

/// Applies the overwrite rules to an existing destination entry.
///
/// On success the existing entry (if any) has been removed from the tree.
fn displace_existing(
    state: &mut EngineState,
    dest_parent: NodeId,
    dest_name: &str,
    flags: OpFlags,
    exclude: Option<NodeId>,
) -> crate::Result<()> {
    let Some(existing) = state.forest.find_child(dest_parent, dest_name) else {
        return Ok(());
    };

    if exclude == Some(existing) {
        return Ok(());
    }

    if !flags.contains(OpFlags::ALLOW_OVERWRITE) {
        return Err(Error::AlreadyExists);
    }

    if state
        .forest
        .node(existing)
        .attributes
        .contains(Attributes::READONLY)
        && !flags.contains(OpFlags::ALLOW_REPLACE_READONLY)
    {
        return Err(Error::AccessDenied);
    }

    state.forest.extract_child(dest_parent, existing, now_ticks());
    state.forest.free_subtree(existing);
    Ok(())
}

/// Copies `source` (recursively for directories) below `dest_parent`.
///
/// Returns the copied byte count for throttling.
pub(crate) fn copy_node(
    state: &mut EngineState,
    source: NodeId,
    dest_parent: NodeId,
    dest_name: &str,
    flags: OpFlags,
) -> crate::Result<u64> {
    if !is_name_valid(dest_name) {
        return Err(Error::InvalidName);
    }

    if state.forest.node(source).is_directory {
        if !flags.contains(OpFlags::RECURSIVE) {
            return Err(Error::DirectoryNotEmpty);
        }
        ensure_levels(state, source, 1);
    }

    let params = state.params();
    state.forest.ensure_children(&params, dest_parent);
    displace_existing(state, dest_parent, dest_name, flags, None)?;

    let clone = state.forest.clone_subtree(source);
    state.forest.node_mut(clone).name = dest_name.to_owned();

    let now = now_ticks();
    state.forest.add_child(dest_parent, clone, now);
    state.forest.node_mut(clone).touch(now);

    Ok(state.forest.subtree_bytes(clone))
}

/// Copies only the directory frame of `source` below `dest_parent`.
///
/// Children are moved or copied by separate work items; the clone starts
/// empty and already expanded.
pub(crate) fn create_directory_clone(
    state: &mut EngineState,
    source: NodeId,
    dest_parent: NodeId,
    dest_name: &str,
    flags: OpFlags,
) -> crate::Result<NodeId> {
    if !is_name_valid(dest_name) {
        return Err(Error::InvalidName);
    }

    if !state.forest.node(source).is_directory {
        return Err(Error::NotADirectory);
    }

    let params = state.params();
    state.forest.ensure_children(&params, dest_parent);
    displace_existing(state, dest_parent, dest_name, flags, None)?;

    let clone = {
        let node = state.forest.node(source);
        crate::tree::Node {
            name: dest_name.to_owned(),
            is_directory: true,
            attributes: node.attributes | Attributes::DIRECTORY,
            size_bytes: 0,
            creation: node.creation,
            last_access: node.last_access,
            last_write: node.last_write,
            change: node.change,
            generation_seed: node.generation_seed,
            planned_child_count: 0,
            children_generated: true,
            materialized_content: None,
            parent: None,
            children: Vec::new(),
        }
    };

    let clone = state.forest.alloc(clone);

    let now = now_ticks();
    state.forest.add_child(dest_parent, clone, now);
    state.forest.node_mut(clone).touch(now);

    Ok(clone)
}

/// Moves `source` below `dest_parent` under `dest_name`.
///
/// A same-parent same-name move is a fast path that only touches
/// timestamps. Returns the moved byte count.
pub(crate) fn move_node(
    state: &mut EngineState,
    source: NodeId,
    dest_parent: NodeId,
    dest_name: &str,
    flags: OpFlags,
) -> crate::Result<u64> {
    if !is_name_valid(dest_name) {
        return Err(Error::InvalidName);
    }

    let Some(source_parent) = state.forest.node(source).parent else {
        return Err(Error::AccessDenied);
    };

    if source_parent == dest_parent && eq_ignore_case(&state.forest.node(source).name, dest_name) {
        let node = state.forest.node_mut(source);
        node.name = dest_name.to_owned();
        node.touch(now_ticks());
        return Ok(state.forest.subtree_bytes(source));
    }

    if state.forest.node(source).is_directory {
        ensure_levels(state, source, 1);
    }

    let params = state.params();
    state.forest.ensure_children(&params, dest_parent);
    displace_existing(state, dest_parent, dest_name, flags, Some(source))?;

    let now = now_ticks();
    state.forest.extract_child(source_parent, source, now);
    state.forest.node_mut(source).name = dest_name.to_owned();
    state.forest.add_child(dest_parent, source, now);
    state.forest.node_mut(source).touch(now);

    Ok(state.forest.subtree_bytes(source))
}

/// Deletes `target` from its parent.
pub(crate) fn delete_node(
    state: &mut EngineState,
    target: NodeId,
    flags: OpFlags,
) -> crate::Result<()> {
    let Some(parent) = state.forest.node(target).parent else {
        return Err(Error::AccessDenied);
    };

    let node = state.forest.node(target);
    if node.attributes.contains(Attributes::READONLY)
        && !flags.contains(OpFlags::ALLOW_REPLACE_READONLY)
    {
        return Err(Error::AccessDenied);
    }

    if node.is_directory && !flags.contains(OpFlags::RECURSIVE) && node.considered_non_empty() {
        return Err(Error::DirectoryNotEmpty);
    }

    state.forest.extract_child(parent, target, now_ticks());
    state.forest.free_subtree(target);
    Ok(())
}
