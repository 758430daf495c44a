// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Move and rename drivers.

use super::{
    context::OperationContext,
    mutate,
    throttle::throttled_byte_progress,
    OpFlags, OperationCallback, OperationKind, OperationOptions,
};
use crate::{
    filesystem::{EngineState, FileSystem},
    path::{append_path, eq_ignore_case, path_leaf, VfsPath},
    rng::combine_seed_str,
    tree::NodeId,
    watch::ChangeAction,
    Error,
};

fn locked_move(
    state: &mut EngineState,
    source: &VfsPath,
    destination: &VfsPath,
    flags: OpFlags,
) -> crate::Result<u64> {
    let params = state.params();
    let source_id = state.forest.resolve(&params, source, false, false)?;

    let name = destination
        .file_name()
        .map(str::to_owned)
        .ok_or(Error::InvalidName)?;
    let parent_path = destination.parent().ok_or(Error::InvalidName)?;
    let parent_id = state.forest.resolve(&params, &parent_path, false, true)?;

    if state.forest.is_ancestor(source_id, parent_id) {
        return Err(Error::InvalidName);
    }

    mutate::move_node(state, source_id, parent_id, &name, flags)
}

fn notify_relocation(fs: &FileSystem, source: &VfsPath, dest_parent: &str, dest_name: &str) {
    let source_parent = source.parent().map(|p| p.as_str().to_owned()).unwrap_or_default();
    let source_leaf = source.file_name().unwrap_or_default();

    if eq_ignore_case(&source_parent, dest_parent) {
        if source_leaf == dest_name {
            // No observable change, still a touch.
            fs.watchers()
                .notify(dest_parent, &[(ChangeAction::Modified, dest_name)]);
        } else {
            fs.watchers().notify(
                dest_parent,
                &[
                    (ChangeAction::RenamedOldName, source_leaf),
                    (ChangeAction::RenamedNewName, dest_name),
                ],
            );
        }
    } else {
        fs.watchers()
            .notify(&source_parent, &[(ChangeAction::Removed, source_leaf)]);
        fs.watchers()
            .notify(dest_parent, &[(ChangeAction::Added, dest_name)]);
    }
}

impl FileSystem {
    /// Moves one entry to a destination path.
    pub fn move_item(
        &self,
        source_path: &str,
        destination_path: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        if source_path.is_empty() || destination_path.is_empty() {
            return Err(Error::InvalidArgument);
        }

        let mut context = OperationContext::new(OperationKind::Move, callback, options, 1);

        let source = VfsPath::normalize(source_path);
        let destination = VfsPath::normalize(destination_path);

        context.check_cancel()?;

        let item_status: crate::Result<u64> = {
            let mut state = self.lock_state();
            let result = locked_move(&mut state, &source, &destination, flags);
            context.latency_ms = state.config.latency_ms;
            context.throughput_seed = combine_seed_str(state.effective_seed, source.as_str());
            result
        };
        context.virtual_limit = self.virtual_speed_limit();
        context.throughput_seed =
            combine_seed_str(context.throughput_seed, destination.as_str());

        if item_status.is_ok() {
            if let (Some(parent), Some(leaf)) = (destination.parent(), destination.file_name()) {
                notify_relocation(self, &source, parent.as_str(), leaf);
            }
        }

        let item_bytes = item_status.as_ref().ok().copied().unwrap_or(0);
        context.total_bytes = item_bytes;

        if item_status.is_ok() {
            throttled_byte_progress(
                &mut context,
                Some(source.as_str()),
                Some(destination.as_str()),
                item_bytes,
                0,
            )?;
        } else {
            context.report_progress(
                Some(source.as_str()),
                Some(destination.as_str()),
                item_bytes,
                0,
            )?;
        }

        context.report_item_completed(
            0,
            Some(source.as_str()),
            Some(destination.as_str()),
            item_status.clone().map(|_| ()),
        )?;

        item_status?;
        context.completed_items = 1;
        Ok(())
    }

    /// Renames one entry.
    ///
    /// Semantically a move; the fast path for a same-parent rename only
    /// rewrites the name and timestamps. Progress is a single tick, not a
    /// byte-throttled transfer.
    pub fn rename_item(
        &self,
        source_path: &str,
        destination_path: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        if source_path.is_empty() || destination_path.is_empty() {
            return Err(Error::InvalidArgument);
        }

        let context = OperationContext::new(OperationKind::Rename, callback, options, 1);

        let source = VfsPath::normalize(source_path);
        let destination = VfsPath::normalize(destination_path);

        context.check_cancel()?;

        let item_status: crate::Result<u64> = {
            let mut state = self.lock_state();
            locked_move(&mut state, &source, &destination, flags)
        };

        if item_status.is_ok() {
            if let (Some(parent), Some(leaf)) = (destination.parent(), destination.file_name()) {
                notify_relocation(self, &source, parent.as_str(), leaf);
            }
        }

        let item_bytes = item_status.as_ref().ok().copied().unwrap_or(0);

        context.report_progress(
            Some(source.as_str()),
            Some(destination.as_str()),
            item_bytes,
            item_bytes,
        )?;

        context.report_item_completed(
            0,
            Some(source.as_str()),
            Some(destination.as_str()),
            item_status.clone().map(|_| ()),
        )?;

        item_status?;
        Ok(())
    }

    /// Moves a batch of entries into a destination folder.
    ///
    /// A directory move clones the directory frame at the destination,
    /// queues one work item per child, and queues a deferred cleanup step
    /// that removes the then-empty source directory.
    pub fn move_items(
        &self,
        source_paths: &[&str],
        destination_folder: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        if source_paths.is_empty() {
            return Ok(());
        }
        if destination_folder.is_empty() {
            return Err(Error::InvalidArgument);
        }

        #[allow(clippy::cast_possible_truncation)]
        let mut context = OperationContext::new(
            OperationKind::Move,
            callback,
            options,
            source_paths.len() as u32,
        );

        let destination = VfsPath::normalize(destination_folder);

        let effective_seed = {
            let mut state = self.lock_state();
            let params = state.params();
            state.forest.resolve(&params, &destination, false, true)?;
            context.latency_ms = state.config.latency_ms;
            state.effective_seed
        };
        context.virtual_limit = self.virtual_speed_limit();

        enum WorkItem {
            Transfer {
                source_path: String,
                dest_parent_path: String,
                dest_name: String,
            },
            Cleanup {
                source_path: String,
            },
        }

        let mut stack: Vec<WorkItem> = Vec::with_capacity(source_paths.len());

        for source_path in source_paths {
            if source_path.is_empty() {
                return Err(Error::InvalidArgument);
            }

            let leaf = path_leaf(source_path);
            if leaf.is_empty() {
                return Err(Error::InvalidName);
            }

            stack.push(WorkItem::Transfer {
                source_path: VfsPath::normalize(source_path).as_str().to_owned(),
                dest_parent_path: destination.as_str().to_owned(),
                dest_name: leaf.to_owned(),
            });
        }

        let mut had_failure = false;

        while let Some(work) = stack.pop() {
            context.check_cancel()?;

            let (source_path, dest_parent_path, dest_name) = match work {
                WorkItem::Cleanup { source_path } => {
                    // Deferred removal of a source directory whose children
                    // have all been moved away.
                    let mut state = self.lock_state();
                    let params = state.params();

                    if let Ok(id) = state.forest.resolve(
                        &params,
                        &VfsPath::normalize(&source_path),
                        false,
                        false,
                    ) {
                        let node = state.forest.node(id);
                        if node.is_directory
                            && node.children_generated
                            && node.children.is_empty()
                        {
                            if let Some(parent) = node.parent {
                                state.forest.extract_child(parent, id, crate::time::now_ticks());
                                state.forest.free_subtree(id);
                            }
                        }
                    }
                    continue;
                }
                WorkItem::Transfer {
                    source_path,
                    dest_parent_path,
                    dest_name,
                } => (source_path, dest_parent_path, dest_name),
            };

            let destination_path = append_path(&dest_parent_path, &dest_name);
            let source_vfs = VfsPath::normalize(&source_path);

            let item_status: crate::Result<u64> = {
                let mut state = self.lock_state();
                let params = state.params();

                (|state: &mut EngineState| -> crate::Result<u64> {
                    let source_id =
                        state.forest.resolve(&params, &source_vfs, false, false)?;
                    let parent_id = state.forest.resolve(
                        &params,
                        &VfsPath::normalize(&dest_parent_path),
                        false,
                        true,
                    )?;

                    if state.forest.is_ancestor(source_id, parent_id) {
                        return Err(Error::InvalidName);
                    }

                    if state.forest.node(source_id).is_directory {
                        if !flags.contains(OpFlags::RECURSIVE) {
                            return Err(Error::DirectoryNotEmpty);
                        }

                        state.forest.ensure_children(&params, source_id);
                        mutate::create_directory_clone(
                            state, source_id, parent_id, &dest_name, flags,
                        )?;

                        let children: Vec<NodeId> =
                            state.forest.node(source_id).children.clone();

                        #[allow(clippy::cast_possible_truncation)]
                        context.add_total_items(children.len() as u32);

                        stack.push(WorkItem::Cleanup {
                            source_path: source_path.clone(),
                        });

                        for &child in children.iter().rev() {
                            let child_name = state.forest.node(child).name.clone();
                            stack.push(WorkItem::Transfer {
                                source_path: append_path(&source_path, &child_name),
                                dest_parent_path: destination_path.clone(),
                                dest_name: child_name,
                            });
                        }

                        Ok(0)
                    } else {
                        mutate::move_node(state, source_id, parent_id, &dest_name, flags)
                    }
                })(&mut state)
            };

            if item_status.is_ok() {
                notify_relocation(self, &source_vfs, &dest_parent_path, &dest_name);
            }

            let base_completed_bytes = context.completed_bytes;
            context.throughput_seed = combine_seed_str(effective_seed, &source_path);
            context.throughput_seed =
                combine_seed_str(context.throughput_seed, &destination_path);

            context.arena.reset();
            let source_slot = context.arena.alloc(source_path);
            let destination_slot = context.arena.alloc(destination_path);

            let item_bytes = item_status.as_ref().ok().copied().unwrap_or(0);
            context.total_bytes = context.total_bytes.saturating_add(item_bytes);

            if item_status.is_ok() {
                let (source_text, destination_text) = (
                    context.arena.get(source_slot).to_owned(),
                    context.arena.get(destination_slot).to_owned(),
                );
                throttled_byte_progress(
                    &mut context,
                    Some(&source_text),
                    Some(&destination_text),
                    item_bytes,
                    base_completed_bytes,
                )?;
            } else {
                context.completed_bytes = base_completed_bytes;
                context.report_progress(
                    Some(context.arena.get(source_slot)),
                    Some(context.arena.get(destination_slot)),
                    item_bytes,
                    0,
                )?;
            }

            let item_index = context.completed_items;
            context.report_item_completed(
                item_index,
                Some(context.arena.get(source_slot)),
                Some(context.arena.get(destination_slot)),
                item_status.clone().map(|_| ()),
            )?;

            context.completed_items = context.completed_items.saturating_add(1);

            if let Err(error) = item_status {
                if error == Error::Cancelled {
                    return Err(error);
                }

                had_failure = true;
                if !flags.contains(OpFlags::CONTINUE_ON_ERROR) {
                    return Err(error);
                }
            }
        }

        if had_failure {
            return Err(Error::PartialCopy);
        }

        Ok(())
    }

    /// Renames a batch of entries in place.
    ///
    /// Each pair is `(source path, new name)`; the entry keeps its parent.
    pub fn rename_items(
        &self,
        items: &[(&str, &str)],
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        #[allow(clippy::cast_possible_truncation)]
        let mut context =
            OperationContext::new(OperationKind::Rename, callback, options, items.len() as u32);

        let mut had_failure = false;

        for &(source_path, new_name) in items {
            if source_path.is_empty() || new_name.is_empty() {
                return Err(Error::InvalidArgument);
            }

            context.check_cancel()?;

            let source = VfsPath::normalize(source_path);
            let source_leaf = source.file_name().unwrap_or_default().to_owned();
            let source_parent = source
                .parent()
                .map(|p| p.as_str().to_owned())
                .unwrap_or_default();
            let destination_path = append_path(&source_parent, new_name);

            let item_status: crate::Result<u64> = {
                let mut state = self.lock_state();
                let params = state.params();

                (|state: &mut EngineState| -> crate::Result<u64> {
                    let source_id = state.forest.resolve(&params, &source, false, false)?;
                    let parent = state
                        .forest
                        .node(source_id)
                        .parent
                        .ok_or(Error::AccessDenied)?;
                    mutate::move_node(state, source_id, parent, new_name, flags)
                })(&mut state)
            };

            if item_status.is_ok() {
                if source_leaf == new_name {
                    self.watchers()
                        .notify(&source_parent, &[(ChangeAction::Modified, new_name)]);
                } else {
                    self.watchers().notify(
                        &source_parent,
                        &[
                            (ChangeAction::RenamedOldName, source_leaf.as_str()),
                            (ChangeAction::RenamedNewName, new_name),
                        ],
                    );
                }
            }

            let item_bytes = item_status.as_ref().ok().copied().unwrap_or(0);

            context.report_progress(
                Some(source.as_str()),
                Some(&destination_path),
                item_bytes,
                item_bytes,
            )?;

            let item_index = context.completed_items;
            context.report_item_completed(
                item_index,
                Some(source.as_str()),
                Some(&destination_path),
                item_status.clone().map(|_| ()),
            )?;

            context.completed_items = context.completed_items.saturating_add(1);

            if let Err(error) = item_status {
                if error == Error::Cancelled {
                    return Err(error);
                }

                had_failure = true;
                if !flags.contains(OpFlags::CONTINUE_ON_ERROR) {
                    return Err(error);
                }
            }
        }

        if had_failure {
            return Err(Error::PartialCopy);
        }

        Ok(())
    }
}
