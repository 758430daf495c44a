// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{
    context::OperationContext,
    mutate,
    throttle::throttled_byte_progress,
    OpFlags, OperationCallback, OperationKind, OperationOptions,
};
use crate::{
    filesystem::{EngineState, FileSystem},
    path::{append_path, path_leaf, VfsPath},
    rng::combine_seed_str,
    tree::NodeId,
    watch::ChangeAction,
    Error,
};

fn locked_copy(
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

    mutate::copy_node(state, source_id, parent_id, &name, flags)
}

impl FileSystem {
    /// Copies one entry to a destination path.
    ///
    /// Treated as a batch of one: cancellation is polled up front, progress
    /// is throttled over the copied bytes, and the item completion carries
    /// the exact item outcome.
    pub fn copy_item(
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

        let mut context = OperationContext::new(OperationKind::Copy, callback, options, 1);

        let source = VfsPath::normalize(source_path);
        let destination = VfsPath::normalize(destination_path);

        context.check_cancel()?;

        let item_status: crate::Result<u64> = {
            let mut state = self.lock_state();
            let result = locked_copy(&mut state, &source, &destination, flags);
            context.latency_ms = state.config.latency_ms;
            context.throughput_seed = combine_seed_str(state.effective_seed, source.as_str());
            result
        };
        context.virtual_limit = self.virtual_speed_limit();
        context.throughput_seed =
            combine_seed_str(context.throughput_seed, destination.as_str());

        if item_status.is_ok() {
            if let (Some(parent), Some(leaf)) = (destination.parent(), destination.file_name()) {
                self.watchers()
                    .notify(parent.as_str(), &[(ChangeAction::Added, leaf)]);
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

    /// Copies a batch of entries into a destination folder.
    ///
    /// Directories expand into per-child work items on an explicit stack;
    /// the total item count grows as children become known. Item failures
    /// are reported individually; the batch returns
    /// [`PartialCopy`](Error::PartialCopy) when any item failed but the walk
    /// completed.
    pub fn copy_items(
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
            OperationKind::Copy,
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

        struct WorkItem {
            source_path: String,
            dest_parent_path: String,
            dest_name: String,
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

            stack.push(WorkItem {
                source_path: VfsPath::normalize(source_path).as_str().to_owned(),
                dest_parent_path: destination.as_str().to_owned(),
                dest_name: leaf.to_owned(),
            });
        }

        let mut had_failure = false;

        while let Some(work) = stack.pop() {
            context.check_cancel()?;

            let destination_path = append_path(&work.dest_parent_path, &work.dest_name);

            let item_status: crate::Result<u64> = {
                let mut state = self.lock_state();
                let params = state.params();

                let walk = (|state: &mut EngineState| -> crate::Result<u64> {
                    let source_id = state.forest.resolve(
                        &params,
                        &VfsPath::normalize(&work.source_path),
                        false,
                        false,
                    )?;
                    let parent_id = state.forest.resolve(
                        &params,
                        &VfsPath::normalize(&work.dest_parent_path),
                        false,
                        true,
                    )?;

                    if state.forest.node(source_id).is_directory {
                        if !flags.contains(OpFlags::RECURSIVE) {
                            return Err(Error::DirectoryNotEmpty);
                        }

                        state.forest.ensure_children(&params, source_id);
                        mutate::create_directory_clone(
                            state,
                            source_id,
                            parent_id,
                            &work.dest_name,
                            flags,
                        )?;

                        let children: Vec<NodeId> = state.forest.node(source_id).children.clone();

                        #[allow(clippy::cast_possible_truncation)]
                        context.add_total_items(children.len() as u32);

                        for &child in children.iter().rev() {
                            let child_name = state.forest.node(child).name.clone();
                            stack.push(WorkItem {
                                source_path: append_path(&work.source_path, &child_name),
                                dest_parent_path: destination_path.clone(),
                                dest_name: child_name,
                            });
                        }

                        Ok(0)
                    } else {
                        mutate::copy_node(state, source_id, parent_id, &work.dest_name, flags)
                    }
                })(&mut state);

                walk
            };

            if item_status.is_ok() {
                self.watchers().notify(
                    &work.dest_parent_path,
                    &[(ChangeAction::Added, work.dest_name.as_str())],
                );
            }

            let base_completed_bytes = context.completed_bytes;
            context.throughput_seed = combine_seed_str(effective_seed, &work.source_path);
            context.throughput_seed =
                combine_seed_str(context.throughput_seed, &destination_path);

            context.arena.reset();
            let source_slot = context.arena.alloc(work.source_path);
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
}
