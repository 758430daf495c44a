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
    path::VfsPath,
    rng::combine_seed_str,
    watch::ChangeAction,
    Error,
};

/// Deletions transfer no real bytes; progress is throttled over a virtual
/// per-item amount so deletes feel like work under a speed limit.
const VIRTUAL_DELETE_BYTES_PER_ITEM: u64 = 64 * 1024;

fn locked_delete(state: &mut EngineState, path: &VfsPath, flags: OpFlags) -> crate::Result<()> {
    let params = state.params();
    let target = state.forest.resolve(&params, path, false, false)?;
    mutate::delete_node(state, target, flags)
}

impl FileSystem {
    /// Deletes one entry.
    ///
    /// Non-empty directories require [`OpFlags::RECURSIVE`]; READONLY
    /// entries require [`OpFlags::ALLOW_REPLACE_READONLY`].
    pub fn delete_item(
        &self,
        path: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        if path.is_empty() {
            return Err(Error::InvalidArgument);
        }

        let mut context = OperationContext::new(OperationKind::Delete, callback, options, 1);

        let normalized = VfsPath::normalize(path);
        let parent_text = normalized
            .parent()
            .map(|p| p.as_str().to_owned())
            .unwrap_or_default();
        let leaf = normalized.file_name().unwrap_or_default().to_owned();

        context.check_cancel()?;

        let item_status: crate::Result<()> = {
            let mut state = self.lock_state();
            let result = locked_delete(&mut state, &normalized, flags);
            context.latency_ms = state.config.latency_ms;
            context.throughput_seed =
                combine_seed_str(state.effective_seed, normalized.as_str());
            result
        };
        context.virtual_limit = self.virtual_speed_limit();

        if item_status.is_ok() {
            self.watchers()
                .notify(&parent_text, &[(ChangeAction::Removed, leaf.as_str())]);
        }

        context.total_bytes = VIRTUAL_DELETE_BYTES_PER_ITEM;

        if item_status.is_ok() {
            throttled_byte_progress(
                &mut context,
                Some(normalized.as_str()),
                None,
                VIRTUAL_DELETE_BYTES_PER_ITEM,
                0,
            )?;
        } else {
            context.report_progress(
                Some(normalized.as_str()),
                None,
                VIRTUAL_DELETE_BYTES_PER_ITEM,
                0,
            )?;
        }

        context.report_item_completed(0, Some(normalized.as_str()), None, item_status.clone())?;

        item_status?;
        context.completed_items = 1;
        Ok(())
    }

    /// Deletes a batch of entries.
    pub fn delete_items(
        &self,
        paths: &[&str],
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        #[allow(clippy::cast_possible_truncation)]
        let mut context =
            OperationContext::new(OperationKind::Delete, callback, options, paths.len() as u32);

        let effective_seed = {
            let state = self.lock_state();
            context.latency_ms = state.config.latency_ms;
            state.effective_seed
        };
        context.virtual_limit = self.virtual_speed_limit();
        context.total_bytes =
            VIRTUAL_DELETE_BYTES_PER_ITEM.saturating_mul(paths.len() as u64);

        let mut had_failure = false;

        for (index, path) in paths.iter().enumerate() {
            if path.is_empty() {
                return Err(Error::InvalidArgument);
            }

            context.check_cancel()?;

            let normalized = VfsPath::normalize(path);
            let parent_text = normalized
                .parent()
                .map(|p| p.as_str().to_owned())
                .unwrap_or_default();
            let leaf = normalized.file_name().unwrap_or_default().to_owned();

            let item_status: crate::Result<()> = {
                let mut state = self.lock_state();
                locked_delete(&mut state, &normalized, flags)
            };

            if item_status.is_ok() {
                self.watchers()
                    .notify(&parent_text, &[(ChangeAction::Removed, leaf.as_str())]);
            }

            let base_completed_bytes = context.completed_bytes;
            context.throughput_seed = combine_seed_str(effective_seed, normalized.as_str());

            if item_status.is_ok() {
                throttled_byte_progress(
                    &mut context,
                    Some(normalized.as_str()),
                    None,
                    VIRTUAL_DELETE_BYTES_PER_ITEM,
                    base_completed_bytes,
                )?;
            } else {
                context.completed_bytes = base_completed_bytes;
                context.report_progress(
                    Some(normalized.as_str()),
                    None,
                    VIRTUAL_DELETE_BYTES_PER_ITEM,
                    0,
                )?;
            }

            #[allow(clippy::cast_possible_truncation)]
            context.report_item_completed(
                index as u32,
                Some(normalized.as_str()),
                None,
                item_status.clone(),
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
