// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{
    arena::PathArena, ItemCompletion, OperationCallback, OperationKind, OperationOptions,
    ProgressReport,
};
use crate::Error;
use std::time::Duration;

const SLEEP_QUANTUM_MS: u64 = 50;

/// Per-invocation state of one mutating operation.
///
/// Lives on the calling thread for the duration of the call; never shared.
pub(crate) struct OperationContext<'a> {
    pub kind: OperationKind,
    pub callback: Option<&'a dyn OperationCallback>,
    pub options: Option<&'a OperationOptions>,

    pub total_items: u32,
    pub completed_items: u32,
    pub total_bytes: u64,
    pub completed_bytes: u64,

    pub latency_ms: u32,
    pub virtual_limit: u64,
    pub throughput_seed: u64,

    pub arena: PathArena,
}

impl<'a> OperationContext<'a> {
    pub fn new(
        kind: OperationKind,
        callback: Option<&'a dyn OperationCallback>,
        options: Option<&'a OperationOptions>,
        total_items: u32,
    ) -> Self {
        Self {
            kind,
            callback,
            options,
            total_items,
            completed_items: 0,
            total_bytes: 0,
            completed_bytes: 0,
            latency_ms: 0,
            virtual_limit: 0,
            throughput_seed: 0,
            arena: PathArena::new(),
        }
    }

    /// Grows the known item total, saturating.
    pub fn add_total_items(&mut self, delta: u32) {
        self.total_items = self.total_items.saturating_add(delta);
    }

    /// min(host limit, virtual limit); 0 means unlimited on either side.
    pub fn effective_bandwidth_limit(&self) -> u64 {
        let host = self
            .options
            .map_or(0, |options| options.bandwidth_limit_bytes_per_second);

        match (host, self.virtual_limit) {
            (0, virt) => virt,
            (host, 0) => host,
            (host, virt) => host.min(virt),
        }
    }

    /// Polls the host's cancel flag.
    pub fn check_cancel(&self) -> crate::Result<()> {
        match self.callback {
            Some(callback) if callback.should_cancel() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    /// Reports a progress tick, then polls for cancellation.
    pub fn report_progress(
        &self,
        source: Option<&str>,
        destination: Option<&str>,
        item_total_bytes: u64,
        item_completed_bytes: u64,
    ) -> crate::Result<()> {
        let Some(callback) = self.callback else {
            return Ok(());
        };

        let report = ProgressReport {
            kind: self.kind,
            total_items: self.total_items,
            completed_items: self.completed_items,
            total_bytes: self.total_bytes,
            completed_bytes: self.completed_bytes,
            source,
            destination,
            current_item_total_bytes: item_total_bytes,
            current_item_completed_bytes: item_completed_bytes,
            effective_bandwidth_limit: self.effective_bandwidth_limit(),
            stream_id: self.options.map_or(0, |options| options.stream_id),
        };

        // Progress failures count as cancellation requests.
        callback.progress(&report).map_err(|_| Error::Cancelled)?;
        self.check_cancel()
    }

    /// Reports an item completion, then polls for cancellation.
    pub fn report_item_completed(
        &self,
        item_index: u32,
        source: Option<&str>,
        destination: Option<&str>,
        status: crate::Result<()>,
    ) -> crate::Result<()> {
        let Some(callback) = self.callback else {
            return Ok(());
        };

        let completion = ItemCompletion {
            kind: self.kind,
            item_index,
            source,
            destination,
            status,
        };

        callback
            .item_completed(&completion)
            .map_err(|_| Error::Cancelled)?;
        self.check_cancel()
    }

    /// Sleeps `milliseconds`, polling for cancellation every 50 ms.
    pub fn sleep_with_cancel(&self, milliseconds: u64) -> crate::Result<()> {
        let mut remaining = milliseconds;

        while remaining > 0 {
            let slice = remaining.min(SLEEP_QUANTUM_MS);
            std::thread::sleep(Duration::from_millis(slice));
            remaining -= slice;

            self.check_cancel()?;
        }

        Ok(())
    }

    /// Sleeps the configured latency for `access_count` accesses.
    pub fn simulate_latency(&self, access_count: u64) -> crate::Result<()> {
        if self.latency_ms == 0 || access_count == 0 {
            return Ok(());
        }

        let total = u64::from(self.latency_ms).saturating_mul(access_count);
        self.sleep_with_cancel(total)
    }
}
