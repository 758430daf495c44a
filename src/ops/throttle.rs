// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Throughput simulation.
//!
//! Converts a target bytes/sec into chunked sleeps with stochastic jitter:
//! mostly 80–100% of the limit, a 1-in-25 minor stall at 50%, and a 1-in-200
//! micro-stall down to 10–33%. Each chunk advances a tenth of a second's
//! worth of bytes, reports progress, and polls for cancellation.

use super::{context::OperationContext, OperationKind};
use crate::rng::{combine_seed, random_chance, random_range_u64, Mt19937};

/// Walks `item_total_bytes` through the throttle, reporting progress.
///
/// With no effective limit the item completes in a single tick. The
/// context's `completed_bytes` ends at `base_completed_bytes +
/// item_total_bytes` unless the operation is cancelled mid-way.
pub(crate) fn throttled_byte_progress(
    context: &mut OperationContext<'_>,
    source: Option<&str>,
    destination: Option<&str>,
    item_total_bytes: u64,
    base_completed_bytes: u64,
) -> crate::Result<()> {
    let mut item_completed: u64 = 0;
    context.completed_bytes = base_completed_bytes;

    context.report_progress(source, destination, item_total_bytes, item_completed)?;

    if context.latency_ms > 0 {
        let access_count = match context.kind {
            OperationKind::Copy | OperationKind::Move | OperationKind::Rename => 2,
            OperationKind::Delete => 1,
        };
        context.simulate_latency(access_count)?;
    }

    if item_total_bytes == 0 {
        return Ok(());
    }

    let mut seed = context.throughput_seed;
    seed = combine_seed(seed, base_completed_bytes);
    seed = combine_seed(seed, item_total_bytes);
    let mut rng = Mt19937::from_seed(seed);

    while item_completed < item_total_bytes {
        let max_bps = context.effective_bandwidth_limit();
        if max_bps == 0 {
            item_completed = item_total_bytes;
            context.completed_bytes = base_completed_bytes + item_completed;
            return context.report_progress(source, destination, item_total_bytes, item_completed);
        }

        let mut min_bps = 1.max(max_bps - max_bps / 5); // ~80%
        let mut jitter_max_bps = max_bps;

        if max_bps >= 10 && random_chance(&mut rng, 1, 200) {
            // Micro-stall.
            min_bps = 1.max(max_bps / 10);
            jitter_max_bps = min_bps.max(max_bps / 3);
        } else if max_bps >= 10 && random_chance(&mut rng, 1, 25) {
            // Minor stall.
            min_bps = 1.max(max_bps / 2);
        }

        let current_bps = random_range_u64(&mut rng, min_bps, jitter_max_bps);
        let remaining = item_total_bytes - item_completed;
        let step = 1.max(current_bps / 10);
        let chunk = step.min(remaining);

        // ceil(chunk / bps * 1000) ms
        let sleep_ms = chunk
            .saturating_mul(1_000)
            .div_ceil(current_bps.max(1));
        context.sleep_with_cancel(sleep_ms)?;

        item_completed += chunk;
        context.completed_bytes = base_completed_bytes + item_completed;

        context.report_progress(source, destination, item_total_bytes, item_completed)?;
    }

    Ok(())
}
