// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The mutation engine: copy, move, rename and delete, singular and bulk,
//! with progress reporting, throttling and cooperative cancellation.

pub(crate) mod arena;
pub(crate) mod context;
mod copy;
mod delete;
pub(crate) mod dirsize;
pub(crate) mod mutate;
mod relocate;
pub(crate) mod throttle;

pub use dirsize::{DirectorySizeCallback, DirectorySizeProgress, DirectorySizeResult};

use std::ops::BitOr;

/// Behavior flags for mutating operations.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct OpFlags(u32);

impl OpFlags {
    /// No flags.
    pub const NONE: Self = Self(0);

    /// Keep walking a bulk batch after an item fails.
    pub const CONTINUE_ON_ERROR: Self = Self(0x1);

    /// Allow replacing an existing destination entry.
    pub const ALLOW_OVERWRITE: Self = Self(0x2);

    /// Allow replacing or deleting READONLY entries.
    pub const ALLOW_REPLACE_READONLY: Self = Self(0x4);

    /// Recurse into directories.
    pub const RECURSIVE: Self = Self(0x8);

    /// Route deletions through the recycle bin (advisory).
    pub const USE_RECYCLE_BIN: Self = Self(0x10);

    /// Returns `true` if every bit of `other` is set.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl BitOr for OpFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Which mutation an operation performs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OperationKind {
    /// Duplicate an entry.
    Copy,

    /// Relocate an entry.
    Move,

    /// Remove an entry.
    Delete,

    /// Rename an entry in place.
    Rename,
}

/// Host-supplied operation options.
#[derive(Copy, Clone, Debug, Default)]
pub struct OperationOptions {
    /// Host-side throughput cap in bytes/sec; 0 means unlimited.
    pub bandwidth_limit_bytes_per_second: u64,

    /// Opaque stream id echoed in progress reports.
    pub stream_id: u64,
}

/// One progress tick.
#[derive(Clone, Debug)]
pub struct ProgressReport<'a> {
    /// The running operation.
    pub kind: OperationKind,

    /// Items known so far (grows as directories expand).
    pub total_items: u32,

    /// Items finished so far.
    pub completed_items: u32,

    /// Bytes known so far.
    pub total_bytes: u64,

    /// Bytes finished so far.
    pub completed_bytes: u64,

    /// Source path of the item in flight.
    pub source: Option<&'a str>,

    /// Destination path of the item in flight.
    pub destination: Option<&'a str>,

    /// Bytes of the item in flight.
    pub current_item_total_bytes: u64,

    /// Finished bytes of the item in flight.
    pub current_item_completed_bytes: u64,

    /// min(host limit, virtual limit), 0 = unlimited.
    pub effective_bandwidth_limit: u64,

    /// Echoed from [`OperationOptions`].
    pub stream_id: u64,
}

/// Completion record for one item of a batch.
#[derive(Clone, Debug)]
pub struct ItemCompletion<'a> {
    /// The running operation.
    pub kind: OperationKind,

    /// Zero-based item index.
    pub item_index: u32,

    /// Source path.
    pub source: Option<&'a str>,

    /// Destination path.
    pub destination: Option<&'a str>,

    /// Exact outcome of this item.
    pub status: crate::Result<()>,
}

/// Host callback driving cancellation and observing progress.
///
/// Any error returned from a callback is normalized to
/// [`Cancelled`](crate::Error::Cancelled) and aborts the operation.
pub trait OperationCallback {
    /// Polled at operation start, after each sleep quantum and on every
    /// progress tick.
    fn should_cancel(&self) -> bool {
        false
    }

    /// Observes a progress tick.
    fn progress(&self, report: &ProgressReport<'_>) -> crate::Result<()> {
        let _ = report;
        Ok(())
    }

    /// Observes the completion of one item.
    fn item_completed(&self, completion: &ItemCompletion<'_>) -> crate::Result<()> {
        let _ = completion;
        Ok(())
    }
}
