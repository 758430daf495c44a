// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{filesystem::FileSystem, ops::OpFlags, path::VfsPath};
use std::sync::Arc;

/// Stages bytes for one file and installs them atomically on commit.
///
/// Writes accumulate in memory. `commit` replaces the target node under the
/// tree lock and publishes an `Added` watch event; dropping a writer without
/// committing silently discards the staged bytes.
pub struct Writer {
    fs: FileSystem,
    path: VfsPath,
    flags: OpFlags,
    buffer: Vec<u8>,
    committed: bool,
}

impl Writer {
    pub(crate) fn new(fs: FileSystem, path: VfsPath, flags: OpFlags) -> Self {
        Self {
            fs,
            path,
            flags,
            buffer: Vec::new(),
            committed: false,
        }
    }

    /// The normalized target path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Bytes staged so far.
    #[must_use]
    pub fn staged_len(&self) -> u64 {
        self.buffer.len() as u64
    }

    /// Appends bytes to the staging buffer.
    pub fn write(&mut self, bytes: &[u8]) -> crate::Result<()> {
        if self.committed {
            return Err(crate::Error::AccessDenied);
        }

        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Installs the staged bytes as the target file.
    ///
    /// Re-validates the collision rules against the current tree, replaces
    /// any existing entry, and shares the buffer with the new node. A second
    /// commit is a no-op and succeeds.
    pub fn commit(&mut self) -> crate::Result<()> {
        if self.committed {
            return Ok(());
        }

        let buffer = Arc::new(std::mem::take(&mut self.buffer));
        self.fs.commit_writer(&self.path, self.flags, buffer)?;

        self.committed = true;
        Ok(())
    }
}
