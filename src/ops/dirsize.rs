// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Recursive directory-size scanning.

use crate::{filesystem::FileSystem, path::VfsPath, Error};
use std::time::{Duration, Instant};

const PROGRESS_INTERVAL_ENTRIES: u64 = 100;
const PROGRESS_INTERVAL_MS: u64 = 200;
const LATENCY_CHUNK_MS: u64 = 200;

/// One progress tick of a directory-size scan.
#[derive(Clone, Debug)]
pub struct DirectorySizeProgress<'a> {
    /// Entries visited so far.
    pub scanned_entries: u64,

    /// File bytes summed so far.
    pub total_bytes: u64,

    /// Files counted so far.
    pub file_count: u64,

    /// Directories counted so far.
    pub directory_count: u64,

    /// Directory being scanned; `None` on the final tick.
    pub current_path: Option<&'a str>,
}

/// Observer of a directory-size scan.
pub trait DirectorySizeCallback {
    /// Called every 100 entries, every 200 ms, and once after the last
    /// entry.
    fn progress(&self, progress: &DirectorySizeProgress<'_>);

    /// Polled on every progress tick.
    fn should_cancel(&self) -> bool {
        false
    }
}

/// Final (or partial, when cancelled) counters of a scan.
#[derive(Clone, Debug)]
pub struct DirectorySizeResult {
    /// Entries visited.
    pub scanned_entries: u64,

    /// File bytes summed.
    pub total_bytes: u64,

    /// Files counted.
    pub file_count: u64,

    /// Directories counted.
    pub directory_count: u64,

    /// Overall outcome; partial counters stay valid on error.
    pub status: crate::Result<()>,
}

impl Default for DirectorySizeResult {
    fn default() -> Self {
        Self {
            scanned_entries: 0,
            total_bytes: 0,
            file_count: 0,
            directory_count: 0,
            status: Ok(()),
        }
    }
}

struct ChildSnapshot {
    name: String,
    is_directory: bool,
    size_bytes: u64,
}

fn is_swallowed(error: &Error) -> bool {
    matches!(
        error,
        Error::NotFound | Error::AccessDenied | Error::NotADirectory
    )
}

impl FileSystem {
    /// Scans a subtree, summing file sizes and counting entries.
    ///
    /// The traversal is iterative over an explicit stack. Subtrees that
    /// vanish mid-scan (or turn out not to be directories) are skipped;
    /// unexpected errors are recorded in the result status and the walk
    /// continues. Cancellation ends the scan with partial counters.
    pub fn get_directory_size(
        &self,
        path: &str,
        recursive: bool,
        callback: Option<&dyn DirectorySizeCallback>,
    ) -> DirectorySizeResult {
        let mut result = DirectorySizeResult::default();

        if path.is_empty() {
            result.status = Err(Error::InvalidArgument);
            return result;
        }

        let normalized = VfsPath::normalize(path);
        let mut last_progress = Instant::now();

        macro_rules! maybe_report {
            ($result:expr, $current:expr) => {{
                let mut keep_going = true;
                if let Some(callback) = callback {
                    let entry_threshold =
                        $result.scanned_entries % PROGRESS_INTERVAL_ENTRIES == 0;
                    let time_threshold = last_progress.elapsed()
                        >= Duration::from_millis(PROGRESS_INTERVAL_MS);

                    if entry_threshold || time_threshold {
                        last_progress = Instant::now();
                        callback.progress(&DirectorySizeProgress {
                            scanned_entries: $result.scanned_entries,
                            total_bytes: $result.total_bytes,
                            file_count: $result.file_count,
                            directory_count: $result.directory_count,
                            current_path: $current,
                        });

                        if callback.should_cancel() {
                            $result.status = Err(Error::Cancelled);
                            keep_going = false;
                        }
                    }
                }
                keep_going
            }};
        }

        macro_rules! final_report {
            ($result:expr) => {
                if let Some(callback) = callback {
                    callback.progress(&DirectorySizeProgress {
                        scanned_entries: $result.scanned_entries,
                        total_bytes: $result.total_bytes,
                        file_count: $result.file_count,
                        directory_count: $result.directory_count,
                        current_path: None,
                    });
                }
            };
        }

        // Classify the root first: a file short-circuits the walk.
        let root_file_size = {
            let mut state = self.lock_state();
            let params = state.params();

            match state.forest.resolve(&params, &normalized, false, false) {
                Ok(id) => {
                    let node = state.forest.node(id);
                    if node.is_directory {
                        None
                    } else {
                        Some(node.size_bytes)
                    }
                }
                Err(error) => {
                    result.status = Err(error);
                    return result;
                }
            }
        };

        if let Some(size) = root_file_size {
            result.scanned_entries = 1;
            result.total_bytes = size;
            result.file_count = 1;

            if !maybe_report!(result, Some(normalized.as_str())) {
                return result;
            }

            final_report!(result);
            return result;
        }

        if !maybe_report!(result, Some(normalized.as_str())) {
            return result;
        }

        let latency_ms = u64::from(self.lock_state().config.latency_ms);

        let mut pending: Vec<String> = vec![normalized.as_str().to_owned()];

        while let Some(current_path) = pending.pop() {
            let (children, child_count) = {
                let mut state = self.lock_state();
                let params = state.params();

                match state
                    .forest
                    .resolve(&params, &VfsPath::normalize(&current_path), false, true)
                {
                    Ok(id) => {
                        state.forest.ensure_children(&params, id);

                        let children: Vec<ChildSnapshot> = state
                            .forest
                            .node(id)
                            .children
                            .iter()
                            .map(|&child| {
                                let node = state.forest.node(child);
                                ChildSnapshot {
                                    name: node.name.clone(),
                                    is_directory: node.is_directory,
                                    size_bytes: node.size_bytes,
                                }
                            })
                            .collect();

                        let count = children.len() as u64;
                        (children, count)
                    }
                    Err(error) => {
                        if !is_swallowed(&error) && result.status.is_ok() {
                            result.status = Err(error);
                        }
                        continue;
                    }
                }
            };

            for child in &children {
                result.scanned_entries += 1;

                // Honor the configured latency per enumerated entry, as the
                // plain read path does.
                self.simulate_latency(1);

                if child.is_directory {
                    result.directory_count += 1;

                    if recursive {
                        pending.push(crate::path::append_path(&current_path, &child.name));
                    }
                } else {
                    result.file_count += 1;
                    result.total_bytes += child.size_bytes;
                }

                if !maybe_report!(result, Some(&current_path)) {
                    return result;
                }
            }

            // Per-batch latency, slept in 200 ms chunks between cancel
            // polls.
            if latency_ms > 0 && child_count > 0 {
                let mut remaining_ms = latency_ms.saturating_mul(child_count);

                while remaining_ms > 0 {
                    if let Some(callback) = callback {
                        if callback.should_cancel() {
                            result.status = Err(Error::Cancelled);
                            return result;
                        }
                    }

                    let chunk = remaining_ms.min(LATENCY_CHUNK_MS);
                    std::thread::sleep(Duration::from_millis(chunk));
                    remaining_ms -= chunk;

                    if !maybe_report!(result, Some(&current_path)) {
                        return result;
                    }
                }
            }
        }

        final_report!(result);
        result
    }
}
