// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Sibling-folder prefetch worker.
//!
//! When the location changes, the parents of every breadcrumb segment are
//! queued (most recent first) and quietly enumerated to warm the info
//! cache, so opening a breadcrumb menu is instant. Only the latest queue is
//! serviced; a newer location abandons the rest of an older list.

use super::breadcrumb::split_path_components;
use super::info_cache::{BorrowMode, InfoCache};
use crate::{filesystem::FileSystem, path::eq_ignore_case};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Condvar, Mutex,
};
use std::thread::JoinHandle;

/// At most this many parent folders are queued per location change.
pub const MAX_PREFETCH_FOLDERS: usize = 16;

struct PrefetchQuery {
    request_id: u64,
    folders: Vec<String>,
}

struct Shared {
    pending: Mutex<Option<PrefetchQuery>>,
    wake: Condvar,
    stop: AtomicBool,
    latest: AtomicU64,
}

/// The per-view sibling prefetch worker.
///
/// Dropping the worker stops and joins its thread.
pub struct SiblingPrefetchWorker {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl SiblingPrefetchWorker {
    /// Spawns the worker.
    #[must_use]
    pub fn spawn(fs: FileSystem, cache: Arc<InfoCache>) -> Self {
        let shared = Arc::new(Shared {
            pending: Mutex::new(None),
            wake: Condvar::new(),
            stop: AtomicBool::new(false),
            latest: AtomicU64::new(0),
        });

        let worker_shared = shared.clone();
        let handle = std::thread::spawn(move || {
            worker_loop(&worker_shared, &fs, &cache);
        });

        Self {
            shared,
            handle: Some(handle),
        }
    }

    fn queue(&self, folders: Vec<String>) {
        if folders.is_empty() {
            return;
        }

        let request_id = self.shared.latest.fetch_add(1, Ordering::AcqRel) + 1;

        {
            #[allow(clippy::expect_used)]
            let mut pending = self.shared.pending.lock().expect("lock is poisoned");
            *pending = Some(PrefetchQuery {
                request_id,
                folders,
            });
        }

        self.shared.wake.notify_one();
    }

    /// Queues the parents of every segment of a location, newest first.
    ///
    /// `/@conn:` locations are skipped entirely; prefetching a connection
    /// root would trigger spurious remote enumerations.
    pub fn queue_for_location(&self, path: &str, short_id: Option<&str>) {
        if path.starts_with("/@conn:") {
            return;
        }

        let parts = split_path_components(path, short_id);
        if parts.len() < 2 {
            return;
        }

        let mut folders: Vec<String> = Vec::with_capacity(parts.len().min(MAX_PREFETCH_FOLDERS));

        for index in (1..parts.len()).rev() {
            let parent = &parts[index - 1].full_path;
            if parent.is_empty() {
                continue;
            }

            if folders.iter().any(|known| eq_ignore_case(known, parent)) {
                continue;
            }

            folders.push(parent.clone());
            if folders.len() >= MAX_PREFETCH_FOLDERS {
                break;
            }
        }

        self.queue(folders);
    }

    /// Queues a single folder, serving the breadcrumb-menu code path.
    pub fn queue_parent(&self, folder: &str) {
        self.queue(vec![folder.to_owned()]);
    }
}

impl Drop for SiblingPrefetchWorker {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.wake.notify_all();

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop(shared: &Shared, fs: &FileSystem, cache: &InfoCache) {
    loop {
        let query = {
            #[allow(clippy::expect_used)]
            let mut pending = shared.pending.lock().expect("lock is poisoned");

            loop {
                if shared.stop.load(Ordering::Acquire) {
                    return;
                }

                if let Some(query) = pending.take() {
                    break query;
                }

                #[allow(clippy::expect_used)]
                {
                    pending = shared.wake.wait(pending).expect("lock is poisoned");
                }
            }
        };

        for folder in &query.folders {
            if shared.stop.load(Ordering::Acquire) {
                return;
            }

            // A newer location superseded this list.
            if query.request_id != shared.latest.load(Ordering::Acquire) {
                break;
            }

            let borrowed = cache.borrow_directory_info(fs, folder, BorrowMode::AllowEnumerate);
            if let Err(error) = borrowed.status() {
                log::trace!("prefetch of {folder:?} failed: {error}");
            }
        }
    }
}
