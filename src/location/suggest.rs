// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Autocomplete worker for the location edit box.
//!
//! One worker thread per view waits on a condition variable for the latest
//! query; older queries are dropped unseen. Results are posted through a
//! channel, tagged with a monotonically increasing request id so the view
//! can reject answers that arrive late.

use super::info_cache::{BorrowMode, InfoCache};
use crate::{
    filesystem::FileSystem,
    path::{cmp_ignore_case, contains_ignore_case},
};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    mpsc, Arc, Condvar, Mutex,
};
use std::thread::JoinHandle;

/// Result rows shown at most (10 visible plus the "more" marker).
pub const MAX_SUGGEST_ITEMS: usize = 11;

/// One autocomplete request.
#[derive(Clone, Debug)]
pub struct SuggestQuery {
    /// Plugin folder to enumerate.
    pub folder: String,

    /// Typed prefix to match against directory names.
    pub prefix: String,

    /// Folder text as displayed in the edit box.
    pub display_folder: String,

    /// Separator to use when composing insert texts.
    pub directory_separator: char,
}

/// One autocomplete answer.
#[derive(Clone, Debug)]
pub struct SuggestResults {
    /// Id of the query this answers; stale ids must be discarded.
    pub request_id: u64,

    /// `true` when more matches existed than rows shown.
    pub has_more: bool,

    /// Echoed from the query.
    pub directory_separator: char,

    /// The matched prefix, for highlight rendering.
    pub highlight: String,

    /// Names to display, sorted case-insensitively.
    pub display_items: Vec<String>,

    /// Full texts to insert into the edit box.
    pub insert_items: Vec<String>,
}

/// Sorts matches and trims them to the display budget.
///
/// Returns `true` when names were dropped; the caller renders a trailing
/// marker row in that case.
pub fn sort_and_trim_names(names: &mut Vec<String>) -> bool {
    names.sort_by(|a, b| cmp_ignore_case(a, b));

    let has_more = names.len() > MAX_SUGGEST_ITEMS;
    let keep = if has_more {
        MAX_SUGGEST_ITEMS - 1
    } else {
        MAX_SUGGEST_ITEMS
    };

    if names.len() > keep {
        names.truncate(keep);
    }

    has_more
}

fn build_insert_items(
    display_folder: &str,
    names: &[String],
    separator: char,
) -> Vec<String> {
    let mut base = display_folder.to_owned();
    if !base.is_empty() && !base.ends_with(['\\', '/']) {
        base.push(separator);
    }

    names
        .iter()
        .map(|name| {
            let mut insert = base.clone();
            insert.push_str(name);
            insert
        })
        .collect()
}

struct Shared {
    pending: Mutex<Option<(u64, SuggestQuery)>>,
    wake: Condvar,
    stop: AtomicBool,
    latest: AtomicU64,
}

/// The per-view autocomplete worker.
///
/// Dropping the worker stops and joins its thread.
pub struct SuggestWorker {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl SuggestWorker {
    /// Spawns the worker; results arrive on the returned channel.
    #[must_use]
    pub fn spawn(
        fs: FileSystem,
        cache: Arc<InfoCache>,
    ) -> (Self, mpsc::Receiver<SuggestResults>) {
        let (sender, receiver) = mpsc::channel();

        let shared = Arc::new(Shared {
            pending: Mutex::new(None),
            wake: Condvar::new(),
            stop: AtomicBool::new(false),
            latest: AtomicU64::new(0),
        });

        let worker_shared = shared.clone();
        let handle = std::thread::spawn(move || {
            worker_loop(&worker_shared, &fs, &cache, &sender);
        });

        (
            Self {
                shared,
                handle: Some(handle),
            },
            receiver,
        )
    }

    /// Queues a query, superseding any not-yet-serviced one.
    ///
    /// Returns the request id its answer will carry.
    pub fn query(&self, query: SuggestQuery) -> u64 {
        let request_id = self.shared.latest.fetch_add(1, Ordering::AcqRel) + 1;

        {
            #[allow(clippy::expect_used)]
            let mut pending = self.shared.pending.lock().expect("lock is poisoned");
            *pending = Some((request_id, query));
        }

        self.shared.wake.notify_one();
        request_id
    }
}

impl Drop for SuggestWorker {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.wake.notify_all();

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop(
    shared: &Shared,
    fs: &FileSystem,
    cache: &InfoCache,
    sender: &mpsc::Sender<SuggestResults>,
) {
    loop {
        let (request_id, query) = {
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

        let mut names: Vec<String> = Vec::new();

        let borrowed =
            cache.borrow_directory_info(fs, &query.folder, BorrowMode::AllowEnumerate);
        if let Some(info) = borrowed.info() {
            for entry in info.entries() {
                if entry.is_directory() && contains_ignore_case(&entry.name, &query.prefix) {
                    names.push(entry.name);
                }
            }
        }

        let has_more = sort_and_trim_names(&mut names);
        let insert_items =
            build_insert_items(&query.display_folder, &names, query.directory_separator);

        if shared.stop.load(Ordering::Acquire) {
            return;
        }

        let results = SuggestResults {
            request_id,
            has_more,
            directory_separator: query.directory_separator,
            highlight: query.prefix,
            display_items: names,
            insert_items,
        };

        // The receiving view may be gone; that is not our problem.
        let _ = sender.send(results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn sort_and_trim_budget() {
        let mut names: Vec<String> = (0..20).map(|i| format!("dir{i:02}")).collect();
        assert!(sort_and_trim_names(&mut names));
        assert_eq!(MAX_SUGGEST_ITEMS - 1, names.len());

        let mut few: Vec<String> = vec!["b".into(), "A".into(), "c".into()];
        assert!(!sort_and_trim_names(&mut few));
        assert_eq!(vec!["A".to_owned(), "b".into(), "c".into()], few);
    }

    #[test]
    fn insert_items_compose_with_separator() {
        let names = vec!["docs".to_owned(), "music".to_owned()];

        let inserts = build_insert_items("fk:/home", &names, '/');
        assert_eq!(
            vec!["fk:/home/docs".to_owned(), "fk:/home/music".to_owned()],
            inserts
        );

        // A folder already ending in a separator is kept as-is.
        let inserts = build_insert_items(r"C:\", &names, '\\');
        assert_eq!(r"C:\docs", inserts[0]);
    }
}
