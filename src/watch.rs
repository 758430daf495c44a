// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Directory-change notification bus.
//!
//! Mutating operations publish change events after the mutation is visible
//! in the tree. Callbacks run on the mutating thread, outside every lock; a
//! registration being unregistered is drained first, and unregistering from
//! inside one's own callback is explicitly supported.

use crate::path::eq_ignore_case;
use std::cell::Cell;
use std::sync::{
    atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
    Arc, Condvar, Mutex,
};

/// Kind of change observed below a watched directory.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChangeAction {
    /// An entry appeared.
    Added,

    /// An entry disappeared.
    Removed,

    /// An entry changed in place.
    Modified,

    /// First half of a rename pair: the old name.
    RenamedOldName,

    /// Second half of a rename pair: the new name.
    RenamedNewName,
}

/// One observed change.
#[derive(Clone, Debug)]
pub struct Change {
    /// What happened.
    pub action: ChangeAction,

    /// Entry name relative to the watched directory.
    pub name: String,
}

/// A change delivery for one registration.
#[derive(Clone, Debug)]
pub struct ChangeNotification {
    /// The path the subscriber registered for.
    pub watched_path: String,

    /// The changes; renames arrive as one two-element batch.
    pub changes: Vec<Change>,
}

/// Subscriber callback; runs on the mutating thread.
pub type WatchCallback = Arc<dyn Fn(&ChangeNotification) + Send + Sync>;

struct Registration {
    id: u64,
    path: String,
    callback: WatchCallback,
    active: AtomicBool,
    in_flight: AtomicU32,
}

thread_local! {
    static ACTIVE_CALLBACK: Cell<u64> = const { Cell::new(0) };
}

struct CallbackScope {
    previous: u64,
}

impl CallbackScope {
    fn enter(id: u64) -> Self {
        let previous = ACTIVE_CALLBACK.with(|cell| cell.replace(id));
        Self { previous }
    }
}

impl Drop for CallbackScope {
    fn drop(&mut self) {
        ACTIVE_CALLBACK.with(|cell| cell.set(self.previous));
    }
}

/// Multi-subscriber directory-change notifier.
#[derive(Default)]
pub struct WatchBus {
    registrations: Mutex<Vec<Arc<Registration>>>,
    drained: Condvar,
    next_id: AtomicU64,
}

impl WatchBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for a watched path.
    ///
    /// Idempotency key is the path: a second active registration for the
    /// same path fails with [`AlreadyExists`](crate::Error::AlreadyExists).
    pub fn register(&self, path: &str, callback: WatchCallback) -> crate::Result<()> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;

        let registration = Arc::new(Registration {
            id,
            path: path.to_owned(),
            callback,
            active: AtomicBool::new(true),
            in_flight: AtomicU32::new(0),
        });

        #[allow(clippy::expect_used)]
        let mut registrations = self.registrations.lock().expect("lock is poisoned");

        let duplicate = registrations
            .iter()
            .any(|existing| existing.active.load(Ordering::Acquire) && eq_ignore_case(&existing.path, path));
        if duplicate {
            return Err(crate::Error::AlreadyExists);
        }

        registrations.push(registration);
        Ok(())
    }

    /// Unregisters the active registration for `path` and drains it.
    ///
    /// Blocks until no callback of this registration is running. When called
    /// from inside the registration's own callback, one in-flight invocation
    /// (ours) is tolerated so the wait cannot deadlock.
    pub fn unregister(&self, path: &str) -> crate::Result<()> {
        #[allow(clippy::expect_used)]
        let mut registrations = self.registrations.lock().expect("lock is poisoned");

        let index = registrations
            .iter()
            .position(|existing| eq_ignore_case(&existing.path, path))
            .ok_or(crate::Error::NotFound)?;

        let removed = registrations.remove(index);
        removed.active.store(false, Ordering::Release);

        let reentrant = ACTIVE_CALLBACK.with(Cell::get) == removed.id;
        let allowed = u32::from(reentrant);

        while removed.in_flight.load(Ordering::Acquire) > allowed {
            #[allow(clippy::expect_used)]
            {
                registrations = self
                    .drained
                    .wait(registrations)
                    .expect("lock is poisoned");
            }
        }

        Ok(())
    }

    /// Returns `true` if any active registration matches `path`.
    #[must_use]
    pub fn is_watched(&self, path: &str) -> bool {
        #[allow(clippy::expect_used)]
        let registrations = self.registrations.lock().expect("lock is poisoned");
        registrations
            .iter()
            .any(|existing| existing.active.load(Ordering::Acquire) && eq_ignore_case(&existing.path, path))
    }

    /// Delivers a batch of changes to every subscriber of `watched_path`.
    ///
    /// Matching registrations are snapshotted under the bus lock with their
    /// in-flight counters bumped; callbacks then run outside the lock.
    pub fn notify(&self, watched_path: &str, changes: &[(ChangeAction, &str)]) {
        if watched_path.is_empty() || changes.is_empty() {
            return;
        }
        if changes.iter().any(|(_, name)| name.is_empty()) {
            return;
        }

        let subscribers: Vec<Arc<Registration>> = {
            #[allow(clippy::expect_used)]
            let registrations = self.registrations.lock().expect("lock is poisoned");

            registrations
                .iter()
                .filter(|existing| {
                    existing.active.load(Ordering::Acquire)
                        && eq_ignore_case(&existing.path, watched_path)
                })
                .inspect(|existing| {
                    existing.in_flight.fetch_add(1, Ordering::AcqRel);
                })
                .cloned()
                .collect()
        };

        if subscribers.is_empty() {
            return;
        }

        for subscriber in subscribers {
            if subscriber.active.load(Ordering::Acquire) {
                let notification = ChangeNotification {
                    watched_path: subscriber.path.clone(),
                    changes: changes
                        .iter()
                        .map(|(action, name)| Change {
                            action: *action,
                            name: (*name).to_owned(),
                        })
                        .collect(),
                };

                let _scope = CallbackScope::enter(subscriber.id);
                (subscriber.callback)(&notification);
            }

            let remaining = subscriber.in_flight.fetch_sub(1, Ordering::AcqRel) - 1;
            if remaining == 0 || !subscriber.active.load(Ordering::Acquire) {
                self.drained.notify_all();
            }
        }
    }
}
