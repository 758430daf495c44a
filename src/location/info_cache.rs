// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Consumer-side cache over directory enumerations.
//!
//! Navigation workers borrow enumeration snapshots instead of re-running
//! `read_directory` for every keystroke. Entries are weighted by their wire
//! buffer size and evicted least-recently-used once the byte budget is
//! exceeded; a borrow or pin keeps the snapshot alive regardless.

use crate::{filesystem::FileSystem, info::DirectoryInfo, path::{fold_case, VfsPath}};
use quick_cache::{sync::Cache as QuickCache, Equivalent, Weighter};
use std::sync::Arc;

/// How a borrow behaves on a cache miss.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BorrowMode {
    /// Only return already-cached snapshots.
    CacheOnly,

    /// Enumerate through the engine on a miss.
    AllowEnumerate,
}

#[derive(Eq, std::hash::Hash, PartialEq)]
struct CacheKey(u64, String);

impl Equivalent<CacheKey> for (u64, &str) {
    fn equivalent(&self, key: &CacheKey) -> bool {
        self.0 == key.0 && self.1 == key.1
    }
}

#[derive(Clone)]
struct InfoWeighter;

impl Weighter<CacheKey, Arc<DirectoryInfo>> for InfoWeighter {
    fn weight(&self, key: &CacheKey, info: &Arc<DirectoryInfo>) -> u64 {
        key.1.len() as u64 + u64::from(info.used_bytes()).max(64)
    }
}

/// A borrowed enumeration snapshot.
///
/// Holding the borrow keeps the snapshot alive even if the cache evicts it.
pub struct Borrowed {
    status: crate::Result<()>,
    info: Option<Arc<DirectoryInfo>>,
    normalized_path: String,
}

impl Borrowed {
    /// Outcome of the borrow.
    #[must_use]
    pub fn status(&self) -> &crate::Result<()> {
        &self.status
    }

    /// The snapshot, when the borrow succeeded.
    #[must_use]
    pub fn info(&self) -> Option<&DirectoryInfo> {
        self.info.as_deref()
    }

    /// The normalized folder path the snapshot belongs to.
    #[must_use]
    pub fn normalized_path(&self) -> &str {
        &self.normalized_path
    }
}

/// A pinned enumeration snapshot.
///
/// Like a borrow, but intended to be held across user interactions (e.g.
/// while a breadcrumb menu is open).
pub struct Pin {
    info: Option<Arc<DirectoryInfo>>,
    normalized_path: String,
}

impl Pin {
    /// Returns `true` when the pin holds a snapshot.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.info.is_some()
    }

    /// The normalized folder path the pin belongs to.
    #[must_use]
    pub fn normalized_path(&self) -> &str {
        &self.normalized_path
    }
}

/// Weighted LRU cache of enumeration snapshots, keyed per engine and folder.
pub struct InfoCache {
    data: QuickCache<CacheKey, Arc<DirectoryInfo>, InfoWeighter, rustc_hash::FxBuildHasher>,
    capacity: u64,
}

impl InfoCache {
    /// Creates a cache with roughly `bytes` of capacity.
    #[must_use]
    pub fn with_capacity_bytes(bytes: u64) -> Self {
        use quick_cache::sync::DefaultLifecycle;

        #[allow(clippy::default_trait_access)]
        let data = QuickCache::with(
            10_000,
            bytes,
            InfoWeighter,
            Default::default(),
            DefaultLifecycle::default(),
        );

        Self {
            data,
            capacity: bytes,
        }
    }

    /// Returns the configured byte capacity.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns the cached bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.weight()
    }

    /// Drops every cached snapshot.
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Drops the snapshot of one folder.
    pub fn invalidate_folder(&self, fs: &FileSystem, folder: &str) {
        let normalized = VfsPath::normalize(folder);
        let key = fold_case(normalized.as_str());
        self.data.remove(&(fs.engine_id(), key.as_str()));
    }

    /// Borrows the enumeration of `folder`.
    ///
    /// `CacheOnly` misses report [`NotFound`](crate::Error::NotFound)
    /// without touching the engine.
    pub fn borrow_directory_info(
        &self,
        fs: &FileSystem,
        folder: &str,
        mode: BorrowMode,
    ) -> Borrowed {
        let normalized = VfsPath::normalize(folder);
        let key = fold_case(normalized.as_str());

        if let Some(hit) = self.data.get(&(fs.engine_id(), key.as_str())) {
            return Borrowed {
                status: Ok(()),
                info: Some(hit),
                normalized_path: normalized.as_str().to_owned(),
            };
        }

        if mode == BorrowMode::CacheOnly {
            return Borrowed {
                status: Err(crate::Error::NotFound),
                info: None,
                normalized_path: normalized.as_str().to_owned(),
            };
        }

        match fs.read_directory(normalized.as_str()) {
            Ok(info) => {
                let info = Arc::new(info);
                self.data
                    .insert(CacheKey(fs.engine_id(), key), info.clone());

                Borrowed {
                    status: Ok(()),
                    info: Some(info),
                    normalized_path: normalized.as_str().to_owned(),
                }
            }
            Err(error) => Borrowed {
                status: Err(error),
                info: None,
                normalized_path: normalized.as_str().to_owned(),
            },
        }
    }

    /// Pins the enumeration of `folder`, enumerating on a miss.
    pub fn pin_folder(&self, fs: &FileSystem, folder: &str) -> Pin {
        let borrowed = self.borrow_directory_info(fs, folder, BorrowMode::AllowEnumerate);

        Pin {
            info: borrowed.info,
            normalized_path: borrowed.normalized_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use test_log::test;

    fn small_fs() -> FileSystem {
        Config::default()
            .max_children_per_directory(4)
            .max_depth(2)
            .seed(7)
            .open()
    }

    #[test]
    fn cache_only_miss_is_not_found() {
        let fs = small_fs();
        let cache = InfoCache::with_capacity_bytes(1 << 20);

        let borrowed = cache.borrow_directory_info(&fs, r"C:\", BorrowMode::CacheOnly);
        assert_eq!(&Err(crate::Error::NotFound), borrowed.status());
        assert!(borrowed.info().is_none());
    }

    #[test]
    fn enumerate_fills_the_cache() {
        let fs = small_fs();
        let cache = InfoCache::with_capacity_bytes(1 << 20);

        let first = cache.borrow_directory_info(&fs, r"C:\", BorrowMode::AllowEnumerate);
        assert!(first.status().is_ok());
        let count = first.info().expect("snapshot").count();

        // Now available cache-only, same content.
        let second = cache.borrow_directory_info(&fs, r"c:/", BorrowMode::CacheOnly);
        assert!(second.status().is_ok());
        assert_eq!(count, second.info().expect("snapshot").count());
    }

    #[test]
    fn engines_do_not_share_entries() {
        let a = small_fs();
        let b = small_fs();
        let cache = InfoCache::with_capacity_bytes(1 << 20);

        let _ = cache.borrow_directory_info(&a, r"C:\", BorrowMode::AllowEnumerate);
        let miss = cache.borrow_directory_info(&b, r"C:\", BorrowMode::CacheOnly);
        assert_eq!(&Err(crate::Error::NotFound), miss.status());
    }

    #[test]
    fn invalidation_forces_a_refetch() {
        let fs = small_fs();
        let cache = InfoCache::with_capacity_bytes(1 << 20);

        let _ = cache.borrow_directory_info(&fs, r"C:\", BorrowMode::AllowEnumerate);
        cache.invalidate_folder(&fs, r"C:\");

        let miss = cache.borrow_directory_info(&fs, r"C:\", BorrowMode::CacheOnly);
        assert_eq!(&Err(crate::Error::NotFound), miss.status());
    }

    #[test]
    fn pins_survive_cache_clear() {
        let fs = small_fs();
        let cache = InfoCache::with_capacity_bytes(1 << 20);

        let pin = cache.pin_folder(&fs, r"C:\");
        assert!(pin.is_valid());

        cache.clear();
        assert!(pin.is_valid());
    }
}
