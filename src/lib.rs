// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A deterministic in-memory virtual file system, plus the breadcrumb
//! navigation engine of a file manager.
//!
//! ##### About
//!
//! The engine fabricates an arbitrarily deep directory tree of synthetic
//! files (text, CSV, JSON/JSON5, XML, PNG, JPEG, ZIP-shaped, raw binary) as
//! a pure function of a seed: the same seed always yields the same tree,
//! names, sizes, timestamps and byte contents. On top of the tree sit
//! readers, a staged writer with an atomic commit, a full mutation engine
//! (copy/move/rename/delete, singular and bulk) with progress reporting,
//! simulated latency, throughput throttling and cooperative cancellation,
//! and a multi-subscriber directory-change bus.
//!
//! The [`location`] module contains the navigation side: location parsing
//! across three syntaxes, the breadcrumb collapse/truncation planner, a
//! weighted enumeration cache and the autocomplete/prefetch workers.
//!
//! Nothing here touches a disk or a network; hosts use the engine as a fast
//! and perfectly reproducible stand-in for a real file system.
//!
//! # Example usage
//!
//! ```
//! use mirage_fs::{Config, RandomAccess};
//!
//! // Same seed, same tree.
//! let fs = Config::default()
//!     .max_children_per_directory(8)
//!     .max_depth(2)
//!     .seed(42)
//!     .open();
//!
//! for entry in fs.read_directory("C:\\")?.entries() {
//!     if !entry.is_directory() {
//!         let mut reader = fs.create_reader(&format!("C:\\{}", entry.name))?;
//!         assert_eq!(entry.size_bytes, reader.size());
//!     }
//! }
//! # Ok::<(), mirage_fs::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]

mod r#abstract;
mod attributes;
mod config;
mod error;
mod filesystem;

#[doc(hidden)]
pub mod format;

mod info;

pub mod location;

mod menu;
mod ops;
mod path;

#[doc(hidden)]
pub mod rng;

mod reader;
mod time;
mod tree;
mod watch;
mod writer;

pub use {
    attributes::Attributes,
    config::{parse_throughput, Config, CAPABILITIES_JSON, SCHEMA_JSON},
    error::{Error, Result},
    filesystem::{BasicInfo, FileSystem, PluginMetadata},
    info::{DirectoryEntry, DirectoryInfo, Entries},
    menu::{DriveInfo, MenuChangedCallback, MenuItemFlags, NavigationMenuItem},
    ops::{
        DirectorySizeCallback, DirectorySizeProgress, DirectorySizeResult, ItemCompletion,
        OpFlags, OperationCallback, OperationKind, OperationOptions, ProgressReport,
    },
    r#abstract::{
        DriveMetadata, FileSystemDirectoryOperations, FileSystemDirectoryWatch, FileSystemIo,
        NavigationMenuSource, PluginInformation,
    },
    reader::{RandomAccess, Reader, SeekOrigin},
    time::Ticks,
    watch::{Change, ChangeAction, ChangeNotification, WatchCallback},
    writer::Writer,
};
