// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    attributes::Attributes,
    config::{Config, CAPABILITIES_JSON, SCHEMA_JSON},
    format::FileSnapshot,
    info::{DirectoryInfo, EntryRecord},
    menu::{DriveInfo, MenuChangedCallback, MenuItemFlags, NavigationMenuItem},
    ops::OpFlags,
    path::VfsPath,
    reader::{reader_for_snapshot, Reader, SharedBufferReader},
    rng::combine_seed_str,
    time::{generation_base_time, now_ticks, tick_count, Ticks},
    tree::{is_name_valid, Forest, GeneratorParams, Node},
    watch::{ChangeAction, WatchBus, WatchCallback},
    writer::Writer,
    Error,
};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};

/// Basic metadata of one entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BasicInfo {
    /// Creation timestamp.
    pub creation: Ticks,

    /// Last access timestamp.
    pub last_access: Ticks,

    /// Last write timestamp.
    pub last_write: Ticks,

    /// Attribute bit set.
    pub attributes: Attributes,
}

/// Identity of this plugin, handed to hosts.
#[derive(Copy, Clone, Debug)]
pub struct PluginMetadata {
    /// Stable plugin id.
    pub id: &'static str,

    /// Terse prefix used in edit and history paths.
    pub short_id: &'static str,

    /// Human-readable name.
    pub name: &'static str,

    /// One-line description.
    pub description: &'static str,

    /// Author attribution.
    pub author: &'static str,

    /// Version string.
    pub version: &'static str,
}

const METADATA: PluginMetadata = PluginMetadata {
    id: "builtin/file-system-mirage",
    short_id: "fk",
    name: "Mirage File System",
    description: "Deterministic in-memory virtual file system for testing.",
    author: "fjall-rs",
    version: "1.0",
};

pub(crate) struct EngineState {
    pub config: Config,
    pub effective_seed: u64,
    pub generation_base_time: Ticks,
    pub forest: Forest,
}

impl EngineState {
    pub fn params(&self) -> GeneratorParams {
        GeneratorParams {
            max_children_per_directory: self.config.max_children_per_directory,
            max_depth: self.config.max_depth,
            effective_seed: self.effective_seed,
            generation_base_time: self.generation_base_time,
        }
    }
}

pub(crate) struct FsInner {
    pub state: Mutex<EngineState>,
    pub speed_limit: AtomicU64,
    pub watchers: WatchBus,
    pub menu_callback: Mutex<Option<MenuChangedCallback>>,
    pub id: u64,
}

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

fn effective_seed_of(seed: u32) -> u64 {
    if seed == 0 {
        // Run-unique seed.
        tick_count()
    } else {
        u64::from(seed)
    }
}

/// The virtual file system engine.
///
/// Cloning is cheap and shares the same tree, watchers and configuration.
///
/// # Examples
///
/// ```
/// use mirage_fs::Config;
///
/// let fs = Config::default().seed(42).open();
/// let listing = fs.read_directory("C:\\")?;
/// assert!(listing.count() > 0);
/// # Ok::<(), mirage_fs::Error>(())
/// ```
#[derive(Clone)]
pub struct FileSystem {
    pub(crate) inner: Arc<FsInner>,
}

impl FileSystem {
    /// Opens an engine with the given configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        let effective_seed = effective_seed_of(config.seed);
        let speed_limit = config.virtual_speed_limit;

        let inner = FsInner {
            state: Mutex::new(EngineState {
                generation_base_time: generation_base_time(effective_seed),
                effective_seed,
                config,
                forest: Forest::new(),
            }),
            speed_limit: AtomicU64::new(speed_limit),
            watchers: WatchBus::new(),
            menu_callback: Mutex::new(None),
            id: NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        #[allow(clippy::expect_used)]
        self.inner.state.lock().expect("lock is poisoned")
    }

    pub(crate) fn engine_id(&self) -> u64 {
        self.inner.id
    }

    pub(crate) fn virtual_speed_limit(&self) -> u64 {
        self.inner.speed_limit.load(Ordering::Acquire)
    }

    pub(crate) fn watchers(&self) -> &WatchBus {
        &self.inner.watchers
    }

    /// This plugin's identity.
    #[must_use]
    pub fn metadata(&self) -> &'static PluginMetadata {
        &METADATA
    }

    /// The configuration schema JSON.
    #[must_use]
    pub fn config_schema(&self) -> &'static str {
        SCHEMA_JSON
    }

    /// The fixed capability document.
    #[must_use]
    pub fn capabilities(&self) -> &'static str {
        CAPABILITIES_JSON
    }

    /// A copy of the active configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        self.lock_state().config.clone()
    }

    /// Replaces the configuration.
    ///
    /// When the generator-relevant fields (children bound, depth, seed)
    /// change, the whole forest is dropped and a new effective seed plus
    /// generation base time take over.
    pub fn set_config(&self, config: Config) {
        let mut state = self.lock_state();

        let structure_changed = state.config.structure_changed(&config);

        self.inner
            .speed_limit
            .store(config.virtual_speed_limit, Ordering::Release);
        state.config = config;

        if structure_changed {
            let effective_seed = effective_seed_of(state.config.seed);
            log::debug!(
                "configuration structure changed, dropping forest (effective seed {effective_seed})"
            );

            state.forest.clear();
            state.effective_seed = effective_seed;
            state.generation_base_time = generation_base_time(effective_seed);
        }
    }

    /// Applies a configuration JSON document (see the schema).
    pub fn set_config_json(&self, json: &str) {
        let previous = self.config();
        self.set_config(Config::from_json(json, Some(&previous)));
    }

    /// The canonical configuration JSON.
    #[must_use]
    pub fn config_json(&self) -> String {
        self.lock_state().config.to_json()
    }

    /// Returns `true` if the configuration differs from the defaults.
    #[must_use]
    pub fn something_to_save(&self) -> bool {
        !self.lock_state().config.is_default()
    }

    /// Sleeps the configured latency for `access_count` accesses.
    pub(crate) fn simulate_latency(&self, access_count: u64) {
        if access_count == 0 {
            return;
        }

        let latency_ms = u64::from(self.lock_state().config.latency_ms);
        if latency_ms == 0 {
            return;
        }

        std::thread::sleep(std::time::Duration::from_millis(
            latency_ms.saturating_mul(access_count),
        ));
    }

    fn validate_path_arg(path: &str) -> crate::Result<()> {
        if path.is_empty() {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    /// Enumerates the children of a directory.
    pub fn read_directory(&self, path: &str) -> crate::Result<DirectoryInfo> {
        Self::validate_path_arg(path)?;
        let normalized = VfsPath::normalize(path);

        let records: Vec<EntryRecord> = {
            let mut state = self.lock_state();
            let params = state.params();
            let node = state.forest.resolve(&params, &normalized, false, true)?;
            state.forest.ensure_children(&params, node);

            state
                .forest
                .node(node)
                .children
                .iter()
                .map(|&child| {
                    let child = state.forest.node(child);
                    EntryRecord {
                        name: child.name.clone(),
                        attributes: child.attributes,
                        size_bytes: child.size_bytes,
                        creation: child.creation,
                        last_access: child.last_access,
                        last_write: child.last_write,
                        change: child.change,
                    }
                })
                .collect()
        };

        self.simulate_latency(records.len() as u64);
        DirectoryInfo::build(&records)
    }

    /// Returns the attribute bits of an entry.
    pub fn get_attributes(&self, path: &str) -> crate::Result<Attributes> {
        Self::validate_path_arg(path)?;
        let normalized = VfsPath::normalize(path);

        let attributes = {
            let mut state = self.lock_state();
            let params = state.params();
            let node = state.forest.resolve(&params, &normalized, false, false)?;
            state.forest.node(node).attributes
        };

        self.simulate_latency(1);
        Ok(attributes)
    }

    /// Opens a reader over a file.
    pub fn create_reader(&self, path: &str) -> crate::Result<Reader> {
        Self::validate_path_arg(path)?;
        let normalized = VfsPath::normalize(path);

        let (snapshot, materialized) = {
            let mut state = self.lock_state();
            let params = state.params();
            let id = state.forest.resolve(&params, &normalized, false, false)?;
            let node = state.forest.node(id);

            if node.is_directory {
                return Err(Error::IsADirectory);
            }

            (
                FileSnapshot {
                    name: node.name.clone(),
                    attributes: node.attributes,
                    size_bytes: node.size_bytes,
                    creation: node.creation,
                    generation_seed: node.generation_seed,
                },
                node.materialized_content.clone(),
            )
        };

        self.simulate_latency(1);

        if let Some(content) = materialized {
            return Ok(Reader::Shared(SharedBufferReader::new(content)));
        }

        Ok(reader_for_snapshot(&snapshot))
    }

    /// Opens a writer for a file.
    ///
    /// Collision rules are validated now and revalidated on commit.
    pub fn create_writer(&self, path: &str, flags: OpFlags) -> crate::Result<Writer> {
        Self::validate_path_arg(path)?;
        let normalized = VfsPath::normalize(path);

        let name = normalized
            .file_name()
            .map(str::to_owned)
            .ok_or(Error::InvalidName)?;
        if !is_name_valid(&name) {
            return Err(Error::InvalidName);
        }

        let parent_path = normalized.parent().ok_or(Error::InvalidName)?;

        {
            let mut state = self.lock_state();
            let params = state.params();
            let parent = state.forest.resolve(&params, &parent_path, false, true)?;
            state.forest.ensure_children(&params, parent);

            if let Some(existing) = state.forest.find_child(parent, &name) {
                let existing = state.forest.node(existing);

                if !flags.contains(OpFlags::ALLOW_OVERWRITE) {
                    return Err(Error::AlreadyExists);
                }
                if existing.attributes.contains(Attributes::READONLY)
                    && !flags.contains(OpFlags::ALLOW_REPLACE_READONLY)
                {
                    return Err(Error::AccessDenied);
                }
                if existing.is_directory {
                    return Err(Error::AlreadyExists);
                }
            }
        }

        Ok(Writer::new(self.clone(), normalized, flags))
    }

    /// Atomically installs a committed writer buffer as a file node.
    pub(crate) fn commit_writer(
        &self,
        path: &VfsPath,
        flags: OpFlags,
        buffer: Arc<Vec<u8>>,
    ) -> crate::Result<()> {
        let name = path
            .file_name()
            .map(str::to_owned)
            .ok_or(Error::InvalidName)?;
        if !is_name_valid(&name) {
            return Err(Error::InvalidName);
        }

        let parent_path = path.parent().ok_or(Error::InvalidName)?;
        let now = now_ticks();

        {
            let mut state = self.lock_state();
            let params = state.params();
            let parent = state.forest.resolve(&params, &parent_path, false, true)?;
            state.forest.ensure_children(&params, parent);

            if let Some(existing) = state.forest.find_child(parent, &name) {
                let node = state.forest.node(existing);

                if !flags.contains(OpFlags::ALLOW_OVERWRITE) {
                    return Err(Error::AlreadyExists);
                }
                if node.attributes.contains(Attributes::READONLY)
                    && !flags.contains(OpFlags::ALLOW_REPLACE_READONLY)
                {
                    return Err(Error::AccessDenied);
                }

                state.forest.extract_child(parent, existing, now);
                state.forest.free_subtree(existing);
            }

            let generation_seed =
                combine_seed_str(state.forest.node(parent).generation_seed, &name);

            let node = Node {
                name: name.clone(),
                is_directory: false,
                attributes: Attributes::ARCHIVE,
                size_bytes: buffer.len() as u64,
                creation: now,
                last_access: now,
                last_write: now,
                change: now,
                generation_seed,
                planned_child_count: 0,
                children_generated: true,
                materialized_content: Some(buffer),
                parent: None,
                children: Vec::new(),
            };

            let id = state.forest.alloc(node);
            state.forest.add_child(parent, id, now);
        }

        log::debug!("writer committed {:?}", path.as_str());
        self.inner
            .watchers
            .notify(parent_path.as_str(), &[(ChangeAction::Added, name.as_str())]);
        Ok(())
    }

    /// Reads an entry's timestamps and attributes.
    pub fn get_basic_info(&self, path: &str) -> crate::Result<BasicInfo> {
        Self::validate_path_arg(path)?;
        let normalized = VfsPath::normalize(path);

        let info = {
            let mut state = self.lock_state();
            let params = state.params();
            let id = state.forest.resolve(&params, &normalized, false, false)?;
            let node = state.forest.node(id);

            BasicInfo {
                creation: node.creation,
                last_access: node.last_access,
                last_write: node.last_write,
                attributes: node.attributes,
            }
        };

        self.simulate_latency(1);
        Ok(info)
    }

    /// Writes an entry's timestamps and attributes.
    ///
    /// The `DIRECTORY` bit is preserved, a regular file whose attributes
    /// were zeroed becomes `NORMAL`, and `change` moves to now.
    pub fn set_basic_info(&self, path: &str, info: &BasicInfo) -> crate::Result<()> {
        Self::validate_path_arg(path)?;
        let normalized = VfsPath::normalize(path);

        {
            let mut state = self.lock_state();
            let params = state.params();
            let id = state.forest.resolve(&params, &normalized, false, false)?;
            let node = state.forest.node_mut(id);

            node.creation = info.creation;
            node.last_access = info.last_access;
            node.last_write = info.last_write;

            let mut attributes = info.attributes;
            if node.is_directory {
                attributes |= Attributes::DIRECTORY;
            } else {
                attributes = attributes.without(Attributes::DIRECTORY);
                if attributes.is_empty() {
                    attributes = Attributes::NORMAL;
                }
            }
            node.attributes = attributes;
            node.change = now_ticks();
        }

        self.simulate_latency(1);
        Ok(())
    }

    /// Creates an empty directory.
    pub fn create_directory(&self, path: &str) -> crate::Result<()> {
        Self::validate_path_arg(path)?;
        let normalized = VfsPath::normalize(path);

        let name = normalized
            .file_name()
            .map(str::to_owned)
            .ok_or(Error::InvalidName)?;
        if !is_name_valid(&name) {
            return Err(Error::InvalidName);
        }

        let parent_path = normalized.parent().ok_or(Error::InvalidName)?;
        let now = now_ticks();

        {
            let mut state = self.lock_state();
            let params = state.params();
            let parent = state.forest.resolve(&params, &parent_path, false, true)?;
            state.forest.ensure_children(&params, parent);

            if state.forest.find_child(parent, &name).is_some() {
                return Err(Error::AlreadyExists);
            }

            let generation_seed =
                combine_seed_str(state.forest.node(parent).generation_seed, &name);

            let node = Node {
                name: name.clone(),
                is_directory: true,
                attributes: Attributes::DIRECTORY,
                size_bytes: 0,
                creation: now,
                last_access: now,
                last_write: now,
                change: now,
                generation_seed,
                planned_child_count: 0,
                children_generated: true,
                materialized_content: None,
                parent: None,
                children: Vec::new(),
            };

            let id = state.forest.alloc(node);
            state.forest.add_child(parent, id, now);
        }

        self.inner
            .watchers
            .notify(parent_path.as_str(), &[(ChangeAction::Added, name.as_str())]);
        self.simulate_latency(1);
        Ok(())
    }

    /// Registers a directory watcher; fails with
    /// [`AlreadyExists`](Error::AlreadyExists) for a duplicate path.
    pub fn watch_directory(&self, path: &str, callback: WatchCallback) -> crate::Result<()> {
        Self::validate_path_arg(path)?;
        let normalized = VfsPath::normalize(path);

        {
            let mut state = self.lock_state();
            let params = state.params();
            state.forest.resolve(&params, &normalized, false, true)?;
        }

        self.inner.watchers.register(normalized.as_str(), callback)
    }

    /// Removes an active watcher registration and drains it.
    pub fn unwatch_directory(&self, path: &str) -> crate::Result<()> {
        Self::validate_path_arg(path)?;
        let normalized = VfsPath::normalize(path);
        self.inner.watchers.unregister(normalized.as_str())
    }

    /// Builds the item-properties JSON document for an entry.
    pub fn get_item_properties(&self, path: &str) -> crate::Result<String> {
        Self::validate_path_arg(path)?;
        let normalized = VfsPath::normalize(path);

        let (name, size_bytes, is_directory) = {
            let mut state = self.lock_state();
            let params = state.params();
            let id = state.forest.resolve(&params, &normalized, false, false)?;
            let node = state.forest.node(id);
            (node.name.clone(), node.size_bytes, node.is_directory)
        };

        let mut fields = vec![
            serde_json::json!({"key": "name", "value": name}),
            serde_json::json!({"key": "path", "value": normalized.as_str()}),
            serde_json::json!({
                "key": "type",
                "value": if is_directory { "directory" } else { "file" },
            }),
        ];

        if !is_directory {
            fields.push(serde_json::json!({
                "key": "sizeBytes",
                "value": size_bytes.to_string(),
            }));
        }

        let document = serde_json::json!({
            "version": 1,
            "title": "properties",
            "sections": [{ "title": "general", "fields": fields }],
        });

        Ok(document.to_string())
    }

    /// Synthesized drive metadata for any path of this plugin.
    #[must_use]
    pub fn get_drive_info(&self, path: &str) -> DriveInfo {
        let _ = path;

        const TOTAL_BYTES: u64 = 8 * 1024 * 1024 * 1024;
        let free_bytes = TOTAL_BYTES / 2;

        DriveInfo {
            display_name: Some(METADATA.name.to_owned()),
            volume_label: Some(METADATA.name.to_owned()),
            file_system: Some("MirageFS".to_owned()),
            total_bytes: Some(TOTAL_BYTES),
            free_bytes: Some(free_bytes),
            used_bytes: Some(TOTAL_BYTES - free_bytes),
        }
    }

    /// The navigation menu: a header, a separator, and the root entry.
    #[must_use]
    pub fn get_menu(&self) -> Vec<NavigationMenuItem> {
        vec![
            NavigationMenuItem {
                flags: MenuItemFlags::HEADER,
                label: METADATA.name.to_owned(),
                path: String::new(),
                icon_path: String::new(),
                command_id: 0,
            },
            NavigationMenuItem {
                flags: MenuItemFlags::SEPARATOR,
                label: String::new(),
                path: String::new(),
                icon_path: String::new(),
                command_id: 0,
            },
            NavigationMenuItem {
                flags: MenuItemFlags::NONE,
                label: "/".to_owned(),
                path: "/".to_owned(),
                icon_path: String::new(),
                command_id: 0,
            },
        ]
    }

    /// Per-drive menu entries (none).
    #[must_use]
    pub fn get_drive_menu(&self, path: &str) -> Vec<NavigationMenuItem> {
        let _ = path;
        Vec::new()
    }

    /// Registers (or, with `None`, clears) the menu-change callback.
    ///
    /// The menu of this plugin is static, so the callback is never invoked;
    /// it is stored to satisfy the host contract.
    pub fn set_menu_callback(&self, callback: Option<MenuChangedCallback>) {
        #[allow(clippy::expect_used)]
        let mut slot = self.inner.menu_callback.lock().expect("lock is poisoned");
        *slot = callback;
    }

    /// Menu commands are not implemented.
    pub fn execute_menu(&self, command_id: u32) -> crate::Result<()> {
        let _ = command_id;
        Err(Error::Unsupported)
    }

    /// Drive menu commands are not implemented.
    pub fn execute_drive_menu(&self, command_id: u32, path: &str) -> crate::Result<()> {
        let _ = (command_id, path);
        Err(Error::Unsupported)
    }
}
