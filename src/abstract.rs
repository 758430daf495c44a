// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Capability traits of the engine.
//!
//! Hosts consume narrow surfaces instead of one wide interface: byte-level
//! I/O, directory operations, watching, drive metadata, the navigation menu
//! and plugin information are separate traits, all implemented by
//! [`FileSystem`].

use crate::{
    filesystem::{BasicInfo, FileSystem, PluginMetadata},
    info::DirectoryInfo,
    menu::{DriveInfo, MenuChangedCallback, NavigationMenuItem},
    ops::{
        DirectorySizeCallback, DirectorySizeResult, OpFlags, OperationCallback, OperationOptions,
    },
    reader::Reader,
    watch::WatchCallback,
    writer::Writer,
    Attributes,
};

/// Byte-level and metadata I/O.
pub trait FileSystemIo {
    /// Enumerates the children of a directory.
    fn read_directory(&self, path: &str) -> crate::Result<DirectoryInfo>;

    /// Returns the attribute bits of an entry.
    fn get_attributes(&self, path: &str) -> crate::Result<Attributes>;

    /// Opens a reader over a file.
    fn create_reader(&self, path: &str) -> crate::Result<Reader>;

    /// Opens a writer for a file.
    fn create_writer(&self, path: &str, flags: OpFlags) -> crate::Result<Writer>;

    /// Reads an entry's timestamps and attributes.
    fn get_basic_info(&self, path: &str) -> crate::Result<BasicInfo>;

    /// Writes an entry's timestamps and attributes.
    fn set_basic_info(&self, path: &str, info: &BasicInfo) -> crate::Result<()>;

    /// Creates an empty directory.
    fn create_directory(&self, path: &str) -> crate::Result<()>;
}

impl FileSystemIo for FileSystem {
    fn read_directory(&self, path: &str) -> crate::Result<DirectoryInfo> {
        self.read_directory(path)
    }

    fn get_attributes(&self, path: &str) -> crate::Result<Attributes> {
        self.get_attributes(path)
    }

    fn create_reader(&self, path: &str) -> crate::Result<Reader> {
        self.create_reader(path)
    }

    fn create_writer(&self, path: &str, flags: OpFlags) -> crate::Result<Writer> {
        self.create_writer(path, flags)
    }

    fn get_basic_info(&self, path: &str) -> crate::Result<BasicInfo> {
        self.get_basic_info(path)
    }

    fn set_basic_info(&self, path: &str, info: &BasicInfo) -> crate::Result<()> {
        self.set_basic_info(path, info)
    }

    fn create_directory(&self, path: &str) -> crate::Result<()> {
        self.create_directory(path)
    }
}

/// Mutating directory operations, singular and bulk.
pub trait FileSystemDirectoryOperations {
    /// Copies one entry.
    fn copy_item(
        &self,
        source_path: &str,
        destination_path: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()>;

    /// Moves one entry.
    fn move_item(
        &self,
        source_path: &str,
        destination_path: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()>;

    /// Renames one entry.
    fn rename_item(
        &self,
        source_path: &str,
        destination_path: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()>;

    /// Deletes one entry.
    fn delete_item(
        &self,
        path: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()>;

    /// Copies a batch of entries into a folder.
    fn copy_items(
        &self,
        source_paths: &[&str],
        destination_folder: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()>;

    /// Moves a batch of entries into a folder.
    fn move_items(
        &self,
        source_paths: &[&str],
        destination_folder: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()>;

    /// Deletes a batch of entries.
    fn delete_items(
        &self,
        paths: &[&str],
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()>;

    /// Renames a batch of entries in place.
    fn rename_items(
        &self,
        items: &[(&str, &str)],
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()>;

    /// Scans a subtree, summing sizes.
    fn get_directory_size(
        &self,
        path: &str,
        recursive: bool,
        callback: Option<&dyn DirectorySizeCallback>,
    ) -> DirectorySizeResult;

    /// Builds the item-properties JSON document.
    fn get_item_properties(&self, path: &str) -> crate::Result<String>;

    /// Returns the fixed capability document.
    fn get_capabilities(&self) -> &'static str;
}

impl FileSystemDirectoryOperations for FileSystem {
    fn copy_item(
        &self,
        source_path: &str,
        destination_path: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        self.copy_item(source_path, destination_path, flags, options, callback)
    }

    fn move_item(
        &self,
        source_path: &str,
        destination_path: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        self.move_item(source_path, destination_path, flags, options, callback)
    }

    fn rename_item(
        &self,
        source_path: &str,
        destination_path: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        self.rename_item(source_path, destination_path, flags, options, callback)
    }

    fn delete_item(
        &self,
        path: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        self.delete_item(path, flags, options, callback)
    }

    fn copy_items(
        &self,
        source_paths: &[&str],
        destination_folder: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        self.copy_items(source_paths, destination_folder, flags, options, callback)
    }

    fn move_items(
        &self,
        source_paths: &[&str],
        destination_folder: &str,
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        self.move_items(source_paths, destination_folder, flags, options, callback)
    }

    fn delete_items(
        &self,
        paths: &[&str],
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        self.delete_items(paths, flags, options, callback)
    }

    fn rename_items(
        &self,
        items: &[(&str, &str)],
        flags: OpFlags,
        options: Option<&OperationOptions>,
        callback: Option<&dyn OperationCallback>,
    ) -> crate::Result<()> {
        self.rename_items(items, flags, options, callback)
    }

    fn get_directory_size(
        &self,
        path: &str,
        recursive: bool,
        callback: Option<&dyn DirectorySizeCallback>,
    ) -> DirectorySizeResult {
        self.get_directory_size(path, recursive, callback)
    }

    fn get_item_properties(&self, path: &str) -> crate::Result<String> {
        self.get_item_properties(path)
    }

    fn get_capabilities(&self) -> &'static str {
        self.capabilities()
    }
}

/// Directory-change subscriptions.
pub trait FileSystemDirectoryWatch {
    /// Registers a watcher; duplicate paths fail.
    fn watch_directory(&self, path: &str, callback: WatchCallback) -> crate::Result<()>;

    /// Removes a watcher and drains its in-flight callbacks.
    fn unwatch_directory(&self, path: &str) -> crate::Result<()>;
}

impl FileSystemDirectoryWatch for FileSystem {
    fn watch_directory(&self, path: &str, callback: WatchCallback) -> crate::Result<()> {
        self.watch_directory(path, callback)
    }

    fn unwatch_directory(&self, path: &str) -> crate::Result<()> {
        self.unwatch_directory(path)
    }
}

/// Drive metadata and the per-drive menu.
pub trait DriveMetadata {
    /// Synthesized drive information.
    fn get_drive_info(&self, path: &str) -> DriveInfo;

    /// Per-drive menu entries.
    fn get_drive_menu(&self, path: &str) -> Vec<NavigationMenuItem>;

    /// Executes a drive menu command.
    fn execute_drive_menu(&self, command_id: u32, path: &str) -> crate::Result<()>;
}

impl DriveMetadata for FileSystem {
    fn get_drive_info(&self, path: &str) -> DriveInfo {
        self.get_drive_info(path)
    }

    fn get_drive_menu(&self, path: &str) -> Vec<NavigationMenuItem> {
        self.get_drive_menu(path)
    }

    fn execute_drive_menu(&self, command_id: u32, path: &str) -> crate::Result<()> {
        self.execute_drive_menu(command_id, path)
    }
}

/// The navigation menu.
pub trait NavigationMenuSource {
    /// The plugin's menu entries.
    fn get_menu(&self) -> Vec<NavigationMenuItem>;

    /// Executes a menu command.
    fn execute_menu(&self, command_id: u32) -> crate::Result<()>;

    /// Registers (or clears) the menu-change callback.
    fn set_menu_callback(&self, callback: Option<MenuChangedCallback>);
}

impl NavigationMenuSource for FileSystem {
    fn get_menu(&self) -> Vec<NavigationMenuItem> {
        self.get_menu()
    }

    fn execute_menu(&self, command_id: u32) -> crate::Result<()> {
        self.execute_menu(command_id)
    }

    fn set_menu_callback(&self, callback: Option<MenuChangedCallback>) {
        self.set_menu_callback(callback);
    }
}

/// Plugin identity and configuration surface.
pub trait PluginInformation {
    /// The plugin's identity.
    fn metadata(&self) -> &'static PluginMetadata;

    /// The configuration schema JSON.
    fn config_schema(&self) -> &'static str;

    /// The canonical configuration JSON.
    fn config_json(&self) -> String;

    /// Applies a configuration JSON document.
    fn set_config_json(&self, json: &str);

    /// Returns `true` when the configuration differs from the defaults.
    fn something_to_save(&self) -> bool;
}

impl PluginInformation for FileSystem {
    fn metadata(&self) -> &'static PluginMetadata {
        self.metadata()
    }

    fn config_schema(&self) -> &'static str {
        self.config_schema()
    }

    fn config_json(&self) -> String {
        self.config_json()
    }

    fn set_config_json(&self, json: &str) {
        self.set_config_json(json);
    }

    fn something_to_save(&self) -> bool {
        self.something_to_save()
    }
}
