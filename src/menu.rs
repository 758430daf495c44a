// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::ops::BitOr;
use std::sync::Arc;

/// Callback invoked when the navigation menu changes.
pub type MenuChangedCallback = Arc<dyn Fn() + Send + Sync>;

/// Presentation flags of a navigation menu item.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct MenuItemFlags(u32);

impl MenuItemFlags {
    /// Plain clickable entry.
    pub const NONE: Self = Self(0);

    /// Visual separator row.
    pub const SEPARATOR: Self = Self(0x1);

    /// Entry is shown but not clickable.
    pub const DISABLED: Self = Self(0x2);

    /// Non-clickable section header.
    pub const HEADER: Self = Self(0x4);

    /// Returns `true` if every bit of `other` is set.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl BitOr for MenuItemFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One entry of the navigation menu.
#[derive(Clone, Debug)]
pub struct NavigationMenuItem {
    /// Presentation flags.
    pub flags: MenuItemFlags,

    /// Display label.
    pub label: String,

    /// Navigation target; a `/@conn:<name>` prefix routes through the
    /// connection manager.
    pub path: String,

    /// Optional icon resource path.
    pub icon_path: String,

    /// Command id for [`execute_menu`](crate::FileSystem::execute_menu).
    pub command_id: u32,
}

/// Synthesized drive metadata.
#[derive(Clone, Debug, Default)]
pub struct DriveInfo {
    /// Display name of the drive.
    pub display_name: Option<String>,

    /// Volume label.
    pub volume_label: Option<String>,

    /// File system name.
    pub file_system: Option<String>,

    /// Total capacity in bytes.
    pub total_bytes: Option<u64>,

    /// Free capacity in bytes.
    pub free_bytes: Option<u64>,

    /// Used capacity in bytes.
    pub used_bytes: Option<u64>,
}
