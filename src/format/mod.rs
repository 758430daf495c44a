// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Byte-level encoders for synthesized file content.

pub mod fill;
pub mod jpeg;
pub mod png;
pub mod text;

use crate::{attributes::Attributes, rng, time::Ticks};

/// Content family of a synthetic file, decided by its extension.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FileKind {
    /// Plain prose-like text (also `.log`, `.md`, sources, unknown).
    Text,

    /// Comma-separated values with a header row.
    Csv,

    /// Strict JSON document.
    Json,

    /// JSON5 document with comments.
    Json5,

    /// JSON5 theme document.
    ThemeJson5,

    /// XML document with a CDATA body.
    Xml,

    /// Valid PNG image.
    Png,

    /// Valid baseline JPEG image.
    Jpeg,

    /// ZIP-shaped container (`.zip`, `.docx`, `.xlsx`).
    Zip,

    /// Raw bytes.
    Binary,
}

impl FileKind {
    pub(crate) fn seed_salt(self) -> u64 {
        match self {
            Self::Text => 0,
            Self::Csv => 1,
            Self::Json => 2,
            Self::Json5 => 3,
            Self::ThemeJson5 => 4,
            Self::Xml => 5,
            Self::Png => 6,
            Self::Jpeg => 7,
            Self::Zip => 8,
            Self::Binary => 9,
        }
    }
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    let name_len = name.len();
    if name_len < suffix.len() {
        return false;
    }

    // Extensions are ASCII; a byte-based suffix slice stays on char bounds.
    name.get(name_len - suffix.len()..)
        .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

/// Classifies a file name into its content family.
#[must_use]
pub fn file_kind(name: &str) -> FileKind {
    if ends_with_ignore_case(name, ".theme.json5") {
        FileKind::ThemeJson5
    } else if ends_with_ignore_case(name, ".json5") {
        FileKind::Json5
    } else if ends_with_ignore_case(name, ".json") {
        FileKind::Json
    } else if ends_with_ignore_case(name, ".xml") {
        FileKind::Xml
    } else if ends_with_ignore_case(name, ".csv") {
        FileKind::Csv
    } else if ends_with_ignore_case(name, ".png") {
        FileKind::Png
    } else if ends_with_ignore_case(name, ".jpg") || ends_with_ignore_case(name, ".jpeg") {
        FileKind::Jpeg
    } else if ends_with_ignore_case(name, ".zip")
        || ends_with_ignore_case(name, ".docx")
        || ends_with_ignore_case(name, ".xlsx")
    {
        FileKind::Zip
    } else if ends_with_ignore_case(name, ".bin") {
        FileKind::Binary
    } else {
        FileKind::Text
    }
}

/// Immutable view of a file node, captured under the tree lock.
///
/// Readers are built from snapshots so that no lock is held while bytes are
/// produced.
#[derive(Clone, Debug)]
pub struct FileSnapshot {
    /// Entry name.
    pub name: String,

    /// Attribute bit set.
    pub attributes: Attributes,

    /// Logical size in bytes.
    pub size_bytes: u64,

    /// Creation timestamp.
    pub creation: Ticks,

    /// The node's generation seed.
    pub generation_seed: u64,
}

/// Derives the content seed of a file from its observable identity.
///
/// Renaming or resizing a file changes its bytes; an untouched file keeps
/// them forever.
#[must_use]
pub fn content_seed(snapshot: &FileSnapshot) -> u64 {
    #[allow(clippy::cast_sign_loss)]
    let creation = snapshot.creation as u64;

    rng::SeedHasher::new()
        .write_u64(snapshot.generation_seed)
        .write_str(&snapshot.name)
        .write_u64(snapshot.size_bytes)
        .write_u64(creation)
        .write_u64(u64::from(snapshot.attributes.bits()))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn kind_classification() {
        assert_eq!(FileKind::ThemeJson5, file_kind("dark.theme.json5"));
        assert_eq!(FileKind::Json5, file_kind("settings.JSON5"));
        assert_eq!(FileKind::Json, file_kind("data.json"));
        assert_eq!(FileKind::Xml, file_kind("doc.xml"));
        assert_eq!(FileKind::Csv, file_kind("table.csv"));
        assert_eq!(FileKind::Png, file_kind("image.PNG"));
        assert_eq!(FileKind::Jpeg, file_kind("photo.jpg"));
        assert_eq!(FileKind::Jpeg, file_kind("photo.jpeg"));
        assert_eq!(FileKind::Zip, file_kind("bundle.zip"));
        assert_eq!(FileKind::Zip, file_kind("sheet.xlsx"));
        assert_eq!(FileKind::Binary, file_kind("blob.bin"));
        assert_eq!(FileKind::Text, file_kind("notes.txt"));
        assert_eq!(FileKind::Text, file_kind("main.cpp"));
        assert_eq!(FileKind::Text, file_kind("no_extension"));
    }

    #[test]
    fn content_seed_tracks_identity() {
        let snapshot = FileSnapshot {
            name: "a.txt".into(),
            attributes: Attributes::ARCHIVE,
            size_bytes: 10,
            creation: 1,
            generation_seed: 42,
        };

        let mut renamed = snapshot.clone();
        renamed.name = "b.txt".into();

        assert_eq!(content_seed(&snapshot), content_seed(&snapshot));
        assert_ne!(content_seed(&snapshot), content_seed(&renamed));
    }
}
