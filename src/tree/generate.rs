// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Lazy, deterministic child materialization.

use super::names::{random_base_name, random_extension, trim_to_utf16, utf16_len, MAX_NAME_UTF16};
use super::{is_name_valid, Forest, GeneratorParams, Node, NodeId};
use crate::{
    attributes::Attributes,
    format::{file_kind, FileKind},
    rng::{
        derive_child_seed, random_chance, random_range_u64, random_skewed, random_skewed_u64,
        Mt19937,
    },
};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Draws a plausible size for a file of the given kind.
pub(crate) fn random_file_size(rng: &mut Mt19937, kind: FileKind) -> u64 {
    const MAX_GENERIC_BYTES: u64 = 25 * MIB;

    match kind {
        FileKind::Png => random_range_u64(rng, 4 * KIB, 512 * KIB).max(256),
        FileKind::Jpeg => random_range_u64(rng, 2 * KIB, 512 * KIB).max(256),
        FileKind::Zip => random_range_u64(rng, 128, 256 * KIB).max(22),
        FileKind::Csv | FileKind::Json | FileKind::Json5 | FileKind::ThemeJson5 | FileKind::Xml => {
            random_skewed_u64(rng, 2 * MIB).max(128)
        }
        FileKind::Binary | FileKind::Text => random_skewed_u64(rng, MAX_GENERIC_BYTES),
    }
}

/// Builds a detached node from its seed.
///
/// Attributes, size, timestamps and the planned child count are all drawn
/// from an RNG keyed on `seed` alone, so the node is reproducible anywhere
/// in the tree.
pub(crate) fn create_node(
    params: &GeneratorParams,
    name: &str,
    is_directory: bool,
    seed: u64,
) -> Node {
    let mut rng = Mt19937::from_seed(seed);

    let mut attributes = if is_directory {
        Attributes::DIRECTORY
    } else {
        Attributes::ARCHIVE
    };

    if random_chance(&mut rng, 1, 8) {
        attributes |= Attributes::READONLY;
    }
    if random_chance(&mut rng, 1, 10) {
        attributes |= Attributes::HIDDEN;
    }

    let size_bytes = if is_directory {
        0
    } else {
        random_file_size(&mut rng, file_kind(name))
    };

    const MAX_OFFSET_SECONDS: u64 = 60 * 60 * 24 * 365 * 3;

    let base = params.generation_base_time;
    let offset_seconds = random_range_u64(&mut rng, 0, MAX_OFFSET_SECONDS);

    #[allow(clippy::cast_possible_wrap)]
    let offset_ticks = (offset_seconds * crate::time::TICKS_PER_SECOND) as i64;
    let timestamp = if offset_ticks < base {
        base - offset_ticks
    } else {
        base
    };

    let planned_child_count = if is_directory {
        random_skewed(&mut rng, params.max_children_per_directory)
    } else {
        0
    };

    Node {
        name: name.to_owned(),
        is_directory,
        attributes,
        size_bytes,
        creation: timestamp,
        last_access: timestamp,
        last_write: timestamp,
        change: timestamp,
        generation_seed: seed,
        planned_child_count,
        children_generated: false,
        materialized_content: None,
        parent: None,
        children: Vec::new(),
    }
}

impl Forest {
    /// Generates the children of a directory on first expansion.
    ///
    /// Idempotent; the `children_generated` latch only ever flips once.
    pub fn ensure_children(&mut self, params: &GeneratorParams, id: NodeId) {
        {
            let node = self.node(id);
            if !node.is_directory || node.children_generated {
                return;
            }
        }

        self.generate_children(params, id);
    }

    fn generate_children(&mut self, params: &GeneratorParams, id: NodeId) {
        let seed = self.node(id).generation_seed;
        let mut rng = Mt19937::from_seed(seed);

        let total = {
            let node = self.node_mut(id);
            node.children_generated = true;
            node.children.clear();
            node.planned_child_count
        };

        if total == 0 {
            return;
        }

        let depth = self.depth(id);
        let is_root = self.node(id).parent.is_none();
        let allow_subdirectories = params.max_depth == 0 || depth < params.max_depth;

        let mut max_dirs = if allow_subdirectories { total / 2 } else { 0 };
        if is_root && allow_subdirectories && total > 1 && max_dirs == 0 {
            max_dirs = 1;
        }
        if total > 0 && max_dirs > total - 1 {
            // Keep at least one file in every populated directory.
            max_dirs = total - 1;
        }

        let mut dir_count = if max_dirs > 0 {
            random_skewed(&mut rng, max_dirs)
        } else {
            0
        };
        if is_root && allow_subdirectories && total > 1 && dir_count == 0 {
            dir_count = 1;
        }
        let file_count = total - dir_count;

        log::trace!(
            "generating {total} children below {:?} ({dir_count} dirs, {file_count} files)",
            self.node(id).name
        );

        for index in 0..dir_count {
            let suffix = format!("_{index:05}");
            let name = compose_name(&mut rng, &suffix, None, "folder");

            let child_seed = derive_child_seed(seed, index, true);
            let child = create_node(params, &name, true, child_seed);
            let child_id = self.alloc(child);
            self.node_mut(child_id).parent = Some(id);
            self.node_mut(id).children.push(child_id);
        }

        for index in 0..file_count {
            let child_index = dir_count + index;
            let extension = random_extension(&mut rng);

            let suffix = format!("_{child_index:05}");
            let name = compose_name(&mut rng, &suffix, Some(extension), "file");

            let child_seed = derive_child_seed(seed, child_index, false);
            let child = create_node(params, &name, false, child_seed);
            let child_id = self.alloc(child);
            self.node_mut(child_id).parent = Some(id);
            self.node_mut(id).children.push(child_id);
        }

        #[allow(clippy::cast_possible_truncation)]
        {
            let node = self.node_mut(id);
            node.planned_child_count = node.children.len() as u32;
        }
    }
}

fn compose_name(
    rng: &mut Mt19937,
    suffix: &str,
    extension: Option<&str>,
    fallback: &str,
) -> String {
    let mut base = random_base_name(rng);
    if !is_name_valid(&base) {
        base = fallback.to_owned();
    }

    let reserved = suffix.len() + extension.map_or(0, utf16_len);
    if utf16_len(&base) + reserved > MAX_NAME_UTF16 && MAX_NAME_UTF16 > reserved {
        trim_to_utf16(&mut base, MAX_NAME_UTF16 - reserved);
    }
    if base.is_empty() {
        base = fallback.to_owned();
    }

    let mut name = base;
    name.push_str(suffix);
    if let Some(extension) = extension {
        name.push_str(extension);
    }
    name
}
