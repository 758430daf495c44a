// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Enumerated-directory wire buffer.
//!
//! `read_directory` returns one contiguous buffer of variable-length
//! entries, the layout hosts consume across the plugin boundary. Fields are
//! little-endian, entries are aligned to 4 bytes, names are UTF-16LE with a
//! terminating NUL.

use crate::{attributes::Attributes, time::Ticks, Error};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

const ENTRY_ALIGNMENT: usize = 4;

/// Fixed part of an entry, before the name bytes.
const ENTRY_HEADER_BYTES: usize = 4 * 4 + 6 * 8;

const ALLOCATION_GRANULARITY: u64 = 4_096;

fn align_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) / alignment * alignment
}

/// Snapshot of one child taken under the tree lock.
#[derive(Clone, Debug)]
pub(crate) struct EntryRecord {
    pub name: String,
    pub attributes: Attributes,
    pub size_bytes: u64,
    pub creation: Ticks,
    pub last_access: Ticks,
    pub last_write: Ticks,
    pub change: Ticks,
}

/// One decoded directory entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirectoryEntry {
    /// Stable index of the entry within its enumeration.
    pub file_index: u32,

    /// Attribute bit set.
    pub attributes: Attributes,

    /// Creation timestamp.
    pub creation: Ticks,

    /// Last access timestamp.
    pub last_access: Ticks,

    /// Last write timestamp.
    pub last_write: Ticks,

    /// Last metadata change timestamp.
    pub change: Ticks,

    /// Logical size in bytes.
    pub size_bytes: u64,

    /// Size rounded up to the allocation granularity.
    pub allocation_size: i64,

    /// Entry name.
    pub name: String,
}

impl DirectoryEntry {
    /// Returns `true` if the entry is a directory.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.attributes.contains(Attributes::DIRECTORY)
    }
}

/// The result of one directory enumeration.
pub struct DirectoryInfo {
    buffer: Vec<u8>,
    count: u32,
}

impl DirectoryInfo {
    pub(crate) fn build(records: &[EntryRecord]) -> crate::Result<Self> {
        if records.is_empty() {
            return Ok(Self {
                buffer: Vec::new(),
                count: 0,
            });
        }

        let mut total = 0usize;
        for record in records {
            let name_units = record.name.encode_utf16().count();
            let name_bytes = name_units
                .checked_mul(2)
                .ok_or(Error::ArithmeticOverflow)?;

            let entry_size = align_up(ENTRY_HEADER_BYTES + name_bytes + 2, ENTRY_ALIGNMENT);
            total = total
                .checked_add(entry_size)
                .ok_or(Error::ArithmeticOverflow)?;
        }

        if total > u32::MAX as usize {
            return Err(Error::ArithmeticOverflow);
        }

        let mut buffer = Vec::with_capacity(total);

        for (index, record) in records.iter().enumerate() {
            let name_units: Vec<u16> = record.name.encode_utf16().collect();
            let name_bytes = name_units.len() * 2;
            let entry_size = align_up(ENTRY_HEADER_BYTES + name_bytes + 2, ENTRY_ALIGNMENT);

            let next_offset = if index + 1 < records.len() {
                entry_size
            } else {
                0
            };

            let mut allocation = record.size_bytes;
            if allocation > 0 {
                allocation = allocation
                    .div_ceil(ALLOCATION_GRANULARITY)
                    .saturating_mul(ALLOCATION_GRANULARITY);
            }

            #[allow(clippy::cast_sign_loss)]
            let allocation = allocation.min(i64::MAX as u64);

            let before = buffer.len();

            #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
            {
                buffer
                    .write_u32::<LittleEndian>(next_offset as u32)
                    .expect("vec write");
                buffer
                    .write_u32::<LittleEndian>(index as u32)
                    .expect("vec write");
                buffer
                    .write_u32::<LittleEndian>(record.attributes.bits())
                    .expect("vec write");
                buffer
                    .write_u32::<LittleEndian>(name_bytes as u32)
                    .expect("vec write");
                buffer
                    .write_i64::<LittleEndian>(record.creation)
                    .expect("vec write");
                buffer
                    .write_i64::<LittleEndian>(record.last_access)
                    .expect("vec write");
                buffer
                    .write_i64::<LittleEndian>(record.last_write)
                    .expect("vec write");
                buffer
                    .write_i64::<LittleEndian>(record.change)
                    .expect("vec write");
                buffer
                    .write_i64::<LittleEndian>(record.size_bytes as i64)
                    .expect("vec write");
                buffer
                    .write_i64::<LittleEndian>(allocation as i64)
                    .expect("vec write");

                for unit in &name_units {
                    buffer.write_u16::<LittleEndian>(*unit).expect("vec write");
                }
                buffer.write_u16::<LittleEndian>(0).expect("vec write");
            }

            // Pad to alignment.
            while buffer.len() - before < entry_size {
                buffer.push(0);
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        Ok(Self {
            buffer,
            count: records.len() as u32,
        })
    }

    /// Number of entries.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The raw wire buffer.
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Bytes used by the wire buffer.
    #[must_use]
    pub fn used_bytes(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        {
            self.buffer.len() as u32
        }
    }

    /// Decodes the entry at `index`.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<DirectoryEntry> {
        self.entries().nth(index as usize)
    }

    /// Iterates all entries in buffer order.
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            buffer: &self.buffer,
            offset: Some(0),
        }
    }
}

/// Iterator over decoded wire-buffer entries.
pub struct Entries<'a> {
    buffer: &'a [u8],
    offset: Option<usize>,
}

impl Iterator for Entries<'_> {
    type Item = DirectoryEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offset?;
        let entry = self.buffer.get(offset..)?;

        if entry.len() < ENTRY_HEADER_BYTES {
            self.offset = None;
            return None;
        }

        let next_offset = LittleEndian::read_u32(entry.get(0..4)?) as usize;
        let file_index = LittleEndian::read_u32(entry.get(4..8)?);
        let attributes = Attributes::from_raw(LittleEndian::read_u32(entry.get(8..12)?));
        let name_bytes = LittleEndian::read_u32(entry.get(12..16)?) as usize;
        let creation = LittleEndian::read_i64(entry.get(16..24)?);
        let last_access = LittleEndian::read_i64(entry.get(24..32)?);
        let last_write = LittleEndian::read_i64(entry.get(32..40)?);
        let change = LittleEndian::read_i64(entry.get(40..48)?);
        let end_of_file = LittleEndian::read_i64(entry.get(48..56)?);
        let allocation_size = LittleEndian::read_i64(entry.get(56..64)?);

        let name_data = entry.get(ENTRY_HEADER_BYTES..ENTRY_HEADER_BYTES + name_bytes)?;
        let units: Vec<u16> = name_data
            .chunks_exact(2)
            .map(LittleEndian::read_u16)
            .collect();
        let name = String::from_utf16_lossy(&units);

        self.offset = if next_offset == 0 {
            None
        } else {
            Some(offset + next_offset)
        };

        #[allow(clippy::cast_sign_loss)]
        Some(DirectoryEntry {
            file_index,
            attributes,
            creation,
            last_access,
            last_write,
            change,
            size_bytes: end_of_file as u64,
            allocation_size,
            name,
        })
    }
}
