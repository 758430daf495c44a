// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Reader flavors over file nodes.
//!
//! Readers differ only in how bytes are produced, so they are one tagged
//! enum dispatching a common trait: generated-on-demand content, an owned
//! buffer (PNG/JPEG encodings), or a buffer shared with the node after a
//! writer commit.

use crate::{
    format::{
        self,
        fill::{fill_byte, FillKind},
        jpeg::generate_jpeg,
        png::generate_png,
        text::build_template,
        FileKind, FileSnapshot,
    },
    rng::splitmix64,
    Error,
};
use enum_dispatch::enum_dispatch;
use std::sync::Arc;

/// Where a seek offset is measured from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SeekOrigin {
    /// Start of the stream.
    Begin,

    /// Current position.
    Current,

    /// End of the stream.
    End,
}

/// Random-access byte stream over a file.
#[enum_dispatch]
pub trait RandomAccess {
    /// Logical size in bytes.
    fn size(&self) -> u64;

    /// Moves the cursor and returns the new absolute position.
    ///
    /// Positions past the end are legal; reads there yield zero bytes.
    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> crate::Result<u64>;

    /// Reads up to `buffer.len()` bytes; returns the count actually read.
    fn read(&mut self, buffer: &mut [u8]) -> crate::Result<usize>;
}

fn seek_position(position: u64, total: u64, offset: i64, origin: SeekOrigin) -> crate::Result<u64> {
    #[allow(clippy::cast_possible_wrap)]
    let base = match origin {
        SeekOrigin::Begin => 0,
        SeekOrigin::Current => position as i64,
        SeekOrigin::End => total as i64,
    };

    let next = base.checked_add(offset).ok_or(Error::ArithmeticOverflow)?;
    if next < 0 {
        return Err(Error::NegativeSeek);
    }

    #[allow(clippy::cast_sign_loss)]
    Ok(next as u64)
}

/// Reader that synthesizes its bytes on demand.
pub struct GeneratedReader {
    prefix: Vec<u8>,
    suffix: Vec<u8>,
    body_bytes: u64,
    seed: u64,
    fill_kind: FillKind,
    position: u64,
}

impl GeneratedReader {
    /// Builds a reader over `prefix + body + suffix`.
    #[must_use]
    pub fn new(
        prefix: Vec<u8>,
        suffix: Vec<u8>,
        body_bytes: u64,
        seed: u64,
        fill_kind: FillKind,
    ) -> Self {
        Self {
            prefix,
            suffix,
            body_bytes,
            seed,
            fill_kind,
            position: 0,
        }
    }
}

impl RandomAccess for GeneratedReader {
    fn size(&self) -> u64 {
        self.prefix.len() as u64 + self.body_bytes + self.suffix.len() as u64
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> crate::Result<u64> {
        self.position = seek_position(self.position, self.size(), offset, origin)?;
        Ok(self.position)
    }

    fn read(&mut self, buffer: &mut [u8]) -> crate::Result<usize> {
        let total = self.size();
        if self.position >= total || buffer.is_empty() {
            return Ok(0);
        }

        let remaining = total - self.position;

        #[allow(clippy::cast_possible_truncation)]
        let take = (buffer.len() as u64).min(remaining) as usize;

        let prefix_bytes = self.prefix.len() as u64;
        let body_end = prefix_bytes + self.body_bytes;

        let mut written = 0usize;
        while written < take {
            let absolute = self.position + written as u64;

            if absolute < prefix_bytes {
                #[allow(clippy::cast_possible_truncation)]
                let offset = absolute as usize;
                let available = self.prefix.len() - offset;
                let want = available.min(take - written);

                if let (Some(dst), Some(src)) = (
                    buffer.get_mut(written..written + want),
                    self.prefix.get(offset..offset + want),
                ) {
                    dst.copy_from_slice(src);
                }
                written += want;
                continue;
            }

            if absolute < body_end {
                let body_pos = absolute - prefix_bytes;
                if let Some(slot) = buffer.get_mut(written) {
                    *slot = fill_byte(self.fill_kind, self.seed, body_pos);
                }
                written += 1;
                continue;
            }

            let suffix_pos = absolute - body_end;
            if suffix_pos >= self.suffix.len() as u64 {
                break;
            }

            #[allow(clippy::cast_possible_truncation)]
            let offset = suffix_pos as usize;
            let available = self.suffix.len() - offset;
            let want = available.min(take - written);

            if let (Some(dst), Some(src)) = (
                buffer.get_mut(written..written + want),
                self.suffix.get(offset..offset + want),
            ) {
                dst.copy_from_slice(src);
            }
            written += want;
        }

        self.position += take as u64;
        Ok(take)
    }
}

fn read_from_slice(bytes: &[u8], position: &mut u64, buffer: &mut [u8]) -> usize {
    let total = bytes.len() as u64;
    if *position >= total || buffer.is_empty() {
        return 0;
    }

    #[allow(clippy::cast_possible_truncation)]
    let offset = *position as usize;

    #[allow(clippy::cast_possible_truncation)]
    let take = (buffer.len() as u64).min(total - *position) as usize;

    if let (Some(dst), Some(src)) = (buffer.get_mut(..take), bytes.get(offset..offset + take)) {
        dst.copy_from_slice(src);
    }

    *position += take as u64;
    take
}

/// Reader over an owned byte buffer.
pub struct BufferReader {
    bytes: Vec<u8>,
    position: u64,
}

impl BufferReader {
    /// Takes ownership of the encoded bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, position: 0 }
    }
}

impl RandomAccess for BufferReader {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> crate::Result<u64> {
        self.position = seek_position(self.position, self.size(), offset, origin)?;
        Ok(self.position)
    }

    fn read(&mut self, buffer: &mut [u8]) -> crate::Result<usize> {
        Ok(read_from_slice(&self.bytes, &mut self.position, buffer))
    }
}

/// Reader over a buffer shared with the node's materialized content.
pub struct SharedBufferReader {
    bytes: Arc<Vec<u8>>,
    position: u64,
}

impl SharedBufferReader {
    /// Shares the node's committed content.
    #[must_use]
    pub fn new(bytes: Arc<Vec<u8>>) -> Self {
        Self { bytes, position: 0 }
    }
}

impl RandomAccess for SharedBufferReader {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> crate::Result<u64> {
        self.position = seek_position(self.position, self.size(), offset, origin)?;
        Ok(self.position)
    }

    fn read(&mut self, buffer: &mut [u8]) -> crate::Result<usize> {
        Ok(read_from_slice(&self.bytes, &mut self.position, buffer))
    }
}

/// A reader over a file, in one of three flavors.
#[enum_dispatch(RandomAccess)]
pub enum Reader {
    /// Content synthesized on demand.
    Generated(GeneratedReader),

    /// Owned encoded buffer.
    Buffer(BufferReader),

    /// Buffer shared with the node.
    Shared(SharedBufferReader),
}

impl Reader {
    /// Reads everything from the current position to the end.
    pub fn read_to_end(&mut self) -> crate::Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut chunk = [0u8; 64 * 1024];

        loop {
            let got = self.read(&mut chunk)?;
            if got == 0 {
                return Ok(out);
            }
            out.extend_from_slice(chunk.get(..got).unwrap_or_default());
        }
    }
}

/// Builds the reader for a file without materialized content.
///
/// PNG and JPEG encodings that cannot hit the exact target size fall back to
/// raw binary, so the reader length always equals the node size.
#[must_use]
pub(crate) fn reader_for_snapshot(snapshot: &FileSnapshot) -> Reader {
    let kind = format::file_kind(&snapshot.name);
    let file_seed = format::content_seed(snapshot);
    let kind_seed = splitmix64(file_seed.wrapping_add(kind.seed_salt()));

    match kind {
        FileKind::Png => {
            if let Some(png) = generate_png(kind_seed, snapshot.size_bytes) {
                return Reader::Buffer(BufferReader::new(png));
            }
        }
        FileKind::Jpeg => {
            if let Some(jpeg) = generate_jpeg(kind_seed, snapshot.size_bytes) {
                return Reader::Buffer(BufferReader::new(jpeg));
            }
        }
        _ => {}
    }

    let fill_seed = splitmix64(kind_seed ^ 0xD00D_FEED);

    match kind {
        FileKind::Binary | FileKind::Zip | FileKind::Png | FileKind::Jpeg => Reader::Generated(
            GeneratedReader::new(Vec::new(), Vec::new(), snapshot.size_bytes, fill_seed, FillKind::Binary),
        ),
        _ => {
            let template = build_template(kind, snapshot, file_seed);
            Reader::Generated(GeneratedReader::new(
                template.prefix,
                template.suffix,
                template.body_bytes,
                fill_seed,
                template.fill_kind,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attributes;
    use test_log::test;

    fn generated(body: u64) -> Reader {
        Reader::Generated(GeneratedReader::new(
            b"HEAD".to_vec(),
            b"TAIL".to_vec(),
            body,
            77,
            FillKind::PlainText,
        ))
    }

    #[test]
    fn size_spans_all_regions() {
        let reader = generated(100);
        assert_eq!(108, reader.size());
    }

    #[test]
    fn read_spans_prefix_body_suffix() -> crate::Result<()> {
        let mut reader = generated(8);

        let bytes = reader.read_to_end()?;
        assert_eq!(16, bytes.len());
        assert_eq!(b"HEAD", &bytes[..4]);
        assert_eq!(b"TAIL", &bytes[12..]);

        Ok(())
    }

    #[test]
    fn seek_contract() -> crate::Result<()> {
        let mut reader = generated(8);

        assert_eq!(16, reader.seek(0, SeekOrigin::End)?);
        assert_eq!(6, reader.seek(6, SeekOrigin::Begin)?);
        assert_eq!(8, reader.seek(2, SeekOrigin::Current)?);

        assert_eq!(Err(Error::NegativeSeek), reader.seek(-1, SeekOrigin::Begin));

        // Seeking past the end succeeds; reading there yields nothing.
        assert_eq!(100, reader.seek(100, SeekOrigin::Begin)?);
        let mut buffer = [0u8; 8];
        assert_eq!(0, reader.read(&mut buffer)?);

        Ok(())
    }

    #[test]
    fn piecewise_read_equals_bulk_read() -> crate::Result<()> {
        let mut bulk = generated(200);
        let expected = bulk.read_to_end()?;

        let mut piecewise = generated(200);
        let mut collected = Vec::new();
        let mut tiny = [0u8; 7];
        loop {
            let got = piecewise.read(&mut tiny)?;
            if got == 0 {
                break;
            }
            collected.extend_from_slice(&tiny[..got]);
        }

        assert_eq!(expected, collected);
        Ok(())
    }

    #[test]
    fn buffer_flavors_agree() -> crate::Result<()> {
        let bytes = vec![1u8, 2, 3, 4, 5];

        let mut owned = Reader::Buffer(BufferReader::new(bytes.clone()));
        let mut shared = Reader::Shared(SharedBufferReader::new(Arc::new(bytes.clone())));

        assert_eq!(bytes, owned.read_to_end()?);
        assert_eq!(bytes, shared.read_to_end()?);
        assert_eq!(owned.size(), shared.size());

        Ok(())
    }

    #[test]
    fn snapshot_reader_length_matches_size() -> crate::Result<()> {
        for (name, size) in [
            ("body.txt", 4_096u64),
            ("tiny.txt", 5),
            ("data.json", 1_000),
            ("image.png", 8_000),
            ("image.png", 64), // falls back to raw binary
            ("photo.jpg", 9_000),
            ("blob.bin", 1_234),
            ("pack.zip", 400),
        ] {
            let snapshot = FileSnapshot {
                name: name.into(),
                attributes: Attributes::ARCHIVE,
                size_bytes: size,
                creation: 133_500_000_000_000_000,
                generation_seed: 4_242,
            };

            let mut reader = reader_for_snapshot(&snapshot);
            assert_eq!(size, reader.size(), "{name} at {size}");
            assert_eq!(size as usize, reader.read_to_end()?.len(), "{name} at {size}");
        }

        Ok(())
    }
}
