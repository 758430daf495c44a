// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Minimal PNG encoder for synthetic images.
//!
//! Emits a valid 32×32 truecolor image whose IDAT holds a single stored
//! (uncompressed) deflate block, then pads the file to the exact target size
//! with a private `pAdd` chunk. Image viewers accept the file, and its byte
//! length matches the node's `size_bytes` precisely.

use super::fill::{fill_byte, FillKind};
use crate::rng::splitmix64;
use byteorder::{BigEndian, WriteBytesExt};

const WIDTH: u32 = 32;
const HEIGHT: u32 = 32;

/// Size of signature + IHDR + IDAT for the fixed image, without IEND.
const BASE_BYTES: u64 = 3_160;

/// Smallest representable PNG (base + IEND).
pub const MIN_PNG_BYTES: u64 = BASE_BYTES + 12;

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const ADLER_MOD: u32 = 65_521;

fn append_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    #[allow(clippy::cast_possible_truncation)]
    let length = data.len() as u32;

    #[allow(clippy::expect_used)]
    out.write_u32::<BigEndian>(length).expect("vec write");
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);

    #[allow(clippy::expect_used)]
    out.write_u32::<BigEndian>(hasher.finalize())
        .expect("vec write");
}

/// Encodes a PNG of exactly `target_bytes` bytes.
///
/// Returns `None` when the target is too small to hold the base image plus
/// padding, in which case the caller falls back to raw binary content.
#[must_use]
pub fn generate_png(seed: u64, target_bytes: u64) -> Option<Vec<u8>> {
    if target_bytes < MIN_PNG_BYTES {
        return None;
    }

    let mut adler_a: u32 = 1;
    let mut adler_b: u32 = 0;
    let mut update_adler = |byte: u8| {
        adler_a += u32::from(byte);
        if adler_a >= ADLER_MOD {
            adler_a -= ADLER_MOD;
        }
        adler_b = (adler_b + adler_a) % ADLER_MOD;
    };

    // Filter byte 0 plus 3 channel bytes per pixel, per scanline.
    let raw_len = (1 + WIDTH as usize * 3) * HEIGHT as usize;
    let mut raw = Vec::with_capacity(raw_len);

    for y in 0..HEIGHT {
        raw.push(0u8);
        update_adler(0);

        for x in 0..WIDTH {
            let v = splitmix64(seed.wrapping_add((u64::from(y) << 32) + u64::from(x)));

            #[allow(clippy::cast_possible_truncation)]
            let (r, g, b) = ((v & 0xFF) as u8, ((v >> 8) & 0xFF) as u8, ((v >> 16) & 0xFF) as u8);

            raw.push(r);
            raw.push(g);
            raw.push(b);
            update_adler(r);
            update_adler(g);
            update_adler(b);
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    let raw_len16 = raw.len() as u16;
    let nlen = !raw_len16;
    let adler = (adler_b << 16) | adler_a;

    let mut zlib = Vec::with_capacity(2 + 5 + raw.len() + 4);
    zlib.push(0x78);
    zlib.push(0x01);
    zlib.push(0x01); // BFINAL=1, BTYPE=00 (stored)
    zlib.extend_from_slice(&raw_len16.to_le_bytes());
    zlib.extend_from_slice(&nlen.to_le_bytes());
    zlib.extend_from_slice(&raw);

    #[allow(clippy::expect_used)]
    zlib.write_u32::<BigEndian>(adler).expect("vec write");

    #[allow(clippy::cast_possible_truncation)]
    let mut out = Vec::with_capacity(target_bytes as usize);
    out.extend_from_slice(&SIGNATURE);

    let mut ihdr = Vec::with_capacity(13);

    #[allow(clippy::expect_used)]
    {
        ihdr.write_u32::<BigEndian>(WIDTH).expect("vec write");
        ihdr.write_u32::<BigEndian>(HEIGHT).expect("vec write");
    }
    ihdr.push(8); // bit depth
    ihdr.push(2); // color type: truecolor
    ihdr.push(0); // compression
    ihdr.push(0); // filter
    ihdr.push(0); // interlace

    append_chunk(&mut out, b"IHDR", &ihdr);
    append_chunk(&mut out, b"IDAT", &zlib);

    let size_with_iend = out.len() as u64 + 12;
    if target_bytes < size_with_iend {
        return None;
    }

    let padding_bytes = target_bytes - size_with_iend;
    if padding_bytes > 0 {
        // A chunk needs 12 bytes of framing; smaller gaps are unfillable.
        if padding_bytes < 12 {
            return None;
        }

        let data_bytes = padding_bytes - 12;
        if data_bytes > u64::from(u32::MAX) {
            return None;
        }

        #[allow(clippy::cast_possible_truncation)]
        let mut padding = vec![0u8; data_bytes as usize];
        for (index, byte) in padding.iter_mut().enumerate() {
            *byte = fill_byte(FillKind::Binary, seed ^ 0xA5A5_A5A5, index as u64);
        }

        append_chunk(&mut out, b"pAdd", &padding);
    }

    append_chunk(&mut out, b"IEND", &[]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn exact_target_length() {
        for target in [MIN_PNG_BYTES, MIN_PNG_BYTES + 12, 4_096, 100_000] {
            let png = generate_png(7, target).expect("target is representable");
            assert_eq!(target, png.len() as u64, "target {target}");
        }
    }

    #[test]
    fn rejects_unrepresentable_sizes() {
        assert!(generate_png(7, 0).is_none());
        assert!(generate_png(7, MIN_PNG_BYTES - 1).is_none());
        // An 11-byte gap cannot hold a padding chunk.
        assert!(generate_png(7, MIN_PNG_BYTES + 11).is_none());
    }

    #[test]
    fn signature_and_chunk_order() {
        let png = generate_png(42, 4_096).expect("representable");

        assert_eq!(&SIGNATURE, &png[..8]);
        assert_eq!(b"IHDR", &png[12..16]);
        assert_eq!(b"IEND", &png[png.len() - 8..png.len() - 4]);

        // pAdd sits between IDAT and IEND.
        let pos = png
            .windows(4)
            .position(|w| w == b"pAdd")
            .expect("padding chunk present");
        assert!(pos > 16);
    }

    #[test]
    fn deterministic_per_seed() {
        let a = generate_png(1, 4_000).expect("representable");
        let b = generate_png(1, 4_000).expect("representable");
        let c = generate_png(2, 4_000).expect("representable");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
