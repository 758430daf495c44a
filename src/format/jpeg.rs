// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Minimal baseline JPEG encoder for synthetic images.
//!
//! Emits a 64×64 grayscale image: flat 8×8 blocks whose DC level is drawn
//! from the seed, AC always end-of-block, using the standard luminance
//! Huffman tables. The file is padded to the exact target size with COM
//! segments placed right after APP0.

use super::fill::{fill_byte, FillKind};
use crate::rng::splitmix64;
use byteorder::{BigEndian, WriteBytesExt};

const WIDTH: u16 = 64;
const HEIGHT: u16 = 64;

const DC_COUNTS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
const DC_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

const AC_COUNTS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7D];
const AC_VALUES: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61,
    0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xA1, 0x08, 0x23, 0x42, 0xB1, 0xC1, 0x15, 0x52,
    0xD1, 0xF0, 0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0A, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x25,
    0x26, 0x27, 0x28, 0x29, 0x2A, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x43, 0x44, 0x45,
    0x46, 0x47, 0x48, 0x49, 0x4A, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5A, 0x63, 0x64,
    0x65, 0x66, 0x67, 0x68, 0x69, 0x6A, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7A, 0x83,
    0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99,
    0x9A, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6,
    0xB7, 0xB8, 0xB9, 0xBA, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xD2, 0xD3,
    0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8,
    0xE9, 0xEA, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA,
];

const JFIF: [u8; 14] = [
    b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00,
];

struct HuffmanTable {
    codes: [u16; 256],
    sizes: [u8; 256],
}

fn build_huffman_table(counts: &[u8; 16], values: &[u8]) -> HuffmanTable {
    let mut table = HuffmanTable {
        codes: [0; 256],
        sizes: [0; 256],
    };

    let mut code: u16 = 0;
    let mut index = 0usize;

    for (bit_count, &count) in counts.iter().enumerate() {
        for _ in 0..count {
            let Some(&symbol) = values.get(index) else {
                break;
            };
            index += 1;

            table.codes[usize::from(symbol)] = code;

            #[allow(clippy::cast_possible_truncation)]
            {
                table.sizes[usize::from(symbol)] = bit_count as u8 + 1;
            }
            code = code.wrapping_add(1);
        }
        code <<= 1;
    }

    table
}

#[derive(Default)]
struct BitWriter {
    bytes: Vec<u8>,
    bit_buffer: u32,
    bit_count: u8,
}

impl BitWriter {
    fn write_bits(&mut self, bits: u16, bit_count: u8) {
        if bit_count == 0 {
            return;
        }

        let mask = if bit_count >= 32 {
            u32::MAX
        } else {
            (1u32 << bit_count) - 1
        };

        self.bit_buffer = (self.bit_buffer << bit_count) | (u32::from(bits) & mask);
        self.bit_count += bit_count;

        while self.bit_count >= 8 {
            #[allow(clippy::cast_possible_truncation)]
            let byte = ((self.bit_buffer >> (self.bit_count - 8)) & 0xFF) as u8;
            self.bytes.push(byte);

            // 0xFF inside the entropy stream needs a zero stuffing byte.
            if byte == 0xFF {
                self.bytes.push(0x00);
            }

            self.bit_count -= 8;
            if self.bit_count == 0 {
                self.bit_buffer = 0;
            } else {
                self.bit_buffer &= (1u32 << self.bit_count) - 1;
            }
        }
    }

    fn flush_with_ones(&mut self) {
        if self.bit_count == 0 {
            return;
        }

        let bits = self.bit_buffer & ((1u32 << self.bit_count) - 1);
        let pad_bits = 8 - self.bit_count;
        let pad_mask = (1u32 << pad_bits) - 1;

        #[allow(clippy::cast_possible_truncation)]
        let byte = (((bits << pad_bits) | pad_mask) & 0xFF) as u8;

        self.bytes.push(byte);
        if byte == 0xFF {
            self.bytes.push(0x00);
        }

        self.bit_buffer = 0;
        self.bit_count = 0;
    }
}

fn write_marker(out: &mut Vec<u8>, marker: u8) {
    out.push(0xFF);
    out.push(marker);
}

fn write_u16(out: &mut Vec<u8>, value: u16) {
    #[allow(clippy::expect_used)]
    out.write_u16::<BigEndian>(value).expect("vec write");
}

/// Encodes a JPEG of exactly `target_bytes` bytes.
///
/// Returns `None` when the entropy-coded image alone already exceeds the
/// target, in which case the caller falls back to raw binary content.
#[must_use]
pub fn generate_jpeg(seed: u64, target_bytes: u64) -> Option<Vec<u8>> {
    let dc_table = build_huffman_table(&DC_COUNTS, &DC_VALUES);
    let ac_table = build_huffman_table(&AC_COUNTS, &AC_VALUES);

    let mut writer = BitWriter::default();
    let mut previous_dc: i32 = 0;

    for by in 0..u32::from(HEIGHT / 8) {
        for bx in 0..u32::from(WIDTH / 8) {
            let v = splitmix64(seed.wrapping_add((u64::from(by) << 32) + u64::from(bx)));

            #[allow(clippy::cast_possible_truncation)]
            let pixel = (v & 0xFF) as u8;

            let dc = (i32::from(pixel) - 128) * 8;
            let diff = dc - previous_dc;
            previous_dc = dc;

            let mut magnitude = diff.unsigned_abs();
            let mut category: u8 = 0;
            while magnitude != 0 {
                magnitude >>= 1;
                category += 1;
            }

            writer.write_bits(
                dc_table.codes[usize::from(category)],
                dc_table.sizes[usize::from(category)],
            );

            if category > 0 {
                let base = if diff >= 0 {
                    diff
                } else {
                    diff + (1 << category) - 1
                };

                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                writer.write_bits(base as u16, category);
            }

            // AC: end of block.
            writer.write_bits(ac_table.codes[0x00], ac_table.sizes[0x00]);
        }
    }

    writer.flush_with_ones();

    let mut base = Vec::with_capacity(1_024 + writer.bytes.len());

    write_marker(&mut base, 0xD8); // SOI

    // APP0 JFIF
    write_marker(&mut base, 0xE0);
    write_u16(&mut base, 16);
    base.extend_from_slice(&JFIF);

    // DQT, one table, all 8s
    write_marker(&mut base, 0xDB);
    write_u16(&mut base, 67);
    base.push(0x00);
    base.extend(std::iter::repeat_n(8u8, 64));

    // SOF0, baseline grayscale
    write_marker(&mut base, 0xC0);
    write_u16(&mut base, 11);
    base.push(8);
    write_u16(&mut base, HEIGHT);
    write_u16(&mut base, WIDTH);
    base.push(1); // components
    base.push(1); // component id
    base.push(0x11); // sampling
    base.push(0); // quant table

    // DHT, DC + AC luminance
    write_marker(&mut base, 0xC4);

    #[allow(clippy::cast_possible_truncation)]
    write_u16(
        &mut base,
        (2 + (1 + 16 + DC_VALUES.len()) + (1 + 16 + AC_VALUES.len())) as u16,
    );
    base.push(0x00);
    base.extend_from_slice(&DC_COUNTS);
    base.extend_from_slice(&DC_VALUES);
    base.push(0x10);
    base.extend_from_slice(&AC_COUNTS);
    base.extend_from_slice(&AC_VALUES);

    // SOS
    write_marker(&mut base, 0xDA);
    write_u16(&mut base, 8);
    base.push(1); // components
    base.push(1); // component id
    base.push(0x00); // DC=0, AC=0
    base.push(0); // Ss
    base.push(63); // Se
    base.push(0); // AhAl

    let base_without_com = base.len() as u64 + writer.bytes.len() as u64 + 2;
    if target_bytes < base_without_com {
        return None;
    }

    let mut remaining = target_bytes - base_without_com;

    #[allow(clippy::cast_possible_truncation)]
    let mut out = Vec::with_capacity(target_bytes as usize);

    // SOI + APP0 first, COM padding next, then the remaining segments.
    let app0_end = 2 + 2 + 2 + JFIF.len();
    out.extend_from_slice(base.get(..app0_end)?);

    while remaining > 0 {
        let segment_total = remaining.min(65_537);
        if segment_total < 4 {
            // An unfillable gap of 1..3 bytes; give up and fall back.
            break;
        }

        let data_len = segment_total - 4;

        write_marker(&mut out, 0xFE); // COM

        #[allow(clippy::cast_possible_truncation)]
        write_u16(&mut out, (data_len + 2) as u16);

        for index in 0..data_len {
            out.push(fill_byte(FillKind::Binary, seed ^ 0xC3C3_C3C3, index));
        }

        remaining -= segment_total;
    }

    out.extend_from_slice(base.get(app0_end..)?);
    out.extend_from_slice(&writer.bytes);
    write_marker(&mut out, 0xD9); // EOI

    if out.len() as u64 != target_bytes {
        return None;
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn exact_target_length() {
        for target in [4_096u64, 10_000, 70_000, 200_000] {
            let jpeg = generate_jpeg(11, target).expect("target is representable");
            assert_eq!(target, jpeg.len() as u64, "target {target}");
        }
    }

    #[test]
    fn starts_with_soi_ends_with_eoi() {
        let jpeg = generate_jpeg(5, 8_192).expect("representable");
        assert_eq!([0xFF, 0xD8], jpeg[..2]);
        assert_eq!([0xFF, 0xD9], jpeg[jpeg.len() - 2..]);
    }

    #[test]
    fn com_padding_sits_after_app0() {
        let jpeg = generate_jpeg(5, 8_192).expect("representable");
        // SOI (2) + APP0 marker (2) + length (2) + JFIF payload (14) = 20.
        assert_eq!([0xFF, 0xFE], jpeg[20..22]);
    }

    #[test]
    fn tiny_targets_fail() {
        assert!(generate_jpeg(5, 100).is_none());
    }

    #[test]
    fn deterministic_per_seed() {
        let a = generate_jpeg(1, 5_000).expect("representable");
        let b = generate_jpeg(1, 5_000).expect("representable");
        let c = generate_jpeg(2, 5_000).expect("representable");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
