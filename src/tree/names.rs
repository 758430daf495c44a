// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Synthetic entry names.
//!
//! Names mix scripts and lengths on purpose: consumers of the virtual tree
//! get exercised with accented Latin, CJK, RTL text, emoji and very long
//! compounds, all deterministically drawn from the node seed.

use crate::rng::{random_chance, random_range, Mt19937};

/// Name length cap in UTF-16 code units.
pub const MAX_NAME_UTF16: usize = 96;

const WORD_SEGMENTS: [&str; 24] = [
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "juliet", "kilo",
    "lima", "mango", "notebook", "archive", "report", "session", "palette", "theme", "vector",
    "module", "sample", "draft", "output", "project",
];

const EURO_SEGMENTS: [&str; 14] = [
    "café",
    "français",
    "niño",
    "münchen",
    "garçon",
    "façade",
    "smørrebrød",
    "Łódź",
    "Sørensen",
    "über",
    "ångström",
    "canción",
    "Środa",
    "piñata",
];

const JAPANESE_SEGMENTS: [&str; 12] = [
    "日本語",
    "東京",
    "さくら",
    "ファイル",
    "テスト",
    "プロジェクト",
    "設定",
    "履歴",
    "サンプル",
    "レポート",
    "ドキュメント",
    "フォルダー",
];

const ARABIC_SEGMENTS: [&str; 8] = [
    "مرحبا",
    "ملف",
    "اختبار",
    "مشروع",
    "تقرير",
    "مجلد",
    "إعدادات",
    "مستند",
];

const THAI_SEGMENTS: [&str; 8] = [
    "สวัสดี",
    "ไฟล์",
    "ทดสอบ",
    "โครงการ",
    "รายงาน",
    "โฟลเดอร์",
    "การตั้งค่า",
    "เอกสาร",
];

const KOREAN_SEGMENTS: [&str; 8] = [
    "한국어",
    "안녕하세요",
    "파일",
    "테스트",
    "프로젝트",
    "보고서",
    "설정",
    "문서",
];

const EMOJI_SEGMENTS: [&str; 10] = ["😀", "🚀", "🎉", "🌟", "🔥", "📄", "📚", "💻", "🦄", "🧪"];

const LONG_SEGMENTS: [&str; 5] = [
    "supercalifragilisticexpialidocious",
    "pseudopseudohypoparathyroidism",
    "electroencephalograph",
    "characterization",
    "internationalization",
];

/// Extensions the generator assigns to synthetic files.
pub const EXTENSIONS: [&str; 16] = [
    ".txt",
    ".log",
    ".json",
    ".json5",
    ".xml",
    ".theme.json5",
    ".png",
    ".jpg",
    ".bin",
    ".cpp",
    ".h",
    ".md",
    ".csv",
    ".zip",
    ".docx",
    ".xlsx",
];

const SEPARATORS: [char; 3] = [' ', '-', '_'];

/// Length of `text` in UTF-16 code units.
#[must_use]
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Trims `text` to at most `max_units` UTF-16 code units.
///
/// Whole characters only, so a surrogate pair is never split.
pub fn trim_to_utf16(text: &mut String, max_units: usize) {
    let mut units = 0usize;

    for (offset, ch) in text.char_indices() {
        let width = ch.len_utf16();
        if units + width > max_units {
            text.truncate(offset);
            return;
        }
        units += width;
    }
}

fn pick<'a>(rng: &mut Mt19937, table: &[&'a str]) -> &'a str {
    #[allow(clippy::cast_possible_truncation)]
    let index = random_range(rng, 0, table.len() as u32 - 1) as usize;
    table.get(index).copied().unwrap_or("item")
}

/// Picks a random file extension.
#[must_use]
pub fn random_extension(rng: &mut Mt19937) -> &'static str {
    pick(rng, &EXTENSIONS)
}

/// Generates a base name (no extension, no uniqueness suffix).
#[must_use]
pub fn random_base_name(rng: &mut Mt19937) -> String {
    let style = random_range(rng, 0, 4);
    let segment_count = match style {
        1 => 2,
        2 => 3,
        3 => 4,
        _ => 1,
    };

    let mut name = String::new();

    for _ in 0..segment_count {
        let roll = random_range(rng, 0, 99);
        let segment = if roll < 40 {
            pick(rng, &WORD_SEGMENTS)
        } else if roll < 55 {
            pick(rng, &EURO_SEGMENTS)
        } else if roll < 65 {
            pick(rng, &JAPANESE_SEGMENTS)
        } else if roll < 73 {
            pick(rng, &ARABIC_SEGMENTS)
        } else if roll < 81 {
            pick(rng, &THAI_SEGMENTS)
        } else if roll < 89 {
            pick(rng, &KOREAN_SEGMENTS)
        } else if roll < 95 {
            pick(rng, &LONG_SEGMENTS)
        } else {
            pick(rng, &EMOJI_SEGMENTS)
        };

        if !name.is_empty() {
            #[allow(clippy::cast_possible_truncation)]
            let sep_index = random_range(rng, 0, SEPARATORS.len() as u32 - 1) as usize;
            name.push(SEPARATORS.get(sep_index).copied().unwrap_or(' '));
        }

        if utf16_len(&name) + utf16_len(segment) > MAX_NAME_UTF16 {
            break;
        }

        name.push_str(segment);
    }

    if name.is_empty() {
        name.push_str("item");
    }

    if random_chance(rng, 1, 3) {
        let number = random_range(rng, 1, 9_999);
        let suffix = number.to_string();
        if utf16_len(&name) + suffix.len() + 1 <= MAX_NAME_UTF16 {
            name.push(' ');
            name.push_str(&suffix);
        }
    }

    if style == 4 && utf16_len(&name) < 32 {
        while utf16_len(&name) + 5 <= MAX_NAME_UTF16 && utf16_len(&name) < 48 {
            name.push('_');
            name.push_str("long");
        }
    }

    if random_chance(rng, 1, 4) {
        let emoji = pick(rng, &EMOJI_SEGMENTS);
        if utf16_len(&name) + utf16_len(emoji) + 1 <= MAX_NAME_UTF16 {
            name.push(' ');
            name.push_str(emoji);
        }
    }

    trim_to_utf16(&mut name, MAX_NAME_UTF16);
    name
}
