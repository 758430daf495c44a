// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Header/trailer templates for generated text-family files.
//!
//! Every template embeds the file's name, decimal size, creation tick and
//! content seed, so a human inspecting a synthetic file can tell where it
//! came from. The body between prefix and suffix is produced lazily by
//! [`fill_byte`](super::fill::fill_byte).

use super::{fill::FillKind, FileKind, FileSnapshot};

/// A text file laid out as prefix + generated body + suffix.
#[derive(Debug)]
pub struct TextTemplate {
    /// Literal leading bytes.
    pub prefix: Vec<u8>,

    /// Literal trailing bytes.
    pub suffix: Vec<u8>,

    /// Generated bytes between prefix and suffix.
    pub body_bytes: u64,

    /// Body generation policy.
    pub fill_kind: FillKind,
}

fn escape_json(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        match ch {
            '\\' => output.push_str("\\\\"),
            '"' => output.push_str("\\\""),
            '\u{8}' => output.push_str("\\b"),
            '\u{c}' => output.push_str("\\f"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            ch if (ch as u32) < 0x20 => {
                output.push_str(&format!("\\u{:04X}", ch as u32));
            }
            ch => output.push(ch),
        }
    }

    output
}

fn escape_xml_attribute(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&apos;"),
            ch => output.push(ch),
        }
    }

    output
}

/// Builds the template for a file snapshot.
///
/// If the chosen file size cannot even hold prefix + suffix, the combined
/// literal text is truncated to the size and the body is empty, so the
/// reader length always equals `size_bytes`.
#[must_use]
pub fn build_template(kind: FileKind, snapshot: &FileSnapshot, content_seed: u64) -> TextTemplate {
    let name = snapshot.name.as_str();
    let size = snapshot.size_bytes;
    let created = snapshot.creation;

    let (prefix, suffix, fill_kind) = match kind {
        FileKind::Csv => (
            format!(
                "id,name,sizeBytes,created,seed,data\r\n0,\"{name}\",{size},{created},{content_seed:016X},\""
            ),
            String::from("\"\r\n"),
            FillKind::CsvField,
        ),
        FileKind::Json => (
            format!(
                "{{\r\n  \"name\": \"{}\",\r\n  \"sizeBytes\": {size},\r\n  \"created\": {created},\r\n  \"seed\": \"{content_seed:016X}\",\r\n  \"data\": \"",
                escape_json(name)
            ),
            String::from("\"\r\n}\r\n"),
            FillKind::JsonString,
        ),
        FileKind::Json5 => (
            format!(
                "// mirage-fs generated (JSON5)\r\n{{\r\n  name: \"{}\",\r\n  sizeBytes: {size},\r\n  created: {created},\r\n  seed: \"{content_seed:016X}\",\r\n  data: \"",
                escape_json(name)
            ),
            String::from("\"\r\n}\r\n"),
            FillKind::JsonString,
        ),
        FileKind::ThemeJson5 => {
            let accent = content_seed & 0xFF_FFFF;
            let background = (content_seed >> 24) & 0xFF_FFFF;

            (
                format!(
                    "// mirage-fs generated theme (JSON5)\r\n{{\r\n  id: \"user/mirage-{content_seed:016X}\",\r\n  name: \"{}\",\r\n  baseThemeId: \"builtin/dark\",\r\n  colors: {{\r\n    \"app.accent\": \"#{accent:06X}\",\r\n    \"window.background\": \"#{background:06X}\",\r\n  }},\r\n  seed: \"{content_seed:016X}\",\r\n  data: \"",
                    escape_json(name)
                ),
                String::from("\"\r\n}\r\n"),
                FillKind::JsonString,
            )
        }
        FileKind::Xml => (
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n<file name=\"{}\" sizeBytes=\"{size}\" created=\"{created}\" seed=\"{content_seed:016X}\">\r\n  <data><![CDATA[",
                escape_xml_attribute(name)
            ),
            String::from("]]></data>\r\n</file>\r\n"),
            FillKind::XmlCData,
        ),
        _ => (
            format!(
                "mirage-fs generated file\r\nName: {name}\r\nSizeBytes: {size}\r\nSeed: {content_seed:016X}\r\nCreated: {created}\r\n\r\n"
            ),
            String::from("\r\n"),
            FillKind::PlainText,
        ),
    };

    let mut prefix = prefix.into_bytes();
    let mut suffix = suffix.into_bytes();

    let overhead = (prefix.len() + suffix.len()) as u64;
    if size >= overhead {
        return TextTemplate {
            prefix,
            suffix,
            body_bytes: size - overhead,
            fill_kind,
        };
    }

    // File too small for the full frame: keep as much of it as fits.
    prefix.append(&mut suffix);

    #[allow(clippy::cast_possible_truncation)]
    prefix.truncate(size as usize);

    TextTemplate {
        prefix,
        suffix: Vec::new(),
        body_bytes: 0,
        fill_kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attributes;
    use test_log::test;

    fn snapshot(name: &str, size: u64) -> FileSnapshot {
        FileSnapshot {
            name: name.into(),
            attributes: Attributes::ARCHIVE,
            size_bytes: size,
            creation: 133_500_000_000_000_000,
            generation_seed: 0xABCD,
        }
    }

    #[test]
    fn template_length_adds_up() {
        let snap = snapshot("notes.txt", 4_096);
        let template = build_template(FileKind::Text, &snap, 42);

        assert_eq!(
            4_096,
            template.prefix.len() as u64 + template.body_bytes + template.suffix.len() as u64
        );
    }

    #[test]
    fn tiny_files_truncate_the_frame() {
        let snap = snapshot("tiny.json", 10);
        let template = build_template(FileKind::Json, &snap, 42);

        assert_eq!(10, template.prefix.len());
        assert!(template.suffix.is_empty());
        assert_eq!(0, template.body_bytes);
    }

    #[test]
    fn json_name_is_escaped() {
        let snap = snapshot("we\tird.json", 4_096);
        let template = build_template(FileKind::Json, &snap, 42);

        let prefix = String::from_utf8(template.prefix).expect("prefix is utf-8");
        assert!(prefix.contains("we\\tird.json"));
    }

    #[test]
    fn xml_frame_is_well_formed() {
        let snap = snapshot("a&b.xml", 4_096);
        let template = build_template(FileKind::Xml, &snap, 42);

        let prefix = String::from_utf8(template.prefix).expect("prefix is utf-8");
        let suffix = String::from_utf8(template.suffix).expect("suffix is utf-8");
        assert!(prefix.contains("a&amp;b.xml"));
        assert!(prefix.ends_with("<![CDATA["));
        assert!(suffix.starts_with("]]>"));
    }

    #[test]
    fn csv_header_row() {
        let snap = snapshot("t.csv", 2_048);
        let template = build_template(FileKind::Csv, &snap, 42);

        let prefix = String::from_utf8(template.prefix).expect("prefix is utf-8");
        assert!(prefix.starts_with("id,name,sizeBytes,created,seed,data\r\n"));
        assert_eq!(FillKind::CsvField, template.fill_kind);
    }
}
