// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::filesystem::FileSystem;
use serde::Deserialize;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * 1024 * 1024;

/// Parses a throughput expression like `"4 MiB/s"`, `"512k"` or `"0"`.
///
/// A bare number (or `k`/`kb`/`kib`) means KiB; `/s` is accepted and
/// ignored. Returns bytes per second, `Some(0)` meaning unlimited, or `None`
/// for unparsable text.
#[must_use]
pub fn parse_throughput(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0);
    }

    let digits_end = text
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(text.len(), |(index, _)| index);

    let number: u64 = text.get(..digits_end)?.parse().ok()?;

    let mut unit = text.get(digits_end..)?.trim();
    if unit.len() >= 2 {
        let tail = unit.get(unit.len() - 2..).unwrap_or_default();
        if tail.eq_ignore_ascii_case("/s") {
            unit = unit.get(..unit.len() - 2).unwrap_or_default().trim();
        }
    }

    let multiplier = if unit.is_empty()
        || unit.eq_ignore_ascii_case("kb")
        || unit.eq_ignore_ascii_case("k")
        || unit.eq_ignore_ascii_case("kib")
    {
        // Bare numeric strings are interpreted as KiB for user-friendliness.
        KIB
    } else if unit.eq_ignore_ascii_case("b") {
        1
    } else if unit.eq_ignore_ascii_case("mb")
        || unit.eq_ignore_ascii_case("m")
        || unit.eq_ignore_ascii_case("mib")
    {
        MIB
    } else if unit.eq_ignore_ascii_case("gb")
        || unit.eq_ignore_ascii_case("g")
        || unit.eq_ignore_ascii_case("gib")
    {
        GIB
    } else {
        return None;
    };

    Some(number.saturating_mul(multiplier))
}

/// Engine configuration.
///
/// # Examples
///
/// ```
/// use mirage_fs::Config;
///
/// let fs = Config::default()
///     .max_children_per_directory(3)
///     .max_depth(2)
///     .seed(42)
///     .open();
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Upper bound for generated children per directory.
    pub max_children_per_directory: u32,

    /// Maximum generated depth; 0 means unlimited.
    pub max_depth: u32,

    /// Generator seed; 0 selects a run-unique seed.
    pub seed: u32,

    /// Artificial latency per file access, in milliseconds.
    pub latency_ms: u32,

    /// Parsed virtual throughput cap in bytes/sec; 0 means unlimited.
    pub virtual_speed_limit: u64,

    /// The accepted textual form of the throughput cap.
    pub virtual_speed_limit_text: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_children_per_directory: 42,
            max_depth: 10,
            seed: 42,
            latency_ms: 0,
            virtual_speed_limit: 0,
            virtual_speed_limit_text: "0".into(),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawConfig {
    max_children_per_directory: Option<i64>,
    max_depth: Option<i64>,
    seed: Option<i64>,
    latency_ms: Option<i64>,
    virtual_speed_limit: Option<String>,
}

fn clamp_field(value: Option<i64>, max: i64) -> Option<u32> {
    match value {
        Some(value) if value >= 0 => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Some(value.min(max) as u32)
        }
        _ => None,
    }
}

impl Config {
    /// Sets the children-per-directory bound (clamped to 20000).
    #[must_use]
    pub fn max_children_per_directory(mut self, count: u32) -> Self {
        self.max_children_per_directory = count.min(20_000);
        self
    }

    /// Sets the maximum generated depth (clamped to 1024; 0 = unlimited).
    #[must_use]
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth.min(1_024);
        self
    }

    /// Sets the generator seed (0 = run-unique).
    #[must_use]
    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the artificial latency per access (clamped to 1000 ms).
    #[must_use]
    pub fn latency_ms(mut self, latency: u32) -> Self {
        self.latency_ms = latency.min(1_000);
        self
    }

    /// Sets the virtual throughput cap from text; invalid text is ignored.
    #[must_use]
    pub fn virtual_speed_limit(mut self, text: &str) -> Self {
        if let Some(parsed) = parse_throughput(text) {
            self.virtual_speed_limit = parsed;
            self.virtual_speed_limit_text = text.into();
        }
        self
    }

    /// Opens a file system with this configuration.
    #[must_use]
    pub fn open(self) -> FileSystem {
        FileSystem::with_config(self)
    }

    /// Returns `true` if every field still has its default value.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self == &Self::default()
    }

    /// Returns `true` if replacing `self` by `other` invalidates the forest.
    #[must_use]
    pub fn structure_changed(&self, other: &Self) -> bool {
        self.max_children_per_directory != other.max_children_per_directory
            || self.max_depth != other.max_depth
            || self.seed != other.seed
    }

    /// Parses a configuration JSON document.
    ///
    /// Unknown fields are ignored, absent fields fall back to defaults, and
    /// out-of-range values are clamped. Invalid throughput text silently
    /// keeps the `previous` configuration's speed limit.
    #[must_use]
    pub fn from_json(text: &str, previous: Option<&Self>) -> Self {
        let raw: RawConfig = serde_json::from_str(text).unwrap_or_default();
        let mut config = Self::default();

        if let Some(value) = clamp_field(raw.max_children_per_directory, 20_000) {
            config.max_children_per_directory = value;
        }
        if let Some(value) = clamp_field(raw.max_depth, 1_024) {
            config.max_depth = value;
        }
        if let Some(value) = raw.seed {
            if value >= 0 {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    config.seed = value.min(i64::from(u32::MAX)) as u32;
                }
            }
        }
        if let Some(value) = clamp_field(raw.latency_ms, 1_000) {
            config.latency_ms = value;
        }

        match raw.virtual_speed_limit.as_deref().map(parse_throughput) {
            Some(Some(parsed)) => {
                config.virtual_speed_limit = parsed;
                config.virtual_speed_limit_text =
                    raw.virtual_speed_limit.unwrap_or_else(|| "0".into());
            }
            Some(None) => {
                // Unparsable text: keep the last accepted limit.
                if let Some(previous) = previous {
                    config.virtual_speed_limit = previous.virtual_speed_limit;
                    config
                        .virtual_speed_limit_text
                        .clone_from(&previous.virtual_speed_limit_text);
                }
            }
            None => {}
        }

        config
    }

    /// Serializes the canonical configuration JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "maxChildrenPerDirectory": self.max_children_per_directory,
            "maxDepth": self.max_depth,
            "seed": self.seed,
            "latencyMs": self.latency_ms,
            "virtualSpeedLimit": self.virtual_speed_limit_text,
        })
        .to_string()
    }
}

/// Configuration schema handed to settings UIs.
pub const SCHEMA_JSON: &str = r#"{
    "version":1,
    "title":"Mirage File System",
    "fields":[
        {
            "key":"maxChildrenPerDirectory",
            "type":"value",
            "label":"Max children per directory",
            "description":"Upper bound for how many children are generated in each directory.",
            "default":42,
            "min":0,
            "max":20000
        },
        {
            "key":"maxDepth",
            "type":"value",
            "label":"Max depth",
            "description":"Maximum generated directory depth (0 = unlimited).",
            "default":10,
            "min":0,
            "max":1024
        },
        {
            "key":"seed",
            "type":"value",
            "label":"Random seed (0 = random)",
            "description":"Seed used by the deterministic generator; 0 picks a random seed.",
            "default":42,
            "min":0,
            "max":4294967295
        },
        {
            "key":"latencyMs",
            "type":"value",
            "label":"Latency (ms)",
            "description":"Artificial latency per file access and per directory entry enumerated (0 = none).",
            "default":0,
            "min":0,
            "max":1000
        },
        {
            "key":"virtualSpeedLimit",
            "type":"text",
            "label":"Virtual speed limit",
            "description":"Maximum copy/move throughput for the virtual file system (0 = unlimited). Examples: 3KB, 4MB.",
            "default":"0"
        }
    ]
}"#;

/// Fixed capability document.
pub const CAPABILITIES_JSON: &str = r#"{
  "version": 1,
  "operations": {
    "copy": true,
    "move": true,
    "delete": true,
    "rename": true,
    "properties": true,
    "read": true,
    "write": true
  },
  "concurrency": {
    "copyMoveMax": 4,
    "deleteMax": 8,
    "deleteRecycleBinMax": 2
  },
  "crossFileSystem": {
    "export": { "copy": ["*"], "move": ["*"] },
    "import": { "copy": ["*"], "move": ["*"] }
  }
}"#;
