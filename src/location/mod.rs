// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Location handling for the navigation layer.
//!
//! A location names a place in a plugin (or on a native drive) and exists
//! in three coexisting syntaxes:
//!
//! - plugin path: `/photos/2024` (plugin-local, `/`-separated),
//! - edit path: `C:\photos`, `fk:/photos/2024`, or
//!   `fk:ctx|/photos/2024` with a mount context,
//! - history path: the edit form prefixed by the plugin short id.

pub mod breadcrumb;
pub mod info_cache;
pub mod prefetch;
pub mod suggest;

/// What an empty plugin path normalizes to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EmptyPathPolicy {
    /// Empty input becomes the root `/`.
    Root,

    /// Empty input stays empty.
    Keep,
}

/// Whether a leading slash is enforced.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LeadingSlashPolicy {
    /// A missing leading `/` is added.
    Ensure,

    /// The input's leading character is kept as-is.
    Keep,
}

/// How trailing slashes are handled.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TrailingSlashPolicy {
    /// Trailing slashes are removed (except on the bare root).
    Trim,

    /// Exactly one trailing slash is enforced.
    Ensure,
}

/// Folds backslashes, collapses duplicate slashes and applies the policies.
#[must_use]
pub fn normalize_plugin_path(
    text: &str,
    empty: EmptyPathPolicy,
    leading: LeadingSlashPolicy,
    trailing: TrailingSlashPolicy,
) -> String {
    let mut normalized = String::with_capacity(text.len() + 1);

    let mut previous_was_slash = false;
    for ch in text.chars() {
        let ch = if ch == '\\' { '/' } else { ch };

        if ch == '/' {
            if previous_was_slash {
                continue;
            }
            previous_was_slash = true;
        } else {
            previous_was_slash = false;
        }

        normalized.push(ch);
    }

    if normalized.is_empty() && empty == EmptyPathPolicy::Root {
        normalized.push('/');
    }

    if leading == LeadingSlashPolicy::Ensure
        && !normalized.is_empty()
        && !normalized.starts_with('/')
    {
        normalized.insert(0, '/');
    }

    match trailing {
        TrailingSlashPolicy::Trim => {
            while normalized.len() > 1 && normalized.ends_with('/') {
                normalized.pop();
            }
        }
        TrailingSlashPolicy::Ensure => {
            if !normalized.ends_with('/') {
                normalized.push('/');
            }
        }
    }

    normalized
}

/// [`normalize_plugin_path`] with the default policies.
#[must_use]
pub fn normalize_plugin_path_default(text: &str) -> String {
    normalize_plugin_path(
        text,
        EmptyPathPolicy::Root,
        LeadingSlashPolicy::Ensure,
        TrailingSlashPolicy::Trim,
    )
}

/// A parsed location.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Location {
    /// Plugin short id (`fk`, `ftp`, …); `None` for native paths.
    pub plugin_short_id: Option<String>,

    /// Mount context (the part before `|` in edit syntax).
    pub instance_context: Option<String>,

    /// The plugin-local (or native) path.
    pub plugin_path: String,
}

fn looks_like_windows_absolute(text: &str) -> bool {
    let bytes = text.as_bytes();

    if bytes.len() >= 2 && bytes[0] == b'\\' && bytes[1] == b'\\' {
        return true;
    }

    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

fn is_valid_short_id(prefix: &str) -> bool {
    !prefix.is_empty() && prefix.chars().all(char::is_alphanumeric)
}

/// Splits `shortId:remainder`, refusing drive-letter paths.
fn try_parse_plugin_prefix(text: &str) -> Option<(&str, &str)> {
    let colon = text.find(':')?;
    if colon < 1 {
        return None;
    }

    // "C:\..." is a drive letter, not a plugin prefix.
    if colon == 1 && text.chars().next().is_some_and(char::is_alphabetic) {
        return None;
    }

    if let Some(sep) = text.find(['\\', '/']) {
        if sep < colon {
            return None;
        }
    }

    let prefix = text.get(..colon)?;
    if !is_valid_short_id(prefix) {
        return None;
    }

    Some((prefix, text.get(colon + 1..)?))
}

/// Parses any of the three location syntaxes.
///
/// Returns `None` for text that is neither a native path, a rooted plugin
/// path, nor a prefixed edit/history path.
#[must_use]
pub fn parse_location(text: &str) -> Option<Location> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if looks_like_windows_absolute(text) {
        return Some(Location {
            plugin_short_id: None,
            instance_context: None,
            plugin_path: text.to_owned(),
        });
    }

    if text.starts_with('/') || text.starts_with('\\') {
        return Some(Location {
            plugin_short_id: None,
            instance_context: None,
            plugin_path: normalize_plugin_path_default(text),
        });
    }

    let (prefix, remainder) = try_parse_plugin_prefix(text)?;

    if looks_like_windows_absolute(remainder) {
        // Mount-qualified native path, e.g. "file:C:\photos".
        return Some(Location {
            plugin_short_id: Some(prefix.to_owned()),
            instance_context: None,
            plugin_path: remainder.to_owned(),
        });
    }

    let (instance_context, plugin_part) = match remainder.find('|') {
        Some(bar) => (
            Some(remainder.get(..bar)?.trim().to_owned()),
            remainder.get(bar + 1..)?,
        ),
        None => (None, remainder),
    };

    Some(Location {
        plugin_short_id: Some(prefix.to_owned()),
        instance_context,
        plugin_path: normalize_plugin_path_default(plugin_part),
    })
}

fn is_file_short_id(short_id: Option<&str>) -> bool {
    short_id.is_none_or(|id| id.eq_ignore_ascii_case("file"))
}

/// Composes the editable form of a location.
#[must_use]
pub fn format_edit_path(short_id: Option<&str>, plugin_path: &str) -> String {
    if is_file_short_id(short_id) {
        return plugin_path.to_owned();
    }

    let mut text = String::new();
    if let Some(short_id) = short_id {
        text.push_str(short_id);
        text.push(':');
    }
    text.push_str(&normalize_plugin_path_default(plugin_path));
    text
}

/// Composes the history form of a location.
#[must_use]
pub fn format_history_path(
    short_id: Option<&str>,
    instance_context: Option<&str>,
    plugin_path: &str,
) -> String {
    let Some(short_id) = short_id else {
        return plugin_path.to_owned();
    };

    let mut text = String::new();
    text.push_str(short_id);
    text.push(':');

    if let Some(context) = instance_context {
        text.push_str(context);
        text.push('|');
    }

    if looks_like_windows_absolute(plugin_path) {
        text.push_str(plugin_path);
    } else {
        text.push_str(&normalize_plugin_path_default(plugin_path));
    }

    text
}

/// Splits a plugin path into its folder (with trailing slash) and leaf.
#[must_use]
pub fn split_folder_and_leaf(text: &str) -> (String, String) {
    let normalized = normalize_plugin_path(
        text,
        EmptyPathPolicy::Root,
        LeadingSlashPolicy::Ensure,
        TrailingSlashPolicy::Trim,
    );

    match normalized.rfind('/') {
        Some(pos) => {
            let folder = normalized.get(..=pos).unwrap_or("/").to_owned();
            let leaf = normalized.get(pos + 1..).unwrap_or_default().to_owned();
            (folder, leaf)
        }
        None => (String::from("/"), normalized),
    }
}
