// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Breadcrumb layout engine.
//!
//! Lays the current location out into clickable segments that fit a width
//! budget. When the full chain does not fit, a collapse plan hides middle
//! segments behind an ellipsis, preferring to show as many segments as
//! possible, then to balance prefix and suffix, then to favor the suffix.
//! As a last resort the first or last segment is itself middle-truncated.

use super::{
    normalize_plugin_path, EmptyPathPolicy, LeadingSlashPolicy, TrailingSlashPolicy,
};
use crate::path::VfsPath;
use std::sync::Arc;

/// Padding left and right of the whole breadcrumb strip, in DIPs.
pub const PATH_PADDING_DIP: f32 = 8.0;

/// Horizontal spacing around each segment, in DIPs.
pub const PATH_SPACING_DIP: f32 = 4.0;

/// Width of the chevron separator between segments, in DIPs.
pub const PATH_SEPARATOR_WIDTH_DIP: f32 = 32.0;

/// The ellipsis stand-in for collapsed segments.
pub const ELLIPSIS: &str = "...";

/// Converts device-independent pixels to physical pixels.
#[must_use]
pub fn dips_to_pixels(dips: f32, dpi: u32) -> f32 {
    dips * (dpi as f32) / 96.0
}

/// Text measurement oracle supplied by the rendering layer.
pub trait TextMeasure {
    /// Width of `text` at the breadcrumb font, in pixels.
    fn measure(&self, text: &str) -> f32;
}

/// Axis-aligned rectangle in section coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub left: f32,

    /// Top edge.
    pub top: f32,

    /// Right edge.
    pub right: f32,

    /// Bottom edge.
    pub bottom: f32,
}

impl Rect {
    fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Width of the rectangle.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }
}

/// One path component with its accumulated full path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathPart {
    /// Display text of the component.
    pub text: String,

    /// Full path up to and including this component.
    pub full_path: String,
}

/// A displayed breadcrumb segment.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Hit-test bounds.
    pub bounds: Rect,

    /// Navigation target; empty for the ellipsis.
    pub full_path: String,

    /// Display text (possibly truncated).
    pub text: String,

    /// `true` for the collapsed-middle ellipsis.
    pub is_ellipsis: bool,
}

/// The separator between two displayed segments.
#[derive(Clone, Debug, PartialEq)]
pub struct Separator {
    /// Hit-test bounds.
    pub bounds: Rect,

    /// Index of the segment on the left.
    pub left_segment: usize,

    /// Index of the segment on the right.
    pub right_segment: usize,
}

/// A computed breadcrumb layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
    /// Displayed segments, left to right.
    pub segments: Vec<Segment>,

    /// Separators between the displayed segments.
    pub separators: Vec<Separator>,
}

/// Geometry inputs of a layout pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutParams {
    /// Width of the breadcrumb section, in pixels.
    pub section_width: f32,

    /// Height of the breadcrumb section, in pixels.
    pub section_height: f32,

    /// Monitor DPI (96 = 100%).
    pub dpi: u32,
}

fn is_file_plugin(short_id: Option<&str>) -> bool {
    short_id.is_none_or(|id| id.eq_ignore_ascii_case("file"))
}

/// Tokenizes a location into parts, by the plugin path rules.
///
/// For the file plugin the path splits as a native path (drive root first).
/// For other plugins the root is `/`, except that a `/@conn:<name>` prefix
/// forms a single root token routed through the connection manager.
#[must_use]
pub fn split_path_components(path: &str, short_id: Option<&str>) -> Vec<PathPart> {
    let mut parts = Vec::new();

    if is_file_plugin(short_id) {
        let native = VfsPath::normalize(path);
        if native.as_str().is_empty() {
            return parts;
        }

        let root = native.root();
        let mut accumulated = if root.is_empty() {
            String::new()
        } else {
            let text = root.trim_end_matches('\\');
            parts.push(PathPart {
                text: if text.is_empty() {
                    root.to_owned()
                } else {
                    text.to_owned()
                },
                full_path: root.to_owned(),
            });
            root.to_owned()
        };

        for component in native.components() {
            if !accumulated.is_empty() && !accumulated.ends_with('\\') {
                accumulated.push('\\');
            }
            accumulated.push_str(component);

            parts.push(PathPart {
                text: component.to_owned(),
                full_path: accumulated.clone(),
            });
        }

        return parts;
    }

    let text = normalize_plugin_path(
        path,
        EmptyPathPolicy::Root,
        LeadingSlashPolicy::Ensure,
        TrailingSlashPolicy::Trim,
    );

    const CONN_PREFIX: &str = "/@conn:";

    let mut accumulated;
    let mut start = 1usize;

    if let Some(stripped) = text.strip_prefix(CONN_PREFIX) {
        let end = stripped.find('/').map_or(text.len(), |pos| pos + CONN_PREFIX.len());
        let root_text = text.get(1..end).unwrap_or_default().to_owned();

        accumulated = String::with_capacity(1 + root_text.len());
        accumulated.push('/');
        accumulated.push_str(&root_text);

        parts.push(PathPart {
            text: root_text,
            full_path: accumulated.clone(),
        });

        start = if end < text.len() { end + 1 } else { text.len() };
    } else {
        parts.push(PathPart {
            text: "/".to_owned(),
            full_path: "/".to_owned(),
        });
        accumulated = "/".to_owned();
    }

    while start < text.len() {
        let next = text[start..].find('/').map_or(text.len(), |pos| start + pos);

        if next > start {
            let component = text.get(start..next).unwrap_or_default();

            if accumulated.len() > 1 {
                accumulated.push('/');
            }
            accumulated.push_str(component);

            parts.push(PathPart {
                text: component.to_owned(),
                full_path: accumulated.clone(),
            });
        }

        start = next + 1;
    }

    parts
}

/// Middle-truncates `text` so that it measures at most `max_width`.
///
/// Binary-searches the longest prefix whose width plus the ellipsis fits.
#[must_use]
pub fn truncate_text_to_width(
    measure: &dyn TextMeasure,
    text: &str,
    max_width: f32,
    ellipsis: &str,
) -> String {
    if measure.measure(text) <= max_width {
        return text.to_owned();
    }

    let dots_width = measure.measure(ellipsis);
    if dots_width <= 0.0 || max_width <= dots_width {
        return ellipsis.to_owned();
    }

    let chars: Vec<char> = text.chars().collect();

    let mut low = 0usize;
    let mut high = chars.len();

    while low < high {
        let mid = (low + high + 1) / 2;

        let mut candidate: String = chars.iter().take(mid).collect();
        candidate.push_str(ellipsis);

        if measure.measure(&candidate) <= max_width {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    let mut result: String = chars.iter().take(low).collect();
    result.push_str(ellipsis);
    result
}

#[derive(Default)]
struct CollapsePlan {
    prefix_count: usize,
    suffix_count: usize,
    show_ellipsis: bool,
    ellipsis_at_start: bool,
    truncate_first: bool,
    truncate_last: bool,
    first_text: String,
    last_text: String,
}

#[derive(Clone, PartialEq)]
struct CacheKey {
    path: String,
    short_id: Option<String>,
    params: LayoutParams,
}

/// Breadcrumb layout planner with a one-slot result cache.
///
/// Repeated calls with identical inputs return the cached layout without
/// re-measuring anything.
#[derive(Default)]
pub struct BreadcrumbLayout {
    cache: Option<(CacheKey, Arc<Layout>)>,
}

impl BreadcrumbLayout {
    /// Creates an empty planner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the cached layout.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Computes (or returns the cached) layout for a location.
    pub fn layout(
        &mut self,
        path: &str,
        short_id: Option<&str>,
        params: &LayoutParams,
        measure: &dyn TextMeasure,
    ) -> Arc<Layout> {
        let key = CacheKey {
            path: path.to_owned(),
            short_id: short_id.map(str::to_owned),
            params: *params,
        };

        if let Some((cached_key, cached)) = &self.cache {
            if *cached_key == key {
                return cached.clone();
            }
        }

        let layout = Arc::new(compute_layout(path, short_id, params, measure));
        self.cache = Some((key, layout.clone()));
        layout
    }
}

#[allow(clippy::too_many_lines)]
fn compute_layout(
    path: &str,
    short_id: Option<&str>,
    params: &LayoutParams,
    measure: &dyn TextMeasure,
) -> Layout {
    let padding = dips_to_pixels(PATH_PADDING_DIP, params.dpi);
    let separator_width = dips_to_pixels(PATH_SEPARATOR_WIDTH_DIP, params.dpi);
    let spacing = dips_to_pixels(PATH_SPACING_DIP, params.dpi);
    let available_width = params.section_width - padding * 2.0;
    let section_height = params.section_height;

    let parts = split_path_components(path, short_id);
    if parts.is_empty() {
        log::warn!("no path components in {path:?}");
        return Layout::default();
    }

    let part_count = parts.len();

    let part_widths: Vec<f32> = parts.iter().map(|part| measure.measure(&part.text)).collect();
    let ellipsis_width = measure.measure(ELLIPSIS);

    let mut prefix_sums = vec![0.0f32; part_count + 1];
    for (index, width) in part_widths.iter().enumerate() {
        prefix_sums[index + 1] = prefix_sums[index] + width;
    }

    let sum_first = |count: usize| prefix_sums[count.min(part_count)];
    let sum_last = |count: usize| {
        if count == 0 {
            0.0
        } else {
            let clamped = count.min(part_count);
            prefix_sums[part_count] - prefix_sums[part_count - clamped]
        }
    };

    let sequence_width = |sum_widths: f32, segment_count: usize| {
        if segment_count == 0 {
            0.0
        } else {
            sum_widths
                + spacing * segment_count as f32
                + separator_width * (segment_count - 1) as f32
        }
    };

    let mut plan = CollapsePlan::default();

    let full_width = sequence_width(prefix_sums[part_count], part_count);
    if full_width <= available_width {
        plan.prefix_count = part_count;
    } else if part_count == 1 {
        plan.prefix_count = 1;
        plan.truncate_first = true;
        plan.first_text.clone_from(&parts[0].text);
    } else {
        // Choose the widest-fitting collapsed form that keeps the end
        // visible.
        let mut found = false;
        let mut best_shown = 0usize;
        let mut best_prefix = 0usize;
        let mut best_suffix = 0usize;
        let mut best_balance = 0usize;

        for prefix_count in 1..part_count {
            for suffix_count in 1..part_count {
                if prefix_count + suffix_count >= part_count {
                    continue;
                }

                let segment_count = prefix_count + 1 + suffix_count;
                let sum_widths =
                    sum_first(prefix_count) + ellipsis_width + sum_last(suffix_count);
                if sequence_width(sum_widths, segment_count) > available_width {
                    continue;
                }

                let shown = prefix_count + suffix_count;
                let balance = prefix_count.abs_diff(suffix_count);

                let better = !found
                    || shown > best_shown
                    || (shown == best_shown && balance < best_balance)
                    || (shown == best_shown
                        && balance == best_balance
                        && suffix_count > best_suffix)
                    || (shown == best_shown
                        && balance == best_balance
                        && suffix_count == best_suffix
                        && prefix_count > best_prefix);

                if better {
                    found = true;
                    best_shown = shown;
                    best_prefix = prefix_count;
                    best_suffix = suffix_count;
                    best_balance = balance;
                }
            }
        }

        if found {
            plan.prefix_count = best_prefix;
            plan.suffix_count = best_suffix;
            plan.show_ellipsis = true;
        } else {
            // Drop the prefix entirely and keep as much tail as possible.
            let mut found_suffix = false;
            let mut best_tail = 0usize;

            for suffix_count in 1..part_count {
                let segment_count = 1 + suffix_count;
                let sum_widths = ellipsis_width + sum_last(suffix_count);
                if sequence_width(sum_widths, segment_count) > available_width {
                    continue;
                }

                if !found_suffix || suffix_count > best_tail {
                    found_suffix = true;
                    best_tail = suffix_count;
                }
            }

            if found_suffix {
                plan.suffix_count = best_tail;
                plan.show_ellipsis = true;
                plan.ellipsis_at_start = true;
            } else {
                let last_width = part_widths[part_count - 1];
                let fixed =
                    ellipsis_width + last_width + spacing * 3.0 + separator_width * 2.0;

                if fixed < available_width {
                    // "first > ... > last", truncating the first segment.
                    plan.prefix_count = 1;
                    plan.suffix_count = 1;
                    plan.show_ellipsis = true;
                    plan.truncate_first = true;
                    plan.first_text.clone_from(&parts[0].text);
                } else {
                    // "... > last", truncating the last segment.
                    plan.suffix_count = 1;
                    plan.show_ellipsis = true;
                    plan.ellipsis_at_start = true;
                    plan.truncate_last = true;
                    plan.last_text.clone_from(&parts[part_count - 1].text);
                }
            }
        }
    }

    // Apply the truncation decisions now that the plan is known.
    if plan.truncate_first && plan.prefix_count > 0 {
        let segment_count =
            plan.prefix_count + usize::from(plan.show_ellipsis) + plan.suffix_count;
        let mut fixed_sum = sum_first(plan.prefix_count) - part_widths[0];
        if plan.show_ellipsis {
            fixed_sum += ellipsis_width;
        }
        fixed_sum += sum_last(plan.suffix_count);

        let base = sequence_width(fixed_sum, segment_count);
        let max_first_width = (available_width - base).max(0.0);
        plan.first_text =
            truncate_text_to_width(measure, &plan.first_text, max_first_width, ELLIPSIS);

        if plan.first_text == ELLIPSIS {
            // Not even the ellipsis-truncated first fits: degrade to
            // "... > last".
            plan.prefix_count = 0;
            plan.truncate_first = false;
            plan.show_ellipsis = true;
            plan.ellipsis_at_start = true;
            plan.suffix_count = 1.min(part_count);
            plan.truncate_last = true;
            plan.last_text.clone_from(&parts[part_count - 1].text);
        }
    }

    if plan.truncate_last && plan.suffix_count > 0 {
        let segment_count =
            usize::from(plan.show_ellipsis) + plan.suffix_count + plan.prefix_count;
        let mut fixed_sum = sum_first(plan.prefix_count);
        if plan.show_ellipsis {
            fixed_sum += ellipsis_width;
        }
        fixed_sum += sum_last(plan.suffix_count) - part_widths[part_count - 1];

        let base = sequence_width(fixed_sum, segment_count);
        let max_last_width = (available_width - base).max(0.0);
        plan.last_text =
            truncate_text_to_width(measure, &plan.last_text, max_last_width, ELLIPSIS);

        if plan.last_text == ELLIPSIS {
            plan.prefix_count = 0;
            plan.suffix_count = 0;
            plan.show_ellipsis = true;
            plan.ellipsis_at_start = true;
            plan.truncate_last = false;
        }
    }

    struct DisplaySegment {
        is_ellipsis: bool,
        part_index: usize,
        display_text: Option<String>,
    }

    let mut display = Vec::with_capacity(part_count + 1);

    let push_prefix = |display: &mut Vec<DisplaySegment>| {
        for index in 0..plan.prefix_count {
            display.push(DisplaySegment {
                is_ellipsis: false,
                part_index: index,
                display_text: if plan.truncate_first && index == 0 {
                    Some(plan.first_text.clone())
                } else {
                    None
                },
            });
        }
    };

    if plan.show_ellipsis {
        if !plan.ellipsis_at_start {
            push_prefix(&mut display);
        }

        display.push(DisplaySegment {
            is_ellipsis: true,
            part_index: 0,
            display_text: None,
        });

        let tail_start = part_count - plan.suffix_count;
        for index in tail_start..part_count {
            display.push(DisplaySegment {
                is_ellipsis: false,
                part_index: index,
                display_text: if plan.truncate_last && index == part_count - 1 {
                    Some(plan.last_text.clone())
                } else {
                    None
                },
            });
        }
    } else {
        push_prefix(&mut display);
    }

    let mut layout = Layout::default();
    let mut x = padding;

    for (display_index, segment) in display.iter().enumerate() {
        let (text, full_path, width) = if segment.is_ellipsis {
            (ELLIPSIS.to_owned(), String::new(), ellipsis_width)
        } else if let Some(text) = &segment.display_text {
            let width = measure.measure(text);
            (
                text.clone(),
                parts[segment.part_index].full_path.clone(),
                width,
            )
        } else {
            (
                parts[segment.part_index].text.clone(),
                parts[segment.part_index].full_path.clone(),
                part_widths[segment.part_index],
            )
        };

        layout.segments.push(Segment {
            bounds: Rect::new(
                x - spacing / 2.0,
                0.0,
                x + width + spacing / 2.0,
                section_height,
            ),
            full_path,
            text,
            is_ellipsis: segment.is_ellipsis,
        });

        x += width + spacing;

        if display_index + 1 < display.len() {
            layout.separators.push(Separator {
                bounds: Rect::new(x, 0.0, x + separator_width, section_height),
                left_segment: layout.segments.len() - 1,
                right_segment: layout.segments.len(),
            });
            x += separator_width;
        }
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    /// One pixel per character keeps the geometry easy to reason about.
    struct CharWidth;

    impl TextMeasure for CharWidth {
        fn measure(&self, text: &str) -> f32 {
            text.chars().count() as f32
        }
    }

    fn params(section_width: f32) -> LayoutParams {
        LayoutParams {
            section_width,
            section_height: 24.0,
            dpi: 96,
        }
    }

    fn texts(layout: &Layout) -> Vec<String> {
        layout.segments.iter().map(|s| s.text.clone()).collect()
    }

    #[test]
    fn splits_plugin_paths() {
        let parts = split_path_components("/a/bb/ccc", Some("fk"));
        let names: Vec<&str> = parts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(vec!["/", "a", "bb", "ccc"], names);
        assert_eq!("/a/bb", parts[2].full_path);
        assert_eq!("/a/bb/ccc", parts[3].full_path);
    }

    #[test]
    fn splits_conn_root_as_one_token() {
        let parts = split_path_components("/@conn:backup/data", Some("ftp"));
        assert_eq!("@conn:backup", parts[0].text);
        assert_eq!("/@conn:backup", parts[0].full_path);
        assert_eq!("data", parts[1].text);
        assert_eq!("/@conn:backup/data", parts[1].full_path);
    }

    #[test]
    fn splits_native_paths_for_the_file_plugin() {
        let parts = split_path_components(r"C:\photos\2024", None);
        let names: Vec<&str> = parts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(vec!["C:", "photos", "2024"], names);
        assert_eq!(r"C:\", parts[0].full_path);
        assert_eq!(r"C:\photos\2024", parts[2].full_path);
    }

    #[test]
    fn everything_fits_without_collapse() {
        let mut planner = BreadcrumbLayout::new();
        let layout = planner.layout("/a/b/c", Some("fk"), &params(500.0), &CharWidth);

        assert_eq!(vec!["/", "a", "b", "c"], texts(&layout));
        assert_eq!(3, layout.separators.len());
        assert!(layout.segments.iter().all(|s| !s.is_ellipsis));
    }

    #[test]
    fn collapse_prefers_suffix_over_prefix() {
        // Widths chosen so only three real tokens plus the ellipsis fit.
        let mut planner = BreadcrumbLayout::new();
        let layout = planner.layout(
            "/a/bbb/ccc/dddd/eeeee/end",
            Some("fk"),
            &params(240.0),
            &CharWidth,
        );

        let shown = texts(&layout);
        assert!(shown.contains(&ELLIPSIS.to_owned()), "{shown:?}");

        // The tail stays visible; the ellipsis never sits at the very end.
        assert_eq!("end", shown.last().expect("non-empty"));

        let ellipsis_index = shown
            .iter()
            .position(|t| t == ELLIPSIS)
            .expect("has ellipsis");
        let suffix_len = shown.len() - ellipsis_index - 1;
        let prefix_len = ellipsis_index;
        assert!(suffix_len >= prefix_len, "{shown:?}");
    }

    #[test]
    fn layout_is_idempotent() {
        let mut planner = BreadcrumbLayout::new();
        let first = planner.layout("/a/b/c/d/e", Some("fk"), &params(120.0), &CharWidth);
        let second = planner.layout("/a/b/c/d/e", Some("fk"), &params(120.0), &CharWidth);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn layout_fits_available_width() {
        for width in [60.0, 90.0, 140.0, 220.0, 400.0] {
            let mut planner = BreadcrumbLayout::new();
            let layout = planner.layout(
                "/alpha/bravo/charlie/delta/echo/foxtrot",
                Some("fk"),
                &params(width),
                &CharWidth,
            );

            let padding = dips_to_pixels(PATH_PADDING_DIP, 96);
            let right = layout
                .segments
                .iter()
                .map(|s| s.bounds.right)
                .fold(0.0f32, f32::max);

            assert!(
                right <= width - padding + 0.5,
                "width {width}: right edge {right}"
            );
        }
    }

    #[test]
    fn single_long_component_is_truncated() {
        let mut planner = BreadcrumbLayout::new();
        let layout = planner.layout(
            "/supercalifragilisticexpialidocious",
            Some("fk"),
            &params(60.0),
            &CharWidth,
        );

        assert!(!layout.segments.is_empty());
        let last = layout.segments.last().expect("non-empty");
        assert!(last.text.ends_with(ELLIPSIS) || last.is_ellipsis);
    }

    #[test]
    fn truncation_binary_search() {
        let text = "abcdefghij";
        let truncated = truncate_text_to_width(&CharWidth, text, 7.0, ELLIPSIS);
        // 4 chars + 3 dots = 7.
        assert_eq!("abcd...", truncated);

        assert_eq!(text, truncate_text_to_width(&CharWidth, text, 10.0, ELLIPSIS));
        assert_eq!(ELLIPSIS, truncate_text_to_width(&CharWidth, text, 2.0, ELLIPSIS));
    }
}
