//! Inline Match Engine: finds reference constructs inside the visible window of a file and
//! turns the ones with enough backlinks into [DecorationDescriptor]s.
//!
//! The engine is stateless between calls. It only reads the page view handed to it, so the
//! caller decides which snapshot of the index the descriptors reflect.
use std::ops::Range;

use crate::{
    config::{RefConfig, SourceFilter},
    error::RefIndexError,
    paths::LinkResolver,
    properties::{DecorationDescriptor, EnumSet, ReferenceKind, TransformedCache},
};

pub mod recognizer;


pub use recognizer::{dispatch_table, kind_for_token, RawMatch, Recognizer};

/// Largest char boundary of `text` not after `idx`.
fn floor_char_boundary(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Clamp `window` to `text` and widen it to whole lines. Returns the clamped window and the
/// widened scan range.
pub fn line_window(text: &str, window: &Range<usize>) -> (Range<usize>, Range<usize>) {
    let start = floor_char_boundary(text, window.start);
    let end = floor_char_boundary(text, window.end).max(start);
    let line_start = text[..start].rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let line_end = text[end..]
        .find('\n')
        .map(|idx| end + idx)
        .unwrap_or(text.len());
    (start..end, line_start..line_end)
}

/// Byte ranges of the fenced code blocks of `text` (fence lines included) that open before
/// `upto`. An unclosed fence runs to the end of the text.
pub fn fenced_ranges(text: &str, upto: usize) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    // (start, fence char, fence length)
    let mut open: Option<(usize, char, usize)> = None;
    let mut line_start = 0;
    for line in text.split_inclusive('\n') {
        if line_start >= upto {
            break;
        }
        let line_end = line_start + line.len();
        let body = line.trim_start_matches(' ');
        let fence = body
            .chars()
            .next()
            .filter(|c| *c == '`' || *c == '~')
            .map(|c| (c, body.chars().take_while(|ch| *ch == c).count()))
            .filter(|(_, run)| *run >= 3 && line.len() - body.len() <= 3);
        if let Some((fence_char, run)) = fence {
            match open {
                None => open = Some((line_start, fence_char, run)),
                Some((start, open_char, open_run))
                    if fence_char == open_char
                        && run >= open_run
                        && body[run..].trim().is_empty() =>
                {
                    ranges.push(start..line_end);
                    open = None;
                }
                Some(_) => {}
            }
        }
        line_start = line_end;
    }
    if let Some((start, _, _)) = open {
        ranges.push(start..text.len());
    }
    ranges
}

#[derive(Debug, Clone)]
pub struct MatchEngine {
    recognizers: Vec<Recognizer>,
    min_count: usize,
    filter: SourceFilter,
}

impl Default for MatchEngine {
    fn default() -> Self {
        MatchEngine::new(ReferenceKind::all(), 1, SourceFilter::default())
    }
}

impl MatchEngine {
    /// Only the recognizers for `kinds` are compiled in. `min_count` is raised to 1.
    pub fn new(kinds: EnumSet<ReferenceKind>, min_count: usize, filter: SourceFilter) -> MatchEngine {
        MatchEngine {
            recognizers: dispatch_table(kinds),
            min_count: min_count.max(1),
            filter,
        }
    }

    pub fn from_config(config: &RefConfig) -> Result<MatchEngine, RefIndexError> {
        Ok(MatchEngine::new(
            config.enabled_kinds,
            config.min_count(),
            config.source_filter()?,
        ))
    }

    pub fn kinds(&self) -> EnumSet<ReferenceKind> {
        self.recognizers.iter().map(|r| r.kind).collect()
    }

    pub fn min_count(&self) -> usize {
        self.min_count
    }

    /// Descriptors for every resolvable construct of `text` ending inside the half-open
    /// `window`, sorted by offset (kind order on ties).
    ///
    /// `text` is the full content of `page.path`; `window` is a byte range into it. A construct
    /// ending at the very end of the text is only kept by a window reaching past `text.len()`.
    pub fn compute(
        &self,
        text: &str,
        window: Range<usize>,
        page: &TransformedCache,
        resolver: &LinkResolver,
    ) -> Vec<DecorationDescriptor> {
        if window.is_empty() || window.start > text.len() {
            return Vec::new();
        }
        let (_, scan) = line_window(text, &window);
        let fenced = fenced_ranges(text, scan.end);
        let scanned = &text[scan.clone()];

        let mut descriptors = Vec::new();
        for recognizer in self.recognizers.iter() {
            for raw in recognizer.scan(scanned, scan.start) {
                if !window.contains(&raw.end) {
                    continue;
                }
                if fenced.iter().any(|fence| fence.contains(&raw.end)) {
                    continue;
                }
                let Some(key) = recognizer.resolve(raw.capture, &page.path, resolver) else {
                    continue;
                };
                let Some(item) = page.find(raw.kind, &key) else {
                    tracing::trace!(
                        "[MatchEngine::compute] no {} item for {} in {}",
                        raw.kind,
                        key,
                        page.path
                    );
                    continue;
                };
                if item.count() < self.min_count {
                    continue;
                }
                if let Some(first) = item.edges.first() {
                    if self.filter.is_excluded(&first.source) {
                        continue;
                    }
                }
                descriptors.push(DecorationDescriptor::new(raw.kind, raw.end, item));
            }
        }
        descriptors.sort_by_key(|desc| (desc.offset, desc.kind));
        descriptors
    }
}
