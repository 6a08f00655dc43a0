//! Compilation of the four search disciplines to byte regexes.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::ops::{ControlFlow, Range};

use regex::bytes::{Regex, RegexBuilder};

use super::{Query, SearchError, SearchKind};
use crate::hex;

/// A compiled query.
///
/// Hex patterns run over the raw bytes. Everything else runs over the ASCII
/// projection, which has the same length so positions carry over unchanged.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    raw: bool,
}

impl Matcher {
    pub fn compile(query: &Query) -> Result<Self, SearchError> {
        match query.kind {
            SearchKind::Hex => {
                let bytes = hex::parse_hex_string(&query.pattern)
                    .filter(|bytes| !bytes.is_empty())
                    .ok_or_else(|| SearchError::InvalidHex(query.pattern.clone()))?;
                Ok(Self {
                    regex: build(&query.pattern, &hex_pattern(&bytes), false)?,
                    raw: true,
                })
            }
            SearchKind::Text => Ok(Self {
                regex: build(
                    &query.pattern,
                    &regex::escape(&query.pattern),
                    !query.case_sensitive,
                )?,
                raw: false,
            }),
            SearchKind::Regex => Ok(Self {
                regex: build(&query.pattern, &query.pattern, !query.case_sensitive)?,
                raw: false,
            }),
            // Wildcards ignore the case flag
            SearchKind::Wildcard => Ok(Self {
                regex: build(&query.pattern, &wildcard_pattern(&query.pattern), false)?,
                raw: false,
            }),
        }
    }

    /// The byte sequence this matcher runs over for `content`
    fn haystack<'a>(&self, content: &'a [u8]) -> Cow<'a, [u8]> {
        if self.raw {
            Cow::Borrowed(content)
        } else {
            Cow::Owned(hex::ascii_projection(content))
        }
    }

    /// First match starting at or after `start` and before the end of
    /// `haystack`
    fn find_at(&self, haystack: &[u8], start: usize) -> Option<Range<usize>> {
        if start >= haystack.len() {
            return None;
        }
        self.regex
            .find_at(haystack, start)
            .map(|m| m.range())
            .filter(|range| range.start < haystack.len())
    }

    /// Walk the matches in `content` starting at or after `start`, in
    /// ascending order, restarting one byte after each hit's start so
    /// overlapping matches are reported too. `visit` can stop the walk.
    ///
    /// With a `window`, projected content is built `window` bytes at a time
    /// with one more window of look-ahead, so memory stays bounded on
    /// mapped files. A match that would run past the look-ahead is dropped.
    pub fn scan<F>(&self, content: &[u8], start: usize, window: Option<usize>, mut visit: F)
    where
        F: FnMut(Range<usize>) -> ControlFlow<()>,
    {
        let len = content.len();
        let window = match window {
            Some(window) if !self.raw && window > 0 && len > window => window,
            _ => {
                let haystack = self.haystack(content);
                let mut at = start;
                while let Some(range) = self.find_at(&haystack, at) {
                    at = range.start + 1;
                    if visit(range).is_break() {
                        return;
                    }
                }
                return;
            }
        };

        let mut base = start;
        while base < len {
            let stride_end = (base + window).min(len);
            // One byte of leading context keeps `^` and `\b` honest
            let from = base.saturating_sub(1);
            let to = (stride_end + window).min(len);
            let projected = hex::ascii_projection(&content[from..to]);

            let mut at = base - from;
            while let Some(local) = self.find_at(&projected, at) {
                let range = local.start + from..local.end + from;
                if range.start >= stride_end {
                    break;
                }
                at = local.start + 1;
                if range.end == to && to < len {
                    continue;
                }
                if visit(range).is_break() {
                    return;
                }
            }
            base = stride_end;
        }
    }

    /// Every match in ascending order
    pub fn find_all(&self, content: &[u8], window: Option<usize>) -> Vec<Range<usize>> {
        let mut matches = Vec::new();
        self.scan(content, 0, window, |range| {
            matches.push(range);
            ControlFlow::Continue(())
        });
        matches
    }

    /// First match starting at or after `start`
    pub fn find_first(
        &self,
        content: &[u8],
        start: usize,
        window: Option<usize>,
    ) -> Option<Range<usize>> {
        let mut found = None;
        self.scan(content, start, window, |range| {
            found = Some(range);
            ControlFlow::Break(())
        });
        found
    }
}

fn build(original: &str, pattern: &str, case_insensitive: bool) -> Result<Regex, SearchError> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|source| SearchError::Pattern {
            pattern: original.to_string(),
            source,
        })
}

/// Literal byte sequence, matched without UTF-8 decoding
fn hex_pattern(bytes: &[u8]) -> String {
    let mut pattern = String::from("(?-u)");
    for byte in bytes {
        let _ = write!(pattern, "\\x{:02X}", byte);
    }
    pattern
}

/// `*` is any run, `?` exactly one byte, everything else literal.
/// `.` in the result also spans line breaks.
fn wildcard_pattern(glob: &str) -> String {
    let mut pattern = String::from("(?s)");
    let mut literal = [0u8; 4];
    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut literal))),
        }
    }
    pattern
}
