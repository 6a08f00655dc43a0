//! Find and replace over a [`Buffer`]'s content.
//!
//! In binary mode positions are byte offsets into the content. In text mode
//! they are byte offsets into the lines joined with `\n`; use
//! [`Buffer::position_to_line_col`] to place a text cursor on a result.

pub mod pattern;

use std::fmt;
use std::ops::ControlFlow;

use thiserror::Error;

use crate::buffer::Buffer;
use crate::error::{EditError, Result};
use crate::hex;
use pattern::Matcher;

/// Matching discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchKind {
    /// Literal text in the ASCII projection
    #[default]
    Text,
    /// Literal byte sequence written as hex digits
    Hex,
    /// Regular expression over the ASCII projection
    Regex,
    /// Glob-style `*` and `?` over the ASCII projection
    Wildcard,
}

impl SearchKind {
    /// Next discipline, for cycling through them in a prompt
    pub fn cycle(self) -> Self {
        match self {
            SearchKind::Text => SearchKind::Hex,
            SearchKind::Hex => SearchKind::Regex,
            SearchKind::Regex => SearchKind::Wildcard,
            SearchKind::Wildcard => SearchKind::Text,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchKind::Text => "text",
            SearchKind::Hex => "hex",
            SearchKind::Regex => "regex",
            SearchKind::Wildcard => "wildcard",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A pattern together with how to interpret it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub pattern: String,
    pub kind: SearchKind,
    pub case_sensitive: bool,
}

impl Query {
    /// Case-insensitive query
    pub fn new(pattern: impl Into<String>, kind: SearchKind) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
            case_sensitive: false,
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

/// One match: where it starts, how long it is, and the raw bytes it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub position: usize,
    pub length: usize,
    pub matched: Vec<u8>,
}

impl SearchResult {
    pub fn end(&self) -> usize {
        self.position + self.length
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.position && position < self.end()
    }
}

/// Why a query could not run. Reported, never fatal.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid hex pattern: {0:?}")]
    InvalidHex(String),

    #[error("invalid pattern {pattern:?}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Search state for one buffer: the last query, the result set the
/// renderer highlights, and the last failure for the status line.
#[derive(Debug, Default)]
pub struct SearchEngine {
    last_query: Option<Query>,
    results: Vec<SearchResult>,
    current: Option<SearchResult>,
    last_error: Option<SearchError>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_query(&self) -> Option<&Query> {
        self.last_query.as_ref()
    }

    /// Matches from the last `find_all`
    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    /// Match from the last `find_next` / `find_previous`
    pub fn current(&self) -> Option<&SearchResult> {
        self.current.as_ref()
    }

    pub fn last_error(&self) -> Option<&SearchError> {
        self.last_error.as_ref()
    }

    pub fn clear(&mut self) {
        self.results.clear();
        self.current = None;
        self.last_error = None;
    }

    /// Compile `query`, remembering it and any failure
    fn prepare(&mut self, query: &Query) -> Option<Matcher> {
        self.last_query = Some(query.clone());
        self.last_error = None;

        match Matcher::compile(query) {
            Ok(matcher) => Some(matcher),
            Err(e) => {
                tracing::warn!(kind = query.kind.label(), "search failed: {}", e);
                self.last_error = Some(e);
                None
            }
        }
    }

    /// First match at or after `start`, or after the cursor if `start` is
    /// `None`. An empty pattern matches nothing.
    pub fn find_next(
        &mut self,
        buffer: &Buffer,
        query: &Query,
        start: Option<usize>,
    ) -> Option<SearchResult> {
        if query.pattern.is_empty() {
            return None;
        }
        let matcher = self.prepare(query)?;

        let start = start.unwrap_or_else(|| buffer.cursor_offset());
        let content = buffer.raw_bytes();
        let found = matcher
            .find_first(&content, start, scan_window(buffer))
            .map(|range| result(&content, range.start, range.len()));

        self.current = found.clone();
        found
    }

    /// Last match of the previous query starting strictly before the cursor
    pub fn find_previous(&mut self, buffer: &Buffer) -> Option<SearchResult> {
        let query = self.last_query.clone()?;
        if query.pattern.is_empty() {
            return None;
        }
        let matcher = self.prepare(&query)?;

        let cursor = buffer.cursor_offset();
        let content = buffer.raw_bytes();

        let mut found = None;
        matcher.scan(&content, 0, scan_window(buffer), |range| {
            if range.start >= cursor {
                return ControlFlow::Break(());
            }
            found = Some(range);
            ControlFlow::Continue(())
        });

        let found = found.map(|range| result(&content, range.start, range.len()));
        self.current = found.clone();
        found
    }

    /// Every match from the start of the content, ascending. Overlapping
    /// matches are all reported. The set is kept for [`Self::results`].
    pub fn find_all(&mut self, buffer: &Buffer, query: &Query) -> Vec<SearchResult> {
        self.results.clear();
        if query.pattern.is_empty() {
            return Vec::new();
        }
        let Some(matcher) = self.prepare(query) else {
            return Vec::new();
        };

        let content = buffer.raw_bytes();
        self.results = matcher
            .find_all(&content, scan_window(buffer))
            .into_iter()
            .map(|range| result(&content, range.start, range.len()))
            .collect();

        tracing::debug!(
            kind = query.kind.label(),
            matches = self.results.len(),
            "find all"
        );
        self.results.clone()
    }

    /// Replace the next match after the cursor.
    ///
    /// A hex query's replacement is parsed as hex; anything else is used as
    /// UTF-8 text. An invalid replacement fails before anything is searched
    /// or written.
    pub fn replace_next(
        &mut self,
        buffer: &mut Buffer,
        query: &Query,
        replacement: &str,
    ) -> Result<bool> {
        let replacement = replacement_bytes(query.kind, replacement)?;
        buffer.check_replaceable()?;

        let Some(found) = self.find_next(buffer, query, None) else {
            return Ok(false);
        };
        buffer.replace_range(found.position, found.length, &replacement)
    }

    /// Replace every match as a single undo step. Returns the number of
    /// replacements made.
    pub fn replace_all(
        &mut self,
        buffer: &mut Buffer,
        query: &Query,
        replacement: &str,
    ) -> Result<usize> {
        let replacement = replacement_bytes(query.kind, replacement)?;
        buffer.check_replaceable()?;

        let matches = self.find_all(buffer, query);
        self.replace_matches(buffer, &matches, &replacement)
    }

    /// Apply `replacement` over a precomputed match set as one batch.
    ///
    /// Matches that overlap an earlier kept match, and empty matches, are
    /// skipped. The rest are replaced from the highest position down so
    /// that the positions of those still pending stay valid.
    pub fn replace_matches(
        &mut self,
        buffer: &mut Buffer,
        matches: &[SearchResult],
        replacement: &[u8],
    ) -> Result<usize> {
        buffer.check_replaceable()?;

        let mut sorted: Vec<&SearchResult> = matches.iter().filter(|m| m.length > 0).collect();
        sorted.sort_by_key(|m| m.position);

        let mut kept: Vec<&SearchResult> = Vec::with_capacity(sorted.len());
        for m in sorted {
            if kept.last().map_or(true, |prev| m.position >= prev.end()) {
                kept.push(m);
            }
        }

        buffer.begin_batch();
        let mut count = 0;
        let mut outcome = Ok(());
        for m in kept.iter().rev() {
            match buffer.replace_range(m.position, m.length, replacement) {
                Ok(true) => count += 1,
                Ok(false) => {}
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        buffer.end_batch();

        self.results.clear();
        self.current = None;
        tracing::debug!(replaced = count, "replace matches");
        outcome.map(|()| count)
    }
}

/// Mapped content is projected a chunk at a time
fn scan_window(buffer: &Buffer) -> Option<usize> {
    buffer.is_chunked().then(|| buffer.config().chunk_size)
}

fn result(content: &[u8], position: usize, length: usize) -> SearchResult {
    SearchResult {
        position,
        length,
        matched: hex::byte_range(content, position, length).to_vec(),
    }
}

/// Replacement bytes for a query of `kind`
pub fn replacement_bytes(kind: SearchKind, replacement: &str) -> Result<Vec<u8>> {
    match kind {
        SearchKind::Hex => hex::parse_hex_string(replacement)
            .ok_or_else(|| EditError::InvalidHex(replacement.to_string())),
        _ => Ok(replacement.as_bytes().to_vec()),
    }
}
