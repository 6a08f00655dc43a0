//! Turns buffer content into styled terminal lines.

use std::ops::Range;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use super::viewport::Viewport;
use crate::buffer::{lines, Buffer, ViewMode};
use crate::hex;
use crate::search::SearchResult;

const OFFSET_WIDTH: usize = 8;

/// Search and selection state drawn over the content
#[derive(Debug, Clone, Copy, Default)]
pub struct Highlights<'a> {
    pub matches: &'a [SearchResult],
    pub current: Option<&'a SearchResult>,
    /// Normalized `(start, end)` byte range, end exclusive
    pub selection: Option<(usize, usize)>,
}

impl Highlights<'_> {
    /// Per-byte marks for `window`: 3 = selected, 2 = current match,
    /// 1 = other match
    fn marks(&self, window: Range<usize>) -> Vec<u8> {
        let mut marks = vec![0u8; window.len()];
        let mut mark = |range: Range<usize>, level: u8| {
            let start = range.start.max(window.start);
            let end = range.end.min(window.end);
            for i in start..end {
                marks[i - window.start] = marks[i - window.start].max(level);
            }
        };

        let visible = self.matches.partition_point(|m| m.position < window.end);
        for m in &self.matches[..visible] {
            mark(m.position..m.end(), 1);
        }
        if let Some(current) = self.current {
            mark(current.position..current.end(), 2);
        }
        if let Some((start, end)) = self.selection {
            mark(start..end, 3);
        }
        marks
    }
}

fn cell_style(is_cursor: bool, mark: u8) -> Style {
    let style = match mark {
        3 => Style::default().bg(Color::Blue).fg(Color::White),
        2 => Style::default().bg(Color::Yellow).fg(Color::Black),
        1 => Style::default().fg(Color::Yellow),
        _ => Style::default(),
    };
    if is_cursor {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    }
}

/// Rows of the hex grid visible in `viewport`: offset, hex bytes, ASCII.
///
/// `pending_nibble` is a half-typed byte shown in place of the cursor byte.
pub fn hex_lines(
    buffer: &mut Buffer,
    viewport: &Viewport,
    highlights: &Highlights<'_>,
    pending_nibble: Option<u8>,
) -> Vec<Line<'static>> {
    let width = buffer.bytes_per_line();
    let cursor = buffer.cursor_offset();
    // The append position needs a row of its own when the last row is full
    let rows = buffer.line_count().max(cursor / width + 1);
    let end = viewport.end_line().min(rows);

    let mut out = Vec::with_capacity(end.saturating_sub(viewport.start_line));
    for row in viewport.start_line..end {
        let line = buffer.get_line(row);
        let marks = highlights.marks(line.offset..line.offset + width);

        let mut spans = vec![Span::styled(
            format!("{}  ", hex::format_offset(line.offset, OFFSET_WIDTH)),
            Style::default().fg(Color::DarkGray),
        )];

        for i in 0..width {
            let position = line.offset + i;
            let is_cursor = position == cursor;
            let text = match (line.bytes.get(i), pending_nibble) {
                (_, Some(high)) if is_cursor => format!("{:X}_", high),
                (Some(byte), _) => format!("{:02X}", byte),
                (None, _) if is_cursor => "__".to_string(),
                (None, _) => "  ".to_string(),
            };
            spans.push(Span::styled(text, cell_style(is_cursor, marks[i])));
            spans.push(Span::raw(" "));
        }

        spans.push(Span::raw(" "));
        for (i, byte) in line.bytes.iter().enumerate() {
            let glyph = (hex::ascii_glyph(*byte) as char).to_string();
            let is_cursor = line.offset + i == cursor;
            spans.push(Span::styled(glyph, cell_style(is_cursor, marks[i])));
        }

        out.push(Line::from(spans));
    }
    out
}

/// Text lines visible in `viewport` with a line-number gutter
pub fn code_lines(
    buffer: &Buffer,
    viewport: &Viewport,
    highlights: &Highlights<'_>,
) -> Vec<Line<'static>> {
    let all = buffer.lines();
    let cursor = buffer.cursor();
    let gutter = all.len().to_string().len().max(3);
    let end = viewport.end_line().min(all.len());

    let mut offset = lines::line_start(all, viewport.start_line);
    let mut out = Vec::with_capacity(end.saturating_sub(viewport.start_line));
    for (index, text) in all.iter().enumerate().take(end).skip(viewport.start_line) {
        let marks = highlights.marks(offset..offset + text.len() + 1);

        let mut spans = vec![Span::styled(
            format!("{:>width$} ", index + 1, width = gutter),
            Style::default().fg(Color::DarkGray),
        )];

        let mut col = 0;
        for (byte, ch) in text.char_indices() {
            let is_cursor = index == cursor.line && col == cursor.col;
            spans.push(Span::styled(ch.to_string(), cell_style(is_cursor, marks[byte])));
            col += 1;
        }
        if index == cursor.line && cursor.col >= col {
            spans.push(Span::styled(" ", cell_style(true, 0)));
        }

        out.push(Line::from(spans));
        offset += text.len() + 1;
    }
    out
}

pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// One-line summary of a buffer for the status bar
pub fn status_line(buffer: &Buffer, index: usize, count: usize) -> String {
    let name = buffer
        .path()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("[scratch]");

    let position = match buffer.mode() {
        ViewMode::Binary => format!("0x{:X} +{}", buffer.cursor_offset(), buffer.cursor_column()),
        ViewMode::Text => format!("{}:{}", buffer.cursor_line() + 1, buffer.cursor_column() + 1),
    };

    let mut flags = String::new();
    if buffer.is_modified() {
        flags.push_str(" [+]");
    }
    if buffer.is_chunked() {
        flags.push_str(" [RO]");
    }

    format!(
        " [{}/{}] {}{} ({}) | {} {}| {}",
        index + 1,
        count,
        name,
        flags,
        format_size(buffer.size()),
        buffer.mode().label(),
        buffer.language().map(|l| format!("{} ", l)).unwrap_or_default(),
        position
    )
}
