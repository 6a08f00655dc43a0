pub mod chunk_cache;
pub mod classify;
pub mod cursor;
pub mod lines;
mod storage;

#[cfg(test)]
mod tests;

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use chunk_cache::ChunkCache;
pub use classify::Classification;
pub use cursor::Cursor;

use crate::config::EditorConfig;
use crate::edit::undo::{HistoryEntry, UndoStack};
use crate::edit::{Action, EditTarget};
use crate::error::{EditError, Result};
use crate::hex;
use crate::syntax::LanguageDetector;
use storage::{MappedFile, Storage};

/// How the buffer's content is addressed and displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Byte offsets, rendered as a hex grid
    Binary,
    /// (line, column), rendered as decoded text
    Text,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Binary => "binary",
            ViewMode::Text => "text",
        }
    }
}

/// Cursor motions understood by [`Buffer::move_cursor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Left,
    Right,
    Up,
    Down,
    PageUp(usize),
    PageDown(usize),
    LineStart,
    LineEnd,
    Top,
    Bottom,
}

/// One row of the hex grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexLine {
    pub offset: usize,
    pub bytes: Vec<u8>,
    pub ascii: String,
}

/// An open file, viewed either as bytes or as lines of text.
///
/// Binary content lives either fully in memory or behind a read-only
/// mapping with a chunk cache; only resident content can be mutated. In text
/// mode `lines` is authoritative and the byte storage is released.
pub struct Buffer {
    storage: Storage,
    mode: ViewMode,
    lines: Vec<String>,
    language: Option<String>,
    cursor: Cursor,
    selection: Option<(usize, usize)>,
    history: UndoStack,
    modified: bool,
    path: Option<PathBuf>,
    bytes_per_line: usize,
    config: EditorConfig,
}

impl Buffer {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            storage: Storage::default(),
            mode: ViewMode::Binary,
            lines: Vec::new(),
            language: None,
            cursor: Cursor::new(),
            selection: None,
            history: UndoStack::new(config.history_capacity),
            modified: false,
            path: None,
            bytes_per_line: config.bytes_per_line.max(1),
            config,
        }
    }

    /// Resident binary buffer over `data`
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        let mut buffer = Self::new();
        buffer.storage = Storage::Resident(data.into());
        buffer
    }

    /// Text buffer over `text`, with no language attached
    pub fn from_text(text: &str) -> Self {
        let mut buffer = Self::new();
        buffer.mode = ViewMode::Text;
        buffer.lines = classify::decode_lines(text.as_bytes());
        buffer
    }

    /// Empty text buffer for a path that does not exist yet
    pub fn new_file(
        path: impl AsRef<Path>,
        config: EditorConfig,
        detector: &dyn LanguageDetector,
    ) -> Self {
        let path = path.as_ref();
        let mut buffer = Self::with_config(config);
        buffer.mode = ViewMode::Text;
        buffer.lines = vec![String::new()];
        buffer.language = detector.detect_language(&path.to_string_lossy(), "");
        buffer.path = Some(path.to_path_buf());
        buffer
    }

    /// Open `path`, loading it resident or mapped depending on its size
    pub fn open(
        path: impl AsRef<Path>,
        config: EditorConfig,
        detector: &dyn LanguageDetector,
    ) -> Result<Self> {
        let mut buffer = Self::with_config(config);
        buffer.load_file(path, detector)?;
        Ok(buffer)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>, detector: &dyn LanguageDetector) -> Result<()> {
        let path = path.as_ref();
        let open_error = |source: io::Error| EditError::Open {
            path: path.to_path_buf(),
            source,
        };

        let size = fs::metadata(path).map_err(open_error)?.len();

        // Read everything before touching the current state so a failed
        // reload keeps the old content
        let (storage, sample) = if size > 0 && size > self.config.large_file_threshold {
            let mut mapped =
                MappedFile::open(path, self.config.chunk_size, self.config.cache_capacity)
                    .map_err(open_error)?;
            let first = mapped.chunk(0);
            let sample = first[..first.len().min(self.config.sample_size)].to_vec();
            (Storage::Mapped(mapped), sample)
        } else {
            let data = fs::read(path).map_err(open_error)?;
            let sample = data[..data.len().min(self.config.sample_size)].to_vec();
            (Storage::Resident(data), sample)
        };

        self.close();
        self.reset();
        self.storage = storage;
        self.path = Some(path.to_path_buf());

        self.detect_file_type(&path.to_string_lossy(), &sample, detector);

        tracing::debug!(
            path = %path.display(),
            size,
            chunked = self.is_chunked(),
            mode = self.mode.label(),
            language = ?self.language,
            "loaded file"
        );

        Ok(())
    }

    fn reset(&mut self) {
        self.storage = Storage::default();
        self.mode = ViewMode::Binary;
        self.lines.clear();
        self.language = None;
        self.cursor = Cursor::new();
        self.selection = None;
        self.history.clear();
        self.modified = false;
    }

    fn detect_file_type(&mut self, filename: &str, sample: &[u8], detector: &dyn LanguageDetector) {
        match classify::classify(filename, sample, detector) {
            Classification::Binary => {
                self.mode = ViewMode::Binary;
                self.language = None;
            }
            Classification::Text { language } => {
                self.mode = ViewMode::Text;
                self.language = Some(language);
                self.lines = classify::decode_lines(self.storage.as_slice());
                // Lines are authoritative from here on; drop the bytes and
                // any mapping so saving over the file is safe
                self.close();
                self.storage = Storage::default();
            }
        }
    }

    /// Copy a mapped file fully into memory so it can be edited
    pub fn materialize(&mut self) -> Result<()> {
        let Storage::Mapped(mapped) = &self.storage else {
            return Ok(());
        };

        let data = if mapped.len() > 0 {
            mapped.bytes().to_vec()
        } else {
            let path = mapped.path().to_path_buf();
            fs::read(&path).map_err(|source| EditError::Open { path, source })?
        };

        self.close();
        tracing::debug!(bytes = data.len(), "materialized mapped file");
        self.storage = Storage::Resident(data);
        Ok(())
    }

    /// Release the backing mapping, if any. Safe to call more than once.
    pub fn close(&mut self) {
        if let Storage::Mapped(mapped) = &mut self.storage {
            mapped.close();
        }
    }

    // ---- accessors ----

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.storage, Storage::Mapped(_))
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_count(&self) -> usize {
        self.history.undo_count()
    }

    pub fn redo_count(&self) -> usize {
        self.history.redo_count()
    }

    /// Chunk cache of a mapped buffer
    pub fn chunk_cache(&self) -> Option<&ChunkCache> {
        match &self.storage {
            Storage::Mapped(mapped) => Some(mapped.cache()),
            Storage::Resident(_) => None,
        }
    }

    /// Byte size of the authoritative content
    pub fn size(&self) -> usize {
        match self.mode {
            ViewMode::Text => lines::joined_len(&self.lines),
            ViewMode::Binary => self.storage.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Hex rows in binary mode, text lines in text mode
    pub fn line_count(&self) -> usize {
        match self.mode {
            ViewMode::Text => self.lines.len(),
            ViewMode::Binary => self.storage.len().div_ceil(self.bytes_per_line),
        }
    }

    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    /// Fit the hex grid to a window `width` columns wide: an offset column,
    /// three columns per byte, rounded down to a multiple of 8 (minimum 8).
    pub fn set_bytes_per_line(&mut self, width: usize) {
        let hex_width = width.saturating_sub(10);
        let max_bytes = hex_width.saturating_sub(2) / 3;
        self.bytes_per_line = ((max_bytes / 8) * 8).max(8);
    }

    /// Content the search engine scans: resident bytes, the mapped bytes,
    /// or the text lines joined with `\n`.
    pub fn raw_bytes(&self) -> Cow<'_, [u8]> {
        match self.mode {
            ViewMode::Text => Cow::Owned(lines::join(&self.lines)),
            ViewMode::Binary => Cow::Borrowed(self.storage.as_slice()),
        }
    }

    /// One hex grid row. Mapped content is read through the chunk cache.
    pub fn get_line(&mut self, line_number: usize) -> HexLine {
        let offset = line_number.saturating_mul(self.bytes_per_line);
        let bytes = self.storage.read_range(offset, self.bytes_per_line);
        HexLine {
            offset,
            ascii: hex::ascii_string(&bytes),
            bytes,
        }
    }

    /// Random access to the byte storage, through the chunk cache if mapped
    pub fn read_range(&mut self, start: usize, len: usize) -> Vec<u8> {
        self.storage.read_range(start, len)
    }

    pub fn read_byte(&mut self, position: usize) -> Option<u8> {
        self.storage.read_range(position, 1).first().copied()
    }

    pub fn get_code_line(&self, line_number: usize) -> &str {
        if self.mode != ViewMode::Text {
            return "";
        }
        self.lines.get(line_number).map_or("", String::as_str)
    }

    // ---- cursor & selection ----

    /// Row of the cursor: the hex row in binary mode
    pub fn cursor_line(&self) -> usize {
        match self.mode {
            ViewMode::Text => self.cursor.line,
            ViewMode::Binary => self.cursor.offset / self.bytes_per_line,
        }
    }

    pub fn cursor_column(&self) -> usize {
        match self.mode {
            ViewMode::Text => self.cursor.col,
            ViewMode::Binary => self.cursor.offset % self.bytes_per_line,
        }
    }

    /// Cursor as a byte offset into [`Buffer::raw_bytes`]
    pub fn cursor_offset(&self) -> usize {
        match self.mode {
            ViewMode::Binary => self.cursor.offset,
            ViewMode::Text => {
                let Some(line) = self.lines.get(self.cursor.line) else {
                    return self.size();
                };
                lines::line_start(&self.lines, self.cursor.line)
                    + lines::char_to_byte(line, self.cursor.col)
            }
        }
    }

    /// Place the cursor at a byte offset of [`Buffer::raw_bytes`]
    pub fn set_cursor_offset(&mut self, offset: usize) {
        match self.mode {
            ViewMode::Binary => self.cursor.offset = offset.min(self.size()),
            ViewMode::Text => {
                let (line, col) = self.position_to_line_col(offset);
                self.cursor.set_position(line, col);
            }
        }
    }

    pub fn set_cursor_line_col(&mut self, line: usize, col: usize) {
        self.cursor.set_position(line, col);
        self.clamp_cursor();
    }

    /// `(line, character column)` of a byte offset into the joined text
    pub fn position_to_line_col(&self, offset: usize) -> (usize, usize) {
        let (line, byte) = lines::locate(&self.lines, offset);
        let col = self
            .lines
            .get(line)
            .map_or(0, |text| lines::byte_to_char(text, byte));
        (line, col)
    }

    pub fn move_cursor(&mut self, motion: CursorMove) {
        match self.mode {
            ViewMode::Binary => self.move_offset_cursor(motion),
            ViewMode::Text => self.move_text_cursor(motion),
        }
    }

    fn move_offset_cursor(&mut self, motion: CursorMove) {
        let size = self.size();
        let row = self.bytes_per_line as isize;
        match motion {
            CursorMove::Left => self.cursor.step_offset(-1, size),
            CursorMove::Right => self.cursor.step_offset(1, size),
            CursorMove::Up => self.cursor.step_offset(-row, size),
            CursorMove::Down => self.cursor.step_offset(row, size),
            CursorMove::PageUp(rows) => self.cursor.step_offset(-row * rows as isize, size),
            CursorMove::PageDown(rows) => self.cursor.step_offset(row * rows as isize, size),
            CursorMove::LineStart => {
                self.cursor.offset -= self.cursor.offset % self.bytes_per_line;
            }
            CursorMove::LineEnd => {
                let start = self.cursor.offset - self.cursor.offset % self.bytes_per_line;
                self.cursor.offset = (start + self.bytes_per_line - 1).min(size);
            }
            CursorMove::Top => self.cursor.offset = 0,
            CursorMove::Bottom => self.cursor.offset = size,
        }
    }

    fn move_text_cursor(&mut self, motion: CursorMove) {
        match motion {
            CursorMove::Left => {
                if self.cursor.col == 0 && self.cursor.line > 0 {
                    self.cursor.move_up();
                    let len = lines::char_len(self.get_code_line(self.cursor.line));
                    self.cursor.move_to_line_end(len);
                } else {
                    self.cursor.move_left();
                }
            }
            CursorMove::Right => {
                let len = lines::char_len(self.get_code_line(self.cursor.line));
                if self.cursor.col >= len && self.cursor.line + 1 < self.lines.len() {
                    self.cursor.move_down();
                    self.cursor.move_to_line_start();
                } else {
                    self.cursor.move_right();
                }
            }
            CursorMove::Up => self.cursor.move_up(),
            CursorMove::Down => self.cursor.move_down(),
            CursorMove::PageUp(rows) => self.cursor.line = self.cursor.line.saturating_sub(rows),
            CursorMove::PageDown(rows) => self.cursor.line = self.cursor.line.saturating_add(rows),
            CursorMove::LineStart => self.cursor.move_to_line_start(),
            CursorMove::LineEnd => {
                let len = lines::char_len(self.get_code_line(self.cursor.line));
                self.cursor.move_to_line_end(len);
            }
            CursorMove::Top => self.cursor.set_position(0, 0),
            CursorMove::Bottom => {
                let last = self.lines.len().saturating_sub(1);
                let len = lines::char_len(self.get_code_line(last));
                self.cursor.set_position(last, len);
            }
        }
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        match self.mode {
            ViewMode::Binary => self.cursor.offset = self.cursor.offset.min(self.size()),
            ViewMode::Text => {
                let last = self.lines.len().saturating_sub(1);
                self.cursor.line = self.cursor.line.min(last);
                let len = lines::char_len(self.get_code_line(self.cursor.line));
                self.cursor.col = self.cursor.col.min(len);
            }
        }
    }

    /// Selection as `(start, end)` with `start <= end`
    pub fn selection(&self) -> Option<(usize, usize)> {
        self.selection.map(|(a, b)| (a.min(b), a.max(b)))
    }

    pub fn set_selection(&mut self, anchor: usize, head: usize) {
        self.selection = Some((anchor, head));
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    // ---- binary mutation ----

    /// Insert `value` before `position` (clamped to the end of content)
    pub fn insert_byte(&mut self, position: usize, value: u32) -> Result<bool> {
        let byte = validate_byte(value)?;
        let size = self.resident_len()?;

        let before = self.cursor;
        let action = Action::Insert {
            position: position.min(size),
            byte,
        };
        action.apply(self);
        self.commit(action, before);
        Ok(true)
    }

    /// Remove the byte at `position`; out-of-range positions are ignored
    pub fn delete_byte(&mut self, position: usize) -> Result<bool> {
        self.resident_len()?;
        let Some(byte) = self.storage.as_slice().get(position).copied() else {
            return Ok(false);
        };

        let before = self.cursor;
        let action = Action::Delete { position, byte };
        action.apply(self);
        self.clamp_cursor();
        self.commit(action, before);
        Ok(true)
    }

    /// Overwrite the byte at `position`; writing the same value records nothing
    pub fn replace_byte(&mut self, position: usize, value: u32) -> Result<bool> {
        let byte = validate_byte(value)?;
        self.resident_len()?;
        let Some(old) = self.storage.as_slice().get(position).copied() else {
            return Ok(false);
        };
        if old == byte {
            return Ok(false);
        }

        let before = self.cursor;
        let action = Action::Replace {
            position,
            old,
            new: byte,
        };
        action.apply(self);
        self.commit(action, before);
        Ok(true)
    }

    /// Whether `replace_range` can mutate this buffer
    pub fn check_replaceable(&self) -> Result<()> {
        match self.mode {
            ViewMode::Text => Ok(()),
            ViewMode::Binary => self.resident_len().map(|_| ()),
        }
    }

    /// Replace `len` bytes at `position` of [`Buffer::raw_bytes`] with
    /// `replacement`. Binary buffers record a `ReplaceRange`; text buffers
    /// record the affected line edits. The cursor ends up after the
    /// replacement.
    pub fn replace_range(&mut self, position: usize, len: usize, replacement: &[u8]) -> Result<bool> {
        match self.mode {
            ViewMode::Binary => {
                let before = self.cursor;
                let size = self.resident_len()?;
                if position > size {
                    return Ok(false);
                }
                let end = position.saturating_add(len).min(size);
                let old_bytes = self.storage.as_slice()[position..end].to_vec();
                if old_bytes == replacement {
                    return Ok(false);
                }

                let action = Action::ReplaceRange {
                    position,
                    old_bytes,
                    new_bytes: replacement.to_vec(),
                };
                action.apply(self);
                self.cursor.offset = position + replacement.len();
                self.commit(action, before);
                Ok(true)
            }
            ViewMode::Text => {
                Ok(self.replace_text_range(position, position.saturating_add(len), replacement))
            }
        }
    }

    // ---- text mutation ----

    /// Insert `text` at a character column; newlines in `text` split the line.
    /// Line and column are clamped to the existing text.
    pub fn insert_text(&mut self, line: usize, column: usize, text: &str) -> bool {
        if self.mode != ViewMode::Text || text.is_empty() || self.lines.is_empty() {
            return false;
        }
        let line = line.min(self.lines.len() - 1);
        let at = lines::line_start(&self.lines, line) + lines::char_to_byte(&self.lines[line], column);
        self.replace_text_range(at, at, text.as_bytes())
    }

    /// Replace bytes `[start, end)` of the joined text. The range may span
    /// lines and `replacement` may contain newlines. The cursor ends up
    /// after the replacement.
    ///
    /// Nothing is recorded if either end splits a character or the
    /// replacement is not UTF-8.
    pub fn replace_text_range(&mut self, start: usize, end: usize, replacement: &[u8]) -> bool {
        if self.mode != ViewMode::Text
            || !lines::is_char_boundary(&self.lines, start)
            || !lines::is_char_boundary(&self.lines, end)
            || std::str::from_utf8(replacement).is_err()
        {
            return false;
        }

        let before = self.cursor;
        let Some(action) = self.splice_text(start, end, replacement) else {
            return false;
        };

        self.set_cursor_offset(start.min(self.size()) + replacement.len());
        self.commit(action, before);
        true
    }

    /// Delete characters `[start_col, end_col)` of one line
    pub fn delete_text(&mut self, line: usize, start_col: usize, end_col: usize) -> bool {
        if self.mode != ViewMode::Text {
            return false;
        }
        let Some(current) = self.lines.get(line) else {
            return false;
        };

        let start = lines::char_to_byte(current, start_col);
        let end = lines::char_to_byte(current, end_col);
        if start >= end {
            return false;
        }

        let mut new_text = current.clone();
        new_text.replace_range(start..end, "");
        let action = Action::ReplaceLine {
            line,
            old_text: current.clone(),
            new_text,
        };

        let before = self.cursor;
        action.apply(self);
        self.cursor
            .set_position(line, start_col.min(lines::char_len(self.get_code_line(line))));
        self.commit(action, before);
        true
    }

    /// Insert a whole line before `line` (clamped to the end)
    pub fn insert_line(&mut self, line: usize, text: &str) -> bool {
        if self.mode != ViewMode::Text {
            return false;
        }

        let line = line.min(self.lines.len());
        let action = Action::InsertLine {
            line,
            text: text.to_string(),
        };

        let before = self.cursor;
        action.apply(self);
        if self.cursor.line >= line && self.lines.len() > 1 {
            self.cursor.move_down();
        }
        self.clamp_cursor();
        self.commit(action, before);
        true
    }

    pub fn delete_line(&mut self, line: usize) -> bool {
        if self.mode != ViewMode::Text {
            return false;
        }
        let Some(text) = self.lines.get(line).cloned() else {
            return false;
        };

        // The last remaining line is emptied rather than removed
        let action = if self.lines.len() == 1 {
            if text.is_empty() {
                return false;
            }
            Action::ReplaceLine {
                line,
                old_text: text,
                new_text: String::new(),
            }
        } else {
            Action::DeleteLine { line, text }
        };
        let before = self.cursor;
        action.apply(self);
        if self.cursor.line > line {
            self.cursor.move_up();
        }
        self.clamp_cursor();
        self.commit(action, before);
        true
    }

    /// Join `line` with the one after it
    pub fn join_lines(&mut self, line: usize) -> bool {
        if self.mode != ViewMode::Text || line + 1 >= self.lines.len() {
            return false;
        }
        let newline = lines::line_start(&self.lines, line) + self.lines[line].len();
        let col = lines::char_len(&self.lines[line]);
        let before = self.cursor;
        let Some(action) = self.splice_text(newline, newline + 1, b"") else {
            return false;
        };
        self.cursor.set_position(line, col);
        self.commit(action, before);
        true
    }

    /// Splice bytes `[start, end)` of the joined text and return the
    /// line-level actions that did it, already applied.
    fn splice_text(&mut self, start: usize, end: usize, replacement: &[u8]) -> Option<Action> {
        let total = lines::joined_len(&self.lines);
        let start = start.min(total);
        let end = end.clamp(start, total);

        if self.lines.is_empty() {
            return None;
        }

        let (first, first_byte) = lines::locate(&self.lines, start);
        let (last, last_byte) = lines::locate(&self.lines, end);

        let mut merged = self.lines[first].as_bytes()[..first_byte].to_vec();
        merged.extend_from_slice(replacement);
        merged.extend_from_slice(&self.lines[last].as_bytes()[last_byte..]);
        let merged = String::from_utf8_lossy(&merged).into_owned();

        let mut pieces = merged.split('\n');
        let head = pieces.next().unwrap_or_default();

        let mut actions = Vec::new();
        if head != self.lines[first] {
            actions.push(Action::ReplaceLine {
                line: first,
                old_text: self.lines[first].clone(),
                new_text: head.to_string(),
            });
        }
        for removed in &self.lines[first + 1..=last] {
            actions.push(Action::DeleteLine {
                line: first + 1,
                text: removed.clone(),
            });
        }
        for (i, text) in pieces.enumerate() {
            actions.push(Action::InsertLine {
                line: first + 1 + i,
                text: text.to_string(),
            });
        }

        let action = Action::group(actions)?;
        action.apply(self);
        Some(action)
    }

    // ---- history ----

    fn commit(&mut self, action: Action, cursor_before: Cursor) {
        tracing::trace!(kind = action.kind(), "recorded action");
        self.history
            .record(HistoryEntry::new(action, cursor_before, self.cursor));
        self.modified = true;
    }

    /// Group every mutation until [`Buffer::end_batch`] into one undo unit
    pub fn begin_batch(&mut self) {
        self.history.begin_batch(self.cursor);
    }

    pub fn end_batch(&mut self) -> bool {
        self.history.end_batch(self.cursor)
    }

    /// Revert the most recent action. Returns `false` if there was none.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.pop_undo() else {
            return false;
        };

        entry.action.revert(self);
        self.cursor = match &entry.action {
            Action::ReplaceRange { position, .. } => Cursor::at_offset(*position),
            Action::ReplaceLine { line, .. } => Cursor::at_line_col(*line, 0),
            _ => entry.cursor_before,
        };
        self.clamp_cursor();

        tracing::debug!(kind = entry.action.kind(), "undo");
        self.history.push_redo(entry);
        self.modified = self.history.can_undo();
        true
    }

    /// Re-apply the most recently undone action. Returns `false` if there
    /// was none.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.pop_redo() else {
            return false;
        };

        entry.action.apply(self);
        self.cursor = match &entry.action {
            Action::ReplaceRange {
                position,
                new_bytes,
                ..
            } => Cursor::at_offset(position + new_bytes.len()),
            Action::ReplaceLine { line, .. } => Cursor::at_line_col(*line, 0),
            _ => entry.cursor_after,
        };
        self.clamp_cursor();

        tracing::debug!(kind = entry.action.kind(), "redo");
        self.history.push_undo(entry);
        self.modified = true;
        true
    }

    // ---- persistence ----

    pub fn save(&mut self) -> Result<()> {
        let path = self.path.clone().ok_or(EditError::NoPath)?;
        self.save_as(path)
    }

    /// Write the content to `path` and adopt it as the buffer's file.
    /// On failure nothing about the buffer changes.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let target = path.as_ref();
        let save_error = |source: io::Error| EditError::Save {
            path: target.to_path_buf(),
            source,
        };

        match (&self.mode, &self.storage) {
            (ViewMode::Text, _) => fs::write(target, self.lines.join("\n")).map_err(save_error)?,
            (ViewMode::Binary, Storage::Resident(data)) => {
                fs::write(target, data).map_err(save_error)?
            }
            (ViewMode::Binary, Storage::Mapped(mapped)) => {
                mapped.copy_to(target).map_err(save_error)?
            }
        }

        tracing::info!(path = %target.display(), bytes = self.size(), "saved");
        self.path = Some(target.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// Length of resident binary content, or why it cannot be mutated
    fn resident_len(&self) -> Result<usize> {
        if self.mode != ViewMode::Binary {
            return Err(EditError::WrongMode { expected: "binary" });
        }
        match &self.storage {
            Storage::Resident(data) => Ok(data.len()),
            Storage::Mapped(_) => Err(EditError::ReadOnly),
        }
    }
}

impl EditTarget for Buffer {
    fn splice_bytes(&mut self, position: usize, remove: usize, insert: &[u8]) {
        if let Storage::Resident(data) = &mut self.storage {
            let start = position.min(data.len());
            let end = start.saturating_add(remove).min(data.len());
            data.splice(start..end, insert.iter().copied());
        }
    }

    fn set_line(&mut self, index: usize, text: &str) {
        if let Some(line) = self.lines.get_mut(index) {
            *line = text.to_string();
        }
    }

    fn insert_line(&mut self, index: usize, text: &str) {
        let index = index.min(self.lines.len());
        self.lines.insert(index, text.to_string());
    }

    fn remove_line(&mut self, index: usize) {
        if index < self.lines.len() {
            self.lines.remove(index);
        }
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.close();
    }
}

fn validate_byte(value: u32) -> Result<u8> {
    u8::try_from(value).map_err(|_| EditError::InvalidByte(value))
}
