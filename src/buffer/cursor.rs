/// Cursor position in the buffer.
///
/// Binary mode addresses by `offset`; text mode by `line`/`col`. Only the
/// fields of the buffer's current mode are authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Byte offset (binary mode)
    pub offset: usize,
    /// Line number (0-indexed, text mode)
    pub line: usize,
    /// Column (0-indexed, character position not byte, text mode)
    pub col: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_offset(offset: usize) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    pub fn at_line_col(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            ..Self::default()
        }
    }

    /// Move cursor to the next line
    pub fn move_down(&mut self) {
        self.line = self.line.saturating_add(1);
    }

    /// Move cursor to the previous line
    pub fn move_up(&mut self) {
        self.line = self.line.saturating_sub(1);
    }

    /// Move cursor right one character
    pub fn move_right(&mut self) {
        self.col = self.col.saturating_add(1);
    }

    /// Move cursor left one character
    pub fn move_left(&mut self) {
        self.col = self.col.saturating_sub(1);
    }

    pub fn move_to_line_start(&mut self) {
        self.col = 0;
    }

    /// Place the cursor after the last character
    pub fn move_to_line_end(&mut self, line_length: usize) {
        self.col = line_length;
    }

    /// Step the byte offset by `delta`, saturating at both ends of `0..=size`
    pub fn step_offset(&mut self, delta: isize, size: usize) {
        let target = if delta.is_negative() {
            self.offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.offset.saturating_add(delta as usize)
        };
        self.offset = target.min(size);
    }

    pub fn set_position(&mut self, line: usize, col: usize) {
        self.line = line;
        self.col = col;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_creation() {
        let cursor = Cursor::new();
        assert_eq!(cursor.line, 0);
        assert_eq!(cursor.col, 0);
        assert_eq!(cursor.offset, 0);
        assert_eq!(Cursor::at_offset(42).offset, 42);
        assert_eq!(Cursor::at_line_col(3, 4), Cursor { offset: 0, line: 3, col: 4 });
    }

    #[test]
    fn test_cursor_movement() {
        let mut cursor = Cursor::new();
        cursor.move_down();
        assert_eq!(cursor.line, 1);

        cursor.move_right();
        cursor.move_right();
        assert_eq!(cursor.col, 2);

        cursor.move_up();
        assert_eq!(cursor.line, 0);

        cursor.move_left();
        assert_eq!(cursor.col, 1);
    }

    #[test]
    fn test_cursor_boundaries() {
        let mut cursor = Cursor::new();
        cursor.move_up();
        assert_eq!(cursor.line, 0);

        cursor.move_left();
        assert_eq!(cursor.col, 0);
    }

    #[test]
    fn test_step_offset_clamps() {
        let mut cursor = Cursor::at_offset(4);
        cursor.step_offset(-16, 100);
        assert_eq!(cursor.offset, 0);
        cursor.step_offset(16, 10);
        assert_eq!(cursor.offset, 10);
        cursor.step_offset(-1, 10);
        assert_eq!(cursor.offset, 9);
    }

    #[test]
    fn test_cursor_line_navigation() {
        let mut cursor = Cursor::new();
        cursor.col = 5;
        cursor.move_to_line_start();
        assert_eq!(cursor.col, 0);

        cursor.move_to_line_end(20);
        assert_eq!(cursor.col, 20);
    }
}
