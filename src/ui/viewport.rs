/// Window of visible rows (hex rows or text lines)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub start_line: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(start_line: usize, height: usize) -> Self {
        Self { start_line, height }
    }

    pub fn end_line(&self) -> usize {
        self.start_line + self.height
    }

    pub fn contains(&self, line: usize) -> bool {
        line >= self.start_line && line < self.end_line()
    }

    pub fn resize(&mut self, height: usize) {
        self.height = height.max(1);
    }

    /// Scroll the minimum amount that brings `line` into view
    pub fn follow(&mut self, line: usize) {
        if line < self.start_line {
            self.start_line = line;
        } else if line >= self.end_line() {
            self.start_line = line + 1 - self.height.max(1);
        }
    }

    /// Rows to move for one page
    pub fn page(&self) -> usize {
        (self.height / 2).max(1)
    }
}
