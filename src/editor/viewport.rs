use super::buffer::TextBuffer;

/// The window onto the buffer: terminal dimensions plus the first logical
/// line shown. The bottom row is reserved for the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub rows: u16,
    pub cols: u16,
    /// Index of the topmost fully visible logical line
    pub top_line: usize,
}

impl Viewport {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            rows,
            cols,
            top_line: 0,
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    /// Rows available for text
    pub fn text_rows(&self) -> usize {
        usize::from(self.rows).saturating_sub(1).max(1)
    }

    fn width(&self) -> usize {
        usize::from(self.cols).max(1)
    }

    /// Screen rows a logical line of `len` bytes occupies once wrapped
    pub fn rows_for_len(&self, len: usize) -> usize {
        let width = self.width();
        if len > width {
            len.div_ceil(width)
        } else {
            1
        }
    }

    /// Index of the last logical line that fits entirely in the text rows,
    /// counting from `top_line`.
    ///
    /// A top line too long to fit on its own still counts as visible.
    pub fn last_visible_line(&self, buffer: &TextBuffer) -> usize {
        let available = self.text_rows();
        let mut used = 0;
        let mut line = self.top_line;

        while line < buffer.len_lines() {
            used += self.rows_for_len(buffer.line_len(line));
            if used > available {
                break;
            }
            line += 1;
        }

        line.saturating_sub(1)
            .max(self.top_line)
            .min(buffer.len_lines() - 1)
    }

    /// Screen (row, col) of a buffer position relative to `top_line`
    pub fn screen_position(&self, buffer: &TextBuffer, line: usize, col: usize) -> (usize, usize) {
        let width = self.width();
        let rows_before: usize = (self.top_line..line)
            .map(|i| self.rows_for_len(buffer.line_len(i)))
            .sum();
        (rows_before + col / width, col % width)
    }

    /// Scroll by the least amount that brings `line`/`col` into the text rows.
    /// Returns true when `top_line` changed.
    pub fn scroll_to(&mut self, buffer: &TextBuffer, line: usize, col: usize) -> bool {
        let before = self.top_line;

        if line < self.top_line {
            self.top_line = line;
        }
        while self.top_line < line
            && (line > self.last_visible_line(buffer)
                || self.screen_position(buffer, line, col).0 >= self.text_rows())
        {
            self.top_line += 1;
        }

        self.top_line != before
    }

    /// Every screen row of text to draw, as (row, bytes) with newlines
    /// dropped. Long lines are cut into `cols`-wide segments.
    pub fn visible_segments<'a>(&self, buffer: &'a TextBuffer) -> Vec<(usize, &'a [u8])> {
        let available = self.text_rows();
        let width = self.width();
        let mut segments = Vec::new();
        let mut row = 0;

        for line in self.top_line..=self.last_visible_line(buffer) {
            let bytes = buffer.line_bytes(line);
            let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
            for (offset, chunk) in bytes.chunks(width).enumerate() {
                if row + offset >= available {
                    break;
                }
                segments.push((row + offset, chunk));
            }
            row += self.rows_for_len(buffer.line_len(line));
            if row >= available {
                break;
            }
        }

        segments
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(80, 24)
    }
}
