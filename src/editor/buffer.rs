use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

/// Capacity bounds for a [`TextBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of logical lines
    pub max_lines: usize,
    /// Maximum number of stored bytes
    pub max_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_lines: 1000,
            max_bytes: 8192,
        }
    }
}

/// One entry of the line index: where a logical line starts in the flat
/// byte storage and how many bytes it spans, trailing newline included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub len: usize,
}

impl LineSpan {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Offset one past the last byte of the line
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Why an insertion was refused. The buffer is untouched in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("You reached the maximum number of lines. Exiting input mode.")]
    OutOfLines,
    #[error("You reached the maximum buffer size. Exiting input mode.")]
    OutOfMemory,
    #[error("This input is not yet implemented.")]
    UnhandledChar(u8),
}

/// What a save wrote to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveSummary {
    pub lines: usize,
    pub bytes: usize,
}

/// An insert-only byte buffer with a line index kept in step with it.
///
/// The cursor is stored twice: as an absolute offset into the bytes and as
/// (line, column) relative to the line index. Every mutation goes through
/// this type so the two never drift apart.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    text: Vec<u8>,
    lines: Vec<LineSpan>,
    index: usize,
    line: usize,
    col: usize,
    limits: Limits,
    erase_char: u8,
}

impl TextBuffer {
    /// Create an empty buffer holding a single empty line
    pub fn new(limits: Limits, erase_char: u8) -> Self {
        Self {
            text: Vec::new(),
            lines: vec![LineSpan::default()],
            index: 0,
            line: 0,
            col: 0,
            limits,
            erase_char,
        }
    }

    /// Total bytes stored
    pub fn size(&self) -> usize {
        self.text.len()
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn lines(&self) -> &[LineSpan] {
        &self.lines
    }

    pub fn len_lines(&self) -> usize {
        self.lines.len()
    }

    /// Length of a line including its newline, 0 when out of range
    pub fn line_len(&self, idx: usize) -> usize {
        self.lines.get(idx).map(|l| l.len).unwrap_or(0)
    }

    /// Raw bytes of a line including its newline
    pub fn line_bytes(&self, idx: usize) -> &[u8] {
        self.lines
            .get(idx)
            .map(|l| &self.text[l.start..l.end()])
            .unwrap_or(&[])
    }

    /// Absolute offset of the cursor
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.col
    }

    /// Rightmost column the cursor may occupy on a line.
    ///
    /// On a newline-terminated line that is the newline itself, one past the
    /// last visible character. The final line never ends in a newline, so
    /// the cursor may sit one past its last byte.
    pub fn max_col(&self, idx: usize) -> usize {
        let len = self.line_len(idx);
        if self.line_bytes(idx).last() == Some(&b'\n') {
            len - 1
        } else {
            len
        }
    }

    /// Insert a byte at the cursor and advance past it
    pub fn insert(&mut self, byte: u8) -> Result<(), InsertError> {
        if byte == b'\n' && self.lines.len() >= self.limits.max_lines {
            return Err(InsertError::OutOfLines);
        }
        if self.text.len() >= self.limits.max_bytes {
            return Err(InsertError::OutOfMemory);
        }
        if byte == self.erase_char || !is_insertable(byte) {
            return Err(InsertError::UnhandledChar(byte));
        }

        self.text.insert(self.index, byte);
        self.index += 1;

        if byte == b'\n' {
            split_line(&mut self.lines, self.line, self.col);
            self.line += 1;
            self.col = 0;
        } else {
            self.lines[self.line].len += 1;
            shift_line_starts(&mut self.lines, self.line + 1);
            self.col += 1;
        }

        debug_assert!(self.is_consistent());
        Ok(())
    }

    /// Move the cursor to a line and column.
    ///
    /// The line is clamped to the buffer and the column to [`Self::max_col`];
    /// the absolute offset is recomputed from the line index.
    pub fn set_position(&mut self, line: usize, col: usize) {
        self.line = line.min(self.lines.len() - 1);
        self.col = col.min(self.max_col(self.line));
        self.index = self.lines[self.line].start + self.col;
        debug_assert!(self.is_consistent());
    }

    /// Bytes as they are written to disk: the buffer, newline-terminated
    pub fn persisted(&self) -> Cow<'_, [u8]> {
        if self.text.last() == Some(&b'\n') {
            Cow::Borrowed(&self.text)
        } else {
            let mut bytes = Vec::with_capacity(self.text.len() + 1);
            bytes.extend_from_slice(&self.text);
            bytes.push(b'\n');
            Cow::Owned(bytes)
        }
    }

    /// Write the whole buffer to `path`, creating or truncating it
    pub fn save(&self, path: &Path) -> io::Result<SaveSummary> {
        let contents = self.persisted();
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&contents)?;
        writer.flush()?;

        Ok(SaveSummary {
            lines: contents.iter().filter(|b| **b == b'\n').count(),
            bytes: contents.len(),
        })
    }

    /// Whether the line index, byte storage and cursor all agree
    pub fn is_consistent(&self) -> bool {
        let Some(last) = self.lines.last() else {
            return false;
        };
        let contiguous = self
            .lines
            .windows(2)
            .all(|pair| pair[0].end() == pair[1].start);
        let total: usize = self.lines.iter().map(|l| l.len).sum();

        self.lines[0].start == 0
            && contiguous
            && total == self.text.len()
            && last.end() == self.text.len()
            && self.line < self.lines.len()
            && self.col <= self.lines[self.line].len
            && self.index == self.lines[self.line].start + self.col
    }
}

/// Printable ASCII or newline
fn is_insertable(byte: u8) -> bool {
    byte == b'\n' || byte == b' ' || byte.is_ascii_graphic()
}

/// Split `lines[line]` after a newline inserted at `col`.
///
/// Expects the newline to be already stored but not yet counted in the
/// line's length. The head keeps `col + 1` bytes; the tail takes the rest
/// and every later line moves one byte to the right.
pub fn split_line(lines: &mut Vec<LineSpan>, line: usize, col: usize) {
    let original = lines[line];
    let head = LineSpan::new(original.start, col + 1);
    let tail = LineSpan::new(head.end(), original.len - col);

    lines[line] = head;
    lines.insert(line + 1, tail);
    shift_line_starts(lines, line + 2);
}

/// Move the start of every line from `from` onward one byte to the right
pub fn shift_line_starts(lines: &mut [LineSpan], from: usize) {
    for span in lines.iter_mut().skip(from) {
        span.start += 1;
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new(Limits::default(), 0x7f)
    }
}
