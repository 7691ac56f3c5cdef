use super::buffer::TextBuffer;
use super::viewport::Viewport;

/// Cursor position on screen (0-indexed).
///
/// Always derived from the buffer's line/column and the viewport; never
/// moved on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: u16,
    pub col: u16,
}

impl Cursor {
    pub fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }

    /// Screen position of the buffer's insertion point.
    ///
    /// A single line that fills every text row leaves no row for the
    /// position one past its end; the cursor then stays on the last text
    /// cell instead of the status row.
    pub fn locate(buffer: &TextBuffer, viewport: &Viewport) -> Self {
        let (mut row, mut col) =
            viewport.screen_position(buffer, buffer.current_line(), buffer.column());
        let text_rows = viewport.text_rows();
        if row >= text_rows {
            row = text_rows - 1;
            col = usize::from(viewport.cols).saturating_sub(1);
        }
        Self {
            row: u16::try_from(row).unwrap_or(u16::MAX),
            col: u16::try_from(col).unwrap_or(u16::MAX),
        }
    }
}
