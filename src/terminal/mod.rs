use crossterm::{
    cursor, execute, queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{self, ClearType},
};
use std::io::{self, Read, Stdout, Write};

use crate::editor::{Editor, Mode, StatusKind};

/// Output side of the editor: where text goes and where the cursor sits.
/// Coordinates are 0-based screen rows and columns.
pub trait Screen {
    fn clear(&mut self) -> io::Result<()>;
    fn move_to(&mut self, row: u16, col: u16) -> io::Result<()>;
    /// Write bytes at the current position
    fn write_text(&mut self, text: &[u8]) -> io::Result<()>;
    /// Replace the contents of `row` with `text`, optionally in reverse video
    fn write_status(&mut self, row: u16, text: &str, highlight: bool) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Terminal handler responsible for rendering and input
pub struct Terminal {
    stdout: Stdout,
}

impl Terminal {
    pub fn new() -> anyhow::Result<Self> {
        let mut stdout = io::stdout();

        // Raw mode: no line buffering, no echo, no keyboard signals
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;

        Ok(Self { stdout })
    }

    /// Get terminal size as (columns, rows)
    pub fn size() -> anyhow::Result<(u16, u16)> {
        Ok(terminal::size()?)
    }

    /// Block until one byte of input arrives. `None` at end of input.
    ///
    /// Raw mode delivers Enter as a carriage return; it is handed on as a
    /// newline.
    pub fn read_byte(&mut self) -> anyhow::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match io::stdin().lock().read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) if byte[0] == b'\r' => return Ok(Some(b'\n')),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Render the editor state to the terminal
    pub fn render(&mut self, editor: &Editor, full: bool) -> anyhow::Result<()> {
        render(editor, self, full)?;
        Ok(())
    }
}

impl Screen for Terminal {
    fn clear(&mut self) -> io::Result<()> {
        queue!(self.stdout, terminal::Clear(ClearType::All))
    }

    fn move_to(&mut self, row: u16, col: u16) -> io::Result<()> {
        queue!(self.stdout, cursor::MoveTo(col, row))
    }

    fn write_text(&mut self, text: &[u8]) -> io::Result<()> {
        self.stdout.write_all(text)
    }

    fn write_status(&mut self, row: u16, text: &str, highlight: bool) -> io::Result<()> {
        queue!(
            self.stdout,
            cursor::MoveTo(0, row),
            terminal::Clear(ClearType::CurrentLine)
        )?;
        if highlight {
            queue!(
                self.stdout,
                SetAttribute(Attribute::Reverse),
                Print(text),
                SetAttribute(Attribute::NoReverse)
            )
        } else {
            queue!(self.stdout, Print(text))
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        // Restore terminal state
        let _ = execute!(self.stdout, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Clear the screen and draw every visible row of the buffer
pub fn redraw(editor: &Editor, screen: &mut impl Screen) -> io::Result<()> {
    screen.clear()?;
    for (row, segment) in editor.viewport().visible_segments(editor.buffer()) {
        screen.move_to(to_u16(row), 0)?;
        screen.write_text(segment)?;
    }
    Ok(())
}

/// Paint the status row and place the cursor, after a full redraw when
/// `full` is set
pub fn render(editor: &Editor, screen: &mut impl Screen, full: bool) -> io::Result<()> {
    if full {
        redraw(editor, screen)?;
    }

    let viewport = editor.viewport();
    let status_row = viewport.rows.saturating_sub(1);
    let width = usize::from(viewport.cols);

    if editor.mode() == Mode::LastLine {
        let prompt = fit(&editor.command_line().display(), width);
        screen.write_status(status_row, &prompt, false)?;
        screen.move_to(status_row, to_u16(prompt.chars().count()))?;
    } else {
        match editor.status() {
            Some(msg) => {
                let text = fit(&msg.text, width);
                screen.write_status(status_row, &text, msg.kind == StatusKind::Error)?;
            }
            None => screen.write_status(status_row, "", false)?,
        }
        let cursor = editor.cursor();
        screen.move_to(cursor.row, cursor.col)?;
    }

    screen.flush()
}

/// Cut a status text to the screen width so it never wraps
fn fit(text: &str, width: usize) -> String {
    text.chars().take(width.saturating_sub(1).max(1)).collect()
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
