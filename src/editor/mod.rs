mod buffer;
mod cursor;
mod viewport;

pub use buffer::{
    shift_line_starts, split_line, InsertError, Limits, LineSpan, SaveSummary, TextBuffer,
};
pub use cursor::Cursor;
pub use viewport::Viewport;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::commands::{parse_lastline, CommandLine, LastLineCommand, ParseError};
use crate::config::EditorSettings;
use crate::input::{EscapeSequence, KeyAction, Lookahead, Motion, ESCAPE};

/// The current mode of the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Command,
    Input,
    LastLine,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Command => "COMMAND",
            Mode::Input => "INSERT",
            Mode::LastLine => "LASTLINE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    /// Rendered in reverse video
    Error,
}

/// One-line message shown on the bottom row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

const INSERT_INDICATOR: &str = "--INSERT--";

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Insert(#[from] InsertError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Cannot write \"{}\": {}", .path.display(), .source)]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Editor session: the buffer, the window onto it and the derived screen
/// cursor, driven one input byte at a time.
pub struct Editor {
    buffer: TextBuffer,
    viewport: Viewport,
    cursor: Cursor,
    mode: Mode,
    command_line: CommandLine,
    status_message: Option<StatusMessage>,
    escape: Option<EscapeSequence>,
    settings: EditorSettings,
    /// Directory `:w` file names are resolved against
    working_dir: PathBuf,
    should_quit: bool,
    needs_redraw: bool,
}

impl Editor {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            buffer: TextBuffer::new(settings.limits(), settings.erase_char),
            viewport: Viewport::default(),
            cursor: Cursor::default(),
            mode: Mode::Command,
            command_line: CommandLine::new(),
            status_message: None,
            escape: None,
            settings,
            working_dir: PathBuf::new(),
            should_quit: false,
            needs_redraw: true,
        }
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn command_line(&self) -> &CommandLine {
        &self.command_line
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status_message.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Resolve `:w` file names against `dir` instead of the process's
    /// current directory
    pub fn set_working_dir(&mut self, dir: impl Into<PathBuf>) {
        self.working_dir = dir.into();
    }

    /// Update the terminal size, keeping the cursor on screen
    pub fn set_size(&mut self, width: u16, height: u16) {
        if (self.viewport.cols, self.viewport.rows) == (width, height) {
            return;
        }
        self.viewport.resize(width, height);
        self.sync_cursor();
        self.needs_redraw = true;
    }

    /// Whether the text area must be repainted; resets the flag
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: msg.into(),
            kind: StatusKind::Info,
        });
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: msg.into(),
            kind: StatusKind::Error,
        });
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Feed one input byte.
    ///
    /// Errors are reported on the status line and the session goes on. The
    /// only error returned is a failed write when `fatal_write_errors` is set.
    pub fn handle_byte(&mut self, byte: u8) -> Result<(), EditorError> {
        let result = match self.mode {
            Mode::Command => {
                self.handle_command_byte(byte);
                Ok(())
            }
            Mode::Input => self.handle_input_byte(byte),
            Mode::LastLine => self.handle_lastline_byte(byte),
        };

        match result {
            Err(err @ EditorError::FileWrite { .. }) if self.settings.fatal_write_errors => {
                tracing::error!(error = %err, "write failed, leaving editor");
                Err(err)
            }
            Err(err) => {
                tracing::warn!(error = %err, mode = self.mode.as_str(), "recovered");
                self.set_error(err.to_string());
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    fn handle_command_byte(&mut self, byte: u8) {
        if let Some(mut sequence) = self.escape.take() {
            match sequence.feed(byte) {
                Lookahead::Pending => self.escape = Some(sequence),
                Lookahead::Matched(motion) => self.apply_motion(motion),
                Lookahead::Unrecognized => {
                    tracing::trace!(?sequence, "ignored escape sequence");
                }
            }
            return;
        }

        match KeyAction::from_command_byte(byte, self.settings.erase_char) {
            Some(KeyAction::EnterInput) => self.enter_input_mode(),
            Some(KeyAction::EnterLastLine) => self.enter_lastline_mode(),
            Some(KeyAction::Move(motion)) => self.apply_motion(motion),
            Some(KeyAction::BeginEscape) => self.escape = Some(EscapeSequence::new()),
            Some(KeyAction::Notice(notice)) => self.set_status(notice.message()),
            Some(KeyAction::ShowPosition) => self.show_position(),
            None => {}
        }
    }

    fn handle_input_byte(&mut self, byte: u8) -> Result<(), EditorError> {
        if byte == ESCAPE {
            self.enter_command_mode();
            return Ok(());
        }

        match self.insert_byte(byte) {
            Ok(()) => {
                self.set_status(INSERT_INDICATOR);
                Ok(())
            }
            Err(err @ (InsertError::OutOfLines | InsertError::OutOfMemory)) => {
                self.enter_command_mode();
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn handle_lastline_byte(&mut self, byte: u8) -> Result<(), EditorError> {
        if byte == b'\n' {
            let input = self.command_line.take();
            self.enter_command_mode();
            let command = parse_lastline(&input)?;
            tracing::debug!(?command, "lastline command");
            return self.execute(command);
        }

        if byte == self.settings.erase_char {
            if self.command_line.is_empty() {
                self.enter_command_mode();
            } else {
                self.command_line.delete_char_before();
            }
        } else {
            self.command_line.push(byte);
        }
        Ok(())
    }

    fn enter_command_mode(&mut self) {
        tracing::debug!(from = self.mode.as_str(), "command mode");
        self.mode = Mode::Command;
        self.clear_status();
    }

    fn enter_input_mode(&mut self) {
        tracing::debug!("input mode");
        self.mode = Mode::Input;
        self.set_status(INSERT_INDICATOR);
    }

    fn enter_lastline_mode(&mut self) {
        tracing::debug!("lastline mode");
        self.mode = Mode::LastLine;
        self.command_line.clear();
    }

    /// Insert a byte at the cursor, scrolling as needed
    pub fn insert_byte(&mut self, byte: u8) -> Result<(), InsertError> {
        self.buffer.insert(byte)?;
        self.sync_cursor();
        self.needs_redraw = true;
        Ok(())
    }

    /// Run a parsed lastline command: write first, then quit
    pub fn execute(&mut self, command: LastLineCommand) -> Result<(), EditorError> {
        if let Some(name) = command.write.as_deref() {
            let summary = self.save(&self.working_dir.join(name))?;
            self.set_status(format!(
                "\"{}\" {}L {}C written",
                name, summary.lines, summary.bytes
            ));
        }
        if command.quit {
            self.should_quit = true;
        }
        Ok(())
    }

    /// Write the buffer to `path`
    pub fn save(&self, path: &Path) -> Result<SaveSummary, EditorError> {
        let summary = self
            .buffer
            .save(path)
            .map_err(|source| EditorError::FileWrite {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(path = %path.display(), lines = summary.lines, bytes = summary.bytes, "saved");
        Ok(summary)
    }

    pub fn apply_motion(&mut self, motion: Motion) {
        match motion {
            Motion::Up => self.move_up(),
            Motion::Down => self.move_down(),
            Motion::Left => self.move_left(),
            Motion::Right => self.move_right(),
        }
    }

    /// Previous line, keeping the column where the line allows it
    pub fn move_up(&mut self) {
        let line = self.buffer.current_line();
        if line > 0 {
            self.buffer.set_position(line - 1, self.buffer.column());
            self.sync_cursor();
        }
    }

    /// Next line, keeping the column where the line allows it
    pub fn move_down(&mut self) {
        let line = self.buffer.current_line();
        if line + 1 < self.buffer.len_lines() {
            self.buffer.set_position(line + 1, self.buffer.column());
            self.sync_cursor();
        }
    }

    pub fn move_right(&mut self) {
        let line = self.buffer.current_line();
        let col = self.buffer.column();
        if col < self.buffer.max_col(line) {
            self.buffer.set_position(line, col + 1);
            self.sync_cursor();
        }
    }

    pub fn move_left(&mut self) {
        let line = self.buffer.current_line();
        let col = self.buffer.column();
        if col > 0 {
            self.buffer.set_position(line, col - 1);
            self.sync_cursor();
        }
    }

    /// Scroll the cursor into view and recompute its screen position.
    /// A scroll repaints the screen, which drops any status message outside
    /// Input mode.
    fn sync_cursor(&mut self) {
        let line = self.buffer.current_line();
        let col = self.buffer.column();
        if self.viewport.scroll_to(&self.buffer, line, col) {
            tracing::debug!(top_line = self.viewport.top_line, line, "scrolled");
            self.needs_redraw = true;
            if self.mode != Mode::Input {
                self.clear_status();
            }
        }
        self.cursor = Cursor::locate(&self.buffer, &self.viewport);
    }

    fn show_position(&mut self) {
        let msg = format!(
            "Cursor: [{},{}]  line index: {}  win topline: {}  buf #lines: {}",
            self.cursor.row + 1,
            self.cursor.col + 1,
            self.buffer.current_line(),
            self.viewport.top_line,
            self.buffer.len_lines()
        );
        self.set_status(msg);
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{CONTROL_C, CONTROL_G};

    fn feed(editor: &mut Editor, bytes: &[u8]) {
        for byte in bytes {
            editor.handle_byte(*byte).unwrap();
        }
    }

    fn editor_with_lines(count: usize, width: u16, height: u16) -> Editor {
        let mut editor = Editor::default();
        editor.set_size(width, height);
        feed(&mut editor, b"i");
        for i in 0..count {
            feed(&mut editor, format!("line {}\n", i).as_bytes());
        }
        feed(&mut editor, &[ESCAPE]);
        editor
    }

    #[test]
    fn test_starts_in_command_mode() {
        let editor = Editor::default();
        assert_eq!(editor.mode(), Mode::Command);
        assert_eq!(editor.buffer().len_lines(), 1);
    }

    #[test]
    fn test_insert_mode_round_trip() {
        let mut editor = Editor::default();
        feed(&mut editor, b"i");
        assert_eq!(editor.mode(), Mode::Input);
        assert_eq!(editor.status().unwrap().text, "--INSERT--");

        feed(&mut editor, b"hello\n");
        feed(&mut editor, &[ESCAPE]);
        assert_eq!(editor.mode(), Mode::Command);
        assert!(editor.status().is_none());
        assert_eq!(editor.buffer().len_lines(), 2);
        assert_eq!(editor.buffer().line_len(0), 6);
        assert_eq!(editor.buffer().current_line(), 1);
        assert_eq!(editor.cursor(), Cursor::new(1, 0));
    }

    #[test]
    fn test_write_command_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = Editor::default();
        editor.set_size(80, 24);
        editor.set_working_dir(dir.path());

        feed(&mut editor, b"ihello\n");
        feed(&mut editor, &[ESCAPE]);
        assert_eq!(editor.buffer().len_lines(), 2);
        assert_eq!(editor.buffer().line_bytes(0), b"hello\n");
        assert_eq!(editor.buffer().line_len(1), 0);
        assert_eq!(editor.buffer().current_line(), 1);

        feed(&mut editor, b":w testfile\n");
        assert_eq!(std::fs::read(dir.path().join("testfile")).unwrap(), b"hello\n");
        assert_eq!(editor.status().unwrap().text, "\"testfile\" 1L 6C written");
        assert_eq!(editor.mode(), Mode::Command);
        assert!(!editor.should_quit());
    }

    #[test]
    fn test_write_quit_appends_newline() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = Editor::default();
        editor.set_working_dir(dir.path());

        feed(&mut editor, b"iabc");
        feed(&mut editor, &[ESCAPE]);
        feed(&mut editor, b": wq  notes  \n");
        assert_eq!(std::fs::read(dir.path().join("notes")).unwrap(), b"abc\n");
        assert!(editor.should_quit());
    }

    #[test]
    fn test_lastline_quit() {
        let mut editor = Editor::default();
        feed(&mut editor, b":");
        assert_eq!(editor.mode(), Mode::LastLine);
        feed(&mut editor, b"q\n");
        assert_eq!(editor.mode(), Mode::Command);
        assert!(editor.should_quit());
    }

    #[test]
    fn test_lastline_parse_error_is_reported() {
        let mut editor = Editor::default();
        feed(&mut editor, b":zzz\n");
        let status = editor.status().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, "Not an editor command: zzz");
        assert_eq!(editor.mode(), Mode::Command);
        assert!(!editor.should_quit());
    }

    #[test]
    fn test_lastline_erase() {
        let mut editor = Editor::default();
        feed(&mut editor, b":qx");
        feed(&mut editor, &[0x7f]);
        assert_eq!(editor.command_line().input, "q");
        feed(&mut editor, &[0x7f, 0x7f]);
        assert_eq!(editor.mode(), Mode::Command);
        assert!(!editor.should_quit());
    }

    #[test]
    fn test_write_failure_is_recoverable_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = Editor::default();
        editor.set_working_dir(dir.path().join("missing"));

        feed(&mut editor, b"iabc");
        feed(&mut editor, &[ESCAPE]);
        feed(&mut editor, b":wq out\n");

        let status = editor.status().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.starts_with("Cannot write"));
        assert!(!editor.should_quit());
        assert_eq!(editor.buffer().text(), b"abc");
    }

    #[test]
    fn test_fatal_write_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let settings = EditorSettings {
            fatal_write_errors: true,
            ..EditorSettings::default()
        };
        let mut editor = Editor::new(settings);
        editor.set_working_dir(dir.path().join("missing"));

        feed(&mut editor, b":w out");
        let err = editor.handle_byte(b'\n').unwrap_err();
        assert!(matches!(err, EditorError::FileWrite { .. }));
    }

    #[test]
    fn test_unhandled_char_stays_in_input_mode() {
        let mut editor = Editor::default();
        feed(&mut editor, b"ia\tb");
        assert_eq!(editor.mode(), Mode::Input);
        assert_eq!(editor.buffer().text(), b"ab");
        assert_eq!(editor.status().unwrap().text, "--INSERT--");
    }

    #[test]
    fn test_erase_in_input_mode_is_reported() {
        let mut editor = Editor::default();
        feed(&mut editor, b"ia");
        feed(&mut editor, &[0x7f]);
        let status = editor.status().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(editor.buffer().text(), b"a");
        assert_eq!(editor.mode(), Mode::Input);
    }

    #[test]
    fn test_out_of_lines_leaves_input_mode() {
        let settings = EditorSettings {
            max_lines: 2,
            ..EditorSettings::default()
        };
        let mut editor = Editor::new(settings);
        feed(&mut editor, b"ia\nb\n");
        assert_eq!(editor.mode(), Mode::Command);
        assert_eq!(editor.buffer().len_lines(), 2);
        assert_eq!(
            editor.status().unwrap().text,
            InsertError::OutOfLines.to_string()
        );
    }

    #[test]
    fn test_out_of_memory_leaves_input_mode() {
        let settings = EditorSettings {
            max_bytes: 1,
            ..EditorSettings::default()
        };
        let mut editor = Editor::new(settings);
        feed(&mut editor, b"iab");
        assert_eq!(editor.mode(), Mode::Command);
        assert_eq!(editor.buffer().text(), b"a");
        let status = editor.status().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, InsertError::OutOfMemory.to_string());
    }

    #[test]
    fn test_scroll_clears_error_status() {
        let mut editor = Editor::default();
        editor.set_size(20, 4);
        feed(&mut editor, b"ia\nb\nc\nd\ne");
        feed(&mut editor, &[ESCAPE]);
        assert_eq!(editor.viewport().top_line, 2);

        feed(&mut editor, b":zzz\n");
        assert_eq!(editor.status().unwrap().kind, StatusKind::Error);
        editor.take_redraw();

        // Still inside the window: no repaint, the error stays
        editor.move_up();
        assert!(!editor.take_redraw());
        assert!(editor.status().is_some());

        editor.move_up();
        editor.move_up();
        assert_eq!(editor.viewport().top_line, 1);
        assert!(editor.take_redraw());
        assert!(editor.status().is_none());
    }

    #[test]
    fn test_full_window_line_keeps_cursor_off_status_row() {
        let mut editor = Editor::default();
        editor.set_size(10, 3);
        feed(&mut editor, b"i");
        feed(&mut editor, &[b'x'; 20]);
        assert_eq!(editor.cursor(), Cursor::new(1, 9));
        assert_eq!(editor.status().unwrap().text, "--INSERT--");
    }

    #[test]
    fn test_move_up_down_bounds_are_noops() {
        let mut editor = editor_with_lines(3, 80, 24);
        feed(&mut editor, b"j");
        let at_bottom = (editor.buffer().current_line(), editor.buffer().column(), editor.cursor());
        assert_eq!(at_bottom.0, 3);

        editor.move_down();
        assert_eq!(
            (editor.buffer().current_line(), editor.buffer().column(), editor.cursor()),
            at_bottom
        );

        for _ in 0..3 {
            editor.move_up();
        }
        let at_top = (editor.buffer().current_line(), editor.buffer().column(), editor.cursor());
        assert_eq!(at_top.0, 0);
        editor.move_up();
        assert_eq!(
            (editor.buffer().current_line(), editor.buffer().column(), editor.cursor()),
            at_top
        );
    }

    #[test]
    fn test_vertical_move_clamps_column() {
        let mut editor = Editor::default();
        feed(&mut editor, b"iab\nlonger line");
        feed(&mut editor, &[ESCAPE]);
        assert_eq!(editor.buffer().column(), 11);

        editor.move_up();
        // On the newline, one past 'b'
        assert_eq!(editor.buffer().column(), 2);
        assert_eq!(editor.buffer().index(), 2);
        assert_eq!(editor.cursor(), Cursor::new(0, 2));
    }

    #[test]
    fn test_move_right_stops_at_line_end() {
        let mut editor = Editor::default();
        feed(&mut editor, b"iab\ncd");
        feed(&mut editor, &[ESCAPE]);
        editor.move_up();
        assert_eq!(editor.buffer().column(), 2);
        editor.move_right();
        assert_eq!(editor.buffer().column(), 2);

        editor.move_down();
        assert_eq!(editor.buffer().column(), 2);
        // Last line: already one past the end
        editor.move_right();
        assert_eq!(editor.buffer().column(), 2);
    }

    #[test]
    fn test_move_left_and_right_wrap_rows() {
        let mut editor = Editor::default();
        editor.set_size(10, 10);
        feed(&mut editor, b"i0123456789abc");
        feed(&mut editor, &[ESCAPE]);
        assert_eq!(editor.cursor(), Cursor::new(1, 3));

        for _ in 0..4 {
            feed(&mut editor, b"h");
        }
        assert_eq!(editor.cursor(), Cursor::new(0, 9));
        feed(&mut editor, b" ");
        assert_eq!(editor.cursor(), Cursor::new(1, 0));
    }

    #[test]
    fn test_arrow_keys() {
        let mut editor = editor_with_lines(3, 80, 24);
        feed(&mut editor, &[ESCAPE, b'[', b'A']);
        assert_eq!(editor.buffer().current_line(), 2);
        feed(&mut editor, &[ESCAPE, b'[', b'C']);
        assert_eq!(editor.buffer().column(), 1);
        feed(&mut editor, &[ESCAPE, b'[', b'D']);
        assert_eq!(editor.buffer().column(), 0);
        feed(&mut editor, &[ESCAPE, b'[', b'B']);
        assert_eq!(editor.buffer().current_line(), 3);
    }

    #[test]
    fn test_unknown_escape_sequence_is_ignored() {
        let mut editor = editor_with_lines(3, 80, 24);
        let line = editor.buffer().current_line();
        // ESC x is swallowed whole; the following 'k' moves up
        feed(&mut editor, &[ESCAPE, b'x', b'k']);
        assert_eq!(editor.buffer().current_line(), line - 1);
        assert_eq!(editor.mode(), Mode::Command);
    }

    #[test]
    fn test_scrolls_down_minimally() {
        let mut editor = editor_with_lines(15, 40, 10);
        for _ in 0..20 {
            editor.move_up();
        }
        assert_eq!(editor.viewport().top_line, 0);

        for _ in 0..12 {
            editor.move_down();
        }
        assert_eq!(editor.buffer().current_line(), 12);
        assert_eq!(editor.viewport().top_line, 4);
        assert_eq!(editor.viewport().last_visible_line(editor.buffer()), 12);
        assert_eq!(editor.cursor().row, 8);
    }

    #[test]
    fn test_scrolls_back_up() {
        let mut editor = editor_with_lines(15, 40, 10);
        assert!(editor.viewport().top_line > 0);
        for _ in 0..15 {
            editor.move_up();
        }
        assert_eq!(editor.viewport().top_line, 0);
        assert_eq!(editor.cursor(), Cursor::new(0, 0));
    }

    #[test]
    fn test_typing_past_bottom_scrolls() {
        let editor = editor_with_lines(30, 40, 10);
        assert_eq!(editor.buffer().current_line(), 30);
        assert_eq!(editor.viewport().top_line, 22);
        assert_eq!(editor.cursor().row, 8);
    }

    #[test]
    fn test_redraw_flag() {
        let mut editor = Editor::default();
        assert!(editor.take_redraw());
        assert!(!editor.take_redraw());
        feed(&mut editor, b"ix");
        assert!(editor.take_redraw());
        feed(&mut editor, &[ESCAPE]);
        feed(&mut editor, b"h");
        assert!(!editor.take_redraw());
    }

    #[test]
    fn test_notices_and_position() {
        let mut editor = Editor::default();
        feed(&mut editor, &[CONTROL_C]);
        assert_eq!(editor.status().unwrap().text, "You typed Control-C.");

        feed(&mut editor, b"iab");
        feed(&mut editor, &[ESCAPE, CONTROL_G]);
        assert_eq!(
            editor.status().unwrap().text,
            "Cursor: [1,3]  line index: 0  win topline: 0  buf #lines: 1"
        );
    }

    #[test]
    fn test_resize_keeps_cursor_visible() {
        let mut editor = editor_with_lines(20, 40, 30);
        assert_eq!(editor.viewport().top_line, 0);
        editor.set_size(40, 10);
        assert_eq!(editor.viewport().top_line, 12);
        assert!(editor.take_redraw());
    }
}
