use thiserror::Error;

/// Intent parsed from a lastline command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastLineCommand {
    /// File to write the buffer to
    pub write: Option<String>,
    /// Leave the editor (after writing, if requested)
    pub quit: bool,
}

impl LastLineCommand {
    pub fn is_noop(&self) -> bool {
        self.write.is_none() && !self.quit
    }
}

/// A lastline command outside the accepted grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Not an editor command: {input}")]
pub struct ParseError {
    pub input: String,
}

/// States of the lastline recognizer.
///
/// Accepts `S*(w|wq)S+F+S*` and `S*qS*`, where `S` is a space and `F` a
/// filename byte (ASCII alphanumeric or underscore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Start,
    Write,
    WriteQuit,
    BeforeName { quit: bool },
    Name { quit: bool, start: usize },
    AfterName { quit: bool, start: usize, end: usize },
    Quit,
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// One step of the recognizer; `None` rejects the input
fn transition(state: ParseState, pos: usize, byte: u8) -> Option<ParseState> {
    use ParseState::*;

    let next = match (state, byte) {
        (Start, b' ') => Start,
        (Start, b'w') => Write,
        (Start, b'q') => Quit,
        (Write, b'q') => WriteQuit,
        (Write, b' ') => BeforeName { quit: false },
        (WriteQuit, b' ') => BeforeName { quit: true },
        (BeforeName { .. }, b' ') => state,
        (BeforeName { quit }, b) if is_name_byte(b) => Name { quit, start: pos },
        (Name { .. }, b) if is_name_byte(b) => state,
        (Name { quit, start }, b' ') => AfterName { quit, start, end: pos },
        (AfterName { .. }, b' ') => state,
        (Quit, b' ') => Quit,
        _ => return None,
    };
    Some(next)
}

/// Parse the text typed after the `:` prompt (without the newline)
pub fn parse_lastline(input: &str) -> Result<LastLineCommand, ParseError> {
    let error = || ParseError {
        input: input.to_string(),
    };

    let mut state = ParseState::Start;
    for (pos, byte) in input.bytes().enumerate() {
        state = transition(state, pos, byte).ok_or_else(error)?;
    }

    match state {
        ParseState::Start => Ok(LastLineCommand::default()),
        ParseState::Quit => Ok(LastLineCommand {
            write: None,
            quit: true,
        }),
        ParseState::Name { quit, start } => Ok(LastLineCommand {
            write: Some(input[start..].to_string()),
            quit,
        }),
        ParseState::AfterName { quit, start, end } => Ok(LastLineCommand {
            write: Some(input[start..end].to_string()),
            quit,
        }),
        // `w` without a filename
        ParseState::Write | ParseState::WriteQuit | ParseState::BeforeName { .. } => Err(error()),
    }
}

/// Text being typed in lastline mode
#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    pub input: String,
}

impl CommandLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.input.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Append a typed byte
    pub fn push(&mut self, byte: u8) {
        self.input.push(char::from(byte));
    }

    /// Delete the last typed character (erase key)
    pub fn delete_char_before(&mut self) {
        self.input.pop();
    }

    /// Hand over the typed text and reset
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    /// Get display string (with ':' prefix)
    pub fn display(&self) -> String {
        format!(":{}", self.input)
    }
}
