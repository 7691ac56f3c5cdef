//! Decoding of raw input bytes received in command mode.
//!
//! Single bytes map straight to a [`KeyAction`]. An escape byte starts an
//! [`EscapeSequence`], which collects the following bytes until they match
//! (or can no longer match) an entry of [`ESCAPE_SEQUENCES`].

pub const ESCAPE: u8 = 0x1b;
pub const CONTROL_C: u8 = 0x03;
pub const CONTROL_D: u8 = 0x04;
pub const CONTROL_G: u8 = 0x07;
pub const CONTROL_H: u8 = 0x08;

/// Cursor movement requested by a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Up,
    Down,
    Left,
    Right,
}

/// Keys that only print a message on the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ControlC,
    ControlD,
    Help,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::ControlC => "You typed Control-C.",
            Notice::ControlD => "You typed Control-D.",
            Notice::Help => "This is the Help Command. Not much help, sorry!",
        }
    }
}

/// Result of a single byte in command mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// i
    EnterInput,
    /// :
    EnterLastLine,
    Move(Motion),
    /// Escape byte, more bytes follow
    BeginEscape,
    Notice(Notice),
    /// Ctrl-G: print the cursor diagnostics
    ShowPosition,
}

impl KeyAction {
    /// Map a command-mode byte to its action. `erase_char` moves left unless
    /// it collides with one of the fixed bindings.
    pub fn from_command_byte(byte: u8, erase_char: u8) -> Option<Self> {
        let action = match byte {
            b'i' => KeyAction::EnterInput,
            b':' => KeyAction::EnterLastLine,
            b'j' => KeyAction::Move(Motion::Down),
            b'k' => KeyAction::Move(Motion::Up),
            b'l' | b' ' => KeyAction::Move(Motion::Right),
            b'h' => KeyAction::Move(Motion::Left),
            ESCAPE => KeyAction::BeginEscape,
            CONTROL_C => KeyAction::Notice(Notice::ControlC),
            CONTROL_D => KeyAction::Notice(Notice::ControlD),
            CONTROL_H => KeyAction::Notice(Notice::Help),
            CONTROL_G => KeyAction::ShowPosition,
            b if b == erase_char => KeyAction::Move(Motion::Left),
            _ => return None,
        };
        Some(action)
    }
}

/// Bytes following an escape, and the motion they stand for
pub const ESCAPE_SEQUENCES: &[(&[u8], Motion)] = &[
    (b"[A", Motion::Up),
    (b"[B", Motion::Down),
    (b"[C", Motion::Right),
    (b"[D", Motion::Left),
    // Application cursor mode
    (b"OA", Motion::Up),
    (b"OB", Motion::Down),
    (b"OC", Motion::Right),
    (b"OD", Motion::Left),
];

/// Outcome of feeding one byte to an [`EscapeSequence`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookahead {
    /// Still a prefix of a known sequence
    Pending,
    Matched(Motion),
    /// No known sequence starts this way; the bytes are dropped
    Unrecognized,
}

/// Bytes collected after an escape
#[derive(Debug, Clone, Default)]
pub struct EscapeSequence {
    bytes: Vec<u8>,
}

impl EscapeSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, byte: u8) -> Lookahead {
        self.bytes.push(byte);

        let mut is_prefix = false;
        for (sequence, motion) in ESCAPE_SEQUENCES {
            if *sequence == self.bytes.as_slice() {
                return Lookahead::Matched(*motion);
            }
            if sequence.starts_with(&self.bytes) {
                is_prefix = true;
            }
        }

        if is_prefix {
            Lookahead::Pending
        } else {
            Lookahead::Unrecognized
        }
    }
}
