pub mod commands;
pub mod config;
pub mod editor;
pub mod input;
pub mod terminal;

pub use commands::{parse_lastline, LastLineCommand, ParseError};
pub use config::{load_config, Settings};
pub use editor::{Cursor, Editor, EditorError, InsertError, Mode, TextBuffer, Viewport};
pub use terminal::{Screen, Terminal};
