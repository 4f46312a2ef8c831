//! Event types for the playground loop.

use crossterm::event::KeyEvent;

/// Events the playground loop reacts to.
#[derive(Debug)]
pub enum TuiEvent {
    /// User keyboard input.
    Key(KeyEvent),
    /// Bracketed paste content.
    Paste(String),
    /// The clipboard write finished, successfully or not.
    CopyCompleted,
}
