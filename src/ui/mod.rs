//! Presentation seams and their terminal implementations

pub mod conversation;
pub mod surface;
pub mod terminal;

pub use surface::{ChatSurface, Dialogs};
pub use terminal::{TerminalDialogs, TerminalSurface};
