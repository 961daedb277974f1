// Public value types shared by the keymap and the state machine.
mod rust_xkbcommon;
pub use rust_xkbcommon::*;

pub mod names;
