//! Input handling module
//!
//! Maps raw keys to simulation commands.

mod command;

pub use command::{InputMapper, SimCommand};
