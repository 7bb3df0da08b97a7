//! Key bindings for driver commands
//!
//! Decouples raw keys from what the simulation should do with them, so a
//! terminal front end and a windowed one can share the same commands.
//!
//! # Example
//!
//! ```ignore
//! let mut mapper = InputMapper::with_defaults();
//! mapper.bind('x', SimCommand::Quit);
//!
//! if let Some(command) = mapper.get_command(key) {
//!     sim.apply(command);
//! }
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Commands the simulation honours synchronously
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimCommand {
    /// Every agent drops its plan and picks a new random goal
    RetargetAll,
    /// Toggle pausing of ticks
    Pause,
    /// Stop the driver loop
    Quit,
}

/// Maps keys to commands, with runtime rebinding
#[derive(Debug, Clone)]
pub struct InputMapper {
    /// Key to command bindings
    key_bindings: FxHashMap<char, SimCommand>,
    /// Reverse lookup: command to keys (for help text)
    command_keys: FxHashMap<SimCommand, Vec<char>>,
}

impl InputMapper {
    /// Create an empty input mapper.
    #[must_use]
    pub fn new() -> Self {
        Self {
            key_bindings: FxHashMap::default(),
            command_keys: FxHashMap::default(),
        }
    }

    /// Space or `r` retargets, `p` pauses, `q` quits.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut mapper = Self::new();
        mapper.bind(' ', SimCommand::RetargetAll);
        mapper.bind('r', SimCommand::RetargetAll);
        mapper.bind('p', SimCommand::Pause);
        mapper.bind('q', SimCommand::Quit);
        mapper
    }

    /// Bind a key to a command.
    ///
    /// If the key was previously bound, the old binding is replaced.
    pub fn bind(&mut self, key: char, command: SimCommand) {
        if let Some(old) = self.key_bindings.get(&key)
            && let Some(keys) = self.command_keys.get_mut(old)
        {
            keys.retain(|k| *k != key);
        }

        self.key_bindings.insert(key, command);
        self.command_keys.entry(command).or_default().push(key);
    }

    /// Unbind a key.
    pub fn unbind(&mut self, key: char) {
        if let Some(command) = self.key_bindings.remove(&key)
            && let Some(keys) = self.command_keys.get_mut(&command)
        {
            keys.retain(|k| *k != key);
        }
    }

    #[must_use]
    pub fn get_command(&self, key: char) -> Option<SimCommand> {
        self.key_bindings.get(&key).copied()
    }

    /// Get all keys bound to a command.
    #[must_use]
    pub fn get_keys(&self, command: SimCommand) -> &[char] {
        self.command_keys
            .get(&command)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Parse a line of terminal input.
    ///
    /// An empty line counts as a space; otherwise the first character is
    /// looked up, case-insensitively.
    #[must_use]
    pub fn parse_line(&self, line: &str) -> Option<SimCommand> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        let key = trimmed.chars().next().unwrap_or(' ');
        self.get_command(key)
            .or_else(|| self.get_command(key.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.key_bindings.len()
    }
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new()
    }
}
