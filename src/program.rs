//! The instruction stream.
//!
//! Raw program text is filtered down to the recognized command alphabet
//! `><+-.,[]` (plus `#` when debugging is enabled). Everything else is a
//! comment. The resulting [`Program`] is immutable; instruction indices are the
//! unit of control transfer for the dispatcher and for diagnostics.

use std::fmt;

/// One recognized command symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `>` move the pointer right, growing the tape if needed.
    Right,
    /// `<` move the pointer left.
    Left,
    /// `+` increment the current cell.
    Increment,
    /// `-` decrement the current cell.
    Decrement,
    /// `.` print the current cell as a character.
    Output,
    /// `,` read one value into the current cell.
    Input,
    /// `[` skip past the matching `]` when the current cell is zero.
    LoopStart,
    /// `]` jump back past the matching `[` when the current cell is non-zero.
    LoopEnd,
    /// `#` dump a window of the tape (extension).
    Debug,
}

impl Command {
    /// Map a source character to a command. `#` is only recognized when
    /// `debug` is set.
    pub fn from_char(ch: char, debug: bool) -> Option<Self> {
        Some(match ch {
            '>' => Command::Right,
            '<' => Command::Left,
            '+' => Command::Increment,
            '-' => Command::Decrement,
            '.' => Command::Output,
            ',' => Command::Input,
            '[' => Command::LoopStart,
            ']' => Command::LoopEnd,
            '#' if debug => Command::Debug,
            _ => return None,
        })
    }

    pub fn symbol(self) -> char {
        match self {
            Command::Right => '>',
            Command::Left => '<',
            Command::Increment => '+',
            Command::Decrement => '-',
            Command::Output => '.',
            Command::Input => ',',
            Command::LoopStart => '[',
            Command::LoopEnd => ']',
            Command::Debug => '#',
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A filtered, immutable instruction stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    commands: Vec<Command>,
}

impl Program {
    /// Parse the eight classic commands; `#` is treated as a comment.
    pub fn parse(source: &str) -> Self {
        Self::parse_with_debug(source, false)
    }

    /// Parse the classic commands and, when `debug` is set, the `#` extension.
    pub fn parse_with_debug(source: &str, debug: bool) -> Self {
        let commands = source
            .chars()
            .filter_map(|c| Command::from_char(c, debug))
            .collect();
        Self { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Command> {
        self.commands.get(index).copied()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Whether the program ever executes a read.
    pub fn reads_input(&self) -> bool {
        self.commands.contains(&Command::Input)
    }
}

impl From<Vec<Command>> for Program {
    fn from(commands: Vec<Command>) -> Self {
        Self { commands }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for command in &self.commands {
            write!(f, "{command}")?;
        }
        Ok(())
    }
}
