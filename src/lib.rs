//! A Brainfuck tape machine.
//!
//! This crate runs Brainfuck programs on a growable tape of fixed-width cells
//! with a single data pointer.
//!
//! Features and behaviors:
//! - Memory tape initialized to 0, starting at 30,000 cells and growing to the
//!   right in 30,000-cell chunks. Moving left from cell 0 returns an error.
//! - Cells are 8, 16 or 32 bits wide and wrap on overflow and underflow.
//! - Output `.` prints the current cell as a character (no newline), or as a
//!   decimal number when the value is not a valid character.
//! - Input `,` reads from a pre-buffered file or pipe, or line by line from a
//!   terminal. Running out of input leaves the current cell unchanged.
//! - Loops `[]` are matched once, before execution; unmatched brackets are
//!   reported as errors and nothing runs.
//! - Any character outside `><+-.,[]` is a comment. `#` dumps the start of the
//!   tape when a debug window is configured.
//!
//! Quick start:
//!
//! ```no_run
//! use bf_tape::{Buffered, Machine, MachineConfig};
//!
//! // Classic "Hello World!" in Brainfuck
//! let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
//! let input = Box::new(Buffered::empty());
//! let mut bf = Machine::from_source(code, MachineConfig::default(), input, std::io::stdout())
//!     .expect("brackets are balanced");
//! bf.run().expect("program should run");
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod input;
pub mod jump_table;
pub mod machine;
pub mod program;
pub mod tape;
pub mod theme;

pub use config::MachineConfig;
pub use input::{Buffered, Editor, InputSource, Interactive, Line, LineReader, Lines, ReadOutcome};
pub use jump_table::{BracketError, JumpTable, UnmatchedBracketKind};
pub use machine::{Halt, Machine, MachineError, Step};
pub use program::{Command, Program};
pub use tape::{CellWidth, PointerUnderflow, Tape};
