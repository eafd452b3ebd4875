use std::collections::HashMap;
use std::fmt;

use crate::program::{Command, Program};

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedBracketKind {
    Open,
    Close,
}

impl fmt::Display for UnmatchedBracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedBracketKind::Open => write!(f, "'['"),
            UnmatchedBracketKind::Close => write!(f, "']'"),
        }
    }
}

/// Loops were not balanced; `ip` is the instruction index of the offending bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unmatched bracket {kind} at instruction {ip}")]
pub struct BracketError {
    pub ip: usize,
    pub kind: UnmatchedBracketKind,
}

/// Precomputed matching positions for every `[` and `]` of a program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JumpTable {
    opening: HashMap<usize, usize>,
    closing: HashMap<usize, usize>,
}

impl JumpTable {
    /// Match brackets with a stack of pending `[` indices.
    ///
    /// A `]` with nothing on the stack fails immediately. Anything left on the
    /// stack after the scan fails on the innermost unresolved `[`.
    pub fn build(program: &Program) -> Result<Self, BracketError> {
        let mut stack: Vec<usize> = Vec::new();
        let mut opening = HashMap::new();

        for (i, command) in program.commands().iter().enumerate() {
            match command {
                Command::LoopStart => stack.push(i),
                Command::LoopEnd => {
                    let Some(open_index) = stack.pop() else {
                        return Err(BracketError {
                            ip: i,
                            kind: UnmatchedBracketKind::Close,
                        });
                    };
                    opening.insert(open_index, i);
                }
                _ => {}
            }
        }

        if let Some(unmatched_open) = stack.last().copied() {
            return Err(BracketError {
                ip: unmatched_open,
                kind: UnmatchedBracketKind::Open,
            });
        }

        let closing = opening.iter().map(|(&open, &close)| (close, open)).collect();
        Ok(Self { opening, closing })
    }

    /// Index of the `]` matching the `[` at `index`.
    pub fn opening(&self, index: usize) -> Option<usize> {
        self.opening.get(&index).copied()
    }

    /// Index of the `[` matching the `]` at `index`.
    pub fn closing(&self, index: usize) -> Option<usize> {
        self.closing.get(&index).copied()
    }

    /// Number of bracket pairs.
    pub fn len(&self) -> usize {
        self.opening.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opening.is_empty()
    }
}
