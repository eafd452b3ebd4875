//! Input sources for the `,` command.
//!
//! The dispatcher only ever calls [`InputSource::read`]. Which variant backs
//! it is decided once, when the machine is built:
//!
//! - [`Buffered`] consumes a file or pipe completely up front. Reads dequeue
//!   one value each and become no-ops once the buffer is drained.
//! - [`Interactive`] asks its [`LineReader`] for a whole line whenever its
//!   buffer is empty. The first character answers the read; the rest of the
//!   line, newline included, is queued for later reads.

use std::collections::VecDeque;
use std::io::{self, BufRead, Read};

use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};

/// What a single read produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Store this value in the current cell.
    Value(u32),
    /// End of input; leave the current cell as it is.
    Unchanged,
    /// The user interrupted the read; halt the run.
    Interrupted,
}

pub trait InputSource {
    fn read(&mut self) -> io::Result<ReadOutcome>;
}

impl<T: InputSource + ?Sized> InputSource for Box<T> {
    fn read(&mut self) -> io::Result<ReadOutcome> {
        (**self).read()
    }
}

/// Decode raw input into cell values: valid UTF-8 becomes code points,
/// anything else is taken byte by byte.
pub fn decode_values(bytes: Vec<u8>) -> Vec<u32> {
    match String::from_utf8(bytes) {
        Ok(text) => text.chars().map(u32::from).collect(),
        Err(err) => err.into_bytes().into_iter().map(u32::from).collect(),
    }
}

/// Input read eagerly from a non-interactive source.
#[derive(Debug, Clone, Default)]
pub struct Buffered {
    pending: VecDeque<u32>,
}

impl Buffered {
    /// A source with nothing to read.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Drain `reader` to its end and queue everything it produced.
    pub fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            pending: decode_values(bytes).into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl InputSource for Buffered {
    fn read(&mut self) -> io::Result<ReadOutcome> {
        Ok(match self.pending.pop_front() {
            Some(value) => ReadOutcome::Value(value),
            None => ReadOutcome::Unchanged,
        })
    }
}

/// One line requested from an interactive user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// The text of the line without its terminator.
    Text(String),
    Eof,
    Interrupted,
}

pub trait LineReader {
    fn read_line(&mut self) -> io::Result<Line>;
}

/// Line-at-a-time input from a terminal.
pub struct Interactive<L> {
    lines: L,
    pending: VecDeque<u32>,
}

impl<L: LineReader> Interactive<L> {
    pub fn new(lines: L) -> Self {
        Self {
            lines,
            pending: VecDeque::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl<L: LineReader> InputSource for Interactive<L> {
    fn read(&mut self) -> io::Result<ReadOutcome> {
        if let Some(value) = self.pending.pop_front() {
            return Ok(ReadOutcome::Value(value));
        }

        match self.lines.read_line()? {
            Line::Text(text) => {
                let mut values = text.chars().map(u32::from).chain(Some(u32::from('\n')));
                // The chained terminator guarantees a first value.
                let first = values.next().unwrap_or(u32::from('\n'));
                self.pending.extend(values);
                Ok(ReadOutcome::Value(first))
            }
            Line::Eof => Ok(ReadOutcome::Unchanged),
            Line::Interrupted => Ok(ReadOutcome::Interrupted),
        }
    }
}

/// Lines from any buffered reader, with `\n` or `\r\n` terminators stripped.
pub struct Lines<R> {
    reader: R,
}

impl<R: BufRead> Lines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineReader for Lines<R> {
    fn read_line(&mut self) -> io::Result<Line> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(Line::Eof);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Line::Text(line))
    }
}

/// Lines typed into a `reedline` editor.
pub struct Editor {
    editor: Reedline,
    prompt: DefaultPrompt,
}

impl Editor {
    pub fn new() -> Self {
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("input".to_string()),
            DefaultPromptSegment::Empty,
        );
        Self {
            editor: Reedline::create(),
            prompt,
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader for Editor {
    fn read_line(&mut self) -> io::Result<Line> {
        match self.editor.read_line(&self.prompt)? {
            Signal::Success(buffer) => Ok(Line::Text(buffer)),
            Signal::CtrlC => Ok(Line::Interrupted),
            Signal::CtrlD => Ok(Line::Eof),
        }
    }
}
