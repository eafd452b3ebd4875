//! The dispatcher.
//!
//! A [`Machine`] owns everything a run mutates: the tape, the input source
//! and the output sink. The instruction stream and its jump table are built
//! before any of that state exists, so a structural error never leaves a
//! half-constructed machine behind.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::MachineConfig;
use crate::input::{InputSource, ReadOutcome};
use crate::jump_table::{BracketError, JumpTable};
use crate::program::{Command, Program};
use crate::tape::Tape;

/// Errors that can stop a program from running to completion.
#[derive(Debug, thiserror::Error)]
pub enum MachineError {
    /// Loops were not balanced; detected before execution starts.
    #[error(transparent)]
    UnmatchedBracket(#[from] BracketError),

    /// The data pointer attempted to move left of cell 0.
    #[error("Pointer moved below cell 0 at instruction {ip} (ptr={ptr})")]
    PointerUnderflow { ip: usize, ptr: isize },

    /// Reading input or writing output failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: io::Error,
    },
}

/// Why a run stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The instruction index ran off the end of the program.
    Finished,
    /// The interrupt flag was raised, or the user interrupted a read.
    Interrupted,
}

/// Result of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Halt(Halt),
}

pub struct Machine<W: Write> {
    program: Program,
    jumps: JumpTable,
    tape: Tape,
    input: Box<dyn InputSource>,
    output: W,
    debug_window: Option<usize>,
    interrupt: Option<Arc<AtomicBool>>,
    ip: usize,
}

impl<W: Write> Machine<W> {
    /// Build a machine for an already parsed program.
    pub fn new(
        program: Program,
        config: MachineConfig,
        input: Box<dyn InputSource>,
        output: W,
    ) -> Result<Self, MachineError> {
        let jumps = JumpTable::build(&program)?;
        Ok(Self::from_parts(program, jumps, config, input, output))
    }

    /// Build a machine from a program and the jump table already built for it
    /// with [`JumpTable::build`].
    pub fn from_parts(
        program: Program,
        jumps: JumpTable,
        config: MachineConfig,
        input: Box<dyn InputSource>,
        output: W,
    ) -> Self {
        Self {
            program,
            jumps,
            tape: Tape::new(config.cell_width),
            input,
            output,
            debug_window: config.debug_window,
            interrupt: None,
            ip: 0,
        }
    }

    /// Parse `source` (recognizing `#` only when a debug window is configured)
    /// and build a machine for it.
    pub fn from_source(
        source: &str,
        config: MachineConfig,
        input: Box<dyn InputSource>,
        output: W,
    ) -> Result<Self, MachineError> {
        let program = Program::parse_with_debug(source, config.debug_enabled());
        Self::new(program, config, input, output)
    }

    /// Halt cleanly before the next instruction once `flag` is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Replace the tape, e.g. with one using a custom layout.
    pub fn with_tape(mut self, tape: Tape) -> Self {
        self.tape = tape;
        self
    }

    /// Execute the program until it finishes, is interrupted, or faults.
    ///
    /// Output is flushed on every exit path, so anything emitted before a
    /// fault is visible before the caller reports it.
    pub fn run(&mut self) -> Result<Halt, MachineError> {
        let result = loop {
            match self.step() {
                Ok(Step::Continue) => {}
                Ok(Step::Halt(halt)) => break Ok(halt),
                Err(err) => break Err(err),
            }
        };

        let flushed = self.output.flush();
        let halt = result?;
        flushed.map_err(|source| MachineError::Io { ip: self.ip, source })?;
        Ok(halt)
    }

    /// Execute the instruction at the current index.
    pub fn step(&mut self) -> Result<Step, MachineError> {
        if self.interrupted() {
            return Ok(Step::Halt(Halt::Interrupted));
        }
        let Some(command) = self.program.get(self.ip) else {
            return Ok(Step::Halt(Halt::Finished));
        };
        let ip = self.ip;

        self.ip = match command {
            Command::LoopStart => {
                if self.tape.read_cell() == 0 {
                    self.jumps.opening(ip).expect("validated bracket") + 1
                } else {
                    ip + 1
                }
            }
            Command::LoopEnd => {
                if self.tape.read_cell() != 0 {
                    self.jumps.closing(ip).expect("validated bracket") + 1
                } else {
                    ip + 1
                }
            }
            Command::Right => {
                self.tape.move_right();
                ip + 1
            }
            Command::Left => {
                self.tape
                    .move_left()
                    .map_err(|fault| MachineError::PointerUnderflow { ip, ptr: fault.ptr })?;
                ip + 1
            }
            Command::Increment => {
                self.tape.increment_cell();
                ip + 1
            }
            Command::Decrement => {
                self.tape.decrement_cell();
                ip + 1
            }
            Command::Output => {
                self.print_cell().map_err(|source| MachineError::Io { ip, source })?;
                ip + 1
            }
            Command::Input => {
                match self.read_cell().map_err(|source| MachineError::Io { ip, source })? {
                    ReadOutcome::Value(value) => self.tape.write_cell(value),
                    ReadOutcome::Unchanged => {}
                    ReadOutcome::Interrupted => return Ok(Step::Halt(Halt::Interrupted)),
                }
                ip + 1
            }
            Command::Debug => {
                self.dump_tape().map_err(|source| MachineError::Io { ip, source })?;
                ip + 1
            }
        };

        Ok(Step::Continue)
    }

    /// Print the current cell as a character, or as a decimal number when it
    /// is not a Unicode scalar value.
    fn print_cell(&mut self) -> io::Result<()> {
        let value = self.tape.read_cell();
        match char::from_u32(value) {
            Some(ch) => write!(self.output, "{ch}"),
            None => write!(self.output, "{value}"),
        }
    }

    fn read_cell(&mut self) -> io::Result<ReadOutcome> {
        // Anything already printed must reach the terminal before a prompt.
        self.output.flush()?;
        self.input.read()
    }

    fn dump_tape(&mut self) -> io::Result<()> {
        let Some(size) = self.debug_window else {
            return Ok(());
        };
        let window = self.tape.window(size);
        write!(
            self.output,
            "\n#debug ptr={} cells[0..{}]={:?}\n",
            self.tape.pointer(),
            window.len(),
            window
        )
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Index of the next instruction to execute.
    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Buffered;
    use crate::jump_table::UnmatchedBracketKind;
    use crate::tape::CellWidth;

    fn machine(code: &str) -> Machine<Vec<u8>> {
        machine_with(code, MachineConfig::default(), "")
    }

    fn machine_with(code: &str, config: MachineConfig, input: &str) -> Machine<Vec<u8>> {
        let input = Box::new(Buffered::from_bytes(input.as_bytes().to_vec()));
        Machine::from_source(code, config, input, Vec::new()).expect("balanced program")
    }

    fn run_to_string(code: &str, input: &str) -> String {
        let mut bf = machine_with(code, MachineConfig::default(), input);
        assert_eq!(bf.run().unwrap(), Halt::Finished);
        String::from_utf8(bf.into_output()).unwrap()
    }

    #[test]
    fn empty_program_finishes_immediately() {
        let mut bf = machine("");
        assert_eq!(bf.step().unwrap(), Step::Halt(Halt::Finished));
        assert_eq!(bf.run().unwrap(), Halt::Finished);
    }

    #[test]
    fn loop_on_zero_cell_is_skipped() {
        let mut bf = machine("[-]");
        assert_eq!(bf.step().unwrap(), Step::Continue);
        // Jumped past the matching ']' at index 2.
        assert_eq!(bf.ip(), 3);
        assert_eq!(bf.run().unwrap(), Halt::Finished);
        assert_eq!(bf.tape().read_cell(), 0);
    }

    #[test]
    fn loop_body_runs_once_for_one() {
        let mut bf = machine("+[-]");
        let mut steps = 0;
        while bf.step().unwrap() == Step::Continue {
            steps += 1;
        }
        // '+', '[', '-', ']' each execute exactly once.
        assert_eq!(steps, 4);
        assert_eq!(bf.tape().read_cell(), 0);
    }

    #[test]
    fn loop_end_jumps_past_matching_open() {
        let mut bf = machine("++[-]");
        for _ in 0..4 {
            bf.step().unwrap();
        }
        // At ']' with cell 1: jump to the '-' right after '[' (index 3).
        assert_eq!(bf.ip(), 4);
        bf.step().unwrap();
        assert_eq!(bf.ip(), 3);
    }

    #[test]
    fn unmatched_brackets_fail_before_running() {
        let input = Box::new(Buffered::empty());
        let err = Machine::from_source("+]", MachineConfig::default(), input, Vec::new())
            .err()
            .expect("unmatched bracket");
        assert!(matches!(
            err,
            MachineError::UnmatchedBracket(BracketError { ip: 1, kind: UnmatchedBracketKind::Close })
        ));

        let input = Box::new(Buffered::empty());
        let err = Machine::from_source("[+", MachineConfig::default(), input, Vec::new())
            .err()
            .expect("unmatched bracket");
        assert!(matches!(
            err,
            MachineError::UnmatchedBracket(BracketError { ip: 0, kind: UnmatchedBracketKind::Open })
        ));
    }

    #[test]
    fn pointer_underflow_halts_and_keeps_earlier_output() {
        // Prints 'A' then steps left of cell 0; the final '.' must never run.
        let code = format!("{}.<.", "+".repeat(65));
        let mut bf = machine(&code);
        let err = bf.run().unwrap_err();
        assert!(matches!(err, MachineError::PointerUnderflow { ip: 66, ptr: -1 }));
        assert_eq!(bf.output(), b"A");
    }

    #[test]
    fn output_falls_back_to_decimal_outside_char_range() {
        let config = MachineConfig {
            cell_width: CellWidth::ThirtyTwo,
            debug_window: None,
        };
        let mut bf = machine_with("-.", config, "");
        bf.run().unwrap();
        assert_eq!(String::from_utf8(bf.into_output()).unwrap(), u32::MAX.to_string());
    }

    #[test]
    fn output_encodes_non_ascii_code_points() {
        let config = MachineConfig {
            cell_width: CellWidth::Sixteen,
            debug_window: None,
        };
        // 0xE9 = 233 = 'é'
        let mut bf = machine_with(&format!("{}.", "+".repeat(0xE9)), config, "");
        bf.run().unwrap();
        assert_eq!(String::from_utf8(bf.into_output()).unwrap(), "é");
    }

    #[test]
    fn echo_copies_buffered_input_up_to_nul() {
        assert_eq!(run_to_string(",[.,]", "echo me\0ignored"), "echo me");
    }

    #[test]
    fn read_on_drained_buffer_leaves_cell_alone() {
        let mut bf = machine_with("+++,", MachineConfig::default(), "");
        bf.run().unwrap();
        assert_eq!(bf.tape().read_cell(), 3);
    }

    #[test]
    fn wide_input_is_masked_to_cell_width() {
        let mut narrow = machine_with(",", MachineConfig::default(), "€");
        narrow.run().unwrap();
        assert_eq!(narrow.tape().read_cell(), 0x20AC & 0xFF);

        let config = MachineConfig {
            cell_width: CellWidth::Sixteen,
            debug_window: None,
        };
        let mut wide = machine_with(",", config, "€");
        wide.run().unwrap();
        assert_eq!(wide.tape().read_cell(), 0x20AC);
    }

    #[test]
    fn debug_dumps_window_and_pointer() {
        let config = MachineConfig {
            cell_width: CellWidth::Eight,
            debug_window: Some(3),
        };
        let mut bf = machine_with("+>++>+++>#", config, "");
        bf.run().unwrap();
        assert_eq!(
            String::from_utf8(bf.into_output()).unwrap(),
            "\n#debug ptr=3 cells[0..3]=[1, 2, 3]\n"
        );
    }

    #[test]
    fn hash_is_inert_without_debug_window() {
        assert_eq!(run_to_string("+#.", ""), "\u{1}");
    }

    #[test]
    fn interrupt_flag_stops_before_next_instruction() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut bf = machine("+.+.").with_interrupt(flag.clone());
        bf.step().unwrap();
        flag.store(true, Ordering::Relaxed);
        assert_eq!(bf.run().unwrap(), Halt::Interrupted);
        assert!(bf.output().is_empty());
        assert_eq!(bf.tape().read_cell(), 1);
    }

    #[test]
    fn infinite_loop_can_be_interrupted() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut bf = machine("+[]").with_interrupt(flag.clone());
        for _ in 0..1_000 {
            assert_eq!(bf.step().unwrap(), Step::Continue);
        }
        flag.store(true, Ordering::Relaxed);
        assert_eq!(bf.run().unwrap(), Halt::Interrupted);
    }

    #[test]
    fn custom_tape_grows_while_running() {
        let mut bf = machine(">>>>+").with_tape(Tape::with_layout(CellWidth::Eight, 2, 2));
        bf.run().unwrap();
        assert_eq!(bf.tape().pointer(), 4);
        assert_eq!(bf.tape().len(), 6);
        assert_eq!(bf.tape().read_cell(), 1);
    }
}
