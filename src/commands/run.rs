use clap::Args;
use std::fs::{self, File};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::cli_util::{print_run_error, print_usage_error};
use crate::config::{load_file_settings, MachineConfig};
use crate::input::{Buffered, Editor, InputSource, Interactive};
use crate::jump_table::JumpTable;
use crate::machine::{Machine, MachineError};
use crate::program::Program;
use crate::tape::CellWidth;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Path of the program to execute
    #[arg(value_name = "PROGRAM")]
    pub program_file: Option<PathBuf>,

    /// File to pre-buffer as input (defaults to stdin)
    #[arg(value_name = "INPUT")]
    pub input_file: Option<PathBuf>,

    /// Cell width in bits: 8, 16 or 32 (fallback BF_CELL_WIDTH; default 8)
    #[arg(short = 'w', long = "cell-width", value_name = "BITS", value_parser = parse_cell_width)]
    pub cell_width: Option<CellWidth>,

    /// Enable `#` and dump this many leading cells (fallback BF_DEBUG_WINDOW)
    #[arg(short = 'd', long = "debug-window", value_name = "N", value_parser = parse_debug_window)]
    pub debug_window: Option<usize>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

/// Everything that can stop `bf` from running a program to completion.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("File not found: {path}")]
    ProgramNotFound { path: String },

    #[error("failed to read program file {path}: {source}")]
    ProgramUnreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read input file {path}: {source}")]
    InputUnreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read standard input: {source}")]
    StdinUnreadable {
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Machine(#[from] MachineError),
}

fn parse_cell_width(s: &str) -> Result<CellWidth, String> {
    s.parse::<CellWidth>().map_err(|e| e.to_string())
}

fn parse_debug_window(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("invalid debug window '{s}' (expected a positive integer)")),
    }
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RunArgs {
        program_file,
        input_file,
        cell_width,
        debug_window,
        ..
    } = args;

    let Some(program_file) = program_file else {
        usage_and_exit(program, 2);
    };

    // Resolve settings: flags -> env -> bf.toml -> defaults
    let config = match MachineConfig::resolve(cell_width, debug_window, &load_file_settings()) {
        Ok(config) => config,
        Err(e) => {
            print_usage_error(program, &e.to_string());
            return 2;
        }
    };

    let source = match read_program(&program_file) {
        Ok(source) => source,
        Err(err) => {
            print_run_error(program, "", &err);
            return 1;
        }
    };

    let code = Program::parse_with_debug(&source, config.debug_enabled());
    let code_str = code.to_string();

    // Brackets are checked before any input is consumed.
    let jumps = match JumpTable::build(&code) {
        Ok(jumps) => jumps,
        Err(err) => {
            print_run_error(program, &code_str, &RunError::from(MachineError::from(err)));
            return 1;
        }
    };

    let input = match open_input(input_file.as_deref(), code.reads_input()) {
        Ok(input) => input,
        Err(err) => {
            print_run_error(program, &code_str, &err);
            return 1;
        }
    };

    // Install SIGINT (ctrl+c) handler; the machine halts before its next instruction
    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = interrupt.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    let mut machine =
        Machine::from_parts(code, jumps, config, input, io::stdout().lock()).with_interrupt(interrupt);

    match machine.run() {
        Ok(_) => 0,
        Err(err) => {
            print_run_error(program, &code_str, &RunError::from(err));
            1
        }
    }
}

fn read_program(path: &Path) -> Result<String, RunError> {
    fs::read_to_string(path).map_err(|source| {
        let path = path.display().to_string();
        if source.kind() == io::ErrorKind::NotFound {
            RunError::ProgramNotFound { path }
        } else {
            RunError::ProgramUnreadable { path, source }
        }
    })
}

/// Pick the input source once, before execution starts.
///
/// An input file is always pre-buffered. Stdin is pre-buffered when it is a
/// file or pipe and read line by line through an editor when it is a
/// terminal. Programs without `,` never touch stdin.
fn open_input(path: Option<&Path>, reads_input: bool) -> Result<Box<dyn InputSource>, RunError> {
    if let Some(path) = path {
        let unreadable = |source| RunError::InputUnreadable {
            path: path.display().to_string(),
            source,
        };
        let file = File::open(path).map_err(unreadable)?;
        return Ok(Box::new(Buffered::from_reader(file).map_err(unreadable)?));
    }

    if !reads_input {
        return Ok(Box::new(Buffered::empty()));
    }

    if io::stdin().is_terminal() {
        return Ok(Box::new(Interactive::new(Editor::new())));
    }

    let buffered = Buffered::from_reader(io::stdin().lock())
        .map_err(|source| RunError::StdinUnreadable { source })?;
    Ok(Box::new(buffered))
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} <PROGRAM> [INPUT] [--cell-width|-w 8|16|32] [--debug-window|-d N]

Arguments:
  <PROGRAM>   Path of the Brainfuck program to run
  [INPUT]     File whose contents are fed to `,` (defaults to stdin)

Options:
  --cell-width,   -w <BITS>  Cell width: 8, 16 or 32 (fallback BF_CELL_WIDTH; default 8)
  --debug-window, -d <N>     Enable `#` and dump the first N cells (fallback BF_DEBUG_WINDOW)
  --help,         -h         Show this help

Notes:
- Characters other than ><+-.,[] (and `#` when debugging) are comments.
- Piped or file input is read up front; reads past its end leave the cell unchanged.
- On a terminal, `,` prompts for a line; the rest of the line feeds later reads.
- The tape grows to the right as needed; moving left of cell 0 is an error.
- Settings may also come from the [machine] section of bf.toml in the XDG config dir.

Examples:
    {0} hello.bf
    {0} rot13.bf message.txt
    echo 'uryyb' | {0} rot13.bf
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn debug_window_must_be_positive() {
        assert_eq!(parse_debug_window("5"), Ok(5));
        assert!(parse_debug_window("0").is_err());
        assert!(parse_debug_window("many").is_err());
    }

    #[test]
    fn cell_width_error_names_accepted_values() {
        let err = parse_cell_width("7").unwrap_err();
        assert!(err.contains("8, 16 or 32"), "{err}");
    }

    #[test]
    fn missing_program_is_reported_by_path() {
        let err = read_program(Path::new("definitely/not/here.bf")).unwrap_err();
        assert!(matches!(err, RunError::ProgramNotFound { .. }));
        assert_eq!(err.to_string(), "File not found: definitely/not/here.bf");
    }

    #[test]
    fn input_file_is_pre_buffered() {
        let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
        write!(tf, "ok").unwrap();
        let mut input = open_input(Some(tf.path()), true).unwrap();
        assert_eq!(input.read().unwrap(), crate::input::ReadOutcome::Value(u32::from('o')));
        assert_eq!(input.read().unwrap(), crate::input::ReadOutcome::Value(u32::from('k')));
        assert_eq!(input.read().unwrap(), crate::input::ReadOutcome::Unchanged);
    }

    #[test]
    fn programs_without_reads_ignore_stdin() {
        let mut input = open_input(None, false).unwrap();
        assert_eq!(input.read().unwrap(), crate::input::ReadOutcome::Unchanged);
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let err = open_input(Some(Path::new("no/such/input.txt")), true)
            .err()
            .expect("missing input");
        assert!(matches!(err, RunError::InputUnreadable { .. }));
    }
}
