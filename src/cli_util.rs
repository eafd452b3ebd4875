use std::io::{self, IsTerminal, Write};

use nu_ansi_term::Style;

use crate::commands::run::RunError;
use crate::machine::MachineError;
use crate::theme::catppuccin::Mocha as P;

/// Characters of context shown on each side of the failing instruction.
const WINDOW_CHARS: usize = 32;

/// Pretty-print a `bf` failure. Errors that point at an instruction get a
/// caret context window over the instruction stream `code`.
pub fn print_run_error(program: &str, code: &str, err: &RunError) {
    match err {
        RunError::Machine(inner) => print_machine_error(Some(program), code, inner),
        other => {
            eprintln!("{}", header(&format!("{program}: {other}")));
            let _ = io::stderr().flush();
        }
    }
}

/// Pretty-print a structured [`MachineError`] with caret positioning.
/// If `program` is `Some("bf")`, messages are prefixed with "bf: ...".
pub fn print_machine_error(program: Option<&str>, code: &str, err: &MachineError) {
    let prefix_program = |msg: &str| {
        if let Some(p) = program {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    match err {
        MachineError::UnmatchedBracket(bracket) => {
            let msg = prefix_program(&format!("Parse error: unmatched bracket {}", bracket.kind));
            print_error_with_context(&msg, code, bracket.ip);
        }
        MachineError::PointerUnderflow { ip, ptr } => {
            let msg = prefix_program(&format!(
                "Runtime error: pointer moved below cell 0 (ptr={ptr})"
            ));
            print_error_with_context(&msg, code, *ip);
        }
        MachineError::Io { ip, source } => {
            let msg = prefix_program(&format!("I/O error: {source}"));
            print_error_with_context(&msg, code, *ip);
        }
    }
}

/// Print a concise error with instruction index and a caret context window.
pub fn print_error_with_context(prefix: &str, code: &str, pos: usize) {
    eprintln!("{} at instruction {pos}", header(prefix));

    let [slice, underline] = context_lines(code, pos);
    let styled = io::stderr().is_terminal();
    eprintln!("  {}", paint(Style::new().fg(P::SURFACE2), &slice, styled));
    eprintln!("  {}", paint(Style::new().fg(P::YELLOW).bold(), &underline, styled));
    let _ = io::stderr().flush();
}

/// A window of `code` around `pos` and a caret line pointing at `pos`.
///
/// `code` is an instruction stream, so every character is one byte wide.
pub fn context_lines(code: &str, pos: usize) -> [String; 2] {
    let total = code.len();
    let start = pos.saturating_sub(WINDOW_CHARS).min(total);
    let end = (pos + WINDOW_CHARS + 1).min(total);
    let slice = code.get(start..end).unwrap_or_default().to_string();

    let mut underline = " ".repeat(pos.saturating_sub(start));
    underline.push('^');
    [slice, underline]
}

/// Error headers are styled only when stderr is a terminal so that
/// redirected diagnostics stay plain text.
fn header(msg: &str) -> String {
    paint(Style::new().fg(P::RED).bold(), msg, io::stderr().is_terminal())
}

fn paint(style: Style, text: &str, styled: bool) -> String {
    if styled {
        style.paint(text).to_string()
    } else {
        text.to_string()
    }
}

/// Print a usage problem (bad flag value, bad config) in the warning colour.
pub fn print_usage_error(program: &str, msg: &str) {
    let styled = io::stderr().is_terminal();
    let name = paint(Style::new().fg(P::PEACH).bold(), program, styled);
    let body = paint(Style::new().fg(P::TEXT), msg, styled);
    eprintln!("{name}: {body}");
    let _ = io::stderr().flush();
}
