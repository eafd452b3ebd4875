// Runs complete programs through the library with a captured output sink.
use std::io::Cursor;

use bf_tape::{Buffered, Halt, Interactive, Lines, Machine, MachineConfig, MachineError};

const HELLO: &str = include_str!("programs/hello.bf");
const ROT13: &str = include_str!("programs/rot13.bf");
const QUINE: &str = include_str!("programs/quine.bf");
const OBSCURE: &str = include_str!("programs/obscure.bf");

fn run_buffered(code: &str, input: &str) -> String {
    let input = Box::new(Buffered::from_bytes(input.as_bytes().to_vec()));
    let mut bf = Machine::from_source(code, MachineConfig::default(), input, Vec::new())
        .expect("balanced program");
    assert_eq!(bf.run().expect("program should run"), Halt::Finished);
    String::from_utf8(bf.into_output()).expect("utf8")
}

#[test]
fn hello_world() {
    assert_eq!(run_buffered(HELLO, ""), "Hello World!\n");
}

#[test]
fn rot13_with_pre_buffered_input() {
    assert_eq!(run_buffered(ROT13, "~mlk zyx\n"), "~zyx mlk\n");
}

#[test]
fn rot13_round_trips_a_sentence() {
    let once = run_buffered(ROT13, "Hello, World!\n");
    assert_eq!(once, "Uryyb, Jbeyq!\n");
    assert_eq!(run_buffered(ROT13, &once), "Hello, World!\n");
}

#[test]
fn rot13_reading_lines_interactively() {
    // Each read request pulls a whole line; the program stops once lines run out.
    let lines = Lines::new(Cursor::new("~mlk\nzyx\n"));
    let input = Box::new(Interactive::new(lines));
    let mut bf = Machine::from_source(ROT13, MachineConfig::default(), input, Vec::new()).unwrap();
    assert_eq!(bf.run().unwrap(), Halt::Finished);
    assert_eq!(String::from_utf8(bf.into_output()).unwrap(), "~zyx\nmlk\n");
}

#[test]
fn quine_prints_its_own_source() {
    assert_eq!(run_buffered(QUINE, ""), QUINE);
}

#[test]
fn obscure_brackets_and_stray_hash() {
    assert_eq!(run_buffered(OBSCURE, ""), "H\n");
}

#[test]
fn unmatched_brackets_never_run() {
    let input = Box::new(Buffered::empty());
    let result = Machine::from_source("+.[", MachineConfig::default(), input, Vec::new());
    assert!(matches!(result, Err(MachineError::UnmatchedBracket(_))));
}
