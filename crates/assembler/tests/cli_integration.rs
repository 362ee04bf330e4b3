//! Integration tests for the assembler CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use assembler as _;
use object_core::parse_object;
use proptest as _;
use rstest::rstest;
use thiserror as _;

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_assembler"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run assembler")
}

fn create_temp_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

const MODULE_A: &str = "\
; module A uses Y from B
A: BEGIN
Y: EXTERN
PUBLIC START
SECTION TEXT
START: LOAD Y
STOP
END
";

#[test]
fn assembles_module_to_object_file() {
    let dir = tempfile::tempdir().unwrap();
    create_temp_file(dir.path(), "a.asm", MODULE_A);

    let output = run(dir.path(), &["a"]);
    assert!(output.status.success(), "{}", stdout(&output));

    let text = fs::read_to_string(dir.path().join("a.obj")).unwrap();
    let module = parse_object("a", &text).unwrap();
    assert_eq!(module.code, vec![10, 0, 14]);
    assert_eq!(module.uses.len(), 1);
    assert_eq!(module.uses[0].symbol, "Y");
    assert_eq!(module.definitions[0].symbol, "START");
}

#[test]
fn output_flag_overrides_object_path() {
    let dir = tempfile::tempdir().unwrap();
    create_temp_file(dir.path(), "a.asm", MODULE_A);

    let output = run(dir.path(), &["-o", "custom.obj", "a"]);
    assert!(output.status.success());
    assert!(dir.path().join("custom.obj").exists());
    assert!(!dir.path().join("a.obj").exists());
}

#[test]
fn verbose_prints_listings() {
    let dir = tempfile::tempdir().unwrap();
    create_temp_file(dir.path(), "a.asm", MODULE_A);

    let output = run(dir.path(), &["-v", "a"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Symbols:"));
    assert!(text.contains("TABLE USE"));
    assert!(text.contains("START"));
}

#[test]
fn no_arguments_prints_usage_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &[]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("Usage:"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn help_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn missing_source_reports_file_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["ghost"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("ghost.asm does not exist"));
}

#[rstest]
#[case("SECTION TEXT\nA: STOP\nA: STOP\n", "bad.asm:3: error: symbol redefinition")]
#[case("SECTION TEXT\nLOAD Q\n", "bad.asm:2: error: symbol 'Q' is not defined")]
#[case("SECTION DATA\nX: CONST 1\n", "bad.asm:1: error:")]
fn errors_are_reported_and_nothing_is_written(#[case] source: &str, #[case] expected: &str) {
    let dir = tempfile::tempdir().unwrap();
    create_temp_file(dir.path(), "bad.asm", source);

    let output = run(dir.path(), &["bad"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains(expected), "{}", stdout(&output));
    assert!(!dir.path().join("bad.obj").exists());
}
