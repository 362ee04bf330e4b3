//! CLI entry point for the linker binary.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use linker::linker::{render_globals, render_modules};
use linker::{write_image, Linker};
use object_core::{image_path, to_image_text, OBJECT_EXTENSION};
#[cfg(test)]
use assembler as _;
#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;

/// Exit status for every fatal error.
const EXIT_FAILURE: i32 = -1;

const USAGE_TEXT: &str = "\
Usage: linker [options] <module1> <module2> ...

Links <module1>.obj <module2>.obj ... into <module1>.e.

Options:
  -o, --output <file>  Output file path (default: <module1>.e)
  -v, --verbose        Print module tables, global symbols and the image
  -h, --help           Show this help message

Examples:
  linker main lib
  linker -o prog.e main lib
";

#[derive(Debug, PartialEq, Eq)]
struct LinkArgs {
    modules: Vec<PathBuf>,
    output: Option<PathBuf>,
    verbose: bool,
}

#[derive(Debug)]
enum ParseResult {
    Command(LinkArgs),
    Help,
}

#[allow(clippy::while_let_on_iterator)]
fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut modules: Vec<PathBuf> = Vec::new();
    let mut output: Option<PathBuf> = None;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Ok(ParseResult::Help);
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg == "-o" || arg == "--output" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for -o".to_string())?;
            output = Some(PathBuf::from(value));
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        modules.push(module_stem(PathBuf::from(arg)));
    }

    if modules.is_empty() {
        return Err("missing module names".to_string());
    }
    Ok(ParseResult::Command(LinkArgs {
        modules,
        output,
        verbose,
    }))
}

/// Accepts `prog` as well as `prog.obj`.
fn module_stem(path: PathBuf) -> PathBuf {
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(OBJECT_EXTENSION))
    {
        path.with_extension("")
    } else {
        path
    }
}

fn run_link(args: LinkArgs) -> Result<(), i32> {
    let report = |e: linker::LinkError| {
        println!("{}", e.format_for_stdout());
        EXIT_FAILURE
    };

    let mut linker = Linker::load(&args.modules).map_err(report)?;
    let image = linker.link().map_err(report)?.clone();

    if args.verbose {
        println!("Modules:");
        print!("{}", render_modules(linker.modules()));
        println!();
        println!("Globals:");
        print!("{}", render_globals(&image.globals));
        println!();
        println!("Image:");
        print!("{}", to_image_text(&image.words));
        println!();
    }

    let output_path = args
        .output
        .unwrap_or_else(|| image_path(&args.modules[0]));
    write_image(&output_path, &image).map_err(report)?;

    println!(
        "Linked {} module(s) ({} words) -> {}",
        args.modules.len(),
        image.words.len(),
        output_path.display()
    );
    Ok(())
}

fn main() {
    let mut args = env::args_os().skip(1).peekable();
    if args.peek().is_none() {
        println!("{USAGE_TEXT}");
        std::process::exit(EXIT_FAILURE);
    }

    let exit_code = match parse_args(args) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(args)) => match run_link(args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            println!("error: {error}");
            println!("{USAGE_TEXT}");
            EXIT_FAILURE
        }
    };

    std::process::exit(exit_code);
}
