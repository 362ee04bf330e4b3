//! CLI entry point for the assembler binary.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use assembler::assembler::{render_source, render_symbols, SOURCE_EXTENSION};
use assembler::{assemble_file, write_object, Assembled};
use object_core::{object_path, to_object_text};
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
Usage: assembler [options] <module>

Assembles <module>.asm into <module>.obj.

Options:
  -o, --output <file>  Output file path (default: <module>.obj)
  -v, --verbose        Print source, symbol table and object tables
  -h, --help           Show this help message

Examples:
  assembler prog
  assembler -o out/prog.obj prog
";

#[derive(Debug, PartialEq, Eq)]
struct BuildArgs {
    module: PathBuf,
    output: Option<PathBuf>,
    verbose: bool,
}

#[derive(Debug)]
enum ParseResult {
    Command(BuildArgs),
    Help,
}

#[allow(clippy::while_let_on_iterator)]
fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut module: Option<PathBuf> = None;
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

        if module.is_some() {
            return Err("the assembler takes exactly one module".to_string());
        }
        module = Some(module_stem(PathBuf::from(arg)));
    }

    let module = module.ok_or_else(|| "missing module name".to_string())?;
    Ok(ParseResult::Command(BuildArgs {
        module,
        output,
        verbose,
    }))
}

/// Accepts `prog` as well as `prog.asm`.
fn module_stem(path: PathBuf) -> PathBuf {
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
    {
        path.with_extension("")
    } else {
        path
    }
}

fn run_build(args: BuildArgs) -> Result<(), i32> {
    let assembled = assemble_file(&args.module).map_err(|e| {
        println!("{}", e.format_for_stdout());
        EXIT_FAILURE
    })?;

    if args.verbose {
        print_listing(&assembled);
    }

    let output_path = args.output.unwrap_or_else(|| object_path(&args.module));
    write_object(&output_path, &assembled.module).map_err(|e| {
        println!("{}", e.format_for_stdout());
        EXIT_FAILURE
    })?;

    println!(
        "Assembled {} ({} words) -> {}",
        display_module(&args.module),
        assembled.module.size(),
        output_path.display()
    );
    Ok(())
}

fn display_module(stem: &Path) -> String {
    format!("{}.{SOURCE_EXTENSION}", stem.display())
}

fn print_listing(assembled: &Assembled) {
    println!("Source:");
    print!("{}", render_source(&assembled.source));
    println!();
    println!("Symbols:");
    print!("{}", render_symbols(&assembled.symbols));
    println!();
    println!("Object:");
    print!("{}", to_object_text(&assembled.module));
    println!();
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
        Ok(ParseResult::Command(args)) => match run_build(args) {
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
