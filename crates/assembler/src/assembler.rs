//! Top-level assembler pipeline.
//!
//! 1. **Preprocess**: comments, tokens, `EQU` aliases ([`crate::preprocess`])
//! 2. **Pass 1**: statements, section rules, symbol table ([`crate::symbols`])
//! 3. **Pass 2**: code words and object tables ([`crate::encoder`])
//!
//! [`Assembler`] runs the passes on demand and keeps the first error, so a
//! failed module answers every later request with the same error. The
//! [`assemble_file`] entry point drives it for one `<stem>.asm` file.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use object_core::{module_name, to_object_text, with_appended_extension, Module};

use crate::encoder;
use crate::errors::{AssembleError, AssembleErrorKind};
use crate::preprocess::preprocess;
use crate::source::{load_source, SourceLine};
use crate::symbols::{self, Assignment, Scope, SymbolTable};

/// Source file extension.
pub const SOURCE_EXTENSION: &str = "asm";

/// Two-pass assembler for one module.
#[derive(Debug, Clone)]
pub struct Assembler {
    name: String,
    file: String,
    lines: Vec<SourceLine>,
    pass1: Option<Result<Assignment, AssembleError>>,
    pass2: Option<Result<Module, AssembleError>>,
}

impl Assembler {
    /// Creates an assembler for preprocessed lines.
    #[must_use]
    pub fn new(name: impl Into<String>, lines: Vec<SourceLine>) -> Self {
        let name = name.into();
        Self {
            file: format!("{name}.{SOURCE_EXTENSION}"),
            name,
            lines,
            pass1: None,
            pass2: None,
        }
    }

    /// Preprocesses raw source text and creates an assembler for it.
    ///
    /// # Errors
    ///
    /// Returns preprocessor errors, tagged with `<name>.asm`.
    pub fn from_source(name: impl Into<String>, text: &str) -> Result<Self, AssembleError> {
        let name = name.into();
        let file = format!("{name}.{SOURCE_EXTENSION}");
        let lines = preprocess(text).map_err(|e| e.in_file(&file))?;
        Ok(Self::new(name, lines))
    }

    /// Overrides the file name used in diagnostics.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    /// Module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Preprocessed source lines.
    #[must_use]
    pub fn source(&self) -> &[SourceLine] {
        &self.lines
    }

    /// Runs the first pass once and returns its result.
    ///
    /// # Errors
    ///
    /// Returns the first-pass error, now and on every later call.
    pub fn first_pass(&mut self) -> Result<&Assignment, AssembleError> {
        let result = match self.pass1.take() {
            Some(result) => result,
            None => symbols::first_pass(&self.lines).map_err(|e| e.in_file(&self.file)),
        };
        self.pass1.insert(result).as_ref().map_err(Clone::clone)
    }

    /// Runs the second pass once, after the first, and returns the module.
    ///
    /// # Errors
    ///
    /// Returns the first error of either pass, now and on every later call.
    pub fn second_pass(&mut self) -> Result<&Module, AssembleError> {
        let result = match self.pass2.take() {
            Some(result) => result,
            None => {
                let name = self.name.clone();
                let file = self.file.clone();
                self.first_pass().and_then(|assignment| {
                    encoder::second_pass(&name, assignment).map_err(|e| e.in_file(&file))
                })
            }
        };
        self.pass2.insert(result).as_ref().map_err(Clone::clone)
    }

    /// The assembled module, if the second pass has succeeded.
    #[must_use]
    pub fn module(&self) -> Option<&Module> {
        self.pass2.as_ref().and_then(|result| result.as_ref().ok())
    }

    /// The symbol table, if the first pass has succeeded.
    #[must_use]
    pub fn symbols(&self) -> Option<&SymbolTable> {
        self.pass1
            .as_ref()
            .and_then(|result| result.as_ref().ok())
            .map(|assignment| &assignment.symbols)
    }

    /// The stored error, if any pass has failed.
    #[must_use]
    pub fn error(&self) -> Option<&AssembleError> {
        match (&self.pass1, &self.pass2) {
            (Some(Err(error)), _) | (_, Some(Err(error))) => Some(error),
            _ => None,
        }
    }

    /// Runs both passes and returns the module with its symbol table.
    ///
    /// # Errors
    ///
    /// Returns the first error of either pass.
    pub fn finish(mut self) -> Result<Assembled, AssembleError> {
        let module = self.second_pass()?.clone();
        let symbols = self.symbols().cloned().unwrap_or_default();
        Ok(Assembled {
            module,
            symbols,
            source: self.lines,
        })
    }
}

/// A successfully assembled module with what the listings need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    /// The object module.
    pub module: Module,
    /// First-pass symbol table.
    pub symbols: SymbolTable,
    /// Preprocessed source.
    pub source: Vec<SourceLine>,
}

/// `<stem>.asm`.
#[must_use]
pub fn source_path(stem: &Path) -> PathBuf {
    with_appended_extension(stem, SOURCE_EXTENSION)
}

/// Assembles `<stem>.asm`. The module is named after the last path
/// component of `stem`.
///
/// # Errors
///
/// Returns `FileNotFound` or `Io` if the source cannot be read, then the
/// first preprocessor or assembly error.
pub fn assemble_file(stem: &Path) -> Result<Assembled, AssembleError> {
    let path = source_path(stem);
    let display = path.display().to_string();
    let text = load_source(&path)?;
    let name = module_name(stem);
    let lines = preprocess(&text).map_err(|e| e.in_file(&display))?;
    Assembler::new(name, lines).with_file(display).finish()
}

/// Writes a module in object text format.
///
/// # Errors
///
/// Returns `Io` if the file cannot be written.
pub fn write_object(path: &Path, module: &Module) -> Result<(), AssembleError> {
    fs::write(path, to_object_text(module)).map_err(|e| {
        AssembleError::new(AssembleErrorKind::Io(e.to_string())).in_file(&path.display().to_string())
    })
}

/// Renders the preprocessed source, one numbered line each.
#[must_use]
pub fn render_source(lines: &[SourceLine]) -> String {
    let mut out = String::new();
    for line in lines {
        let _ = writeln!(out, "{:>4}  {}", line.line, line.text());
    }
    out
}

/// Renders the symbol table: name, address, scope and defining line.
#[must_use]
pub fn render_symbols(symbols: &SymbolTable) -> String {
    let mut out = String::new();
    for (name, symbol) in symbols {
        let scope = match symbol.scope {
            Scope::Local => "local",
            Scope::Extern => "extern",
            Scope::Public => "public",
        };
        let _ = writeln!(
            out,
            "{name:<12} {:>5}  {scope:<6}  line {}",
            symbol.address, symbol.defined_at
        );
    }
    out
}
