//! Structured error reporting for the assembler.
//!
//! Every failure is a value: an [`AssembleErrorKind`] describing what went
//! wrong, wrapped in an [`AssembleError`] that remembers the source file and
//! line. Kinds are grouped into coarse [`ErrorClass`]es for reporting.
//!
//! # Error Format
//!
//! ```text
//! prog.asm:10: error: symbol 'X' is not defined
//! ```

use std::fmt;

use object_core::{Directive, LiteralError};
use thiserror::Error;

use crate::section::SectionViolation;

/// Coarse classification of assembler failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Input file missing.
    FileNotFound,
    /// Malformed line or unknown mnemonic.
    Format,
    /// Bad label syntax or label redefinition.
    Label,
    /// Reference to a symbol that is never defined.
    UndefinedSymbol,
    /// Literal or numeric argument that cannot be used.
    NumericFormat,
    /// Wrong number of operands.
    Arity,
    /// Section ordering or module nesting violation.
    SectionRule,
    /// Reading or writing a file failed.
    Io,
}

/// Classification of assembler errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleErrorKind {
    /// The source file does not exist.
    #[error("file {0} does not exist")]
    FileNotFound(String),
    /// Reading or writing failed.
    #[error("I/O error: {0}")]
    Io(String),
    /// A `SECTION` line without exactly two tokens.
    #[error("section lines must always have 2 tokens, found {0}")]
    SectionTokenCount(usize),
    /// A `SECTION` line naming something other than TEXT, DATA or BSS.
    #[error("unknown section name {0}")]
    UnknownSection(String),
    /// Neither an instruction nor a directive.
    #[error("instruction/directive '{0}' is not defined")]
    UnknownMnemonic(String),
    /// A directive that needs a label was written without one.
    #[error("{} requires a label", .0.name())]
    MissingLabel(Directive),
    /// A constant alias line that is not `NAME: EQU <literal>`.
    #[error("EQU lines must be of the form: NAME: EQU <literal>")]
    MalformedAlias,
    /// A label that does not match the identifier grammar.
    #[error("invalid label '{0}'")]
    InvalidLabel(String),
    /// More than one label on a line.
    #[error("only one label is allowed per line, found '{0}'")]
    MultipleLabels(String),
    /// A symbol defined twice in the same module.
    #[error("symbol redefinition: '{name}' (first defined at line {first_line})")]
    RedefinedLabel {
        /// Symbol name.
        name: String,
        /// Line of the first definition.
        first_line: usize,
    },
    /// `PUBLIC` on a symbol declared `EXTERN`.
    #[error("symbol '{0}' is declared EXTERN and cannot be made PUBLIC")]
    PublicExtern(String),
    /// The same symbol published twice.
    #[error("symbol '{0}' is already PUBLIC")]
    DuplicatePublic(String),
    /// An operand that is not a symbol name.
    #[error("invalid operand '{0}'")]
    InvalidOperand(String),
    /// An operand naming a symbol that is never defined.
    #[error("symbol '{0}' is not defined")]
    UndefinedSymbol(String),
    /// A `CONST` argument that is not a usable literal.
    #[error("invalid literal: {0}")]
    InvalidLiteral(LiteralError),
    /// A `SPACE` argument that is not a positive decimal count.
    #[error("invalid SPACE argument '{0}'")]
    InvalidSpace(String),
    /// A `+ N` operand suffix that is not a decimal natural number.
    #[error("invalid operand offset '{0}'")]
    InvalidOffset(String),
    /// An address that does not fit the 16-bit address space.
    #[error("address {0} does not fit in the 16-bit address space")]
    AddressOverflow(usize),
    /// Wrong number of operands for an instruction or directive.
    #[error("{mnemonic} expects {expected} operand(s), found {found}: '{operands}'")]
    Arity {
        /// Instruction or directive name.
        mnemonic: String,
        /// Operands required.
        expected: usize,
        /// Operands supplied.
        found: usize,
        /// Operand text as written.
        operands: String,
    },
    /// Section or module structure violation.
    #[error(transparent)]
    SectionRule(#[from] SectionViolation),
}

impl AssembleErrorKind {
    /// Returns the coarse class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::FileNotFound(_) => ErrorClass::FileNotFound,
            Self::Io(_) => ErrorClass::Io,
            Self::SectionTokenCount(_)
            | Self::UnknownSection(_)
            | Self::UnknownMnemonic(_)
            | Self::MissingLabel(_)
            | Self::MalformedAlias => ErrorClass::Format,
            Self::InvalidLabel(_)
            | Self::MultipleLabels(_)
            | Self::RedefinedLabel { .. }
            | Self::PublicExtern(_)
            | Self::DuplicatePublic(_)
            | Self::InvalidOperand(_) => ErrorClass::Label,
            Self::UndefinedSymbol(_) => ErrorClass::UndefinedSymbol,
            Self::InvalidLiteral(_)
            | Self::InvalidSpace(_)
            | Self::InvalidOffset(_)
            | Self::AddressOverflow(_) => ErrorClass::NumericFormat,
            Self::Arity { .. } => ErrorClass::Arity,
            Self::SectionRule(_) => ErrorClass::SectionRule,
        }
    }
}

/// An assembler error with its source context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleError {
    /// The kind of error.
    pub kind: AssembleErrorKind,
    /// Source file, once known.
    pub file: Option<String>,
    /// 1-indexed source line, if the error belongs to one.
    pub line: Option<usize>,
}

impl AssembleError {
    /// Creates an error without location.
    #[must_use]
    pub const fn new(kind: AssembleErrorKind) -> Self {
        Self {
            kind,
            file: None,
            line: None,
        }
    }

    /// Attaches a source line.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Attaches the source file unless one is already set.
    #[must_use]
    pub fn in_file(mut self, file: &str) -> Self {
        if self.file.is_none() {
            self.file = Some(file.to_string());
        }
        self
    }

    /// Returns the coarse class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// Formats the error for the console.
    #[must_use]
    pub fn format_for_stdout(&self) -> String {
        format!("{}: error: {}", self.location(), self.kind)
    }

    fn location(&self) -> String {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => format!("{file}:{line}"),
            (Some(file), None) => file.clone(),
            (None, Some(line)) => format!("line {line}"),
            (None, None) => "assembler".to_string(),
        }
    }
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location(), self.kind)
    }
}

impl std::error::Error for AssembleError {}

impl From<AssembleErrorKind> for AssembleError {
    fn from(kind: AssembleErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<SectionViolation> for AssembleError {
    fn from(violation: SectionViolation) -> Self {
        Self::new(AssembleErrorKind::SectionRule(violation))
    }
}
