//! Textual object-module format.
//!
//! An object file holds four tables, always in this order:
//!
//! ```text
//! TABLE USE
//! <label> <index>          (0 or more lines)
//! TABLE DEFINITION
//! <label> <address>        (0 or more lines)
//! RELATIVE
//! <index> <index> ...      (one line, may be empty)
//! CODE
//! <word> <word> ...        (one line)
//! ```
//!
//! Blank lines are ignored when reading, and the RELATIVE and CODE sections may
//! be spread over several lines.

use std::fmt::Write as _;

use thiserror::Error;

use crate::isa::Word;
use crate::lexical::{is_identifier, parse_natural};
use crate::module::{Definition, Module, UseEntry};

/// Marker opening the use table.
pub const USE_MARKER: &str = "TABLE USE";
/// Marker opening the definition table.
pub const DEFINITION_MARKER: &str = "TABLE DEFINITION";
/// Marker opening the relocation list.
pub const RELATIVE_MARKER: &str = "RELATIVE";
/// Marker opening the code words.
pub const CODE_MARKER: &str = "CODE";

/// Section markers in the order they must appear.
pub const MARKERS: [&str; 4] = [USE_MARKER, DEFINITION_MARKER, RELATIVE_MARKER, CODE_MARKER];

/// Errors while reading or validating an object module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// A non-blank line precedes `TABLE USE`.
    #[error("line {line}: wrong format, every entry must be under a section marker")]
    EntryBeforeMarker {
        /// 1-indexed line in the object file.
        line: usize,
    },
    /// A marker appears out of order or twice.
    #[error("line {line}: expected section marker '{expected}', found '{found}'")]
    MisorderedMarker {
        /// 1-indexed line in the object file.
        line: usize,
        /// The marker that should come next.
        expected: &'static str,
        /// The marker actually found.
        found: String,
    },
    /// The file ended before every marker was seen.
    #[error("missing section marker '{0}'")]
    MissingMarker(&'static str),
    /// A USE or DEFINITION line does not have exactly two tokens.
    #[error("line {line}: {table} lines must be of the form: LABEL ADDRESS")]
    WrongTokenCount {
        /// 1-indexed line in the object file.
        line: usize,
        /// Section being read.
        table: &'static str,
    },
    /// A label column does not match the identifier grammar.
    #[error("line {line}: '{token}' is not a valid symbol name")]
    InvalidSymbol {
        /// 1-indexed line in the object file.
        line: usize,
        /// Offending token.
        token: String,
    },
    /// A numeric column is not a natural number.
    #[error("line {line}: {table} value '{token}' must be a natural number")]
    NotNatural {
        /// 1-indexed line in the object file.
        line: usize,
        /// Section being read.
        table: &'static str,
        /// Offending token.
        token: String,
    },
    /// A code word exceeds 16 bits.
    #[error("line {line}: code word {token} does not fit in 16 bits")]
    WordOutOfRange {
        /// 1-indexed line in the object file.
        line: usize,
        /// Offending token.
        token: String,
    },
    /// A relocation or use index points past the end of the code.
    #[error("{table} index {index} is outside the module (size {size})")]
    IndexOutOfRange {
        /// Table holding the index.
        table: &'static str,
        /// Offending index.
        index: usize,
        /// Module size in words.
        size: usize,
    },
    /// The same symbol is defined twice in one module.
    #[error("symbol '{0}' is defined more than once in TABLE DEFINITION")]
    DuplicateDefinition(String),
}

/// Reads an object module from its text form.
///
/// # Errors
///
/// Returns an `ObjectError` for any line that breaks the format, and for
/// cross-table violations detected by [`Module::validate`].
pub fn parse_object(name: &str, text: &str) -> Result<Module, ObjectError> {
    let mut module = Module::new(name);
    let mut section: Option<usize> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(position) = MARKERS.iter().position(|marker| *marker == trimmed) {
            let next = section.map_or(0, |s| s + 1);
            if position != next {
                return Err(ObjectError::MisorderedMarker {
                    line,
                    expected: MARKERS.get(next).copied().unwrap_or("end of file"),
                    found: trimmed.to_string(),
                });
            }
            section = Some(position);
            continue;
        }

        let Some(current) = section else {
            return Err(ObjectError::EntryBeforeMarker { line });
        };
        let table = MARKERS[current];
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();

        match current {
            0 | 1 => {
                let [label, value] = tokens.as_slice() else {
                    return Err(ObjectError::WrongTokenCount { line, table });
                };
                if !is_identifier(label) {
                    return Err(ObjectError::InvalidSymbol {
                        line,
                        token: label.to_string(),
                    });
                }
                let value = natural(value, line, table)?;
                if current == 0 {
                    module.uses.push(UseEntry {
                        symbol: label.to_string(),
                        index: value,
                    });
                } else {
                    module.definitions.push(Definition {
                        symbol: label.to_string(),
                        address: value,
                    });
                }
            }
            2 => {
                for token in tokens {
                    module.relative.push(natural(token, line, table)?);
                }
            }
            _ => {
                for token in tokens {
                    let value = natural(token, line, table)?;
                    let word = Word::try_from(value).map_err(|_| ObjectError::WordOutOfRange {
                        line,
                        token: token.to_string(),
                    })?;
                    module.code.push(word);
                }
            }
        }
    }

    let seen = section.map_or(0, |s| s + 1);
    if let Some(missing) = MARKERS.get(seen) {
        return Err(ObjectError::MissingMarker(*missing));
    }

    module.validate()?;
    Ok(module)
}

fn natural(token: &str, line: usize, table: &'static str) -> Result<usize, ObjectError> {
    parse_natural(token).ok_or_else(|| ObjectError::NotNatural {
        line,
        table,
        token: token.to_string(),
    })
}

/// Writes a module in object text form.
#[must_use]
pub fn to_object_text(module: &Module) -> String {
    let mut out = String::new();

    out.push_str(USE_MARKER);
    out.push('\n');
    for entry in &module.uses {
        let _ = writeln!(out, "{} {}", entry.symbol, entry.index);
    }

    out.push_str(DEFINITION_MARKER);
    out.push('\n');
    for definition in &module.definitions {
        let _ = writeln!(out, "{} {}", definition.symbol, definition.address);
    }

    out.push_str(RELATIVE_MARKER);
    out.push('\n');
    out.push_str(&join_words(module.relative.iter()));
    out.push('\n');

    out.push_str(CODE_MARKER);
    out.push('\n');
    out.push_str(&join_words(module.code.iter()));
    out.push('\n');

    out
}

/// Joins values with single spaces.
#[must_use]
pub fn join_words<T: ToString>(values: impl Iterator<Item = T>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}
