//! Source loading and the tokenized line type consumed by both passes.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::errors::{AssembleError, AssembleErrorKind};

/// A preprocessed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-indexed line number in the original file.
    pub line: usize,
    /// Upper-cased tokens in source order.
    pub tokens: Vec<String>,
}

impl SourceLine {
    /// Creates a line from borrowed tokens.
    #[must_use]
    pub fn new(line: usize, tokens: &[&str]) -> Self {
        Self {
            line,
            tokens: tokens.iter().map(ToString::to_string).collect(),
        }
    }

    /// Tokens joined by single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Reads a whole source file.
///
/// # Errors
///
/// Returns `FileNotFound` if the path does not exist and `Io` for any other
/// read failure. The error carries the path as its file.
pub fn load_source(path: &Path) -> Result<String, AssembleError> {
    let display = path.display().to_string();
    fs::read_to_string(path).map_err(|e| {
        let kind = if e.kind() == ErrorKind::NotFound {
            AssembleErrorKind::FileNotFound(display.clone())
        } else {
            AssembleErrorKind::Io(e.to_string())
        };
        AssembleError::new(kind).in_file(&display)
    })
}
