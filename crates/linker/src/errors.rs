//! Linker error type.

use object_core::ObjectError;
use thiserror::Error;

/// Every way loading or linking can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// An object file does not exist.
    #[error("file {0} does not exist")]
    FileNotFound(String),
    /// Reading or writing a file failed.
    #[error("{path}: I/O error: {message}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying error text.
        message: String,
    },
    /// An object module is malformed.
    #[error("module {module}: {source}")]
    Format {
        /// Module name.
        module: String,
        /// What is wrong with it.
        source: ObjectError,
    },
    /// Two modules publish the same symbol.
    #[error("symbol '{symbol}' is defined in both module {first} and module {second}")]
    DuplicateSymbol {
        /// Symbol name.
        symbol: String,
        /// Module with the first definition.
        first: String,
        /// Module with the second definition.
        second: String,
    },
    /// A module uses a symbol that no module publishes.
    #[error("module {module}: symbol '{symbol}' is not defined in any module")]
    UndefinedSymbol {
        /// Module containing the use.
        module: String,
        /// Symbol name.
        symbol: String,
    },
    /// The combined modules exceed the 16-bit address space.
    #[error("linked image of {0} words does not fit in the 16-bit address space")]
    ImageTooLarge(usize),
}

impl LinkError {
    /// Formats the error for the console.
    #[must_use]
    pub fn format_for_stdout(&self) -> String {
        format!("linker: error: {self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        LinkError::UndefinedSymbol { module: "a".into(), symbol: "Y".into() },
        "linker: error: module a: symbol 'Y' is not defined in any module"
    )]
    #[case(
        LinkError::DuplicateSymbol { symbol: "Y".into(), first: "a".into(), second: "b".into() },
        "linker: error: symbol 'Y' is defined in both module a and module b"
    )]
    #[case(
        LinkError::Format { module: "a".into(), source: ObjectError::MissingMarker("CODE") },
        "linker: error: module a: missing section marker 'CODE'"
    )]
    fn messages(#[case] error: LinkError, #[case] expected: &str) {
        assert_eq!(error.format_for_stdout(), expected);
    }

    #[test]
    fn format_error_exposes_source() {
        let error = LinkError::Format {
            module: "a".into(),
            source: ObjectError::MissingMarker("CODE"),
        };
        assert!(std::error::Error::source(&error).is_some());
    }
}
