//! Two-pass assembler for the accumulator machine.
//!
//! Reads `<module>.asm`, preprocesses it into token lines, assigns addresses
//! in the first pass and emits a relocatable object module in the second.

/// Top-level assembler pipeline and listings.
pub mod assembler;
/// Second pass: code emission and object tables.
pub mod encoder;
/// Structured assembly error types.
pub mod errors;
/// Line parser for labels, instructions and directives.
pub mod parser;
/// Comment stripping, tokenizing and `EQU` substitution.
pub mod preprocess;
/// Section ordering and module nesting rules.
pub mod section;
/// Source loading and the tokenized line type.
pub mod source;
/// Symbol table and first-pass address assignment.
pub mod symbols;

#[cfg(test)]
use proptest as _;

pub use assembler::{assemble_file, write_object, Assembled, Assembler};
pub use errors::{AssembleError, AssembleErrorKind, ErrorClass};
