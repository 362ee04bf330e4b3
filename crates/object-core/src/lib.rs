//! Shared model for the accumulator machine toolchain: machine words, the
//! opcode table, the lexical grammar, module records and their text formats.

/// Machine word type, opcode table and directive table.
pub mod isa;
pub use isa::{Directive, Opcode, Word, ADDRESS_SPACE_WORDS, OPCODE_TABLE};

/// Hand-written scanner for identifiers and numeric literals.
pub mod lexical;
pub use lexical::{
    is_identifier, is_integer, is_natural, parse_hex, parse_integer, parse_literal, parse_natural,
    split_offset, LiteralError,
};

/// Assembled module record and its use/definition entries.
pub mod module;
pub use module::{Definition, Module, UseEntry};

/// Object-module text format.
pub mod object;
pub use object::{parse_object, to_object_text, ObjectError, MARKERS};

/// Executable image text format.
pub mod image;
pub use image::{parse_image, to_image_text};

/// File naming for object modules and images.
pub mod paths;
pub use paths::{
    image_path, module_name, object_path, with_appended_extension, IMAGE_EXTENSION, OBJECT_EXTENSION,
};

#[cfg(test)]
use proptest as _;
