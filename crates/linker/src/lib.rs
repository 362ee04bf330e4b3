//! Linker for accumulator machine object modules.
//!
//! Loads `<module>.obj` files in command-line order, assigns each a base
//! offset, resolves extern uses against the published definitions and writes
//! one flat executable image.

/// Linker error type.
pub mod errors;
/// Relocation, resolution and image output.
pub mod linker;

pub use errors::LinkError;
pub use linker::{write_image, GlobalSymbol, GlobalTable, LinkedImage, Linker};

#[cfg(test)]
use assembler as _;
#[cfg(test)]
use proptest as _;
