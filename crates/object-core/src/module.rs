use std::collections::HashSet;

use crate::isa::Word;
use crate::object::ObjectError;

/// A code index whose word must receive an external symbol's address.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct UseEntry {
    /// External symbol name.
    pub symbol: String,
    /// Index into the module's code.
    pub index: usize,
}

/// A symbol the module exposes to other modules.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Definition {
    /// Public symbol name.
    pub symbol: String,
    /// Module-local address.
    pub address: usize,
}

/// One assembled translation unit.
///
/// Produced by the assembler, serialized as an object file, and repositioned
/// by the linker, which is the only stage that sets [`Module::base`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Module {
    /// Module name (source file stem).
    pub name: String,
    /// Machine code, one entry per word.
    pub code: Vec<Word>,
    /// Code indices holding module-local addresses.
    pub relative: Vec<usize>,
    /// Code indices referring to external symbols.
    pub uses: Vec<UseEntry>,
    /// Exported symbols.
    pub definitions: Vec<Definition>,
    /// Base offset assigned at link time.
    pub base: Option<usize>,
}

impl Module {
    /// Creates an empty module.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Number of words in the module.
    #[must_use]
    pub fn size(&self) -> usize {
        self.code.len()
    }

    /// Checks the cross-table invariants that the text format alone cannot
    /// express.
    ///
    /// # Errors
    ///
    /// Returns `ObjectError::IndexOutOfRange` when a relocation or use index
    /// falls outside the code, and `ObjectError::DuplicateDefinition` when a
    /// symbol is published twice.
    pub fn validate(&self) -> Result<(), ObjectError> {
        let size = self.size();
        let indices = self
            .relative
            .iter()
            .map(|&index| ("RELATIVE", index))
            .chain(self.uses.iter().map(|entry| ("TABLE USE", entry.index)));
        for (table, index) in indices {
            if index >= size {
                return Err(ObjectError::IndexOutOfRange { table, index, size });
            }
        }

        let mut seen = HashSet::new();
        for definition in &self.definitions {
            if !seen.insert(definition.symbol.as_str()) {
                return Err(ObjectError::DuplicateDefinition(definition.symbol.clone()));
            }
        }
        Ok(())
    }
}
