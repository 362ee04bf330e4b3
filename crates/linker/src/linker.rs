//! Relocation, symbol resolution and concatenation.
//!
//! Modules are placed back to back in input order. Each module's base is the
//! total size of the modules before it. Linking then runs in three steps:
//!
//! 1. build the global table from every module's definitions, shifted by base;
//! 2. add the base to every word listed in a module's relocation table;
//! 3. add the global address of the named symbol to every use entry.
//!
//! All arithmetic on words wraps at 16 bits.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use object_core::{
    module_name, object_path, parse_object, to_image_text, Module, Word, ADDRESS_SPACE_WORDS,
};

use crate::errors::LinkError;

/// A published symbol after relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSymbol {
    /// Address in the linked image.
    pub address: usize,
    /// Module that defines it.
    pub module: String,
}

/// Global definition table, ordered for stable listings.
pub type GlobalTable = BTreeMap<String, GlobalSymbol>;

/// The result of a successful link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedImage {
    /// Patched code of every module, in input order.
    pub words: Vec<Word>,
    /// Every published symbol with its final address.
    pub globals: GlobalTable,
}

/// Links an ordered set of object modules.
///
/// The first error is kept: once linking fails, [`Linker::link`] returns the
/// same error without redoing any work.
#[derive(Debug, Clone)]
pub struct Linker {
    modules: Vec<Module>,
    result: Option<Result<LinkedImage, LinkError>>,
}

impl Linker {
    /// Creates a linker over modules already in memory.
    #[must_use]
    pub const fn new(modules: Vec<Module>) -> Self {
        Self {
            modules,
            result: None,
        }
    }

    /// Loads `<stem>.obj` for every stem, in order.
    ///
    /// Every file is checked for existence before any is parsed.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` for the first missing file, `Io` if a file
    /// cannot be read and `Format` for the first malformed module.
    pub fn load<P: AsRef<Path>>(stems: &[P]) -> Result<Self, LinkError> {
        let paths: Vec<PathBuf> = stems.iter().map(|s| object_path(s.as_ref())).collect();
        if let Some(missing) = paths.iter().find(|path| !path.exists()) {
            return Err(LinkError::FileNotFound(missing.display().to_string()));
        }

        let mut modules = Vec::with_capacity(paths.len());
        for (stem, path) in stems.iter().zip(&paths) {
            let text = fs::read_to_string(path).map_err(|e| io_error(path, &e))?;
            let name = module_name(stem.as_ref());
            let module = parse_object(&name, &text)
                .map_err(|source| LinkError::Format { module: name, source })?;
            modules.push(module);
        }
        Ok(Self::new(modules))
    }

    /// The modules, with bases assigned once [`Linker::link`] has run.
    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// The stored error, if linking has failed.
    #[must_use]
    pub fn error(&self) -> Option<&LinkError> {
        self.result.as_ref().and_then(|result| result.as_ref().err())
    }

    /// Links the modules once and returns the image.
    ///
    /// # Errors
    ///
    /// Returns `Format` for a module whose tables point outside its code,
    /// `ImageTooLarge`, `DuplicateSymbol` or `UndefinedSymbol`, now and on
    /// every later call.
    pub fn link(&mut self) -> Result<&LinkedImage, LinkError> {
        let result = match self.result.take() {
            Some(result) => result,
            None => link_modules(&mut self.modules),
        };
        self.result.insert(result).as_ref().map_err(Clone::clone)
    }
}

fn io_error(path: &Path, error: &std::io::Error) -> LinkError {
    if error.kind() == ErrorKind::NotFound {
        LinkError::FileNotFound(path.display().to_string())
    } else {
        LinkError::Io {
            path: path.display().to_string(),
            message: error.to_string(),
        }
    }
}

fn link_modules(modules: &mut [Module]) -> Result<LinkedImage, LinkError> {
    let mut base = 0;
    for module in modules.iter_mut() {
        module.validate().map_err(|source| LinkError::Format {
            module: module.name.clone(),
            source,
        })?;
        module.base = Some(base);
        base += module.size();
    }
    if base > ADDRESS_SPACE_WORDS {
        return Err(LinkError::ImageTooLarge(base));
    }

    let globals = global_table(modules)?;

    let mut words = Vec::with_capacity(base);
    for module in modules.iter() {
        words.extend(relocate(module, &globals)?);
    }
    Ok(LinkedImage { words, globals })
}

fn global_table(modules: &[Module]) -> Result<GlobalTable, LinkError> {
    let mut globals = GlobalTable::new();
    for module in modules {
        let base = module.base.unwrap_or(0);
        for definition in &module.definitions {
            if let Some(first) = globals.get(&definition.symbol) {
                return Err(LinkError::DuplicateSymbol {
                    symbol: definition.symbol.clone(),
                    first: first.module.clone(),
                    second: module.name.clone(),
                });
            }
            globals.insert(
                definition.symbol.clone(),
                GlobalSymbol {
                    address: definition.address + base,
                    module: module.name.clone(),
                },
            );
        }
    }
    Ok(globals)
}

/// Returns the module's code with relocations and uses applied.
fn relocate(module: &Module, globals: &GlobalTable) -> Result<Vec<Word>, LinkError> {
    let base = module.base.unwrap_or(0);
    let mut code = module.code.clone();
    for &index in &module.relative {
        code[index] = add_wrapping(code[index], base);
    }
    for entry in &module.uses {
        let symbol = globals
            .get(&entry.symbol)
            .ok_or_else(|| LinkError::UndefinedSymbol {
                module: module.name.clone(),
                symbol: entry.symbol.clone(),
            })?;
        code[entry.index] = add_wrapping(code[entry.index], symbol.address);
    }
    Ok(code)
}

#[allow(clippy::cast_possible_truncation)]
const fn add_wrapping(word: Word, delta: usize) -> Word {
    ((word as usize + delta) % ADDRESS_SPACE_WORDS) as Word
}

/// Writes a linked image.
///
/// # Errors
///
/// Returns `Io` if the file cannot be written.
pub fn write_image(path: &Path, image: &LinkedImage) -> Result<(), LinkError> {
    fs::write(path, to_image_text(&image.words)).map_err(|e| LinkError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Renders each module's base, size and tables.
#[must_use]
pub fn render_modules(modules: &[Module]) -> String {
    let mut out = String::new();
    for module in modules {
        let base = module
            .base
            .map_or_else(|| "-".to_string(), |base| base.to_string());
        let _ = writeln!(
            out,
            "module {}: base {base}, {} words",
            module.name,
            module.size()
        );
        for entry in &module.uses {
            let _ = writeln!(out, "  use  {:<12} @ {}", entry.symbol, entry.index);
        }
        for definition in &module.definitions {
            let _ = writeln!(out, "  def  {:<12} = {}", definition.symbol, definition.address);
        }
        if !module.relative.is_empty() {
            let relative: Vec<String> = module.relative.iter().map(ToString::to_string).collect();
            let _ = writeln!(out, "  relative {}", relative.join(" "));
        }
    }
    out
}

/// Renders the global definition table.
#[must_use]
pub fn render_globals(globals: &GlobalTable) -> String {
    let mut out = String::new();
    for (name, symbol) in globals {
        let _ = writeln!(out, "{name:<12} {:>5}  ({})", symbol.address, symbol.module);
    }
    out
}
