//! Second pass: code emission and table construction.
//!
//! Replays the parsed statements against the first-pass symbol table and fills
//! in a [`Module`]: one opcode word per instruction, one word per operand, the
//! relocation list for local addresses, use entries for externs and the
//! definition table for publics.

use object_core::{
    is_identifier, parse_literal, parse_natural, split_offset, Definition, Directive, Module,
    Opcode, UseEntry, Word,
};

use crate::errors::{AssembleError, AssembleErrorKind};
use crate::parser::{Body, Statement};
use crate::section::SectionCursor;
use crate::symbols::{space_count, Assignment, Scope, SymbolTable};

/// Runs the second pass and returns the assembled module.
///
/// # Errors
///
/// Returns the first arity, operand, literal or symbol error, located at its
/// line.
pub fn second_pass(name: &str, assignment: &Assignment) -> Result<Module, AssembleError> {
    let mut cursor = SectionCursor::new();
    let mut module = Module::new(name);

    for statement in &assignment.statements {
        cursor
            .apply(statement)
            .map_err(AssembleErrorKind::from)
            .and_then(|()| encode_statement(statement, &assignment.symbols, &mut module))
            .map_err(|kind| AssembleError::new(kind).at_line(statement.line))?;
    }
    cursor.finish()?;

    debug_assert_eq!(module.size(), assignment.size);
    Ok(module)
}

fn encode_statement(
    statement: &Statement,
    symbols: &SymbolTable,
    module: &mut Module,
) -> Result<(), AssembleErrorKind> {
    match &statement.body {
        Body::Empty | Body::Section(_) => Ok(()),
        Body::Instruction { opcode, operands } => {
            encode_instruction(*opcode, operands, symbols, module)
        }
        Body::Directive { directive, args } => {
            encode_directive(*directive, args, symbols, module)
        }
    }
}

fn encode_instruction(
    opcode: Opcode,
    operands: &[String],
    symbols: &SymbolTable,
    module: &mut Module,
) -> Result<(), AssembleErrorKind> {
    check_arity(opcode.mnemonic(), opcode.arity(), operands)?;
    module.code.push(opcode.word());
    for operand in operands {
        handle_argument(operand, symbols, module)?;
    }
    Ok(())
}

fn encode_directive(
    directive: Directive,
    args: &[String],
    symbols: &SymbolTable,
    module: &mut Module,
) -> Result<(), AssembleErrorKind> {
    match directive {
        Directive::Const => {
            check_arity(directive.name(), 1, args)?;
            let word = parse_literal(&args[0]).map_err(AssembleErrorKind::InvalidLiteral)?;
            module.code.push(word);
        }
        Directive::Space => {
            let count = space_count(args)?;
            module.code.resize(module.code.len() + count, 0);
        }
        Directive::Public => {
            check_arity(directive.name(), 1, args)?;
            publish(&args[0], symbols, module)?;
        }
        Directive::Extern | Directive::Begin | Directive::End | Directive::Section => {
            check_arity(directive.name(), 0, args)?;
        }
    }
    Ok(())
}

fn check_arity(mnemonic: &str, expected: usize, operands: &[String]) -> Result<(), AssembleErrorKind> {
    if operands.len() == expected {
        return Ok(());
    }
    Err(AssembleErrorKind::Arity {
        mnemonic: mnemonic.to_string(),
        expected,
        found: operands.len(),
        operands: operands.join(", "),
    })
}

fn publish(name: &str, symbols: &SymbolTable, module: &mut Module) -> Result<(), AssembleErrorKind> {
    let symbol = symbols
        .get(name)
        .ok_or_else(|| AssembleErrorKind::UndefinedSymbol(name.to_string()))?;
    if symbol.scope == Scope::Extern {
        return Err(AssembleErrorKind::PublicExtern(name.to_string()));
    }
    if module.definitions.iter().any(|d| d.symbol == name) {
        return Err(AssembleErrorKind::DuplicatePublic(name.to_string()));
    }
    module.definitions.push(Definition {
        symbol: name.to_string(),
        address: symbol.address,
    });
    Ok(())
}

/// Emits one operand word.
///
/// An operand is a symbol name with an optional `+N` decimal offset. Extern
/// symbols emit `N` and a use entry; local symbols emit `address + N` and a
/// relocation entry.
///
/// # Errors
///
/// Returns `InvalidOperand`, `InvalidOffset`, `UndefinedSymbol`, or
/// `AddressOverflow` when the resulting word does not fit.
pub fn handle_argument(
    operand: &str,
    symbols: &SymbolTable,
    module: &mut Module,
) -> Result<(), AssembleErrorKind> {
    let (name, offset) = split_offset(operand);
    if !is_identifier(name) {
        return Err(AssembleErrorKind::InvalidOperand(operand.to_string()));
    }
    let offset = match offset {
        Some(text) => {
            parse_natural(text).ok_or_else(|| AssembleErrorKind::InvalidOffset(text.to_string()))?
        }
        None => 0,
    };
    let symbol = symbols
        .get(name)
        .ok_or_else(|| AssembleErrorKind::UndefinedSymbol(name.to_string()))?;

    let index = module.code.len();
    let (value, extern_use) = match symbol.scope {
        Scope::Extern => (offset, true),
        Scope::Local | Scope::Public => (symbol.address.saturating_add(offset), false),
    };
    let word = Word::try_from(value).map_err(|_| AssembleErrorKind::AddressOverflow(value))?;

    module.code.push(word);
    if extern_use {
        module.uses.push(UseEntry {
            symbol: name.to_string(),
            index,
        });
    } else {
        module.relative.push(index);
    }
    Ok(())
}
