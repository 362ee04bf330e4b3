//! Symbol table and the first pass: address assignment.
//!
//! The first pass parses every line, drives the section cursor, records each
//! label at the current word count and advances the count by the statement's
//! size. No code is emitted here.

use std::collections::BTreeMap;

use object_core::{parse_natural, Directive, ADDRESS_SPACE_WORDS};

use crate::errors::{AssembleError, AssembleErrorKind};
use crate::parser::{parse_statement, Body, Statement};
use crate::section::SectionCursor;
use crate::source::SourceLine;

/// How a symbol is visible to the linker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Defined here, not exported.
    Local,
    /// Declared `EXTERN`, resolved at link time.
    Extern,
    /// Defined here and exported with `PUBLIC`.
    Public,
}

/// A label with its assigned address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Word offset within the module; 0 for externs.
    pub address: usize,
    /// Visibility.
    pub scope: Scope,
    /// Source line of the definition.
    pub defined_at: usize,
}

/// Symbol table keyed by name, ordered for stable listings.
pub type SymbolTable = BTreeMap<String, Symbol>;

/// Result of the first pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Parsed statements in source order.
    pub statements: Vec<Statement>,
    /// Every label defined in the module.
    pub symbols: SymbolTable,
    /// Final word count.
    pub size: usize,
}

/// Number of words reserved by a `SPACE` directive.
///
/// # Errors
///
/// Returns `InvalidSpace` unless the single argument is a natural number of at
/// least 1, and `Arity` for more than one argument.
pub fn space_count(args: &[String]) -> Result<usize, AssembleErrorKind> {
    match args {
        [] => Ok(1),
        [count] => parse_natural(count)
            .filter(|&n| n >= 1)
            .ok_or_else(|| AssembleErrorKind::InvalidSpace(count.clone())),
        _ => Err(AssembleErrorKind::Arity {
            mnemonic: Directive::Space.name().to_string(),
            expected: 1,
            found: args.len(),
            operands: args.join(", "),
        }),
    }
}

/// Words a statement occupies.
///
/// # Errors
///
/// Propagates `SPACE` argument errors.
pub fn statement_size(statement: &Statement) -> Result<usize, AssembleErrorKind> {
    match (statement.fixed_size(), &statement.body) {
        (Some(size), _) => Ok(size),
        (None, Body::Directive { args, .. }) => space_count(args),
        (None, _) => Ok(0),
    }
}

/// Runs the first pass over preprocessed lines.
///
/// # Errors
///
/// Returns the first parse, section, label or size error, located at its line.
pub fn first_pass(lines: &[SourceLine]) -> Result<Assignment, AssembleError> {
    let mut cursor = SectionCursor::new();
    let mut symbols = SymbolTable::new();
    let mut statements = Vec::with_capacity(lines.len());
    let mut mem_count = 0usize;

    for line in lines {
        let statement = parse_statement(line)?;
        let at = |kind: AssembleErrorKind| AssembleError::new(kind).at_line(statement.line);

        cursor.apply(&statement).map_err(|v| at(v.into()))?;
        let size = statement_size(&statement).map_err(at)?;
        let is_extern = matches!(
            statement.body,
            Body::Directive {
                directive: Directive::Extern,
                ..
            }
        );

        match &statement.label {
            Some(name) => {
                if let Some(first) = symbols.get(name) {
                    return Err(at(AssembleErrorKind::RedefinedLabel {
                        name: name.clone(),
                        first_line: first.defined_at,
                    }));
                }
                let (address, scope) = if is_extern {
                    (0, Scope::Extern)
                } else {
                    (mem_count, Scope::Local)
                };
                symbols.insert(
                    name.clone(),
                    Symbol {
                        address,
                        scope,
                        defined_at: statement.line,
                    },
                );
            }
            None if is_extern => return Err(at(AssembleErrorKind::MissingLabel(Directive::Extern))),
            None => {}
        }

        mem_count = mem_count.saturating_add(size);
        if mem_count > ADDRESS_SPACE_WORDS {
            return Err(at(AssembleErrorKind::AddressOverflow(mem_count)));
        }
        statements.push(statement);
    }

    cursor.finish()?;
    mark_public(&statements, &mut symbols);

    Ok(Assignment {
        statements,
        symbols,
        size: mem_count,
    })
}

/// Promotes local symbols named by `PUBLIC`. Other cases are reported by the
/// second pass.
fn mark_public(statements: &[Statement], symbols: &mut SymbolTable) {
    for statement in statements {
        if let Body::Directive {
            directive: Directive::Public,
            args,
        } = &statement.body
        {
            for name in args {
                if let Some(symbol) = symbols.get_mut(name) {
                    if symbol.scope == Scope::Local {
                        symbol.scope = Scope::Public;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorClass;
    use crate::preprocess::preprocess;
    use crate::section::SectionViolation;
    use rstest::rstest;

    fn pass(source: &str) -> Result<Assignment, AssembleError> {
        first_pass(&preprocess(source).expect("source should preprocess"))
    }

    #[test]
    fn assigns_addresses_in_word_order() {
        let assignment = pass(
            "SECTION TEXT\nL: LOAD X\nCOPY X, Y\nSTOP\nSECTION DATA\nX: CONST 5\nSECTION BSS\nY: SPACE 3\nZ: SPACE\n",
        )
        .unwrap();
        let address = |name: &str| assignment.symbols[name].address;
        assert_eq!(address("L"), 0);
        assert_eq!(address("X"), 6);
        assert_eq!(address("Y"), 7);
        assert_eq!(address("Z"), 10);
        assert_eq!(assignment.size, 11);
    }

    #[test]
    fn extern_symbols_are_placeholders() {
        let assignment =
            pass("M: BEGIN\nY: EXTERN\nSECTION TEXT\nLOAD Y\nSTOP\nEND\n").unwrap();
        let y = assignment.symbols["Y"];
        assert_eq!(y.scope, Scope::Extern);
        assert_eq!(y.address, 0);
        assert_eq!(y.defined_at, 2);
        assert_eq!(assignment.size, 3);
    }

    #[test]
    fn public_promotes_local_symbols_only() {
        let assignment = pass(
            "M: BEGIN\nE: EXTERN\nPUBLIC L\nPUBLIC E\nSECTION TEXT\nL: STOP\nEND\n",
        )
        .unwrap();
        assert_eq!(assignment.symbols["L"].scope, Scope::Public);
        assert_eq!(assignment.symbols["E"].scope, Scope::Extern);
    }

    #[rstest]
    #[case("SECTION TEXT\nA: STOP\nA: STOP\n", 2)]
    #[case("SECTION TEXT\nSTOP\nSECTION DATA\nA: CONST 1\nA: CONST 2\n", 4)]
    #[case("SECTION TEXT\nA: STOP\nSECTION BSS\nA: SPACE\n", 2)]
    #[case("M: BEGIN\nA: EXTERN\nSECTION TEXT\nA: STOP\nEND\n", 2)]
    fn redefinition_names_first_line(#[case] source: &str, #[case] first_line: usize) {
        let error = pass(source).expect_err("redefinition should fail");
        assert!(matches!(
            error.kind,
            AssembleErrorKind::RedefinedLabel { ref name, first_line: f } if name == "A" && f == first_line
        ));
        assert_eq!(error.class(), ErrorClass::Label);
    }

    #[rstest]
    #[case("0")]
    #[case("-1")]
    #[case("X")]
    #[case("0X10")]
    fn space_argument_must_be_positive(#[case] count: &str) {
        let source = format!("SECTION TEXT\nSTOP\nSECTION BSS\nX: SPACE {count}\n");
        let error = pass(&source).expect_err("bad SPACE should fail");
        assert_eq!(error.kind, AssembleErrorKind::InvalidSpace(count.into()));
        assert_eq!(error.line, Some(4));
    }

    #[test]
    fn extern_requires_label() {
        let error = pass("M: BEGIN\nEXTERN\nSECTION TEXT\nSTOP\nEND\n").expect_err("no label");
        assert_eq!(error.kind, AssembleErrorKind::MissingLabel(Directive::Extern));
        assert_eq!(error.line, Some(2));
    }

    #[test]
    fn section_rules_are_enforced() {
        let error = pass("STOP\n").expect_err("instruction before TEXT");
        assert_eq!(error.class(), ErrorClass::SectionRule);
        assert_eq!(error.line, Some(1));

        let error = pass("SECTION DATA\nX: CONST 1\n").expect_err("DATA first");
        assert!(matches!(
            error.kind,
            AssembleErrorKind::SectionRule(SectionViolation::TextNotFirst(_))
        ));

        let error = pass("M: BEGIN\nSECTION TEXT\nSTOP\n").expect_err("unterminated module");
        assert_eq!(
            error.kind,
            AssembleErrorKind::SectionRule(SectionViolation::MissingEnd)
        );
        assert_eq!(error.line, None);
    }

    #[test]
    fn address_space_overflow() {
        let error = pass("SECTION TEXT\nSTOP\nSECTION BSS\nX: SPACE 65535\nY: SPACE 1\n")
            .expect_err("too many words");
        assert_eq!(error.kind, AssembleErrorKind::AddressOverflow(65_537));
    }

    #[test]
    fn huge_space_is_an_overflow_not_a_panic() {
        let error = pass("SECTION TEXT\nSTOP\nSECTION BSS\nX: SPACE 18446744073709551615\n")
            .expect_err("reservation wraps usize");
        assert_eq!(error.kind, AssembleErrorKind::AddressOverflow(usize::MAX));
        assert_eq!(error.line, Some(4));
    }

    #[rstest]
    #[case(&[], 1)]
    #[case(&["4"], 4)]
    fn space_counts(#[case] args: &[&str], #[case] expected: usize) {
        let owned: Vec<String> = args.iter().map(ToString::to_string).collect();
        assert_eq!(space_count(&owned), Ok(expected));
    }

    #[test]
    fn space_with_two_arguments_is_arity_error() {
        let args = vec!["1".to_string(), "2".to_string()];
        assert!(matches!(
            space_count(&args),
            Err(AssembleErrorKind::Arity { expected: 1, found: 2, .. })
        ));
    }
}
