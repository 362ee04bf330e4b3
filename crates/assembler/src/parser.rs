//! Line parser: classifies a token line into a [`Statement`].
//!
//! The parser only decides shape: optional label, then a section switch, an
//! instruction, a directive or nothing. Placement rules belong to
//! [`crate::section`]; operand meaning belongs to the passes.

use object_core::{is_identifier, Directive, Opcode};

use crate::errors::{AssembleError, AssembleErrorKind};
use crate::section::Section;
use crate::source::SourceLine;

const SECTION_KEYWORD: &str = "SECTION";
const SECTION_LINE_TOKENS: usize = 2;

/// What a statement does, apart from its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Label-only line.
    Empty,
    /// `SECTION <name>`.
    Section(Section),
    /// A machine instruction with its operand strings.
    Instruction {
        /// Resolved opcode.
        opcode: Opcode,
        /// Operands, comma separated in source, `+ N` suffixes compacted.
        operands: Vec<String>,
    },
    /// An assembler directive with its argument strings.
    Directive {
        /// Directive kind.
        directive: Directive,
        /// Arguments in source order.
        args: Vec<String>,
    },
}

/// A parsed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-indexed source line.
    pub line: usize,
    /// Label defined by this line, without the colon.
    pub label: Option<String>,
    /// The rest of the line.
    pub body: Body,
}

impl Statement {
    /// Words this statement occupies, when that does not depend on operands.
    ///
    /// Returns `None` for `SPACE`, which is sized by its argument.
    #[must_use]
    pub const fn fixed_size(&self) -> Option<usize> {
        match &self.body {
            Body::Empty | Body::Section(_) => Some(0),
            Body::Instruction { opcode, .. } => Some(opcode.size()),
            Body::Directive {
                directive: Directive::Space,
                ..
            } => None,
            Body::Directive { directive, .. } => Some(directive.fixed_size()),
        }
    }
}

/// Parses one preprocessed line.
///
/// # Errors
///
/// Returns a located error for an invalid or repeated label, a malformed
/// `SECTION` line, or an unknown mnemonic.
pub fn parse_statement(source: &SourceLine) -> Result<Statement, AssembleError> {
    parse_tokens(source.line, &source.tokens)
        .map_err(|kind| AssembleError::new(kind).at_line(source.line))
}

fn parse_tokens(line: usize, tokens: &[String]) -> Result<Statement, AssembleErrorKind> {
    let (label, rest) = match tokens.split_first() {
        Some((first, rest)) => match first.strip_suffix(':') {
            Some(name) if is_identifier(name) => (Some(name.to_string()), rest),
            Some(name) => return Err(AssembleErrorKind::InvalidLabel(name.to_string())),
            None => (None, tokens),
        },
        None => (None, tokens),
    };

    let Some((head, args)) = rest.split_first() else {
        return Ok(Statement {
            line,
            label,
            body: Body::Empty,
        });
    };

    if head.ends_with(':') {
        return Err(AssembleErrorKind::MultipleLabels(head.clone()));
    }

    let body = if head == SECTION_KEYWORD {
        if label.is_some() || tokens.len() != SECTION_LINE_TOKENS {
            return Err(AssembleErrorKind::SectionTokenCount(tokens.len()));
        }
        let name = &args[0];
        let section =
            Section::from_name(name).ok_or_else(|| AssembleErrorKind::UnknownSection(name.clone()))?;
        Body::Section(section)
    } else if let Some(opcode) = Opcode::from_mnemonic(head) {
        Body::Instruction {
            opcode,
            operands: split_operands(args),
        }
    } else if let Some(directive) = Directive::from_name(head) {
        Body::Directive {
            directive,
            args: split_operands(args),
        }
    } else {
        return Err(AssembleErrorKind::UnknownMnemonic(head.clone()));
    };

    Ok(Statement { line, label, body })
}

/// Splits operand tokens on commas and whitespace, keeping `X + 4` together
/// as `X+4`.
#[must_use]
pub fn split_operands(tokens: &[String]) -> Vec<String> {
    let joined = tokens.join(" ");
    let mut operands = Vec::new();
    for piece in joined.split(',') {
        let mut current: Vec<String> = Vec::new();
        for word in piece.split_whitespace() {
            match current.last_mut() {
                Some(prev) if prev.ends_with('+') || word.starts_with('+') => prev.push_str(word),
                _ => current.push(word.to_string()),
            }
        }
        operands.extend(current);
    }
    operands
}
