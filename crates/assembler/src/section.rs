//! Section and module structure rules shared by both passes.
//!
//! A [`SectionCursor`] is driven once per statement. It owns every ordering
//! rule: TEXT first and only once, instructions in TEXT, `CONST` in DATA,
//! `SPACE` inside any section, and `BEGIN`/`END` nesting.

use std::fmt;

use object_core::Directive;
use thiserror::Error;

use crate::parser::{Body, Statement};

/// The section currently being assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Section {
    /// Before any `SECTION` line.
    #[default]
    None,
    /// Executable instructions.
    Text,
    /// Initialized data.
    Data,
    /// Reserved, zero-filled data.
    Bss,
}

impl Section {
    /// Looks up a section by the name used on a `SECTION` line.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "TEXT" => Some(Self::Text),
            "DATA" => Some(Self::Data),
            "BSS" => Some(Self::Bss),
            _ => None,
        }
    }

    /// Name as written in source.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "no section",
            Self::Text => "TEXT",
            Self::Data => "DATA",
            Self::Bss => "BSS",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A broken section or module rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionViolation {
    /// The program never declares `SECTION TEXT`.
    #[error("SECTION TEXT is missing")]
    MissingText,
    /// A second `SECTION TEXT`.
    #[error("SECTION TEXT may appear only once")]
    TextRepeated,
    /// DATA or BSS declared before TEXT.
    #[error("SECTION {0} must come after SECTION TEXT")]
    TextNotFirst(Section),
    /// An instruction outside TEXT.
    #[error("instructions are only allowed in SECTION TEXT, not in {0}")]
    InstructionOutsideText(Section),
    /// A data directive in the wrong section.
    #[error("{} is not allowed in {section}", .directive.name())]
    DirectiveOutsideSection {
        /// The offending directive.
        directive: Directive,
        /// The section it appeared in.
        section: Section,
    },
    /// `BEGIN` inside an open module.
    #[error("BEGIN inside an open module")]
    NestedBegin,
    /// `BEGIN` after a section was already declared.
    #[error("BEGIN must come before any SECTION")]
    BeginInsideSection,
    /// `END` without a matching `BEGIN`.
    #[error("END without BEGIN")]
    EndWithoutBegin,
    /// `END` before the module has any TEXT.
    #[error("END before SECTION TEXT")]
    EndBeforeText,
    /// `BEGIN` never closed.
    #[error("BEGIN without END")]
    MissingEnd,
    /// A statement after `END`.
    #[error("nothing may follow END")]
    AfterEnd,
}

/// Tracks the current section and module nesting across a program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionCursor {
    section: Section,
    inside_module: bool,
    has_seen_text: bool,
    ended: bool,
}

impl SectionCursor {
    /// Creates a cursor positioned before the first line.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The section the next statement belongs to.
    #[must_use]
    pub const fn section(&self) -> Section {
        self.section
    }

    /// True while between `BEGIN` and `END`.
    #[must_use]
    pub const fn inside_module(&self) -> bool {
        self.inside_module
    }

    /// Validates one statement and advances the state.
    ///
    /// # Errors
    ///
    /// Returns the violated rule. The cursor is left unchanged on error.
    pub fn apply(&mut self, statement: &Statement) -> Result<(), SectionViolation> {
        if self.ended && (statement.label.is_some() || statement.body != Body::Empty) {
            return Err(SectionViolation::AfterEnd);
        }
        match &statement.body {
            Body::Empty => Ok(()),
            Body::Section(section) => self.enter(*section),
            Body::Instruction { .. } => {
                if self.section == Section::Text {
                    Ok(())
                } else {
                    Err(SectionViolation::InstructionOutsideText(self.section))
                }
            }
            Body::Directive { directive, .. } => self.directive(*directive),
        }
    }

    /// Checks the rules that can only be decided after the last line.
    ///
    /// # Errors
    ///
    /// Returns `MissingText` if TEXT never appeared and `MissingEnd` if a
    /// module is still open.
    pub const fn finish(&self) -> Result<(), SectionViolation> {
        if !self.has_seen_text {
            return Err(SectionViolation::MissingText);
        }
        if self.inside_module {
            return Err(SectionViolation::MissingEnd);
        }
        Ok(())
    }

    fn enter(&mut self, section: Section) -> Result<(), SectionViolation> {
        match (section, self.has_seen_text) {
            (Section::Text, true) => return Err(SectionViolation::TextRepeated),
            (Section::Text, false) => self.has_seen_text = true,
            (_, false) => return Err(SectionViolation::TextNotFirst(section)),
            (_, true) => {}
        }
        self.section = section;
        Ok(())
    }

    fn directive(&mut self, directive: Directive) -> Result<(), SectionViolation> {
        match directive {
            Directive::Begin => {
                if self.inside_module {
                    return Err(SectionViolation::NestedBegin);
                }
                if self.section != Section::None {
                    return Err(SectionViolation::BeginInsideSection);
                }
                self.inside_module = true;
            }
            Directive::End => {
                if !self.inside_module {
                    return Err(SectionViolation::EndWithoutBegin);
                }
                if !self.has_seen_text {
                    return Err(SectionViolation::EndBeforeText);
                }
                self.inside_module = false;
                self.ended = true;
            }
            Directive::Const if self.section != Section::Data => {
                return Err(SectionViolation::DirectiveOutsideSection {
                    directive,
                    section: self.section,
                });
            }
            Directive::Space if self.section == Section::None => {
                return Err(SectionViolation::DirectiveOutsideSection {
                    directive,
                    section: self.section,
                });
            }
            _ => {}
        }
        Ok(())
    }
}
