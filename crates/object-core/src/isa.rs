/// One machine word. Memory is word addressed.
pub type Word = u16;

/// Number of addressable words.
pub const ADDRESS_SPACE_WORDS: usize = 1 << 16;

/// Instruction opcodes with their assigned word values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u16)]
#[allow(missing_docs)]
pub enum Opcode {
    Add = 1,
    Sub = 2,
    Mult = 3,
    Div = 4,
    Jmp = 5,
    Jmpn = 6,
    Jmpp = 7,
    Jmpz = 8,
    Copy = 9,
    Load = 10,
    Store = 11,
    Input = 12,
    Output = 13,
    Stop = 14,
}

/// Single source-of-truth mnemonic table: `(mnemonic, opcode, operand count)`.
///
/// An instruction occupies one word for the opcode plus one per operand.
pub const OPCODE_TABLE: &[(&str, Opcode, usize)] = &[
    ("ADD", Opcode::Add, 1),
    ("SUB", Opcode::Sub, 1),
    ("MULT", Opcode::Mult, 1),
    ("DIV", Opcode::Div, 1),
    ("JMP", Opcode::Jmp, 1),
    ("JMPN", Opcode::Jmpn, 1),
    ("JMPP", Opcode::Jmpp, 1),
    ("JMPZ", Opcode::Jmpz, 1),
    ("COPY", Opcode::Copy, 2),
    ("LOAD", Opcode::Load, 1),
    ("STORE", Opcode::Store, 1),
    ("INPUT", Opcode::Input, 1),
    ("OUTPUT", Opcode::Output, 1),
    ("STOP", Opcode::Stop, 0),
];

impl Opcode {
    /// Looks up an opcode by its (upper-case) mnemonic.
    #[must_use]
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        OPCODE_TABLE
            .iter()
            .find(|(name, _, _)| *name == mnemonic)
            .map(|&(_, opcode, _)| opcode)
    }

    /// The word emitted for this opcode.
    #[must_use]
    pub const fn word(self) -> Word {
        self as Word
    }

    /// Canonical mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        OPCODE_TABLE
            .iter()
            .find(|(_, opcode, _)| *opcode == self)
            .map_or("?", |(name, _, _)| name)
    }

    /// Number of symbolic operands the instruction takes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Stop => 0,
            Self::Copy => 2,
            _ => 1,
        }
    }

    /// Words occupied by the instruction, operands included.
    #[must_use]
    pub const fn size(self) -> usize {
        1 + self.arity()
    }
}

/// Assembler directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Directive {
    /// `SECTION <TEXT|DATA|BSS>`.
    Section,
    /// `SPACE [N]`: reserve N zeroed words.
    Space,
    /// `CONST <literal>`: emit one initialized word.
    Const,
    /// `LABEL: EXTERN`: symbol defined by another module.
    Extern,
    /// `PUBLIC LABEL`: export a local symbol.
    Public,
    /// `LABEL: BEGIN`: opens a linkable module.
    Begin,
    /// `END`: closes the module.
    End,
}

impl Directive {
    /// Looks up a directive by its (upper-case) name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SECTION" => Some(Self::Section),
            "SPACE" => Some(Self::Space),
            "CONST" => Some(Self::Const),
            "EXTERN" => Some(Self::Extern),
            "PUBLIC" => Some(Self::Public),
            "BEGIN" => Some(Self::Begin),
            "END" => Some(Self::End),
            _ => None,
        }
    }

    /// Directive name as written in source.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Section => "SECTION",
            Self::Space => "SPACE",
            Self::Const => "CONST",
            Self::Extern => "EXTERN",
            Self::Public => "PUBLIC",
            Self::Begin => "BEGIN",
            Self::End => "END",
        }
    }

    /// Fixed word size. `SPACE` is sized by its argument instead.
    #[must_use]
    pub const fn fixed_size(self) -> usize {
        match self {
            Self::Const => 1,
            Self::Space | Self::Section | Self::Extern | Self::Public | Self::Begin | Self::End => 0,
        }
    }
}
