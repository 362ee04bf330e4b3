//! Lexical grammar shared by the preprocessor, both assembler passes and the
//! object-module reader.
//!
//! Every pattern is matched by a small hand-written scanner rather than a
//! regular expression engine:
//!
//! | pattern    | grammar                      |
//! |------------|------------------------------|
//! | identifier | `[A-Za-z_][A-Za-z0-9_]*`     |
//! | natural    | `[0-9]+`                     |
//! | integer    | `[+-]?[0-9]+`                |
//! | hex        | `0[xX][0-9A-Fa-f]{1,4}`      |

use thiserror::Error;

use crate::isa::Word;

/// Maximum number of digits after the `0x` prefix.
pub const MAX_HEX_DIGITS: usize = 4;

/// Smallest decimal literal accepted for a word.
pub const MIN_DECIMAL_WORD: i64 = -32768;

/// Largest decimal literal accepted for a word.
pub const MAX_DECIMAL_WORD: i64 = 65535;

/// Why a literal could not be turned into a word.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    /// Token does not match the decimal or hexadecimal grammar.
    #[error("'{0}' is not a decimal or hexadecimal literal")]
    Malformed(String),
    /// Decimal literal outside `-32768..=65535`.
    #[error("literal {0} does not fit in a 16-bit word")]
    OutOfRange(String),
}

/// Returns true if `s` matches the identifier grammar.
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    let Some(first) = bytes.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() && first != b'_' {
        return false;
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Returns true if `s` is a non-empty run of decimal digits.
#[must_use]
pub fn is_natural(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a natural number (`[0-9]+`, no sign).
#[must_use]
pub fn parse_natural(s: &str) -> Option<usize> {
    if is_natural(s) {
        s.parse().ok()
    } else {
        None
    }
}

/// Returns true if `s` matches the signed decimal grammar `[+-]?[0-9]+`.
#[must_use]
pub fn is_integer(s: &str) -> bool {
    is_natural(s.strip_prefix(['+', '-']).unwrap_or(s))
}

/// Parses a signed decimal integer (`[+-]?[0-9]+`).
#[must_use]
pub fn parse_integer(s: &str) -> Option<i64> {
    if is_integer(s) {
        s.parse().ok()
    } else {
        None
    }
}

/// Parses a hexadecimal literal with a case-insensitive `0x` prefix and one to
/// four digits.
#[must_use]
pub fn parse_hex(s: &str) -> Option<Word> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    if digits.is_empty()
        || digits.len() > MAX_HEX_DIGITS
        || !digits.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }
    Word::from_str_radix(digits, 16).ok()
}

/// Converts a `CONST`-style literal into a word.
///
/// Hexadecimal literals map directly onto the 16 bits. Decimal literals may be
/// negative and are stored as two's complement.
///
/// # Errors
///
/// Returns `LiteralError::Malformed` if the token matches neither grammar and
/// `LiteralError::OutOfRange` if a decimal value needs more than 16 bits.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_literal(s: &str) -> Result<Word, LiteralError> {
    if let Some(word) = parse_hex(s) {
        return Ok(word);
    }
    if !is_integer(s) {
        return Err(LiteralError::Malformed(s.to_string()));
    }
    let value = parse_integer(s)
        .filter(|v| (MIN_DECIMAL_WORD..=MAX_DECIMAL_WORD).contains(v))
        .ok_or_else(|| LiteralError::OutOfRange(s.to_string()))?;
    Ok(value as i32 as u32 as Word)
}

/// Splits an operand of the form `NAME+N` into its name and decimal offset.
///
/// Returns `None` for the offset when there is no `+`. The offset text is
/// returned unparsed so callers can report it verbatim.
#[must_use]
pub fn split_offset(s: &str) -> (&str, Option<&str>) {
    match s.split_once('+') {
        Some((name, offset)) => (name.trim(), Some(offset.trim())),
        None => (s.trim(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("L1", true)]
    #[case("_tmp", true)]
    #[case("LOOP_2", true)]
    #[case("2L", false)]
    #[case("", false)]
    #[case("A-B", false)]
    #[case("LABEL:", false)]
    fn identifier_grammar(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_identifier(input), expected);
    }

    #[rstest]
    #[case("0", Some(0))]
    #[case("0042", Some(42))]
    #[case("+1", None)]
    #[case("-1", None)]
    #[case("", None)]
    #[case("1a", None)]
    fn natural_grammar(#[case] input: &str, #[case] expected: Option<usize>) {
        assert_eq!(parse_natural(input), expected);
    }

    #[rstest]
    #[case("12", Some(12))]
    #[case("+7", Some(7))]
    #[case("-30", Some(-30))]
    #[case("-", None)]
    #[case("--1", None)]
    #[case("0x10", None)]
    fn integer_grammar(#[case] input: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_integer(input), expected);
    }

    #[rstest]
    #[case("0x0", Some(0))]
    #[case("0X1f", Some(0x1F))]
    #[case("0xFFFF", Some(0xFFFF))]
    #[case("0x10000", None)]
    #[case("0x", None)]
    #[case("0xG1", None)]
    #[case("x10", None)]
    fn hex_grammar(#[case] input: &str, #[case] expected: Option<Word>) {
        assert_eq!(parse_hex(input), expected);
    }

    #[rstest]
    #[case("5", 5)]
    #[case("-1", 0xFFFF)]
    #[case("-32768", 0x8000)]
    #[case("65535", 0xFFFF)]
    #[case("0xAb", 0xAB)]
    fn literal_values(#[case] input: &str, #[case] expected: Word) {
        assert_eq!(parse_literal(input), Ok(expected));
    }

    #[rstest]
    #[case("65536")]
    #[case("-32769")]
    #[case("99999999999999999999")]
    #[case("-99999999999999999999")]
    fn decimal_literals_out_of_range(#[case] input: &str) {
        assert_eq!(
            parse_literal(input),
            Err(LiteralError::OutOfRange(input.into()))
        );
    }

    #[rstest]
    #[case("ten")]
    #[case("0x12345")]
    #[case("--1")]
    #[case("")]
    fn malformed_literals(#[case] input: &str) {
        assert_eq!(parse_literal(input), Err(LiteralError::Malformed(input.into())));
    }

    #[test]
    fn offset_split() {
        assert_eq!(split_offset("X"), ("X", None));
        assert_eq!(split_offset("X+4"), ("X", Some("4")));
        assert_eq!(split_offset("X + 4"), ("X", Some("4")));
        assert_eq!(split_offset("X+"), ("X", Some("")));
    }
}
