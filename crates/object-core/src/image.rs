//! Executable image text: one newline-terminated line of decimal words.

use crate::isa::Word;
use crate::lexical::parse_natural;
use crate::object::{join_words, ObjectError};

/// Renders a linked image.
#[must_use]
pub fn to_image_text(words: &[Word]) -> String {
    let mut out = join_words(words.iter());
    out.push('\n');
    out
}

/// Reads an image back into words.
///
/// # Errors
///
/// Returns `ObjectError::NotNatural` or `ObjectError::WordOutOfRange` for a
/// token that is not a 16-bit decimal word.
pub fn parse_image(text: &str) -> Result<Vec<Word>, ObjectError> {
    let mut words = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        for token in line.split_whitespace() {
            let value = parse_natural(token).ok_or_else(|| ObjectError::NotNatural {
                line: idx + 1,
                table: "IMAGE",
                token: token.to_string(),
            })?;
            let word = Word::try_from(value).map_err(|_| ObjectError::WordOutOfRange {
                line: idx + 1,
                token: token.to_string(),
            })?;
            words.push(word);
        }
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_single_terminated_line() {
        assert_eq!(to_image_text(&[12, 7, 14]), "12 7 14\n");
        assert_eq!(to_image_text(&[]), "\n");
    }

    #[test]
    fn reads_rendered_image() {
        assert_eq!(parse_image("12 7 14\n").unwrap(), vec![12, 7, 14]);
    }

    #[test]
    fn rejects_negative_words() {
        assert!(matches!(
            parse_image("1 -2\n"),
            Err(ObjectError::NotNatural { line: 1, .. })
        ));
    }
}
