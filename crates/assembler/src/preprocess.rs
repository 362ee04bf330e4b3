//! Preprocessor: comment stripping, tokenizing and `EQU` substitution.
//!
//! Output is the `(line, tokens)` stream both passes consume. Lines that end up
//! empty are dropped, but surviving lines keep their original line numbers.

use std::collections::BTreeMap;

use object_core::{is_identifier, parse_literal};

use crate::errors::{AssembleError, AssembleErrorKind};
use crate::source::SourceLine;

const COMMENT: char = ';';
const ALIAS_KEYWORD: &str = "EQU";

#[derive(Debug)]
struct Alias {
    value: String,
    defined_at: usize,
}

/// Tokenizes source text and expands constant aliases.
///
/// # Errors
///
/// Returns `MalformedAlias` for an `EQU` line that is not `NAME: EQU <literal>`
/// and `RedefinedLabel` when an alias name is reused.
pub fn preprocess(text: &str) -> Result<Vec<SourceLine>, AssembleError> {
    let mut aliases: BTreeMap<String, Alias> = BTreeMap::new();
    let mut lines = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let code = raw.split_once(COMMENT).map_or(raw, |(code, _)| code);
        let tokens = tokenize(&code.to_ascii_uppercase());
        if tokens.is_empty() {
            continue;
        }

        if tokens.iter().any(|t| t == ALIAS_KEYWORD) {
            let (name, value) = parse_alias(&tokens).map_err(|e| e.at_line(line))?;
            if let Some(first) = aliases.get(&name) {
                return Err(AssembleError::new(AssembleErrorKind::RedefinedLabel {
                    name,
                    first_line: first.defined_at,
                })
                .at_line(line));
            }
            aliases.insert(
                name,
                Alias {
                    value,
                    defined_at: line,
                },
            );
            continue;
        }

        let tokens = tokens
            .into_iter()
            .map(|token| {
                if token.ends_with(':') {
                    token
                } else {
                    substitute(&token, &aliases)
                }
            })
            .collect();
        lines.push(SourceLine { line, tokens });
    }

    Ok(lines)
}

/// Splits on whitespace and detaches a leading `LABEL:` glued to the next
/// token.
fn tokenize(code: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for mut word in code.split_whitespace() {
        while let Some(pos) = word.find(':') {
            if pos + 1 == word.len() {
                break;
            }
            tokens.push(word[..=pos].to_string());
            word = &word[pos + 1..];
        }
        tokens.push(word.to_string());
    }
    tokens
}

fn parse_alias(tokens: &[String]) -> Result<(String, String), AssembleError> {
    let [label, keyword, value] = tokens else {
        return Err(AssembleErrorKind::MalformedAlias.into());
    };
    let name = label
        .strip_suffix(':')
        .filter(|name| is_identifier(name))
        .ok_or(AssembleErrorKind::MalformedAlias)?;
    if keyword != ALIAS_KEYWORD || parse_literal(value).is_err() {
        return Err(AssembleErrorKind::MalformedAlias.into());
    }
    Ok((name.to_string(), value.clone()))
}

/// Replaces every identifier run in `token` that names an alias.
fn substitute(token: &str, aliases: &BTreeMap<String, Alias>) -> String {
    if aliases.is_empty() {
        return token.to_string();
    }
    let mut out = String::with_capacity(token.len());
    let mut run = String::new();
    for c in token.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            run.push(c);
        } else {
            flush_run(&mut out, &mut run, aliases);
            out.push(c);
        }
    }
    flush_run(&mut out, &mut run, aliases);
    out
}

fn flush_run(out: &mut String, run: &mut String, aliases: &BTreeMap<String, Alias>) {
    match aliases.get(run.as_str()) {
        Some(alias) if is_identifier(run) => out.push_str(&alias.value),
        _ => out.push_str(run),
    }
    run.clear();
}
