//! Lexer for the script subset.
//!
//! Produces a flat token stream with byte offsets. Template literals are
//! lexed as a unit: the static chunks are decoded and each `${...}`
//! interpolation is captured as raw source text for the parser to parse
//! recursively. Comments are skipped.

use crate::script::SyntaxError;

/// Token payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier or keyword; the parser decides which by spelling.
    Ident(String),

    /// Numeric literal, raw spelling.
    Num(String),

    /// String literal, decoded value.
    Str(String),

    /// Template literal: decoded static chunks and raw interpolation
    /// sources. `quasis.len() == exprs.len() + 1`.
    Template {
        quasis: Vec<String>,
        exprs: Vec<String>,
    },

    /// Operator or punctuation.
    Punct(&'static str),

    /// End of input.
    Eof,
}

/// A token with its byte range in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

/// Multi-character operators, longest first so maximal munch works.
const PUNCT: &[&str] = &[
    "===", "!==", "...", "=>", "==", "!=", "<=", ">=", "&&", "||", "??", "+=", "-=", "*=", "/=",
    "(", ")", "{", "}", "[", "]", ",", ";", ":", ".", "=", "<", ">", "+", "-", "*", "/", "%", "!",
    "?",
];

/// Tokenizes `source`, skipping whitespace and comments.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos] as char;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        // Line comment
        if c == '/' && bytes.get(pos + 1) == Some(&b'/') {
            while pos < bytes.len() && bytes[pos] != b'\n' {
                pos += 1;
            }
            continue;
        }

        // Block comment
        if c == '/' && bytes.get(pos + 1) == Some(&b'*') {
            let start = pos;
            pos += 2;
            loop {
                if pos + 1 >= bytes.len() {
                    return Err(SyntaxError::new("unterminated block comment", start));
                }
                if bytes[pos] == b'*' && bytes[pos + 1] == b'/' {
                    pos += 2;
                    break;
                }
                pos += 1;
            }
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            let start = pos;
            while pos < bytes.len() && is_ident_char(bytes[pos]) {
                pos += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(source[start..pos].to_string()),
                start,
                end: pos,
            });
            continue;
        }

        if c.is_ascii_digit() {
            let start = pos;
            pos = lex_number(bytes, pos);
            tokens.push(Token {
                kind: TokenKind::Num(source[start..pos].to_string()),
                start,
                end: pos,
            });
            continue;
        }

        if c == '\'' || c == '"' {
            let start = pos;
            let (value, next) = lex_string(source, pos, c)?;
            tokens.push(Token {
                kind: TokenKind::Str(value),
                start,
                end: next,
            });
            pos = next;
            continue;
        }

        if c == '`' {
            let start = pos;
            let (quasis, exprs, next) = lex_template(source, pos)?;
            tokens.push(Token {
                kind: TokenKind::Template { quasis, exprs },
                start,
                end: next,
            });
            pos = next;
            continue;
        }

        if let Some(&op) = PUNCT.iter().find(|op| source[pos..].starts_with(**op)) {
            tokens.push(Token {
                kind: TokenKind::Punct(op),
                start: pos,
                end: pos + op.len(),
            });
            pos += op.len();
            continue;
        }

        return Err(SyntaxError::new(format!("unexpected character '{c}'"), pos));
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        start: pos,
        end: pos,
    });
    Ok(tokens)
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn lex_number(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)
    {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut lookahead = pos + 1;
        if bytes.get(lookahead) == Some(&b'+') || bytes.get(lookahead) == Some(&b'-') {
            lookahead += 1;
        }
        if bytes.get(lookahead).is_some_and(u8::is_ascii_digit) {
            pos = lookahead;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }
    pos
}

/// Lexes a quoted string starting at `start` (which holds the quote).
/// Returns the decoded value and the offset just past the closing quote.
fn lex_string(source: &str, start: usize, quote: char) -> Result<(String, usize), SyntaxError> {
    let mut value = String::new();
    let mut chars = source[start + 1..].char_indices();

    while let Some((i, c)) = chars.next() {
        let abs = start + 1 + i;
        match c {
            '\n' => return Err(SyntaxError::new("unterminated string literal", start)),
            '\\' => {
                let (_, esc) = chars
                    .next()
                    .ok_or_else(|| SyntaxError::new("unterminated string literal", start))?;
                value.push(decode_escape(esc));
            }
            c if c == quote => return Ok((value, abs + c.len_utf8())),
            c => value.push(c),
        }
    }

    Err(SyntaxError::new("unterminated string literal", start))
}

fn decode_escape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        'b' => '\u{8}',
        other => other,
    }
}

/// Lexes a template literal starting at the opening backtick.
///
/// Interpolation sources are captured raw, with brace depth tracked and
/// quoted sections skipped so `}` inside a nested string does not close
/// the interpolation early.
fn lex_template(
    source: &str,
    start: usize,
) -> Result<(Vec<String>, Vec<String>, usize), SyntaxError> {
    let mut quasis = Vec::new();
    let mut exprs = Vec::new();
    let mut quasi = String::new();
    let mut chars = source[start + 1..].char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let abs = start + 1 + i;
        match c {
            '`' => {
                quasis.push(quasi);
                return Ok((quasis, exprs, abs + 1));
            }
            '\\' => {
                let (_, esc) = chars
                    .next()
                    .ok_or_else(|| SyntaxError::new("unterminated template literal", start))?;
                quasi.push(match esc {
                    '`' | '$' | '\\' => esc,
                    other => decode_escape(other),
                });
            }
            '$' if chars.peek().map(|(_, c)| *c) == Some('{') => {
                chars.next();
                quasis.push(std::mem::take(&mut quasi));

                let expr_start = abs + 2;
                let mut depth = 1usize;
                let mut expr_end = None;
                let mut in_quote: Option<char> = None;

                while let Some((j, c)) = chars.next() {
                    let abs_j = start + 1 + j;
                    match in_quote {
                        Some(q) => {
                            if c == '\\' {
                                chars.next();
                            } else if c == q {
                                in_quote = None;
                            }
                        }
                        None => match c {
                            '\'' | '"' | '`' => in_quote = Some(c),
                            '{' => depth += 1,
                            '}' => {
                                depth -= 1;
                                if depth == 0 {
                                    expr_end = Some(abs_j);
                                    break;
                                }
                            }
                            _ => {}
                        },
                    }
                }

                let end = expr_end
                    .ok_or_else(|| SyntaxError::new("unterminated template literal", start))?;
                exprs.push(source[expr_start..end].to_string());
            }
            c => quasi.push(c),
        }
    }

    Err(SyntaxError::new("unterminated template literal", start))
}
