//! Substitution-marker codec.
//!
//! Captured assertion lines may contain `{$kind.path}` substitution
//! markers referencing prior responses or shared data. A string literal
//! holding such a marker is not parseable, and a plain search-and-replace
//! cannot safely identify strings within strings across three quote
//! characters. The codec therefore works in two passes: replace each
//! marker with a content-addressed digest of its exact text (digests are
//! hex, so the line parses), then walk the tree and rewrite every string
//! literal containing digests into a template literal whose interpolated
//! expressions are rebuilt from the original markers.

use crate::config::PREV_IDENTIFIER;
use crate::generator::error::GenerateError;
use crate::script::ast::Expr;
use crate::script::parser::{parse_expression_source, parse_program};
use crate::script::printer::print_statement;
use crate::script::query::for_each_expr_mut;
use once_cell::sync::Lazy;
use regex::Regex;

/// A `{$kind.path}` marker. The path must not contain `}`, which is how
/// the substitution syntax bounds markers; the match is line-local
/// because the syntax never spans line breaks.
static MARKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\$(?:function|prev|request|inputs)[^}]+\}")
        .expect("marker regex must compile")
});

/// The `prev` marker form: a numeric response ordinal followed by a data
/// path, neither of which is valid member-access syntax as written.
static PREV_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{\$prev\.([0-9]+)\.([^}]*)\}$").expect("prev marker regex must compile")
});

/// Re-encodes one script line so that substitution markers survive
/// parsing, returning the line unchanged when it contains no markers.
pub fn encode_markers(line: &str) -> Result<String, GenerateError> {
    if !MARKER_REGEX.is_match(line) {
        return Ok(line.to_string());
    }

    // First pass: digest-substitute every marker so the line parses.
    let mut replacements: Vec<Replacement> = Vec::new();
    let mut sanitized = String::with_capacity(line.len());
    let mut last = 0;
    for found in MARKER_REGEX.find_iter(line) {
        sanitized.push_str(&line[last..found.start()]);
        let marker = found.as_str();
        let digest = format!("{:x}", md5::compute(marker.as_bytes()));
        match replacements.iter().position(|r| r.digest == digest) {
            Some(at) => {
                if replacements[at].marker != marker {
                    return Err(GenerateError::DigestCollision { digest });
                }
            }
            None => replacements.push(Replacement {
                digest: digest.clone(),
                marker: marker.to_string(),
                expr: marker_expression(marker)?,
            }),
        }
        sanitized.push_str(&digest);
        last = found.end();
    }
    sanitized.push_str(&line[last..]);

    // Second pass: parse the sanitized line and restore digests found in
    // string literals as template-literal interpolations.
    let mut stmts = parse_program(&sanitized)?;
    for_each_expr_mut(&mut stmts, &mut |expr| {
        if let Expr::Str { value } = expr {
            if replacements.iter().any(|r| value.contains(&r.digest)) {
                *expr = string_to_template(value, &replacements);
            }
        }
    });

    let printed = stmts
        .iter()
        .map(print_statement)
        .collect::<Vec<_>>()
        .join("\n");

    // A digest that survived printing sat outside any string literal;
    // emitting it would silently corrupt the output.
    for replacement in &replacements {
        if printed.contains(&replacement.digest) {
            return Err(GenerateError::UnrestoredMarker {
                marker: replacement.marker.clone(),
            });
        }
    }

    Ok(printed)
}

struct Replacement {
    digest: String,
    marker: String,
    expr: Expr,
}

/// Rebuilds a marker's content as a valid expression.
///
/// `prev.N.path` markers are rewritten to indexed access (`prev[N]`)
/// followed by per-component accessors, bracketed where the component is
/// not a valid bare identifier. Every other marker kind passes through
/// with the `{$...}` brackets stripped.
fn marker_expression(marker: &str) -> Result<Expr, GenerateError> {
    if let Some(captures) = PREV_REGEX.captures(marker) {
        let ordinal = captures[1].to_string();
        let mut expr = Expr::Member {
            object: Box::new(Expr::ident(PREV_IDENTIFIER)),
            property: Box::new(Expr::num(ordinal)),
            computed: true,
        };
        for component in split_path(&captures[2]) {
            expr = if is_valid_unquoted(&component) {
                Expr::Member {
                    object: Box::new(expr),
                    property: Box::new(Expr::ident(component)),
                    computed: false,
                }
            } else {
                Expr::Member {
                    object: Box::new(expr),
                    property: Box::new(Expr::str(component)),
                    computed: true,
                }
            };
        }
        return Ok(expr);
    }

    let inner = &marker[2..marker.len() - 1];
    Ok(parse_expression_source(inner)?)
}

/// Splits a marker data path into components: dot-separated segments plus
/// `[...]` segments with any quoting stripped.
fn split_path(path: &str) -> Vec<String> {
    let mut components = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !current.is_empty() {
                    components.push(std::mem::take(&mut current));
                }
            }
            '[' => {
                if !current.is_empty() {
                    components.push(std::mem::take(&mut current));
                }
                let mut segment = String::new();
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                    segment.push(c);
                }
                let segment = segment.trim_matches(|q| q == '\'' || q == '"');
                components.push(segment.to_string());
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        components.push(current);
    }
    components
}

/// Words that cannot be used in dot-access position.
const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "let", "new", "null", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Whether a path component can be written after a dot, unquoted.
fn is_valid_unquoted(component: &str) -> bool {
    let mut chars = component.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !RESERVED_WORDS.contains(&component)
}

/// Rewrites a digest-bearing string value into a template literal whose
/// static chunks are the surrounding characters and whose interpolations
/// are the restored marker expressions.
fn string_to_template(value: &str, replacements: &[Replacement]) -> Expr {
    let mut quasis = Vec::new();
    let mut exprs = Vec::new();
    let mut rest = value;
    loop {
        let earliest = replacements
            .iter()
            .filter_map(|r| rest.find(&r.digest).map(|at| (at, r)))
            .min_by_key(|(at, _)| *at);
        match earliest {
            Some((at, replacement)) => {
                quasis.push(rest[..at].to_string());
                exprs.push(replacement.expr.clone());
                rest = &rest[at + replacement.digest.len()..];
            }
            None => {
                quasis.push(rest.to_string());
                break;
            }
        }
    }
    Expr::Template { quasis, exprs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_line_without_markers_is_identity() {
        let line = "expect(resp1.body).to.deep.equal(expected)";
        assert_eq!(encode_markers(line).unwrap(), line);
        // braces alone do not make a marker; the line is not even parsed
        let line = "const a = { $notAMarker: 1 }";
        assert_eq!(encode_markers(line).unwrap(), line);
    }

    #[test]
    fn test_encode_request_and_prev_markers() {
        let line = "expect('{$request.headers['FSPIOP-Source']}').to.equal('{$prev.2.callback.headers.fspiop-destination}')";
        assert_eq!(
            encode_markers(line).unwrap(),
            "expect(`${request.headers[\"FSPIOP-Source\"]}`).to.equal(`${prev[2].callback.headers[\"fspiop-destination\"]}`);"
        );
    }

    #[test]
    fn test_encode_marker_embedded_in_longer_string() {
        let line = "expect(note).to.equal('memo: {$prev.1.body.note}!')";
        assert_eq!(
            encode_markers(line).unwrap(),
            "expect(note).to.equal(`memo: ${prev[1].body.note}!`);"
        );
    }

    #[test]
    fn test_encode_two_markers_in_one_string() {
        let line = "expect(pair).to.equal('{$inputs.FROM}-{$inputs.TO}')";
        assert_eq!(
            encode_markers(line).unwrap(),
            "expect(pair).to.equal(`${inputs.FROM}-${inputs.TO}`);"
        );
    }

    #[test]
    fn test_encode_function_marker_passes_through() {
        let line = "expect(memo).to.equal('{$function.generic.generateUUID}')";
        assert_eq!(
            encode_markers(line).unwrap(),
            "expect(memo).to.equal(`${function.generic.generateUUID}`);"
        );
    }

    #[test]
    fn test_encode_prev_path_with_bracket_segment() {
        let line = "expect(x).to.equal('{$prev.3.headers['FSPIOP-Source']}')";
        assert_eq!(
            encode_markers(line).unwrap(),
            "expect(x).to.equal(`${prev[3].headers[\"FSPIOP-Source\"]}`);"
        );
    }

    #[test]
    fn test_encode_marker_outside_string_fails() {
        // a bare marker in code position cannot be restored; depending on
        // the digest's first character this surfaces at parse time or at
        // the unrestored-digest check, but never as corrupted output
        let line = "expect({$prev.1.body}).to.exist";
        assert!(encode_markers(line).is_err());
    }

    #[test]
    fn test_split_path_forms() {
        assert_eq!(
            split_path("callback.headers.fspiop-destination"),
            vec!["callback", "headers", "fspiop-destination"]
        );
        assert_eq!(split_path("headers['x-y'].value"), vec!["headers", "x-y", "value"]);
        assert_eq!(split_path("body[0].id"), vec!["body", "0", "id"]);
    }

    #[test]
    fn test_is_valid_unquoted() {
        assert!(is_valid_unquoted("callback"));
        assert!(is_valid_unquoted("_x$1"));
        assert!(!is_valid_unquoted("fspiop-destination"));
        assert!(!is_valid_unquoted("0abc"));
        assert!(!is_valid_unquoted("class"));
        assert!(!is_valid_unquoted(""));
    }

    proptest! {
        #[test]
        fn prop_marker_free_lines_are_identity(line in "[a-zA-Z0-9 .,()'\"=+!-]{0,60}") {
            prop_assert_eq!(encode_markers(&line).unwrap(), line);
        }
    }
}
