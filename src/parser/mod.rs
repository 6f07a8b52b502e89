//! Script-to-collection parser.
//!
//! This module turns a conforming test script into a [`Collection`]. A
//! script must bind the request client exactly once, declare tests with
//! the designated test call, make at least one client request per test,
//! pass the client a literal-only object that validates against the
//! request schema, and keep scripts before assertions within each request
//! segment. Any violation is a descriptive [`ParseError`]; nothing is
//! silently dropped.

pub mod error;
pub mod segment;
pub mod validate;

use crate::config::{ASSERTION_FUNCTION_NAME, CLIENT_LIB_NAME, TEST_FUNCTION_NAME};
use crate::models::{Assertion, Collection, Request, ScriptBlock, Scripts, TestCase, Tests};
use crate::script::ast::{ArrowBody, Expr, Stmt, StmtKind};
use crate::script::parser::parse_program;
use crate::script::query::{
    call_head_name, calls_to, declarators, for_each_expr, stmt_contains_call_to,
};
use error::{InternalError, ParseError};
use segment::{segment_test_body, Segment};
use validate::{object_to_value, validate_request};

/// Parses a test script into a collection named `name`.
///
/// `name` is carried into the collection unchanged; callers typically
/// pass the source file path.
///
/// # Examples
///
/// ```
/// use test_script::parser::parse_source;
///
/// let source = r#"
/// const cli = require('sync-client')
/// it('gets a party', () => {
///   const fspiopRequest = {
///     operationPath: '/parties/MSISDN/12345',
///     method: 'get',
///     headers: {},
///     params: {},
///     apiVersion: { minorVersion: 1, majorVersion: 0, type: 'fspiop', asynchronous: false },
///     url: 'http://localhost:3000'
///   }
///   const resp = cli(fspiopRequest)
///   expect(resp)
/// })
/// "#;
///
/// let collection = parse_source("parties.test.js", source).unwrap();
/// assert_eq!(collection.test_cases.len(), 1);
/// assert_eq!(collection.test_cases[0].requests.len(), 1);
/// ```
pub fn parse_source(name: &str, source: &str) -> Result<Collection, ParseError> {
    let program = parse_program(source)?;

    // The client import must appear exactly once in the whole file...
    let import_count = count_client_imports(&program);
    if import_count != 1 {
        return Err(ParseError::ImportCount {
            count: import_count,
        });
    }

    // ...bound to a plain identifier at module scope...
    let client_name = program
        .iter()
        .find_map(|stmt| match &stmt.kind {
            StmtKind::VarDecl {
                name,
                init: Some(init),
                ..
            } if is_client_import(init) => Some(name.clone()),
            _ => None,
        })
        .ok_or(ParseError::ImportNotBound)?;

    // ...and never re-declared, so every call through it is a request.
    let binding_count = declarators(&program)
        .iter()
        .filter(|(name, _)| *name == client_name)
        .count();
    if binding_count != 1 {
        return Err(ParseError::ShadowedBinding { name: client_name });
    }

    let mut test_cases = Vec::new();
    for call in calls_to(&program, TEST_FUNCTION_NAME) {
        let (test_name, body) = test_declaration_parts(call)?;
        let requests = parse_test_case(source, body, &client_name)?;
        test_cases.push(TestCase {
            name: test_name,
            requests,
        });
    }

    Ok(Collection {
        name: name.to_string(),
        test_cases,
    })
}

/// Whether `expr` is the designated client import call.
fn is_client_import(expr: &Expr) -> bool {
    match expr {
        Expr::Call { callee, args } => {
            matches!(&**callee, Expr::Ident { name } if name == "require")
                && matches!(args.as_slice(), [Expr::Str { value }] if value == CLIENT_LIB_NAME)
        }
        _ => false,
    }
}

fn count_client_imports(program: &[Stmt]) -> usize {
    let mut count = 0;
    for_each_expr(program, &mut |expr| {
        if is_client_import(expr) {
            count += 1;
        }
    });
    count
}

/// Destructures a test declaration into its name and body statements.
fn test_declaration_parts(call: &Expr) -> Result<(String, &[Stmt]), ParseError> {
    let Expr::Call { args, .. } = call else {
        return Err(ParseError::MalformedTestDeclaration);
    };
    let [name, body] = args.as_slice() else {
        return Err(ParseError::MalformedTestDeclaration);
    };
    let Expr::Str { value: name } = name else {
        return Err(ParseError::MalformedTestDeclaration);
    };
    let Expr::Arrow {
        params,
        body: ArrowBody::Block(body),
        ..
    } = body
    else {
        return Err(ParseError::MalformedTestDeclaration);
    };
    if !params.is_empty() {
        return Err(ParseError::MalformedTestDeclaration);
    }
    Ok((name.clone(), body))
}

fn parse_test_case(
    source: &str,
    body: &[Stmt],
    client_name: &str,
) -> Result<Vec<Request>, ParseError> {
    if calls_to(body, client_name).is_empty() {
        return Err(ParseError::NoRequests {
            client_name: client_name.to_string(),
        });
    }

    segment_test_body(body, client_name, ASSERTION_FUNCTION_NAME)
        .iter()
        .map(|segment| parse_segment(source, body, segment, client_name))
        .collect()
}

fn parse_segment(
    source: &str,
    body: &[Stmt],
    segment: &Segment,
    client_name: &str,
) -> Result<Request, ParseError> {
    let stmts = &body[segment.start..segment.end];

    // Segment construction guarantees exactly one request call with one
    // argument; anything else is a converter defect, reported loudly
    // instead of producing bad data.
    let request_calls = calls_to(stmts, client_name);
    if request_calls.len() != 1 {
        return Err(ParseError::Internal(InternalError::SegmentRequestCount {
            count: request_calls.len(),
        }));
    }
    let args = match request_calls[0] {
        Expr::Call { args, .. } => args,
        _ => unreachable!("calls_to returns call expressions"),
    };
    let [arg] = args.as_slice() else {
        return Err(ParseError::Internal(InternalError::RequestArgumentCount {
            count: args.len(),
        }));
    };

    let object = resolve_request_object(arg, body)?;
    let value = object_to_value(object)?;
    validate_request(&value).map_err(|errors| ParseError::InvalidRequestObject { errors })?;
    let mut request: Request = serde_json::from_value(value).map_err(|err| {
        ParseError::Internal(InternalError::ModelConversion {
            detail: err.to_string(),
        })
    })?;

    // Bisect the segment around the request statement, then split the
    // tail at the first assertion: scripts may precede assertions, never
    // follow them.
    let request_pos = stmts
        .iter()
        .position(|stmt| stmt_contains_call_to(stmt, client_name))
        .ok_or(ParseError::Internal(InternalError::SegmentRequestCount {
            count: 0,
        }))?;
    let pre_request = &stmts[..request_pos];
    let rest = &stmts[request_pos + 1..];

    let first_assertion = rest.iter().position(is_assertion_stmt);
    let (post_request, assertions) = match first_assertion {
        Some(index) => (&rest[..index], &rest[index..]),
        None => (rest, &[] as &[Stmt]),
    };
    if !assertions.iter().all(is_assertion_stmt) {
        return Err(ParseError::CodeAfterAssertions);
    }

    request.scripts = Some(Scripts {
        pre_request: Some(ScriptBlock {
            exec: stmts_to_lines(source, pre_request),
        }),
        post_request: Some(ScriptBlock {
            exec: stmts_to_lines(source, post_request),
        }),
    });
    request.tests = Some(Tests {
        assertions: assertions
            .iter()
            .enumerate()
            .map(|(id, stmt)| Assertion {
                id: id as u64,
                exec: stmt.span.slice(source).lines().map(String::from).collect(),
                description: String::new(),
            })
            .collect(),
    });

    Ok(request)
}

/// Resolves a request call's argument to an object-literal expression.
///
/// Inline object literals are used directly; an identifier is resolved
/// through the single declarator of that name in the test body. Anything
/// else, including an identifier with no object-literal declaration, is
/// rejected. No deeper resolution is attempted.
fn resolve_request_object<'a>(arg: &'a Expr, body: &'a [Stmt]) -> Result<&'a Expr, ParseError> {
    match arg {
        Expr::Object { .. } => Ok(arg),
        Expr::Ident { name } => {
            let inits: Vec<Option<&Expr>> = declarators(body)
                .into_iter()
                .filter(|(declared, _)| *declared == name.as_str())
                .map(|(_, init)| init)
                .collect();
            match inits.as_slice() {
                [Some(init @ Expr::Object { .. })] => Ok(init),
                _ => Err(ParseError::RequestNotObjectLiteral),
            }
        }
        _ => Err(ParseError::RequestNotObjectLiteral),
    }
}

/// Whether a statement is an assertion statement: the head of its
/// leftmost call chain is the assertion function.
fn is_assertion_stmt(stmt: &Stmt) -> bool {
    call_head_name(stmt) == Some(ASSERTION_FUNCTION_NAME)
}

/// Slices each statement's verbatim source and flattens the result into
/// lines.
fn stmts_to_lines(source: &str, stmts: &[Stmt]) -> Vec<String> {
    if stmts.is_empty() {
        return Vec::new();
    }
    stmts
        .iter()
        .map(|stmt| stmt.span.slice(source))
        .collect::<Vec<_>>()
        .join("\n")
        .lines()
        .map(String::from)
        .collect()
}
