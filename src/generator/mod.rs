//! Collection-to-script generator.
//!
//! The inverse of the parser: emits a script whose structure follows the
//! fixed convention — a client import, one test declaration per test
//! case, and per request (in order) the pre-request script, the request
//! object declaration, the client invocation, a `prev[n]` recording
//! statement, the post-request script, and the re-encoded assertions.
//! Because every request in a test shares one body, the `request`/`resp`
//! bindings are renamed with the request's ordinal before concatenation
//! so a later request can never collide with or shadow an earlier one.

pub mod codec;
pub mod error;

use crate::config::{
    CLIENT_IDENTIFIER, CLIENT_LIB_NAME, PREV_IDENTIFIER, REQUEST_IDENTIFIER, RESPONSE_IDENTIFIER,
    TEST_FUNCTION_NAME,
};
use crate::models::{Collection, Request, ScriptBlock, TestCase};
use crate::script::ast::{ArrowBody, DeclKind, Expr, Property, Stmt, StmtKind};
use crate::script::parser::parse_program;
use crate::script::printer::print_program;
use crate::script::rename::rename_identifiers;
use codec::encode_markers;
use error::GenerateError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Generates script text from a collection.
///
/// Output is deterministic: the same collection value always produces
/// byte-identical text, and the text re-enters the parser's accepted
/// grammar (the emitted import line binds the client under
/// [`CLIENT_IDENTIFIER`]).
pub fn generate(collection: &Collection) -> Result<String, GenerateError> {
    let mut program = vec![client_import()];
    for test_case in &collection.test_cases {
        program.push(build_test_case(test_case)?);
    }
    Ok(print_program(&program))
}

/// `const syncClient = require("sync-client");`
fn client_import() -> Stmt {
    Stmt::synthetic(StmtKind::VarDecl {
        kind: DeclKind::Const,
        name: CLIENT_IDENTIFIER.to_string(),
        init: Some(Expr::Call {
            callee: Box::new(Expr::ident("require")),
            args: vec![Expr::str(CLIENT_LIB_NAME)],
        }),
    })
}

fn build_test_case(test_case: &TestCase) -> Result<Stmt, GenerateError> {
    let mut body = Vec::new();
    for (ordinal, request) in test_case.requests.iter().enumerate() {
        body.extend(build_request_block(request, ordinal)?);
    }
    Ok(Stmt::synthetic(StmtKind::Expr {
        expr: Expr::Call {
            callee: Box::new(Expr::ident(TEST_FUNCTION_NAME)),
            args: vec![
                Expr::str(test_case.name.clone()),
                Expr::Arrow {
                    is_async: false,
                    params: Vec::new(),
                    body: ArrowBody::Block(body),
                },
            ],
        },
    }))
}

fn build_request_block(request: &Request, ordinal: usize) -> Result<Vec<Stmt>, GenerateError> {
    let scripts = request.scripts.as_ref();
    let mut block = Vec::new();

    block.extend(parse_script(scripts.and_then(|s| s.pre_request.as_ref()))?);
    block.push(request_declaration(request));
    block.push(client_invocation());
    block.push(prev_assignment(ordinal));
    block.extend(parse_script(scripts.and_then(|s| s.post_request.as_ref()))?);

    if let Some(tests) = &request.tests {
        for assertion in &tests.assertions {
            let encoded = assertion
                .exec
                .iter()
                .map(|line| encode_markers(line))
                .collect::<Result<Vec<_>, _>>()?;
            let mut stmts = parse_program(&encoded.join("\n"))?;
            if !assertion.description.is_empty() {
                if let Some(first) = stmts.first_mut() {
                    first.comment = Some(assertion.description.clone());
                }
            }
            block.extend(stmts);
        }
    }

    rename_identifiers(
        &mut block,
        RESPONSE_IDENTIFIER,
        &format!("{RESPONSE_IDENTIFIER}{ordinal}"),
    );
    rename_identifiers(
        &mut block,
        REQUEST_IDENTIFIER,
        &format!("{REQUEST_IDENTIFIER}{ordinal}"),
    );
    Ok(block)
}

/// Parses a stored script block back into statements.
fn parse_script(block: Option<&ScriptBlock>) -> Result<Vec<Stmt>, GenerateError> {
    match block {
        Some(script) if !script.exec.is_empty() => Ok(parse_program(&script.exec.join("\n"))?),
        _ => Ok(Vec::new()),
    }
}

/// `const request = { ...schema fields in order... };`
fn request_declaration(request: &Request) -> Stmt {
    let api_version = &request.api_version;
    let properties = vec![
        prop("operationPath", Expr::str(request.operation_path.clone())),
        prop("method", Expr::str(request.method.as_str())),
        prop("headers", map_expression(&request.headers)),
        prop("params", map_expression(&request.params)),
        prop(
            "apiVersion",
            Expr::Object {
                properties: vec![
                    prop(
                        "minorVersion",
                        Expr::num(api_version.minor_version.to_string()),
                    ),
                    prop(
                        "majorVersion",
                        Expr::num(api_version.major_version.to_string()),
                    ),
                    prop("type", Expr::str(api_version.api_type.clone())),
                    prop(
                        "asynchronous",
                        Expr::Bool {
                            value: api_version.asynchronous,
                        },
                    ),
                ],
            },
        ),
        prop("url", Expr::str(request.url.clone())),
    ];
    Stmt::synthetic(StmtKind::VarDecl {
        kind: DeclKind::Const,
        name: REQUEST_IDENTIFIER.to_string(),
        init: Some(Expr::Object { properties }),
    })
}

/// `const resp = syncClient(request);`
fn client_invocation() -> Stmt {
    Stmt::synthetic(StmtKind::VarDecl {
        kind: DeclKind::Const,
        name: RESPONSE_IDENTIFIER.to_string(),
        init: Some(Expr::Call {
            callee: Box::new(Expr::ident(CLIENT_IDENTIFIER)),
            args: vec![Expr::ident(REQUEST_IDENTIFIER)],
        }),
    })
}

/// `prev[<ordinal>] = { callback: resp };`
fn prev_assignment(ordinal: usize) -> Stmt {
    Stmt::synthetic(StmtKind::Expr {
        expr: Expr::Assign {
            op: "=",
            target: Box::new(Expr::Member {
                object: Box::new(Expr::ident(PREV_IDENTIFIER)),
                property: Box::new(Expr::num(ordinal.to_string())),
                computed: true,
            }),
            value: Box::new(Expr::Object {
                properties: vec![prop("callback", Expr::ident(RESPONSE_IDENTIFIER))],
            }),
        },
    })
}

fn prop(name: &str, value: Expr) -> Property {
    Property {
        key: Expr::ident(name),
        value,
        computed: false,
        shorthand: false,
    }
}

/// Builds an object literal from a string-keyed map, keys quoted the way
/// header names need to be.
fn map_expression(map: &BTreeMap<String, Value>) -> Expr {
    Expr::Object {
        properties: map
            .iter()
            .map(|(key, value)| Property {
                key: Expr::str(key.clone()),
                value: value_expression(value),
                computed: false,
                shorthand: false,
            })
            .collect(),
    }
}

fn value_expression(value: &Value) -> Expr {
    match value {
        Value::Null => Expr::Null,
        Value::Bool(b) => Expr::Bool { value: *b },
        Value::Number(n) => Expr::num(n.to_string()),
        Value::String(s) => Expr::str(s.clone()),
        Value::Array(elements) => Expr::Array {
            elements: elements.iter().map(value_expression).collect(),
        },
        Value::Object(map) => Expr::Object {
            properties: map
                .iter()
                .map(|(key, value)| Property {
                    key: Expr::str(key.clone()),
                    value: value_expression(value),
                    computed: false,
                    shorthand: false,
                })
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApiVersion, Assertion, HttpMethod, Scripts, TestCase, Tests};
    use crate::parser::parse_source;
    use proptest::prelude::*;

    fn minimal_request() -> Request {
        Request {
            operation_path: "whatever".to_string(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            params: BTreeMap::new(),
            api_version: ApiVersion {
                minor_version: 1,
                major_version: 0,
                api_type: "fspiop".to_string(),
                asynchronous: false,
            },
            url: "whatever".to_string(),
            scripts: None,
            tests: None,
        }
    }

    fn collection(requests: Vec<Request>) -> Collection {
        Collection {
            name: "suite".to_string(),
            test_cases: vec![TestCase {
                name: "starts".to_string(),
                requests,
            }],
        }
    }

    #[test]
    fn test_generate_minimal_request_block() {
        let text = generate(&collection(vec![minimal_request()])).unwrap();
        let expected = "\
const syncClient = require(\"sync-client\");
it(\"starts\", () => {
  const request0 = {
    operationPath: \"whatever\",
    method: \"get\",
    headers: {},
    params: {},
    apiVersion: {
      minorVersion: 1,
      majorVersion: 0,
      type: \"fspiop\",
      asynchronous: false
    },
    url: \"whatever\"
  };
  const resp0 = syncClient(request0);
  prev[0] = {
    callback: resp0
  };
});
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_generate_is_deterministic() {
        let mut request = minimal_request();
        request
            .headers
            .insert("content-type".to_string(), "application/json".into());
        request
            .headers
            .insert("accept".to_string(), "application/json".into());
        let collection = collection(vec![request]);
        assert_eq!(generate(&collection).unwrap(), generate(&collection).unwrap());
    }

    #[test]
    fn test_generate_sorts_headers_and_quotes_keys() {
        let mut request = minimal_request();
        request
            .headers
            .insert("fspiop-source".to_string(), "payerfsp".into());
        request.headers.insert("accept".to_string(), "*/*".into());
        let text = generate(&collection(vec![request])).unwrap();
        let accept = text.find("\"accept\": \"*/*\"").unwrap();
        let source = text.find("\"fspiop-source\": \"payerfsp\"").unwrap();
        assert!(accept < source);
    }

    #[test]
    fn test_generate_renames_bindings_per_ordinal() {
        let text = generate(&collection(vec![minimal_request(), minimal_request()])).unwrap();
        assert!(text.contains("const request0 = {"));
        assert!(text.contains("const resp0 = syncClient(request0);"));
        assert!(text.contains("prev[0] = {"));
        assert!(text.contains("const request1 = {"));
        assert!(text.contains("const resp1 = syncClient(request1);"));
        assert!(text.contains("prev[1] = {"));
        // the un-suffixed names never leak into the output
        assert!(!text.contains("syncClient(request)"));
        assert!(!text.contains("const resp ="));
    }

    #[test]
    fn test_generate_scripts_and_assertions_in_order() {
        let mut request = minimal_request();
        request.scripts = Some(Scripts {
            pre_request: Some(ScriptBlock {
                exec: vec!["const token = login()".to_string()],
            }),
            post_request: Some(ScriptBlock {
                exec: vec!["console.log(resp.body)".to_string()],
            }),
        });
        request.tests = Some(Tests {
            assertions: vec![Assertion {
                id: 0,
                exec: vec!["expect(resp.status).to.equal(202)".to_string()],
                description: "status accepted".to_string(),
            }],
        });
        let text = generate(&collection(vec![request])).unwrap();

        let pre = text.find("const token = login();").unwrap();
        let invocation = text.find("const resp0 = syncClient(request0);").unwrap();
        let post = text.find("console.log(resp0.body);").unwrap();
        let comment = text.find("// status accepted").unwrap();
        let assertion = text.find("expect(resp0.status).to.equal(202);").unwrap();
        assert!(pre < invocation);
        assert!(invocation < post);
        assert!(post < comment);
        assert!(comment < assertion);
    }

    #[test]
    fn test_generate_expands_shorthand_when_renaming() {
        let mut request = minimal_request();
        request.scripts = Some(Scripts {
            pre_request: None,
            post_request: Some(ScriptBlock {
                exec: vec!["console.log({ resp })".to_string()],
            }),
        });
        let text = generate(&collection(vec![request])).unwrap();
        // the key survives; only the value identifier is renamed
        assert!(text.contains("resp: resp0"));
        assert!(!text.contains("{ resp0 }"));
    }

    #[test]
    fn test_generate_encodes_markers_in_assertions() {
        let mut request = minimal_request();
        request.tests = Some(Tests {
            assertions: vec![Assertion {
                id: 0,
                exec: vec![
                    "expect(callback.headers['fspiop-destination']).to.equal('{$request.headers['FSPIOP-Source']}')"
                        .to_string(),
                ],
                description: String::new(),
            }],
        });
        let text = generate(&collection(vec![request])).unwrap();
        // the marker is re-encoded and the request reference picks up the
        // request's ordinal
        assert!(text.contains("to.equal(`${request0.headers[\"FSPIOP-Source\"]}`)"));
    }

    #[test]
    fn test_generated_output_reparses_and_preserves_requests() {
        let source = [
            "const cli = require('sync-client')",
            "it('transfers', () => {",
            "  const quoteRequest = { operationPath: '/quotes', method: 'post', headers: { \
             'content-type': 'application/json' }, params: { ID: '1234' }, apiVersion: { \
             minorVersion: 1, majorVersion: 0, type: 'fspiop', asynchronous: true }, url: \
             'http://localhost:3000' }",
            "  const resp1 = cli(quoteRequest)",
            "  expect(resp1.status).to.equal(202)",
            "  const transferRequest = { operationPath: '/transfers', method: 'post', headers: \
             {}, params: {}, apiVersion: { minorVersion: 1, majorVersion: 0, type: 'fspiop', \
             asynchronous: true }, url: 'http://localhost:3000' }",
            "  const resp2 = cli(transferRequest)",
            "  expect(resp2.status).to.equal(202)",
            "})",
        ]
        .join("\n");

        let parsed = parse_source("suite.js", &source).unwrap();
        let text = generate(&parsed).unwrap();
        let reparsed = parse_source("suite.js", &text).unwrap();

        assert_eq!(reparsed.test_cases.len(), 1);
        let original_requests = &parsed.test_cases[0].requests;
        let requests = &reparsed.test_cases[0].requests;
        assert_eq!(requests.len(), original_requests.len());
        for (request, original) in requests.iter().zip(original_requests) {
            assert_eq!(request.operation_path, original.operation_path);
            assert_eq!(request.method, original.method);
            assert_eq!(request.headers, original.headers);
            assert_eq!(request.params, original.params);
            assert_eq!(request.api_version, original.api_version);
            assert_eq!(request.url, original.url);
            assert_eq!(
                request.tests.as_ref().unwrap().assertions.len(),
                original.tests.as_ref().unwrap().assertions.len()
            );
        }
    }

    proptest! {
        #[test]
        fn prop_generate_is_deterministic_and_reparses(
            path in "/[a-z/]{1,20}",
            url in "http://[a-z]{1,10}",
            header in "[a-z][a-z0-9-]{0,11}",
            value in "[a-zA-Z0-9 ]{0,12}",
        ) {
            let mut request = minimal_request();
            request.operation_path = path;
            request.url = url;
            request.headers.insert(header, Value::String(value));
            let collection = collection(vec![request]);
            let text = generate(&collection).unwrap();
            prop_assert_eq!(&text, &generate(&collection).unwrap());
            prop_assert!(parse_source("suite", &text).is_ok());
        }
    }

    #[test]
    fn test_generate_from_reparsed_collection_is_deterministic() {
        let source = {
            let mut request = minimal_request();
            request.tests = Some(Tests {
                assertions: vec![Assertion {
                    id: 0,
                    exec: vec!["expect(resp.status).to.equal(200)".to_string()],
                    description: String::new(),
                }],
            });
            collection(vec![request])
        };
        let first = generate(&source).unwrap();
        let reparsed = parse_source("suite", &first).unwrap();
        assert_eq!(generate(&reparsed).unwrap(), generate(&reparsed).unwrap());
    }
}
