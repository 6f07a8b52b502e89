//! Integration tests for the full conversion cycle.
//!
//! These tests drive the public API end to end: realistic scripts through
//! the parser, externally-supplied collections through the generator, and
//! generated text back through the parser again.

use test_script::{generate, parse_source, Collection, HttpMethod, ParseError};

const TRANSFER_SUITE: &str = r#"
const cli = require('sync-client')

describe('Transfers', () => {
  it('quotes then transfers', () => {
    const quoteRequest = {
      operationPath: '/quotes',
      method: 'post',
      headers: {
        'content-type': 'application/vnd.interoperability.quotes+json;version=1.0',
        'fspiop-source': 'payerfsp'
      },
      params: {},
      apiVersion: { minorVersion: 0, majorVersion: 1, type: 'fspiop', asynchronous: true },
      url: 'http://localhost:3000'
    }
    const resp1 = cli(quoteRequest)
    expect(resp1.status).to.equal(202)
    expect(resp1.body.quoteId).to.not.equal(null)
    const transferRequest = {
      operationPath: '/transfers',
      method: 'post',
      headers: { 'fspiop-source': 'payerfsp' },
      params: {},
      apiVersion: { minorVersion: 0, majorVersion: 1, type: 'fspiop', asynchronous: true },
      url: 'http://localhost:3000'
    }
    const resp2 = cli(transferRequest)
    console.log(resp2.status)
    expect(resp2.status).to.equal(202)
  })

  it('looks up a party', () => {
    const resp = cli({
      operationPath: '/parties/MSISDN/27713803912',
      method: 'get',
      headers: {},
      params: { ID: '27713803912' },
      apiVersion: { minorVersion: 1, majorVersion: 1, type: 'fspiop', asynchronous: false },
      url: 'http://localhost:3000'
    })
    expect(resp.body).to.not.equal(null)
  })
})
"#;

#[test]
fn test_parse_realistic_transfer_suite() {
    let collection = parse_source("transfers.test.js", TRANSFER_SUITE).unwrap();

    assert_eq!(collection.name, "transfers.test.js");
    assert_eq!(collection.test_cases.len(), 2);

    let transfer_case = &collection.test_cases[0];
    assert_eq!(transfer_case.name, "quotes then transfers");
    assert_eq!(transfer_case.requests.len(), 2);

    let quote = &transfer_case.requests[0];
    assert_eq!(quote.operation_path, "/quotes");
    assert_eq!(quote.method, HttpMethod::Post);
    assert_eq!(
        quote.headers["fspiop-source"],
        serde_json::json!("payerfsp")
    );
    assert!(quote.api_version.asynchronous);
    assert_eq!(quote.tests.as_ref().unwrap().assertions.len(), 2);

    // the second segment starts after the first segment's assertions,
    // so the transfer declaration lands in the transfer's pre-request
    let transfer = &transfer_case.requests[1];
    let scripts = transfer.scripts.as_ref().unwrap();
    let pre = &scripts.pre_request.as_ref().unwrap().exec;
    assert!(pre[0].trim_start().starts_with("const transferRequest"));
    assert_eq!(
        scripts.post_request.as_ref().unwrap().exec,
        vec!["console.log(resp2.status)".to_string()]
    );

    let party_case = &collection.test_cases[1];
    assert_eq!(party_case.requests.len(), 1);
    assert_eq!(party_case.requests[0].method, HttpMethod::Get);
    assert_eq!(
        party_case.requests[0].params["ID"],
        serde_json::json!("27713803912")
    );
}

#[test]
fn test_collection_serializes_to_published_shape() {
    let collection = parse_source("transfers.test.js", TRANSFER_SUITE).unwrap();
    let json = serde_json::to_value(&collection).unwrap();

    assert_eq!(json["name"], "transfers.test.js");
    let request = &json["test_cases"][0]["requests"][0];
    assert_eq!(request["operationPath"], "/quotes");
    assert_eq!(request["method"], "post");
    assert_eq!(request["apiVersion"]["majorVersion"], 1);
    assert_eq!(request["apiVersion"]["type"], "fspiop");
    assert_eq!(request["apiVersion"]["asynchronous"], true);
    assert_eq!(request["url"], "http://localhost:3000");

    // and the shape loads back unchanged
    let reloaded: Collection = serde_json::from_value(json).unwrap();
    assert_eq!(reloaded, collection);
}

#[test]
fn test_generate_from_external_collection_with_markers() {
    let json = r#"{
        "name": "callback-suite",
        "test_cases": [{
            "name": "routes the callback",
            "requests": [{
                "operationPath": "/transfers",
                "method": "post",
                "headers": { "fspiop-source": "payerfsp" },
                "params": {},
                "apiVersion": {
                    "minorVersion": 1,
                    "majorVersion": 0,
                    "type": "fspiop",
                    "asynchronous": true
                },
                "url": "http://localhost:3000",
                "tests": {
                    "assertions": [
                        {
                            "id": 0,
                            "exec": ["expect(callback.headers['fspiop-destination']).to.equal('{$request.headers['FSPIOP-Source']}')"],
                            "description": "destination mirrors source"
                        },
                        {
                            "id": 1,
                            "exec": ["expect(callback.body.transferState).to.equal('{$prev.2.callback.body.transferState}')"]
                        }
                    ]
                }
            }]
        }]
    }"#;

    let collection: Collection = serde_json::from_str(json).unwrap();
    let text = generate(&collection).unwrap();

    assert!(text.starts_with("const syncClient = require(\"sync-client\");"));
    assert!(text.contains("it(\"routes the callback\", () => {"));
    assert!(text.contains("const resp0 = syncClient(request0);"));
    // the marker references the request object under its renamed binding
    assert!(text.contains("to.equal(`${request0.headers[\"FSPIOP-Source\"]}`)"));
    assert!(text.contains("to.equal(`${prev[2].callback.body.transferState}`)"));
    assert!(text.contains("// destination mirrors source"));

    // generated text re-enters the accepted grammar
    let reparsed = parse_source("callback-suite", &text).unwrap();
    assert_eq!(reparsed.test_cases[0].requests.len(), 1);
    assert_eq!(
        reparsed.test_cases[0].requests[0]
            .tests
            .as_ref()
            .unwrap()
            .assertions
            .len(),
        2
    );
}

#[test]
fn test_full_cycle_preserves_request_data() {
    let collection = parse_source("transfers.test.js", TRANSFER_SUITE).unwrap();
    let text = generate(&collection).unwrap();
    assert_eq!(text, generate(&collection).unwrap());

    let reparsed = parse_source("transfers.test.js", &text).unwrap();
    assert_eq!(reparsed.test_cases.len(), collection.test_cases.len());
    for (reparsed_case, case) in reparsed.test_cases.iter().zip(&collection.test_cases) {
        assert_eq!(reparsed_case.name, case.name);
        assert_eq!(reparsed_case.requests.len(), case.requests.len());
        for (reparsed_request, request) in reparsed_case.requests.iter().zip(&case.requests) {
            assert_eq!(reparsed_request.operation_path, request.operation_path);
            assert_eq!(reparsed_request.method, request.method);
            assert_eq!(reparsed_request.headers, request.headers);
            assert_eq!(reparsed_request.params, request.params);
            assert_eq!(reparsed_request.api_version, request.api_version);
            assert_eq!(reparsed_request.url, request.url);
        }
    }
}

#[test]
fn test_grammar_violations_surface_as_user_errors() {
    let err = parse_source("whatever", "it('starts', () => {})").unwrap_err();
    assert!(!err.is_internal());
    assert!(format!("{err}").contains("exactly once"));

    let interleaved = r#"
const cli = require('sync-client')
it('starts', () => {
  const resp = cli({
    operationPath: '/quotes',
    method: 'post',
    headers: {},
    params: {},
    apiVersion: { minorVersion: 0, majorVersion: 1, type: 'fspiop', asynchronous: true },
    url: 'http://localhost:3000'
  })
  expect(resp.status).to.equal(202)
  cleanup()
  expect(resp.body).to.not.equal(null)
})
"#;
    let err = parse_source("whatever", interleaved).unwrap_err();
    assert_eq!(err, ParseError::CodeAfterAssertions);
    assert!(!err.is_internal());
}

#[test]
fn test_schema_violations_list_every_problem() {
    let source = r#"
const cli = require('sync-client')
it('starts', () => {
  const resp = cli({ method: 'brew', headers: {} })
  expect(resp)
})
"#;
    let err = parse_source("whatever", source).unwrap_err();
    let message = format!("{err}");
    for expected in [
        "should have required property 'operationPath'",
        "should have required property 'params'",
        "should have required property 'apiVersion'",
        "should have required property 'url'",
        "method should be equal to one of the allowed values",
    ] {
        assert!(message.contains(expected), "missing {expected:?} in: {message}");
    }
}
