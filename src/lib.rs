//! Test script conversion library.
//!
//! This crate converts API test cases between two representations: a
//! constrained, script-like textual form written against a fixed
//! request/assertion convention, and the structured collection format
//! consumed and produced by test-authoring tools.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - **models**: the collection data model (collections, test cases,
//!   requests, scripts, assertions)
//! - **script**: the script-language layer — lexer, syntax tree, parser,
//!   deterministic printer, tree queries, and identifier renaming
//! - **parser**: the script-to-collection direction, including request
//!   segmentation and schema validation
//! - **generator**: the collection-to-script direction, including the
//!   substitution-marker codec
//! - **config**: the identifier conventions both directions share
//!
//! # Conversion directions
//!
//! [`parser::parse_source`] validates a script against the narrow
//! accepted grammar and segments each test body into one request segment
//! per client call. [`generator::generate`] performs the inverse mapping,
//! renaming request-scoped bindings per ordinal to avoid collisions and
//! re-encoding embedded `{$...}` substitution markers so the output
//! parses cleanly.
//!
//! Both directions are pure, synchronous functions over in-memory
//! values; identical input always produces byte-identical output. File
//! loading, HTTP delivery, and CLI concerns live with the callers of
//! this crate.
//!
//! # Example
//!
//! ```
//! use test_script::{generate, parse_source};
//!
//! let source = r#"
//! const cli = require('sync-client')
//! it('gets a party', () => {
//!   const fspiopRequest = {
//!     operationPath: '/parties/MSISDN/12345',
//!     method: 'get',
//!     headers: {},
//!     params: {},
//!     apiVersion: { minorVersion: 1, majorVersion: 0, type: 'fspiop', asynchronous: false },
//!     url: 'http://localhost:3000'
//!   }
//!   const resp = cli(fspiopRequest)
//!   expect(resp)
//! })
//! "#;
//!
//! let collection = parse_source("parties.test.js", source).unwrap();
//! let regenerated = generate(&collection).unwrap();
//! assert!(regenerated.contains("const resp0 = syncClient(request0);"));
//! ```

pub mod config;
pub mod generator;
pub mod models;
pub mod parser;
pub mod script;

pub use generator::error::GenerateError;
pub use generator::generate;
pub use models::{
    ApiVersion, Assertion, Collection, HttpMethod, Request, ScriptBlock, Scripts, TestCase, Tests,
};
pub use parser::error::ParseError;
pub use parser::parse_source;
