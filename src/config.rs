//! Identifier conventions shared by the parser and the generator.
//!
//! Test scripts are written against a fixed convention: a single client
//! library binding, `it` test declarations, `expect` assertions, and the
//! `request`/`resp`/`prev` names used by generated code. Both conversion
//! directions read these names from here so they cannot drift apart.

/// Module name whose `require(...)` call marks the client binding.
pub const CLIENT_LIB_NAME: &str = "sync-client";

/// Identifier the generator binds the client library to.
///
/// The parser accepts any binding name; this one is only used when
/// emitting the import line of generated scripts.
pub const CLIENT_IDENTIFIER: &str = "syncClient";

/// Function name of a test-case declaration.
pub const TEST_FUNCTION_NAME: &str = "it";

/// Function name of an assertion call.
pub const ASSERTION_FUNCTION_NAME: &str = "expect";

/// Name bound to the request object in generated code, suffixed with the
/// request ordinal before emission.
pub const REQUEST_IDENTIFIER: &str = "request";

/// Name bound to the client response in generated code, suffixed with the
/// request ordinal before emission.
pub const RESPONSE_IDENTIFIER: &str = "resp";

/// Name of the shared structure recording previous responses by ordinal.
pub const PREV_IDENTIFIER: &str = "prev";
