//! Request data model.
//!
//! This module defines the structured form of a single request within a
//! test case: the schema-validated request fields plus the surrounding
//! scripts and assertions captured from source.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// HTTP request method.
///
/// The wire form is lowercase, matching the request schema's method enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    Get,
    /// HTTP POST method - submit data to create a resource
    Post,
    /// HTTP PUT method - replace a resource
    Put,
    /// HTTP PATCH method - partially modify a resource
    Patch,
    /// HTTP DELETE method - remove a resource
    Delete,
    /// HTTP HEAD method - retrieve headers only
    Head,
    /// HTTP CONNECT method - establish a tunnel to the server
    Connect,
    /// HTTP OPTIONS method - describe communication options
    Options,
    /// HTTP TRACE method - perform a message loop-back test
    Trace,
}

impl HttpMethod {
    /// Returns the lowercase string representation of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Connect => "connect",
            HttpMethod::Options => "options",
            HttpMethod::Trace => "trace",
        }
    }

    /// Parses a string into an `HttpMethod`, case-insensitively.
    ///
    /// Returns `None` when the string is not a recognized method.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "patch" => Some(HttpMethod::Patch),
            "delete" => Some(HttpMethod::Delete),
            "head" => Some(HttpMethod::Head),
            "connect" => Some(HttpMethod::Connect),
            "options" => Some(HttpMethod::Options),
            "trace" => Some(HttpMethod::Trace),
            _ => None,
        }
    }

    /// All methods accepted by the request schema, in schema order.
    pub fn all() -> &'static [&'static str] {
        &[
            "get", "post", "put", "patch", "delete", "head", "connect", "options", "trace",
        ]
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured API version/schema information attached to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiVersion {
    /// Minor API version, non-negative.
    #[serde(rename = "minorVersion")]
    pub minor_version: u64,

    /// Major API version, non-negative.
    #[serde(rename = "majorVersion")]
    pub major_version: u64,

    /// API type tag, e.g. the interface family the request targets.
    #[serde(rename = "type")]
    pub api_type: String,

    /// Whether the API responds asynchronously via callback.
    pub asynchronous: bool,
}

/// One line-oriented script block (pre-request or post-request code).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptBlock {
    /// Source lines, joined with newlines to reconstruct the script.
    pub exec: Vec<String>,
}

/// Scripts surrounding a request: code before the client call and code
/// between the call and the first assertion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scripts {
    /// Statements preceding the request within its segment.
    #[serde(rename = "preRequest", skip_serializing_if = "Option::is_none")]
    pub pre_request: Option<ScriptBlock>,

    /// Statements between the request and the first assertion.
    #[serde(rename = "postRequest", skip_serializing_if = "Option::is_none")]
    pub post_request: Option<ScriptBlock>,
}

/// A single assertion captured from the trailing assertion block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    /// Sequence index of the assertion within its request.
    pub id: u64,

    /// Verbatim source lines of the assertion statement.
    ///
    /// These may contain `{$...}` substitution markers; the generator
    /// re-encodes them into parseable form on emission.
    pub exec: Vec<String>,

    /// Free-text description, emitted as a leading comment when non-empty.
    #[serde(default)]
    pub description: String,
}

/// Assertions attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tests {
    /// Assertions in source order.
    pub assertions: Vec<Assertion>,
}

/// A single schema-validated request plus its captured scripts and tests.
///
/// The six request fields are all required by the schema; `scripts` and
/// `tests` are the surrounding captured code and may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The request path within the target API.
    #[serde(rename = "operationPath")]
    pub operation_path: String,

    /// HTTP method.
    pub method: HttpMethod,

    /// HTTP request headers.
    ///
    /// Stored ordered by key so serialization and generation are
    /// deterministic.
    pub headers: BTreeMap<String, serde_json::Value>,

    /// Path parameters, substituted into the operation path before a
    /// request is issued.
    pub params: BTreeMap<String, serde_json::Value>,

    /// API version information.
    #[serde(rename = "apiVersion")]
    pub api_version: ApiVersion,

    /// The request URL.
    pub url: String,

    /// Pre- and post-request scripts, when any were captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts: Option<Scripts>,

    /// Assertions, when any were captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<Tests>,
}
