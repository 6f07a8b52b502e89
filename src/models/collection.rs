//! Top-level collection structure.

use crate::models::request::Request;
use serde::{Deserialize, Serialize};

/// A named, ordered set of test cases.
///
/// This is the root of the structured format: the parser produces one
/// `Collection` per source file, and the generator consumes one to emit a
/// source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection name, typically the source file path it was parsed from.
    pub name: String,

    /// Test cases in source order.
    pub test_cases: Vec<TestCase>,
}

/// A single test case: one test declaration in script form.
///
/// Invariant: contains at least one request. The parser enforces this and
/// fails with a grammar error otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Test name, the first argument of the test declaration.
    pub name: String,

    /// Requests in source order, one per request segment.
    pub requests: Vec<Request>,
}
