//! Collection data model.
//!
//! This module defines the structured representation of test collections:
//! the JSON-compatible format produced by the parser and consumed by the
//! generator. All types are immutable value objects; conversion never
//! mutates an existing collection.

pub mod collection;
pub mod request;

pub use collection::{Collection, TestCase};
pub use request::{ApiVersion, Assertion, HttpMethod, Request, ScriptBlock, Scripts, Tests};
