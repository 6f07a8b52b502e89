//! Request segmentation.
//!
//! A test body is an unstructured statement sequence containing one or
//! more client request calls and, usually, assertion calls. Segmentation
//! partitions the body into one contiguous range per request: each range
//! starts one past the last assertion statement preceding its request
//! statement (or at the top of the body), and ends where the next
//! request's range starts (or at the end of the body). The result is a
//! half-open, non-overlapping partition in source order.

use crate::script::ast::Stmt;
use crate::script::query::{calls_to, stmt_contains_call_to};

/// One request's statement range within a test body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Index of the top-level statement containing the request call.
    pub request_index: usize,

    /// First statement index of the segment (inclusive).
    pub start: usize,

    /// One past the last statement index of the segment.
    pub end: usize,
}

/// Partitions `body` into request segments.
///
/// `client_name` identifies request calls, `assertion_name` identifies
/// the assertion boundaries. One segment is produced per request *call*;
/// a statement containing two request calls therefore yields two
/// identical segments, which the per-segment invariant check downstream
/// reports as an internal error rather than producing bad data.
pub fn segment_test_body(body: &[Stmt], client_name: &str, assertion_name: &str) -> Vec<Segment> {
    // Top-level statement index for every request call, in source order.
    let mut request_indices = Vec::new();
    for (index, stmt) in body.iter().enumerate() {
        let calls = calls_to(std::slice::from_ref(stmt), client_name).len();
        for _ in 0..calls {
            request_indices.push(index);
        }
    }

    // Top-level statements containing at least one assertion call.
    let assertion_indices: Vec<usize> = body
        .iter()
        .enumerate()
        .filter(|(_, stmt)| stmt_contains_call_to(stmt, assertion_name))
        .map(|(index, _)| index)
        .collect();

    // Walk back from each request to the nearest preceding assertion
    // statement; one past it starts the segment.
    let starts: Vec<usize> = request_indices
        .iter()
        .map(|&request_index| {
            assertion_indices
                .iter()
                .rev()
                .find(|&&assertion_index| assertion_index < request_index)
                .map(|&assertion_index| assertion_index + 1)
                .unwrap_or(0)
        })
        .collect();

    request_indices
        .iter()
        .zip(&starts)
        .enumerate()
        .map(|(i, (request_index, start))| Segment {
            request_index: *request_index,
            start: *start,
            end: starts.get(i + 1).copied().unwrap_or(body.len()),
        })
        .collect()
}
