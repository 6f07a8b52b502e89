//! Error types for script-to-collection parsing.
//!
//! Failures split into three families: grammar violations and schema
//! failures the test author can fix, and internal invariant violations
//! that indicate a defect in the converter itself. The latter are
//! distinguishable via [`ParseError::is_internal`] and their messages ask
//! for a defect report instead of an input fix.

use crate::config::CLIENT_LIB_NAME;
use crate::script::SyntaxError;
use std::fmt;

/// Errors that can occur while parsing a test script into a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The source is not in the accepted script grammar.
    Syntax(SyntaxError),

    /// The designated client import did not appear exactly once.
    ImportCount {
        /// How many `require` calls for the client library were found.
        count: usize,
    },

    /// The client import exists but is not bound to a variable at module
    /// scope.
    ImportNotBound,

    /// The client binding is re-declared somewhere in the file.
    ShadowedBinding {
        /// The client binding's name.
        name: String,
    },

    /// A test declaration does not have the `(<string>, <zero-argument
    /// function>)` shape.
    MalformedTestDeclaration,

    /// A test body contains no client request calls.
    NoRequests {
        /// The client binding's name, for the error message.
        client_name: String,
    },

    /// A request call's argument is not (and does not resolve to) an
    /// object literal.
    RequestNotObjectLiteral,

    /// A nested value inside the request object is not a literal.
    UnhandledValue {
        /// Printed form of the offending expression.
        summary: String,
    },

    /// The request object failed schema validation.
    ///
    /// Carries every problem found, not just the first.
    InvalidRequestObject { errors: Vec<String> },

    /// A non-assertion statement appeared after assertions began.
    CodeAfterAssertions,

    /// An internal invariant was violated. Not fixable by editing the
    /// input; indicates a converter defect.
    Internal(InternalError),
}

/// Invariants that hold by construction of the segmenter. A violation is
/// a converter defect, never a user error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    /// A segment contained other than exactly one client request call.
    SegmentRequestCount { count: usize },

    /// A client request call resolved to other than exactly one argument
    /// expression.
    RequestArgumentCount { count: usize },

    /// A schema-validated request object failed model conversion.
    ModelConversion { detail: String },
}

impl ParseError {
    /// Whether this error is an internal invariant violation rather than
    /// a problem with the input.
    pub fn is_internal(&self) -> bool {
        matches!(self, ParseError::Internal(_))
    }
}

impl From<SyntaxError> for ParseError {
    fn from(err: SyntaxError) -> Self {
        ParseError::Syntax(err)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Syntax(err) => write!(f, "Syntax error: {err}"),
            ParseError::ImportCount { count } => {
                write!(
                    f,
                    "Expecting require(\"{CLIENT_LIB_NAME}\") exactly once per file, found {count}"
                )
            }
            ParseError::ImportNotBound => {
                write!(
                    f,
                    "Expected the require(\"{CLIENT_LIB_NAME}\") result to be bound to a variable at module scope"
                )
            }
            ParseError::ShadowedBinding { name } => {
                write!(
                    f,
                    "Variable '{name}' cannot be shadowed or reused, as it is required to \
                     identify calls to the request client. You may rename the variable to which \
                     you assigned require(\"{CLIENT_LIB_NAME}\") if you like."
                )
            }
            ParseError::MalformedTestDeclaration => {
                write!(
                    f,
                    "Expected a test declaration to be a call with a string name and a \
                     zero-argument function body"
                )
            }
            ParseError::NoRequests { client_name } => {
                write!(
                    f,
                    "Expected at least one request (\"{client_name}\" function call) per test"
                )
            }
            ParseError::RequestNotObjectLiteral => {
                write!(f, "Expected request client argument to be an object literal")
            }
            ParseError::UnhandledValue { summary } => {
                write!(
                    f,
                    "Unhandled value type for '{summary}' when validating the request object"
                )
            }
            ParseError::InvalidRequestObject { errors } => {
                write!(f, "Request object invalid. Errors:")?;
                for error in errors {
                    write!(f, "\n- {error}")?;
                }
                Ok(())
            }
            ParseError::CodeAfterAssertions => {
                write!(
                    f,
                    "Expected no code except assertions between the first assertion and the end \
                     of the request"
                )
            }
            ParseError::Internal(err) => write!(f, "{err}"),
        }
    }
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detail = match self {
            InternalError::SegmentRequestCount { count } => {
                format!("Expected exactly one client request per request segment, found {count}.")
            }
            InternalError::RequestArgumentCount { count } => {
                format!("Expected exactly one argument per client request, found {count}.")
            }
            InternalError::ModelConversion { detail } => {
                format!("Validated request object failed model conversion: {detail}.")
            }
        };
        write!(
            f,
            "{detail} This is an internal logic error, not a problem with your test; please \
             file a defect report including the source file that produced it."
        )
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::ImportCount { count: 0 };
        let msg = format!("{err}");
        assert!(msg.contains("Expecting require(\"sync-client\") exactly once per file"));

        let err = ParseError::ShadowedBinding {
            name: "cli".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.starts_with("Variable 'cli' cannot be shadowed or reused"));
    }

    #[test]
    fn test_schema_errors_are_all_listed() {
        let err = ParseError::InvalidRequestObject {
            errors: vec!["first".to_string(), "second".to_string()],
        };
        let msg = format!("{err}");
        assert!(msg.contains("\n- first"));
        assert!(msg.contains("\n- second"));
    }

    #[test]
    fn test_internal_errors_are_distinguishable() {
        let err = ParseError::Internal(InternalError::SegmentRequestCount { count: 2 });
        assert!(err.is_internal());
        assert!(format!("{err}").contains("file a defect report"));

        let err = ParseError::NoRequests {
            client_name: "cli".to_string(),
        };
        assert!(!err.is_internal());
    }
}
