//! Error types for collection-to-script generation.

use crate::script::SyntaxError;
use std::fmt;

/// Errors that can occur while generating script text from a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// An embedded script line (pre/post-request code, an assertion, or a
    /// substitution marker's expression) is not in the accepted grammar.
    Script(SyntaxError),

    /// Two distinct substitution markers on one line produced the same
    /// digest. Astronomically unlikely, but never silently tolerated.
    DigestCollision {
        /// The colliding digest value.
        digest: String,
    },

    /// A substitution marker appeared outside any string literal, so its
    /// digest could not be restored. Emitting the digest would corrupt
    /// the output, so generation fails instead.
    UnrestoredMarker {
        /// The original marker text.
        marker: String,
    },
}

impl From<SyntaxError> for GenerateError {
    fn from(err: SyntaxError) -> Self {
        GenerateError::Script(err)
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::Script(err) => {
                write!(f, "Embedded script is not parseable: {err}")
            }
            GenerateError::DigestCollision { digest } => {
                write!(
                    f,
                    "Substitution markers on one line collided on digest {digest}"
                )
            }
            GenerateError::UnrestoredMarker { marker } => {
                write!(
                    f,
                    "Substitution marker {marker} appears outside a string literal and cannot \
                     be re-encoded"
                )
            }
        }
    }
}

impl std::error::Error for GenerateError {}
