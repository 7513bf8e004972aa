//! Error types for the splicing engine.

use mailsplice_mime::Defect;
use thiserror::Error;

/// The message does not have the shape an operation needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// The top-level message has no subparts.
    #[error("message is not multipart")]
    NotMultipart,

    /// No `multipart/alternative` part in scope.
    #[error("message has no multipart/alternative part")]
    NoAlternativePart,

    /// The alternative part has no direct child of the requested type.
    #[error("multipart/alternative part has no {0} representation")]
    TargetAbsent(String),

    /// No part of the requested type anywhere below the root.
    #[error("message has no {0} part")]
    NoMatchingPart(String),

    /// Child index beyond the root's children.
    #[error("part index {index} out of range, message has {len} subparts")]
    IndexOutOfRange {
        /// Requested zero-based index.
        index: usize,
        /// Number of direct children of the root.
        len: usize,
    },

    /// More than one wrapping `multipart/related` container.
    #[error("expected at most one multipart/related part, found {0}")]
    AmbiguousRelated(usize),

    /// Not exactly one `multipart/alternative` part.
    #[error("expected exactly one multipart/alternative part, found {0}")]
    AmbiguousAlternative(usize),
}

/// Errors that can occur while transforming a message.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrong invocation: arguments given, unknown mode or bad setting.
    #[error("usage error: {0}")]
    Usage(String),

    /// Required container, part or index is missing.
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),

    /// A node touched by the operation carries decoder defects.
    #[error("validation error: {node} has defects: {}", describe(.defects))]
    Validation {
        /// Which node failed validation.
        node: String,
        /// The defects found on it.
        defects: Vec<Defect>,
    },

    /// The HTML renderer failed.
    #[error("render error: {0}")]
    Render(String),

    /// The message could not be decoded or encoded.
    #[error("codec error: {0}")]
    Codec(#[from] mailsplice_mime::Error),
}

fn describe(defects: &[Defect]) -> String {
    defects
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
