//! Structural defects recorded while decoding.

use std::fmt;

/// A structural violation found by the parser.
///
/// Defects never abort decoding; the parser keeps going with its best
/// interpretation and leaves the marker on the node where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Defect {
    /// `multipart/*` without a `boundary` parameter. The body is kept as a leaf.
    NoBoundaryInMultipart,
    /// No delimiter line for the declared boundary was found.
    StartBoundaryNotFound,
    /// The body ended before the closing `--boundary--` line.
    CloseBoundaryNotFound,
    /// A line in the header block was neither a header nor a continuation.
    MissingHeaderBodySeparator,
    /// A continuation line with no header to continue.
    MalformedHeader(String),
    /// The `Content-Type` header could not be parsed.
    InvalidContentType(String),
    /// A multipart container with a boundary but no parts.
    MultipartWithoutParts,
    /// Multipart nesting beyond what the parser descends into.
    NestingTooDeep,
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoBoundaryInMultipart => write!(f, "multipart without boundary"),
            Self::StartBoundaryNotFound => write!(f, "start boundary not found"),
            Self::CloseBoundaryNotFound => write!(f, "close boundary not found"),
            Self::MissingHeaderBodySeparator => write!(f, "missing header/body separator"),
            Self::MalformedHeader(line) => write!(f, "malformed header line {line:?}"),
            Self::InvalidContentType(value) => write!(f, "invalid content type {value:?}"),
            Self::MultipartWithoutParts => write!(f, "multipart without parts"),
            Self::NestingTooDeep => write!(f, "multipart nesting too deep"),
        }
    }
}
