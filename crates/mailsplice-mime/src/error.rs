//! Error types for MIME operations.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME codec errors.
///
/// Structural oddities found while decoding are not errors; they are recorded
/// as [`Defect`](crate::Defect)s on the node they were found in. An `Error`
/// means the bytes could not be turned into a tree (or back) at all.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input stream was empty.
    #[error("Empty message")]
    EmptyMessage,

    /// The input does not start with a header block.
    #[error("Not an rfc822 message: {0}")]
    NotAMessage(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Unknown or unsupported charset label.
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    /// A multipart container has no boundary to serialize with.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// The operation needs a leaf part but got a container, or vice versa.
    #[error("Invalid multipart structure: {0}")]
    InvalidMultipart(String),

    /// Writing the serialized message failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
