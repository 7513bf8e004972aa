//! # mailsplice-mime
//!
//! MIME tree model and codec for rfc822 messages.
//!
//! ## Features
//!
//! - **Parsing**: decode a whole message into a [`MimeNode`] tree, recording
//!   structural [`Defect`]s instead of failing
//! - **Traversal**: pre-order walks, first-match lookups and node paths
//! - **Mutation**: splice a node onto another one, fix up content-type
//!   parameters, transcode charsets, change transfer encodings
//! - **Serialization**: write the tree back with CRLF line endings and the
//!   original header folding
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsplice_mime::{parse, HeaderMerge};
//!
//! let mut root = parse(raw_message)?;
//! let path = root
//!     .find_path(|node| node.matches_type("text/plain"))
//!     .ok_or("no text part")?;
//! let part = root.detach(&path).ok_or("vanished")?;
//! root.replace_contents_with(part, HeaderMerge::OverwriteInPlace);
//! std::io::stdout().write_all(&root.to_bytes()?)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod defect;
mod error;
mod header;
mod node;
mod parse;
mod write;

pub mod charset;
pub mod encoding;

pub use content_type::ContentType;
pub use defect::Defect;
pub use error::{Error, Result};
pub use header::{HeaderMerge, Headers, ParsedHeaders, unfold};
pub use node::{MimeNode, NodePath, Payload, TransferEncoding, Walk};
pub use parse::{normalize_line_endings, parse};
