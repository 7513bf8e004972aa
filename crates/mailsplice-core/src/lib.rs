//! # mailsplice-core
//!
//! Selection and splicing operations on MIME trees.
//!
//! Every operation works on a tree decoded by [`mailsplice_mime`], changes it
//! in place and checks that the nodes it touched carry no decoder defects.
//! First match in document order always wins; later duplicates are ignored
//! unless [`SpliceOptions::strict`] asks for uniqueness.
//!
//! ## Operations
//!
//! - [`resolve_alternative`]: collapse a `multipart/alternative` part onto
//!   one of its representations
//! - [`replace_body`]: make one part, by type or position, the whole body
//! - [`insert_alternative`]: pair the first HTML part with a plain-text
//!   rendering
//! - [`normalize_charsets`] and [`decode_transfer_encodings`]: whole-message
//!   passes over the text parts
//!
//! [`process`] ties them together: decode, run the configured [`Mode`],
//! encode.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod alternative;
mod body;
mod config;
mod error;
mod insert;
mod mode;
mod pipeline;
mod transcode;
mod validate;

pub use alternative::{ALTERNATIVE, RELATED, resolve_alternative};
pub use body::{Selector, replace_body};
pub use config::{Config, HEADER_MERGE_VAR, MODE_VAR, STRICT_VAR, SpliceOptions};
pub use error::{Error, Result, StructuralError};
pub use insert::{HtmdRenderer, HtmlRenderer, insert_alternative};
pub use mode::{Mode, Target};
pub use pipeline::{apply, apply_with, process, process_with};
pub use transcode::{decode_transfer_encodings, normalize_charsets};

pub use mailsplice_mime;
