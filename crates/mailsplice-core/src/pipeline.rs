//! Decode, transform, encode.

use crate::alternative::resolve_alternative;
use crate::body::{Selector, replace_body};
use crate::config::Config;
use crate::error::Result;
use crate::insert::{HtmdRenderer, HtmlRenderer, insert_alternative};
use crate::mode::Mode;
use crate::transcode::{decode_transfer_encodings, normalize_charsets};
use mailsplice_mime::{MimeNode, parse};
use tracing::{debug, warn};

/// Applies the configured operation to a decoded message.
///
/// # Errors
///
/// Returns the operation's error; the tree may be partially modified.
pub fn apply(root: &mut MimeNode, config: &Config) -> Result<()> {
    apply_with(root, config, &HtmdRenderer)
}

/// Like [`apply`], rendering HTML with `renderer`.
///
/// # Errors
///
/// Returns the operation's error; the tree may be partially modified.
pub fn apply_with(root: &mut MimeNode, config: &Config, renderer: &dyn HtmlRenderer) -> Result<()> {
    match config.mode {
        Mode::Alternative(target) => resolve_alternative(root, target.essence(), &config.options),
        Mode::AnyBody(target) => replace_body(
            root,
            &Selector::ByType(target.essence().to_string()),
            &config.options,
        ),
        Mode::PartIndex(index) => replace_body(root, &Selector::ByIndex(index), &config.options),
        Mode::InsertAlternative => insert_alternative(root, renderer),
        Mode::Utf8 => normalize_charsets(root).map(drop),
        Mode::To7or8bit => decode_transfer_encodings(root).map(drop),
    }
}

/// Runs the configured operation on a raw message and returns the result.
///
/// Nothing is returned unless decoding, the operation and encoding all
/// succeed.
///
/// # Errors
///
/// Returns a codec error when the input cannot be decoded or the output
/// cannot be encoded, and the operation's error otherwise.
pub fn process(input: &[u8], config: &Config) -> Result<Vec<u8>> {
    process_with(input, config, &HtmdRenderer)
}

/// Like [`process`], rendering HTML with `renderer`.
///
/// # Errors
///
/// See [`process`].
pub fn process_with(input: &[u8], config: &Config, renderer: &dyn HtmlRenderer) -> Result<Vec<u8>> {
    debug!(mode = %config.mode, bytes = input.len(), "processing message");

    transform(input, config, renderer).inspect_err(|e| {
        warn!(mode = %config.mode, error = %e, "message left unchanged");
    })
}

fn transform(input: &[u8], config: &Config, renderer: &dyn HtmlRenderer) -> Result<Vec<u8>> {
    let mut root = parse(input)?;
    apply_with(&mut root, config, renderer)?;
    Ok(root.to_bytes()?)
}
