//! Whole-message passes over the text leaves: charset normalization and
//! transfer decoding.

use crate::error::Result;
use crate::validate::ensure_clean;
use encoding_rs::UTF_8;
use mailsplice_mime::{MimeNode, NodePath, TransferEncoding};
use tracing::{debug, info};

fn leaf_paths(root: &MimeNode, pred: impl Fn(&MimeNode) -> bool) -> Vec<NodePath> {
    root.walk_with_paths()
        .filter(|(_, node)| !node.is_multipart() && pred(node))
        .map(|(path, _)| path)
        .collect()
}

/// Relabels every `text/plain` and `text/html` leaf as UTF-8, transcoding
/// its body when the declared charset is known. Returns the number of parts
/// visited.
///
/// # Errors
///
/// Returns a validation error when the message carries defects, and a codec
/// error when a body is not valid base64.
pub fn normalize_charsets(root: &mut MimeNode) -> Result<usize> {
    ensure_clean([("message", &*root)])?;

    let paths = leaf_paths(root, |node| {
        node.matches_type("text/plain") || node.matches_type("text/html")
    });
    for path in &paths {
        if let Some(node) = root.node_at_mut(path) {
            debug!(?path, charset = ?node.content_type().charset(), "normalizing charset");
            node.set_charset(UTF_8)?;
        }
    }

    info!(parts = paths.len(), "normalized charsets to utf-8");
    Ok(paths.len())
}

/// Decodes every base64 or quoted-printable text leaf and relabels it
/// `7bit` or `8bit`. Returns the number of parts rewritten.
///
/// # Errors
///
/// Returns a validation error when the message carries defects, and a codec
/// error when a body is not valid base64.
pub fn decode_transfer_encodings(root: &mut MimeNode) -> Result<usize> {
    ensure_clean([("message", &*root)])?;

    let paths = leaf_paths(root, |node| {
        node.content_type().is_text()
            && matches!(
                node.transfer_encoding(),
                TransferEncoding::Base64 | TransferEncoding::QuotedPrintable
            )
    });
    for path in &paths {
        if let Some(node) = root.node_at_mut(path) {
            let identity = TransferEncoding::identity_for(&node.decode_body()?);
            debug!(?path, from = %node.transfer_encoding(), to = %identity, "decoding part");
            node.set_transfer_encoding(identity)?;
        }
    }

    info!(parts = paths.len(), "decoded transfer encodings");
    Ok(paths.len())
}
