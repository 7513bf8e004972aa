//! Wrapping an HTML part into a `multipart/alternative` with a plain-text
//! rendering.

use crate::error::{Error, Result, StructuralError};
use crate::validate::ensure_clean;
use mailsplice_mime::{ContentType, Headers, MimeNode, normalize_line_endings};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use tracing::{debug, info};

/// Turns HTML into plain text.
pub trait HtmlRenderer {
    /// Renders `html` as readable plain text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] when the document cannot be converted.
    fn render(&self, html: &str) -> Result<String>;
}

/// Default renderer, backed by `htmd`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmdRenderer;

impl HtmlRenderer for HtmdRenderer {
    fn render(&self, html: &str) -> Result<String> {
        htmd::convert(html).map_err(|e| Error::Render(e.to_string()))
    }
}

impl<F> HtmlRenderer for F
where
    F: Fn(&str) -> String,
{
    fn render(&self, html: &str) -> Result<String> {
        Ok(self(html))
    }
}

const BOUNDARY_PREFIX: &str = "=_mailsplice_";

/// Picks a boundary from a digest of `content`, rehashing until it does not
/// occur in the content.
fn derive_boundary(content: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for chunk in content {
        hasher.update(chunk);
    }
    let mut digest = hasher.finalize();

    loop {
        let mut boundary = String::from(BOUNDARY_PREFIX);
        for byte in digest.iter().take(12) {
            let _ = write!(boundary, "{byte:02x}");
        }
        let needle = boundary.as_bytes();
        let collides = content
            .iter()
            .any(|chunk| chunk.windows(needle.len()).any(|w| w == needle));
        if !collides {
            return boundary;
        }
        digest = Sha256::digest(digest);
    }
}

/// Replaces the first `text/html` part (the root included) by a
/// `multipart/alternative` holding that part followed by its plain-text
/// rendering.
///
/// Non-content headers stay on the converted node; the HTML part keeps its
/// `Content-*` headers. The new part is labelled
/// `text/plain; charset="utf-8"` with `Content-Transfer-Encoding: 8bit`.
///
/// # Errors
///
/// Returns [`StructuralError::NoMatchingPart`] when there is no HTML part,
/// a validation error when the message or the HTML part carries defects,
/// and codec or render errors when the HTML cannot be decoded or rendered.
pub fn insert_alternative(root: &mut MimeNode, renderer: &dyn HtmlRenderer) -> Result<()> {
    let path = root
        .find_path(|node| node.matches_type("text/html") && !node.is_multipart())
        .ok_or_else(|| StructuralError::NoMatchingPart("text/html".to_string()))?;
    debug!(?path, "found html part");

    let html = root
        .node_at(&path)
        .ok_or_else(|| StructuralError::NoMatchingPart("text/html".to_string()))?;
    ensure_clean([("message", &*root), ("text/html part", html)])?;

    let plain = renderer.render(&html.body_text()?)?;
    let mut plain_body = normalize_line_endings(plain.as_bytes());
    if !plain_body.is_empty() && !plain_body.ends_with(b"\r\n") {
        plain_body.extend_from_slice(b"\r\n");
    }

    let node = root
        .node_at_mut(&path)
        .ok_or_else(|| StructuralError::NoMatchingPart("text/html".to_string()))?;
    let original = std::mem::replace(node, MimeNode::leaf(Headers::new(), Vec::new()));
    *node = make_alternative(original, plain_body)?;

    info!(?path, "inserted text/plain alternative");
    Ok(())
}

fn make_alternative(mut html: MimeNode, plain_body: Vec<u8>) -> Result<MimeNode> {
    let mut outer = Headers::new();
    let mut inner = Headers::new();
    for (name, value) in html.headers.iter() {
        if name.to_ascii_lowercase().starts_with("content-") {
            inner.add(name, value);
        } else {
            outer.add(name, value);
        }
    }

    let raw = html.to_bytes()?;
    let boundary = derive_boundary(&[raw.as_slice(), plain_body.as_slice()]);
    outer.add(
        "Content-Type",
        ContentType::multipart_alternative(boundary).to_string(),
    );

    html.headers = inner;

    let mut plain_headers = Headers::new();
    plain_headers.add("Content-Type", "text/plain; charset=\"utf-8\"");
    plain_headers.add("Content-Transfer-Encoding", "8bit");
    let plain = MimeNode::leaf(plain_headers, plain_body);

    Ok(MimeNode::container(outer, vec![html, plain]))
}
