//! Replacing the whole message body with one of its parts.

use crate::config::SpliceOptions;
use crate::error::{Result, StructuralError};
use crate::validate::{ensure_clean, is_text_type};
use encoding_rs::UTF_8;
use mailsplice_mime::{MimeNode, NodePath};
use std::fmt;
use tracing::{debug, info};

/// How the replacement part is picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// First part below the root, in document order, with this content type.
    ByType(String),
    /// Direct child of the root at this zero-based position.
    ByIndex(usize),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByType(essence) => write!(f, "first {essence} part"),
            Self::ByIndex(index) => write!(f, "part {index}"),
        }
    }
}

impl Selector {
    fn locate(&self, root: &MimeNode) -> Result<NodePath> {
        match self {
            Self::ByType(essence) => root
                .walk_with_paths()
                .skip(1)
                .find(|(_, node)| node.matches_type(essence))
                .map(|(path, _)| path)
                .ok_or_else(|| StructuralError::NoMatchingPart(essence.clone()).into()),
            Self::ByIndex(index) => {
                let len = root.children().map_or(0, <[MimeNode]>::len);
                if *index < len {
                    Ok(vec![*index])
                } else {
                    Err(StructuralError::IndexOutOfRange { index: *index, len }.into())
                }
            }
        }
    }
}

/// Collapses the root onto the part chosen by `selector`.
///
/// The chosen part's headers are merged into the root with
/// [`SpliceOptions::header_merge`] and its payload becomes the message body.
/// Text parts are re-encoded as UTF-8.
///
/// # Errors
///
/// Returns a structural error when the root is not multipart or nothing
/// matches the selector, and a validation error when the root or the chosen
/// part carries defects.
pub fn replace_body(root: &mut MimeNode, selector: &Selector, options: &SpliceOptions) -> Result<()> {
    if !root.is_multipart() {
        return Err(StructuralError::NotMultipart.into());
    }

    let path = selector.locate(root)?;
    debug!(?path, %selector, "selected body part");

    let source = root
        .detach(&path)
        .ok_or_else(|| StructuralError::NoMatchingPart(selector.to_string()))?;
    ensure_clean([("selected part", &source)])?;

    let essence = source.content_type().essence();
    root.replace_contents_with(source, options.header_merge);
    if is_text_type(&essence) {
        root.set_charset(UTF_8)?;
    }
    ensure_clean([("message", &*root)])?;

    info!(%selector, content_type = %essence, "replaced message body");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use mailsplice_mime::{Defect, Headers, parse};

    fn part(content_type: &str, body: &str) -> MimeNode {
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type);
        MimeNode::leaf(headers, body.as_bytes())
    }

    fn multipart(content_type: &str, children: Vec<MimeNode>) -> MimeNode {
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type);
        MimeNode::container(headers, children)
    }

    fn mixed() -> MimeNode {
        let mut root = multipart(
            "multipart/mixed; boundary=m",
            vec![
                multipart(
                    "multipart/alternative; boundary=a",
                    vec![part("text/plain", "plain"), part("text/html", "<p>html</p>")],
                ),
                part("text/calendar; method=REQUEST", "BEGIN:VCALENDAR"),
                part("application/pdf", "%PDF"),
            ],
        );
        root.headers.add("From", "a@example.org");
        root
    }

    #[test]
    fn test_by_type_searches_whole_tree() {
        let mut root = mixed();
        replace_body(
            &mut root,
            &Selector::ByType("text/html".into()),
            &SpliceOptions::default(),
        )
        .unwrap();

        assert_eq!(root.headers.get("from"), Some("a@example.org"));
        assert_eq!(
            root.headers.get("content-type"),
            Some("text/html; charset=utf-8")
        );
        assert_eq!(root.decode_body().unwrap(), b"<p>html</p>");
    }

    #[test]
    fn test_by_type_keeps_parameters() {
        let mut root = mixed();
        replace_body(
            &mut root,
            &Selector::ByType("text/calendar".into()),
            &SpliceOptions::default(),
        )
        .unwrap();
        assert_eq!(root.content_type().param("method"), Some("REQUEST"));
        assert_eq!(root.content_type().charset(), Some("utf-8"));
    }

    #[test]
    fn test_by_type_skips_the_root() {
        let mut root = multipart(
            "multipart/mixed; boundary=m",
            vec![part("text/plain", "x")],
        );
        let result = replace_body(
            &mut root,
            &Selector::ByType("multipart/mixed".into()),
            &SpliceOptions::default(),
        );
        assert!(matches!(
            result,
            Err(Error::Structural(StructuralError::NoMatchingPart(_)))
        ));
    }

    #[test]
    fn test_by_type_can_pick_a_container() {
        let mut root = mixed();
        replace_body(
            &mut root,
            &Selector::ByType("multipart/alternative".into()),
            &SpliceOptions::default(),
        )
        .unwrap();
        assert!(root.matches_type("multipart/alternative"));
        assert_eq!(root.children().unwrap().len(), 2);
    }

    #[test]
    fn test_by_index() {
        let mut root = mixed();
        replace_body(&mut root, &Selector::ByIndex(2), &SpliceOptions::default()).unwrap();
        assert!(root.matches_type("application/pdf"));
        assert_eq!(root.content_type().charset(), None);
        assert_eq!(root.decode_body().unwrap(), b"%PDF");
    }

    #[test]
    fn test_index_out_of_range() {
        let mut root = mixed();
        let before = root.clone();
        let result = replace_body(&mut root, &Selector::ByIndex(3), &SpliceOptions::default());
        assert!(matches!(
            result,
            Err(Error::Structural(StructuralError::IndexOutOfRange { index: 3, len: 3 }))
        ));
        assert_eq!(root, before);
    }

    #[test]
    fn test_not_multipart() {
        let mut root = part("text/plain", "x");
        let result = replace_body(&mut root, &Selector::ByIndex(0), &SpliceOptions::default());
        assert!(matches!(
            result,
            Err(Error::Structural(StructuralError::NotMultipart))
        ));
    }

    #[test]
    fn test_defective_source_is_rejected() {
        let mut broken = part("text/plain", "x");
        broken.defects.push(Defect::MissingHeaderBodySeparator);
        let mut root = multipart("multipart/mixed; boundary=m", vec![broken]);

        let result = replace_body(&mut root, &Selector::ByIndex(0), &SpliceOptions::default());
        match result {
            Err(Error::Validation { node, .. }) => assert_eq!(node, "selected part"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_root_is_rejected() {
        let mut root = parse(
            concat!(
                "Content-Type: multipart/mixed; boundary=m\r\n",
                "\r\n",
                "--m\r\n",
                "Content-Type: text/plain\r\n",
                "\r\n",
                "no close line\r\n",
            )
            .as_bytes(),
        )
        .unwrap();

        let result = replace_body(&mut root, &Selector::ByIndex(0), &SpliceOptions::default());
        match result {
            Err(Error::Validation { node, defects }) => {
                assert_eq!(node, "message");
                assert_eq!(defects, [Defect::CloseBoundaryNotFound]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_source_charset_is_relabelled() {
        let mut root = multipart(
            "multipart/mixed; boundary=m",
            vec![
                part("image/png", "png"),
                part("text/plain; charset=x-unknown; format=flowed", "hello"),
            ],
        );
        replace_body(&mut root, &Selector::ByIndex(1), &SpliceOptions::default()).unwrap();

        assert_eq!(
            root.headers.get("content-type"),
            Some("text/plain; charset=utf-8; format=flowed")
        );
        assert_eq!(root.decode_body().unwrap(), b"hello");
    }
}
