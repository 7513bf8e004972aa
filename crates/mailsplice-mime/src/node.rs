//! The MIME tree: nodes, payloads, traversal and in-place mutation.

use crate::charset;
use crate::content_type::ContentType;
use crate::defect::Defect;
use crate::encoding::{
    decode_base64, decode_quoted_printable, encode_base64_body, encode_quoted_printable,
};
use crate::error::{Error, Result};
use crate::header::{HeaderMerge, Headers, unfold};
use crate::parse::normalize_line_endings;
use encoding_rs::Encoding;
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }

    /// The identity encoding able to carry `data`: 7bit for pure ASCII,
    /// 8bit otherwise.
    #[must_use]
    pub fn identity_for(data: &[u8]) -> Self {
        if data.is_ascii() {
            Self::SevenBit
        } else {
            Self::EightBit
        }
    }

    /// Checks whether the body is stored as-is.
    #[must_use]
    pub const fn is_identity(self) -> bool {
        matches!(self, Self::SevenBit | Self::EightBit | Self::Binary)
    }

    /// Removes this transfer encoding from `body`.
    ///
    /// # Errors
    ///
    /// Returns an error if a Base64 body is malformed.
    pub fn decode(self, body: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Base64 => decode_base64(body),
            Self::QuotedPrintable => Ok(decode_quoted_printable(body)),
            Self::SevenBit | Self::EightBit | Self::Binary => Ok(body.to_vec()),
        }
    }

    /// Applies this transfer encoding to `data`.
    #[must_use]
    pub fn encode(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Base64 => encode_base64_body(data),
            Self::QuotedPrintable => encode_quoted_printable(data),
            Self::SevenBit | Self::EightBit | Self::Binary => data.to_vec(),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// What a node carries: raw content or an ordered list of children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Raw, still transfer-encoded content.
    Leaf {
        /// Body bytes with CRLF line endings.
        body: Vec<u8>,
    },
    /// A multipart container.
    Container {
        /// Text before the first boundary; `None` when there was none.
        preamble: Option<Vec<u8>>,
        /// Child parts in document order.
        children: Vec<MimeNode>,
        /// Text after the closing boundary; `None` when the closing line
        /// ended the message.
        epilogue: Option<Vec<u8>>,
    },
}

/// Path of child indices from the root to a node. The root is `[]`.
pub type NodePath = Vec<usize>;

/// A node of a parsed MIME message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeNode {
    /// Header fields in order.
    pub headers: Headers,
    /// Content of the node.
    pub payload: Payload,
    /// Structural defects found while decoding this node.
    pub defects: Vec<Defect>,
    /// Content type in effect when there is no valid `Content-Type` header.
    default_type: ContentType,
}

impl MimeNode {
    /// Creates a leaf node.
    #[must_use]
    pub fn leaf(headers: Headers, body: impl Into<Vec<u8>>) -> Self {
        Self {
            headers,
            payload: Payload::Leaf { body: body.into() },
            defects: Vec::new(),
            default_type: ContentType::text_plain(),
        }
    }

    /// Creates a multipart node without preamble or epilogue.
    #[must_use]
    pub fn container(headers: Headers, children: Vec<Self>) -> Self {
        Self {
            headers,
            payload: Payload::Container {
                preamble: None,
                children,
                epilogue: None,
            },
            defects: Vec::new(),
            default_type: ContentType::text_plain(),
        }
    }

    pub(crate) const fn from_parts(
        headers: Headers,
        payload: Payload,
        defects: Vec<Defect>,
        default_type: ContentType,
    ) -> Self {
        Self {
            headers,
            payload,
            defects,
            default_type,
        }
    }

    /// Gets the effective content type.
    ///
    /// Falls back to the default type (`text/plain`, or `message/rfc822`
    /// inside `multipart/digest`) when the header is absent or invalid.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("content-type")
            .and_then(|value| ContentType::parse(&unfold(value)).ok())
            .unwrap_or_else(|| self.default_type.clone())
    }

    /// Checks the effective content type against `type/subtype`.
    #[must_use]
    pub fn matches_type(&self, essence: &str) -> bool {
        self.content_type().matches(essence)
    }

    /// Checks if this node holds children.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self.payload, Payload::Container { .. })
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Returns the children of a multipart node.
    #[must_use]
    pub fn children(&self) -> Option<&[Self]> {
        match &self.payload {
            Payload::Container { children, .. } => Some(children),
            Payload::Leaf { .. } => None,
        }
    }

    /// Returns the children of a multipart node for modification.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Self>> {
        match &mut self.payload {
            Payload::Container { children, .. } => Some(children),
            Payload::Leaf { .. } => None,
        }
    }

    /// Moves the children out of a multipart node, leaving it empty.
    pub fn take_children(&mut self) -> Vec<Self> {
        self.children_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Checks whether decoding recorded any defect on this node.
    #[must_use]
    pub fn has_defects(&self) -> bool {
        !self.defects.is_empty()
    }

    /// Depth-first, parent-first traversal in document order.
    #[must_use]
    pub fn walk(&self) -> impl Iterator<Item = &Self> {
        self.walk_with_paths().map(|(_, node)| node)
    }

    /// Like [`walk`](Self::walk), also yielding each node's path.
    #[must_use]
    pub fn walk_with_paths(&self) -> Walk<'_> {
        Walk {
            stack: vec![(Vec::new(), self)],
        }
    }

    /// Path of the first node in pre-order for which `pred` holds.
    pub fn find_path(&self, mut pred: impl FnMut(&Self) -> bool) -> Option<NodePath> {
        self.walk_with_paths()
            .find(|(_, node)| pred(node))
            .map(|(path, _)| path)
    }

    /// Number of nodes in the tree for which `pred` holds.
    pub fn count(&self, mut pred: impl FnMut(&Self) -> bool) -> usize {
        self.walk().filter(|node| pred(node)).count()
    }

    /// Looks up a node by path.
    #[must_use]
    pub fn node_at(&self, path: &[usize]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |node, &index| node.children()?.get(index))
    }

    /// Looks up a node by path for modification.
    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Self> {
        let mut node = self;
        for &index in path {
            node = node.children_mut()?.get_mut(index)?;
        }
        Some(node)
    }

    /// Removes the node at `path` from its parent and returns it.
    ///
    /// The root itself (empty path) cannot be detached.
    pub fn detach(&mut self, path: &[usize]) -> Option<Self> {
        let (&index, parent) = path.split_last()?;
        let siblings = self.node_at_mut(parent)?.children_mut()?;
        (index < siblings.len()).then(|| siblings.remove(index))
    }

    /// Replaces this node's content with `source`'s.
    ///
    /// Every `Content-*` header and the payload of `self` are dropped, then
    /// the headers of `source` are merged in with `policy`. Payload,
    /// defects and default type move over from `source`. Headers unrelated
    /// to content (e.g. `Subject` on a top-level message) stay where they
    /// are.
    pub fn replace_contents_with(&mut self, source: Self, policy: HeaderMerge) {
        self.headers
            .retain(|name, _| !name.to_ascii_lowercase().starts_with("content-"));
        self.headers.merge_from(source.headers, policy);
        self.payload = source.payload;
        self.default_type = source.default_type;
        self.defects.extend(source.defects);
    }

    /// Drops the preamble and epilogue of a multipart node.
    pub fn clear_harness(&mut self) {
        if let Payload::Container {
            preamble, epilogue, ..
        } = &mut self.payload
        {
            *preamble = None;
            *epilogue = None;
        }
    }

    /// Sets a `Content-Type` parameter, re-rendering the header.
    ///
    /// When the node has no `Content-Type` header, one is created from its
    /// default type.
    pub fn set_param(&mut self, name: &str, value: &str) {
        let content_type = self.content_type().with_parameter(name, value);
        self.headers.set("Content-Type", content_type.to_string());
    }

    /// Sets the `type` parameter of a `multipart/related` node.
    ///
    /// # Errors
    ///
    /// Returns an error if this node is not `multipart/related`.
    pub fn set_related_type_param(&mut self, essence: &str) -> Result<()> {
        if !self.matches_type("multipart/related") {
            return Err(Error::InvalidMultipart(format!(
                "expected multipart/related, found {}",
                self.content_type().essence()
            )));
        }
        self.set_param("type", essence);
        Ok(())
    }

    /// Transfer-decodes the body of a leaf node.
    ///
    /// # Errors
    ///
    /// Returns an error for multipart nodes or malformed Base64.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match &self.payload {
            Payload::Leaf { body } => self.transfer_encoding().decode(body),
            Payload::Container { .. } => Err(Error::InvalidMultipart(
                "multipart node has no body".to_string(),
            )),
        }
    }

    /// Decodes the body of a leaf node to text using its declared charset.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be decoded or the charset is unknown.
    pub fn body_text(&self) -> Result<String> {
        let decoded = self.decode_body()?;
        charset::decode(&decoded, self.content_type().charset())
    }

    /// Relabels a leaf with `target` as its charset, transcoding the body.
    ///
    /// The body is transfer-decoded, converted from the declared charset and
    /// encoded again with the same transfer encoding. A 7bit body that is no
    /// longer ASCII afterwards is relabelled 8bit. A declared charset that
    /// cannot be resolved (`unknown-8bit`, `utf-7`, ...) only gets relabelled;
    /// the body is kept as it is.
    ///
    /// # Errors
    ///
    /// Returns an error for multipart nodes or malformed Base64.
    pub fn set_charset(&mut self, target: &'static Encoding) -> Result<()> {
        if self.is_multipart() {
            return Err(Error::InvalidMultipart(
                "cannot set the charset of a multipart node".to_string(),
            ));
        }

        let content_type = self.content_type();
        if let Ok(source) = charset::lookup(content_type.charset())
            && source != target
        {
            let transfer_encoding = self.transfer_encoding();
            let decoded = self.decode_body()?;
            let converted = charset::transcode(&decoded, content_type.charset(), target)?;

            let transfer_encoding = match transfer_encoding {
                TransferEncoding::SevenBit if !converted.is_ascii() => {
                    self.headers.set(
                        "Content-Transfer-Encoding",
                        TransferEncoding::EightBit.to_string(),
                    );
                    TransferEncoding::EightBit
                }
                other => other,
            };
            self.payload = Payload::Leaf {
                body: transfer_encoding.encode(&converted),
            };
        }

        self.set_param("charset", &target.name().to_ascii_lowercase());
        Ok(())
    }

    /// Re-encodes a leaf body with `encoding`.
    ///
    /// Decoded text destined for an identity encoding gets CRLF line endings.
    /// The `Content-Transfer-Encoding` header is deleted and re-added, which
    /// moves it to the end of the header block.
    ///
    /// # Errors
    ///
    /// Returns an error for multipart nodes or malformed Base64.
    pub fn set_transfer_encoding(&mut self, encoding: TransferEncoding) -> Result<()> {
        let mut decoded = self.decode_body()?;
        if encoding.is_identity() && encoding != TransferEncoding::Binary {
            decoded = normalize_line_endings(&decoded);
        }
        self.payload = Payload::Leaf {
            body: encoding.encode(&decoded),
        };
        self.headers.remove("Content-Transfer-Encoding");
        self.headers
            .add("Content-Transfer-Encoding", encoding.to_string());
        Ok(())
    }
}

/// Pre-order iterator over a tree, see [`MimeNode::walk_with_paths`].
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<(NodePath, &'a MimeNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (NodePath, &'a MimeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        if let Some(children) = node.children() {
            for (index, child) in children.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(index);
                self.stack.push((child_path, child));
            }
        }
        Some((path, node))
    }
}
