//! Decoding raw bytes into a [`MimeNode`] tree.

use crate::content_type::ContentType;
use crate::defect::Defect;
use crate::error::{Error, Result};
use crate::header::{Headers, unfold};
use crate::node::{MimeNode, Payload};
use std::borrow::Cow;

/// Multipart nesting the parser descends into; deeper containers stay leaves.
const MAX_DEPTH: usize = 64;

/// Parses a complete message.
///
/// Input whose first line break is not CRLF has its line endings normalised
/// to CRLF first. CRLF input is parsed as is, so lone CR or LF octets in
/// `binary` bodies are kept. Structural problems are recorded as defects on
/// the affected node instead of failing.
///
/// # Errors
///
/// Returns an error if the input is empty or does not start with a header
/// block (or an empty line).
pub fn parse(input: &[u8]) -> Result<MimeNode> {
    if input.is_empty() {
        return Err(Error::EmptyMessage);
    }

    let data = if uses_crlf(input) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(normalize_line_endings(input))
    };
    let node = parse_part(&data, ContentType::text_plain(), 0);

    if node.headers.is_empty() && node.defects.contains(&Defect::MissingHeaderBodySeparator) {
        let first_line = data
            .split(|&b| b == b'\r')
            .next()
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        return Err(Error::NotAMessage(format!(
            "first line {first_line:?} is not a header"
        )));
    }

    Ok(node)
}

fn uses_crlf(data: &[u8]) -> bool {
    data.iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .is_none_or(|i| data[i..].starts_with(b"\r\n"))
}

/// Converts bare LF and bare CR line breaks to CRLF.
#[must_use]
pub fn normalize_line_endings(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 32);
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'\r' if data.get(i + 1) == Some(&b'\n') => {
                out.extend_from_slice(b"\r\n");
                i += 2;
                continue;
            }
            b'\r' | b'\n' => out.extend_from_slice(b"\r\n"),
            byte => out.push(byte),
        }
        i += 1;
    }
    out
}

fn parse_part(data: &[u8], default_type: ContentType, depth: usize) -> MimeNode {
    let parsed = Headers::parse(data);
    let mut defects = parsed.defects;
    let body = &data[parsed.body_offset..];

    let content_type = match parsed.headers.get("content-type") {
        Some(value) => match ContentType::parse(&unfold(value)) {
            Ok(content_type) => content_type,
            Err(_) => {
                defects.push(Defect::InvalidContentType(value.to_string()));
                default_type.clone()
            }
        },
        None => default_type.clone(),
    };

    let payload = if content_type.is_multipart() {
        parse_multipart(body, &content_type, depth, &mut defects)
    } else {
        Payload::Leaf {
            body: body.to_vec(),
        }
    };

    MimeNode::from_parts(parsed.headers, payload, defects, default_type)
}

fn parse_multipart(
    body: &[u8],
    content_type: &ContentType,
    depth: usize,
    defects: &mut Vec<Defect>,
) -> Payload {
    let leaf = || Payload::Leaf {
        body: body.to_vec(),
    };

    let Some(boundary) = content_type.boundary() else {
        defects.push(Defect::NoBoundaryInMultipart);
        return leaf();
    };
    if depth >= MAX_DEPTH {
        defects.push(Defect::NestingTooDeep);
        return leaf();
    }
    let Some(split) = split_multipart(body, boundary.as_bytes()) else {
        defects.push(Defect::StartBoundaryNotFound);
        return leaf();
    };

    if !split.closed {
        defects.push(Defect::CloseBoundaryNotFound);
    }
    if split.parts.is_empty() {
        defects.push(Defect::MultipartWithoutParts);
    }

    let child_default = if content_type.sub_type == "digest" {
        ContentType::message_rfc822()
    } else {
        ContentType::text_plain()
    };

    Payload::Container {
        preamble: split.preamble.map(<[u8]>::to_vec),
        children: split
            .parts
            .into_iter()
            .map(|part| parse_part(part, child_default.clone(), depth + 1))
            .collect(),
        epilogue: split.epilogue.map(<[u8]>::to_vec),
    }
}

/// A multipart body cut at its delimiter lines.
#[derive(Debug, Default)]
struct Split<'a> {
    preamble: Option<&'a [u8]>,
    parts: Vec<&'a [u8]>,
    epilogue: Option<&'a [u8]>,
    closed: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Delimiter {
    Open,
    Close,
}

fn classify(line: &[u8], boundary: &[u8]) -> Option<Delimiter> {
    let rest = line.strip_prefix(b"--")?.strip_prefix(boundary)?;
    let (kind, rest) = match rest.strip_prefix(b"--") {
        Some(rest) => (Delimiter::Close, rest),
        None => (Delimiter::Open, rest),
    };
    rest.iter()
        .all(|&b| b == b' ' || b == b'\t')
        .then_some(kind)
}

/// Splits `body` on `--boundary` lines. Returns `None` when no delimiter
/// line exists at all.
///
/// The CRLF in front of a delimiter line belongs to the delimiter, so it is
/// neither part of the preceding part nor of the preamble.
fn split_multipart<'a>(body: &'a [u8], boundary: &[u8]) -> Option<Split<'a>> {
    let mut split = Split::default();
    let mut part_start: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let (end, next) = match body[pos..].windows(2).position(|w| w == b"\r\n") {
            Some(i) => (pos + i, pos + i + 2),
            None => (body.len(), body.len()),
        };
        let start = pos;
        pos = next;

        let Some(kind) = classify(&body[start..end], boundary) else {
            continue;
        };

        // Content before this delimiter, minus the CRLF that introduces it.
        let content_end = start.saturating_sub(2);
        match part_start {
            Some(part) => split.parts.push(&body[part..content_end.max(part)]),
            None => split.preamble = (start > 0).then(|| &body[..content_end]),
        }

        if kind == Delimiter::Close {
            split.closed = true;
            split.epilogue = (end < body.len()).then(|| &body[next..]);
            return Some(split);
        }
        part_start = Some(next);
    }

    let part = part_start?;
    split.parts.push(&body[part.min(body.len())..]);
    Some(split)
}
