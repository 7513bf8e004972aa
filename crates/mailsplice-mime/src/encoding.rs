//! MIME encoding and decoding utilities.
//!
//! Base64 and Quoted-Printable body codecs. Both work on bytes and expect
//! CRLF line endings.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum encoded line length for Base64 and Quoted-Printable bodies.
const MAX_LINE_LENGTH: usize = 76;

/// Encodes a body as Base64, wrapped at 76 columns with CRLF line breaks.
///
/// Non-empty output always ends with a line break.
#[must_use]
pub fn encode_base64_body(data: &[u8]) -> Vec<u8> {
    let encoded = STANDARD.encode(data);
    let mut out = Vec::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2 + 2);
    for line in encoded.as_bytes().chunks(MAX_LINE_LENGTH) {
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    out
}

/// Decodes Base64 data, ignoring any whitespace (line breaks included).
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Encodes a body using Quoted-Printable encoding (RFC 2045).
///
/// CRLF pairs stay hard line breaks, trailing whitespace is protected, and
/// lines longer than 76 columns get soft line breaks.
#[must_use]
pub fn encode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut result = String::new();

    for (i, line) in split_crlf(data).into_iter().enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }

        let mut line_length = 0;
        for (j, byte) in line.iter().enumerate() {
            let last = j + 1 == line.len();
            let literal = match byte {
                b'!'..=b'<' | b'>'..=b'~' => true,
                b' ' | b'\t' => !last,
                _ => false,
            };
            let width = if literal { 1 } else { 3 };

            // Check if we need soft line break
            if line_length + width > MAX_LINE_LENGTH - 1 {
                result.push_str("=\r\n");
                line_length = 0;
            }

            if literal {
                result.push(char::from(*byte));
            } else {
                let _ = write!(result, "={byte:02X}");
            }
            line_length += width;
        }
    }

    result.into_bytes()
}

/// Decodes a Quoted-Printable body (RFC 2045).
///
/// Decoding is lenient: an `=` that does not start a valid escape or soft
/// line break is kept as a literal character.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break, possibly with trailing whitespace before it
        let mut j = i + 1;
        while j < data.len() && (data[j] == b' ' || data[j] == b'\t') {
            j += 1;
        }
        if data[j..].starts_with(b"\r\n") {
            i = j + 2;
            continue;
        }
        if data[j..].starts_with(b"\n") {
            i = j + 1;
            continue;
        }
        if j == data.len() {
            i = j;
            continue;
        }

        // Hex encoded byte
        match data.get(i + 1..i + 3).and_then(hex_byte) {
            Some(decoded) => {
                result.push(decoded);
                i += 3;
            }
            None => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    result
}

fn hex_byte(pair: &[u8]) -> Option<u8> {
    if !pair.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let text = std::str::from_utf8(pair).ok()?;
    u8::from_str_radix(text, 16).ok()
}

/// Splits on CRLF; the final segment is whatever follows the last break.
pub(crate) fn split_crlf(data: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + 1 < data.len() {
        if data[i] == b'\r' && data[i + 1] == b'\n' {
            lines.push(&data[start..i]);
            i += 2;
            start = i;
        } else {
            i += 1;
        }
    }
    lines.push(&data[start..]);
    lines
}
