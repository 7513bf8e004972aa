//! Charset lookup and transcoding on top of `encoding_rs`.

use crate::error::{Error, Result};
use encoding_rs::{Encoding, UTF_8};

/// Resolves a MIME charset label.
///
/// A missing label means the RFC 2045 default, us-ascii, which is decoded as
/// UTF-8 since the latter is a strict superset.
///
/// # Errors
///
/// Returns an error if the label is not known to `encoding_rs`.
pub fn lookup(label: Option<&str>) -> Result<&'static Encoding> {
    match label.map(str::trim) {
        None | Some("") => Ok(UTF_8),
        Some(label) if label.eq_ignore_ascii_case("us-ascii") => Ok(UTF_8),
        Some(label) => Encoding::for_label_no_replacement(label.as_bytes())
            .ok_or_else(|| Error::UnsupportedCharset(label.to_string())),
    }
}

/// Decodes `bytes` in the charset named by `label`, replacing malformed
/// sequences.
///
/// # Errors
///
/// Returns an error if the label is not known.
pub fn decode(bytes: &[u8], label: Option<&str>) -> Result<String> {
    let encoding = lookup(label)?;
    let (text, _malformed) = encoding.decode_without_bom_handling(bytes);
    Ok(text.into_owned())
}

/// Converts `bytes` from the charset named by `from` into `to`.
///
/// # Errors
///
/// Returns an error if the source label is not known.
pub fn transcode(bytes: &[u8], from: Option<&str>, to: &'static Encoding) -> Result<Vec<u8>> {
    let source = lookup(from)?;
    if source == to {
        return Ok(bytes.to_vec());
    }
    let (text, _malformed) = source.decode_without_bom_handling(bytes);
    let (encoded, _used, _unmappable) = to.encode(&text);
    Ok(encoded.into_owned())
}
