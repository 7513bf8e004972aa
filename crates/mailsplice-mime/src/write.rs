//! Serializing a [`MimeNode`] tree back to bytes.
//!
//! Headers are written as stored (no refolding), every line ends in CRLF.

use crate::error::{Error, Result};
use crate::node::{MimeNode, Payload};
use std::io::Write;

impl MimeNode {
    /// Writes the node, headers and body, to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart node has no boundary parameter or
    /// writing fails.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        self.headers.write_to(out)?;
        out.write_all(b"\r\n")?;

        match &self.payload {
            Payload::Leaf { body } => out.write_all(body)?,
            Payload::Container {
                preamble,
                children,
                epilogue,
            } => {
                let content_type = self.content_type();
                let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;

                if let Some(preamble) = preamble {
                    out.write_all(preamble)?;
                    out.write_all(b"\r\n")?;
                }
                for child in children {
                    write!(out, "--{boundary}\r\n")?;
                    child.write_to(out)?;
                    out.write_all(b"\r\n")?;
                }
                write!(out, "--{boundary}--")?;
                if let Some(epilogue) = epilogue {
                    out.write_all(b"\r\n")?;
                    out.write_all(epilogue)?;
                }
            }
        }

        Ok(())
    }

    /// Serializes the node into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart node has no boundary parameter.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}
