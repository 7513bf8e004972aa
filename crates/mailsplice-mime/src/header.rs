//! MIME header handling.

use crate::defect::Defect;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

/// How headers of a spliced-in part are merged into the node they replace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderMerge {
    /// Overwrite an existing header in place (its position is retained);
    /// append headers the target does not have yet.
    ///
    /// The k-th occurrence of a name in the source overwrites the k-th
    /// occurrence in the target.
    #[default]
    OverwriteInPlace,
    /// Delete every target occurrence of a name, then append the source's
    /// occurrences at the end.
    DeleteAndAppend,
}

/// Ordered collection of email headers.
///
/// Names are matched case-insensitively but kept as written. Values are
/// stored verbatim, folds (CRLF followed by whitespace) included, so that
/// headers nobody touched serialize exactly as they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    name: String,
    /// Value as text; invalid UTF-8 shows up as U+FFFD.
    value: String,
    /// Original value octets when they are not valid UTF-8. Cleared as soon
    /// as the value is overwritten.
    raw: Option<Vec<u8>>,
}

impl Field {
    fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            raw: None,
        }
    }

    fn from_bytes(name: String, value: Vec<u8>) -> Self {
        match String::from_utf8(value) {
            Ok(value) => Self::new(name, value),
            Err(err) => Self {
                name,
                value: String::from_utf8_lossy(err.as_bytes()).into_owned(),
                raw: Some(err.into_bytes()),
            },
        }
    }

    fn value_bytes(&self) -> &[u8] {
        self.raw.as_deref().unwrap_or(self.value.as_bytes())
    }
}

/// Result of [`Headers::parse`].
#[derive(Debug, Default)]
pub struct ParsedHeaders {
    /// The headers found.
    pub headers: Headers,
    /// Offset of the first body byte.
    pub body_offset: usize,
    /// Defects found in the header block.
    pub defects: Vec<Defect>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push(Field::new(name, value));
    }

    /// Sets a header value: the first existing occurrence is overwritten in
    /// place, otherwise the header is appended.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if !self.replace_nth(&name, 0, value.clone()) {
            self.headers.push(Field::new(name, value));
        }
    }

    /// Overwrites the `n`-th (zero-based) occurrence of `name`.
    ///
    /// Returns `false` when there are not that many occurrences.
    pub fn replace_nth(&mut self, name: &str, n: usize, value: impl Into<String>) -> bool {
        match self.nth_mut(name, n) {
            Some(slot) => {
                slot.value = value.into();
                slot.raw = None;
                true
            }
            None => false,
        }
    }

    fn nth_mut(&mut self, name: &str, n: usize) -> Option<&mut Field> {
        self.headers
            .iter_mut()
            .filter(|field| field.name.eq_ignore_ascii_case(name))
            .nth(n)
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
            .map(|field| field.value.as_str())
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|field| field.name.eq_ignore_ascii_case(name))
            .map(|field| field.value.as_str())
            .collect()
    }

    /// Checks whether a header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes all values for a header and returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.headers.len();
        self.headers
            .retain(|field| !field.name.eq_ignore_ascii_case(name));
        before - self.headers.len()
    }

    /// Keeps only the headers for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.headers.retain(|field| keep(&field.name, &field.value));
    }

    /// Returns the number of header fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Checks whether there are no header fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Returns an iterator over all headers in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|field| (field.name.as_str(), field.value.as_str()))
    }

    /// Merges `source` into these headers using `policy`.
    pub fn merge_from(&mut self, source: Self, policy: HeaderMerge) {
        let mut seen: HashMap<String, usize> = HashMap::new();

        for field in source.headers {
            let occurrence = seen.entry(field.name.to_ascii_lowercase()).or_insert(0);
            match policy {
                HeaderMerge::OverwriteInPlace => match self.nth_mut(&field.name, *occurrence) {
                    Some(slot) => {
                        slot.value = field.value;
                        slot.raw = field.raw;
                    }
                    None => self.headers.push(field),
                },
                HeaderMerge::DeleteAndAppend => {
                    if *occurrence == 0 {
                        self.remove(&field.name);
                    }
                    self.headers.push(field);
                }
            }
            *occurrence += 1;
        }
    }

    /// Parses a header block from the start of `data`.
    ///
    /// `data` must already use CRLF line endings. Parsing stops at the first
    /// empty line; the body starts right after it. A line that is neither a
    /// header nor a continuation ends the header block early and is recorded
    /// as [`Defect::MissingHeaderBodySeparator`].
    #[must_use]
    pub fn parse(data: &[u8]) -> ParsedHeaders {
        let mut parsed = ParsedHeaders::default();
        let mut current: Option<(String, Vec<u8>)> = None;
        let mut pos = 0;

        parsed.body_offset = loop {
            if pos >= data.len() {
                break data.len();
            }

            let (line, next) = match find_crlf(&data[pos..]) {
                Some(i) => (&data[pos..pos + i], pos + i + 2),
                None => (&data[pos..], data.len()),
            };

            if line.is_empty() {
                break next;
            }

            // Check for continuation line (starts with space or tab)
            if line[0] == b' ' || line[0] == b'\t' {
                match current.as_mut() {
                    Some((_, value)) => {
                        value.extend_from_slice(b"\r\n");
                        value.extend_from_slice(line);
                    }
                    None => parsed.defects.push(Defect::MalformedHeader(
                        String::from_utf8_lossy(line).into_owned(),
                    )),
                }
                pos = next;
                continue;
            }

            let Some(colon) = line
                .iter()
                .position(|&b| b == b':')
                .filter(|&colon| colon > 0 && line[..colon].iter().all(u8::is_ascii_graphic))
            else {
                parsed.defects.push(Defect::MissingHeaderBodySeparator);
                break pos;
            };

            // Save previous header if exists
            if let Some((name, value)) = current.take() {
                parsed.headers.headers.push(Field::from_bytes(name, value));
            }
            let value = &line[colon + 1..];
            let indent = value.iter().take_while(|&&b| b == b' ' || b == b'\t').count();
            current = Some((
                String::from_utf8_lossy(&line[..colon]).into_owned(),
                value[indent..].to_vec(),
            ));
            pos = next;
        };

        if let Some((name, value)) = current {
            parsed.headers.headers.push(Field::from_bytes(name, value));
        }

        parsed
    }

    /// Writes the header block, each field followed by CRLF.
    ///
    /// Fields read from non-UTF-8 octets are written back byte for byte.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for field in &self.headers {
            out.write_all(field.name.as_bytes())?;
            out.write_all(b": ")?;
            out.write_all(field.value_bytes())?;
            out.write_all(b"\r\n")?;
        }
        Ok(())
    }
}

/// Removes folding from a header value.
#[must_use]
pub fn unfold(value: &str) -> String {
    value.replace("\r\n", "")
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.headers {
            write!(f, "{}: {}\r\n", field.name, field.value)?;
        }
        Ok(())
    }
}
