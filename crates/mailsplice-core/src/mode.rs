//! Operation modes and their names.

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

/// Content type a selecting mode keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// `text/plain`.
    Plain,
    /// `text/html`.
    Html,
    /// `text/calendar`.
    Calendar,
    /// `multipart/related`.
    Related,
    /// `multipart/mixed`.
    Mixed,
}

impl Target {
    /// Mode-name suffix of this target.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Html => "html",
            Self::Calendar => "calendar",
            Self::Related => "related",
            Self::Mixed => "mixed",
        }
    }

    /// The `type/subtype` this target selects.
    #[must_use]
    pub const fn essence(self) -> &'static str {
        match self {
            Self::Plain => "text/plain",
            Self::Html => "text/html",
            Self::Calendar => "text/calendar",
            Self::Related => "multipart/related",
            Self::Mixed => "multipart/mixed",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "plain" => Some(Self::Plain),
            "html" => Some(Self::Html),
            "calendar" => Some(Self::Calendar),
            "related" => Some(Self::Related),
            "mixed" => Some(Self::Mixed),
            _ => None,
        }
    }

    const fn is_text(self) -> bool {
        matches!(self, Self::Plain | Self::Html | Self::Calendar)
    }
}

/// What one run does to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Collapse the `multipart/alternative` part onto this representation.
    Alternative(Target),
    /// Replace the whole body with the first part of this (text) type.
    AnyBody(Target),
    /// Replace the whole body with the root's n-th subpart.
    PartIndex(usize),
    /// Add a plain-text alternative next to the first HTML part.
    InsertAlternative,
    /// Relabel text parts as UTF-8.
    Utf8,
    /// Undo base64 and quoted-printable on text parts.
    To7or8bit,
}

const ALTERNATIVE_PREFIX: &str = "alternative2";
const ANY_PREFIX: &str = "any2";
const PART_PREFIX: &str = "multipart_get_part";
const NAME_PREFIXES: [&str; 2] = ["mailsplice-", "mailsplice_"];

impl Mode {
    /// Derives the mode from the name the program was invoked under.
    ///
    /// The directory and extension are dropped, as is a `mailsplice-` or
    /// `mailsplice_` prefix, so `/usr/bin/mailsplice-alternative2html`
    /// selects [`Mode::Alternative`] with [`Target::Html`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] if the name does not denote a mode.
    pub fn from_invocation_name(argv0: &OsStr) -> Result<Self> {
        let stem = Path::new(argv0)
            .file_stem()
            .and_then(OsStr::to_str)
            .ok_or_else(|| Error::Usage(format!("cannot derive a mode from {argv0:?}")))?;
        let name = NAME_PREFIXES
            .iter()
            .find_map(|prefix| stem.strip_prefix(prefix))
            .unwrap_or(stem);
        name.parse()
    }

    /// Content type the mode selects, if it selects by type.
    #[must_use]
    pub const fn target(self) -> Option<&'static str> {
        match self {
            Self::Alternative(target) | Self::AnyBody(target) => Some(target.essence()),
            Self::PartIndex(_) | Self::InsertAlternative | Self::Utf8 | Self::To7or8bit => None,
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || Error::Usage(format!("unknown mode {s:?}"));

        match s {
            "html2alternative" => return Ok(Self::InsertAlternative),
            "utf8" => return Ok(Self::Utf8),
            "to7or8bit" => return Ok(Self::To7or8bit),
            _ => {}
        }

        if let Some(suffix) = s.strip_prefix(ANY_PREFIX) {
            return Target::parse(suffix)
                .filter(|target| target.is_text())
                .map(Self::AnyBody)
                .ok_or_else(unknown);
        }

        let digits = s.strip_prefix(PART_PREFIX).unwrap_or(s);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return digits
                .parse()
                .map(Self::PartIndex)
                .map_err(|_| Error::Usage(format!("part index {digits} is too large")));
        }

        let suffix = s.strip_prefix(ALTERNATIVE_PREFIX).unwrap_or(s);
        Target::parse(suffix).map(Self::Alternative).ok_or_else(unknown)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alternative(target) => write!(f, "{ALTERNATIVE_PREFIX}{}", target.as_str()),
            Self::AnyBody(target) => write!(f, "{ANY_PREFIX}{}", target.as_str()),
            Self::PartIndex(index) => write!(f, "{PART_PREFIX}{index}"),
            Self::InsertAlternative => write!(f, "html2alternative"),
            Self::Utf8 => write!(f, "utf8"),
            Self::To7or8bit => write!(f, "to7or8bit"),
        }
    }
}
