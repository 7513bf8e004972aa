//! Run configuration, resolved once from the invocation and environment.

use crate::error::{Error, Result};
use crate::mode::Mode;
use mailsplice_mime::HeaderMerge;
use std::ffi::OsString;

/// Environment variable overriding the invocation-name mode.
pub const MODE_VAR: &str = "MAILSPLICE_MODE";
/// Environment variable selecting the header merge policy.
pub const HEADER_MERGE_VAR: &str = "MAILSPLICE_HEADER_MERGE";
/// Environment variable enabling strict uniqueness checks.
pub const STRICT_VAR: &str = "MAILSPLICE_STRICT";

/// Knobs shared by the splicing operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpliceOptions {
    /// How the chosen part's headers land on the node it replaces.
    pub header_merge: HeaderMerge,
    /// Fail on more than one `multipart/related` wrapper or a number of
    /// `multipart/alternative` parts other than one, instead of taking the
    /// first.
    pub strict: bool,
}

/// Everything a run needs besides the message itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Operation to perform.
    pub mode: Mode,
    /// Options for the splicing operations.
    pub options: SpliceOptions,
}

impl Config {
    /// Creates a configuration with default options.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            options: SpliceOptions::default(),
        }
    }

    /// Resolves the configuration of the running process.
    ///
    /// # Errors
    ///
    /// See [`Config::resolve`].
    pub fn from_env() -> Result<Self> {
        Self::resolve(std::env::args_os(), |name| std::env::var(name).ok())
    }

    /// Resolves a configuration from a full argument vector (program name
    /// first) and an environment lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] if arguments follow the program name, no
    /// mode can be determined, or a variable holds an unrecognized value.
    pub fn resolve<I, F>(args: I, var: F) -> Result<Self>
    where
        I: IntoIterator<Item = OsString>,
        F: Fn(&str) -> Option<String>,
    {
        let mut args = args.into_iter();
        let program = args.next();
        let extra = args.count();
        if extra > 0 {
            return Err(Error::Usage(format!(
                "this program takes no arguments, you gave {extra}"
            )));
        }

        let mode = match var(MODE_VAR) {
            Some(name) => name.trim().parse()?,
            None => {
                let program = program.ok_or_else(|| {
                    Error::Usage(format!("no program name and {MODE_VAR} is not set"))
                })?;
                Mode::from_invocation_name(&program)?
            }
        };

        let header_merge = match var(HEADER_MERGE_VAR).as_deref().map(str::trim) {
            None | Some("" | "overwrite") => HeaderMerge::OverwriteInPlace,
            Some("append") => HeaderMerge::DeleteAndAppend,
            Some(other) => {
                return Err(Error::Usage(format!(
                    "{HEADER_MERGE_VAR} must be \"overwrite\" or \"append\", got {other:?}"
                )));
            }
        };

        let strict = var(STRICT_VAR).is_some_and(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        });

        Ok(Self {
            mode,
            options: SpliceOptions {
                header_merge,
                strict,
            },
        })
    }
}
