//! Defect checks shared by all operations.

use crate::error::{Error, Result};
use mailsplice_mime::MimeNode;

/// Fails with [`Error::Validation`] on the first node that carries defects.
pub(crate) fn ensure_clean<'a>(
    nodes: impl IntoIterator<Item = (&'a str, &'a MimeNode)>,
) -> Result<()> {
    for (role, node) in nodes {
        if node.has_defects() {
            tracing::debug!(role, defects = ?node.defects, "defective node");
            return Err(Error::Validation {
                node: role.to_string(),
                defects: node.defects.clone(),
            });
        }
    }
    Ok(())
}

/// Checks whether `essence` names a `text/*` type.
pub(crate) fn is_text_type(essence: &str) -> bool {
    essence
        .split_once('/')
        .is_some_and(|(main, _)| main.trim().eq_ignore_ascii_case("text"))
}
