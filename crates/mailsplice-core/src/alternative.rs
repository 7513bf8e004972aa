//! Collapsing a `multipart/alternative` part onto one of its representations.

use crate::config::SpliceOptions;
use crate::error::{Result, StructuralError};
use crate::validate::{ensure_clean, is_text_type};
use encoding_rs::UTF_8;
use mailsplice_mime::MimeNode;
use tracing::{debug, info};

/// Content type of the container whose children are alternatives.
pub const ALTERNATIVE: &str = "multipart/alternative";
/// Content type of the container whose `type` may name the alternative.
pub const RELATED: &str = "multipart/related";

/// Checks for a `multipart/related` node whose root part is declared to be
/// `multipart/alternative`.
fn is_wrapping_related(node: &MimeNode) -> bool {
    let content_type = node.content_type();
    content_type.matches(RELATED)
        && content_type
            .param("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case(ALTERNATIVE))
}

/// Replaces the message's `multipart/alternative` part by its first direct
/// child of type `target`.
///
/// The first wrapping `multipart/related` (pre-order) narrows the search
/// scope and has its `type` parameter set to `target` afterwards. Within the
/// scope the first `multipart/alternative` is collapsed; later ones are
/// ignored unless [`SpliceOptions::strict`] is set. Text targets are
/// re-encoded as UTF-8.
///
/// # Errors
///
/// Returns a structural error when the message is not multipart, has no
/// alternative part, or the alternative lacks `target`; a validation error
/// when a touched node carries defects.
pub fn resolve_alternative(root: &mut MimeNode, target: &str, options: &SpliceOptions) -> Result<()> {
    if !root.is_multipart() {
        return Err(StructuralError::NotMultipart.into());
    }

    if options.strict {
        let related = root.count(is_wrapping_related);
        if related > 1 {
            return Err(StructuralError::AmbiguousRelated(related).into());
        }
        let alternatives = root.count(|node| node.matches_type(ALTERNATIVE));
        if alternatives != 1 {
            return Err(StructuralError::AmbiguousAlternative(alternatives).into());
        }
    }

    let related_path = root.find_path(is_wrapping_related);
    let scope_path = related_path.clone().unwrap_or_default();
    debug!(?related_path, "alternative search scope");

    let alt_path = root
        .node_at(&scope_path)
        .and_then(|scope| scope.find_path(|node| node.matches_type(ALTERNATIVE)))
        .map(|relative| [scope_path.as_slice(), relative.as_slice()].concat())
        .ok_or(StructuralError::NoAlternativePart)?;

    let alt = root
        .node_at_mut(&alt_path)
        .ok_or(StructuralError::NoAlternativePart)?;

    let Some(children) = alt.children() else {
        // Declared multipart/alternative but decoded as a leaf.
        ensure_clean([("multipart/alternative part", &*alt)])?;
        return Err(StructuralError::TargetAbsent(target.to_string()).into());
    };
    let index = children
        .iter()
        .position(|child| child.matches_type(target))
        .ok_or_else(|| StructuralError::TargetAbsent(target.to_string()))?;
    debug!(?alt_path, index, essence = target, "selected alternative");

    alt.clear_harness();
    let chosen = alt.take_children().swap_remove(index);
    alt.replace_contents_with(chosen, options.header_merge);
    if is_text_type(target) {
        alt.set_charset(UTF_8)?;
    }

    if let Some(path) = &related_path {
        if let Some(related) = root.node_at_mut(path) {
            related.set_related_type_param(target)?;
        }
    }

    let mut touched = vec![("message", &*root)];
    if let Some(related) = related_path.as_deref().and_then(|path| root.node_at(path)) {
        touched.push(("multipart/related part", related));
    }
    if let Some(alt) = root.node_at(&alt_path) {
        touched.push(("multipart/alternative part", alt));
    }
    ensure_clean(touched)?;

    info!(
        essence = target,
        fixed_related = related_path.is_some(),
        "collapsed multipart/alternative"
    );
    Ok(())
}
