//! Position-stable text rewriting.
//!
//! Replacement text generally differs in length from the span it replaces, so
//! naive left-to-right substitution would invalidate the offsets of every
//! later match. Replacements are therefore applied in descending start order
//! (rightmost first) as direct slice-and-splice operations against the
//! progressively rewritten string: spans are non-overlapping and sorted, so
//! each replacement's offsets are still valid at the moment it is applied.
//!
//! Spans come from one discovery pass over the original text. Applying the
//! rewriter a second time with the same reference list against its own output
//! is undefined — re-run discovery first.

use anyhow::Result;

use crate::models::{DownloadMapping, MediaKind, MediaReference};

/// Replace every reference's span with the output of `substitute`.
///
/// Every byte outside the matched spans is preserved verbatim, including
/// whitespace and line breaks. An empty reference list returns the text
/// unchanged. A substitution error is a caller bug, not a missing resource —
/// it aborts the rewrite and propagates unmodified.
pub fn rewrite<F>(text: &str, refs: &[MediaReference], mut substitute: F) -> Result<String>
where
    F: FnMut(&MediaReference) -> Result<String>,
{
    let mut result = text.to_string();
    for reference in refs.iter().rev() {
        let replacement = substitute(reference)?;
        result = format!(
            "{}{}{}",
            &result[..reference.start],
            replacement,
            &result[reference.end..]
        );
    }
    Ok(result)
}

/// Default substitution: point each reference at its locally resolved path,
/// keeping the kind-specific markup shape and label.
///
/// References absent from `mapping` are left exactly as written.
pub fn rewrite_to_local(text: &str, refs: &[MediaReference], mapping: &DownloadMapping) -> String {
    let mut result = text.to_string();
    for reference in refs.iter().rev() {
        let path = match mapping.get(&reference.target) {
            Some(path) => path,
            None => continue,
        };
        let replacement = match reference.kind {
            MediaKind::Image => format!("![{}]({})", reference.label, path.display()),
            MediaKind::File => format!("[{}]({})", reference.label, path.display()),
        };
        result = format!(
            "{}{}{}",
            &result[..reference.start],
            replacement,
            &result[reference.end..]
        );
    }
    result
}
