//! Reference discovery: finds embedded media links in a text document.
//!
//! Two independent recognizers run over the full text:
//!
//! - **Image**: `![label](target)` — an exclamation mark immediately followed
//!   by a bracketed label and a parenthesized target.
//! - **Typed file**: `[label.ext](target)` — a bracketed label ending in one
//!   of a fixed set of non-image extensions (audio, video, document, archive
//!   formats), immediately followed by a parenthesized target.
//!
//! Matches from both recognizers are pooled and sorted by ascending start
//! offset. Discovery is read-only and deterministic: identical input always
//! yields an identical, identically ordered list. The grammar has no
//! escaping — a label or target containing a literal `]` or `)` simply fails
//! to match, and malformed/unterminated markup is silently skipped.
//!
//! A reference list from one scan never contains overlapping spans: the two
//! patterns are near-disjoint (the file pattern requires a known non-image
//! extension, the image pattern requires the `!` prefix), and the one nested
//! case — a file-syntax match inside an image label — is dropped in favor of
//! the image match. A target
//! like `photo.png` written in file-link syntax matches neither pattern and
//! is not treated as media.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{MediaKind, MediaReference};

/// `![label](target)` — label may be empty, target may not.
static IMAGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("image pattern is valid"));

/// `[label.ext](target)` for the recognized non-image extensions.
static FILE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+\.(mp3|mp4|wav|avi|mov|pdf|zip|rar|doc|docx))\]\(([^)]+)\)")
        .expect("file pattern is valid")
});

/// Find all media references in `text`, ordered by ascending start offset.
///
/// Zero matches returns an empty vec, never an error.
pub fn find_media_refs(text: &str) -> Vec<MediaReference> {
    let mut refs = Vec::new();

    for caps in IMAGE_PATTERN.captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always present");
        let target = &caps[2];
        refs.push(MediaReference {
            start: whole.start(),
            end: whole.end(),
            raw_text: whole.as_str().to_string(),
            target: target.to_string(),
            label: caps[1].to_string(),
            kind: MediaKind::Image,
            extension: extension_of(target),
        });
    }

    let image_count = refs.len();
    for caps in FILE_PATTERN.captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always present");
        // Image matches claim their spans first: a file-syntax match nested
        // inside an image reference (label ending in a recognized extension)
        // must not produce a second, overlapping reference.
        if refs[..image_count]
            .iter()
            .any(|r| whole.start() < r.end && r.start < whole.end())
        {
            continue;
        }
        refs.push(MediaReference {
            start: whole.start(),
            end: whole.end(),
            raw_text: whole.as_str().to_string(),
            target: caps[3].to_string(),
            label: caps[1].to_string(),
            kind: MediaKind::File,
            extension: caps[2].to_lowercase(),
        });
    }

    refs.sort_by_key(|r| r.start);
    refs
}

/// Substring of `target` after the last dot, lower-cased. Empty if `target`
/// has no dot.
fn extension_of(target: &str) -> String {
    match target.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}
