//! Core data models used throughout Media Harness.
//!
//! These types represent the media references discovered in a document and
//! the mapping from reference targets to locally resolved files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The markup form a reference was written in.
///
/// Images use the `![label](target)` form; everything else (audio, video,
/// documents, archives) uses the `[label.ext](target)` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    File,
}

/// One discovered embedded-media occurrence within a source text.
///
/// The span `[start, end)` is a byte-offset interval into the original text,
/// always on UTF-8 character boundaries (it comes straight from a regex
/// match). References are immutable after discovery; rewriting never touches
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    /// Byte offset of the first matched byte.
    pub start: usize,
    /// Byte offset one past the last matched byte.
    pub end: usize,
    /// The full matched substring, exactly as it appears in the source.
    pub raw_text: String,
    /// The referenced resource locator as written (relative path, filename,
    /// or absolute URL).
    pub target: String,
    /// Alt-text / link-text captured alongside the reference (may be empty).
    pub label: String,
    pub kind: MediaKind,
    /// Lower-cased file extension.
    pub extension: String,
}

impl MediaReference {
    /// Canonical local filename for this reference: the final path segment
    /// of `target`. Two references naming the same file in different
    /// subtrees collide on purpose (the cache is filename-keyed).
    pub fn basename(&self) -> &str {
        self.target
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.target)
    }
}

/// Mapping from reference `target` (as written) to a resolved local path.
///
/// Populated lazily as references are resolved. A failed resolution is an
/// absence, not an error — callers needing all-or-nothing semantics check
/// [`DownloadMapping::covers`] before rewriting.
#[derive(Debug, Clone, Default)]
pub struct DownloadMapping {
    paths: BTreeMap<String, PathBuf>,
}

impl DownloadMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: &str, path: PathBuf) {
        self.paths.insert(target.to_string(), path);
    }

    pub fn get(&self, target: &str) -> Option<&Path> {
        self.paths.get(target).map(PathBuf::as_path)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.paths.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// True if every reference in `refs` resolved to a local path.
    pub fn covers(&self, refs: &[MediaReference]) -> bool {
        refs.iter().all(|r| self.contains(&r.target))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.paths.iter().map(|(t, p)| (t.as_str(), p.as_path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_ref(target: &str) -> MediaReference {
        MediaReference {
            start: 0,
            end: 1,
            raw_text: String::new(),
            target: target.to_string(),
            label: String::new(),
            kind: MediaKind::Image,
            extension: "png".to_string(),
        }
    }

    #[test]
    fn basename_strips_directories() {
        assert_eq!(image_ref("i/deep/photo.png").basename(), "photo.png");
    }

    #[test]
    fn basename_of_bare_filename_is_identity() {
        assert_eq!(image_ref("clip.mp3").basename(), "clip.mp3");
    }

    #[test]
    fn basename_of_url_is_last_segment() {
        assert_eq!(image_ref("http://host/data/a.png").basename(), "a.png");
    }

    #[test]
    fn covers_requires_every_target() {
        let r = image_ref("a.png");
        let mut mapping = DownloadMapping::new();
        assert!(!mapping.covers(std::slice::from_ref(&r)));
        mapping.insert("a.png", PathBuf::from("/tmp/a.png"));
        assert!(mapping.covers(std::slice::from_ref(&r)));
    }
}
