//! Resource resolution: turning reference targets into local files.
//!
//! A [`MediaExtractor`] owns one download directory and resolves references
//! against it:
//!
//! - absolute `http(s)://` targets are fetched directly;
//! - relative targets are joined onto the configured base URL, if any;
//! - with no base URL, a relative target is treated as a pre-existing local
//!   path and resolution succeeds iff it exists on disk (no network);
//! - downloads are keyed by the target's basename — if the file already
//!   exists under the download directory, resolution short-circuits to it
//!   with zero network calls.
//!
//! Resolution of an individual reference never aborts a batch: transport
//! failures are logged and the reference is simply absent from the resulting
//! [`DownloadMapping`]. No retry is attempted for media downloads.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{FetchConfig, MediaConfig};
use crate::discover::find_media_refs;
use crate::models::{DownloadMapping, MediaReference};

pub struct MediaExtractor {
    base_url: Option<String>,
    download_dir: PathBuf,
    client: reqwest::blocking::Client,
}

impl MediaExtractor {
    /// Build an extractor and create its download directory if absent.
    pub fn new(media: &MediaConfig, fetch: &FetchConfig) -> Result<Self> {
        std::fs::create_dir_all(&media.download_dir).with_context(|| {
            format!(
                "Failed to create download directory: {}",
                media.download_dir.display()
            )
        })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(fetch.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: media
                .base_url
                .as_ref()
                .map(|b| b.trim_end_matches('/').to_string()),
            download_dir: media.download_dir.clone(),
            client,
        })
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Cache location a downloaded reference lands at, whether or not it has
    /// been resolved yet.
    pub fn local_path_for(&self, reference: &MediaReference) -> PathBuf {
        self.download_dir.join(reference.basename())
    }

    /// Discover all references in `text` and resolve each one.
    ///
    /// References that fail to resolve are logged and omitted from the
    /// mapping; the rest of the batch still completes.
    pub fn process_text(&self, text: &str) -> (Vec<MediaReference>, DownloadMapping) {
        let refs = find_media_refs(text);
        let mut mapping = DownloadMapping::new();

        for reference in &refs {
            if let Some(path) = self.resolve(reference) {
                mapping.insert(&reference.target, path);
            }
        }

        info!(
            found = refs.len(),
            resolved = mapping.len(),
            "processed text"
        );
        (refs, mapping)
    }

    /// The URL a network fetch for `target` would hit: the target itself
    /// when absolute, the base-URL join (duplicate separators stripped) when
    /// relative. `None` when the target is a local path (no base URL
    /// configured and not absolute).
    pub fn fetch_source(&self, target: &str) -> Option<String> {
        if is_absolute_url(target) {
            Some(target.to_string())
        } else {
            self.base_url
                .as_ref()
                .map(|base| format!("{}/{}", base, target.trim_start_matches('/')))
        }
    }

    /// Resolve one reference to a local path, or `None` on failure.
    ///
    /// Failure is per-reference and non-fatal; the underlying cause is
    /// logged with the target for diagnosis.
    pub fn resolve(&self, reference: &MediaReference) -> Option<PathBuf> {
        let target = &reference.target;

        let url = if let Some(url) = self.fetch_source(target) {
            url
        } else {
            // No base URL and not absolute: the target is expected to be a
            // pre-existing local path.
            let path = PathBuf::from(target);
            if path.exists() {
                return Some(path);
            }
            warn!(target = %target, "local media path does not exist");
            return None;
        };

        let local_path = self.download_dir.join(reference.basename());
        if local_path.exists() {
            debug!(path = %local_path.display(), "cache hit");
            return Some(local_path);
        }

        match self.fetch_to(&url, &local_path) {
            Ok(()) => {
                info!(url = %url, path = %local_path.display(), "downloaded");
                Some(local_path)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "download failed");
                None
            }
        }
    }

    /// Streaming fetch of `url` into `dest`, written via a temp file in the
    /// same directory then renamed into place so concurrent writers of the
    /// same basename never expose a partial file.
    fn fetch_to(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("request to {} returned an error status", url))?;

        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());
        let tmp_path = dest.with_file_name(format!("{}.part", file_name));
        let mut file = std::fs::File::create(&tmp_path)
            .with_context(|| format!("failed to create {}", tmp_path.display()))?;

        if let Err(e) = std::io::copy(&mut response, &mut file) {
            drop(file);
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e).with_context(|| format!("failed to stream {} to disk", url));
        }

        std::fs::rename(&tmp_path, dest)
            .with_context(|| format!("failed to move download into {}", dest.display()))?;
        Ok(())
    }
}

fn is_absolute_url(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;
    use tempfile::TempDir;

    fn extractor(base_url: Option<&str>, download_dir: &Path) -> MediaExtractor {
        let media = MediaConfig {
            base_url: base_url.map(String::from),
            download_dir: download_dir.to_path_buf(),
        };
        MediaExtractor::new(&media, &FetchConfig { timeout_secs: 1 }).unwrap()
    }

    fn reference(target: &str) -> MediaReference {
        MediaReference {
            start: 0,
            end: target.len(),
            raw_text: format!("![]({})", target),
            target: target.to_string(),
            label: String::new(),
            kind: MediaKind::Image,
            extension: "png".to_string(),
        }
    }

    #[test]
    fn construction_creates_download_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("downloads");
        assert!(!dir.exists());
        extractor(None, &dir);
        assert!(dir.is_dir());
    }

    #[test]
    fn existing_local_path_resolves_without_network() {
        let tmp = TempDir::new().unwrap();
        let media_file = tmp.path().join("photo.png");
        std::fs::write(&media_file, b"png bytes").unwrap();

        let ex = extractor(None, &tmp.path().join("downloads"));
        let resolved = ex
            .resolve(&reference(media_file.to_str().unwrap()))
            .unwrap();
        assert_eq!(resolved, media_file);
    }

    #[test]
    fn missing_local_path_fails_resolution() {
        let tmp = TempDir::new().unwrap();
        let ex = extractor(None, &tmp.path().join("downloads"));
        assert!(ex.resolve(&reference("no/such/file.png")).is_none());
    }

    #[test]
    fn cache_hit_short_circuits_before_any_fetch() {
        let tmp = TempDir::new().unwrap();
        let downloads = tmp.path().join("downloads");
        std::fs::create_dir_all(&downloads).unwrap();
        std::fs::write(downloads.join("a.png"), b"cached").unwrap();

        // The base URL is unreachable; resolution must still succeed from
        // the cache without attempting a connection.
        let ex = extractor(Some("http://127.0.0.1:1"), &downloads);
        let resolved = ex.resolve(&reference("i/a.png")).unwrap();
        assert_eq!(resolved, downloads.join("a.png"));
    }

    #[test]
    fn absolute_url_cache_hit_uses_basename() {
        let tmp = TempDir::new().unwrap();
        let downloads = tmp.path().join("downloads");
        std::fs::create_dir_all(&downloads).unwrap();
        std::fs::write(downloads.join("a.png"), b"cached").unwrap();

        let ex = extractor(None, &downloads);
        let resolved = ex.resolve(&reference("http://127.0.0.1:1/x/a.png")).unwrap();
        assert_eq!(resolved, downloads.join("a.png"));
    }

    #[test]
    fn failed_fetch_is_omitted_and_batch_continues() {
        let tmp = TempDir::new().unwrap();
        let downloads = tmp.path().join("downloads");
        let good_file = tmp.path().join("good.png");
        std::fs::write(&good_file, b"ok").unwrap();

        let text = format!(
            "a ![bad](http://127.0.0.1:1/broken.png) b ![good]({}) c",
            good_file.display()
        );

        let ex = extractor(None, &downloads);
        let (refs, mapping) = ex.process_text(&text);
        assert_eq!(refs.len(), 2);
        assert!(!mapping.contains("http://127.0.0.1:1/broken.png"));
        assert!(mapping.contains(good_file.to_str().unwrap()));
        assert_eq!(mapping.len(), 1);
        assert!(!mapping.covers(&refs));
    }

    #[test]
    fn absolute_target_is_its_own_fetch_source() {
        let tmp = TempDir::new().unwrap();
        let ex = extractor(Some("http://host/data"), tmp.path());
        assert_eq!(
            ex.fetch_source("http://host/a.png").as_deref(),
            Some("http://host/a.png")
        );
    }

    #[test]
    fn relative_target_joins_base_url() {
        let tmp = TempDir::new().unwrap();
        let ex = extractor(Some("http://host/data/"), tmp.path());
        assert_eq!(
            ex.fetch_source("i/photo.png").as_deref(),
            Some("http://host/data/i/photo.png")
        );
        // Duplicate separators are stripped on both sides of the join.
        assert_eq!(
            ex.fetch_source("/i/photo.png").as_deref(),
            Some("http://host/data/i/photo.png")
        );
    }

    #[test]
    fn relative_target_without_base_has_no_fetch_source() {
        let tmp = TempDir::new().unwrap();
        let ex = extractor(None, tmp.path());
        assert_eq!(ex.fetch_source("i/photo.png"), None);
    }

    #[test]
    fn local_path_for_joins_basename() {
        let tmp = TempDir::new().unwrap();
        let downloads = tmp.path().join("downloads");
        let ex = extractor(Some("http://host/data"), &downloads);
        assert_eq!(
            ex.local_path_for(&reference("i/deep/photo.png")),
            downloads.join("photo.png")
        );
    }
}
