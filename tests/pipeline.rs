//! Integration tests for the library pipeline.
//!
//! These tests prove that discovery, resolution, and rewriting compose
//! end-to-end through the public API, including a custom [`Transcriber`]
//! strategy standing in for the LLM-backed ones.

use anyhow::Result;
use media_harness::config::{FetchConfig, MediaConfig};
use media_harness::discover::find_media_refs;
use media_harness::extractor::MediaExtractor;
use media_harness::models::MediaKind;
use media_harness::rewrite::{rewrite, rewrite_to_local};
use media_harness::transcribe::Transcriber;
use std::path::Path;
use tempfile::TempDir;

/// A transcriber that reads the file's contents back as the transcript.
struct EchoTranscriber;

impl Transcriber for EchoTranscriber {
    fn name(&self) -> &str {
        "echo"
    }

    fn transcribe(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }
}

fn extractor_for(dir: &Path) -> MediaExtractor {
    let media = MediaConfig {
        base_url: None,
        download_dir: dir.join("downloads"),
    };
    MediaExtractor::new(&media, &FetchConfig { timeout_secs: 5 }).unwrap()
}

#[test]
fn discover_resolve_rewrite_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    std::fs::write(root.join("photo.png"), "a photo of fruit").unwrap();
    std::fs::write(root.join("clip.mp3"), "spoken transcript").unwrap();

    let text = format!(
        "Intro.\n\n![fruit]({root}/photo.png)\n\nCaption under the image.\n\n[clip.mp3]({root}/clip.mp3)\n\nOutro.\n",
        root = root.display()
    );

    let extractor = extractor_for(root);
    let (refs, mapping) = extractor.process_text(&text);
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].kind, MediaKind::Image);
    assert_eq!(refs[1].kind, MediaKind::File);
    assert!(mapping.covers(&refs), "every reference should resolve");

    let echo = EchoTranscriber;
    let rewritten = rewrite(&text, &refs, |r| {
        let path = mapping.get(&r.target).expect("covered above");
        echo.transcribe(path)
    })
    .unwrap();

    assert!(rewritten.contains("a photo of fruit"));
    assert!(rewritten.contains("spoken transcript"));
    assert!(!rewritten.contains("!["));
    // Text outside the spans survives byte-for-byte.
    assert!(rewritten.starts_with("Intro.\n\n"));
    assert!(rewritten.contains("\n\nCaption under the image.\n\n"));
    assert!(rewritten.ends_with("\n\nOutro.\n"));
}

#[test]
fn identity_rewrite_round_trips_after_resolution() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    std::fs::write(root.join("a.png"), b"x").unwrap();

    let text = format!("start ![a]({}/a.png) end\n", root.display());
    let extractor = extractor_for(root);
    let (refs, _) = extractor.process_text(&text);

    let out = rewrite(&text, &refs, |r| Ok(r.raw_text.clone())).unwrap();
    assert_eq!(out, text);
}

#[test]
fn stale_refs_must_be_rediscovered_after_rewrite() {
    let text = "a ![1](1.png) b ![2](2.png) c";
    let refs = find_media_refs(text);
    let once = rewrite(text, &refs, |_| Ok("REPLACED".to_string())).unwrap();

    // Spans from the first pass do not describe the new text; a second pass
    // needs a fresh discovery run.
    let fresh = find_media_refs(&once);
    assert!(fresh.is_empty());
    assert_eq!(once, "a REPLACED b REPLACED c");
}

#[test]
fn rewrite_to_local_uses_resolved_cache_paths() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    // Seed the cache and configure an unreachable base URL: resolution must
    // come from the cache alone.
    let downloads = root.join("downloads");
    std::fs::create_dir_all(&downloads).unwrap();
    std::fs::write(downloads.join("img.png"), b"cached").unwrap();

    let media = MediaConfig {
        base_url: Some("http://127.0.0.1:1".to_string()),
        download_dir: downloads.clone(),
    };
    let extractor = MediaExtractor::new(&media, &FetchConfig { timeout_secs: 1 }).unwrap();

    let text = "see ![pic](i/img.png) here";
    let (refs, mapping) = extractor.process_text(text);
    assert!(mapping.covers(&refs));

    let out = rewrite_to_local(text, &refs, &mapping);
    assert_eq!(
        out,
        format!("see ![pic]({}) here", downloads.join("img.png").display())
    );
}
