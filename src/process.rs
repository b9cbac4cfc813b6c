//! CLI command orchestration: scan, fetch, rewrite, transcribe.
//!
//! Each `run_*` function is the entry point for one `medx` subcommand. Input
//! documents may be local paths or absolute URLs; output is printed in the
//! terse `key: value` style used across the CLI.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

use crate::config::Config;
use crate::discover::find_media_refs;
use crate::extractor::MediaExtractor;
use crate::models::{MediaKind, MediaReference};
use crate::rewrite::{rewrite, rewrite_to_local};
use crate::transcribe::transcriber_for;

/// List every reference found in the input document.
pub fn run_scan(config: &Config, input: &str) -> Result<()> {
    let text = load_input(config, input)?;
    let refs = find_media_refs(&text);

    println!("scan {}", input);
    println!("  references found: {}", refs.len());
    for r in &refs {
        println!(
            "  [{}..{}] {} target={} label={:?} ext={}",
            r.start,
            r.end,
            kind_name(r.kind),
            r.target,
            r.label,
            r.extension
        );
    }
    println!("ok");
    Ok(())
}

/// Discover and resolve every reference, reporting per-target outcomes.
pub fn run_fetch(config: &Config, input: &str) -> Result<()> {
    let text = load_input(config, input)?;
    let extractor = MediaExtractor::new(&config.media, &config.fetch)?;
    let (refs, mapping) = extractor.process_text(&text);

    println!("fetch {}", input);
    println!("  references found: {}", refs.len());
    for r in &refs {
        match mapping.get(&r.target) {
            Some(path) => println!("  {} -> {}", r.target, path.display()),
            None => println!("  {} -> (failed)", r.target),
        }
    }
    println!("  resolved: {}", mapping.len());
    println!("  failed: {}", refs.len() - mapping.len());
    println!("ok");
    Ok(())
}

/// Rewrite all references to their locally resolved paths (the default
/// substitution) and write the result.
pub fn run_rewrite(config: &Config, input: &str, output: Option<&Path>) -> Result<()> {
    let text = load_input(config, input)?;
    let extractor = MediaExtractor::new(&config.media, &config.fetch)?;
    let (refs, mapping) = extractor.process_text(&text);
    let rewritten = rewrite_to_local(&text, &refs, &mapping);

    write_output(&rewritten, output)?;

    println!("rewrite {}", input);
    println!("  references found: {}", refs.len());
    println!("  rewritten: {}", mapping.len());
    if !mapping.covers(&refs) {
        println!("  left as written: {}", refs.len() - mapping.len());
    }
    println!("ok");
    Ok(())
}

/// Full pipeline: discover, resolve, transcribe each resolved reference with
/// the kind-appropriate strategy, and splice the transcriptions into the
/// document. Unresolved references are left as written.
pub fn run_transcribe(config: &Config, input: &str, output: Option<&Path>) -> Result<()> {
    let text = load_input(config, input)?;
    let extractor = MediaExtractor::new(&config.media, &config.fetch)?;
    let (refs, mapping) = extractor.process_text(&text);

    let image = transcriber_for(MediaKind::Image, &config.transcription)?;
    let audio = transcriber_for(MediaKind::File, &config.transcription)?;

    let mut transcribed = 0usize;
    let rewritten = rewrite(&text, &refs, |r| {
        let path = match mapping.get(&r.target) {
            Some(p) => p,
            None => return Ok(r.raw_text.clone()),
        };
        let strategy = match r.kind {
            MediaKind::Image => &image,
            MediaKind::File => &audio,
        };
        let transcript = strategy
            .transcribe(path)
            .with_context(|| format!("{} transcription failed for {}", strategy.name(), r.target))?;
        transcribed += 1;
        Ok(format_transcript(r, &transcript))
    })?;

    write_output(&rewritten, output)?;

    println!("transcribe {}", input);
    println!("  references found: {}", refs.len());
    println!("  transcribed: {}", transcribed);
    if !mapping.covers(&refs) {
        println!("  left as written: {}", refs.len() - mapping.len());
    }
    println!("ok");
    Ok(())
}

/// Wrap a transcription in the kind-specific block spliced into the text.
fn format_transcript(reference: &MediaReference, transcript: &str) -> String {
    match reference.kind {
        MediaKind::Image => format!(
            "<image_description>\n{}\n</image_description>",
            transcript
        ),
        MediaKind::File => format!(
            "<audio_transcription>\n{}\n</audio_transcription>",
            transcript
        ),
    }
}

fn kind_name(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "image",
        MediaKind::File => "file",
    }
}

/// Read the input document from a local path or an absolute URL.
fn load_input(config: &Config, input: &str) -> Result<String> {
    if input.starts_with("http://") || input.starts_with("https://") {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.fetch.timeout_secs))
            .build()?;
        let response = client
            .get(input)
            .send()
            .with_context(|| format!("Failed to fetch document: {}", input))?
            .error_for_status()
            .with_context(|| format!("Document fetch returned an error status: {}", input))?;
        Ok(response.text()?)
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read input file: {}", input))
    }
}

fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        }
        None => print!("{}", text),
    }
    Ok(())
}
