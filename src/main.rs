//! # Media Harness CLI (`medx`)
//!
//! The `medx` binary drives the media extraction pipeline. It provides
//! commands for listing references in a document, resolving them into the
//! local download cache, and rewriting the document with local paths or
//! LLM transcriptions.
//!
//! ## Usage
//!
//! ```bash
//! medx --config ./config/medx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `medx scan <input>` | List media references with spans and targets |
//! | `medx fetch <input>` | Resolve all references (download or cache hit) |
//! | `medx rewrite <input>` | Rewrite references to local cache paths |
//! | `medx transcribe <input>` | Replace references with LLM transcriptions |
//!
//! `<input>` may be a local file path or an absolute `http(s)` URL.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use media_harness::config;
use media_harness::process;

/// Media Harness CLI — media-link extraction, download caching, and
/// transcription-based document rewriting.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/medx.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "medx",
    about = "Media Harness — media-link extraction, download caching, and transcription-based document rewriting",
    version,
    long_about = "Media Harness scans documents for embedded image and file references, \
    resolves them through an on-disk download cache, and rewrites the document by replacing \
    each reference with a local path or an LLM-generated transcription."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/medx.toml`. Base URL, download directory,
    /// fetch, and transcription settings are read from this file.
    #[arg(long, global = true, default_value = "./config/medx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// List media references found in a document.
    ///
    /// Runs discovery only: prints each reference's span, kind, target,
    /// label, and extension. Read-only — no downloads are performed.
    Scan {
        /// Input document: local path or absolute URL.
        input: String,
    },

    /// Resolve every reference to a local file.
    ///
    /// Downloads each reference into the configured download directory
    /// (skipping files already cached) and prints the per-target outcome.
    /// Individual failures are reported but do not abort the batch.
    Fetch {
        /// Input document: local path or absolute URL.
        input: String,
    },

    /// Rewrite references to their local cache paths.
    ///
    /// Resolves all references, then rewrites each one to point at its
    /// locally resolved file, keeping the markup shape and label.
    /// Unresolved references are left exactly as written.
    Rewrite {
        /// Input document: local path or absolute URL.
        input: String,

        /// Write the rewritten document here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace references with LLM transcriptions.
    ///
    /// Resolves all references, then describes each image and transcribes
    /// each audio file with the configured provider, splicing the results
    /// into the document. Requires transcription.provider = "openai" and
    /// the OPENAI_API_KEY environment variable.
    Transcribe {
        /// Input document: local path or absolute URL.
        input: String,

        /// Write the rewritten document here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Scan { input } => process::run_scan(&config, &input),
        Commands::Fetch { input } => process::run_fetch(&config, &input),
        Commands::Rewrite { input, output } => {
            process::run_rewrite(&config, &input, output.as_deref())
        }
        Commands::Transcribe { input, output } => {
            process::run_transcribe(&config, &input, output.as_deref())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
