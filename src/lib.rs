//! # Media Harness
//!
//! Media-link extraction, download caching, and transcription-based document
//! rewriting.
//!
//! Media Harness scans a UTF-8 document for embedded media references —
//! images in `![label](target)` markup and typed files (audio, video,
//! documents, archives) in `[label.ext](target)` markup — resolves each
//! reference to a local file via an on-disk download cache, and rewrites the
//! document by replacing each matched span with substitute text (typically
//! an LLM-generated description or transcription) while preserving every
//! byte outside the matched spans.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌─────────────┐   ┌──────────┐
//! │ Document │──▶│ Discovery │──▶│ Resolution   │──▶│ Rewriting │
//! │ (file or │   │ (regex    │   │ (download +  │   │ (splice,  │
//! │  URL)    │   │  scan)    │   │  disk cache) │   │  rightmost│
//! └──────────┘   └───────────┘   └─────────────┘   │  first)   │
//!                                                  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! medx scan article.md              # list discovered references
//! medx fetch article.md             # download/resolve all references
//! medx rewrite article.md -o out.md # point references at local cache paths
//! medx transcribe article.md        # splice in LLM transcriptions
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`discover`] | Reference discovery |
//! | [`extractor`] | Resource resolution and download cache |
//! | [`rewrite`] | Position-stable text rewriting |
//! | [`transcribe`] | Transcriber strategies (image, audio) |
//! | [`process`] | CLI command orchestration |

pub mod config;
pub mod discover;
pub mod extractor;
pub mod models;
pub mod process;
pub mod rewrite;
pub mod transcribe;
