//! Transcriber strategy abstraction and OpenAI-backed implementations.
//!
//! Defines the [`Transcriber`] trait and a closed set of strategies, one per
//! media kind:
//! - **[`ImageTranscriber`]** — describes an image via the chat completions
//!   API with a base64 data-URL attachment.
//! - **[`AudioTranscriber`]** — transcribes audio via the
//!   `audio/transcriptions` multipart endpoint.
//!
//! The caller selects a strategy explicitly with [`transcriber_for`] based on
//! a reference's [`MediaKind`]; there is no name-based dispatch.
//!
//! # Retry Strategy
//!
//! Both strategies retry transient failures with exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Context, Result};
use base64::Engine;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::config::{AudioConfig, ChatConfig, TranscriptionConfig};
use crate::models::MediaKind;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_AUDIO_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// A strategy that turns a local media file into text.
pub trait Transcriber {
    /// Strategy identifier for logs and CLI output (e.g. `"image"`).
    fn name(&self) -> &str;
    /// Produce a transcription or description of the file at `path`.
    fn transcribe(&self, path: &Path) -> Result<String>;
}

/// Select the strategy for a media kind from configuration.
///
/// # Errors
///
/// Returns an error when the provider is `disabled`, unknown, or when the
/// `OPENAI_API_KEY` environment variable is not set.
pub fn transcriber_for(kind: MediaKind, config: &TranscriptionConfig) -> Result<Box<dyn Transcriber>> {
    match config.provider.as_str() {
        "openai" => {
            let api_key = std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?;
            match kind {
                MediaKind::Image => Ok(Box::new(ImageTranscriber {
                    config: config.image.clone(),
                    max_retries: config.max_retries,
                    api_key,
                    client,
                })),
                MediaKind::File => Ok(Box::new(AudioTranscriber {
                    config: config.audio.clone(),
                    max_retries: config.max_retries,
                    api_key,
                    client,
                })),
            }
        }
        "disabled" => bail!(
            "Transcription provider is disabled. Set transcription.provider = \"openai\" to enable."
        ),
        other => bail!("Unknown transcription provider: {}", other),
    }
}

/// Image description via the OpenAI chat completions API.
///
/// The image is attached as a base64 data URL; the configured system prompt
/// steers the description.
pub struct ImageTranscriber {
    config: ChatConfig,
    max_retries: u32,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl Transcriber for ImageTranscriber {
    fn name(&self) -> &str {
        "image"
    }

    fn transcribe(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image file: {}", path.display()))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        let mime = mime_for_image(path);

        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_output_tokens,
            "messages": [
                { "role": "system", "content": self.config.system_prompt },
                { "role": "user", "content": [
                    { "type": "image_url", "image_url": {
                        "url": format!("data:{};base64,{}", mime, encoded)
                    } }
                ] }
            ],
        });

        debug!(path = %path.display(), model = %self.config.model, "describing image");

        let json = post_with_retry(self.max_retries, || {
            self.client
                .post(OPENAI_CHAT_URL)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
        })?;

        json.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing message content"))
    }
}

/// Audio transcription via the OpenAI `audio/transcriptions` endpoint.
pub struct AudioTranscriber {
    config: AudioConfig,
    max_retries: u32,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl Transcriber for AudioTranscriber {
    fn name(&self) -> &str {
        "audio"
    }

    fn transcribe(&self, path: &Path) -> Result<String> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read audio file: {}", path.display()))?;

        debug!(path = %path.display(), model = %self.config.model, "transcribing audio");

        let json = post_with_retry(self.max_retries, || {
            let part = reqwest::blocking::multipart::Part::bytes(bytes.clone())
                .file_name(filename.clone());
            let mut form = reqwest::blocking::multipart::Form::new()
                .text("model", self.config.model.clone())
                .part("file", part);
            if let Some(ref lang) = self.config.language {
                form = form.text("language", lang.clone());
            }
            self.client
                .post(OPENAI_AUDIO_URL)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .multipart(form)
                .send()
        })?;

        json.get("text")
            .and_then(|t| t.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("Invalid transcription response: missing text field"))
    }
}

/// Issue a request with exponential backoff and parse the JSON body.
///
/// 429 and 5xx responses and network errors are retried; other client errors
/// fail immediately.
fn post_with_retry<F>(max_retries: u32, send: F) -> Result<serde_json::Value>
where
    F: Fn() -> reqwest::Result<reqwest::blocking::Response>,
{
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            std::thread::sleep(delay);
        }

        match send() {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response.json().context("Failed to parse API response");
                }

                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().unwrap_or_default();
                    last_err = Some(anyhow::anyhow!("OpenAI API error {}: {}", status, body_text));
                    continue;
                }

                let body_text = response.text().unwrap_or_default();
                bail!("OpenAI API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Request failed after retries")))
}

fn mime_for_image(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}
