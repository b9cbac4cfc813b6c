use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub media: MediaConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

/// Where media references are fetched from and cached to.
#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    /// Base URL prepended to relative targets. When absent, relative targets
    /// are treated as pre-existing local paths.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Directory downloaded files are cached under (created if absent).
    pub download_dir: PathBuf,
}

/// HTTP settings for media downloads and document fetches.
#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Transcription provider selection plus one config per capability.
#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptionConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub image: ChatConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            image: ChatConfig::default(),
            audio: AudioConfig::default(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    3
}

/// Chat-completion options for image description.
#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_image_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_image_model(),
            temperature: default_temperature(),
            system_prompt: default_image_prompt(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

fn default_image_model() -> String {
    "gpt-4.1-mini".to_string()
}
fn default_temperature() -> f64 {
    0.1
}
fn default_image_prompt() -> String {
    "Describe the image in detail.".to_string()
}
fn default_max_output_tokens() -> u32 {
    1024
}

/// Speech-to-text options for audio transcription.
#[derive(Debug, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_audio_model")]
    pub model: String,
    /// ISO-639-1 hint for the transcription model; autodetected when absent.
    #[serde(default)]
    pub language: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            model: default_audio_model(),
            language: None,
        }
    }
}

fn default_audio_model() -> String {
    "whisper-1".to_string()
}

impl TranscriptionConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.media.download_dir.as_os_str().is_empty() {
        anyhow::bail!("media.download_dir must not be empty");
    }

    if let Some(ref base) = config.media.base_url {
        if !base.starts_with("http://") && !base.starts_with("https://") {
            anyhow::bail!("media.base_url must start with http:// or https://");
        }
    }

    if config.fetch.timeout_secs == 0 {
        anyhow::bail!("fetch.timeout_secs must be > 0");
    }

    if config.transcription.is_enabled() {
        if !(0.0..=2.0).contains(&config.transcription.image.temperature) {
            anyhow::bail!("transcription.image.temperature must be in [0.0, 2.0]");
        }
        if config.transcription.image.max_output_tokens == 0 {
            anyhow::bail!("transcription.image.max_output_tokens must be > 0");
        }
    }

    match config.transcription.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown transcription provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(config)
}
