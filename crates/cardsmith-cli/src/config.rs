//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use cardsmith_extractor::ExtractorConfig;
use cardsmith_llm::ollama::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration, read from `~/.cardsmith/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Flashcard store file; defaults to `~/.cardsmith/flashcards.json`
    pub store_path: Option<PathBuf>,

    /// Pipeline settings
    pub pipeline: ExtractorConfig,

    /// Model settings
    pub models: ModelSettings,

    /// Global settings
    pub settings: Settings,
}

/// Which models to use and where to reach them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Ollama endpoint
    pub endpoint: String,

    /// Generative model name
    pub generator: String,

    /// HTTP timeout per request, in seconds
    pub request_timeout_secs: u64,
}

/// Global CLI settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Enable colored output
    pub color: bool,

    /// Default output format
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Directory holding the configuration and the default store.
    pub fn home() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".cardsmith"))
    }

    /// Get the configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::home()?.join("config.toml"))
    }

    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from `path`, or defaults if absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config
            .pipeline
            .validate()
            .map_err(|e| CliError::Config(format!("{}: [pipeline] {}", path.display(), e)))?;
        Ok(config)
    }

    /// Store file to use, with `flag` (command line or environment) taking precedence.
    pub fn resolve_store_path(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        match flag.or_else(|| self.store_path.clone()) {
            Some(path) => Ok(path),
            None => Ok(Self::home()?.join("flashcards.json")),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            generator: "llama3.2".to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}
