use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

use crate::error::ConfigError;
use crate::request::{Color, TextStyle};

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub code: CodeConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    pub font_family: String,
    pub foreground: Color,
    pub background: Color,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            font_family: "Roboto Mono".to_string(),
            foreground: Color::rgb(24.0 / 255.0, 128.0 / 255.0, 56.0 / 255.0),
            background: Color::rgb(241.0 / 255.0, 243.0 / 255.0, 244.0 / 255.0),
        }
    }
}

impl CodeConfig {
    /// Apply the code look (font and colors) onto a character style.
    pub fn apply(&self, style: &mut TextStyle) {
        style.font_family = Some(self.font_family.clone());
        style.foreground_color = Some(self.foreground);
        style.background_color = Some(self.background);
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_requests: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_requests: 50 }
    }
}

impl BatchConfig {
    /// Batch ceiling, never below one request.
    pub fn ceiling(&self) -> usize {
        self.max_requests.max(1)
    }
}

impl Config {
    /// The config shipped inside the binary (`src/default_config.toml`).
    pub fn compiled_default() -> Self {
        match toml::from_str(DEFAULT_CONFIG) {
            Ok(config) => config,
            Err(e) => {
                warn!("embedded default config is invalid: {e}");
                Self::default()
            }
        }
    }

    /// Parse config from TOML text. Missing keys fall back to their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from a TOML file, failing on IO or parse errors.
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load config from a TOML file, or return the compiled default if it is
    /// missing or unusable.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == ErrorKind::NotFound => Self::compiled_default(),
            Err(e) => {
                warn!("ignoring config {}: {e}", path.display());
                Self::compiled_default()
            }
        }
    }
}
