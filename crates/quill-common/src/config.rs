use std::path::{Path, PathBuf};
use std::time::Duration;

use quill_editor_core::{CheckMode, DebounceConfig, EditorConfig, SmolStr, UNDETERMINED_LANG};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where the checking service listens unless told otherwise.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/check";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuillConfig {
    /// URL of the check endpoint.
    pub endpoint: String,
    pub mode: CheckMode,
    /// Language hint sent with each check; `und` lets the service detect it.
    pub lang: SmolStr,
    /// Quiet period after typing before a check is sent.
    pub typing_quiet_ms: u64,
    /// Quiet period after a paste.
    pub paste_quiet_ms: u64,
    /// Per-request timeout. Ignored in the browser.
    pub request_timeout_secs: u64,
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            mode: CheckMode::default(),
            lang: SmolStr::new_static(UNDETERMINED_LANG),
            typing_quiet_ms: 50,
            paste_quiet_ms: 10,
            request_timeout_secs: 10,
        }
    }
}

impl QuillConfig {
    /// Editor settings derived from this config.
    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            mode: self.mode,
            lang: self.lang.clone(),
            debounce: DebounceConfig::from_millis(self.typing_quiet_ms, self.paste_quiet_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// This config as a TOML document, as `ConfigFile::save` would write it.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Reads and writes a [`QuillConfig`] file.
///
/// The format is picked from the file extension: `.toml` or `.json`.
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<QuillConfig, ConfigError> {
        let format = self.format()?;
        let raw = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        match format {
            Format::Json => Ok(serde_json::from_str(&raw)?),
            Format::Toml => Ok(toml::from_str(&raw)?),
        }
    }

    /// Load the file, or fall back to defaults if it does not exist.
    pub fn load_or_default(&self) -> Result<QuillConfig, ConfigError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(QuillConfig::default());
        }
        self.load()
    }

    pub fn save(&self, config: &QuillConfig) -> Result<(), ConfigError> {
        let contents = match self.format()? {
            Format::Json => serde_json::to_string_pretty(config)?,
            Format::Toml => config.to_toml()?,
        };
        let io_err = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&self.path, contents).map_err(io_err)
    }

    fn format(&self) -> Result<Format, ConfigError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => Err(ConfigError::UnsupportedFormat(self.path.clone())),
        }
    }
}

enum Format {
    Json,
    Toml,
}
