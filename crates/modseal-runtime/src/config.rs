//! Loader configuration (modseal.toml)
//!
//! ```toml
//! block_size = 1024
//! extension = "lua"
//! search_root = "scripts"
//! asset_root = "game"
//! cipher_key = "my-app-key"
//! searchers = ["file", "host", "asset"]
//!
//! [flags]
//! protected = true
//! readable_source = true
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use modseal_codec::{ByteCipher, Codec, FileFlags, BLOCK_SIZE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Searchers that can follow the preload table, in configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearcherKind {
    File,
    Host,
    Asset,
}

/// The two file-flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagsConfig {
    pub protected: bool,
    pub readable_source: bool,
}

impl Default for FlagsConfig {
    fn default() -> Self {
        let flags = FileFlags::default();
        Self {
            protected: flags.protected(),
            readable_source: flags.readable_source(),
        }
    }
}

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// File flags at start-up
    pub flags: FlagsConfig,

    /// Block size for streamed reads and dumps
    pub block_size: usize,

    /// Module file extension, without the dot
    pub extension: String,

    /// Directory the file searcher resolves module paths against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_root: Option<PathBuf>,

    /// Asset directory the asset searcher resolves module paths against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_root: Option<String>,

    /// Cipher key; the built-in key is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cipher_key: Option<String>,

    /// Searchers consulted after the preload table
    pub searchers: Vec<SearcherKind>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            flags: FlagsConfig::default(),
            block_size: BLOCK_SIZE,
            extension: "lua".to_string(),
            search_root: None,
            asset_root: None,
            cipher_key: None,
            searchers: vec![SearcherKind::File, SearcherKind::Host, SearcherKind::Asset],
        }
    }
}

impl LoaderConfig {
    /// Parse a configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a configuration from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: LoaderConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::Invalid("block_size must be positive".to_string()));
        }
        if self.extension.is_empty() || self.extension.contains(['.', '/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "extension '{}' must be a bare, non-empty suffix",
                self.extension
            )));
        }
        for (i, kind) in self.searchers.iter().enumerate() {
            if self.searchers[..i].contains(kind) {
                return Err(ConfigError::Invalid(format!(
                    "searcher {:?} listed more than once",
                    kind
                )));
            }
        }
        Ok(())
    }

    /// The configured file flags.
    pub fn file_flags(&self) -> FileFlags {
        let mut flags = FileFlags::empty();
        flags.set(FileFlags::PROTECTED, self.flags.protected);
        flags.set(FileFlags::READABLE_SOURCE, self.flags.readable_source);
        flags
    }

    /// Build the codec for an engine with the given signature byte.
    pub fn codec(&self, signature: u8) -> Codec {
        let cipher = match &self.cipher_key {
            Some(key) => ByteCipher::from_key(key.as_bytes()),
            None => ByteCipher::default(),
        };
        Codec::new(self.file_flags(), Arc::new(cipher)).with_signature(signature)
    }
}
