//! Subcommand implementations.

pub mod inspect;
pub mod pack;
pub mod seal;
pub mod unpack;
pub mod unseal;

use std::path::Path;

use anyhow::Context;
use modseal_codec::{Codec, FileFlags, DEFAULT_SIGNATURE};
use modseal_runtime::LoaderConfig;

const DEFAULT_CONFIG: &str = "modseal.toml";

/// Load the configuration from `path`, or `./modseal.toml`, or defaults.
pub fn load_config(path: Option<&Path>, key: Option<String>) -> anyhow::Result<LoaderConfig> {
    let mut config = match path {
        Some(path) => LoaderConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).exists() => {
            LoaderConfig::from_file(Path::new(DEFAULT_CONFIG))
                .with_context(|| format!("failed to load {}", DEFAULT_CONFIG))?
        }
        None => LoaderConfig::default(),
    };
    if key.is_some() {
        config.cipher_key = key;
    }
    Ok(config)
}

/// Codec for explicit seal/unseal work: protection is on regardless of
/// the configured flags.
pub fn sealing_codec(config: &LoaderConfig) -> Codec {
    let mut codec = config.codec(DEFAULT_SIGNATURE);
    codec.set_flags(codec.flags() | FileFlags::PROTECTED);
    codec
}
