//! Packaged asset stores
//!
//! Read-only, randomly addressable module storage used by the asset origin:
//! - **store**: the [`AssetStore`] seam and the [`Assets`] map, whose entries
//!   are either disk-backed (development) or embedded (shipped pack)
//! - **pack**: the single-file asset pack format

pub mod pack;
pub mod store;

pub use pack::{read_pack, write_pack, PackTrailer, PACK_MAGIC, PACK_TRAILER_SIZE};
pub use store::{join_asset_path, normalize_path, Asset, AssetEntry, AssetStore, Assets};

use thiserror::Error;

/// Errors raised by asset stores and asset packs.
#[derive(Debug, Error)]
pub enum AssetError {
    /// No asset under this path
    #[error("asset not found: {0}")]
    NotFound(String),

    /// Reading a disk-backed entry or a pack file failed
    #[error("asset I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed asset pack
    #[error("invalid asset pack: {0}")]
    InvalidPack(String),

    /// Asset pack checksum mismatch
    #[error("asset pack checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
}
