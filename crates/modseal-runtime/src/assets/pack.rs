//! Asset pack format
//!
//! A single file bundling module assets for shipping.
//!
//! ```text
//! ┌─────────────────────────┐
//! │  Entry Section          │  ← [path_len u32][data_len u64][path][data]...
//! ├─────────────────────────┤
//! │  Trailer                │  ← fixed-size, at very end of file
//! └─────────────────────────┘
//! ```
//!
//! All integers are little-endian. Entry data is stored as-is: modules that
//! should be protected are sealed before they are packed.

use std::io::{self, Write};

use super::AssetError;

/// Magic bytes identifying an asset pack trailer.
pub const PACK_MAGIC: [u8; 8] = *b"MSPACK\0\0";

/// Size of the pack trailer in bytes.
pub const PACK_TRAILER_SIZE: usize = 8 + 4 + 8 + 4;

const ENTRY_HEADER_SIZE: usize = 4 + 8;

/// Fixed-size trailer at the very end of a pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackTrailer {
    /// Magic bytes: b"MSPACK\0\0"
    pub magic: [u8; 8],

    /// Number of entries in the entry section.
    pub entry_count: u32,

    /// Size of the entry section in bytes.
    pub section_len: u64,

    /// CRC32 checksum of the entry section.
    pub checksum: u32,
}

impl PackTrailer {
    /// Check if this trailer has the correct magic bytes.
    pub fn is_valid(&self) -> bool {
        self.magic == PACK_MAGIC
    }

    /// Read a trailer from raw bytes (must be at least `PACK_TRAILER_SIZE`).
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < PACK_TRAILER_SIZE {
            return None;
        }
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&bytes[0..8]);
        let trailer = Self {
            magic,
            entry_count: u32::from_le_bytes(bytes[8..12].try_into().ok()?),
            section_len: u64::from_le_bytes(bytes[12..20].try_into().ok()?),
            checksum: u32::from_le_bytes(bytes[20..24].try_into().ok()?),
        };
        trailer.is_valid().then_some(trailer)
    }

    /// Encode the trailer.
    pub fn to_bytes(&self) -> [u8; PACK_TRAILER_SIZE] {
        let mut bytes = [0u8; PACK_TRAILER_SIZE];
        bytes[0..8].copy_from_slice(&self.magic);
        bytes[8..12].copy_from_slice(&self.entry_count.to_le_bytes());
        bytes[12..20].copy_from_slice(&self.section_len.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }
}

/// Write a pack containing `files` to a writer.
///
/// Returns the total number of bytes written, trailer included.
pub fn write_pack<W: Write>(writer: &mut W, files: &[(String, Vec<u8>)]) -> io::Result<u64> {
    let mut section = Vec::new();
    for (path, data) in files {
        let path_len = u32::try_from(path.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "asset path too long"))?;
        section.extend_from_slice(&path_len.to_le_bytes());
        section.extend_from_slice(&(data.len() as u64).to_le_bytes());
        section.extend_from_slice(path.as_bytes());
        section.extend_from_slice(data);
    }

    let entry_count = u32::try_from(files.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many assets"))?;
    let trailer = PackTrailer {
        magic: PACK_MAGIC,
        entry_count,
        section_len: section.len() as u64,
        checksum: crc32fast::hash(&section),
    };

    writer.write_all(&section)?;
    writer.write_all(&trailer.to_bytes())?;
    Ok(section.len() as u64 + PACK_TRAILER_SIZE as u64)
}

/// Read all entries of a pack.
pub fn read_pack(data: &[u8]) -> Result<Vec<(String, Vec<u8>)>, AssetError> {
    if data.len() < PACK_TRAILER_SIZE {
        return Err(AssetError::InvalidPack("file too short for trailer".to_string()));
    }
    let trailer = PackTrailer::from_bytes(&data[data.len() - PACK_TRAILER_SIZE..])
        .ok_or_else(|| AssetError::InvalidPack("bad trailer magic".to_string()))?;

    let section_end = data.len() - PACK_TRAILER_SIZE;
    if trailer.section_len != section_end as u64 {
        return Err(AssetError::InvalidPack(format!(
            "entry section is {} bytes, trailer declares {}",
            section_end, trailer.section_len
        )));
    }
    let section = &data[..section_end];

    let actual = crc32fast::hash(section);
    if actual != trailer.checksum {
        return Err(AssetError::ChecksumMismatch {
            expected: trailer.checksum,
            actual,
        });
    }

    // The declared count is untrusted; every entry needs at least a header.
    let mut result = Vec::with_capacity(
        (trailer.entry_count as usize).min(section.len() / ENTRY_HEADER_SIZE),
    );
    let mut offset = 0;
    while offset < section.len() {
        if offset + ENTRY_HEADER_SIZE > section.len() {
            return Err(AssetError::InvalidPack(format!(
                "truncated entry header at offset {}",
                offset
            )));
        }
        let path_len = entry_len(u64::from(read_u32(&section[offset..])), offset)?;
        let data_len = entry_len(read_u64(&section[offset + 4..]), offset)?;
        offset += ENTRY_HEADER_SIZE;

        let end = offset
            .checked_add(path_len)
            .and_then(|o| o.checked_add(data_len))
            .filter(|&end| end <= section.len())
            .ok_or_else(|| {
                AssetError::InvalidPack(format!("entry at offset {} overruns the pack", offset))
            })?;

        let path = String::from_utf8_lossy(&section[offset..offset + path_len]).to_string();
        let bytes = section[offset + path_len..end].to_vec();
        offset = end;
        result.push((path, bytes));
    }

    if result.len() != trailer.entry_count as usize {
        return Err(AssetError::InvalidPack(format!(
            "found {} entries, trailer declares {}",
            result.len(),
            trailer.entry_count
        )));
    }
    Ok(result)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

fn entry_len(len: u64, offset: usize) -> Result<usize, AssetError> {
    usize::try_from(len).map_err(|_| {
        AssetError::InvalidPack(format!("entry at offset {} has length {}", offset, len))
    })
}
