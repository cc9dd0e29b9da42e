//! Envelope layout
//!
//! ```text
//! ┌──────────────────────┐
//! │  MAGIC (8 bytes)     │  ← b"MSEAL01\0"
//! ├──────────────────────┤
//! │  SIZE (u32, LE)      │  ← length of the payload that follows
//! ├──────────────────────┤
//! │  payload             │  ← cipher-transformed module bytes
//! └──────────────────────┘
//! ```
//!
//! A stream carries an envelope only when it starts with `MAGIC` and its
//! total length is exactly `ENVELOPE_LEN + SIZE`.

use std::io::{self, Write};

/// Magic bytes opening a sealed module.
pub const MAGIC: [u8; 8] = *b"MSEAL01\0";

/// Length of the magic tag.
pub const HEADER_LEN: usize = MAGIC.len();

/// Length of the payload size field.
pub const SIZE_FIELD_LEN: usize = 4;

/// Total envelope length preceding the payload.
pub const ENVELOPE_LEN: usize = HEADER_LEN + SIZE_FIELD_LEN;

/// Fixed-size header written in front of a sealed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Length of the transformed payload in bytes.
    pub payload_len: u32,
}

impl ContainerHeader {
    /// Header announcing a payload of `payload_len` bytes.
    pub fn new(payload_len: u32) -> Self {
        Self { payload_len }
    }

    /// Parse a header from the start of `bytes`.
    ///
    /// Returns `None` if the slice is shorter than the envelope or the magic
    /// does not match. The size is not checked against anything here.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < ENVELOPE_LEN || bytes[..HEADER_LEN] != MAGIC {
            return None;
        }
        let mut size = [0u8; SIZE_FIELD_LEN];
        size.copy_from_slice(&bytes[HEADER_LEN..ENVELOPE_LEN]);
        Some(Self {
            payload_len: u32::from_le_bytes(size),
        })
    }

    /// Encode the header.
    pub fn to_bytes(&self) -> [u8; ENVELOPE_LEN] {
        let mut bytes = [0u8; ENVELOPE_LEN];
        bytes[..HEADER_LEN].copy_from_slice(&MAGIC);
        bytes[HEADER_LEN..].copy_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    /// Write the header to a writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Whether this header matches a stream of `total_len` bytes.
    pub fn matches_len(&self, total_len: u64) -> bool {
        total_len >= ENVELOPE_LEN as u64
            && u64::from(self.payload_len) == total_len - ENVELOPE_LEN as u64
    }
}

/// Payload size declared by the envelope at the start of `prefix`, if any.
pub fn declared_payload_len(prefix: &[u8]) -> Option<u64> {
    ContainerHeader::parse(prefix).map(|h| u64::from(h.payload_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_len() {
        assert_eq!(HEADER_LEN, 8);
        assert_eq!(ENVELOPE_LEN, 12);
    }

    #[test]
    fn test_header_bytes() {
        let bytes = ContainerHeader::new(0x0102_0304).to_bytes();
        assert_eq!(&bytes[..8], b"MSEAL01\0");
        assert_eq!(&bytes[8..], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(ContainerHeader::parse(&bytes), Some(ContainerHeader::new(0x0102_0304)));
    }

    #[test]
    fn test_parse_short_or_foreign() {
        assert!(ContainerHeader::parse(b"").is_none());
        assert!(ContainerHeader::parse(&MAGIC).is_none());
        assert!(ContainerHeader::parse(b"return 1 -- xx").is_none());
    }

    #[test]
    fn test_matches_len() {
        let header = ContainerHeader::new(8);
        assert!(header.matches_len(20));
        assert!(!header.matches_len(21));
        assert!(!header.matches_len(4));
        assert!(ContainerHeader::new(0).matches_len(12));
    }

    #[test]
    fn test_declared_payload_len() {
        let mut bytes = ContainerHeader::new(3).to_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        assert_eq!(declared_payload_len(&bytes), Some(3));
        assert_eq!(declared_payload_len(b"abc"), None);
    }
}
