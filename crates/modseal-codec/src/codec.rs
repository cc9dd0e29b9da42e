//! Classification and block transforms.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::cipher::{ByteCipher, Cipher};
use crate::error::CodecError;
use crate::flags::FileFlags;
use crate::header::{ContainerHeader, ENVELOPE_LEN};

/// Default block size for streamed reads and writes.
pub const BLOCK_SIZE: usize = 1024;

/// First byte of the engine's compiled-unit signature (`ESC`).
pub const DEFAULT_SIGNATURE: u8 = 0x1B;

/// How a module stream is encoded, decided once when it is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Textual script source
    PlainSource,
    /// Engine-native compiled unit, not sealed
    PlainCompiled,
    /// Sealed envelope; the payload must be decoded before loading
    Protected,
}

impl ContentKind {
    /// Short human-readable description used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            ContentKind::PlainSource => "source",
            ContentKind::PlainCompiled => "compiled",
            ContentKind::Protected => "protected",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Envelope detection plus the block transforms, gated by [`FileFlags`].
#[derive(Clone)]
pub struct Codec {
    flags: FileFlags,
    cipher: Arc<dyn Cipher>,
    signature: u8,
}

impl Codec {
    /// Codec with the given flags and cipher.
    pub fn new(flags: FileFlags, cipher: Arc<dyn Cipher>) -> Self {
        Self {
            flags,
            cipher,
            signature: DEFAULT_SIGNATURE,
        }
    }

    /// Codec using the default-keyed [`ByteCipher`].
    pub fn with_flags(flags: FileFlags) -> Self {
        Self::new(flags, Arc::new(ByteCipher::default()))
    }

    /// Override the compiled-unit signature byte.
    pub fn with_signature(mut self, signature: u8) -> Self {
        self.signature = signature;
        self
    }

    pub fn flags(&self) -> FileFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: FileFlags) {
        self.flags = flags;
    }

    pub fn signature(&self) -> u8 {
        self.signature
    }

    /// Whether sealed payloads are recognised and produced.
    pub fn protection_enabled(&self) -> bool {
        self.flags.protected()
    }

    /// Classify a stream from its first bytes and its total length.
    ///
    /// `prefix` is at most [`ENVELOPE_LEN`] bytes from the start of the
    /// stream; it may be shorter or empty. The envelope check is skipped
    /// entirely when protection is disabled.
    pub fn classify(&self, prefix: &[u8], total_len: u64) -> ContentKind {
        if self.protection_enabled() && prefix.len() >= ENVELOPE_LEN {
            if let Some(header) = ContainerHeader::parse(prefix) {
                if header.matches_len(total_len) {
                    return ContentKind::Protected;
                }
            }
        }
        match prefix.first() {
            Some(&b) if b == self.signature => ContentKind::PlainCompiled,
            _ => ContentKind::PlainSource,
        }
    }

    /// Decode one block in place. Identity when protection is disabled.
    pub fn decode_block(&self, block: &mut [u8]) {
        if self.protection_enabled() {
            self.cipher.decrypt(block);
        }
    }

    /// Encode one block in place. Identity when protection is disabled.
    pub fn encode_block(&self, block: &mut [u8]) {
        if self.protection_enabled() {
            self.cipher.encrypt(block);
        }
    }

    /// Wrap a whole payload in an envelope.
    pub fn seal(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        if !self.protection_enabled() {
            return Err(CodecError::ProtectionDisabled);
        }
        let len = u32::try_from(payload.len())
            .map_err(|_| CodecError::PayloadTooLarge(payload.len() as u64))?;

        let mut out = Vec::with_capacity(ENVELOPE_LEN + payload.len());
        out.extend_from_slice(&ContainerHeader::new(len).to_bytes());
        out.extend_from_slice(payload);
        self.encode_block(&mut out[ENVELOPE_LEN..]);
        Ok(out)
    }

    /// Strip the envelope from a whole buffer and decode its payload.
    pub fn unseal(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        if !self.protection_enabled() {
            return Err(CodecError::ProtectionDisabled);
        }
        let header = ContainerHeader::parse(bytes).ok_or(CodecError::NotSealed)?;
        if !header.matches_len(bytes.len() as u64) {
            return Err(CodecError::LengthMismatch {
                declared: u64::from(header.payload_len),
                actual: (bytes.len() - ENVELOPE_LEN) as u64,
            });
        }
        let mut payload = bytes[ENVELOPE_LEN..].to_vec();
        self.decode_block(&mut payload);
        Ok(payload)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::with_flags(FileFlags::default())
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("flags", &self.flags)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::MAGIC;

    fn sealed(codec: &Codec, payload: &[u8]) -> Vec<u8> {
        codec.seal(payload).unwrap()
    }

    #[test]
    fn test_classify_empty_and_short() {
        let codec = Codec::default();
        assert_eq!(codec.classify(b"", 0), ContentKind::PlainSource);
        assert_eq!(codec.classify(b"r", 1), ContentKind::PlainSource);
        assert_eq!(codec.classify(&[0x1B], 1), ContentKind::PlainCompiled);
        assert_eq!(codec.classify(&MAGIC, 8), ContentKind::PlainSource);
    }

    #[test]
    fn test_classify_protected() {
        let codec = Codec::default();
        let bytes = sealed(&codec, b"return 1");
        assert_eq!(
            codec.classify(&bytes[..ENVELOPE_LEN], bytes.len() as u64),
            ContentKind::Protected
        );
        // One byte off in either direction is no longer an envelope.
        assert_eq!(
            codec.classify(&bytes[..ENVELOPE_LEN], bytes.len() as u64 + 1),
            ContentKind::PlainSource
        );
        assert_eq!(
            codec.classify(&bytes[..ENVELOPE_LEN], bytes.len() as u64 - 1),
            ContentKind::PlainSource
        );
    }

    #[test]
    fn test_classify_ignores_envelope_when_disabled() {
        let enabled = Codec::default();
        let bytes = sealed(&enabled, b"return 1");
        let disabled = Codec::with_flags(FileFlags::READABLE_SOURCE);
        assert_eq!(
            disabled.classify(&bytes[..ENVELOPE_LEN], bytes.len() as u64),
            ContentKind::PlainSource
        );
    }

    #[test]
    fn test_classify_total_over_all_prefix_lengths() {
        let codec = Codec::default();
        let bytes = sealed(&codec, b"return 1");
        for n in 0..=bytes.len() {
            let prefix = &bytes[..n.min(ENVELOPE_LEN)];
            let kind = codec.classify(prefix, n as u64);
            assert!(matches!(
                kind,
                ContentKind::PlainSource | ContentKind::PlainCompiled | ContentKind::Protected
            ));
        }
    }

    #[test]
    fn test_magic_collision_is_classified_protected() {
        // Known false classification: plain bytes that happen to begin with
        // the magic tag and a matching size are treated as sealed.
        let codec = Codec::default();
        let mut plain = MAGIC.to_vec();
        plain.extend_from_slice(&3u32.to_le_bytes());
        plain.extend_from_slice(b"abc");
        assert_eq!(
            codec.classify(&plain[..ENVELOPE_LEN], plain.len() as u64),
            ContentKind::Protected
        );
    }

    #[test]
    fn test_transforms_identity_when_disabled() {
        let codec = Codec::with_flags(FileFlags::empty());
        let mut block = b"return 1".to_vec();
        codec.encode_block(&mut block);
        assert_eq!(block, b"return 1");
        codec.decode_block(&mut block);
        assert_eq!(block, b"return 1");
    }

    #[test]
    fn test_seal_unseal() {
        let codec = Codec::default();
        let bytes = sealed(&codec, b"return 1");
        assert_eq!(bytes.len(), ENVELOPE_LEN + 8);
        assert_ne!(&bytes[ENVELOPE_LEN..], b"return 1");
        assert_eq!(codec.unseal(&bytes).unwrap(), b"return 1");
    }

    #[test]
    fn test_unseal_errors() {
        let codec = Codec::default();
        assert_eq!(codec.unseal(b"return 1"), Err(CodecError::NotSealed));

        let mut bytes = sealed(&codec, b"return 1");
        bytes.push(0);
        assert_eq!(
            codec.unseal(&bytes),
            Err(CodecError::LengthMismatch { declared: 8, actual: 9 })
        );

        let disabled = Codec::with_flags(FileFlags::empty());
        assert_eq!(disabled.seal(b"x"), Err(CodecError::ProtectionDisabled));
    }

    #[test]
    fn test_custom_signature() {
        let codec = Codec::default().with_signature(b'#');
        assert_eq!(codec.classify(b"#!", 2), ContentKind::PlainCompiled);
        assert_eq!(codec.classify(&[0x1B], 1), ContentKind::PlainSource);
    }
}
