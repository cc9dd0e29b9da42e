//! Payload cipher
//!
//! Readers decode whatever block size the filesystem hands them and writers
//! encode whatever slices the engine's serializer emits, so the transform
//! must not depend on a byte's position in the stream. `ByteCipher` is a
//! keyed byte substitution: a permutation of `0..=255` and its inverse.

use sha2::{Digest, Sha256};

/// Key used when no key is configured.
pub const DEFAULT_KEY: &[u8] = b"modseal.default-key.v1";

/// A symmetric, position-independent byte transform.
pub trait Cipher: Send + Sync {
    /// Transform plain bytes in place.
    fn encrypt(&self, block: &mut [u8]);

    /// Undo `encrypt` in place.
    fn decrypt(&self, block: &mut [u8]);
}

/// Keyed substitution cipher.
#[derive(Clone)]
pub struct ByteCipher {
    forward: [u8; 256],
    inverse: [u8; 256],
}

impl ByteCipher {
    /// Derive the substitution tables from `key`.
    ///
    /// The permutation is a Fisher-Yates shuffle driven by a SHA-256 chain
    /// seeded with the key, so equal keys always give equal tables.
    pub fn from_key(key: &[u8]) -> Self {
        let mut forward = [0u8; 256];
        for (i, slot) in forward.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut digest = Sha256::digest(key);
        let mut pos = 0;
        for i in (1..256usize).rev() {
            if pos == digest.len() {
                digest = Sha256::digest(digest.as_slice());
                pos = 0;
            }
            let j = digest[pos] as usize % (i + 1);
            pos += 1;
            forward.swap(i, j);
        }

        let mut inverse = [0u8; 256];
        for (plain, &sealed) in forward.iter().enumerate() {
            inverse[sealed as usize] = plain as u8;
        }

        Self { forward, inverse }
    }
}

impl Default for ByteCipher {
    fn default() -> Self {
        Self::from_key(DEFAULT_KEY)
    }
}

impl std::fmt::Debug for ByteCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteCipher").finish_non_exhaustive()
    }
}

impl Cipher for ByteCipher {
    fn encrypt(&self, block: &mut [u8]) {
        for b in block.iter_mut() {
            *b = self.forward[*b as usize];
        }
    }

    fn decrypt(&self, block: &mut [u8]) {
        for b in block.iter_mut() {
            *b = self.inverse[*b as usize];
        }
    }
}
