//! Runtime file flags.

use bitflags::bitflags;

bitflags! {
    /// Bitmask controlling how module bytes are treated at rest.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileFlags: u32 {
        /// Sealed payloads are recognised on read and produced on dump
        const PROTECTED = 0x0001;
        /// Plain source may be loaded; reserved for caller policy checks
        const READABLE_SOURCE = 0x0002;
    }
}

impl FileFlags {
    /// Build flags from a raw integer, dropping unknown bits.
    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        Self::from_bits_truncate(raw)
    }

    /// Whether protection is enabled.
    #[must_use]
    pub fn protected(self) -> bool {
        self.contains(Self::PROTECTED)
    }

    /// Whether plain source is marked readable.
    #[must_use]
    pub fn readable_source(self) -> bool {
        self.contains(Self::READABLE_SOURCE)
    }
}

impl Default for FileFlags {
    fn default() -> Self {
        Self::PROTECTED | Self::READABLE_SOURCE
    }
}
