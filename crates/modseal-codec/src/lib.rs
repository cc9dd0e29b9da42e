//! Modseal container codec
//!
//! Pure byte-level handling of sealed script modules:
//! - **header**: the envelope layout (magic tag + payload size field)
//! - **flags**: the runtime file-flag bitmask (protection, readable source)
//! - **cipher**: the position-independent byte transform applied to payloads
//! - **codec**: classification and block encode/decode gated by the flags
//!
//! Nothing in this crate performs I/O; readers and writers in
//! `modseal-runtime` call into it one block at a time.

pub mod cipher;
pub mod codec;
pub mod error;
pub mod flags;
pub mod header;

pub use cipher::{ByteCipher, Cipher, DEFAULT_KEY};
pub use codec::{Codec, ContentKind, BLOCK_SIZE, DEFAULT_SIGNATURE};
pub use error::CodecError;
pub use flags::FileFlags;
pub use header::{declared_payload_len, ContainerHeader, ENVELOPE_LEN, HEADER_LEN, MAGIC, SIZE_FIELD_LEN};
