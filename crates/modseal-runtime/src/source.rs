//! Source readers.
//!
//! Each origin is classified once when it is opened and then streamed to the
//! engine block by block, decoding sealed payloads on the way:
//! - [`BufferSource`]: bytes already in memory, handed out as one block
//! - [`StreamSource`]: anything readable with a known length, in fixed-size
//!   blocks; [`FileSource`] and [`AssetSource`] are its two instantiations

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read};

use modseal_codec::{Codec, ContentKind, ENVELOPE_LEN};

use crate::assets::Asset;
use crate::engine::BlockSource;

/// Whole-buffer origin.
pub struct BufferSource<'a> {
    data: Cow<'a, [u8]>,
    kind: ContentKind,
    done: bool,
    consumed: u64,
}

impl<'a> BufferSource<'a> {
    /// Classify `bytes` and decode the payload up front if it is sealed.
    pub fn new(bytes: &'a [u8], codec: &Codec) -> Self {
        let prefix = &bytes[..bytes.len().min(ENVELOPE_LEN)];
        let kind = codec.classify(prefix, bytes.len() as u64);
        let data = if kind == ContentKind::Protected {
            let mut payload = bytes[ENVELOPE_LEN..].to_vec();
            codec.decode_block(&mut payload);
            Cow::Owned(payload)
        } else {
            Cow::Borrowed(bytes)
        };
        Self {
            data,
            kind,
            done: false,
            consumed: 0,
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Bytes handed to the engine so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }
}

impl BlockSource for BufferSource<'_> {
    fn next_block(&mut self) -> Option<&[u8]> {
        if self.done || self.data.is_empty() {
            self.done = true;
            return None;
        }
        self.done = true;
        self.consumed = self.data.len() as u64;
        Some(&self.data)
    }
}

/// Streaming origin read in fixed-size blocks.
///
/// The first bytes are pre-read for classification and replayed as the
/// first block unless they turn out to be the envelope, which is dropped.
pub struct StreamSource<R> {
    reader: R,
    codec: Codec,
    kind: ContentKind,
    buf: Vec<u8>,
    block_size: usize,
    /// Pre-read bytes at the start of `buf` still owed to the engine
    replay: usize,
    eof: bool,
    error: Option<io::Error>,
    consumed: u64,
}

/// Filesystem origin.
pub type FileSource = StreamSource<File>;

/// Packaged-asset origin.
pub type AssetSource<'a> = StreamSource<Box<dyn Asset + 'a>>;

impl<R: Read> StreamSource<R> {
    /// Pre-read and classify a stream of `total_len` bytes.
    ///
    /// With protection enabled the envelope length is pre-read; a shorter
    /// pre-read (small stream) means the stream is not sealed and every
    /// pre-read byte is replayed. Without protection only the first byte is
    /// peeked, to tell source from compiled input. A `total_len` of zero
    /// skips the pre-read and streams whatever the reader yields as source.
    pub fn new(mut reader: R, total_len: u64, codec: &Codec, block_size: usize) -> Self {
        let block_size = block_size.max(1);
        let mut buf = vec![0u8; block_size.max(ENVELOPE_LEN)];
        let want = if codec.protection_enabled() {
            ENVELOPE_LEN
        } else {
            1
        };

        let mut error = None;
        let mut pre_read = 0;
        if total_len > 0 {
            match read_up_to(&mut reader, &mut buf[..want]) {
                Ok(n) => pre_read = n,
                Err(e) => error = Some(e),
            }
        }

        let kind = codec.classify(&buf[..pre_read], total_len);
        let replay = if kind == ContentKind::Protected {
            0
        } else {
            pre_read
        };

        Self {
            reader,
            codec: codec.clone(),
            kind,
            buf,
            block_size,
            replay,
            // A zero length says nothing about the stream (procfs, pipes).
            eof: total_len > 0 && pre_read < want,
            error,
            consumed: 0,
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Bytes handed to the engine so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// The read error that ended the stream, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

impl<R: Read> BlockSource for StreamSource<R> {
    fn next_block(&mut self) -> Option<&[u8]> {
        if self.replay > 0 {
            let n = std::mem::take(&mut self.replay);
            self.consumed += n as u64;
            return Some(&self.buf[..n]);
        }
        if self.eof || self.error.is_some() {
            return None;
        }

        let size = self.block_size;
        match read_up_to(&mut self.reader, &mut self.buf[..size]) {
            Ok(0) => {
                self.eof = true;
                None
            }
            Ok(n) => {
                if n < size {
                    self.eof = true;
                }
                if self.kind == ContentKind::Protected {
                    self.codec.decode_block(&mut self.buf[..n]);
                }
                self.consumed += n as u64;
                Some(&self.buf[..n])
            }
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }
}

/// Fill `buf` as far as the reader allows; short only at end of stream.
fn read_up_to<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
