//! Engine seam.
//!
//! The script engine's parser, compiler and interpreter live behind
//! [`Engine`]. The loader only ever hands it a pull-based [`BlockSource`]
//! and a chunk name, and asks it to serialize or run compiled units.

use std::io::{self, Read, Write};

use modseal_codec::DEFAULT_SIGNATURE;

/// Pull-based block stream consumed by [`Engine::load`].
pub trait BlockSource {
    /// Next block of decoded module bytes, or `None` at end of stream.
    ///
    /// Read failures also end the stream; the loader reports them after
    /// `load` returns and discards whatever the engine produced.
    fn next_block(&mut self) -> Option<&[u8]>;
}

/// The embedded script engine.
pub trait Engine: Send {
    /// Immutable compiled form of a module.
    type Unit: Clone + Send;

    /// Value produced by running a unit.
    type Value;

    /// First byte of the engine's compiled-unit signature.
    fn signature(&self) -> u8 {
        DEFAULT_SIGNATURE
    }

    /// Compile or undump the streamed bytes.
    ///
    /// On failure, returns the engine's own diagnostic.
    fn load(
        &mut self,
        source: &mut dyn BlockSource,
        chunk_name: Option<&str>,
    ) -> Result<Self::Unit, String>;

    /// Write the native serialization of `unit`.
    fn dump(&mut self, unit: &Self::Unit, out: &mut dyn Write) -> io::Result<()>;

    /// Run `unit`.
    ///
    /// The loader lock is held while this runs, as it is for host callbacks.
    /// Loaded code must not re-enter the same [`Loader`](crate::Loader): a
    /// nested `require` would block on the non-reentrant lock forever.
    /// Resolve dependencies up front, or give them their own loader.
    fn call(&mut self, unit: &Self::Unit) -> Result<Self::Value, String>;
}

/// Adapts a [`BlockSource`] into [`std::io::Read`].
pub struct BlockRead<'a> {
    source: &'a mut dyn BlockSource,
    pending: Vec<u8>,
    pos: usize,
    done: bool,
}

impl<'a> BlockRead<'a> {
    pub fn new(source: &'a mut dyn BlockSource) -> Self {
        Self {
            source,
            pending: Vec::new(),
            pos: 0,
            done: false,
        }
    }
}

impl Read for BlockRead<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.pending.len() {
            if self.done {
                return Ok(0);
            }
            match self.source.next_block() {
                Some(block) => {
                    self.pending.clear();
                    self.pending.extend_from_slice(block);
                    self.pos = 0;
                }
                None => self.done = true,
            }
        }
        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
