//! Dump pipeline.
//!
//! Writes a compiled unit's native serialization, sealed when protection is
//! enabled. The payload length is only known once the engine has finished
//! writing, so a sealed dump is written in two phases:
//!
//! 1. a zeroed placeholder the size of the envelope
//! 2. the payload, encoded in bounded blocks as the engine emits it
//!
//! and then the placeholder is overwritten with the real header.

use std::fs::File;
use std::io::{self, Cursor, Seek, SeekFrom, Write};
use std::path::Path;

use modseal_codec::{Codec, ContainerHeader, ENVELOPE_LEN};
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::error::{IoPhase, Result, RuntimeError};

/// What a dump produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpReport {
    /// Payload bytes after the envelope (or the whole output when unsealed)
    pub payload_len: u64,
    /// Total bytes in the artifact
    pub total_len: u64,
    /// Whether the artifact carries an envelope
    pub protected: bool,
}

/// `Write` adapter that encodes everything passing through it.
///
/// At most `block_size` bytes are encoded per `write` call.
pub struct SealWriter<'a, W: Write> {
    inner: W,
    codec: &'a Codec,
    block_size: usize,
    scratch: Vec<u8>,
    written: u64,
}

impl<'a, W: Write> SealWriter<'a, W> {
    pub fn new(inner: W, codec: &'a Codec, block_size: usize) -> Self {
        let block_size = block_size.max(1);
        Self {
            inner,
            codec,
            block_size,
            scratch: Vec::with_capacity(block_size),
            written: 0,
        }
    }

    /// Plain bytes accepted so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl<W: Write> Write for SealWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.block_size);
        self.scratch.clear();
        self.scratch.extend_from_slice(&buf[..n]);
        self.codec.encode_block(&mut self.scratch);
        self.inner.write_all(&self.scratch)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Dump `unit` to `path`.
///
/// A failure after the payload has been written leaves the file in place;
/// it must not be trusted.
pub fn dump_to_file<E: Engine>(
    engine: &mut E,
    codec: &Codec,
    unit: &E::Unit,
    path: &Path,
    block_size: usize,
) -> Result<DumpReport> {
    let mut file = File::create(path).map_err(|e| RuntimeError::io(IoPhase::Open, path, e))?;

    let report = write_sealed(engine, codec, unit, &mut file, block_size).map_err(|(phase, e)| {
        warn!(path = %path.display(), %phase, error = %e, "dump failed");
        RuntimeError::io(phase, path, e)
    })?;

    file.sync_all()
        .map_err(|e| RuntimeError::io(IoPhase::Close, path, e))?;
    drop(file);

    debug!(
        path = %path.display(),
        payload = report.payload_len,
        total = report.total_len,
        protected = report.protected,
        "dumped unit"
    );
    Ok(report)
}

/// Dump `unit` into memory using the same protocol as [`dump_to_file`].
pub fn dump_to_vec<E: Engine>(
    engine: &mut E,
    codec: &Codec,
    unit: &E::Unit,
    block_size: usize,
) -> Result<(Vec<u8>, DumpReport)> {
    let mut cursor = Cursor::new(Vec::new());
    let report = write_sealed(engine, codec, unit, &mut cursor, block_size)
        .map_err(|(phase, e)| RuntimeError::io(phase, "<memory>", e))?;
    Ok((cursor.into_inner(), report))
}

fn write_sealed<E: Engine, W: Write + Seek>(
    engine: &mut E,
    codec: &Codec,
    unit: &E::Unit,
    out: &mut W,
    block_size: usize,
) -> std::result::Result<DumpReport, (IoPhase, io::Error)> {
    let protected = codec.protection_enabled();
    let start = out.stream_position().map_err(|e| (IoPhase::Write, e))?;

    if protected {
        out.write_all(&[0u8; ENVELOPE_LEN])
            .map_err(|e| (IoPhase::Write, e))?;
    }

    {
        let mut writer = SealWriter::new(&mut *out, codec, block_size);
        engine
            .dump(unit, &mut writer)
            .and_then(|()| writer.flush())
            .map_err(|e| (IoPhase::Write, e))?;
    }

    let end = out.stream_position().map_err(|e| (IoPhase::Write, e))?;
    let total_len = end - start;
    let envelope = if protected { ENVELOPE_LEN as u64 } else { 0 };
    let payload_len = total_len - envelope;

    if protected {
        let declared = u32::try_from(payload_len).map_err(|_| {
            (
                IoPhase::Write,
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    "payload exceeds the envelope size field",
                ),
            )
        })?;
        patch_header(out, start, end, declared).map_err(|e| (IoPhase::Reopen, e))?;
    }

    Ok(DumpReport {
        payload_len,
        total_len,
        protected,
    })
}

/// Overwrite the placeholder at `start` and return to `end`.
fn patch_header<W: Write + Seek>(out: &mut W, start: u64, end: u64, declared: u32) -> io::Result<()> {
    out.seek(SeekFrom::Start(start))?;
    ContainerHeader::new(declared).write_to(out)?;
    out.seek(SeekFrom::Start(end))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modseal_codec::FileFlags;

    #[test]
    fn test_seal_writer_bounds_blocks() {
        struct Recorder(Vec<usize>, Vec<u8>);
        impl Write for Recorder {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.push(buf.len());
                self.1.extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let codec = Codec::default();
        let data: Vec<u8> = (0..2500u32).map(|i| i as u8).collect();
        let mut rec = Recorder(Vec::new(), Vec::new());
        let written = {
            let mut writer = SealWriter::new(&mut rec, &codec, 1024);
            writer.write_all(&data).unwrap();
            writer.written()
        };
        assert_eq!(written, 2500);
        assert_eq!(rec.0, vec![1024, 1024, 452]);

        let mut decoded = rec.1.clone();
        codec.decode_block(&mut decoded);
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_seal_writer_identity_without_protection() {
        let codec = Codec::with_flags(FileFlags::empty());
        let mut out = Vec::new();
        SealWriter::new(&mut out, &codec, 4)
            .write_all(b"return 1")
            .unwrap();
        assert_eq!(out, b"return 1");
    }
}
