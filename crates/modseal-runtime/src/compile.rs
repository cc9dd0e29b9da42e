//! Compile pipeline.
//!
//! Origin → classify → chunk name → block stream → `Engine::load`.
//! The engine's outcome is returned as-is; this layer only adds failures
//! the engine cannot see (missing origin, open and read errors).

use std::fs::File;
use std::io;
use std::path::Path;

use modseal_codec::{Codec, ContentKind};
use tracing::{debug, warn};

use crate::assets::{AssetError, AssetStore};
use crate::engine::Engine;
use crate::error::{IoPhase, Result, RuntimeError};
use crate::source::{AssetSource, BufferSource, FileSource, StreamSource};

/// A successfully compiled unit and how it was read.
#[derive(Debug, Clone)]
pub struct CompileOutput<U> {
    pub unit: U,
    pub kind: ContentKind,
    pub chunk_name: Option<String>,
    /// Decoded bytes handed to the engine
    pub consumed: u64,
}

/// Compile a resident buffer.
///
/// `chunk_name` is passed through unchanged; buffers have no default.
pub fn compile_buffer<E: Engine>(
    engine: &mut E,
    codec: &Codec,
    bytes: &[u8],
    chunk_name: Option<&str>,
) -> Result<CompileOutput<E::Unit>> {
    let mut source = BufferSource::new(bytes, codec);
    let kind = source.kind();
    debug!(len = bytes.len(), %kind, chunk = ?chunk_name, "compiling buffer");

    let unit = engine.load(&mut source, chunk_name).map_err(|message| {
        warn!(chunk = ?chunk_name, %message, "buffer rejected by engine");
        RuntimeError::Format {
            chunk: chunk_name.unwrap_or("?").to_string(),
            message,
        }
    })?;

    Ok(CompileOutput {
        unit,
        kind,
        chunk_name: chunk_name.map(str::to_owned),
        consumed: source.consumed(),
    })
}

/// Compile a file. The chunk name defaults to `@<path>`.
pub fn compile_file<E: Engine>(
    engine: &mut E,
    codec: &Codec,
    path: &Path,
    chunk_name: Option<&str>,
    block_size: usize,
) -> Result<CompileOutput<E::Unit>> {
    let file = File::open(path).map_err(|e| open_error("file", path, e))?;
    let total_len = file
        .metadata()
        .map_err(|e| RuntimeError::io(IoPhase::Open, path, e))?
        .len();

    let chunk = chunk_name
        .map(str::to_owned)
        .unwrap_or_else(|| format!("@{}", path.display()));
    let source: FileSource = StreamSource::new(file, total_len, codec, block_size);
    run_stream(engine, source, chunk, path)
}

/// Compile an asset from `store`. The chunk name defaults to `@<path>`.
pub fn compile_asset<E: Engine>(
    engine: &mut E,
    codec: &Codec,
    store: &dyn AssetStore,
    path: &str,
    chunk_name: Option<&str>,
    block_size: usize,
) -> Result<CompileOutput<E::Unit>> {
    let asset = store.open(path).map_err(|e| match e {
        AssetError::NotFound(p) => RuntimeError::NotFound {
            what: "asset",
            path: p,
            reason: "not present in the asset store".to_string(),
        },
        AssetError::Io(e) => open_error("asset", Path::new(path), e),
        other => RuntimeError::Asset(other),
    })?;
    let total_len = asset.len();

    let chunk = chunk_name
        .map(str::to_owned)
        .unwrap_or_else(|| format!("@{}", path));
    let source: AssetSource<'_> = StreamSource::new(asset, total_len, codec, block_size);
    run_stream(engine, source, chunk, Path::new(path))
}

fn run_stream<E: Engine, R: io::Read>(
    engine: &mut E,
    mut source: StreamSource<R>,
    chunk: String,
    path: &Path,
) -> Result<CompileOutput<E::Unit>> {
    let kind = source.kind();
    debug!(path = %path.display(), %kind, %chunk, "compiling stream");

    let loaded = engine.load(&mut source, Some(&chunk));

    // A read error outranks whatever the engine made of the partial input.
    if let Some(err) = source.take_error() {
        let phase = IoPhase::reading(kind);
        warn!(path = %path.display(), %phase, error = %err, "read failed during load");
        return Err(RuntimeError::io(phase, path, err));
    }

    let unit = loaded.map_err(|message| {
        warn!(%chunk, %message, "stream rejected by engine");
        RuntimeError::Format {
            chunk: chunk.clone(),
            message,
        }
    })?;

    Ok(CompileOutput {
        unit,
        kind,
        chunk_name: Some(chunk),
        consumed: source.consumed(),
    })
}

fn open_error(what: &'static str, path: &Path, err: io::Error) -> RuntimeError {
    if err.kind() == io::ErrorKind::NotFound {
        RuntimeError::NotFound {
            what,
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    } else {
        RuntimeError::io(IoPhase::Open, path, err)
    }
}
