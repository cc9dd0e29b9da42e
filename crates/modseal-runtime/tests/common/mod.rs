//! Shared fixtures for the loader integration tests.
#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use modseal_runtime::{
    BlockRead, BlockSource, Engine, ModuleName, SearchContext, SearchOutcome, Searcher,
};

const COMPILED_TAG: &[u8; 4] = b"\x1bTNY";
const COMPILED_VERSION: u8 = 1;

/// Compiled form of a tiny script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TinyUnit {
    /// Value of the `return` statement, if any
    pub value: Option<i64>,
    /// Message of an `error` statement, raised when the unit runs
    pub raise: Option<String>,
    pub chunk: String,
    /// Source text kept as debug info
    pub source: Vec<u8>,
}

/// Minimal engine for a language of comments, `return <int>` and `error <msg>`.
#[derive(Debug, Default)]
pub struct TinyEngine {
    pub loads: usize,
    pub calls: usize,
    pub chunks: Vec<String>,
}

impl TinyEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for TinyEngine {
    type Unit = TinyUnit;
    type Value = Option<i64>;

    fn load(
        &mut self,
        source: &mut dyn BlockSource,
        chunk_name: Option<&str>,
    ) -> Result<TinyUnit, String> {
        let mut bytes = Vec::new();
        BlockRead::new(source)
            .read_to_end(&mut bytes)
            .map_err(|e| e.to_string())?;

        let chunk = chunk_name.unwrap_or("?").to_string();
        self.loads += 1;
        self.chunks.push(chunk.clone());

        if bytes.first() == Some(&COMPILED_TAG[0]) {
            undump(&bytes, &chunk)
        } else {
            parse(&bytes, &chunk)
        }
    }

    fn dump(&mut self, unit: &TinyUnit, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(COMPILED_TAG)?;
        out.write_all(&[COMPILED_VERSION])?;
        match unit.value {
            Some(v) => {
                out.write_all(&[1])?;
                out.write_all(&v.to_le_bytes())?;
            }
            None => out.write_all(&[0])?,
        }
        write_field(out, unit.raise.as_deref().unwrap_or("").as_bytes())?;
        write_field(out, unit.chunk.as_bytes())?;
        write_field(out, &unit.source)
    }

    fn call(&mut self, unit: &TinyUnit) -> Result<Option<i64>, String> {
        self.calls += 1;
        match &unit.raise {
            Some(message) => Err(format!("{}: {}", unit.chunk, message)),
            None => Ok(unit.value),
        }
    }
}

fn parse(bytes: &[u8], chunk: &str) -> Result<TinyUnit, String> {
    let text = String::from_utf8_lossy(bytes);
    let mut value = None;
    let mut raise = None;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }
        let fail = || format!("[string \"{}\"]:{}: unexpected symbol near '{}'", chunk, i + 1, line);
        if value.is_some() || raise.is_some() {
            return Err(fail());
        }
        if let Some(rest) = line.strip_prefix("return ") {
            value = Some(rest.trim().parse::<i64>().map_err(|_| fail())?);
        } else if let Some(rest) = line.strip_prefix("error ") {
            raise = Some(rest.trim().to_string());
        } else {
            return Err(fail());
        }
    }

    Ok(TinyUnit {
        value,
        raise,
        chunk: chunk.to_string(),
        source: bytes.to_vec(),
    })
}

fn undump(bytes: &[u8], chunk: &str) -> Result<TinyUnit, String> {
    let bad = || format!("{}: bad binary format (truncated chunk)", chunk);
    if bytes.len() < 6 || &bytes[..4] != COMPILED_TAG || bytes[4] != COMPILED_VERSION {
        return Err(bad());
    }
    let mut rest = &bytes[6..];
    let value = match bytes[5] {
        0 => None,
        1 => {
            if rest.len() < 8 {
                return Err(bad());
            }
            let (v, tail) = rest.split_at(8);
            rest = tail;
            Some(i64::from_le_bytes(v.try_into().map_err(|_| bad())?))
        }
        _ => return Err(bad()),
    };
    let raise = read_field(&mut rest).ok_or_else(bad)?;
    let stored_chunk = read_field(&mut rest).ok_or_else(bad)?;
    let source = read_field(&mut rest).ok_or_else(bad)?;
    if !rest.is_empty() {
        return Err(bad());
    }

    Ok(TinyUnit {
        value,
        raise: (!raise.is_empty()).then(|| String::from_utf8_lossy(&raise).into_owned()),
        chunk: String::from_utf8_lossy(&stored_chunk).into_owned(),
        source,
    })
}

/// Length-prefixed field, written in small pieces.
fn write_field(out: &mut dyn Write, data: &[u8]) -> io::Result<()> {
    out.write_all(&(data.len() as u32).to_le_bytes())?;
    for piece in data.chunks(100) {
        out.write_all(piece)?;
    }
    Ok(())
}

fn read_field(rest: &mut &[u8]) -> Option<Vec<u8>> {
    if rest.len() < 4 {
        return None;
    }
    let len = u32::from_le_bytes(rest[..4].try_into().ok()?) as usize;
    let data = rest.get(4..4 + len)?.to_vec();
    *rest = &rest[4 + len..];
    Some(data)
}

/// Searcher that never finds anything and counts how often it was asked.
pub struct CountingSearcher {
    pub label: &'static str,
    pub hits: Arc<AtomicUsize>,
}

impl CountingSearcher {
    pub fn new(label: &'static str) -> (Self, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        (
            Self {
                label,
                hits: Arc::clone(&hits),
            },
            hits,
        )
    }
}

impl Searcher<TinyEngine> for CountingSearcher {
    fn label(&self) -> &str {
        self.label
    }

    fn search(
        &self,
        name: &ModuleName,
        _cx: &mut SearchContext<'_, TinyEngine>,
    ) -> SearchOutcome<TinyUnit> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        SearchOutcome::NotFound(format!("counted '{}'", name))
    }
}

/// Source of at least `min_len` bytes that returns `value`.
pub fn long_source(min_len: usize, value: i64) -> Vec<u8> {
    let mut text = String::new();
    let mut i = 0;
    while text.len() < min_len {
        text.push_str(&format!("-- padding line {}\n", i));
        i += 1;
    }
    text.push_str(&format!("return {}\n", value));
    text.into_bytes()
}
