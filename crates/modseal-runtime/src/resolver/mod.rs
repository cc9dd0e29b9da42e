//! Module resolution.
//!
//! A [`SearchChain`] tries its searchers in order. The first searcher that
//! finds the module wins; a searcher that finds a source but cannot load it
//! stops the chain. Only when every searcher reports "not found" does the
//! chain fail with the full list of attempts.

mod asset;
mod file;
mod host;
mod preload;

pub use asset::AssetSearcher;
pub use file::FileSearcher;
pub use host::{HostReply, HostResolver, HostSearcher};
pub use preload::{PreloadSearcher, PreloadTable, PRELOAD_ORIGIN};

use std::fmt;

use modseal_codec::Codec;
use tracing::{debug, info, warn};

use crate::compile::CompileOutput;
use crate::engine::Engine;
use crate::error::{Result, RuntimeError};

/// Logical module identifier, e.g. `ui.list` or `../shared/util`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleName(String);

impl ModuleName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Relative resource path for this module.
    ///
    /// A trailing `.<ext>` is dropped first. Names containing `..` are
    /// already relative paths and keep their dots; otherwise every `.`
    /// separates a directory.
    pub fn to_relative_path(&self, ext: &str) -> String {
        let suffix = format!(".{}", ext);
        let stem = self.0.strip_suffix(&suffix).unwrap_or(&self.0);
        let path = if stem.contains("..") {
            stem.to_string()
        } else {
            stem.replace('.', "/")
        };
        format!("{}{}", path, suffix)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// What a single searcher made of a module name.
#[derive(Debug)]
pub enum SearchOutcome<U> {
    /// Compiled unit plus a description of where it came from
    Found { unit: U, origin: String },
    /// Nothing here; the message is kept for the final diagnostic
    NotFound(String),
    /// A source exists but is broken; the chain stops
    HardError(RuntimeError),
}

impl<U> SearchOutcome<U> {
    /// Map a compile result for `origin` onto a search outcome.
    ///
    /// A missing origin is "not found"; anything else that fails is wrapped
    /// in [`RuntimeError::LoadFailed`].
    pub fn from_compile(
        name: &ModuleName,
        origin: String,
        result: Result<CompileOutput<U>>,
    ) -> Self {
        match result {
            Ok(output) => SearchOutcome::Found {
                unit: output.unit,
                origin,
            },
            Err(err) if err.is_not_found() => SearchOutcome::NotFound(err.to_string()),
            Err(err) => SearchOutcome::HardError(RuntimeError::LoadFailed {
                module: name.to_string(),
                origin,
                source: Box::new(err),
            }),
        }
    }
}

/// Everything a searcher may use while the loader lock is held.
pub struct SearchContext<'a, E: Engine> {
    pub engine: &'a mut E,
    pub codec: &'a Codec,
    pub block_size: usize,
    pub preload: &'a PreloadTable<E::Unit>,
}

/// One strategy for turning a module name into a compiled unit.
pub trait Searcher<E: Engine>: Send {
    /// Short label used in diagnostics and logs.
    fn label(&self) -> &str;

    fn search(&self, name: &ModuleName, cx: &mut SearchContext<'_, E>) -> SearchOutcome<E::Unit>;
}

/// A module resolved by the chain.
#[derive(Debug, Clone)]
pub struct Resolved<U> {
    pub unit: U,
    pub origin: String,
    /// Label of the searcher that found it
    pub searcher: String,
}

/// Ordered list of searchers.
pub struct SearchChain<E: Engine> {
    searchers: Vec<Box<dyn Searcher<E>>>,
}

impl<E: Engine> SearchChain<E> {
    pub fn new() -> Self {
        Self {
            searchers: Vec::new(),
        }
    }

    /// Append a searcher; it runs after every searcher already present.
    pub fn push(&mut self, searcher: Box<dyn Searcher<E>>) {
        self.searchers.push(searcher);
    }

    pub fn len(&self) -> usize {
        self.searchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.searchers.is_empty()
    }

    /// Labels in trial order.
    pub fn labels(&self) -> Vec<&str> {
        self.searchers.iter().map(|s| s.label()).collect()
    }

    /// Try every searcher in order.
    pub fn resolve(
        &self,
        name: &ModuleName,
        cx: &mut SearchContext<'_, E>,
    ) -> Result<Resolved<E::Unit>> {
        let mut attempts = Vec::with_capacity(self.searchers.len());

        for searcher in &self.searchers {
            let label = searcher.label();
            match searcher.search(name, cx) {
                SearchOutcome::Found { unit, origin } => {
                    info!(module = %name, searcher = label, %origin, "resolved module");
                    return Ok(Resolved {
                        unit,
                        origin,
                        searcher: label.to_string(),
                    });
                }
                SearchOutcome::NotFound(message) => {
                    debug!(module = %name, searcher = label, %message, "not found");
                    attempts.push(format!("\n\t[{}] {}", label, message));
                }
                SearchOutcome::HardError(err) => {
                    warn!(module = %name, searcher = label, error = %err, "search failed");
                    return Err(err);
                }
            }
        }

        Err(RuntimeError::ResolutionExhausted {
            module: name.to_string(),
            attempts,
        })
    }
}

impl<E: Engine> Default for SearchChain<E> {
    fn default() -> Self {
        Self::new()
    }
}
