//! Host-provided module lookup.
//!
//! The embedding application gets a say in resolution through a
//! [`HostResolver`]. It runs with the loader lock held and receives the
//! engine as `&mut E`; it must not call back into the same loader.

use std::path::PathBuf;
use std::sync::Arc;

use super::{ModuleName, SearchContext, SearchOutcome, Searcher};
use crate::compile::{compile_buffer, compile_file};
use crate::engine::Engine;
use crate::error::RuntimeError;

/// The host's answer to a module request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostReply {
    /// Compile the file at this path, chunk named after the module
    Path(PathBuf),
    /// Compile these bytes
    Bytes(Vec<u8>),
    /// The host does not know the module
    Missing(Option<String>),
    /// The host tried and failed
    Failed(String),
}

/// Resolution callback supplied by the embedding application.
pub trait HostResolver<E>: Send + Sync {
    fn on_require(&self, name: &str, engine: &mut E) -> HostReply;
}

impl<E, F> HostResolver<E> for F
where
    F: Fn(&str, &mut E) -> HostReply + Send + Sync,
{
    fn on_require(&self, name: &str, engine: &mut E) -> HostReply {
        self(name, engine)
    }
}

/// Delegates to a [`HostResolver`].
pub struct HostSearcher<E> {
    resolver: Arc<dyn HostResolver<E>>,
}

impl<E> HostSearcher<E> {
    pub fn new(resolver: Arc<dyn HostResolver<E>>) -> Self {
        Self { resolver }
    }
}

impl<E: Engine> Searcher<E> for HostSearcher<E> {
    fn label(&self) -> &str {
        "host"
    }

    fn search(&self, name: &ModuleName, cx: &mut SearchContext<'_, E>) -> SearchOutcome<E::Unit> {
        match self.resolver.on_require(name.as_str(), cx.engine) {
            HostReply::Path(path) => {
                let result = compile_file(
                    cx.engine,
                    cx.codec,
                    &path,
                    Some(name.as_str()),
                    cx.block_size,
                );
                SearchOutcome::from_compile(name, path.display().to_string(), result)
            }
            HostReply::Bytes(bytes) => {
                let result = compile_buffer(cx.engine, cx.codec, &bytes, Some(name.as_str()));
                SearchOutcome::from_compile(name, "host buffer".to_string(), result)
            }
            HostReply::Missing(message) => SearchOutcome::NotFound(
                message.unwrap_or_else(|| format!("host has no module '{}'", name)),
            ),
            HostReply::Failed(message) => SearchOutcome::HardError(RuntimeError::HostCallback {
                module: name.to_string(),
                message,
            }),
        }
    }
}
