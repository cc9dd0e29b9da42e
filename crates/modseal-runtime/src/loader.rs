//! Loader facade.
//!
//! A [`Loader`] owns the engine together with everything that must never be
//! touched concurrently with it: the codec and its file flags, the preload
//! table and the search chain. One lock guards all of it and every method
//! holds the guard for its whole duration.

use std::path::Path;
use std::sync::Arc;

use modseal_codec::{Codec, FileFlags};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::assets::AssetStore;
use crate::compile::{compile_asset, compile_buffer, compile_file};
use crate::config::{LoaderConfig, SearcherKind};
use crate::dump::{dump_to_file, dump_to_vec, DumpReport};
use crate::engine::Engine;
use crate::error::{Result, RuntimeError};
use crate::resolver::{
    AssetSearcher, FileSearcher, HostResolver, HostSearcher, ModuleName, PreloadSearcher,
    PreloadTable, Resolved, SearchChain, SearchContext, Searcher,
};

struct LoaderState<E: Engine> {
    engine: E,
    codec: Codec,
    preload: PreloadTable<E::Unit>,
    chain: SearchChain<E>,
    block_size: usize,
    assets: Option<Arc<dyn AssetStore>>,
}

impl<E: Engine> LoaderState<E> {
    fn store(&self, path: &str) -> Result<Arc<dyn AssetStore>> {
        self.assets.clone().ok_or_else(|| RuntimeError::NotFound {
            what: "asset",
            path: path.to_string(),
            reason: "no asset store configured".to_string(),
        })
    }
}

/// Builder for a [`Loader`].
pub struct LoaderBuilder<E: Engine> {
    engine: E,
    config: LoaderConfig,
    host: Option<Arc<dyn HostResolver<E>>>,
    assets: Option<Arc<dyn AssetStore>>,
    extra: Vec<Box<dyn Searcher<E>>>,
}

impl<E: Engine + 'static> LoaderBuilder<E> {
    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Install the host resolution callback.
    pub fn host(mut self, resolver: impl HostResolver<E> + 'static) -> Self {
        let resolver: Arc<dyn HostResolver<E>> = Arc::new(resolver);
        self.host = Some(resolver);
        self
    }

    /// Install the packaged asset store.
    pub fn assets(mut self, store: Arc<dyn AssetStore>) -> Self {
        self.assets = Some(store);
        self
    }

    /// Append a custom searcher after the configured ones.
    pub fn searcher(mut self, searcher: impl Searcher<E> + 'static) -> Self {
        self.extra.push(Box::new(searcher));
        self
    }

    pub fn build(self) -> Result<Loader<E>> {
        let LoaderBuilder {
            engine,
            config,
            host,
            assets,
            extra,
        } = self;
        config.validate()?;

        let mut chain: SearchChain<E> = SearchChain::new();
        chain.push(Box::new(PreloadSearcher));
        for kind in &config.searchers {
            match kind {
                SearcherKind::File => chain.push(Box::new(FileSearcher::new(
                    config.search_root.clone(),
                    config.extension.clone(),
                ))),
                SearcherKind::Host => {
                    if let Some(resolver) = &host {
                        chain.push(Box::new(HostSearcher::new(Arc::clone(resolver))));
                    }
                }
                SearcherKind::Asset => {
                    if let Some(store) = &assets {
                        chain.push(Box::new(AssetSearcher::new(
                            Arc::clone(store),
                            config.asset_root.clone(),
                            config.extension.clone(),
                        )));
                    }
                }
            }
        }
        for searcher in extra {
            chain.push(searcher);
        }

        let codec = config.codec(engine.signature());
        info!(
            searchers = ?chain.labels(),
            flags = codec.flags().bits(),
            block_size = config.block_size,
            "loader ready"
        );

        Ok(Loader {
            state: Mutex::new(LoaderState {
                engine,
                codec,
                preload: PreloadTable::new(),
                chain,
                block_size: config.block_size,
                assets,
            }),
        })
    }
}

/// Serialized access to one engine and its module state.
pub struct Loader<E: Engine> {
    state: Mutex<LoaderState<E>>,
}

impl<E: Engine + 'static> Loader<E> {
    /// Create a loader with the default searchers for `config`.
    pub fn new(engine: E, config: LoaderConfig) -> Result<Self> {
        Self::builder(engine).config(config).build()
    }

    pub fn builder(engine: E) -> LoaderBuilder<E> {
        LoaderBuilder {
            engine,
            config: LoaderConfig::default(),
            host: None,
            assets: None,
            extra: Vec::new(),
        }
    }

    /// Current file flags.
    pub fn file_flags(&self) -> FileFlags {
        self.state.lock().codec.flags()
    }

    /// Replace the file flags. Affects every later read and dump.
    pub fn set_file_flags(&self, flags: FileFlags) {
        let mut state = self.state.lock();
        state.codec.set_flags(flags);
        info!(flags = flags.bits(), "file flags updated");
    }

    /// Compile a resident buffer under chunk name `name`.
    pub fn load_data(&self, name: &str, bytes: &[u8]) -> Result<E::Unit> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        compile_buffer(&mut state.engine, &state.codec, bytes, Some(name)).map(|out| out.unit)
    }

    /// Compile a file; the chunk name defaults to `@<path>`.
    pub fn load_file(&self, path: &Path, chunk_name: Option<&str>) -> Result<E::Unit> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        compile_file(
            &mut state.engine,
            &state.codec,
            path,
            chunk_name,
            state.block_size,
        )
        .map(|out| out.unit)
    }

    /// Compile an asset; the chunk name defaults to `@<path>`.
    pub fn load_asset(&self, path: &str, chunk_name: Option<&str>) -> Result<E::Unit> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let store = state.store(path)?;
        compile_asset(
            &mut state.engine,
            &state.codec,
            store.as_ref(),
            path,
            chunk_name,
            state.block_size,
        )
        .map(|out| out.unit)
    }

    /// Compile `bytes` and register the unit under `name`.
    pub fn preload_data(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let out = compile_buffer(&mut state.engine, &state.codec, bytes, Some(name))?;
        register(state, name, out.unit);
        Ok(())
    }

    /// Compile the file at `path` and register the unit under `name`.
    pub fn preload_file(&self, name: &str, path: &Path) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let out = compile_file(
            &mut state.engine,
            &state.codec,
            path,
            Some(name),
            state.block_size,
        )?;
        register(state, name, out.unit);
        Ok(())
    }

    /// Compile the asset at `path` and register the unit under `name`.
    pub fn preload_asset(&self, name: &str, path: &str) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let store = state.store(path)?;
        let out = compile_asset(
            &mut state.engine,
            &state.codec,
            store.as_ref(),
            path,
            Some(name),
            state.block_size,
        )?;
        register(state, name, out.unit);
        Ok(())
    }

    /// Like [`Loader::preload_asset`], and also dump the unit to `out`.
    ///
    /// The unit is only registered once the dump has succeeded.
    pub fn preload_asset_and_save(&self, name: &str, path: &str, out: &Path) -> Result<DumpReport> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let store = state.store(path)?;
        let compiled = compile_asset(
            &mut state.engine,
            &state.codec,
            store.as_ref(),
            path,
            Some(name),
            state.block_size,
        )?;
        let report = dump_to_file(
            &mut state.engine,
            &state.codec,
            &compiled.unit,
            out,
            state.block_size,
        )?;
        register(state, name, compiled.unit);
        Ok(report)
    }

    pub fn is_preloaded(&self, name: &str) -> bool {
        self.state.lock().preload.contains(name)
    }

    /// Preloaded module names, sorted.
    pub fn preloaded_names(&self) -> Vec<String> {
        self.state.lock().preload.names()
    }

    /// Run the search chain for `name`.
    pub fn resolve(&self, name: &str) -> Result<Resolved<E::Unit>> {
        let mut guard = self.state.lock();
        let LoaderState {
            engine,
            codec,
            preload,
            chain,
            block_size,
            ..
        } = &mut *guard;

        let mut cx = SearchContext {
            engine,
            codec,
            block_size: *block_size,
            preload,
        };
        chain.resolve(&ModuleName::new(name), &mut cx)
    }

    /// Resolve `name` and run the unit.
    ///
    /// Results are not cached; every call resolves and runs again.
    pub fn require(&self, name: &str) -> Result<E::Value> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let resolved = {
            let mut cx = SearchContext {
                engine: &mut state.engine,
                codec: &state.codec,
                block_size: state.block_size,
                preload: &state.preload,
            };
            state.chain.resolve(&ModuleName::new(name), &mut cx)?
        };
        invoke(&mut state.engine, &resolved.unit)
    }

    /// Run a compiled unit.
    pub fn call(&self, unit: &E::Unit) -> Result<E::Value> {
        invoke(&mut self.state.lock().engine, unit)
    }

    /// Dump `unit` to `path`, sealed when protection is enabled.
    pub fn dump(&self, unit: &E::Unit, path: &Path) -> Result<DumpReport> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        dump_to_file(&mut state.engine, &state.codec, unit, path, state.block_size)
    }

    /// Dump `unit` into memory.
    pub fn dump_to_vec(&self, unit: &E::Unit) -> Result<Vec<u8>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        dump_to_vec(&mut state.engine, &state.codec, unit, state.block_size).map(|(bytes, _)| bytes)
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        f(&mut self.state.lock().engine)
    }
}

fn register<E: Engine>(state: &mut LoaderState<E>, name: &str, unit: E::Unit) {
    if state.preload.insert(name, unit).is_some() {
        debug!(module = name, "replaced preloaded module");
    } else {
        debug!(module = name, "preloaded module");
    }
}

fn invoke<E: Engine>(engine: &mut E, unit: &E::Unit) -> Result<E::Value> {
    engine
        .call(unit)
        .map_err(|message| RuntimeError::Invoke { message })
}
