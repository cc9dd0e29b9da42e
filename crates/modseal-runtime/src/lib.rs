//! Modseal runtime
//!
//! Loads script modules for an embedded engine from buffers, files and
//! packaged assets, transparently unsealing protected ones, and writes
//! compiled units back out (sealed when protection is on).
//!
//! # Example
//!
//! ```ignore
//! use modseal_runtime::{Loader, LoaderConfig};
//!
//! let loader = Loader::new(engine, LoaderConfig::default())?;
//! loader.preload_data("main", b"return 1")?;
//! let value = loader.require("main")?;
//! ```

pub mod assets;
pub mod compile;
pub mod config;
pub mod dump;
pub mod engine;
pub mod error;
pub mod loader;
pub mod resolver;
pub mod source;

pub use assets::{AssetError, AssetStore, Assets};
pub use compile::{compile_asset, compile_buffer, compile_file, CompileOutput};
pub use config::{ConfigError, FlagsConfig, LoaderConfig, SearcherKind};
pub use dump::{dump_to_file, dump_to_vec, DumpReport, SealWriter};
pub use engine::{BlockRead, BlockSource, Engine};
pub use error::{IoPhase, Result, RuntimeError};
pub use loader::{Loader, LoaderBuilder};
pub use resolver::{
    HostReply, HostResolver, ModuleName, Resolved, SearchChain, SearchContext, SearchOutcome,
    Searcher,
};
pub use source::{BufferSource, StreamSource};

pub use modseal_codec::{Codec, ContentKind, FileFlags};
