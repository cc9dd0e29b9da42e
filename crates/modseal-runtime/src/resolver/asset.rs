use std::sync::Arc;

use super::{ModuleName, SearchContext, SearchOutcome, Searcher};
use crate::assets::{join_asset_path, AssetStore};
use crate::compile::compile_asset;
use crate::engine::Engine;

/// Looks for `<root>/<module path>.<ext>` in a packaged asset store.
pub struct AssetSearcher {
    store: Arc<dyn AssetStore>,
    root: Option<String>,
    extension: String,
}

impl AssetSearcher {
    pub fn new(store: Arc<dyn AssetStore>, root: Option<String>, extension: impl Into<String>) -> Self {
        Self {
            store,
            root,
            extension: extension.into(),
        }
    }

    /// Asset path for `name`.
    pub fn candidate(&self, name: &ModuleName) -> String {
        join_asset_path(self.root.as_deref(), &name.to_relative_path(&self.extension))
    }
}

impl<E: Engine> Searcher<E> for AssetSearcher {
    fn label(&self) -> &str {
        "asset"
    }

    fn search(&self, name: &ModuleName, cx: &mut SearchContext<'_, E>) -> SearchOutcome<E::Unit> {
        let path = self.candidate(name);
        if !self.store.exists(&path) {
            return SearchOutcome::NotFound(format!("no asset '{}'", path));
        }

        let result = compile_asset(
            cx.engine,
            cx.codec,
            self.store.as_ref(),
            &path,
            Some(name.as_str()),
            cx.block_size,
        );
        SearchOutcome::from_compile(name, format!("asset '{}'", path), result)
    }
}
