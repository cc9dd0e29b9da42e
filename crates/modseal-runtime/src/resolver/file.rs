use std::fs::File;
use std::path::PathBuf;

use super::{ModuleName, SearchContext, SearchOutcome, Searcher};
use crate::compile::compile_file;
use crate::engine::Engine;

/// Looks for `<root>/<module path>.<ext>` on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSearcher {
    root: Option<PathBuf>,
    extension: String,
}

impl FileSearcher {
    pub fn new(root: Option<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root,
            extension: extension.into(),
        }
    }

    /// Candidate path for `name`.
    pub fn candidate(&self, name: &ModuleName) -> PathBuf {
        let relative = name.to_relative_path(&self.extension);
        match &self.root {
            Some(root) => root.join(relative),
            None => PathBuf::from(relative),
        }
    }
}

impl<E: Engine> Searcher<E> for FileSearcher {
    fn label(&self) -> &str {
        "file"
    }

    fn search(&self, name: &ModuleName, cx: &mut SearchContext<'_, E>) -> SearchOutcome<E::Unit> {
        let path = self.candidate(name);

        // Readability probe
        if let Err(e) = File::open(&path) {
            return SearchOutcome::NotFound(format!("no file '{}': {}", path.display(), e));
        }

        let result = compile_file(
            cx.engine,
            cx.codec,
            &path,
            Some(name.as_str()),
            cx.block_size,
        );
        SearchOutcome::from_compile(name, path.display().to_string(), result)
    }
}
