//! Asset store
//!
//! Maps virtual asset paths (forward slashes, no leading `./`) to entries:
//! - **DiskBacked**: the file lives on disk and is opened on demand
//! - **Embedded**: the bytes are held in memory, typically from a pack

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::pack::read_pack;
use super::AssetError;

/// An opened asset: readable, with a length known up front.
pub trait Asset: Read + Send {
    /// Total length of the asset in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only packaged resource store.
pub trait AssetStore: Send + Sync {
    /// Open the asset at `path`.
    fn open(&self, path: &str) -> Result<Box<dyn Asset + '_>, AssetError>;

    /// Whether an asset exists at `path`.
    fn exists(&self, path: &str) -> bool;
}

/// A single entry in an [`Assets`] store.
#[derive(Debug, Clone)]
pub enum AssetEntry {
    /// Dev mode: file lives on disk, read on demand.
    DiskBacked(PathBuf),

    /// Shipped mode: bytes embedded in the store.
    Embedded(Arc<[u8]>),
}

/// In-process asset store.
#[derive(Debug, Clone, Default)]
pub struct Assets {
    entries: HashMap<String, AssetEntry>,
}

impl Assets {
    /// Create a store from a map of entries.
    pub fn new(entries: HashMap<String, AssetEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(path, entry)| (normalize_path(&path), entry))
            .collect();
        Self { entries }
    }

    /// Create an empty store.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index every file under `root` as a disk-backed entry.
    pub fn from_dir(root: &Path) -> io::Result<Self> {
        let mut files = Vec::new();
        collect_all_files(root, &mut files)?;

        let mut entries = HashMap::new();
        for path in files {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            entries.insert(normalize_path(&relative), AssetEntry::DiskBacked(path));
        }
        Ok(Self { entries })
    }

    /// Load every entry of an asset pack into memory.
    pub fn from_pack(data: &[u8]) -> Result<Self, AssetError> {
        let entries = read_pack(data)?
            .into_iter()
            .map(|(path, bytes)| (normalize_path(&path), AssetEntry::Embedded(bytes.into())))
            .collect();
        Ok(Self { entries })
    }

    /// Load an asset pack file.
    pub fn from_pack_file(path: &Path) -> Result<Self, AssetError> {
        let data = std::fs::read(path)?;
        Self::from_pack(&data)
    }

    /// Add or replace an embedded entry.
    pub fn insert(&mut self, path: &str, data: impl Into<Arc<[u8]>>) {
        self.entries
            .insert(normalize_path(path), AssetEntry::Embedded(data.into()));
    }

    /// List all paths in the store.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collect all entries for writing a pack, sorted by path.
    ///
    /// Disk-backed entries are read now; one that cannot be read fails the
    /// whole collection.
    pub fn collect_for_pack(&self) -> Result<Vec<(String, Vec<u8>)>, AssetError> {
        let mut result = Vec::with_capacity(self.entries.len());
        for (path, entry) in &self.entries {
            let data = match entry {
                AssetEntry::DiskBacked(p) => std::fs::read(p)?,
                AssetEntry::Embedded(data) => data.to_vec(),
            };
            result.push((path.clone(), data));
        }
        result.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(result)
    }
}

impl AssetStore for Assets {
    fn open(&self, path: &str) -> Result<Box<dyn Asset + '_>, AssetError> {
        let normalized = normalize_path(path);
        match self.entries.get(&normalized) {
            Some(AssetEntry::DiskBacked(p)) => {
                let file = File::open(p)?;
                let len = file.metadata()?.len();
                Ok(Box::new(FileAsset { file, len }))
            }
            Some(AssetEntry::Embedded(data)) => Ok(Box::new(MemoryAsset {
                cursor: Cursor::new(Arc::clone(data)),
            })),
            None => Err(AssetError::NotFound(normalized)),
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.entries.contains_key(&normalize_path(path))
    }
}

struct FileAsset {
    file: File,
    len: u64,
}

impl Read for FileAsset {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Asset for FileAsset {
    fn len(&self) -> u64 {
        self.len
    }
}

struct MemoryAsset {
    cursor: Cursor<Arc<[u8]>>,
}

impl Read for MemoryAsset {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Asset for MemoryAsset {
    fn len(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }
}

/// Normalize a path for store lookup.
///
/// - Replace backslashes with forward slashes
/// - Remove leading `./`
/// - Remove trailing `/`
pub fn normalize_path(path: &str) -> String {
    let mut p = path.replace('\\', "/");
    while let Some(rest) = p.strip_prefix("./") {
        p = rest.to_string();
    }
    while p.ends_with('/') {
        p.pop();
    }
    p
}

/// Join a relative module path onto an asset root, folding `.` and `..`.
///
/// `..` never climbs above the store root.
pub fn join_asset_path(root: Option<&str>, relative: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let joined = match root {
        Some(root) if !root.is_empty() => format!("{}/{}", root, relative),
        _ => relative.to_string(),
    };
    let joined = joined.replace('\\', "/");
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Recursively collect all files in a directory.
fn collect_all_files(dir: &Path, results: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_all_files(&path, results)?;
        } else {
            results.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(mut asset: Box<dyn Asset + '_>) -> Vec<u8> {
        let mut out = Vec::new();
        asset.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./main.lua"), "main.lua");
        assert_eq!(normalize_path("ui/list.lua"), "ui/list.lua");
        assert_eq!(normalize_path("ui\\list.lua"), "ui/list.lua");
        assert_eq!(normalize_path("./ui/"), "ui");
    }

    #[test]
    fn test_join_asset_path() {
        assert_eq!(join_asset_path(None, "a/b.lua"), "a/b.lua");
        assert_eq!(join_asset_path(Some("game"), "a/b.lua"), "game/a/b.lua");
        assert_eq!(join_asset_path(Some("game/ui"), "../util.lua"), "game/util.lua");
        assert_eq!(join_asset_path(Some("game/"), "./x.lua"), "game/x.lua");
        assert_eq!(join_asset_path(Some("a"), "../../x.lua"), "x.lua");
    }

    #[test]
    fn test_empty_store() {
        let assets = Assets::empty();
        assert!(assets.is_empty());
        assert!(!assets.exists("anything"));
        assert!(matches!(assets.open("anything"), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn test_embedded_entries() {
        let mut assets = Assets::empty();
        assets.insert("./main.lua", b"return 1".to_vec());
        assets.insert("ui/list.lua", b"return 2".to_vec());

        assert_eq!(assets.len(), 2);
        assert!(assets.exists("main.lua"));
        let asset = assets.open("ui/list.lua").unwrap();
        assert_eq!(asset.len(), 8);
        assert_eq!(read_all(asset), b"return 2");
    }

    #[test]
    fn test_disk_backed_entries() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("ui")).unwrap();
        std::fs::write(temp.path().join("main.lua"), "return 1").unwrap();
        std::fs::write(temp.path().join("ui/list.lua"), "return 22").unwrap();

        let assets = Assets::from_dir(temp.path()).unwrap();
        assert_eq!(assets.len(), 2);
        let asset = assets.open("ui/list.lua").unwrap();
        assert_eq!(asset.len(), 9);
        assert_eq!(read_all(asset), b"return 22");
    }

    #[test]
    fn test_collect_for_pack_sorted() {
        let mut assets = Assets::empty();
        assets.insert("b.lua", b"second".to_vec());
        assets.insert("a.lua", b"first".to_vec());

        let collected = assets.collect_for_pack().unwrap();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].0, "a.lua");
        assert_eq!(collected[1].0, "b.lua");
    }
}
