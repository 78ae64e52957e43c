//! File store abstraction.
//!
//! The bundler never touches `std::fs` directly: module reads, existence
//! checks during resolution, and asset writes all go through a
//! [`FileStore`]. [`NativeFileStore`] is the real disk, [`MemoryFileStore`]
//! keeps everything in a map for tests.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::module::normalize_path;

pub trait FileStore: Send + Sync {
    /// Whether `path` is an existing regular file. Directories never count.
    fn exists(&self, path: &Path) -> bool;

    fn read_text(&self, path: &Path) -> io::Result<String>;

    /// Writes `text` to `path` all-or-nothing, creating parent directories.
    fn write_text(&self, path: &Path, text: &str) -> io::Result<()>;
}

/// The local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFileStore;

impl FileStore for NativeFileStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        // Write beside the target, then rename over it.
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// An in-memory file store.
///
/// Paths are normalized lexically before use, so `/p/src/../a.js` and
/// `/p/a.js` name the same file. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileStore {
    files: Arc<RwLock<BTreeMap<PathBuf, String>>>,
    reads: Arc<RwLock<BTreeMap<PathBuf, usize>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `(path, contents)` pairs.
    pub fn with_files<I, P, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<Path>,
        S: Into<String>,
    {
        let store = Self::new();
        for (path, text) in files {
            store.insert(path, text);
        }
        store
    }

    pub fn insert(&self, path: impl AsRef<Path>, text: impl Into<String>) {
        let mut files = self.files.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        files.insert(normalize_path(path.as_ref()), text.into());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        let files = self.files.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        files.get(&normalize_path(path.as_ref())).cloned()
    }

    /// Every stored path, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let files = self.files.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        files.keys().cloned().collect()
    }

    /// How many times `path` was read through [`FileStore::read_text`].
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        let reads = self.reads.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        reads.get(&normalize_path(path.as_ref())).copied().unwrap_or(0)
    }

    /// Makes every subsequent write fail until switched off again.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl FileStore for MemoryFileStore {
    fn exists(&self, path: &Path) -> bool {
        let files = self.files.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        files.contains_key(&normalize_path(path))
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        let path = normalize_path(path);
        {
            let mut reads = self.reads.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            *reads.entry(path.clone()).or_insert(0) += 1;
        }
        let files = self.files.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        files.get(&path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
        })
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "writes are disabled on this store",
            ));
        }
        self.insert(path, text);
        Ok(())
    }
}
