//! Module resolution for `require` specifiers and entry requests

use std::path::{Path, PathBuf};

use crate::error::{BundleError, Result};
use crate::fs::FileStore;
use crate::module::normalize_path;

/// Turns candidate paths into existing files by trying extension suffixes.
pub struct PathResolver<'a> {
    store: &'a dyn FileStore,
    extensions: &'a [String],
}

impl<'a> PathResolver<'a> {
    pub fn new(store: &'a dyn FileStore, extensions: &'a [String]) -> Self {
        Self { store, extensions }
    }

    /// Checks `candidate` verbatim, then `candidate` + each extension in
    /// order. Extensions are appended as text, so `./a.min` + `.js` is
    /// `./a.min.js`.
    ///
    /// On failure returns every path that was tried.
    pub fn resolve(&self, candidate: &Path) -> std::result::Result<PathBuf, Vec<PathBuf>> {
        let candidate = normalize_path(candidate);
        let mut tried = Vec::with_capacity(self.extensions.len() + 1);

        if self.store.exists(&candidate) {
            return Ok(candidate);
        }
        tried.push(candidate.clone());

        for ext in self.extensions {
            let mut with_ext = candidate.clone().into_os_string();
            with_ext.push(ext);
            let with_ext = PathBuf::from(with_ext);
            if self.store.exists(&with_ext) {
                return Ok(with_ext);
            }
            tried.push(with_ext);
        }

        Err(tried)
    }

    /// Resolves a specifier relative to the importing module's directory.
    pub fn resolve_import(&self, specifier: &str, importer: &Path) -> Result<PathBuf> {
        let dir = importer.parent().unwrap_or_else(|| Path::new(""));
        self.resolve(&dir.join(specifier)).map_err(|tried| BundleError::Resolution {
            specifier: specifier.to_string(),
            importer: Some(importer.to_path_buf()),
            tried,
        })
    }

    /// Resolves an entry request against the compilation context.
    pub fn resolve_entry(&self, request: &str, context: &Path) -> Result<PathBuf> {
        self.resolve(&context.join(request)).map_err(|tried| BundleError::Resolution {
            specifier: request.to_string(),
            importer: None,
            tried,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileStore;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_verbatim_path_wins() {
        let store = MemoryFileStore::with_files([("/p/a", "1"), ("/p/a.js", "2")]);
        let extensions = exts(&[".js"]);
        let resolver = PathResolver::new(&store, &extensions);
        assert_eq!(resolver.resolve(Path::new("/p/a")).unwrap(), PathBuf::from("/p/a"));
    }

    #[test]
    fn test_extensions_in_configured_order() {
        let store = MemoryFileStore::with_files([("/p/a.json", "{}"), ("/p/a.js", "1")]);

        let extensions = exts(&[".json", ".js"]);
        let resolver = PathResolver::new(&store, &extensions);
        assert_eq!(resolver.resolve(Path::new("/p/a")).unwrap(), PathBuf::from("/p/a.json"));

        let extensions = exts(&[".js", ".json"]);
        let resolver = PathResolver::new(&store, &extensions);
        assert_eq!(resolver.resolve(Path::new("/p/a")).unwrap(), PathBuf::from("/p/a.js"));
    }

    #[test]
    fn test_extension_is_a_suffix() {
        let store = MemoryFileStore::with_files([("/p/a.min.js", "1")]);
        let extensions = exts(&[".js"]);
        let resolver = PathResolver::new(&store, &extensions);
        assert_eq!(resolver.resolve(Path::new("/p/a.min")).unwrap(), PathBuf::from("/p/a.min.js"));
    }

    #[test]
    fn test_directory_is_not_a_hit() {
        // "/p/a/b.js" makes "/p/a" a directory in spirit; only "/p/a.js" is a file.
        let store = MemoryFileStore::with_files([("/p/a/b.js", "1"), ("/p/a.js", "2")]);
        let extensions = exts(&[".js"]);
        let resolver = PathResolver::new(&store, &extensions);
        assert_eq!(resolver.resolve(Path::new("/p/a")).unwrap(), PathBuf::from("/p/a.js"));
    }

    #[test]
    fn test_resolve_import_relative_to_importer() {
        let store = MemoryFileStore::with_files([("/p/lib/util.js", "1")]);
        let extensions = exts(&[".js"]);
        let resolver = PathResolver::new(&store, &extensions);
        let resolved = resolver
            .resolve_import("../lib/util", Path::new("/p/src/index.js"))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("/p/lib/util.js"));
    }

    #[test]
    fn test_failure_lists_every_candidate() {
        let store = MemoryFileStore::new();
        let extensions = exts(&[".js", ".json"]);
        let resolver = PathResolver::new(&store, &extensions);
        let err = resolver.resolve_import("./missing", Path::new("/p/src/index.js")).unwrap_err();
        match err {
            BundleError::Resolution { specifier, importer, tried } => {
                assert_eq!(specifier, "./missing");
                assert_eq!(importer, Some(PathBuf::from("/p/src/index.js")));
                assert_eq!(
                    tried,
                    vec![
                        PathBuf::from("/p/src/missing"),
                        PathBuf::from("/p/src/missing.js"),
                        PathBuf::from("/p/src/missing.json"),
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
