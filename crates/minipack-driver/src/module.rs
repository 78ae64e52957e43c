//! Modules, their canonical ids, and the path arithmetic behind them.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexSet;
use minipack_ast::Span;
use serde::Serialize;

/// Canonical module id: `./` followed by the module's path relative to the
/// compilation context, with forward slashes. This is the key under which
/// the runtime's `require` finds the module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn from_path(path: &Path, context: &Path) -> Self {
        let relative = relative_path(path, context);
        ModuleId(format!("./{}", to_posix(&relative)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One `require` found in a module, after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    /// The specifier as written in the importing module.
    pub specifier: String,
    pub id: ModuleId,
    pub path: PathBuf,
    /// Position of the specifier literal in the post-loader text.
    #[serde(skip)]
    pub span: Span,
}

/// A built module.
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    pub id: ModuleId,
    pub path: PathBuf,
    /// Every chunk that reaches this module, in the order they reached it.
    pub names: IndexSet<String>,
    pub dependencies: Vec<DependencyEdge>,
    /// Rewritten source, as embedded in the runtime.
    #[serde(skip)]
    pub source: String,
}

impl Module {
    /// A module that has been registered but not built yet.
    pub fn placeholder(id: ModuleId, path: PathBuf, chunk_name: &str) -> Self {
        let mut names = IndexSet::new();
        names.insert(chunk_name.to_string());
        Self {
            id,
            path,
            names,
            dependencies: Vec::new(),
            source: String::new(),
        }
    }
}

/// Removes `.` segments and folds `..` into the preceding segment, without
/// touching the file system. A `..` that would climb above the root is
/// dropped; one at the start of a relative path is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// `path` relative to `base`, both normalized first. Climbs with `..` when
/// `path` is outside `base`.
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let path = normalize_path(path);
    let base = normalize_path(base);
    let path_parts: Vec<Component<'_>> = path.components().collect();
    let base_parts: Vec<Component<'_>> = base
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &path_parts[common..] {
        out.push(part.as_os_str());
    }
    out
}

/// Joins the path's segments with `/`.
pub fn to_posix(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::RootDir => Some(String::new()),
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}
