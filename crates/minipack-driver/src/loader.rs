//! Loader pipeline: rule matching and right-to-left source transforms.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{BundleError, Result};
use crate::module::to_posix;

/// Error a loader may return for input it cannot handle.
pub type LoaderError = Box<dyn std::error::Error + Send + Sync>;

/// A source-to-source transform applied before parsing.
pub trait Loader: Send + Sync {
    fn name(&self) -> &str;

    fn transform(&self, source: String) -> std::result::Result<String, LoaderError>;
}

/// Loader backed by a closure.
pub struct FnLoader<F> {
    name: String,
    f: F,
}

impl<F> Loader for FnLoader<F>
where
    F: Fn(String) -> String + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, source: String) -> std::result::Result<String, LoaderError> {
        Ok((self.f)(source))
    }
}

/// Wraps an infallible closure as a loader.
pub fn loader_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn Loader>
where
    F: Fn(String) -> String + Send + Sync + 'static,
{
    Arc::new(FnLoader { name: name.into(), f })
}

/// `raw`: exports the file's text as a string.
#[derive(Debug, Default)]
pub struct RawLoader;

impl Loader for RawLoader {
    fn name(&self) -> &str {
        "raw"
    }

    fn transform(&self, source: String) -> std::result::Result<String, LoaderError> {
        Ok(format!("module.exports = {};\n", minipack_ast::quote_string(&source)))
    }
}

/// `json`: validates the file as JSON and exports the value.
#[derive(Debug, Default)]
pub struct JsonLoader;

impl Loader for JsonLoader {
    fn name(&self) -> &str {
        "json"
    }

    fn transform(&self, source: String) -> std::result::Result<String, LoaderError> {
        let value: serde_json::Value = serde_json::from_str(&source)?;
        Ok(format!("module.exports = {};\n", value))
    }
}

/// `trim`: strips surrounding whitespace.
#[derive(Debug, Default)]
pub struct TrimLoader;

impl Loader for TrimLoader {
    fn name(&self) -> &str {
        "trim"
    }

    fn transform(&self, source: String) -> std::result::Result<String, LoaderError> {
        Ok(source.trim().to_string())
    }
}

/// Selects loaders for module paths.
#[derive(Clone)]
pub struct Rule {
    pub test: Regex,
    pub exclude: Option<Regex>,
    pub loaders: Vec<Arc<dyn Loader>>,
}

impl Rule {
    pub fn new(test: &str, loaders: Vec<Arc<dyn Loader>>) -> Result<Self> {
        Ok(Self {
            test: compile_pattern(test)?,
            exclude: None,
            loaders,
        })
    }

    pub fn exclude(mut self, pattern: &str) -> Result<Self> {
        self.exclude = Some(compile_pattern(pattern)?);
        Ok(self)
    }

    /// Matches against the path with forward slashes.
    pub fn matches(&self, path: &str) -> bool {
        self.test.is_match(path) && !self.exclude.as_ref().is_some_and(|re| re.is_match(path))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("test", &self.test.as_str())
            .field("exclude", &self.exclude.as_ref().map(|re| re.as_str()))
            .field("loaders", &self.loaders.iter().map(|l| l.name()).collect::<Vec<_>>())
            .finish()
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| BundleError::Config(format!("invalid rule pattern '{}': {}", pattern, e)))
}

/// Named loaders available to configuration files.
#[derive(Clone)]
pub struct LoaderRegistry {
    loaders: IndexMap<String, Arc<dyn Loader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self {
            loaders: IndexMap::new(),
        }
    }

    /// A registry holding `raw`, `json`, and `trim`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RawLoader));
        registry.register(Arc::new(JsonLoader));
        registry.register(Arc::new(TrimLoader));
        registry
    }

    /// Registers a loader under its own name, replacing any previous one.
    pub fn register(&mut self, loader: Arc<dyn Loader>) {
        self.loaders.insert(loader.name().to_string(), loader);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Loader>> {
        self.loaders.get(name).cloned().ok_or_else(|| {
            let known: Vec<&str> = self.loaders.keys().map(String::as_str).collect();
            BundleError::Config(format!("unknown loader '{}' (known: {})", name, known.join(", ")))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Runs every loader of every rule matching `path` over `source`.
///
/// Loader lists are concatenated in rule order and applied last to first,
/// so `[a, b]` runs `b` and feeds its output to `a`.
pub fn apply(source: String, path: &Path, rules: &[Rule]) -> Result<String> {
    let posix = to_posix(path);
    let loaders: Vec<&Arc<dyn Loader>> = rules
        .iter()
        .filter(|rule| rule.matches(&posix))
        .flat_map(|rule| rule.loaders.iter())
        .collect();

    if loaders.is_empty() {
        return Ok(source);
    }
    tracing::debug!(
        "Applying loaders [{}] to {}",
        loaders.iter().map(|l| l.name()).collect::<Vec<_>>().join(", "),
        posix
    );

    loaders.iter().rev().try_fold(source, |text, loader| {
        loader.transform(text).map_err(|source| BundleError::Loader {
            loader: loader.name().to_string(),
            path: path.to_path_buf(),
            source,
        })
    })
}
