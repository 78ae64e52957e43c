//! Bundler configuration and the `minipack.json` file format.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{BundleError, Result};
use crate::loader::{LoaderRegistry, Rule};
use crate::plugin::{builtin_plugin, Plugin};

/// Chunk name used for a single, unnamed entry.
pub const DEFAULT_ENTRY_NAME: &str = "main";

pub const CONFIG_FILE_NAME: &str = "minipack.json";

/// Entry requests, each producing one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// One request, bundled as chunk `main`.
    Single(String),
    /// Chunk name to request, in declaration order.
    Named(IndexMap<String, String>),
}

impl Entry {
    /// `(chunk name, request)` pairs in declaration order.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        match self {
            Entry::Single(request) => vec![(DEFAULT_ENTRY_NAME, request.as_str())],
            Entry::Named(map) => map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.pairs().into_iter().map(|(name, _)| name.to_string()).collect()
    }
}

impl Default for Entry {
    fn default() -> Self {
        Entry::Single("./src/index.js".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    /// Output directory; relative paths are taken from the context.
    pub path: PathBuf,
    /// Filename pattern; every `[name]` becomes the chunk name.
    pub filename: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dist"),
            filename: "[name].js".to_string(),
        }
    }
}

/// Static configuration shared by every run of a compiler.
#[derive(Debug, Clone)]
pub struct BundleConfig {
    /// Base directory for entries, module ids, and relative output paths.
    /// `None` means the working directory at run start.
    pub context: Option<PathBuf>,
    pub entry: Entry,
    pub rules: Vec<Rule>,
    /// Suffixes tried, in order, when a path does not exist verbatim.
    pub extensions: Vec<String>,
    pub output: OutputOptions,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            context: None,
            entry: Entry::default(),
            rules: Vec::new(),
            extensions: vec![".js".to_string()],
            output: OutputOptions::default(),
        }
    }
}

impl BundleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, context: impl Into<PathBuf>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_entry(mut self, request: impl Into<String>) -> Self {
        self.entry = Entry::Single(request.into());
        self
    }

    /// Adds a named entry. Replaces a single entry set earlier.
    pub fn with_named_entry(mut self, name: impl Into<String>, request: impl Into<String>) -> Self {
        let mut map = match self.entry {
            Entry::Named(map) => map,
            Entry::Single(_) => IndexMap::new(),
        };
        map.insert(name.into(), request.into());
        self.entry = Entry::Named(map);
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output.path = path.into();
        self
    }

    pub fn with_filename(mut self, pattern: impl Into<String>) -> Self {
        self.output.filename = pattern.into();
        self
    }

    /// The context for a run starting now.
    pub fn resolve_context(&self) -> Result<PathBuf> {
        let cwd = || {
            std::env::current_dir()
                .map_err(|e| BundleError::Config(format!("cannot determine working directory: {}", e)))
        };
        match &self.context {
            Some(path) if path.is_absolute() => Ok(path.clone()),
            Some(path) => Ok(cwd()?.join(path)),
            None => cwd(),
        }
    }

    /// The output directory for `context`.
    pub fn output_dir(&self, context: &Path) -> PathBuf {
        context.join(&self.output.path)
    }
}

// =============================================================================
// minipack.json
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    context: Option<PathBuf>,
    entry: Option<EntryFile>,
    #[serde(default)]
    output: OutputFile,
    #[serde(default)]
    resolve: ResolveFile,
    #[serde(default)]
    module: ModuleFile,
    #[serde(default)]
    plugins: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntryFile {
    Single(String),
    Named(IndexMap<String, String>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputFile {
    path: Option<PathBuf>,
    filename: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResolveFile {
    extensions: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleFile {
    #[serde(default)]
    rules: Vec<RuleFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    test: String,
    exclude: Option<String>,
    #[serde(rename = "use")]
    loaders: OneOrMany,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(name) => vec![name],
            OneOrMany::Many(names) => names,
        }
    }
}

/// A parsed configuration file.
pub struct LoadedConfig {
    pub config: BundleConfig,
    pub plugins: Vec<Box<dyn Plugin>>,
}

impl std::fmt::Debug for LoadedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedConfig")
            .field("config", &self.config)
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Reads a configuration file. Relative paths in it are taken from the
/// file's directory, which is also the default context.
pub fn load_config(path: &Path, registry: &LoaderRegistry) -> Result<LoadedConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| BundleError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let base = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    parse_config(&text, &base, registry)
        .map_err(|e| BundleError::Config(format!("{}: {}", path.display(), strip_prefix(&e))))
}

fn strip_prefix(err: &BundleError) -> String {
    match err {
        BundleError::Config(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Parses configuration JSON with `base` as the directory it came from.
pub fn parse_config(text: &str, base: &Path, registry: &LoaderRegistry) -> Result<LoadedConfig> {
    let file: ConfigFile = serde_json::from_str(text).map_err(|e| BundleError::Config(e.to_string()))?;

    let mut config = BundleConfig::default();
    config.context = Some(match file.context {
        Some(context) => base.join(context),
        None => base.to_path_buf(),
    });

    match file.entry {
        Some(EntryFile::Single(request)) => config.entry = Entry::Single(request),
        Some(EntryFile::Named(map)) if map.is_empty() => {
            return Err(BundleError::Config("entry map is empty".to_string()));
        }
        Some(EntryFile::Named(map)) => config.entry = Entry::Named(map),
        None => {}
    }

    if let Some(path) = file.output.path {
        config.output.path = path;
    }
    if let Some(filename) = file.output.filename {
        config.output.filename = filename;
    }
    if let Some(extensions) = file.resolve.extensions {
        config.extensions = extensions;
    }

    for rule in file.module.rules {
        let loaders = rule
            .loaders
            .into_vec()
            .iter()
            .map(|name| registry.get(name))
            .collect::<Result<Vec<_>>>()?;
        let mut built = Rule::new(&rule.test, loaders)?;
        if let Some(exclude) = rule.exclude {
            built = built.exclude(&exclude)?;
        }
        config.rules.push(built);
    }

    let plugins = file
        .plugins
        .iter()
        .map(|name| builtin_plugin(name))
        .collect::<Result<Vec<_>>>()?;

    Ok(LoadedConfig { config, plugins })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<LoadedConfig> {
        parse_config(text, Path::new("/proj"), &LoaderRegistry::with_builtins())
    }

    #[test]
    fn test_defaults() {
        let loaded = parse("{}").unwrap();
        let config = loaded.config;
        assert_eq!(config.context, Some(PathBuf::from("/proj")));
        assert_eq!(config.entry.pairs(), vec![("main", "./src/index.js")]);
        assert_eq!(config.extensions, vec![".js"]);
        assert_eq!(config.output, OutputOptions::default());
        assert!(config.rules.is_empty());
        assert!(loaded.plugins.is_empty());
    }

    #[test]
    fn test_full_file() {
        let loaded = parse(
            r#"{
                "context": "app",
                "entry": { "main": "./src/index.js", "admin": "./src/admin.js" },
                "output": { "path": "build", "filename": "[name].bundle.js" },
                "resolve": { "extensions": [".js", ".json"] },
                "module": { "rules": [
                    { "test": "\\.txt$", "exclude": "node_modules", "use": "raw" },
                    { "test": "\\.json$", "use": ["trim", "json"] }
                ] },
                "plugins": ["run-logger", "done-logger"]
            }"#,
        )
        .unwrap();
        let config = loaded.config;

        assert_eq!(config.context, Some(PathBuf::from("/proj/app")));
        assert_eq!(config.entry.names(), vec!["main", "admin"]);
        assert_eq!(config.output.path, PathBuf::from("build"));
        assert_eq!(config.output.filename, "[name].bundle.js");
        assert_eq!(config.extensions, vec![".js", ".json"]);
        assert_eq!(config.rules.len(), 2);
        assert!(config.rules[0].matches("/proj/app/a.txt"));
        assert!(!config.rules[0].matches("/proj/app/node_modules/a.txt"));
        let names: Vec<&str> = config.rules[1].loaders.iter().map(|l| l.name()).collect();
        assert_eq!(names, vec!["trim", "json"]);
        let plugins: Vec<&str> = loaded.plugins.iter().map(|p| p.name()).collect();
        assert_eq!(plugins, vec!["run-logger", "done-logger"]);
    }

    #[test]
    fn test_unknown_names_are_errors() {
        let err = parse(r#"{ "module": { "rules": [ { "test": "x", "use": "babel" } ] } }"#).err().unwrap();
        assert!(err.to_string().contains("unknown loader 'babel'"));

        let err = parse(r#"{ "plugins": ["html"] }"#).err().unwrap();
        assert!(err.to_string().contains("unknown plugin 'html'"));

        let err = parse(r#"{ "entyr": "./a.js" }"#).err().unwrap();
        assert!(matches!(err, BundleError::Config(_)));
    }

    #[test]
    fn test_builder() {
        let config = BundleConfig::new()
            .with_context("/p")
            .with_named_entry("a", "./a.js")
            .with_named_entry("b", "./b.js")
            .with_extensions([".mjs", ".js"])
            .with_output_path("out")
            .with_filename("[name].js");
        assert_eq!(config.entry.pairs(), vec![("a", "./a.js"), ("b", "./b.js")]);
        assert_eq!(config.resolve_context().unwrap(), PathBuf::from("/p"));
        assert_eq!(config.output_dir(Path::new("/p")), PathBuf::from("/p/out"));
        assert_eq!(config.extensions, vec![".mjs", ".js"]);
    }
}
