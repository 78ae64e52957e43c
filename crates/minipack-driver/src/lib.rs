//! minipack bundler driver.
//!
//! A [`Compiler`] owns a [`BundleConfig`], the lifecycle hooks its plugins
//! tapped, and a [`FileStore`]. Every [`Compiler::run`] builds a fresh
//! [`Compilation`]: entries are resolved, each reachable module is read,
//! passed through the matching loaders, parsed, and has its `require`
//! specifiers rewritten to canonical module ids. One chunk per entry is then
//! rendered into a self-contained runtime and written to the output
//! directory.

pub mod chunk;
pub mod compilation;
pub mod compiler;
pub mod config;
pub mod error;
pub mod fs;
pub mod graph;
pub mod hooks;
pub mod loader;
pub mod module;
pub mod plugin;
pub mod resolver;
pub mod stats;

pub use chunk::Chunk;
pub use compilation::Compilation;
pub use compiler::Compiler;
pub use config::{load_config, parse_config, BundleConfig, Entry, LoadedConfig, OutputOptions};
pub use error::{BundleError, Result};
pub use fs::{FileStore, MemoryFileStore, NativeFileStore};
pub use graph::{BuildStatus, ModuleGraph};
pub use hooks::{CompilerHooks, RunContext, SyncHook, TapError};
pub use loader::{loader_fn, JsonLoader, Loader, LoaderError, LoaderRegistry, RawLoader, Rule, TrimLoader};
pub use module::{DependencyEdge, Module, ModuleId};
pub use plugin::{builtin_plugin, DoneLoggerPlugin, Plugin, RunLoggerPlugin};
pub use resolver::PathResolver;
pub use stats::Stats;
