//! One compilation: module graph building, import rewriting, and asset
//! rendering.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use minipack_ast::CallExpr;

use crate::chunk::Chunk;
use crate::config::BundleConfig;
use crate::error::{BundleError, Result};
use crate::fs::FileStore;
use crate::graph::{BuildStatus, ModuleGraph};
use crate::loader;
use crate::module::{DependencyEdge, Module, ModuleId};
use crate::resolver::PathResolver;

/// The callee that marks an import.
pub const IMPORT_FUNCTION: &str = "require";

/// State of a single build. A new one is created for every run, so nothing
/// leaks from one build into the next.
pub struct Compilation {
    config: Arc<BundleConfig>,
    store: Arc<dyn FileStore>,
    context: PathBuf,
    graph: ModuleGraph,
    chunks: Vec<Chunk>,
    assets: IndexMap<String, String>,
    file_dependencies: IndexSet<PathBuf>,
}

impl Compilation {
    pub fn new(config: Arc<BundleConfig>, store: Arc<dyn FileStore>, context: PathBuf) -> Self {
        Self {
            config,
            store,
            context,
            graph: ModuleGraph::new(),
            chunks: Vec::new(),
            assets: IndexMap::new(),
            file_dependencies: IndexSet::new(),
        }
    }

    /// Builds every entry, then renders one asset per chunk.
    pub fn build(&mut self) -> Result<()> {
        let entries: Vec<(String, String)> = self
            .config
            .entry
            .pairs()
            .into_iter()
            .map(|(name, request)| (name.to_string(), request.to_string()))
            .collect();
        if entries.is_empty() {
            return Err(BundleError::Config("no entries configured".to_string()));
        }

        for (name, request) in &entries {
            let path = {
                let resolver = PathResolver::new(self.store.as_ref(), &self.config.extensions);
                resolver.resolve_entry(request, &self.context)?
            };
            self.file_dependencies.insert(path.clone());

            let idx = self.build_module(name, &path)?;
            self.chunks.push(Chunk {
                name: name.clone(),
                entry: self.graph.module(idx).id.clone(),
                modules: self.graph.reachable_from(idx),
            });
            tracing::debug!("Built entry '{}' from {}", name, path.display());
        }

        self.render_assets()
    }

    /// Builds the module at `path` for chunk `chunk_name` and returns its
    /// arena index. A module seen before is not rebuilt; it only gains the
    /// chunk name.
    pub fn build_module(&mut self, chunk_name: &str, path: &Path) -> Result<usize> {
        let id = ModuleId::from_path(path, &self.context);
        if let Some(idx) = self.graph.index_of(&id) {
            if self.graph.status(&id) == Some(BuildStatus::InProgress) {
                tracing::debug!("Cycle back to {} before it finished building", id);
            }
            self.graph.add_name(idx, chunk_name);
            return Ok(idx);
        }

        let idx = self
            .graph
            .begin(Module::placeholder(id.clone(), path.to_path_buf(), chunk_name));

        let raw = self.store.read_text(path).map_err(|source| BundleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.file_dependencies.insert(path.to_path_buf());
        let text = loader::apply(raw, path, &self.config.rules)?;

        let (source, dependencies) = self.rewrite_imports(path, text)?;
        for edge in &dependencies {
            self.file_dependencies.insert(edge.path.clone());
        }
        tracing::debug!("Built module {} ({} dependencies)", id, dependencies.len());

        let dep_paths: Vec<PathBuf> = dependencies.iter().map(|d| d.path.clone()).collect();
        {
            let module = self.graph.module_mut(idx);
            module.source = source;
            module.dependencies = dependencies;
        }

        for dep_path in &dep_paths {
            self.build_module(chunk_name, dep_path)?;
        }

        self.graph.finish(idx);
        Ok(idx)
    }

    /// Parses `text`, points every `require` at its canonical id, and
    /// prints the result.
    fn rewrite_imports(&self, path: &Path, text: String) -> Result<(String, Vec<DependencyEdge>)> {
        let mut program = match minipack_parser::parse(&text) {
            Ok(program) => program,
            Err(errors) => {
                return Err(BundleError::Parse {
                    path: path.to_path_buf(),
                    text,
                    errors,
                })
            }
        };

        let resolver = PathResolver::new(self.store.as_ref(), &self.config.extensions);
        let mut dependencies = Vec::new();
        program.try_for_each_call_mut(|call| -> Result<()> {
            if call.name() != IMPORT_FUNCTION {
                return Ok(());
            }
            let (specifier, span) = import_specifier(call).map_err(|reason| BundleError::UnsupportedImport {
                path: path.to_path_buf(),
                span: call.span(),
                reason,
                text: text.clone(),
            })?;

            let resolved = resolver.resolve_import(&specifier, path)?;
            let id = ModuleId::from_path(&resolved, &self.context);
            call.rewrite_argument(0, id.as_str());
            dependencies.push(DependencyEdge {
                specifier,
                id,
                path: resolved,
                span,
            });
            Ok(())
        })?;

        Ok((program.print(), dependencies))
    }

    fn render_assets(&mut self) -> Result<()> {
        let filenames = minipack_codegen::assign_filenames(
            &self.config.output.filename,
            self.chunks.iter().map(|c| c.name.as_str()),
        )
        .map_err(|e| BundleError::Config(e.message))?;

        for (chunk, filename) in self.chunks.iter().zip(filenames) {
            let text = chunk.render(&self.graph)?;
            self.assets.insert(filename, text);
        }
        Ok(())
    }

    pub fn context(&self) -> &Path {
        &self.context
    }

    /// Every module in the order it was first registered.
    pub fn modules(&self) -> &[Module] {
        self.graph.modules()
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.graph.modules().iter().find(|m| m.id.as_str() == id)
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Output filename to text, in chunk order.
    pub fn assets(&self) -> &IndexMap<String, String> {
        &self.assets
    }

    /// Every file read or resolved during the build, first occurrence first.
    pub fn file_dependencies(&self) -> &IndexSet<PathBuf> {
        &self.file_dependencies
    }
}

/// The literal specifier of an import call, or why it is not one.
fn import_specifier(call: &CallExpr) -> std::result::Result<(String, minipack_ast::Span), String> {
    if call.arguments.len() != 1 {
        return Err(format!(
            "{}() takes exactly one argument, found {}",
            IMPORT_FUNCTION,
            call.arguments.len()
        ));
    }
    match call.literal_argument(0) {
        Some(token) => Ok((token.value.clone(), token.span)),
        None => Err(format!(
            "the argument to {}() must be a string literal",
            IMPORT_FUNCTION
        )),
    }
}
