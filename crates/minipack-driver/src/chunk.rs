use serde::Serialize;

use minipack_codegen::{render_chunk, ChunkSource, RuntimeModule};

use crate::error::{BundleError, Result};
use crate::graph::ModuleGraph;
use crate::module::ModuleId;

/// The modules reachable from one entry, emitted as one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub name: String,
    pub entry: ModuleId,
    /// Entry first, then depth-first in dependency order.
    pub modules: Vec<ModuleId>,
}

impl Chunk {
    /// Renders the runtime bundle for this chunk.
    pub fn render(&self, graph: &ModuleGraph) -> Result<String> {
        let mut modules = Vec::with_capacity(self.modules.len());
        for id in &self.modules {
            let module = graph
                .get(id)
                .ok_or_else(|| BundleError::Config(format!("chunk '{}' refers to unknown module {}", self.name, id)))?;
            modules.push(RuntimeModule {
                id: module.id.as_str(),
                source: &module.source,
            });
        }

        let source = ChunkSource {
            entry: self.entry.as_str(),
            modules,
        };
        render_chunk(&source).map_err(|e| BundleError::Config(e.message))
    }
}
