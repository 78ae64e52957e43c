use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::compilation::Compilation;

/// Summary of a finished run, handed to the run callback and `done` taps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub context: PathBuf,
    pub output_path: PathBuf,
    pub entries: Vec<String>,
    pub modules: Vec<ModuleStats>,
    pub chunks: Vec<ChunkStats>,
    pub assets: Vec<AssetStats>,
    pub file_dependencies: Vec<PathBuf>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleStats {
    pub id: String,
    pub path: PathBuf,
    pub names: Vec<String>,
    pub dependencies: Vec<String>,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkStats {
    pub name: String,
    pub entry: String,
    pub modules: Vec<String>,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetStats {
    pub filename: String,
    pub size: usize,
}

impl Stats {
    pub fn new(compilation: &Compilation, output_path: PathBuf, elapsed: Duration) -> Self {
        let modules = compilation
            .modules()
            .iter()
            .map(|m| ModuleStats {
                id: m.id.to_string(),
                path: m.path.clone(),
                names: m.names.iter().cloned().collect(),
                dependencies: m.dependencies.iter().map(|d| d.id.to_string()).collect(),
                size: m.source.len(),
            })
            .collect();

        let chunks = compilation
            .chunks()
            .iter()
            .zip(compilation.assets().keys())
            .map(|(chunk, filename)| ChunkStats {
                name: chunk.name.clone(),
                entry: chunk.entry.to_string(),
                modules: chunk.modules.iter().map(|id| id.to_string()).collect(),
                filename: filename.clone(),
            })
            .collect();

        let assets = compilation
            .assets()
            .iter()
            .map(|(filename, text)| AssetStats {
                filename: filename.clone(),
                size: text.len(),
            })
            .collect();

        Self {
            context: compilation.context().to_path_buf(),
            output_path,
            entries: compilation.chunks().iter().map(|c| c.name.clone()).collect(),
            modules,
            chunks,
            assets,
            file_dependencies: compilation.file_dependencies().iter().cloned().collect(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
