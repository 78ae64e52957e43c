//! Module arena and build bookkeeping for one compilation

use std::collections::{HashMap, HashSet};

use crate::module::{Module, ModuleId};

/// Build state of a registered module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// Registered; its dependencies are still being built.
    InProgress,
    Done,
}

/// Modules of one compilation, indexed by arena position and by id.
///
/// A module is registered before its dependencies are visited, so a cycle
/// finds it already present instead of recursing forever.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    status: Vec<BuildStatus>,
    index: HashMap<ModuleId, usize>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `module` as in progress and returns its index.
    pub fn begin(&mut self, module: Module) -> usize {
        let idx = self.modules.len();
        self.index.insert(module.id.clone(), idx);
        self.modules.push(module);
        self.status.push(BuildStatus::InProgress);
        idx
    }

    pub fn finish(&mut self, idx: usize) {
        self.status[idx] = BuildStatus::Done;
    }

    pub fn index_of(&self, id: &ModuleId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn status(&self, id: &ModuleId) -> Option<BuildStatus> {
        self.index_of(id).map(|idx| self.status[idx])
    }

    pub fn get(&self, id: &ModuleId) -> Option<&Module> {
        self.index_of(id).map(|idx| &self.modules[idx])
    }

    pub fn module(&self, idx: usize) -> &Module {
        &self.modules[idx]
    }

    pub fn module_mut(&mut self, idx: usize) -> &mut Module {
        &mut self.modules[idx]
    }

    /// All modules in registration order.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Records that chunk `name` reaches the module at `idx`, and through it
    /// every module it already depends on.
    ///
    /// A module that already carries the name is not descended into: either
    /// its dependencies carry it too, or it is still being built for that
    /// chunk and they will receive it then.
    pub fn add_name(&mut self, idx: usize, name: &str) {
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            let module = &mut self.modules[current];
            if !module.names.insert(name.to_string()) {
                continue;
            }
            for edge in module.dependencies.iter().rev() {
                if let Some(&dep) = self.index.get(&edge.id) {
                    stack.push(dep);
                }
            }
        }
    }

    /// Ids reachable from `idx`: the module itself first, then depth-first
    /// in dependency order, each id once.
    pub fn reachable_from(&self, idx: usize) -> Vec<ModuleId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![idx];

        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let module = &self.modules[current];
            order.push(module.id.clone());
            for edge in module.dependencies.iter().rev() {
                if let Some(&dep) = self.index.get(&edge.id) {
                    if !seen.contains(&dep) {
                        stack.push(dep);
                    }
                }
            }
        }
        order
    }
}
