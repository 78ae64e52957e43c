//! Synchronous lifecycle hooks.

use std::fmt;
use std::path::PathBuf;

use crate::error::{BundleError, Result};
use crate::stats::Stats;

/// Error a tap may return to abort the run.
pub type TapError = Box<dyn std::error::Error + Send + Sync>;

type TapFn<T> = Box<dyn Fn(&T) -> std::result::Result<(), TapError> + Send + Sync>;

struct Tap<T> {
    name: String,
    callback: TapFn<T>,
}

/// An ordered list of named callbacks for one lifecycle event.
///
/// Taps run in registration order; the first failure stops the rest.
pub struct SyncHook<T> {
    name: &'static str,
    taps: Vec<Tap<T>>,
}

impl<T> SyncHook<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, taps: Vec::new() }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tap<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&T) -> std::result::Result<(), TapError> + Send + Sync + 'static,
    {
        self.taps.push(Tap {
            name: name.into(),
            callback: Box::new(callback),
        });
    }

    pub fn call(&self, arg: &T) -> Result<()> {
        for tap in &self.taps {
            tracing::trace!("Calling {} tap '{}'", self.name, tap.name);
            (tap.callback)(arg).map_err(|source| BundleError::Plugin {
                hook: self.name,
                tap: tap.name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn tap_names(&self) -> Vec<&str> {
        self.taps.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}

impl<T> fmt::Debug for SyncHook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncHook")
            .field("name", &self.name)
            .field("taps", &self.tap_names())
            .finish()
    }
}

/// Passed to `run` taps before a compilation starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub context: PathBuf,
    pub entries: Vec<String>,
}

/// The hooks a compiler exposes to plugins.
#[derive(Debug)]
pub struct CompilerHooks {
    /// Before the compilation is created.
    pub run: SyncHook<RunContext>,
    /// After every asset has been written.
    pub done: SyncHook<Stats>,
}

impl CompilerHooks {
    pub fn new() -> Self {
        Self {
            run: SyncHook::new("run"),
            done: SyncHook::new("done"),
        }
    }
}

impl Default for CompilerHooks {
    fn default() -> Self {
        Self::new()
    }
}
