//! Plugins and the built-in logging plugins.

use crate::error::{BundleError, Result};
use crate::hooks::CompilerHooks;

/// Extends a compiler by tapping its hooks.
///
/// `apply` runs once, while the compiler is being constructed.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, hooks: &mut CompilerHooks);
}

/// Logs when a compilation starts.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunLoggerPlugin;

impl Plugin for RunLoggerPlugin {
    fn name(&self) -> &str {
        "run-logger"
    }

    fn apply(&self, hooks: &mut CompilerHooks) {
        hooks.run.tap(self.name(), |ctx| {
            tracing::info!("Compilation started in {} ({} entries)", ctx.context.display(), ctx.entries.len());
            Ok(())
        });
    }
}

/// Logs when a compilation has been written.
#[derive(Debug, Default, Clone, Copy)]
pub struct DoneLoggerPlugin;

impl Plugin for DoneLoggerPlugin {
    fn name(&self) -> &str {
        "done-logger"
    }

    fn apply(&self, hooks: &mut CompilerHooks) {
        hooks.done.tap(self.name(), |stats| {
            tracing::info!(
                "Compilation finished: {} modules, {} assets in {} ms",
                stats.modules.len(),
                stats.assets.len(),
                stats.elapsed_ms
            );
            Ok(())
        });
    }
}

/// Looks up a built-in plugin by its configuration name.
pub fn builtin_plugin(name: &str) -> Result<Box<dyn Plugin>> {
    match name {
        "run-logger" => Ok(Box::new(RunLoggerPlugin)),
        "done-logger" => Ok(Box::new(DoneLoggerPlugin)),
        _ => Err(BundleError::Config(format!(
            "unknown plugin '{}' (known: run-logger, done-logger)",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_plugins_tap_their_hooks() {
        let mut hooks = CompilerHooks::new();
        builtin_plugin("run-logger").unwrap().apply(&mut hooks);
        builtin_plugin("done-logger").unwrap().apply(&mut hooks);
        assert_eq!(hooks.run.tap_names(), vec!["run-logger"]);
        assert_eq!(hooks.done.tap_names(), vec!["done-logger"]);
    }

    #[test]
    fn test_unknown_plugin() {
        assert!(matches!(builtin_plugin("nope"), Err(BundleError::Config(_))));
    }
}
