//! The long-lived compiler: plugins, hooks, and the run lifecycle.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::Instant;

use crate::compilation::Compilation;
use crate::config::BundleConfig;
use crate::error::{BundleError, Result};
use crate::fs::{FileStore, NativeFileStore};
use crate::hooks::{CompilerHooks, RunContext};
use crate::plugin::Plugin;
use crate::stats::Stats;

/// A built compilation whose assets could not be written.
struct PendingEmit {
    compilation: Compilation,
    started: Instant,
}

/// Runs compilations for one configuration.
///
/// Plugins are applied once, in order, when the compiler is created. Each
/// [`run`](Compiler::run) builds a fresh [`Compilation`]; only one run may
/// be in flight at a time.
pub struct Compiler {
    config: Arc<BundleConfig>,
    hooks: CompilerHooks,
    store: Arc<dyn FileStore>,
    running: Mutex<()>,
    pending: Mutex<Option<PendingEmit>>,
}

impl Compiler {
    /// A compiler that reads and writes the local file system.
    pub fn new(config: BundleConfig, plugins: Vec<Box<dyn Plugin>>) -> Self {
        Self::with_store(config, Arc::new(NativeFileStore), plugins)
    }

    pub fn with_store(config: BundleConfig, store: Arc<dyn FileStore>, plugins: Vec<Box<dyn Plugin>>) -> Self {
        let mut hooks = CompilerHooks::new();
        for plugin in &plugins {
            tracing::debug!("Applying plugin '{}'", plugin.name());
            plugin.apply(&mut hooks);
        }
        Self {
            config: Arc::new(config),
            hooks,
            store,
            running: Mutex::new(()),
            pending: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &BundleConfig {
        &self.config
    }

    pub fn hooks(&self) -> &CompilerHooks {
        &self.hooks
    }

    /// Builds a compilation without firing hooks or writing anything.
    pub fn compile(&self) -> Result<Compilation> {
        let _guard = self.acquire()?;
        let context = self.config.resolve_context()?;
        let mut compilation = Compilation::new(Arc::clone(&self.config), Arc::clone(&self.store), context);
        compilation.build()?;
        Ok(compilation)
    }

    /// Builds and writes every chunk.
    ///
    /// `callback` sees the outcome before `done` taps run. `done` fires only
    /// once every asset has been written. When writing fails the built
    /// compilation is kept for [`retry_emit`](Compiler::retry_emit).
    pub fn run<F>(&self, callback: F) -> Result<Stats>
    where
        F: FnOnce(std::result::Result<&Stats, &BundleError>),
    {
        let _guard = self.acquire()?;
        self.clear_pending();

        match self.build_and_emit() {
            Ok(stats) => {
                callback(Ok(&stats));
                self.hooks.done.call(&stats)?;
                Ok(stats)
            }
            Err(err) => {
                callback(Err(&err));
                Err(err)
            }
        }
    }

    /// Writes the assets of the last run again after a failed write, then
    /// fires `done`.
    pub fn retry_emit(&self) -> Result<Stats> {
        let _guard = self.acquire()?;
        let pending = self.lock_pending().take().ok_or(BundleError::NothingToEmit)?;

        match self.emit(&pending.compilation, pending.started) {
            Ok(stats) => {
                self.hooks.done.call(&stats)?;
                Ok(stats)
            }
            Err(err) => {
                *self.lock_pending() = Some(pending);
                Err(err)
            }
        }
    }

    /// Whether a failed write is waiting for [`retry_emit`](Compiler::retry_emit).
    pub fn has_pending_emit(&self) -> bool {
        self.lock_pending().is_some()
    }

    fn build_and_emit(&self) -> Result<Stats> {
        let started = Instant::now();
        let context = self.config.resolve_context()?;

        self.hooks.run.call(&RunContext {
            context: context.clone(),
            entries: self.config.entry.names(),
        })?;

        let mut compilation = Compilation::new(Arc::clone(&self.config), Arc::clone(&self.store), context);
        compilation.build()?;

        match self.emit(&compilation, started) {
            Ok(stats) => Ok(stats),
            Err(err) => {
                if matches!(err, BundleError::OutputWrite { .. }) {
                    *self.lock_pending() = Some(PendingEmit { compilation, started });
                }
                Err(err)
            }
        }
    }

    fn emit(&self, compilation: &Compilation, started: Instant) -> Result<Stats> {
        let output_dir = self.config.output_dir(compilation.context());
        for (filename, text) in compilation.assets() {
            let path = output_dir.join(filename);
            if let Err(source) = self.store.write_text(&path, text) {
                tracing::warn!("Failed to write {}: {}", path.display(), source);
                return Err(BundleError::OutputWrite { path, source });
            }
            tracing::debug!("Wrote {} ({} bytes)", path.display(), text.len());
        }
        Ok(Stats::new(compilation, output_dir, started.elapsed()))
    }

    fn acquire(&self) -> Result<MutexGuard<'_, ()>> {
        match self.running.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => Err(BundleError::AlreadyRunning),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<PendingEmit>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn clear_pending(&self) {
        self.lock_pending().take();
    }

    /// Output directory for a run starting now.
    pub fn output_dir(&self) -> Result<PathBuf> {
        Ok(self.config.output_dir(&self.config.resolve_context()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileStore;

    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Plugin for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn apply(&self, hooks: &mut CompilerHooks) {
            self.log.lock().unwrap().push("apply".to_string());
            let log = Arc::clone(&self.log);
            hooks.run.tap("recorder", move |ctx| {
                log.lock().unwrap().push(format!("run:{}", ctx.entries.join(",")));
                Ok(())
            });
            let log = Arc::clone(&self.log);
            hooks.done.tap("recorder", move |stats| {
                log.lock().unwrap().push(format!("done:{}", stats.assets.len()));
                Ok(())
            });
        }
    }

    fn setup() -> (MemoryFileStore, Arc<Mutex<Vec<String>>>, Compiler) {
        let store = MemoryFileStore::with_files([
            ("/p/src/index.js", "console.log(require('./a'));"),
            ("/p/src/a.js", "module.exports = 42;"),
        ]);
        let log = Arc::new(Mutex::new(Vec::new()));
        let compiler = Compiler::with_store(
            BundleConfig::new().with_context("/p"),
            Arc::new(store.clone()),
            vec![Box::new(Recorder { log: Arc::clone(&log) })],
        );
        (store, log, compiler)
    }

    fn entries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_plugins_apply_at_construction() {
        let (_, log, _compiler) = setup();
        assert_eq!(entries(&log), vec!["apply"]);
    }

    #[test]
    fn test_run_lifecycle() {
        let (store, log, compiler) = setup();
        let seen = Arc::clone(&log);
        let stats = compiler
            .run(|result| {
                let stats = result.unwrap();
                seen.lock().unwrap().push(format!("callback:{}", stats.modules.len()));
            })
            .unwrap();

        assert_eq!(entries(&log), vec!["apply", "run:main", "callback:2", "done:1"]);
        assert_eq!(stats.output_path, PathBuf::from("/p/dist"));
        assert!(store.get("/p/dist/main.js").unwrap().contains("module.exports = 42;"));
    }

    #[test]
    fn test_each_run_is_fresh() {
        let (store, _, compiler) = setup();
        compiler.run(|_| {}).unwrap();
        store.insert("/p/src/a.js", "module.exports = 7;");
        compiler.run(|_| {}).unwrap();

        let out = store.get("/p/dist/main.js").unwrap();
        assert!(out.contains("module.exports = 7;"));
        assert!(!out.contains("42"));
        assert_eq!(store.read_count("/p/src/a.js"), 2);
    }

    #[test]
    fn test_build_failure_writes_nothing() {
        let (store, log, compiler) = setup();
        store.insert("/p/src/index.js", "require('./missing');");
        let mut saw_error = false;
        let err = compiler.run(|result| saw_error = result.is_err()).unwrap_err();

        assert!(saw_error);
        assert!(matches!(err, BundleError::Resolution { .. }));
        assert!(store.get("/p/dist/main.js").is_none());
        assert_eq!(entries(&log), vec!["apply", "run:main"]);
        assert!(!compiler.has_pending_emit());
    }

    #[test]
    fn test_write_failure_then_retry() {
        let (store, log, compiler) = setup();
        store.set_fail_writes(true);
        let err = compiler.run(|_| {}).unwrap_err();
        assert!(matches!(err, BundleError::OutputWrite { .. }));
        assert!(compiler.has_pending_emit());
        assert_eq!(entries(&log), vec!["apply", "run:main"]);

        assert!(matches!(compiler.retry_emit(), Err(BundleError::OutputWrite { .. })));
        assert!(compiler.has_pending_emit());

        store.set_fail_writes(false);
        let stats = compiler.retry_emit().unwrap();
        assert_eq!(stats.assets.len(), 1);
        assert!(store.get("/p/dist/main.js").is_some());
        assert_eq!(entries(&log), vec!["apply", "run:main", "done:1"]);
        assert_eq!(store.read_count("/p/src/a.js"), 1);

        assert!(matches!(compiler.retry_emit(), Err(BundleError::NothingToEmit)));
    }

    #[test]
    fn test_run_is_single_flight() {
        let (_, _, compiler) = setup();
        let mut nested = None;
        compiler
            .run(|_| {
                nested = Some(compiler.run(|_| {}).map(|_| ()));
            })
            .unwrap();
        assert!(matches!(nested, Some(Err(BundleError::AlreadyRunning))));
    }

    #[test]
    fn test_failing_run_tap_aborts() {
        let store = MemoryFileStore::with_files([("/p/src/index.js", "1;")]);
        struct Veto;
        impl Plugin for Veto {
            fn name(&self) -> &str {
                "veto"
            }
            fn apply(&self, hooks: &mut CompilerHooks) {
                hooks.run.tap("veto", |_| Err("not today".into()));
            }
        }
        let compiler = Compiler::with_store(
            BundleConfig::new().with_context("/p"),
            Arc::new(store.clone()),
            vec![Box::new(Veto)],
        );
        let err = compiler.run(|_| {}).unwrap_err();
        assert!(matches!(err, BundleError::Plugin { hook: "run", .. }));
        assert_eq!(store.read_count("/p/src/index.js"), 0);
    }

    #[test]
    fn test_compiler_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Compiler>();
    }
}
