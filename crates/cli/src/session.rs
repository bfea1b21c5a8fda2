//! A single remotesync run
//!
//! Builds the engine from flags and config, performs the initial sync and
//! then feeds watcher events to the scheduler until Ctrl-C.

use anyhow::Result;
use owo_colors::OwoColorize;
use remotesync_config::{Config, HookName, IgnoreMatcher, IgnoreRules, SyncSettings};
use remotesync_core::CommandRunner;
use remotesync_engine::hooks::BaseContext;
use remotesync_engine::{
    ConsoleReporter, FileWatcher, HookPipeline, InitialSync, OperationProcessor, Scheduler,
    ScriptedHooks, ShellRunner, StatusReporter, Transfer, WatchEvent, WatcherConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::Cli;
use crate::error::StartupError;

/// Run until interrupted
///
/// # Errors
///
/// Returns a [`StartupError`] if anything fails before watching begins
pub async fn run(cli: &Cli) -> Result<()> {
    let root = resolve_root(cli.root.as_deref())?;
    let config = load_config(cli.config.as_deref(), &root)?;

    let settings = Arc::new(
        SyncSettings::resolve(&config, &cli.overrides(), root.clone())
            .map_err(StartupError::Settings)?,
    );
    tracing::debug!(
        "Target {} resolved to {}",
        settings.target_name,
        settings.target
    );

    let rules = IgnoreRules::collect(&config, &root, settings.use_gitignore)
        .map_err(StartupError::Ignore)?;
    let matcher = Arc::new(IgnoreMatcher::new(&root, &rules).map_err(StartupError::Ignore)?);

    let runner: Arc<dyn CommandRunner> =
        Arc::new(ShellRunner::new(&root, settings.target.clone()).verbose(settings.verbose));

    let hooks_dir = cli
        .hooks_dir
        .clone()
        .unwrap_or_else(|| remotesync_config::dirs::hooks_dir(&root));
    let scripted = ScriptedHooks::load_dir(&hooks_dir).map_err(|source| StartupError::Hooks {
        path: hooks_dir.clone(),
        source,
    })?;
    if !scripted.is_empty() {
        let names: Vec<&str> = scripted.names().map(HookName::as_str).collect();
        tracing::info!("Loaded hook scripts: {}", names.join(", "));
    }

    let hooks = Arc::new(
        HookPipeline::builder(Arc::new(config), settings.clone(), runner.clone())
            .scripted(scripted)
            .build(),
    );
    let reporter: Arc<dyn StatusReporter> = Arc::new(ConsoleReporter::new(settings.mute_syncs));
    let transfer = Arc::new(Transfer::new(
        runner,
        settings.clone(),
        matcher.rsync_excludes(),
    ));

    let interrupted = interrupt();
    tokio::pin!(interrupted);

    let initial_sync = InitialSync::new(hooks.clone(), transfer.clone(), reporter.clone());
    match unless_interrupted(initial_sync.run(), &mut interrupted).await {
        Some(result) => {
            result.map_err(StartupError::InitialSync)?;
        }
        None => {
            tracing::info!("Stopping remotesync...");
            before_exit(&hooks).await;
            return Ok(());
        }
    }

    let processor = Arc::new(OperationProcessor::new(
        hooks.clone(),
        transfer,
        settings.clone(),
        reporter,
    ));
    let (scheduler, _scheduler_task) =
        Scheduler::spawn(settings.max_parallel, matcher.clone(), processor);

    let mut watcher = FileWatcher::start(&root, matcher, WatcherConfig::default())
        .map_err(|source| StartupError::Watch {
            path: root.clone(),
            source,
        })?;

    println!(
        "{} Watching {} {} {}",
        "●".bright_green(),
        root.display().bold(),
        "→".dimmed(),
        settings.target.bold()
    );

    loop {
        tokio::select! {
            event = watcher.recv() => match event {
                Some(event) => dispatch(&scheduler, event),
                None => {
                    tracing::warn!("File watcher stopped");
                    break;
                }
            },
            () = &mut interrupted => {
                tracing::info!("Stopping remotesync...");
                break;
            }
        }
    }

    // Queued operations are abandoned
    before_exit(&hooks).await;

    Ok(())
}

/// Resolves on the first Ctrl-C; never resolves if the handler cannot be
/// installed
async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Run `work` to completion unless `interrupted` resolves first
async fn unless_interrupted<T>(
    work: impl Future<Output = T>,
    interrupted: impl Future<Output = ()>,
) -> Option<T> {
    tokio::select! {
        output = work => Some(output),
        () = interrupted => None,
    }
}

async fn before_exit(hooks: &HookPipeline) {
    if let Err(e) = hooks.invoke(HookName::BeforeExit, BaseContext::new()).await {
        tracing::error!("{e}");
    }
}

/// Hand an event to the scheduler without waiting for it
fn dispatch(scheduler: &Scheduler, event: WatchEvent) {
    tracing::debug!("File {}: {}", event.event.past(), event.path);
    let handle = scheduler.submit(event.path, event.event);
    tokio::spawn(async move {
        // Failures are already reported by the processor
        if let Err(e) = handle.await {
            tracing::debug!("Operation rejected: {e}");
        }
    });
}

/// Canonical sync root, the current directory by default
///
/// # Errors
///
/// Returns [`StartupError::Root`] if the path does not exist or is not a
/// directory
pub fn resolve_root(root: Option<&Path>) -> Result<PathBuf, StartupError> {
    let requested = root.map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let root = std::fs::canonicalize(&requested).map_err(|source| StartupError::Root {
        path: requested.clone(),
        source,
    })?;

    if !root.is_dir() {
        return Err(StartupError::Root {
            path: requested,
            source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        });
    }

    Ok(root)
}

/// Explicit config file, or the nearest discovered one
///
/// # Errors
///
/// Returns [`StartupError::Config`] if a config file exists but cannot be
/// read or parsed
pub fn load_config(explicit: Option<&Path>, root: &Path) -> Result<Config, StartupError> {
    match explicit {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            Config::load(path).map_err(StartupError::Config)
        }
        None => {
            let (config, _) = Config::load_discovered(root).map_err(StartupError::Config)?;
            Ok(config)
        }
    }
}
