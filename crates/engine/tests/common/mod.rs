//! Shared fixtures for engine integration tests

#![allow(clippy::unwrap_used, clippy::panic, dead_code)]

use async_trait::async_trait;
use remotesync_config::{Config, HookName, HookSpec, RemoteTarget, SyncSettings};
use remotesync_core::{CommandOutput, CommandRunner, Error, ExecContext, PathMatcher, Result};
use remotesync_engine::{
    HookPipeline, OperationProcessor, Scheduler, ScriptedHooks, Status, StatusReporter,
    SyncAction, Transfer,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Canned reply for commands containing a marker
#[derive(Debug, Clone)]
pub enum Reply {
    Ok { stdout: String, stderr: String },
    Fail { stderr: String },
    Spawn,
}

/// Command runner that records every call and answers from rules
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<(String, ExecContext)>>,
    rules: Mutex<Vec<(String, Reply)>>,
    delay: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingRunner {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Answer commands containing `marker` with `reply`; first match wins
    pub fn on(&self, marker: &str, reply: Reply) {
        self.rules.lock().unwrap().push((marker.to_string(), reply));
    }

    pub fn calls(&self) -> Vec<(String, ExecContext)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|(cmd, _)| cmd).collect()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn execute(&self, command: &str, context: ExecContext) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), context));

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let reply = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|(marker, _)| command.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            None => Ok(CommandOutput::default()),
            Some(Reply::Ok { stdout, stderr }) => Ok(CommandOutput { stdout, stderr }),
            Some(Reply::Fail { stderr }) => Err(Error::CommandFailed {
                command: command.to_string(),
                context,
                code: Some(1),
                stdout: String::new(),
                stderr,
            }),
            Some(Reply::Spawn) => Err(Error::CommandSpawn {
                command: command.to_string(),
                context,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            }),
        }
    }
}

/// Status reporter that keeps every line
#[derive(Default)]
pub struct RecordingReporter {
    finished: Mutex<Vec<(String, SyncAction, Status)>>,
}

impl RecordingReporter {
    pub fn finished(&self) -> Vec<(String, SyncAction, Status)> {
        self.finished.lock().unwrap().clone()
    }
}

impl StatusReporter for RecordingReporter {
    fn started(&self, _path: &str, _action: SyncAction) {}

    fn finished(&self, path: &str, action: SyncAction, status: &Status) {
        self.finished
            .lock()
            .unwrap()
            .push((path.to_string(), action, status.clone()));
    }
}

/// Excludes paths under `secret/`
pub struct ExcludeSecret;

impl PathMatcher for ExcludeSecret {
    fn is_excluded(&self, path: &Path) -> bool {
        path.starts_with("secret")
    }
}

/// A sync root plus the engine wired to recording doubles
pub struct Harness {
    pub root: TempDir,
    pub config: Config,
    pub settings: SyncSettings,
    pub scripted: ScriptedHooks,
    pub runner: Arc<RecordingRunner>,
    pub reporter: Arc<RecordingReporter>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_runner(RecordingRunner::default())
    }

    pub fn with_runner(runner: RecordingRunner) -> Self {
        let root = TempDir::new().unwrap();
        let settings = SyncSettings::for_target(
            root.path().to_path_buf(),
            RemoteTarget::parse("dev@box:/srv/app", 22).unwrap(),
        );
        Self {
            root,
            config: Config::default(),
            settings,
            scripted: ScriptedHooks::new(),
            runner: Arc::new(runner),
            reporter: Arc::new(RecordingReporter::default()),
        }
    }

    pub fn hook(mut self, name: HookName, command: &str) -> Self {
        self.config
            .hooks
            .set(name, Some(HookSpec::Command(command.to_string())));
        self
    }

    pub fn write(&self, key: &str) {
        let path = self.root.path().join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, key).unwrap();
    }

    pub fn hooks(&self) -> Arc<HookPipeline> {
        Arc::new(
            HookPipeline::builder(
                Arc::new(self.config.clone()),
                Arc::new(self.settings.clone()),
                self.runner.clone(),
            )
            .scripted(self.scripted.clone())
            .build(),
        )
    }

    pub fn transfer(&self) -> Arc<Transfer> {
        Arc::new(Transfer::new(
            self.runner.clone(),
            Arc::new(self.settings.clone()),
            Vec::new(),
        ))
    }

    pub fn processor(&self) -> OperationProcessor {
        OperationProcessor::new(
            self.hooks(),
            self.transfer(),
            Arc::new(self.settings.clone()),
            self.reporter.clone(),
        )
    }

    pub fn scheduler(&self, max_parallel: usize) -> (Scheduler, JoinHandle<()>) {
        Scheduler::spawn(max_parallel, Arc::new(ExcludeSecret), Arc::new(self.processor()))
    }
}
