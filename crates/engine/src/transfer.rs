//! rsync-based transfer actions
//!
//! Builds the rsync and remote `rm` command lines and classifies what the
//! command runner reports back. Transfer-level problems (non-zero rsync exit,
//! warnings on stderr) come back as a [`TransferReport`]; only runner
//! breakage surfaces as an `Err`.

use remotesync_config::{RemoteTarget, SyncSettings};
use remotesync_core::{CommandOutput, CommandRunner, Error, ExecContext, Result};
use std::sync::Arc;

/// Marker rsync and rm print when the source has gone away
const NO_SUCH_FILE: &str = "No such file or directory";

/// rsync command line builder
///
/// # Examples
///
/// ```ignore
/// let cmd = RsyncCommand::new("/work/src/app.rs", "me@host:/srv/src/")
///     .progress(true)
///     .excludes(vec!["*.log".into()])
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct RsyncCommand {
    source: String,
    destination: String,
    port: Option<u16>,
    verbose: bool,
    progress: bool,
    delete: bool,
    excludes: Vec<String>,
}

impl RsyncCommand {
    /// Archive-mode, compressed copy from `source` to `destination`
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            ..Self::default()
        }
    }

    /// Use a non-default ssh port
    #[must_use]
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Pass `-v`
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Pass `--progress`
    #[must_use]
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Remove destination files missing from the source
    #[must_use]
    pub fn delete(mut self, delete: bool) -> Self {
        self.delete = delete;
        self
    }

    /// One `--exclude=` per pattern
    #[must_use]
    pub fn excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    /// Argument vector, program name first
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["rsync".to_string(), "-az".to_string()];
        if self.verbose {
            args.push("-v".to_string());
        }
        if self.progress {
            args.push("--progress".to_string());
        }
        if let Some(port) = self.port {
            args.push("-e".to_string());
            args.push(format!("ssh -p {port}"));
        }
        if self.delete {
            args.push("--delete".to_string());
        }
        for pattern in &self.excludes {
            args.push(format!("--exclude={pattern}"));
        }
        args.push(self.source.clone());
        args.push(self.destination.clone());
        args
    }

    /// Shell-quoted command line
    pub fn build(&self) -> String {
        shell_words::join(self.args())
    }
}

/// How a transfer or remote deletion went, short of runner breakage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferReport {
    /// Completed without complaints
    Done(CommandOutput),
    /// The source file was gone by the time the command ran
    Missing(String),
    /// Completed but wrote warnings to stderr
    Warning(String),
    /// Exited unsuccessfully
    Failed(String),
}

impl TransferReport {
    /// Sort a runner result into a report
    ///
    /// # Errors
    ///
    /// Passes through errors that are not a command's own failure
    pub fn classify(result: Result<CommandOutput>) -> Result<Self> {
        match result {
            Ok(output) if output.stderr.trim().is_empty() => Ok(Self::Done(output)),
            Ok(output) if output.stderr.contains(NO_SUCH_FILE) => {
                Ok(Self::Missing(output.stderr.trim().to_string()))
            }
            Ok(output) => Ok(Self::Warning(output.stderr.trim().to_string())),
            Err(err @ Error::CommandFailed { .. }) => {
                if err.stderr().contains(NO_SUCH_FILE) {
                    Ok(Self::Missing(err.stderr().trim().to_string()))
                } else {
                    Ok(Self::Failed(err.to_string()))
                }
            }
            Err(err) => Err(err),
        }
    }
}

/// Transfer actions for one sync root and target
pub struct Transfer {
    runner: Arc<dyn CommandRunner>,
    settings: Arc<SyncSettings>,
    excludes: Vec<String>,
}

impl Transfer {
    /// Transfers for the settings' root and target; `excludes` go to every rsync
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        settings: Arc<SyncSettings>,
        excludes: Vec<String>,
    ) -> Self {
        Self {
            runner,
            settings,
            excludes,
        }
    }

    fn target(&self) -> &RemoteTarget {
        &self.settings.target
    }

    fn base_command(&self, source: String, destination: String) -> RsyncCommand {
        let port = self
            .target()
            .has_custom_port()
            .then_some(self.target().port);
        RsyncCommand::new(source, destination)
            .port(port)
            .verbose(self.settings.verbose)
            .progress(true)
            .excludes(self.excludes.clone())
    }

    /// rsync command copying one file into its directory on the target
    pub fn file_command(&self, key: &str) -> String {
        let source = self.settings.root.join(key).to_string_lossy().into_owned();
        let parent = key.rsplit_once('/').map_or("", |(dir, _)| dir);
        self.base_command(source, self.target().rsync_dir(parent))
            .build()
    }

    /// rsync command mirroring the whole root
    pub fn tree_command(&self) -> String {
        let source = format!("{}/", self.settings.root.to_string_lossy().trim_end_matches('/'));
        self.base_command(source, self.target().rsync_root())
            .delete(self.settings.delete)
            .build()
    }

    /// Remote command removing one file below the remote root
    pub fn delete_command(key: &str) -> String {
        format!("rm -f -- {}", shell_words::quote(key))
    }

    /// Copy one file to the target
    ///
    /// Only a zero exit is classified; a non-zero exit comes back as the
    /// runner's [`Error::CommandFailed`].
    pub async fn sync_file(&self, key: &str) -> Result<TransferReport> {
        let command = self.file_command(key);
        tracing::debug!("Syncing file: {key}");
        let output = self.runner.execute(&command, ExecContext::Local).await?;
        TransferReport::classify(Ok(output))
    }

    /// Whether a failed transfer failed because its source was gone
    pub fn source_vanished(err: &Error) -> bool {
        matches!(err, Error::CommandFailed { .. }) && err.stderr().contains(NO_SUCH_FILE)
    }

    /// Remove one file from the target
    pub async fn delete_file(&self, key: &str) -> Result<TransferReport> {
        let command = Self::delete_command(key);
        tracing::debug!("Deleting remote file: {key}");
        TransferReport::classify(self.runner.execute(&command, ExecContext::Remote).await)
    }

    /// Mirror the whole root to the target
    ///
    /// Any command failure is returned as an error; there is no partial
    /// success for the initial sync.
    pub async fn sync_tree(&self) -> Result<CommandOutput> {
        let command = self.tree_command();
        tracing::debug!("Executing rsync command: {command}");
        self.runner.execute(&command, ExecContext::Local).await
    }
}
