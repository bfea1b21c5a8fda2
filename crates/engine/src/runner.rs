//! Shell command runner
//!
//! Runs command strings through `sh -c` in the sync root, or through `ssh`
//! on the target after changing into the remote root.

use async_trait::async_trait;
use remotesync_config::RemoteTarget;
use remotesync_core::{CommandOutput, CommandRunner, Error, ExecContext, Result};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// [`CommandRunner`] backed by the local shell and `ssh`
#[derive(Debug, Clone)]
pub struct ShellRunner {
    root: PathBuf,
    target: RemoteTarget,
    verbose: bool,
}

impl ShellRunner {
    /// Create a runner for a sync root and its target
    pub fn new(root: impl Into<PathBuf>, target: RemoteTarget) -> Self {
        Self {
            root: root.into(),
            target,
            verbose: false,
        }
    }

    /// Echo command output at info level
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Argument vector for running `command` on the target
    ///
    /// `ssh [-p PORT] DEST "cd PATH && COMMAND"`
    pub fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(4);
        if self.target.has_custom_port() {
            args.push("-p".to_string());
            args.push(self.target.port.to_string());
        }
        args.push(self.target.destination.clone());
        args.push(format!(
            "cd {} && {}",
            shell_words::quote(&self.target.path),
            command
        ));
        args
    }

    fn build(&self, command: &str, context: ExecContext) -> Command {
        let mut cmd = match context {
            ExecContext::Local => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(command);
                cmd
            }
            ExecContext::Remote => {
                let mut cmd = Command::new("ssh");
                cmd.args(self.ssh_args(command));
                cmd
            }
        };
        cmd.current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    #[tracing::instrument(skip(self), fields(context = %context))]
    async fn execute(&self, command: &str, context: ExecContext) -> Result<CommandOutput> {
        tracing::debug!("Executing {context} command: {command}");

        let output = self
            .build(command, context)
            .output()
            .await
            .map_err(|source| Error::CommandSpawn {
                command: command.to_string(),
                context,
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !stdout.trim().is_empty() {
            if self.verbose {
                tracing::info!("{}", stdout.trim_end());
            } else {
                tracing::debug!("{}", stdout.trim_end());
            }
        }
        if !stderr.trim().is_empty() {
            tracing::debug!(stderr = %stderr.trim_end(), "Command wrote to stderr");
        }

        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                context,
                code: output.status.code(),
                stdout,
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn runner(root: &Path, port: u16) -> ShellRunner {
        ShellRunner::new(root, RemoteTarget::parse("me@host:/srv/my app", port).unwrap())
    }

    #[test]
    fn test_ssh_args_default_port() {
        let args = runner(Path::new("/w"), 22).ssh_args("ls -la");
        assert_eq!(args, vec!["me@host", "cd '/srv/my app' && ls -la"]);
    }

    #[test]
    fn test_ssh_args_custom_port() {
        let args = runner(Path::new("/w"), 2222).ssh_args("true");
        assert_eq!(args[..3], ["-p", "2222", "me@host"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_command_runs_in_root() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "x").unwrap();

        let output = runner(temp.path(), 22)
            .execute("ls && echo oops >&2", ExecContext::Local)
            .await
            .unwrap();

        assert!(output.stdout.contains("marker.txt"));
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_command_failure() {
        let temp = TempDir::new().unwrap();

        let err = runner(temp.path(), 22)
            .execute("echo nope >&2; exit 3", ExecContext::Local)
            .await
            .unwrap_err();

        match err {
            Error::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr.trim(), "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_root_is_spawn_error() {
        let err = runner(Path::new("/definitely/not/here"), 22)
            .execute("true", ExecContext::Local)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CommandSpawn { .. }));
    }
}
