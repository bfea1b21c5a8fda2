//! Hook script discovery
//!
//! Loads scripted hooks from `.remotesync/hooks`. Every executable file whose
//! name (minus extension) is a hook name becomes the scripted hook for that
//! name, e.g. `.remotesync/hooks/afterFileChange.sh`.

use super::context::HookContext;
use super::scripted::{HookUtils, ScriptedHook, ScriptedHooks};
use async_trait::async_trait;
use remotesync_config::HookName;
use remotesync_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Scripted hook that runs an executable file in the sync root
///
/// Context fields are passed as `REMOTESYNC_*` environment variables.
#[derive(Debug, Clone)]
pub struct ScriptFileHook {
    path: PathBuf,
}

impl ScriptFileHook {
    /// Hook backed by the script at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Script location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shell command running the script with the context in its environment
    pub fn command(&self, context: &HookContext) -> String {
        let mut words: Vec<String> = context
            .env_vars()
            .into_iter()
            .map(|(key, value)| format!("{key}={}", shell_words::quote(&value)))
            .collect();
        words.push(shell_words::quote(&self.path.to_string_lossy()).into_owned());
        words.join(" ")
    }
}

#[async_trait]
impl ScriptedHook for ScriptFileHook {
    async fn run(&self, context: &HookContext, utils: &HookUtils) -> Result<()> {
        let output = utils.local(&self.command(context)).await?;
        if let Some(line) = output.last_stdout_line() {
            tracing::debug!(script = %self.path.display(), "{line}");
        }
        Ok(())
    }
}

/// Discover and load hook scripts from a directory
pub struct HookLoader {
    hooks_dir: PathBuf,
}

impl HookLoader {
    /// Loader for `hooks_dir`
    #[must_use]
    pub fn new(hooks_dir: impl Into<PathBuf>) -> Self {
        Self {
            hooks_dir: hooks_dir.into(),
        }
    }

    /// Whether the hooks directory is present
    #[must_use]
    pub fn exists(&self) -> bool {
        self.hooks_dir.is_dir()
    }

    /// Load every recognised hook script
    ///
    /// A missing directory yields no hooks. Files that are hidden, editor
    /// backups, not executable, or not named after a hook are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read
    pub fn load(&self) -> Result<ScriptedHooks> {
        let mut hooks = ScriptedHooks::new();

        if !self.exists() {
            tracing::debug!(
                "Hooks directory does not exist: {}",
                self.hooks_dir.display()
            );
            return Ok(hooks);
        }

        let mut file_paths: Vec<PathBuf> = fs::read_dir(&self.hooks_dir)
            .map_err(|e| {
                Error::HookConfig(format!(
                    "Failed to read directory {}: {e}",
                    self.hooks_dir.display()
                ))
            })?
            .filter_map(std::result::Result::ok)
            .map(|e| e.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| {
                        !name.starts_with('.')
                            && !name.ends_with('~')
                            && !name.to_lowercase().ends_with(".swp")
                    })
            })
            .collect();

        // First file wins when two share a hook name (`afterSync`, `afterSync.sh`)
        file_paths.sort();

        for path in file_paths {
            let Some(name) = hook_name_for(&path) else {
                tracing::warn!("Not a hook name, skipping: {}", path.display());
                continue;
            };
            if !is_executable(&path) {
                tracing::warn!("Hook script is not executable, skipping: {}", path.display());
                continue;
            }
            if hooks.contains(name) {
                tracing::warn!(
                    "Duplicate script for hook '{name}', skipping: {}",
                    path.display()
                );
                continue;
            }

            tracing::debug!("Loaded script for hook '{name}': {}", path.display());
            hooks.register(name, ScriptFileHook::new(path));
        }

        Ok(hooks)
    }
}

impl ScriptedHooks {
    /// Load hook scripts from `dir`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read
    pub fn load_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        HookLoader::new(dir).load()
    }
}

fn hook_name_for(path: &Path) -> Option<HookName> {
    path.file_stem()?.to_str()?.parse().ok()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).is_ok_and(|m| m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::hooks::context::file_context;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, executable: bool) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\necho hi\n").unwrap();
        let mode = if executable { 0o755 } else { 0o644 };
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let hooks = HookLoader::new(temp.path().join("nope")).load().unwrap();
        assert!(hooks.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_load_recognised_scripts() {
        let temp = TempDir::new().unwrap();
        write_script(temp.path(), "afterFileChange.sh", true);
        write_script(temp.path(), "beforeSync", true);
        write_script(temp.path(), "beforeSync.sh", true);
        write_script(temp.path(), "afterSync.sh", false);
        write_script(temp.path(), "deploy.sh", true);
        write_script(temp.path(), ".beforeExit", true);

        let hooks = ScriptedHooks::load_dir(temp.path()).unwrap();
        let names: Vec<_> = hooks.names().collect();

        assert_eq!(names.len(), 2);
        assert!(hooks.contains(HookName::AfterFileChange));
        assert!(hooks.contains(HookName::BeforeSync));
        assert!(!hooks.contains(HookName::AfterSync));
        assert!(!hooks.contains(HookName::BeforeExit));
    }

    #[test]
    fn test_script_command_env() {
        let hook = ScriptFileHook::new("/w/.remotesync/hooks/afterFileAdd.sh");
        let ctx = HookContext::new(HookName::AfterFileAdd, file_context("my file.txt"));

        let command = hook.command(&ctx);

        assert!(command.starts_with("REMOTESYNC_FILEPATH='my file.txt' "));
        assert!(command.contains("REMOTESYNC_HOOK_NAME=afterFileAdd"));
        assert!(command.ends_with(" /w/.remotesync/hooks/afterFileAdd.sh"));
    }
}
