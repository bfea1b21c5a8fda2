//! Well-known locations for remotesync files
//!
//! - `~/.remotesyncrc`
//! - `$XDG_CONFIG_HOME/remotesync/config` (or the platform config dir)
//! - `<root>/.remotesync/hooks` for hook scripts

use std::path::{Path, PathBuf};

/// Get the per-user rc file
///
/// Returns `~/.remotesyncrc`
#[must_use]
pub fn home_config_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(crate::config::CONFIG_FILE_NAME))
}

/// Get the remotesync config directory
///
/// Returns `$XDG_CONFIG_HOME/remotesync` or the platform equivalent
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("remotesync"))
}

/// Get the default config file path
///
/// Returns `$XDG_CONFIG_HOME/remotesync/config`
#[must_use]
pub fn default_config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config"))
}

/// Directory scanned for hook scripts below a sync root
#[must_use]
pub fn hooks_dir(root: &Path) -> PathBuf {
    root.join(".remotesync").join("hooks")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_home_config_file_name() {
        if let Some(path) = home_config_file() {
            assert!(path.ends_with(".remotesyncrc"), "unexpected path: {path:?}");
        }
    }

    #[test]
    fn test_default_config_file_under_config_dir() {
        if let (Some(dir), Some(file)) = (config_dir(), default_config_file()) {
            assert!(file.starts_with(&dir));
            assert!(dir.to_string_lossy().contains("remotesync"));
        }
    }

    #[test]
    fn test_hooks_dir() {
        assert_eq!(
            hooks_dir(Path::new("/work")),
            PathBuf::from("/work/.remotesync/hooks")
        );
    }
}
