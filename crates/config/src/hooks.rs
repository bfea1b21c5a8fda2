//! Hook configuration
//!
//! Hooks are named extension points that run before and after the initial
//! sync, around every file operation, and once on exit. Each name maps to a
//! declarative [`HookSpec`]:
//!
//! ```toml
//! [hooks]
//! beforeSync = "npm run build"
//! afterFileChange = [
//!     "echo changed ${filepath}",
//!     { remote = "touch .reload" },
//! ]
//! beforeExit = { local = "notify-send bye", remote = "pkill -f dev-server" }
//! ```

use crate::Result;
use remotesync_core::{EventType, ExecContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hook execution stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    /// Before the action
    Before,
    /// After the action
    After,
}

impl HookStage {
    /// Capitalized stage name
    pub fn name(&self) -> &'static str {
        match self {
            HookStage::Before => "before",
            HookStage::After => "after",
        }
    }
}

/// The fixed set of lifecycle hook names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookName {
    /// Before the initial tree sync
    BeforeSync,
    /// After the initial tree sync
    AfterSync,
    /// Before a new file is copied
    BeforeFileAdd,
    /// After a new file is copied
    AfterFileAdd,
    /// Before a modified file is copied
    BeforeFileChange,
    /// After a modified file is copied
    AfterFileChange,
    /// Before a file is removed on the target
    BeforeFileDelete,
    /// After a file is removed on the target
    AfterFileDelete,
    /// Once, when remotesync is interrupted
    BeforeExit,
}

impl HookName {
    /// Every hook name, in lifecycle order
    pub const ALL: [HookName; 9] = [
        HookName::BeforeSync,
        HookName::AfterSync,
        HookName::BeforeFileAdd,
        HookName::AfterFileAdd,
        HookName::BeforeFileChange,
        HookName::AfterFileChange,
        HookName::BeforeFileDelete,
        HookName::AfterFileDelete,
        HookName::BeforeExit,
    ];

    /// Hook wrapping a per-file operation (`beforeFileAdd`, `afterFileDelete`, ...)
    pub fn for_file(stage: HookStage, event: EventType) -> Self {
        match (stage, event) {
            (HookStage::Before, EventType::Add) => HookName::BeforeFileAdd,
            (HookStage::After, EventType::Add) => HookName::AfterFileAdd,
            (HookStage::Before, EventType::Change) => HookName::BeforeFileChange,
            (HookStage::After, EventType::Change) => HookName::AfterFileChange,
            (HookStage::Before, EventType::Delete) => HookName::BeforeFileDelete,
            (HookStage::After, EventType::Delete) => HookName::AfterFileDelete,
        }
    }

    /// Configuration key, e.g. `beforeFileAdd`
    pub fn as_str(self) -> &'static str {
        match self {
            HookName::BeforeSync => "beforeSync",
            HookName::AfterSync => "afterSync",
            HookName::BeforeFileAdd => "beforeFileAdd",
            HookName::AfterFileAdd => "afterFileAdd",
            HookName::BeforeFileChange => "beforeFileChange",
            HookName::AfterFileChange => "afterFileChange",
            HookName::BeforeFileDelete => "beforeFileDelete",
            HookName::AfterFileDelete => "afterFileDelete",
            HookName::BeforeExit => "beforeExit",
        }
    }

    /// Hook name without its `before`/`after` prefix, lower-cased
    ///
    /// `beforeFileAdd` → `fileadd`, `beforeExit` → `exit`
    pub fn hook_type(self) -> String {
        let name = self.as_str();
        name.strip_prefix("before")
            .or_else(|| name.strip_prefix("after"))
            .unwrap_or(name)
            .to_lowercase()
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookName {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        HookName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| crate::Error::HookConfig(format!("Unknown hook name '{s}'")))
    }
}

/// A `{ local?, remote? }` command pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandPair {
    /// Command to run on this machine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,

    /// Command to run on the sync target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

impl CommandPair {
    fn push_commands<'a>(&'a self, out: &mut Vec<(ExecContext, &'a str)>) {
        if let Some(local) = &self.local {
            out.push((ExecContext::Local, local));
        }
        if let Some(remote) = &self.remote {
            out.push((ExecContext::Remote, remote));
        }
    }
}

/// One entry of a hook command list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HookCommand {
    /// Bare string, runs locally
    Local(String),
    /// Explicit local and/or remote command
    Pair(CommandPair),
}

/// Declarative hook definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HookSpec {
    /// Single local command
    Command(String),
    /// Commands run strictly in order
    Sequence(Vec<HookCommand>),
    /// Local then remote command
    Pair(CommandPair),
}

impl HookSpec {
    /// Flatten into the ordered list of commands to execute
    ///
    /// Empty command strings are dropped.
    pub fn commands(&self) -> Vec<(ExecContext, &str)> {
        let mut out = Vec::new();
        match self {
            HookSpec::Command(cmd) => out.push((ExecContext::Local, cmd.as_str())),
            HookSpec::Sequence(entries) => {
                for entry in entries {
                    match entry {
                        HookCommand::Local(cmd) => out.push((ExecContext::Local, cmd.as_str())),
                        HookCommand::Pair(pair) => pair.push_commands(&mut out),
                    }
                }
            }
            HookSpec::Pair(pair) => pair.push_commands(&mut out),
        }
        out.retain(|(_, cmd)| !cmd.trim().is_empty());
        out
    }
}

/// The `[hooks]` configuration table
///
/// Unknown hook names are rejected so typos surface at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HooksConfig {
    /// `beforeSync`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_sync: Option<HookSpec>,
    /// `afterSync`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_sync: Option<HookSpec>,
    /// `beforeFileAdd`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_file_add: Option<HookSpec>,
    /// `afterFileAdd`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_file_add: Option<HookSpec>,
    /// `beforeFileChange`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_file_change: Option<HookSpec>,
    /// `afterFileChange`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_file_change: Option<HookSpec>,
    /// `beforeFileDelete`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_file_delete: Option<HookSpec>,
    /// `afterFileDelete`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_file_delete: Option<HookSpec>,
    /// `beforeExit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_exit: Option<HookSpec>,
}

impl HooksConfig {
    /// Declarative spec configured for a hook, if any
    pub fn get(&self, name: HookName) -> Option<&HookSpec> {
        match name {
            HookName::BeforeSync => self.before_sync.as_ref(),
            HookName::AfterSync => self.after_sync.as_ref(),
            HookName::BeforeFileAdd => self.before_file_add.as_ref(),
            HookName::AfterFileAdd => self.after_file_add.as_ref(),
            HookName::BeforeFileChange => self.before_file_change.as_ref(),
            HookName::AfterFileChange => self.after_file_change.as_ref(),
            HookName::BeforeFileDelete => self.before_file_delete.as_ref(),
            HookName::AfterFileDelete => self.after_file_delete.as_ref(),
            HookName::BeforeExit => self.before_exit.as_ref(),
        }
    }

    /// Set or clear the spec for a hook
    pub fn set(&mut self, name: HookName, spec: Option<HookSpec>) {
        let slot = match name {
            HookName::BeforeSync => &mut self.before_sync,
            HookName::AfterSync => &mut self.after_sync,
            HookName::BeforeFileAdd => &mut self.before_file_add,
            HookName::AfterFileAdd => &mut self.after_file_add,
            HookName::BeforeFileChange => &mut self.before_file_change,
            HookName::AfterFileChange => &mut self.after_file_change,
            HookName::BeforeFileDelete => &mut self.before_file_delete,
            HookName::AfterFileDelete => &mut self.after_file_delete,
            HookName::BeforeExit => &mut self.before_exit,
        };
        *slot = spec;
    }

    /// Names that have a declarative spec
    pub fn configured(&self) -> impl Iterator<Item = HookName> + '_ {
        HookName::ALL
            .into_iter()
            .filter(|name| self.get(*name).is_some())
    }
}
