//! Hook invocation context

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use remotesync_config::HookName;
use serde::Serialize;

/// Caller-provided context fields (`filepath` for file hooks)
pub type BaseContext = IndexMap<String, String>;

/// Base context for a per-file hook
pub fn file_context(key: &str) -> BaseContext {
    let mut base = BaseContext::new();
    base.insert("filepath".to_string(), key.to_string());
    base
}

/// Values visible to a hook while it runs
///
/// Serializes to the flat `{ filepath?, hookName, hookType, timestamp, ... }`
/// shape, and backs `${name}` substitution in declarative commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookContext {
    /// Key of the file being synced; absent for sync and exit hooks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
    /// e.g. `afterFileChange`
    pub hook_name: String,
    /// Hook name without its stage prefix, lower-cased (`fileadd`, `sync`)
    pub hook_type: String,
    /// RFC 3339, taken once when the hook starts
    pub timestamp: String,
    /// Any other caller-provided fields
    #[serde(flatten)]
    pub extra: IndexMap<String, String>,
}

impl HookContext {
    /// Build the context for one hook invocation
    pub fn new(name: HookName, mut base: BaseContext) -> Self {
        let filepath = base.shift_remove("filepath");
        Self {
            filepath,
            hook_name: name.as_str().to_string(),
            hook_type: name.hook_type(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            extra: base,
        }
    }

    /// Look up a field by its context name
    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "filepath" => self.filepath.as_deref(),
            "hookName" => Some(&self.hook_name),
            "hookType" => Some(&self.hook_type),
            "timestamp" => Some(&self.timestamp),
            other => self.extra.get(other).map(String::as_str),
        }
    }

    /// Fields as `REMOTESYNC_*` environment variables for hook scripts
    pub fn env_vars(&self) -> Vec<(String, String)> {
        let mut vars = Vec::with_capacity(4 + self.extra.len());
        if let Some(filepath) = &self.filepath {
            vars.push(("REMOTESYNC_FILEPATH".to_string(), filepath.clone()));
        }
        vars.push(("REMOTESYNC_HOOK_NAME".to_string(), self.hook_name.clone()));
        vars.push(("REMOTESYNC_HOOK_TYPE".to_string(), self.hook_type.clone()));
        vars.push(("REMOTESYNC_TIMESTAMP".to_string(), self.timestamp.clone()));
        for (key, value) in &self.extra {
            vars.push((env_name(key), value.clone()));
        }
        vars
    }
}

fn env_name(field: &str) -> String {
    let mut name = String::from("REMOTESYNC_");
    let mut prev_lower = false;
    for c in field.chars() {
        if c.is_ascii_uppercase() && prev_lower {
            name.push('_');
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        if c.is_ascii_alphanumeric() {
            name.push(c.to_ascii_uppercase());
        } else {
            name.push('_');
        }
    }
    name
}
