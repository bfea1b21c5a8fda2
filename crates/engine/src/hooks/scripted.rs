//! Scripted hooks
//!
//! A scripted hook is code rather than a command list. It receives the
//! [`HookContext`] plus [`HookUtils`] for running commands, and replaces any
//! declarative hook configured under the same name.

use super::context::HookContext;
use async_trait::async_trait;
use indexmap::IndexMap;
use remotesync_config::{Config, HookName, SyncSettings};
use remotesync_core::{CommandOutput, CommandRunner, ExecContext, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Code run for a lifecycle hook
#[async_trait]
pub trait ScriptedHook: Send + Sync {
    /// Run the hook; an error aborts the surrounding operation
    async fn run(&self, context: &HookContext, utils: &HookUtils) -> Result<()>;
}

/// Scripted hook backed by an async closure
///
/// # Examples
///
/// ```ignore
/// hooks.register(HookName::AfterFileAdd, FnHook::new(|ctx, utils| async move {
///     utils.remote("touch .reload").await?;
///     Ok::<_, Error>(())
/// }));
/// ```
pub struct FnHook<F>(F);

impl<F> FnHook<F> {
    /// Wrap an async closure
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> ScriptedHook for FnHook<F>
where
    F: Fn(HookContext, HookUtils) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn run(&self, context: &HookContext, utils: &HookUtils) -> Result<()> {
        (self.0)(context.clone(), utils.clone()).await
    }
}

/// Helpers handed to scripted hooks
#[derive(Clone)]
pub struct HookUtils {
    context: HookContext,
    runner: Arc<dyn CommandRunner>,
    config: Arc<Config>,
    settings: Arc<SyncSettings>,
}

impl HookUtils {
    /// Utilities for one hook invocation
    pub fn new(
        context: HookContext,
        runner: Arc<dyn CommandRunner>,
        config: Arc<Config>,
        settings: Arc<SyncSettings>,
    ) -> Self {
        Self {
            context,
            runner,
            config,
            settings,
        }
    }

    /// Run a command in the sync root
    pub async fn local(&self, command: &str) -> Result<CommandOutput> {
        tracing::debug!(hook = %self.context.hook_name, "Executing local command: {command}");
        self.runner.execute(command, ExecContext::Local).await
    }

    /// Run a command in the remote root
    pub async fn remote(&self, command: &str) -> Result<CommandOutput> {
        tracing::debug!(hook = %self.context.hook_name, "Executing remote command: {command}");
        self.runner.execute(command, ExecContext::Remote).await
    }

    /// Context of the running hook
    pub fn context(&self) -> &HookContext {
        &self.context
    }

    /// Loaded configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Effective settings for this run
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }
}

impl fmt::Debug for HookUtils {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookUtils")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Scripted hooks by name
#[derive(Clone, Default)]
pub struct ScriptedHooks {
    hooks: IndexMap<HookName, Arc<dyn ScriptedHook>>,
}

impl ScriptedHooks {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook, replacing any earlier one with the same name
    pub fn register(&mut self, name: HookName, hook: impl ScriptedHook + 'static) -> &mut Self {
        self.hooks.insert(name, Arc::new(hook));
        self
    }

    /// Hook registered under `name`
    pub fn get(&self, name: HookName) -> Option<Arc<dyn ScriptedHook>> {
        self.hooks.get(&name).cloned()
    }

    /// Whether `name` has a hook
    pub fn contains(&self, name: HookName) -> bool {
        self.hooks.contains_key(&name)
    }

    /// Registered hook names in registration order
    pub fn names(&self) -> impl Iterator<Item = HookName> + '_ {
        self.hooks.keys().copied()
    }

    /// Number of registered hooks
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hooks are registered
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for ScriptedHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.hooks.keys()).finish()
    }
}
