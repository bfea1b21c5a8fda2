//! Hook resolution and execution
//!
//! Scripted hooks take precedence over declarative ones. Declarative entries
//! run one at a time in order, with `${name}` placeholders filled from the
//! [`HookContext`]; the first failing command aborts the hook.

use super::context::{BaseContext, HookContext};
use super::scripted::{HookUtils, ScriptedHook, ScriptedHooks};
use super::substitute::substitute;
use remotesync_config::{Config, HookName, HookSpec, SyncSettings};
use remotesync_core::{CommandRunner, Error, Result};
use std::sync::Arc;
use std::time::Instant;

/// What a hook name resolves to
pub enum ResolvedHook<'a> {
    /// Registered code or a hook script
    Scripted(Arc<dyn ScriptedHook>),
    /// Commands from the config file
    Declarative(&'a HookSpec),
    /// Nothing configured; invoking is a no-op
    Absent,
}

impl ResolvedHook<'_> {
    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            ResolvedHook::Scripted(_) => "scripted",
            ResolvedHook::Declarative(_) => "declarative",
            ResolvedHook::Absent => "absent",
        }
    }
}

/// Runs lifecycle hooks against a command runner
///
/// # Examples
///
/// ```ignore
/// let hooks = HookPipeline::builder(config, settings, runner)
///     .scripted(HookLoader::new(hooks_dir).load()?)
///     .build();
/// hooks.invoke(HookName::BeforeSync, BaseContext::new()).await?;
/// ```
pub struct HookPipeline {
    config: Arc<Config>,
    settings: Arc<SyncSettings>,
    runner: Arc<dyn CommandRunner>,
    scripted: ScriptedHooks,
}

impl HookPipeline {
    /// Pipeline with declarative hooks only
    pub fn new(
        config: Arc<Config>,
        settings: Arc<SyncSettings>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self::builder(config, settings, runner).build()
    }

    /// Start building a pipeline with scripted hooks
    pub fn builder(
        config: Arc<Config>,
        settings: Arc<SyncSettings>,
        runner: Arc<dyn CommandRunner>,
    ) -> HookPipelineBuilder {
        HookPipelineBuilder {
            config,
            settings,
            runner,
            scripted: ScriptedHooks::default(),
        }
    }

    /// Find the implementation for a hook name
    pub fn resolve(&self, name: HookName) -> ResolvedHook<'_> {
        if let Some(hook) = self.scripted.get(name) {
            ResolvedHook::Scripted(hook)
        } else if let Some(spec) = self.config.hooks.get(name) {
            ResolvedHook::Declarative(spec)
        } else {
            ResolvedHook::Absent
        }
    }

    /// Run the hook registered under `name`, if any
    ///
    /// # Errors
    ///
    /// Returns [`Error::HookExecution`] wrapping the first failure
    #[tracing::instrument(skip(self, base), fields(hook = %name))]
    pub async fn invoke(&self, name: HookName, base: BaseContext) -> Result<()> {
        let resolved = self.resolve(name);
        if matches!(resolved, ResolvedHook::Absent) {
            return Ok(());
        }

        let context = HookContext::new(name, base);
        let start = Instant::now();
        tracing::debug!(kind = resolved.kind(), "Running hook");

        let result = match resolved {
            ResolvedHook::Scripted(hook) => {
                let utils = HookUtils::new(
                    context.clone(),
                    Arc::clone(&self.runner),
                    Arc::clone(&self.config),
                    Arc::clone(&self.settings),
                );
                hook.run(&context, &utils).await
            }
            ResolvedHook::Declarative(spec) => self.run_declarative(spec, &context).await,
            ResolvedHook::Absent => Ok(()),
        };

        match result {
            Ok(()) => {
                tracing::debug!(elapsed_ms = start.elapsed().as_millis(), "Hook completed");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    elapsed_ms = start.elapsed().as_millis(),
                    error = %e,
                    "Hook failed"
                );
                Err(Error::hook(name.as_str(), e))
            }
        }
    }

    async fn run_declarative(&self, spec: &HookSpec, context: &HookContext) -> Result<()> {
        for (exec_context, template) in spec.commands() {
            let command = substitute(template, context);
            tracing::info!("Running {exec_context} hook command: {command}");
            self.runner.execute(&command, exec_context).await?;
        }
        Ok(())
    }
}

/// Builder for [`HookPipeline`]
pub struct HookPipelineBuilder {
    config: Arc<Config>,
    settings: Arc<SyncSettings>,
    runner: Arc<dyn CommandRunner>,
    scripted: ScriptedHooks,
}

impl HookPipelineBuilder {
    /// Use these scripted hooks ahead of declarative ones
    #[must_use]
    pub fn scripted(mut self, scripted: ScriptedHooks) -> Self {
        self.scripted = scripted;
        self
    }

    /// Finish the pipeline
    pub fn build(self) -> HookPipeline {
        HookPipeline {
            config: self.config,
            settings: self.settings,
            runner: self.runner,
            scripted: self.scripted,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::hooks::context::file_context;
    use crate::hooks::scripted::FnHook;
    use async_trait::async_trait;
    use remotesync_config::{CommandPair, HookCommand, RemoteTarget};
    use remotesync_core::{CommandOutput, ExecContext};
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Records commands; fails any command containing "fail"
    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, ExecContext)>>);

    impl Recorder {
        fn calls(&self) -> Vec<(String, ExecContext)> {
            self.0.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for Recorder {
        async fn execute(&self, command: &str, context: ExecContext) -> Result<CommandOutput> {
            self.0.lock().unwrap().push((command.to_string(), context));
            if command.contains("fail") {
                return Err(Error::CommandFailed {
                    command: command.to_string(),
                    context,
                    code: Some(1),
                    stdout: String::new(),
                    stderr: "boom".to_string(),
                });
            }
            Ok(CommandOutput::default())
        }
    }

    fn pipeline(config: Config, runner: Arc<Recorder>, scripted: ScriptedHooks) -> HookPipeline {
        let settings = SyncSettings::for_target(
            PathBuf::from("/w"),
            RemoteTarget::parse("h:/srv", 22).unwrap(),
        );
        HookPipeline::builder(Arc::new(config), Arc::new(settings), runner)
            .scripted(scripted)
            .build()
    }

    fn config_with(name: HookName, spec: HookSpec) -> Config {
        let mut config = Config::default();
        config.hooks.set(name, Some(spec));
        config
    }

    #[tokio::test]
    async fn test_absent_hook_is_noop() {
        let runner = Arc::new(Recorder::default());
        let hooks = pipeline(Config::default(), runner.clone(), ScriptedHooks::new());

        hooks
            .invoke(HookName::BeforeSync, BaseContext::new())
            .await
            .unwrap();

        assert!(runner.calls().is_empty());
        assert!(matches!(hooks.resolve(HookName::AfterSync), ResolvedHook::Absent));
    }

    #[tokio::test]
    async fn test_filepath_substitution() {
        let runner = Arc::new(Recorder::default());
        let config = config_with(
            HookName::AfterFileAdd,
            HookSpec::Command("echo ${filepath}".to_string()),
        );
        let hooks = pipeline(config, runner.clone(), ScriptedHooks::new());

        hooks
            .invoke(HookName::AfterFileAdd, file_context("a.txt"))
            .await
            .unwrap();

        assert_eq!(
            runner.calls(),
            vec![("echo a.txt".to_string(), ExecContext::Local)]
        );
    }

    #[tokio::test]
    async fn test_pair_runs_local_then_remote() {
        let runner = Arc::new(Recorder::default());
        let config = config_with(
            HookName::AfterFileChange,
            HookSpec::Pair(CommandPair {
                local: Some("echo $hookName".to_string()),
                remote: Some("touch $filepath".to_string()),
            }),
        );
        let hooks = pipeline(config, runner.clone(), ScriptedHooks::new());

        hooks
            .invoke(HookName::AfterFileChange, file_context("x/y.rs"))
            .await
            .unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                ("echo afterFileChange".to_string(), ExecContext::Local),
                ("touch x/y.rs".to_string(), ExecContext::Remote),
            ]
        );
    }

    #[tokio::test]
    async fn test_sequence_aborts_on_failure() {
        let runner = Arc::new(Recorder::default());
        let config = config_with(
            HookName::BeforeSync,
            HookSpec::Sequence(vec![
                HookCommand::Local("echo one".to_string()),
                HookCommand::Pair(CommandPair {
                    local: None,
                    remote: Some("fail here".to_string()),
                }),
                HookCommand::Local("echo three".to_string()),
            ]),
        );
        let hooks = pipeline(config, runner.clone(), ScriptedHooks::new());

        let err = hooks
            .invoke(HookName::BeforeSync, BaseContext::new())
            .await
            .unwrap_err();

        assert!(matches!(&err, Error::HookExecution { hook, .. } if hook == "beforeSync"));
        assert_eq!(err.stderr(), "boom");
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_overrides_declarative() {
        let runner = Arc::new(Recorder::default());
        let config = config_with(
            HookName::BeforeExit,
            HookSpec::Command("echo declarative".to_string()),
        );
        let mut scripted = ScriptedHooks::new();
        scripted.register(
            HookName::BeforeExit,
            FnHook::new(|ctx: HookContext, utils: HookUtils| async move {
                utils.remote(&format!("echo {}", ctx.hook_type)).await?;
                Ok::<_, Error>(())
            }),
        );
        let hooks = pipeline(config, runner.clone(), scripted);

        assert!(matches!(
            hooks.resolve(HookName::BeforeExit),
            ResolvedHook::Scripted(_)
        ));
        hooks
            .invoke(HookName::BeforeExit, BaseContext::new())
            .await
            .unwrap();

        assert_eq!(
            runner.calls(),
            vec![("echo exit".to_string(), ExecContext::Remote)]
        );
    }

    #[tokio::test]
    async fn test_scripted_error_is_wrapped() {
        let runner = Arc::new(Recorder::default());
        let mut scripted = ScriptedHooks::new();
        scripted.register(
            HookName::AfterSync,
            FnHook::new(|_: HookContext, _: HookUtils| async {
                Err::<(), _>(Error::Message("nope".to_string()))
            }),
        );
        let hooks = pipeline(Config::default(), runner, scripted);

        let err = hooks
            .invoke(HookName::AfterSync, BaseContext::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Hook 'afterSync' failed: nope");
    }
}
